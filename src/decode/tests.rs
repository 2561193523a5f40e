//! Tests for decoder module

use super::*;
use crate::error::Error;

// ============================================================================
// DecoderConfig Tests
// ============================================================================

#[test]
fn test_decoder_config_default() {
    let config = DecoderConfig::default();
    assert_eq!(config, DecoderConfig::Json { records_path: None });
    assert_eq!(config.format(), DecoderFormat::Json);
}

#[test]
fn test_decoder_config_from_yaml() {
    let config: DecoderConfig = serde_yaml::from_str("type: jsonl").unwrap();
    assert_eq!(config, DecoderConfig::Jsonl);

    let config: DecoderConfig =
        serde_yaml::from_str("type: json\nrecords_path: \"$[*]\"").unwrap();
    assert_eq!(config, DecoderConfig::json_with_path("$[*]"));

    let config: DecoderConfig = serde_yaml::from_str("type: csv").unwrap();
    assert_eq!(config, DecoderConfig::Csv { delimiter: ',' });
    assert_eq!(config.format(), DecoderFormat::Csv);
}

#[test]
fn test_decoder_config_build() {
    let decoder = DecoderConfig::Jsonl.build();
    let records = decoder.decode_all("{\"id\": 1}\n{\"id\": 2}").unwrap();
    assert_eq!(records.len(), 2);
}

// ============================================================================
// JSON Decoder Tests
// ============================================================================

#[test]
fn test_json_decoder_array() {
    let decoder = JsonDecoder::new();
    let body = r#"[{"id": "j1"}, {"id": "j2"}, {"id": "j3"}]"#;

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["id"], "j1");
    assert_eq!(records[2]["id"], "j3");
}

#[test]
fn test_json_decoder_root_wildcard() {
    let decoder = JsonDecoder::with_path("$[*]");
    let body = r#"[{"id": "j1", "status": "COMPLETED"}, {"id": "j2", "status": "PENDING"}]"#;

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["status"], "PENDING");
}

#[test]
fn test_json_decoder_object() {
    let decoder = JsonDecoder::new();
    let body = r#"{"id": "inbox-1", "name": "Support"}"#;

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "Support");
}

#[test]
fn test_json_decoder_nested_path() {
    let decoder = JsonDecoder::with_path("response.items");
    let body = r#"{"response": {"items": [{"id": 1}], "total": 1}}"#;

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], 1);
}

#[test]
fn test_json_decoder_missing_path_yields_nothing() {
    let decoder = JsonDecoder::with_path("data");
    let records = decoder.decode_all(r#"{"meta": {}}"#).unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_json_decoder_array_index() {
    let decoder = JsonDecoder::with_path("data[-1]");
    let body = r#"{"data": [{"id": 1}, {"id": 2}, {"id": 3}]}"#;

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], 3);
}

#[test]
fn test_json_decoder_jsonpath_wildcard() {
    let decoder = JsonDecoder::with_path("$.data[*]");
    let body = r#"{"data": [{"id": 1}, {"id": 2}]}"#;

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn test_json_decoder_invalid() {
    let decoder = JsonDecoder::new();
    let result = decoder.decode("not valid json");
    assert!(matches!(result, Err(Error::Decode { .. })));
}

// ============================================================================
// JSONL Decoder Tests
// ============================================================================

#[test]
fn test_jsonl_decoder_basic() {
    let decoder = JsonlDecoder::new();
    let body = r#"{"id": "c1", "content": {"type": "CHAT_MESSAGE"}}
{"id": "c2", "content": {"type": "SMS"}}
{"id": "c3", "content": {"type": "TOPIC_CHANGE"}}"#;

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["id"], "c1");
    assert_eq!(records[2]["content"]["type"], "TOPIC_CHANGE");
}

#[test]
fn test_jsonl_decoder_empty_lines() {
    let decoder = JsonlDecoder::new();
    let body = "{\"id\": 1}\n\n   \n{\"id\": 2}\n";

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn test_jsonl_decoder_empty_body() {
    let decoder = JsonlDecoder::new();
    assert!(decoder.decode_all("").unwrap().is_empty());
}

#[test]
fn test_jsonl_decoder_invalid_line_is_fatal() {
    let decoder = JsonlDecoder::new();
    let body = "{\"id\": 1}\nnot valid json\n{\"id\": 2}";

    let err = decoder.decode_all(body).unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn test_jsonl_decoder_is_lazy() {
    let decoder = JsonlDecoder::new();
    let body = "{\"id\": 1}\n{broken\n{\"id\": 3}";

    let mut records = decoder.decode(body).unwrap();
    assert_eq!(records.next().unwrap().unwrap()["id"], 1);
    assert!(records.next().unwrap().is_err());
}

/// Write an object with its keys in reverse order
fn reversed_line(record: &serde_json::Value) -> String {
    let fields: Vec<String> = record
        .as_object()
        .unwrap()
        .iter()
        .rev()
        .map(|(key, value)| format!("{}: {value}", serde_json::Value::from(key.as_str())))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

#[test]
fn test_jsonl_filtered_subset_reparses_identically() {
    let decoder = JsonlDecoder::new();
    let filter = crate::filter::ContentFilter::new("sms");
    let body = [
        r#"{"id": "i1", "content": {"type": "SMS", "body": "hi"}, "conversationId": "c1"}"#,
        r#"{"id": "i2", "content": {"type": "EMAIL", "subject": "re"}}"#,
        r#"{"conversationId": "c2", "id": "i3", "content": {"type": "sms"}}"#,
        r#"{"id": "i4", "content": {"type": "CHAT_MESSAGE"}, "timestamp": null}"#,
        r#"{"content": {"body": "later", "type": "SMS"}, "id": "i5"}"#,
    ]
    .join("\n");

    let kept: Vec<_> = decoder
        .decode_all(&body)
        .unwrap()
        .into_iter()
        .filter(|record| filter.check(record).unwrap())
        .collect();
    assert_eq!(kept.len(), 3);

    let rewritten: Vec<String> = kept.iter().map(reversed_line).collect();
    let reparsed = decoder.decode_all(&rewritten.join("\n")).unwrap();

    assert_eq!(reparsed.len(), kept.len());
    assert_eq!(reparsed, kept);
    assert!(reparsed.iter().all(|record| filter.check(record).unwrap()));
}

// ============================================================================
// CSV Decoder Tests
// ============================================================================

#[test]
fn test_csv_decoder_basic() {
    let decoder = CsvDecoder::new();
    let body = "agentId,name,handleTime\na1,Alice,30\na2,Bob,25.5";

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["agentId"], "a1");
    assert_eq!(records[0]["handleTime"], 30);
    assert_eq!(records[1]["handleTime"], 25.5);
}

#[test]
fn test_csv_decoder_quoted_fields() {
    let decoder = CsvDecoder::new();
    let body = r#"id,name,description
1,"Alice","Hello, World"
2,"Bob","He said ""Hi"""#;

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["description"], "Hello, World");
    assert_eq!(records[1]["description"], "He said \"Hi\"");
}

#[test]
fn test_csv_decoder_tab_delimiter() {
    let decoder = CsvDecoder::with_delimiter('\t');
    let body = "id\tname\n1\tAlice\n2\tBob";

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["name"], "Bob");
}

#[test]
fn test_csv_decoder_booleans_and_nulls() {
    let decoder = CsvDecoder::new();
    let body = "id,active,value\n1,true,\n2,FALSE,null";

    let records = decoder.decode_all(body).unwrap();
    assert_eq!(records[0]["active"], true);
    assert!(records[0]["value"].is_null());
    assert_eq!(records[1]["active"], false);
    assert!(records[1]["value"].is_null());
}

#[test]
fn test_csv_decoder_short_row_fills_null() {
    let decoder = CsvDecoder::new();
    let records = decoder.decode_all("a,b,c\n1,2").unwrap();
    assert!(records[0]["c"].is_null());
}

#[test]
fn test_csv_decoder_long_row_is_error() {
    let decoder = CsvDecoder::new();
    let result = decoder.decode_all("a,b\n1,2,3");
    assert!(matches!(result, Err(Error::CsvParse { .. })));
}

#[test]
fn test_csv_decoder_header_only() {
    let decoder = CsvDecoder::new();
    assert!(decoder.decode_all("a,b\n").unwrap().is_empty());
    assert!(decoder.decode_all("").unwrap().is_empty());
}
