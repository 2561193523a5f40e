//! Tests for the sync engine

use super::*;
use crate::http::HttpClientConfig;
use crate::loader::{builtin_catalog, load_catalog_from_str, CatalogDefinition};
use crate::schema::SchemaRegistry;
use crate::streams::ContentType;
use crate::types::LogLevel;
use chrono::TimeZone;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT: &str = "conversation_items_chat_message";
const EMAIL: &str = "conversation_items_email";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
}

fn tap_config(server: &MockServer, extra: Value) -> TapConfig {
    let mut value = json!({
        "api_url_base": server.uri(),
        "start_date": "2024-01-01T00:00:00Z",
        "username": "agent@example.com",
        "password": "hunter2"
    });
    if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    TapConfig::from_value(&value).unwrap()
}

async fn sync(
    server: &MockServer,
    extra: Value,
    streams: &[&str],
) -> Result<(Vec<Message>, SyncStats)> {
    sync_catalog(server, &builtin_catalog().unwrap(), extra, streams).await
}

async fn sync_catalog(
    server: &MockServer,
    def: &CatalogDefinition,
    extra: Value,
    streams: &[&str],
) -> Result<(Vec<Message>, SyncStats)> {
    let config = tap_config(server, extra);
    let catalog =
        StreamCatalog::build(def, &config, &SchemaRegistry::builtin().unwrap()).unwrap();
    let names: Vec<String> = streams.iter().map(|s| (*s).to_string()).collect();
    let selection = catalog.select(Some(&names)).unwrap();

    let client = HttpClient::with_auth(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .max_retries(0)
            .no_rate_limit()
            .build(),
        config.auth.clone(),
    )
    .unwrap();
    let mut engine = SyncEngine::new(client, config).with_now(now());

    let mut sink = Vec::new();
    engine.run(&catalog, &selection, &mut sink).await?;
    Ok((sink, engine.stats().clone()))
}

fn records(messages: &[Message], stream: &str) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record {
                stream: s, record, ..
            } if s == stream => Some(record.clone()),
            _ => None,
        })
        .collect()
}

fn job(id: &str, updated_at: &str) -> Value {
    json!({
        "id": id,
        "status": "COMPLETED",
        "updatedAt": updated_at,
        "parameters": {"type": "CONVERSATIONS", "startAt": "2024-03-01T00:00:00Z"},
        "files": ["conversation_items.jsonl", "conversations.jsonl", "topics.jsonl"]
    })
}

fn item(id: &str, content_type: &str) -> String {
    json!({
        "id": id,
        "conversationId": "conv-1",
        "timestamp": "2024-03-01T10:00:00Z",
        "content": {"type": content_type, "content": "hello"}
    })
    .to_string()
}

async fn mount_jobs(server: &MockServer, jobs: Value) {
    Mock::given(method("GET"))
        .and(path("/export/jobs"))
        .and(query_param("status", "COMPLETED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jobs))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_items(server: &MockServer, job_id: &str, lines: &[String], expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/export/jobs/{job_id}/files/conversation_items.jsonl"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_string(lines.join("\n")))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ============================================================================
// Lookback Gate Tests
// ============================================================================

#[tokio::test]
async fn test_lookback_boundary() {
    let server = MockServer::start().await;
    mount_jobs(
        &server,
        json!([
            job("job-4", "2024-06-06T00:00:00Z"),
            job("job-5", "2024-06-05T00:00:00Z"),
            job("job-6", "2024-06-04T00:00:00Z")
        ]),
    )
    .await;
    mount_items(&server, "job-4", &[item("a", "CHAT_MESSAGE")], 1).await;
    mount_items(&server, "job-5", &[item("b", "CHAT_MESSAGE")], 1).await;
    mount_items(&server, "job-6", &[item("c", "CHAT_MESSAGE")], 0).await;

    let (messages, stats) = sync(&server, json!({"max_job_lookback": 5}), &[CHAT])
        .await
        .unwrap();

    let ids: Vec<_> = records(&messages, CHAT)
        .iter()
        .map(|r| r["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("a"), json!("b")]);
    assert_eq!(stats.child_fetches_skipped, 1);
    assert_eq!(stats.requests, 3);

    let warnings: Vec<_> = messages
        .iter()
        .filter_map(|m| match m {
            Message::Log {
                level: LogLevel::Warn,
                message,
            } => Some(message.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("job-6"));
    assert!(warnings[0].contains("6 days"));
}

#[tokio::test]
async fn test_without_lookback_old_jobs_are_fetched() {
    let server = MockServer::start().await;
    mount_jobs(&server, json!([job("ancient", "2023-01-01T00:00:00Z")])).await;
    mount_items(&server, "ancient", &[item("a", "CHAT_MESSAGE")], 1).await;

    let (messages, stats) = sync(&server, json!({}), &[CHAT]).await.unwrap();

    assert_eq!(records(&messages, CHAT).len(), 1);
    assert_eq!(stats.child_fetches_skipped, 0);
}

#[tokio::test]
async fn test_job_without_updated_at_is_fetched() {
    let server = MockServer::start().await;
    let mut undated = job("undated", "");
    undated["updatedAt"] = Value::Null;
    mount_jobs(&server, json!([undated])).await;
    mount_items(&server, "undated", &[item("a", "CHAT_MESSAGE")], 1).await;

    let (messages, _) = sync(&server, json!({"max_job_lookback": 1}), &[CHAT])
        .await
        .unwrap();

    assert_eq!(records(&messages, CHAT).len(), 1);
}

#[tokio::test]
async fn test_child_path_variable_missing_from_context() {
    let def = load_catalog_from_str(
        r#"
name: test-tap
streams:
  - name: jobs
    request:
      path: /export/jobs
      params: {status: COMPLETED}
    schema: jobs
  - name: topics_since
    parent: jobs
    request: {path: "/export/jobs/{job_id}/since/{updated_at}"}
    decoder: {type: jsonl}
    schema: topics
"#,
    )
    .unwrap();

    let server = MockServer::start().await;
    mount_jobs(&server, json!([{"id": "undated", "status": "COMPLETED"}])).await;
    Mock::given(method("GET"))
        .and(path_regex("^/export/jobs/undated/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id": "t1"}"#))
        .expect(0)
        .mount(&server)
        .await;

    let (messages, stats) = sync_catalog(&server, &def, json!({}), &["topics_since"])
        .await
        .unwrap();

    assert!(records(&messages, "topics_since").is_empty());
    assert_eq!(stats.parent_contexts, 1);
    assert_eq!(stats.child_contexts_incomplete, 1);
    assert_eq!(stats.requests, 1);
}

// ============================================================================
// Content Filter Tests
// ============================================================================

#[tokio::test]
async fn test_content_items_split_by_type() {
    let server = MockServer::start().await;
    mount_jobs(&server, json!([job("job-1", "2024-06-09T00:00:00Z")])).await;
    mount_items(
        &server,
        "job-1",
        &[
            item("c1", "CHAT_MESSAGE"),
            item("e1", "EMAIL"),
            item("c2", "CHAT_MESSAGE"),
            item("s1", "SMS"),
        ],
        1,
    )
    .await;

    let (messages, stats) = sync(&server, json!({}), &[CHAT, EMAIL]).await.unwrap();

    let chat = records(&messages, CHAT);
    let email = records(&messages, EMAIL);
    assert_eq!(chat.len(), 2);
    assert_eq!(email.len(), 1);
    assert!(chat.iter().all(|r| r["content"]["type"] == "CHAT_MESSAGE"));
    assert_eq!(email[0]["id"], "e1");
    assert_eq!(stats.records_filtered, 5);
    assert_eq!(stats.records_for(CHAT), 2);
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.responses_reused, 1);
}

#[tokio::test]
async fn test_items_file_downloaded_once_per_job() {
    let server = MockServer::start().await;
    mount_jobs(
        &server,
        json!([
            job("job-1", "2024-06-09T00:00:00Z"),
            job("job-2", "2024-06-09T00:00:00Z")
        ]),
    )
    .await;
    let lines = [item("c1", "CHAT_MESSAGE"), item("e1", "EMAIL")];
    mount_items(&server, "job-1", &lines, 1).await;
    mount_items(&server, "job-2", &lines, 1).await;

    let all: Vec<String> = ContentType::ALL
        .iter()
        .map(|ct| format!("conversation_items_{ct}"))
        .collect();
    let names: Vec<&str> = all.iter().map(String::as_str).collect();
    let (messages, stats) = sync(&server, json!({}), &names).await.unwrap();

    assert_eq!(records(&messages, CHAT).len(), 2);
    assert_eq!(records(&messages, EMAIL).len(), 2);
    assert_eq!(stats.requests, 3);
    assert_eq!(stats.responses_reused, 2 * (ContentType::ALL.len() - 1));
}

#[tokio::test]
async fn test_missing_content_type_is_fatal() {
    let server = MockServer::start().await;
    mount_jobs(&server, json!([job("job-1", "2024-06-09T00:00:00Z")])).await;
    let untyped = json!({"id": "x", "content": {"content": "hi"}}).to_string();
    mount_items(&server, "job-1", &[untyped], 1).await;

    let err = sync(&server, json!({}), &[CHAT]).await.unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_malformed_line_is_fatal() {
    let server = MockServer::start().await;
    mount_jobs(&server, json!([job("job-1", "2024-06-09T00:00:00Z")])).await;
    mount_items(
        &server,
        "job-1",
        &[item("c1", "CHAT_MESSAGE"), "{not json".to_string()],
        1,
    )
    .await;

    let err = sync(&server, json!({}), &[CHAT]).await.unwrap_err();

    assert!(err.to_string().contains("line 2"));
}

// ============================================================================
// Parent Record Tests
// ============================================================================

#[tokio::test]
async fn test_jobs_outside_window_are_dropped() {
    let server = MockServer::start().await;
    let mut early = job("early", "2024-06-09T00:00:00Z");
    early["parameters"]["startAt"] = json!("2023-12-31T23:59:59Z");
    let mut late = job("late", "2024-06-09T00:00:00Z");
    late["parameters"]["startAt"] = json!("2024-04-01T00:00:01Z");
    let inside = job("inside", "2024-06-09T00:00:00Z");
    mount_jobs(&server, json!([early, inside, late])).await;
    mount_items(&server, "inside", &[item("a", "CHAT_MESSAGE")], 1).await;
    mount_items(&server, "early", &[item("b", "CHAT_MESSAGE")], 0).await;
    mount_items(&server, "late", &[item("c", "CHAT_MESSAGE")], 0).await;

    let (messages, stats) = sync(
        &server,
        json!({"end_date": "2024-04-01T00:00:00Z"}),
        &["jobs", CHAT],
    )
    .await
    .unwrap();

    let jobs = records(&messages, "jobs");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], "inside");
    assert_eq!(stats.records_filtered, 2);
    assert_eq!(records(&messages, CHAT).len(), 1);
}

#[tokio::test]
async fn test_unfinished_jobs_have_no_children() {
    let server = MockServer::start().await;
    let mut running = job("running", "2024-06-09T00:00:00Z");
    running["status"] = json!("IN_PROGRESS");
    let mut failed = job("failed", "2024-06-09T00:00:00Z");
    failed["status"] = json!("FAILED");
    mount_jobs(&server, json!([running, failed])).await;
    mount_items(&server, "running", &[item("a", "CHAT_MESSAGE")], 0).await;
    mount_items(&server, "failed", &[item("b", "CHAT_MESSAGE")], 0).await;

    let (messages, stats) = sync(&server, json!({}), &[CHAT]).await.unwrap();

    assert!(records(&messages, CHAT).is_empty());
    assert_eq!(stats.parent_contexts, 0);
    assert_eq!(stats.requests, 1);
}

#[tokio::test]
async fn test_unlisted_file_is_not_requested() {
    let server = MockServer::start().await;
    let mut partial = job("partial", "2024-06-09T00:00:00Z");
    partial["files"] = json!(["topics.jsonl"]);
    mount_jobs(&server, json!([partial])).await;
    mount_items(&server, "partial", &[item("a", "CHAT_MESSAGE")], 0).await;
    Mock::given(method("GET"))
        .and(path("/export/jobs/partial/files/topics.jsonl"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"id": "t1", "name": "Billing"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (messages, stats) = sync(&server, json!({}), &[CHAT, "topics"]).await.unwrap();

    assert_eq!(records(&messages, "topics").len(), 1);
    assert_eq!(stats.child_files_missing, 1);
}

#[tokio::test]
async fn test_records_are_emitted_depth_first() {
    let server = MockServer::start().await;
    mount_jobs(
        &server,
        json!([
            job("job-1", "2024-06-09T00:00:00Z"),
            job("job-2", "2024-06-09T00:00:00Z")
        ]),
    )
    .await;
    mount_items(&server, "job-1", &[item("i1", "CHAT_MESSAGE")], 1).await;
    mount_items(&server, "job-2", &[item("i2", "CHAT_MESSAGE")], 1).await;

    let (messages, _) = sync(&server, json!({}), &["jobs", CHAT]).await.unwrap();

    let schemas: Vec<_> = messages
        .iter()
        .take_while(|m| matches!(m, Message::Schema { .. }))
        .filter_map(Message::stream)
        .collect();
    assert_eq!(schemas, vec!["jobs", CHAT]);

    let order: Vec<_> = messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { record, .. } => record["id"].as_str().map(String::from),
            _ => None,
        })
        .collect();
    assert_eq!(order, vec!["job-1", "i1", "job-2", "i2"]);
}

// ============================================================================
// Validation And Error Tests
// ============================================================================

#[tokio::test]
async fn test_schema_violation_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 42}])))
        .mount(&server)
        .await;

    let err = sync(&server, json!({}), &["agents"]).await.unwrap_err();

    match err {
        Error::SchemaValidation { stream, message } => {
            assert_eq!(stream, "agents");
            assert!(message.contains("$.id"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_http_error_aborts_sync() {
    let server = MockServer::start().await;
    mount_jobs(&server, json!([job("job-1", "2024-06-09T00:00:00Z")])).await;
    Mock::given(method("GET"))
        .and(path("/export/jobs/job-1/files/conversation_items.jsonl"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such file"))
        .mount(&server)
        .await;

    let err = sync(&server, json!({}), &[CHAT]).await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_report_posts_window() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports"))
        .and(body_partial_json(json!({
            "metric": "WorkSessionsReport",
            "startAt": "2024-01-01T00:00:00Z",
            "endAt": "2024-06-10T00:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "Agent Name,Agent Email,Duration\nAda,ada@example.com,3600\nGrace,grace@example.com,1800\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let (messages, _) = sync(&server, json!({}), &["work_session_report"])
        .await
        .unwrap();

    let rows = records(&messages, "work_session_report");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["Agent Name"], "Ada");
    assert_eq!(rows[1]["Duration"], 1800);
}

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_message_json_lines() {
    let record = Message::record("agents", json!({"id": "a1"}), now());
    assert_eq!(
        record.to_json(),
        json!({
            "type": "RECORD",
            "stream": "agents",
            "record": {"id": "a1"},
            "time_extracted": "2024-06-10T00:00:00Z"
        })
    );

    let log = Message::warn("careful");
    assert_eq!(
        log.to_json(),
        json!({"type": "LOG", "level": "WARN", "message": "careful"})
    );
    assert!(log.is_log());
    assert!(!log.to_line().unwrap().contains('\n'));
}

#[tokio::test]
async fn test_channel_sink() {
    let (mut tx, rx) = futures::channel::mpsc::unbounded::<Result<Message>>();
    tx.emit(Message::info("one")).unwrap();
    tx.emit(Message::record("agents", json!({"id": "a1"}), now()))
        .unwrap();
    drop(tx);

    let received: Vec<_> = rx.collect().await;
    assert_eq!(received.len(), 2);
    assert!(received[1].as_ref().unwrap().is_record());
}

#[test]
fn test_closed_channel_sink() {
    let (mut tx, rx) = futures::channel::mpsc::unbounded::<Result<Message>>();
    drop(rx);

    let err = tx
        .emit(Message::record("agents", json!({}), now()))
        .unwrap_err();

    assert!(matches!(err, Error::SinkClosed { stream } if stream == "agents"));
}
