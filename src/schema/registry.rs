//! Stream schemas embedded in the binary

use super::types::JsonSchema;
use crate::error::{Error, Result};
use crate::streams::ContentType;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Built-in schema sources, keyed by schema id
pub static BUILTIN_SCHEMAS: LazyLock<BTreeMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = BTreeMap::new();

        // Export jobs and their files
        m.insert("jobs", include_str!("../../schemas/jobs.json"));
        m.insert("topics", include_str!("../../schemas/topics.json"));
        m.insert(
            "conversations",
            include_str!("../../schemas/conversations.json"),
        );

        // Conversation items, one per content type
        m.insert(
            "conversation_items/chat_message",
            include_str!("../../schemas/conversation_items/chat_message.json"),
        );
        m.insert(
            "conversation_items/conversation_note",
            include_str!("../../schemas/conversation_items/conversation_note.json"),
        );
        m.insert(
            "conversation_items/topic_change",
            include_str!("../../schemas/conversation_items/topic_change.json"),
        );
        m.insert(
            "conversation_items/sms",
            include_str!("../../schemas/conversation_items/sms.json"),
        );
        m.insert(
            "conversation_items/conversation_status_change",
            include_str!("../../schemas/conversation_items/conversation_status_change.json"),
        );
        m.insert(
            "conversation_items/phone_call",
            include_str!("../../schemas/conversation_items/phone_call.json"),
        );
        m.insert(
            "conversation_items/voicemail",
            include_str!("../../schemas/conversation_items/voicemail.json"),
        );
        m.insert(
            "conversation_items/customer_activity",
            include_str!("../../schemas/conversation_items/customer_activity.json"),
        );
        m.insert(
            "conversation_items/facebook_message",
            include_str!("../../schemas/conversation_items/facebook_message.json"),
        );
        m.insert(
            "conversation_items/twitter",
            include_str!("../../schemas/conversation_items/twitter.json"),
        );
        m.insert(
            "conversation_items/instagram_direct",
            include_str!("../../schemas/conversation_items/instagram_direct.json"),
        );
        m.insert(
            "conversation_items/whatsapp",
            include_str!("../../schemas/conversation_items/whatsapp.json"),
        );
        m.insert(
            "conversation_items/email",
            include_str!("../../schemas/conversation_items/email.json"),
        );

        // Reference data and reports
        m.insert("inboxes", include_str!("../../schemas/inboxes.json"));
        m.insert("agents", include_str!("../../schemas/agents.json"));
        m.insert(
            "work_session_report",
            include_str!("../../schemas/work_session_report.json"),
        );

        m
    });

/// Parsed schemas, keyed by schema id
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, JsonSchema>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every built-in schema and check every content type has one
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for (id, source) in BUILTIN_SCHEMAS.iter() {
            registry.insert_json(id, source)?;
        }
        registry.check_content_types()?;
        Ok(registry)
    }

    /// Parse and register a schema
    pub fn insert_json(&mut self, id: &str, source: &str) -> Result<()> {
        let schema: JsonSchema = serde_json::from_str(source)
            .map_err(|e| Error::config(format!("Invalid schema '{id}': {e}")))?;
        self.insert(id, schema);
        Ok(())
    }

    /// Register a schema, replacing any previous one with the same id
    pub fn insert(&mut self, id: impl Into<String>, schema: JsonSchema) {
        self.schemas.insert(id.into(), schema);
    }

    /// Look up a schema
    pub fn get(&self, id: &str) -> Result<&JsonSchema> {
        self.schemas.get(id).ok_or_else(|| Error::SchemaNotFound {
            schema: id.to_string(),
        })
    }

    /// Whether a schema is registered
    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    /// Registered schema ids, sorted
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Fail unless every content type's schema is registered
    pub fn check_content_types(&self) -> Result<()> {
        let missing: Vec<_> = ContentType::ALL
            .iter()
            .map(ContentType::schema_id)
            .filter(|id| !self.contains(id))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::config(format!(
                "No schema registered for: {}",
                missing.join(", ")
            )))
        }
    }
}
