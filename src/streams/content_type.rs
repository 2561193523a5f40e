//! Conversation-item content types
//!
//! One variant per kind of activity found in `conversation_items.jsonl`.
//! Each variant maps statically to the schema its records are validated
//! against.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content sub-type of a conversation item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Chat message from a customer or agent
    ChatMessage,
    /// Internal note left on a conversation
    ConversationNote,
    /// Topics added to or removed from a conversation
    TopicChange,
    /// SMS message
    Sms,
    /// Conversation status update
    ConversationStatusChange,
    /// Phone call
    PhoneCall,
    /// Voicemail left by a customer
    Voicemail,
    /// Activity recorded against the customer
    CustomerActivity,
    /// Facebook Messenger message
    FacebookMessage,
    /// Twitter direct message
    Twitter,
    /// Instagram direct message
    InstagramDirect,
    /// WhatsApp message
    Whatsapp,
    /// Email
    Email,
}

impl ContentType {
    /// Every content type, in catalog order
    pub const ALL: [ContentType; 13] = [
        ContentType::ChatMessage,
        ContentType::ConversationNote,
        ContentType::TopicChange,
        ContentType::Sms,
        ContentType::ConversationStatusChange,
        ContentType::PhoneCall,
        ContentType::Voicemail,
        ContentType::CustomerActivity,
        ContentType::FacebookMessage,
        ContentType::Twitter,
        ContentType::InstagramDirect,
        ContentType::Whatsapp,
        ContentType::Email,
    ];

    /// Discriminator as written in config and compared against `content.type`
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::ChatMessage => "chat_message",
            ContentType::ConversationNote => "conversation_note",
            ContentType::TopicChange => "topic_change",
            ContentType::Sms => "sms",
            ContentType::ConversationStatusChange => "conversation_status_change",
            ContentType::PhoneCall => "phone_call",
            ContentType::Voicemail => "voicemail",
            ContentType::CustomerActivity => "customer_activity",
            ContentType::FacebookMessage => "facebook_message",
            ContentType::Twitter => "twitter",
            ContentType::InstagramDirect => "instagram_direct",
            ContentType::Whatsapp => "whatsapp",
            ContentType::Email => "email",
        }
    }

    /// Identifier of the schema records of this type are validated against
    pub fn schema_id(&self) -> &'static str {
        match self {
            ContentType::ChatMessage => "conversation_items/chat_message",
            ContentType::ConversationNote => "conversation_items/conversation_note",
            ContentType::TopicChange => "conversation_items/topic_change",
            ContentType::Sms => "conversation_items/sms",
            ContentType::ConversationStatusChange => {
                "conversation_items/conversation_status_change"
            }
            ContentType::PhoneCall => "conversation_items/phone_call",
            ContentType::Voicemail => "conversation_items/voicemail",
            ContentType::CustomerActivity => "conversation_items/customer_activity",
            ContentType::FacebookMessage => "conversation_items/facebook_message",
            ContentType::Twitter => "conversation_items/twitter",
            ContentType::InstagramDirect => "conversation_items/instagram_direct",
            ContentType::Whatsapp => "conversation_items/whatsapp",
            ContentType::Email => "conversation_items/email",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    /// Case-insensitive, so both `chat_message` and `CHAT_MESSAGE` parse
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                let known: Vec<_> = ContentType::ALL.iter().map(ContentType::as_str).collect();
                Error::invalid_value(
                    "content_type",
                    format!("unknown content type '{s}', expected one of: {}", known.join(", ")),
                )
            })
    }
}
