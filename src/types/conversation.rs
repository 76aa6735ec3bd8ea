// src/types/conversation.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::MessageKind;

pub const TEMP_ID_PREFIX: &str = "temp-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "profilePicture", alias = "avatar")]
    pub profile_image: Option<String>,
}

impl OtherUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            profile_image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    pub created_at: Option<DateTime<Utc>>,
}

/// Conversation summary between the employer and one job seeker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(alias = "_id")]
    pub id: String,
    pub other_user: OtherUser,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Local-only placeholder awaiting its first confirmed message
    #[serde(skip)]
    pub temporary: bool,
}

impl Conversation {
    pub fn placeholder(other_user: OtherUser) -> Self {
        Self {
            id: format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4()),
            other_user,
            last_message: None,
            unread_count: 0,
            updated_at: None,
            temporary: true,
        }
    }

    /// Most recent activity, used for list ordering
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message
            .as_ref()
            .and_then(|m| m.created_at)
            .or(self.updated_at)
    }

    pub fn has_messages(&self) -> bool {
        self.last_message.is_some()
    }
}
