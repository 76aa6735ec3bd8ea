// src/core/api.rs
//! HTTP contract of the messaging backend

use async_trait::async_trait;

use crate::error::MessagingError;
use crate::types::{
    ApplicationRecord, Conversation, InterviewDetails, Message, OutgoingMessage, StatusLookup,
};

/// Operations the messaging module needs from the REST API.
///
/// Every call carries the session's bearer token; a 401 surfaces as
/// `MessagingError::Unauthorized`.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, MessagingError>;

    async fn get_or_create_conversation(
        &self,
        receiver_id: &str,
    ) -> Result<Conversation, MessagingError>;

    /// Oldest first
    async fn conversation_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, MessagingError>;

    async fn send_message(&self, message: &OutgoingMessage) -> Result<Message, MessagingError>;

    async fn mark_read(&self, conversation_id: &str) -> Result<(), MessagingError>;

    async fn schedule_interview(
        &self,
        receiver_id: &str,
        details: &InterviewDetails,
    ) -> Result<Message, MessagingError>;

    async fn application_status(&self, job_seeker_id: &str)
        -> Result<StatusLookup, MessagingError>;

    async fn employer_applications(&self) -> Result<Vec<ApplicationRecord>, MessagingError>;
}
