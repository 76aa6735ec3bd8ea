// src/error.rs
use thiserror::Error;

use crate::attachment::AttachmentError;
use crate::types::ApplicationStatus;

#[derive(Debug, Clone, Error)]
pub enum MessagingError {
    #[error("{0}")]
    Validation(#[from] AttachmentError),

    #[error("Invalid interview details: {0}")]
    InvalidInterview(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("No conversation selected")]
    NoConversation,

    #[error("Messaging blocked (status: {status}): {reason}")]
    EligibilityBlocked {
        status: ApplicationStatus,
        reason: String,
    },

    #[error("A message is already being sent")]
    SendInFlight,

    #[error("Session expired or invalid")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl MessagingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.kind.code(),
            Self::InvalidInterview(_) => "INTERVIEW_INVALID",
            Self::EmptyMessage => "MESSAGE_EMPTY",
            Self::NoConversation => "NO_CONVERSATION",
            Self::EligibilityBlocked { .. } => "ELIGIBILITY_BLOCKED",
            Self::SendInFlight => "SEND_IN_FLIGHT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Api { .. } => "API_ERROR",
            Self::Transport(_) => "NETWORK_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Errors worth a dismissible notification rather than inline feedback
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Api { .. } | Self::Decode(_) | Self::NotFound(_)
        )
    }

    /// Caller must send the user back through login
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Text shown to the user; each cause reads differently
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => format!("{} {}", e.message, e.suggestion),
            Self::InvalidInterview(reason) => format!("Please fix the interview details: {}.", reason),
            Self::EmptyMessage => "Type a message or attach a file before sending.".to_string(),
            Self::NoConversation => "Select a conversation first.".to_string(),
            Self::EligibilityBlocked { reason, .. } => reason.clone(),
            Self::SendInFlight => "Please wait for the previous message to finish sending.".to_string(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::NotFound(_) => "The requested conversation could not be found.".to_string(),
            Self::Api { .. } => "The server could not process the request. Please try again.".to_string(),
            Self::Transport(_) => "Could not reach the server. Check your connection and try again.".to_string(),
            Self::Decode(_) => "Received an unexpected response from the server.".to_string(),
        }
    }
}

impl From<reqwest::Error> for MessagingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            Self::Unauthorized
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
