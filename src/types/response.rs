// src/types/response.rs
use serde::{Deserialize, Serialize};

// ===== Service Response Types =====

/// Endpoints answer either with the bare resource or a `{ success, data }` envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiPayload<T> {
    Wrapped {
        data: T,
        #[serde(default)]
        success: Option<bool>,
    },
    Bare(T),
}

impl<T> ApiPayload<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data, .. } => data,
            Self::Bare(data) => data,
        }
    }
}

/// Dedicated application status endpoint: `{ status }` or `{ hasApplied: false }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(default)]
    pub has_applied: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body returned alongside non-2xx statuses
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn text(self) -> Option<String> {
        self.message.or(self.error)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest<'a> {
    pub receiver_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest<'a> {
    pub conversation_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRequest<'a> {
    pub receiver_id: &'a str,
    pub interview_details: &'a super::message::InterviewDetails,
}
