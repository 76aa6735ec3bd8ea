// src/core/service_client.rs
//! reqwest implementation of the messaging API

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, trace};

use super::api::MessagingApi;
use crate::error::MessagingError;
use crate::session::Session;
use crate::types::response::{
    ApiPayload, ConversationRequest, ErrorBody, InterviewRequest, MarkReadRequest, StatusResponse,
};
use crate::types::{
    ApplicationRecord, ApplicationStatus, Conversation, InterviewDetails, Message,
    OutgoingMessage, StatusLookup,
};
use crate::utils::endpoint_url;

const CONVERSATIONS_ENDPOINT: &str = "/messages/conversations";
const SEND_ENDPOINT: &str = "/messages/send";
const MARK_READ_ENDPOINT: &str = "/messages/mark-read";
const INTERVIEW_ENDPOINT: &str = "/messages/schedule-interview";
const APPLICATION_STATUS_ENDPOINT: &str = "/applications/status";
const EMPLOYER_APPLICATIONS_ENDPOINT: &str = "/applications/employer";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        session: Session,
        timeout_seconds: u64,
    ) -> Result<Self, MessagingError> {
        let timeout = if timeout_seconds == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_seconds
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| MessagingError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, self.session.bearer())
    }

    async fn execute<R>(&self, request: RequestBuilder, url: &str) -> Result<R, MessagingError>
    where
        R: DeserializeOwned,
    {
        let response = self.authorized(request).send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            MessagingError::from(e)
        })?;

        let status = response.status();
        trace!("Response status from {}: {}", url, status);

        let body = response.text().await?;

        match status {
            s if s.is_success() => {
                let payload: ApiPayload<R> = serde_json::from_str(&body).map_err(|e| {
                    error!("Failed to parse response from {}: {}. Raw: {}", url, e, body);
                    MessagingError::Decode(e.to_string())
                })?;
                Ok(payload.into_inner())
            }
            StatusCode::UNAUTHORIZED => Err(MessagingError::Unauthorized),
            StatusCode::NOT_FOUND => Err(MessagingError::NotFound(url.to_string())),
            s => {
                let message = serde_json::from_str::<ErrorBody>(&body)
                    .ok()
                    .and_then(ErrorBody::text)
                    .unwrap_or_else(|| {
                        if body.is_empty() {
                            "Unknown error".to_string()
                        } else {
                            body.clone()
                        }
                    });
                error!("API error {} from {}: {}", s, url, message);
                Err(MessagingError::Api {
                    status: s.as_u16(),
                    message,
                })
            }
        }
    }

    /// Generic GET request
    pub async fn get<R>(&self, path: &str) -> Result<R, MessagingError>
    where
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("GET {}", url);
        self.execute(self.client.get(&url), &url).await
    }

    /// Generic POST request with JSON
    pub async fn post_json<T, R>(&self, path: &str, payload: &T) -> Result<R, MessagingError>
    where
        T: serde::Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);
        self.execute(self.client.post(&url).json(payload), &url).await
    }
}

#[async_trait]
impl MessagingApi for ApiClient {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, MessagingError> {
        self.get(CONVERSATIONS_ENDPOINT).await
    }

    async fn get_or_create_conversation(
        &self,
        receiver_id: &str,
    ) -> Result<Conversation, MessagingError> {
        self.post_json(CONVERSATIONS_ENDPOINT, &ConversationRequest { receiver_id })
            .await
    }

    async fn conversation_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, MessagingError> {
        self.get(&format!("{}/{}/messages", CONVERSATIONS_ENDPOINT, conversation_id))
            .await
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<Message, MessagingError> {
        let mut form = Form::new()
            .text("receiverId", message.receiver_id.clone())
            .text("content", message.content.clone());

        if let Some(attachment) = &message.attachment {
            let part = Part::bytes(attachment.bytes.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(&attachment.mime_type)?;
            form = form.part("file", part);
        }

        let url = self.url(SEND_ENDPOINT);
        debug!("POST {} (multipart)", url);
        self.execute(self.client.post(&url).multipart(form), &url)
            .await
    }

    async fn mark_read(&self, conversation_id: &str) -> Result<(), MessagingError> {
        let _ack: serde_json::Value = self
            .post_json(MARK_READ_ENDPOINT, &MarkReadRequest { conversation_id })
            .await?;
        Ok(())
    }

    async fn schedule_interview(
        &self,
        receiver_id: &str,
        details: &InterviewDetails,
    ) -> Result<Message, MessagingError> {
        self.post_json(
            INTERVIEW_ENDPOINT,
            &InterviewRequest {
                receiver_id,
                interview_details: details,
            },
        )
        .await
    }

    async fn application_status(
        &self,
        job_seeker_id: &str,
    ) -> Result<StatusLookup, MessagingError> {
        let response: StatusResponse = self
            .get(&format!("{}/{}", APPLICATION_STATUS_ENDPOINT, job_seeker_id))
            .await?;

        if response.has_applied == Some(false) {
            return Ok(StatusLookup::NotApplied);
        }

        Ok(match response.status.as_deref().map(ApplicationStatus::parse) {
            Some(ApplicationStatus::NotApplied) => StatusLookup::NotApplied,
            Some(status) => StatusLookup::Status(status),
            None => StatusLookup::Status(ApplicationStatus::Unknown),
        })
    }

    async fn employer_applications(&self) -> Result<Vec<ApplicationRecord>, MessagingError> {
        self.get(EMPLOYER_APPLICATIONS_ENDPOINT).await
    }
}
