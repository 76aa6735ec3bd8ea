// src/test_support.rs
//! In-memory `MessagingApi` used by unit tests

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::MessagingApi;
use crate::error::MessagingError;
use crate::types::{
    ApplicantRef, ApplicationRecord, ApplicationStatus, Conversation, InterviewDetails, LastMessage,
    Message, MessageKind, OtherUser, OutgoingMessage, StatusLookup,
};

pub const EMPLOYER: &str = "emp-1";

pub fn message(id: &str, sender: &str, receiver: &str, content: &str, minute: i64) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: None,
        sender_id: sender.to_string(),
        receiver_id: receiver.to_string(),
        content: content.to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minute),
        read: false,
        kind: MessageKind::Text,
        file_name: None,
        file_type: None,
        file_size: None,
        file_url: None,
        interview_details: None,
    }
}

pub fn conversation(id: &str, seeker: &str, name: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        other_user: OtherUser::new(seeker, name),
        last_message: None,
        unread_count: 0,
        updated_at: None,
        temporary: false,
    }
}

pub fn application(seeker: &str, status: ApplicationStatus) -> ApplicationRecord {
    ApplicationRecord {
        id: format!("app-{}", seeker),
        job_seeker: Some(ApplicantRef {
            id: seeker.to_string(),
            name: None,
        }),
        job_seeker_id: None,
        job_id: None,
        status,
    }
}

pub struct FakeApi {
    pub conversations: Mutex<Result<Vec<Conversation>, MessagingError>>,
    pub create_error: Mutex<Option<MessagingError>>,
    pub messages: Mutex<HashMap<String, Vec<Message>>>,
    pub messages_error: Mutex<Option<MessagingError>>,
    pub status: Mutex<Result<StatusLookup, MessagingError>>,
    pub applications: Mutex<Result<Vec<ApplicationRecord>, MessagingError>>,
    pub send_error: Mutex<Option<MessagingError>>,
    pub interview_error: Mutex<Option<MessagingError>>,
    pub mark_read_error: Mutex<Option<MessagingError>>,
    calls: Mutex<Vec<&'static str>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            conversations: Mutex::new(Ok(Vec::new())),
            create_error: Mutex::new(None),
            messages: Mutex::new(HashMap::new()),
            messages_error: Mutex::new(None),
            status: Mutex::new(Err(MessagingError::Transport("status endpoint down".into()))),
            applications: Mutex::new(Ok(Vec::new())),
            send_error: Mutex::new(None),
            interview_error: Mutex::new(None),
            mark_read_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, status: Result<StatusLookup, MessagingError>) -> Self {
        *self.status.lock().unwrap() = status;
        self
    }

    pub fn with_applications(self, apps: Result<Vec<ApplicationRecord>, MessagingError>) -> Self {
        *self.applications.lock().unwrap() = apps;
        self
    }

    pub fn with_conversations(self, convs: Vec<Conversation>) -> Self {
        *self.conversations.lock().unwrap() = Ok(convs);
        self
    }

    pub fn with_history(self, conversation_id: &str, history: Vec<Message>) -> Self {
        self.messages
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), history);
        self
    }

    pub fn fail_sends(&self, err: MessagingError) {
        *self.send_error.lock().unwrap() = Some(err);
    }

    pub fn calls_to(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    /// Mirror what the server would persist
    fn remember(&self, conv: Conversation, last: Option<&Message>) {
        let mut guard = self.conversations.lock().unwrap();
        let Ok(list) = guard.as_mut() else {
            return;
        };
        let idx = match list.iter().position(|c| c.id == conv.id) {
            Some(idx) => idx,
            None => {
                list.push(conv);
                list.len() - 1
            }
        };
        if let Some(msg) = last {
            list[idx].last_message = Some(LastMessage {
                content: msg.preview(),
                kind: msg.kind,
                created_at: Some(msg.created_at),
            });
        }
    }

    fn conversation_for(&self, receiver_id: &str) -> String {
        self.conversations
            .lock()
            .unwrap()
            .as_ref()
            .ok()
            .and_then(|convs| convs.iter().find(|c| c.other_user.id == receiver_id))
            .map(|c| c.id.clone())
            .unwrap_or_else(|| format!("conv-{}", receiver_id))
    }
}

#[async_trait]
impl MessagingApi for FakeApi {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, MessagingError> {
        self.record("list_conversations");
        self.conversations.lock().unwrap().clone()
    }

    async fn get_or_create_conversation(
        &self,
        receiver_id: &str,
    ) -> Result<Conversation, MessagingError> {
        self.record("get_or_create_conversation");
        if let Some(err) = self.create_error.lock().unwrap().clone() {
            return Err(err);
        }
        let conv = conversation(&self.conversation_for(receiver_id), receiver_id, "Created");
        self.remember(conv.clone(), None);
        Ok(conv)
    }

    async fn conversation_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, MessagingError> {
        self.record("conversation_messages");
        if let Some(err) = self.messages_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self
            .messages
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(&self, outgoing: &OutgoingMessage) -> Result<Message, MessagingError> {
        self.record("send_message");
        if let Some(err) = self.send_error.lock().unwrap().clone() {
            return Err(err);
        }
        let n = self.calls_to("send_message");
        let mut confirmed = message(
            &format!("srv-{}", n),
            EMPLOYER,
            &outgoing.receiver_id,
            &outgoing.content,
            100 + n as i64,
        );
        confirmed.conversation_id = Some(self.conversation_for(&outgoing.receiver_id));
        if let Some(att) = &outgoing.attachment {
            confirmed.kind = MessageKind::File;
            confirmed.file_name = Some(att.file_name.clone());
            confirmed.file_type = Some(att.mime_type.clone());
            confirmed.file_size = Some(att.size());
            confirmed.file_url = Some(format!("/uploads/{}", att.file_name));
        }
        let conv = conversation(
            confirmed.conversation_id.as_deref().unwrap_or_default(),
            &outgoing.receiver_id,
            "Created",
        );
        self.remember(conv, Some(&confirmed));
        Ok(confirmed)
    }

    async fn mark_read(&self, _conversation_id: &str) -> Result<(), MessagingError> {
        self.record("mark_read");
        match self.mark_read_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn schedule_interview(
        &self,
        receiver_id: &str,
        details: &InterviewDetails,
    ) -> Result<Message, MessagingError> {
        self.record("schedule_interview");
        if let Some(err) = self.interview_error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut msg = message("srv-interview", EMPLOYER, receiver_id, "", 200);
        msg.kind = MessageKind::Interview;
        msg.interview_details = Some(details.clone());
        Ok(msg)
    }

    async fn application_status(
        &self,
        _job_seeker_id: &str,
    ) -> Result<StatusLookup, MessagingError> {
        self.record("application_status");
        self.status.lock().unwrap().clone()
    }

    async fn employer_applications(&self) -> Result<Vec<ApplicationRecord>, MessagingError> {
        self.record("employer_applications");
        self.applications.lock().unwrap().clone()
    }
}
