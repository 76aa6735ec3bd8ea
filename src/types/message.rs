// src/types/message.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    File,
    Interview,
}

/// Structured interview proposal carried by `MessageKind::Interview`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewDetails {
    pub date: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "conversation")]
    pub conversation_id: Option<String>,
    pub sender_id: String,
    pub receiver_id: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "isRead")]
    pub read: bool,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub interview_details: Option<InterviewDetails>,
}

/// Render-oriented view of a message
#[derive(Debug, PartialEq)]
pub enum MessageBody<'a> {
    Text(&'a str),
    File {
        name: &'a str,
        file_type: Option<&'a str>,
        size: Option<u64>,
        url: Option<&'a str>,
        caption: Option<&'a str>,
    },
    Interview {
        details: &'a InterviewDetails,
        note: Option<&'a str>,
    },
}

impl Message {
    /// A message is "mine" iff I sent it, independent of delivery state
    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }

    pub fn body(&self) -> MessageBody<'_> {
        let caption = Some(self.content.trim()).filter(|c| !c.is_empty());
        match (self.kind, &self.interview_details) {
            (MessageKind::Interview, Some(details)) => MessageBody::Interview {
                details,
                note: caption,
            },
            (MessageKind::File, _) => MessageBody::File {
                name: self.file_name.as_deref().unwrap_or("attachment"),
                file_type: self.file_type.as_deref(),
                size: self.file_size,
                url: self.file_url.as_deref(),
                caption,
            },
            _ => MessageBody::Text(&self.content),
        }
    }

    /// One-line summary for conversation lists
    pub fn preview(&self) -> String {
        match self.body() {
            MessageBody::Text(text) => text.to_string(),
            MessageBody::File { name, .. } => format!("Attachment: {}", name),
            MessageBody::Interview { details, .. } => {
                format!("Interview scheduled for {} at {}", details.date, details.time)
            }
        }
    }
}

/// File picked by the user, held in memory until sent
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Build an attachment, guessing the MIME type from the file name
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self::new(file_name, mime_type, bytes)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// What the user typed (and picked) in the compose box
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl Draft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Payload for the send endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub receiver_id: String,
    pub content: String,
    pub attachment: Option<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: MessageKind) -> Message {
        Message {
            id: "m1".to_string(),
            conversation_id: Some("c1".to_string()),
            sender_id: "emp-1".to_string(),
            receiver_id: "js-1".to_string(),
            content: "hello".to_string(),
            created_at: Utc::now(),
            read: false,
            kind,
            file_name: None,
            file_type: None,
            file_size: None,
            file_url: None,
            interview_details: None,
        }
    }

    #[test]
    fn test_is_from_uses_sender_only() {
        let msg = sample(MessageKind::Text);
        assert!(msg.is_from("emp-1"));
        assert!(!msg.is_from("js-1"));
    }

    #[test]
    fn test_interview_body_is_structured() {
        let mut msg = sample(MessageKind::Interview);
        msg.content = String::new();
        msg.interview_details = Some(InterviewDetails {
            date: "2026-03-01".to_string(),
            time: "14:30".to_string(),
            location: Some("HQ".to_string()),
            meeting_link: None,
            notes: None,
        });

        match msg.body() {
            MessageBody::Interview { details, note } => {
                assert_eq!(details.location.as_deref(), Some("HQ"));
                assert!(note.is_none());
            }
            other => panic!("expected interview body, got {:?}", other),
        }
        assert_eq!(msg.preview(), "Interview scheduled for 2026-03-01 at 14:30");
    }

    #[test]
    fn test_deserialize_file_message() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "_id": "m7",
            "senderId": "emp-1",
            "receiverId": "js-1",
            "createdAt": "2026-02-01T09:00:00Z",
            "type": "file",
            "fileName": "offer.pdf",
            "fileType": "application/pdf",
            "fileSize": 2048,
            "fileUrl": "/uploads/offer.pdf",
            "isRead": true
        }))
        .unwrap();

        assert!(msg.read);
        assert_eq!(msg.preview(), "Attachment: offer.pdf");
        assert!(matches!(
            msg.body(),
            MessageBody::File { size: Some(2048), caption: None, .. }
        ));
    }

    #[test]
    fn test_attachment_guesses_mime() {
        let att = Attachment::from_bytes("notes.txt", b"hi".to_vec());
        assert_eq!(att.mime_type, "text/plain");
        assert_eq!(att.size(), 2);
    }
}
