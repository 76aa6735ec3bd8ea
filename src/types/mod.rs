// src/types/mod.rs
pub mod application;
pub mod conversation;
pub mod message;
pub mod response;

pub use application::{ApplicantRef, ApplicationRecord, ApplicationStatus, StatusLookup};
pub use conversation::{Conversation, LastMessage, OtherUser, TEMP_ID_PREFIX};
pub use message::{
    Attachment, Draft, InterviewDetails, Message, MessageBody, MessageKind, OutgoingMessage,
};
