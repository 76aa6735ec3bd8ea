// src/lib.rs
//! Employer to job seeker messaging: eligibility gate, optimistic message
//! channel, conversation list and interview scheduling over the jobs API.

pub mod attachment;
pub mod channel;
pub mod cli;
pub mod conversation_store;
pub mod core;
pub mod eligibility;
pub mod environment;
pub mod error;
pub mod messenger;
pub mod session;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use attachment::{load_attachment, AttachmentError, AttachmentErrorKind, AttachmentPolicy};
pub use channel::{ChannelEntry, Delivery, MessageChannel, PendingSend, ScrollAnchor, Viewport};
pub use conversation_store::ConversationStore;
pub use core::{ApiClient, MessagingApi};
pub use eligibility::{Eligibility, EligibilityResolver, EligibilityState, ResolutionSource};
pub use environment::EnvironmentConfig;
pub use error::MessagingError;
pub use messenger::{Messenger, Opened};
pub use session::Session;
