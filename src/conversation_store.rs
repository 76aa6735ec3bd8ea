// src/conversation_store.rs
//! Conversation store - the employer's conversation list and summaries

use tracing::{debug, info, warn};

use crate::core::MessagingApi;
use crate::error::MessagingError;
use crate::types::{Conversation, LastMessage, Message, OtherUser};

#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, conversation_id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == conversation_id)
    }

    pub fn find_by_participant(&self, user_id: &str) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.other_user.id == user_id)
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    /// Case-insensitive match on the job seeker's name
    pub fn search(&self, query: &str) -> Vec<&Conversation> {
        let needle = query.trim().to_lowercase();
        self.conversations
            .iter()
            .filter(|c| needle.is_empty() || c.other_user.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Re-fetch the full list; the only way to observe other sessions' changes.
    ///
    /// Local placeholders the server does not know yet are kept.
    pub async fn refresh(&mut self, api: &dyn MessagingApi) -> Result<usize, MessagingError> {
        let fetched = api.list_conversations().await?;
        let placeholders: Vec<Conversation> = self
            .conversations
            .drain(..)
            .filter(|c| {
                c.temporary && !fetched.iter().any(|f| f.other_user.id == c.other_user.id)
            })
            .collect();

        self.conversations = fetched;
        self.conversations.extend(placeholders);
        self.sort();

        info!("Loaded {} conversations", self.conversations.len());
        Ok(self.conversations.len())
    }

    /// Existing conversation with `receiver`, or a new one.
    ///
    /// When the server cannot create it, a local placeholder is returned so a
    /// compose box can still be shown.
    pub async fn get_or_create(
        &mut self,
        api: &dyn MessagingApi,
        receiver: &OtherUser,
    ) -> Result<Conversation, MessagingError> {
        if let Some(existing) = self.find_by_participant(&receiver.id) {
            debug!("Reusing conversation {} with {}", existing.id, receiver.id);
            return Ok(existing.clone());
        }

        let conversation = match api.get_or_create_conversation(&receiver.id).await {
            Ok(mut conversation) => {
                if conversation.other_user.name.is_empty() {
                    conversation.other_user.name = receiver.name.clone();
                }
                conversation
            }
            Err(MessagingError::Unauthorized) => return Err(MessagingError::Unauthorized),
            Err(e) => {
                warn!(
                    "Could not create conversation with {}: {}. Using local placeholder",
                    receiver.id, e
                );
                Conversation::placeholder(receiver.clone())
            }
        };

        self.upsert(conversation.clone());
        Ok(conversation)
    }

    /// Replace a placeholder's id once the server has assigned one
    pub fn promote(&mut self, receiver_id: &str, conversation_id: &str) -> bool {
        let Some(idx) = self
            .conversations
            .iter()
            .position(|c| c.temporary && c.other_user.id == receiver_id)
        else {
            return false;
        };

        if self.get(conversation_id).is_some() {
            self.conversations.remove(idx);
        } else {
            let conv = &mut self.conversations[idx];
            info!("Conversation {} is now {}", conv.id, conversation_id);
            conv.id = conversation_id.to_string();
            conv.temporary = false;
        }
        true
    }

    /// Update the summary after one of our own messages was confirmed
    pub fn record_sent(&mut self, message: &Message) {
        let Some(conv) = self.conversations.iter_mut().find(|c| {
            message.conversation_id.as_deref() == Some(c.id.as_str())
                || c.other_user.id == message.receiver_id
        }) else {
            return;
        };

        conv.last_message = Some(LastMessage {
            content: message.preview(),
            kind: message.kind,
            created_at: Some(message.created_at),
        });
        conv.updated_at = Some(message.created_at);
        self.sort();
    }

    /// Best effort read receipt. Only `Unauthorized` is reported.
    pub async fn mark_read(
        &mut self,
        api: &dyn MessagingApi,
        conversation_id: &str,
    ) -> Result<(), MessagingError> {
        let temporary = match self.conversations.iter_mut().find(|c| c.id == conversation_id) {
            Some(conv) => {
                conv.unread_count = 0;
                conv.temporary
            }
            None => false,
        };
        if temporary {
            return Ok(());
        }

        match api.mark_read(conversation_id).await {
            Ok(()) => Ok(()),
            Err(MessagingError::Unauthorized) => Err(MessagingError::Unauthorized),
            Err(e) => {
                debug!("mark-read unavailable for {}: {}", conversation_id, e);
                Ok(())
            }
        }
    }

    fn upsert(&mut self, conversation: Conversation) {
        match self.conversations.iter_mut().find(|c| c.id == conversation.id) {
            Some(existing) => *existing = conversation,
            None => self.conversations.push(conversation),
        }
        self.sort();
    }

    /// Newest activity first; conversations without activity last
    fn sort(&mut self) {
        self.conversations
            .sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
    }
}
