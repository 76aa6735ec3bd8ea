// src/messenger.rs
//! Employer messaging workflow: pick a job seeker, check the gate, talk.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::attachment::AttachmentPolicy;
use crate::channel::{MessageChannel, PendingSend, ScrollAnchor, Viewport};
use crate::conversation_store::ConversationStore;
use crate::core::MessagingApi;
use crate::eligibility::{EligibilityResolver, EligibilityState};
use crate::error::MessagingError;
use crate::session::Session;
use crate::types::{Conversation, Draft, InterviewDetails, Message, OtherUser};
use crate::utils::resolve_file_url;

/// Result of opening a conversation
#[derive(Debug)]
pub struct Opened {
    pub conversation: Conversation,
    /// History could not be fetched; worth a dismissible notice
    pub notice: Option<MessagingError>,
}

pub struct Messenger {
    api: Arc<dyn MessagingApi>,
    session: Session,
    store: ConversationStore,
    channel: MessageChannel,
    resolver: EligibilityResolver,
    eligibility: EligibilityState,
    selected: Option<OtherUser>,
    file_base_url: Option<String>,
    scroll_anchor: ScrollAnchor,
}

impl Messenger {
    pub fn new(api: Arc<dyn MessagingApi>, session: Session) -> Self {
        Self {
            api,
            session,
            store: ConversationStore::new(),
            channel: MessageChannel::new(AttachmentPolicy::messaging()),
            resolver: EligibilityResolver::new(),
            eligibility: EligibilityState::default(),
            selected: None,
            file_base_url: None,
            scroll_anchor: ScrollAnchor::default(),
        }
    }

    pub fn with_attachment_policy(mut self, policy: AttachmentPolicy) -> Self {
        self.channel = MessageChannel::new(policy);
        self
    }

    pub fn with_file_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.file_base_url = Some(base_url.into());
        self
    }

    pub fn with_scroll_anchor(mut self, anchor: ScrollAnchor) -> Self {
        self.scroll_anchor = anchor;
        self
    }

    /// Whether the thread view should jump to a newly appended message
    pub fn should_follow(&self, viewport: &Viewport) -> bool {
        self.scroll_anchor.should_follow(viewport)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn channel(&self) -> &MessageChannel {
        &self.channel
    }

    pub fn eligibility(&self) -> &EligibilityState {
        &self.eligibility
    }

    pub fn selected(&self) -> Option<&OtherUser> {
        self.selected.as_ref()
    }

    pub fn can_message(&self) -> bool {
        self.eligibility.can_message() || self.channel.has_history()
    }

    pub fn blocked_reason(&self) -> Option<String> {
        if self.can_message() {
            None
        } else {
            self.eligibility.blocked_reason()
        }
    }

    pub fn is_mine(&self, message: &Message) -> bool {
        message.is_from(&self.session.user_id)
    }

    /// Absolute download URL for a file message
    pub fn file_url(&self, message: &Message) -> Option<String> {
        let url = message.file_url.as_deref()?;
        Some(match &self.file_base_url {
            Some(base) => resolve_file_url(base, url),
            None => url.to_string(),
        })
    }

    pub async fn refresh_conversations(&mut self) -> Result<usize, MessagingError> {
        self.store.refresh(self.api.as_ref()).await
    }

    pub async fn mark_read(&mut self, conversation_id: &str) -> Result<(), MessagingError> {
        self.store.mark_read(self.api.as_ref(), conversation_id).await
    }

    /// Select a job seeker: get-or-create the thread, load its history,
    /// clear unread and re-run the eligibility check.
    pub async fn open(&mut self, seeker: &OtherUser) -> Result<Opened, MessagingError> {
        let api = Arc::clone(&self.api);
        let conversation = self.store.get_or_create(api.as_ref(), seeker).await?;

        self.selected = Some(seeker.clone());
        self.channel.select(&conversation.id, &seeker.id);
        if conversation.has_messages() {
            self.channel.note_prior_messages();
        }
        self.eligibility.begin(&seeker.id);

        let mut notice = None;
        if !conversation.temporary {
            match api.conversation_messages(&conversation.id).await {
                Ok(history) => {
                    self.channel.load_history(history);
                }
                Err(MessagingError::Unauthorized) => return Err(MessagingError::Unauthorized),
                Err(e) => {
                    error!("Failed to load messages for {}: {}", conversation.id, e);
                    notice = Some(e);
                }
            }

            if conversation.unread_count > 0 {
                self.store.mark_read(api.as_ref(), &conversation.id).await?;
            }
        }

        self.recheck_eligibility().await?;

        info!(
            "Opened conversation {} with {} ({} messages)",
            conversation.id,
            seeker.id,
            self.channel.history_len()
        );
        Ok(Opened {
            conversation,
            notice,
        })
    }

    /// Re-run the resolver for the current selection
    pub async fn recheck_eligibility(&mut self) -> Result<(), MessagingError> {
        let Some(seeker_id) = self.selected.as_ref().map(|s| s.id.clone()) else {
            self.eligibility = EligibilityState::default();
            return Ok(());
        };

        self.eligibility.begin(&seeker_id);
        let history_len = if self.channel.has_history() {
            self.channel.history_len().max(1)
        } else {
            0
        };
        let result = self
            .resolver
            .resolve(self.api.as_ref(), Some(&seeker_id), history_len)
            .await?;
        self.eligibility.settle(result);
        Ok(())
    }

    /// Show the draft optimistically; pair with `complete_send`
    pub fn begin_send(&mut self, draft: Draft) -> Result<PendingSend, MessagingError> {
        self.channel
            .begin_send(draft, &self.eligibility, &self.session.user_id)
    }

    /// Reconcile a send with the server's answer and refresh summaries
    pub async fn complete_send(
        &mut self,
        pending: &PendingSend,
        outcome: Result<Message, MessagingError>,
    ) -> Result<Message, MessagingError> {
        let confirmed = self.channel.complete_send(pending, outcome)?;
        self.after_confirmed(&confirmed).await?;
        Ok(confirmed)
    }

    /// One network send per call, gated by the channel's busy flag
    pub async fn send(&mut self, draft: Draft) -> Result<Message, MessagingError> {
        let pending = self.begin_send(draft)?;
        let outcome = self.api.send_message(&pending.request).await;
        self.complete_send(&pending, outcome).await
    }

    /// Send a structured interview proposal. Nothing is shown before the
    /// server confirms it.
    pub async fn schedule_interview(
        &mut self,
        details: &InterviewDetails,
    ) -> Result<Message, MessagingError> {
        let (receiver_id, details) = self.channel.prepare_interview(details, &self.eligibility)?;

        let message = self
            .api
            .schedule_interview(&receiver_id, &details)
            .await
            .map_err(|e| {
                error!("Failed to schedule interview with {}: {}", receiver_id, e);
                e
            })?;

        info!(
            "Interview with {} scheduled for {} {}",
            receiver_id, details.date, details.time
        );
        self.channel.push_confirmed(message.clone());
        self.after_confirmed(&message).await?;
        Ok(message)
    }

    /// The thread is already reconciled; only a 401 from the refresh is reported
    async fn after_confirmed(&mut self, message: &Message) -> Result<(), MessagingError> {
        if let Some(conversation_id) = &message.conversation_id {
            self.store.promote(&message.receiver_id, conversation_id);
        }
        self.store.record_sent(message);

        match self.store.refresh(self.api.as_ref()).await {
            Ok(_) => Ok(()),
            Err(MessagingError::Unauthorized) => Err(MessagingError::Unauthorized),
            Err(e) => {
                warn!("Conversation list refresh after send failed: {}", e);
                Ok(())
            }
        }
    }
}
