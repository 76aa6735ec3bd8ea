// src/channel.rs
//! Message list for the selected conversation with optimistic sends

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};

use crate::attachment::AttachmentPolicy;
use crate::eligibility::EligibilityState;
use crate::error::MessagingError;
use crate::types::{
    ApplicationStatus, Draft, InterviewDetails, Message, MessageKind, OutgoingMessage,
    TEMP_ID_PREFIX,
};
use crate::utils::non_blank;

pub const DEFAULT_SCROLL_THRESHOLD_PX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Shown locally, waiting for the server
    Pending { temp_id: String },
    Confirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEntry {
    pub message: Message,
    pub delivery: Delivery,
}

impl ChannelEntry {
    pub fn confirmed(message: Message) -> Self {
        Self {
            message,
            delivery: Delivery::Confirmed,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.delivery, Delivery::Pending { .. })
    }

    fn is_pending_for(&self, temp_id: &str) -> bool {
        matches!(&self.delivery, Delivery::Pending { temp_id: id } if id == temp_id)
    }
}

// ===== Reducers =====

pub fn append_pending(mut entries: Vec<ChannelEntry>, message: Message) -> Vec<ChannelEntry> {
    let temp_id = message.id.clone();
    entries.push(ChannelEntry {
        message,
        delivery: Delivery::Pending { temp_id },
    });
    entries
}

/// Swap the placeholder for the server record at the same index
pub fn confirm(
    mut entries: Vec<ChannelEntry>,
    temp_id: &str,
    confirmed: Message,
) -> Vec<ChannelEntry> {
    match entries.iter().position(|e| e.is_pending_for(temp_id)) {
        Some(idx) => entries[idx] = ChannelEntry::confirmed(confirmed),
        None => {
            // Placeholder vanished (history reloaded mid-send)
            debug!("No placeholder {} to confirm", temp_id);
            entries = append_confirmed(entries, confirmed);
        }
    }
    entries
}

pub fn rollback(mut entries: Vec<ChannelEntry>, temp_id: &str) -> Vec<ChannelEntry> {
    entries.retain(|e| !e.is_pending_for(temp_id));
    entries
}

/// Append a server record unless it is already listed
pub fn append_confirmed(mut entries: Vec<ChannelEntry>, message: Message) -> Vec<ChannelEntry> {
    if !entries
        .iter()
        .any(|e| !e.is_pending() && e.message.id == message.id)
    {
        entries.push(ChannelEntry::confirmed(message));
    }
    entries
}

// ===== Scroll anchoring =====

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl Viewport {
    pub fn distance_from_bottom(&self) -> f64 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }
}

/// Follow new messages only when the reader is already near the bottom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    pub threshold_px: f64,
}

impl Default for ScrollAnchor {
    fn default() -> Self {
        Self {
            threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
        }
    }
}

impl ScrollAnchor {
    pub fn new(threshold_px: f64) -> Self {
        Self { threshold_px }
    }

    pub fn should_follow(&self, viewport: &Viewport) -> bool {
        viewport.distance_from_bottom() <= self.threshold_px
    }
}

// ===== Interview validation =====

/// Trim optional fields and check the mandatory date (`YYYY-MM-DD`) and time (`HH:MM`)
pub fn validate_interview(details: &InterviewDetails) -> Result<InterviewDetails, MessagingError> {
    let date = details.date.trim();
    let time = details.time.trim();

    if date.is_empty() {
        return Err(MessagingError::InvalidInterview("date is required".into()));
    }
    if time.is_empty() {
        return Err(MessagingError::InvalidInterview("time is required".into()));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| MessagingError::InvalidInterview("date must be YYYY-MM-DD".into()))?;
    NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| MessagingError::InvalidInterview("time must be HH:MM".into()))?;

    Ok(InterviewDetails {
        date: date.to_string(),
        time: time.to_string(),
        location: non_blank(details.location.as_deref()),
        meeting_link: non_blank(details.meeting_link.as_deref()),
        notes: non_blank(details.notes.as_deref()),
    })
}

// ===== Channel =====

/// A send that has been shown optimistically and must be completed
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub temp_id: String,
    pub request: OutgoingMessage,
}

#[derive(Debug)]
pub struct MessageChannel {
    conversation_id: Option<String>,
    receiver_id: Option<String>,
    entries: Vec<ChannelEntry>,
    sending: bool,
    /// The conversation summary showed messages even if none are loaded
    prior_messages: bool,
    policy: AttachmentPolicy,
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self::new(AttachmentPolicy::messaging())
    }
}

impl MessageChannel {
    pub fn new(policy: AttachmentPolicy) -> Self {
        Self {
            conversation_id: None,
            receiver_id: None,
            entries: Vec::new(),
            sending: false,
            prior_messages: false,
            policy,
        }
    }

    /// Point the channel at another conversation; the list is emptied
    pub fn select(&mut self, conversation_id: &str, receiver_id: &str) {
        self.conversation_id = Some(conversation_id.to_string());
        self.receiver_id = Some(receiver_id.to_string());
        self.entries.clear();
        self.prior_messages = false;
    }

    /// Record that the thread already has messages server-side
    pub fn note_prior_messages(&mut self) {
        self.prior_messages = true;
    }

    /// Loaded history, or a summary that proves the thread is not empty
    pub fn has_history(&self) -> bool {
        self.prior_messages || self.history_len() > 0
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn receiver_id(&self) -> Option<&str> {
        self.receiver_id.as_deref()
    }

    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Number of server-confirmed messages in the thread
    pub fn history_len(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_pending()).count()
    }

    /// Replace the whole list with a freshly fetched history, oldest first
    pub fn load_history(&mut self, mut messages: Vec<Message>) -> usize {
        messages.sort_by_key(|m| m.created_at);
        self.entries = messages.into_iter().map(ChannelEntry::confirmed).collect();
        debug!(
            "Loaded {} messages for {:?}",
            self.entries.len(),
            self.conversation_id
        );
        self.entries.len()
    }

    /// Gate plus grandfather rule
    fn check_gate(&self, gate: &EligibilityState) -> Result<(), MessagingError> {
        if gate.can_message() || self.has_history() {
            return Ok(());
        }
        Err(gate
            .blocking_error()
            .unwrap_or_else(|| MessagingError::EligibilityBlocked {
                status: ApplicationStatus::Unknown,
                reason: "Messaging is not available for this job seeker.".to_string(),
            }))
    }

    /// Validate the draft, show it optimistically and mark the channel busy.
    ///
    /// Nothing is mutated when an error is returned.
    pub fn begin_send(
        &mut self,
        draft: Draft,
        gate: &EligibilityState,
        sender_id: &str,
    ) -> Result<PendingSend, MessagingError> {
        let receiver_id = self
            .receiver_id
            .clone()
            .ok_or(MessagingError::NoConversation)?;

        if self.sending {
            warn!("Send ignored: previous message still in flight");
            return Err(MessagingError::SendInFlight);
        }

        self.check_gate(gate)?;

        let content = draft.text.trim().to_string();
        if content.is_empty() && draft.attachment.is_none() {
            return Err(MessagingError::EmptyMessage);
        }
        if let Some(attachment) = &draft.attachment {
            self.policy.validate(attachment)?;
        }

        let temp_id = format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4());
        let attachment = draft.attachment;
        let optimistic = Message {
            id: temp_id.clone(),
            conversation_id: self.conversation_id.clone(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.clone(),
            content: content.clone(),
            created_at: Utc::now(),
            read: false,
            kind: if attachment.is_some() {
                MessageKind::File
            } else {
                MessageKind::Text
            },
            file_name: attachment.as_ref().map(|a| a.file_name.clone()),
            file_type: attachment.as_ref().map(|a| a.mime_type.clone()),
            file_size: attachment.as_ref().map(|a| a.size()),
            file_url: None,
            interview_details: None,
        };

        self.entries = append_pending(std::mem::take(&mut self.entries), optimistic);
        self.sending = true;

        Ok(PendingSend {
            temp_id,
            request: OutgoingMessage {
                receiver_id,
                content,
                attachment,
            },
        })
    }

    /// Reconcile or roll back a send started with `begin_send`. Always clears the busy flag.
    pub fn complete_send(
        &mut self,
        pending: &PendingSend,
        outcome: Result<Message, MessagingError>,
    ) -> Result<Message, MessagingError> {
        self.sending = false;
        let same_thread = self.receiver_id.as_deref() == Some(pending.request.receiver_id.as_str());

        match outcome {
            Ok(confirmed) => {
                if same_thread {
                    if self.conversation_id_is_temporary() {
                        if let Some(real_id) = &confirmed.conversation_id {
                            self.conversation_id = Some(real_id.clone());
                        }
                    }
                    self.entries =
                        confirm(std::mem::take(&mut self.entries), &pending.temp_id, confirmed.clone());
                }
                info!("Message {} confirmed as {}", pending.temp_id, confirmed.id);
                Ok(confirmed)
            }
            Err(e) => {
                if same_thread {
                    self.entries = rollback(std::mem::take(&mut self.entries), &pending.temp_id);
                }
                warn!("Message {} rolled back: {}", pending.temp_id, e);
                Err(e)
            }
        }
    }

    /// Check an interview proposal before it goes out
    pub fn prepare_interview(
        &self,
        details: &InterviewDetails,
        gate: &EligibilityState,
    ) -> Result<(String, InterviewDetails), MessagingError> {
        let receiver_id = self
            .receiver_id
            .clone()
            .ok_or(MessagingError::NoConversation)?;
        self.check_gate(gate)?;
        Ok((receiver_id, validate_interview(details)?))
    }

    /// Add a server-confirmed message such as a scheduled interview
    pub fn push_confirmed(&mut self, message: Message) {
        self.entries = append_confirmed(std::mem::take(&mut self.entries), message);
    }

    fn conversation_id_is_temporary(&self) -> bool {
        self.conversation_id
            .as_deref()
            .map_or(true, |id| id.starts_with(TEMP_ID_PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::{Eligibility, ResolutionSource};
    use crate::test_support::{message, EMPLOYER};
    use crate::types::Attachment;

    fn open_gate() -> EligibilityState {
        EligibilityState::Settled(Eligibility {
            seeker_id: Some("js-1".into()),
            status: ApplicationStatus::Shortlisted,
            source: ResolutionSource::StatusEndpoint,
            has_history: false,
        })
    }

    fn closed_gate() -> EligibilityState {
        EligibilityState::Settled(Eligibility {
            seeker_id: Some("js-1".into()),
            status: ApplicationStatus::Pending,
            source: ResolutionSource::StatusEndpoint,
            has_history: false,
        })
    }

    fn channel_with_history() -> MessageChannel {
        let mut channel = MessageChannel::default();
        channel.select("c1", "js-1");
        channel.load_history(vec![
            message("m2", "js-1", EMPLOYER, "second", 2),
            message("m1", EMPLOYER, "js-1", "first", 1),
        ]);
        channel
    }

    fn ids(channel: &MessageChannel) -> Vec<String> {
        channel.messages().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn test_load_history_replaces_and_sorts() {
        let mut channel = channel_with_history();
        assert_eq!(ids(&channel), vec!["m1", "m2"]);

        channel.load_history(vec![message("m9", EMPLOYER, "js-1", "only", 9)]);
        assert_eq!(ids(&channel), vec!["m9"]);
    }

    #[test]
    fn test_confirmation_preserves_position() {
        let mut channel = channel_with_history();
        let pending = channel
            .begin_send(Draft::text("third"), &open_gate(), EMPLOYER)
            .unwrap();
        assert_eq!(channel.entries().len(), 3);
        assert!(channel.entries()[2].is_pending());
        assert!(channel.entries()[2].message.is_from(EMPLOYER));

        let confirmed = message("m3", EMPLOYER, "js-1", "third", 3);
        channel.complete_send(&pending, Ok(confirmed)).unwrap();

        assert_eq!(ids(&channel), vec!["m1", "m2", "m3"]);
        assert!(!channel.entries()[2].is_pending());
        assert!(!channel.is_sending());
    }

    #[test]
    fn test_failure_rolls_back() {
        let mut channel = channel_with_history();
        let pending = channel
            .begin_send(Draft::text("third"), &open_gate(), EMPLOYER)
            .unwrap();

        let err = channel
            .complete_send(&pending, Err(MessagingError::Transport("timeout".into())))
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(ids(&channel), vec!["m1", "m2"]);
        assert!(!channel.is_sending());
    }

    #[test]
    fn test_second_send_rejected_while_in_flight() {
        let mut channel = channel_with_history();
        let first = channel
            .begin_send(Draft::text("one"), &open_gate(), EMPLOYER)
            .unwrap();

        let second = channel.begin_send(Draft::text("two"), &open_gate(), EMPLOYER);
        assert!(matches!(second, Err(MessagingError::SendInFlight)));
        assert_eq!(channel.entries().len(), 3);

        channel
            .complete_send(&first, Ok(message("m3", EMPLOYER, "js-1", "one", 3)))
            .unwrap();
        assert!(channel
            .begin_send(Draft::text("two"), &open_gate(), EMPLOYER)
            .is_ok());
    }

    #[test]
    fn test_blocked_without_history() {
        let mut channel = MessageChannel::default();
        channel.select("c1", "js-1");

        let err = channel
            .begin_send(Draft::text("Hi, are you available?"), &closed_gate(), EMPLOYER)
            .unwrap_err();

        assert_eq!(
            err.user_message(),
            "Current status: Pending. Go to Applicants to update the status."
        );
        assert!(channel.entries().is_empty());
        assert!(!channel.is_sending());
    }

    #[test]
    fn test_history_overrides_closed_gate() {
        let mut channel = channel_with_history();
        assert!(channel
            .begin_send(Draft::text("still here"), &closed_gate(), EMPLOYER)
            .is_ok());
    }

    #[test]
    fn test_prior_messages_override_closed_gate_without_loaded_history() {
        let mut channel = MessageChannel::default();
        channel.select("c1", "js-1");
        assert!(channel
            .begin_send(Draft::text("hello"), &closed_gate(), EMPLOYER)
            .is_err());

        channel.note_prior_messages();
        assert!(channel.has_history());
        assert_eq!(channel.history_len(), 0);
        assert!(channel
            .begin_send(Draft::text("hello"), &closed_gate(), EMPLOYER)
            .is_ok());

        channel.select("c2", "js-2");
        assert!(!channel.has_history());
    }

    #[test]
    fn test_checking_state_lets_input_through() {
        let mut channel = MessageChannel::default();
        channel.select("c1", "js-1");
        let mut gate = EligibilityState::default();
        gate.begin("js-1");
        assert!(channel.begin_send(Draft::text("hi"), &gate, EMPLOYER).is_ok());
    }

    #[test]
    fn test_invalid_attachment_never_becomes_pending() {
        let mut channel = channel_with_history();
        let huge = Attachment::new("big.pdf", "application/pdf", vec![0; 11 * 1024 * 1024]);

        let err = channel
            .begin_send(Draft::default().with_attachment(huge), &open_gate(), EMPLOYER)
            .unwrap_err();

        assert_eq!(err.code(), "ATTACHMENT_TOO_LARGE");
        assert_eq!(channel.entries().len(), 2);
        assert!(!channel.is_sending());
    }

    #[test]
    fn test_empty_draft_rejected() {
        let mut channel = channel_with_history();
        assert!(matches!(
            channel.begin_send(Draft::text("   "), &open_gate(), EMPLOYER),
            Err(MessagingError::EmptyMessage)
        ));
    }

    #[test]
    fn test_file_only_draft_is_file_message() {
        let mut channel = channel_with_history();
        let doc = Attachment::new("offer.pdf", "application/pdf", b"%PDF-1.7".to_vec());
        let pending = channel
            .begin_send(Draft::default().with_attachment(doc), &open_gate(), EMPLOYER)
            .unwrap();

        let optimistic = &channel.entries()[2].message;
        assert_eq!(optimistic.kind, MessageKind::File);
        assert!(optimistic.file_url.is_none());
        assert!(pending.request.attachment.is_some());
    }

    #[test]
    fn test_completion_for_previous_thread_leaves_list_alone() {
        let mut channel = channel_with_history();
        let pending = channel
            .begin_send(Draft::text("to js-1"), &open_gate(), EMPLOYER)
            .unwrap();

        channel.select("c2", "js-2");
        channel.load_history(vec![message("x1", "js-2", EMPLOYER, "hey", 1)]);
        channel
            .complete_send(&pending, Ok(message("m3", EMPLOYER, "js-1", "to js-1", 3)))
            .unwrap();

        assert_eq!(ids(&channel), vec!["x1"]);
        assert!(!channel.is_sending());
    }

    #[test]
    fn test_no_conversation_selected() {
        let mut channel = MessageChannel::default();
        assert!(matches!(
            channel.begin_send(Draft::text("hi"), &open_gate(), EMPLOYER),
            Err(MessagingError::NoConversation)
        ));
    }

    #[test]
    fn test_reducers_are_position_stable() {
        let entries = vec![
            ChannelEntry::confirmed(message("m1", EMPLOYER, "js-1", "a", 1)),
            ChannelEntry::confirmed(message("m2", EMPLOYER, "js-1", "b", 2)),
        ];
        let entries = append_pending(entries, message("temp-x", EMPLOYER, "js-1", "c", 3));
        let entries = append_pending(entries, message("temp-y", EMPLOYER, "js-1", "d", 4));

        let confirmed = confirm(entries.clone(), "temp-x", message("m3", EMPLOYER, "js-1", "c", 3));
        let order: Vec<_> = confirmed.iter().map(|e| e.message.id.as_str()).collect();
        assert_eq!(order, vec!["m1", "m2", "m3", "temp-y"]);

        let rolled = rollback(entries, "temp-y");
        assert_eq!(rolled.len(), 3);

        let deduped = append_confirmed(confirmed, message("m1", EMPLOYER, "js-1", "a", 1));
        assert_eq!(deduped.len(), 4);
    }

    #[test]
    fn test_scroll_anchor() {
        let anchor = ScrollAnchor::default();
        let near_bottom = Viewport {
            scroll_top: 880.0,
            scroll_height: 1500.0,
            client_height: 600.0,
        };
        let reading_history = Viewport {
            scroll_top: 200.0,
            scroll_height: 1500.0,
            client_height: 600.0,
        };
        assert!(anchor.should_follow(&near_bottom));
        assert!(!anchor.should_follow(&reading_history));
        assert!(ScrollAnchor::new(800.0).should_follow(&reading_history));
    }

    #[test]
    fn test_validate_interview() {
        let ok = validate_interview(&InterviewDetails {
            date: " 2026-03-01 ".into(),
            time: "09:30".into(),
            location: Some("  ".into()),
            meeting_link: Some(" https://meet.test/x ".into()),
            notes: None,
        })
        .unwrap();
        assert_eq!(ok.date, "2026-03-01");
        assert!(ok.location.is_none());
        assert_eq!(ok.meeting_link.as_deref(), Some("https://meet.test/x"));

        let missing_time = validate_interview(&InterviewDetails {
            date: "2026-03-01".into(),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            missing_time.user_message(),
            "Please fix the interview details: time is required."
        );

        assert!(validate_interview(&InterviewDetails {
            date: "01/03/2026".into(),
            time: "09:30".into(),
            ..Default::default()
        })
        .is_err());
    }
}
