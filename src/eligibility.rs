// src/eligibility.rs
//! Decides whether the employer may message a job seeker.
//!
//! Resolution runs three strategies in order and stops at the first
//! conclusive one:
//!
//! 1. the dedicated status endpoint (an explicit "no application" ends the chain),
//! 2. the existing thread (any prior message grandfathers the conversation),
//! 3. a scan of the employer's application list.
//!
//! Failures inside a strategy are logged and treated as inconclusive, except
//! `Unauthorized`, which always propagates. Exhausting the chain yields an
//! ineligible `Unknown` status.

use tracing::{debug, info, warn};

use crate::core::MessagingApi;
use crate::error::MessagingError;
use crate::types::{ApplicationRecord, ApplicationStatus, StatusLookup};

/// Result of a single strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Resolved(ApplicationStatus),
    NotApplied,
    Grandfathered,
    Inconclusive,
}

impl Lookup {
    pub fn is_conclusive(&self) -> bool {
        !matches!(self, Lookup::Inconclusive)
    }
}

/// Which strategy produced the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    StatusEndpoint,
    ExistingThread,
    ApplicationList,
    Exhausted,
    MissingSeeker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    pub seeker_id: Option<String>,
    pub status: ApplicationStatus,
    pub source: ResolutionSource,
    pub has_history: bool,
}

impl Eligibility {
    /// No job seeker to check
    pub fn unknown() -> Self {
        Self {
            seeker_id: None,
            status: ApplicationStatus::Unknown,
            source: ResolutionSource::MissingSeeker,
            has_history: false,
        }
    }

    /// Existing threads stay open whatever the status became
    pub fn can_message(&self) -> bool {
        self.has_history || self.status.permits_messaging()
    }

    /// Explanation shown when sending is blocked
    pub fn blocked_reason(&self) -> Option<String> {
        if self.can_message() {
            return None;
        }

        Some(match &self.status {
            ApplicationStatus::NotApplied => {
                "This job seeker has not applied to any of your job postings.".to_string()
            }
            ApplicationStatus::Unknown => {
                "Could not verify this job seeker's application status. Go to Applicants to check it."
                    .to_string()
            }
            status => format!(
                "Current status: {}. Go to Applicants to update the status.",
                status.label()
            ),
        })
    }

    pub fn into_error(self) -> Option<MessagingError> {
        let reason = self.blocked_reason()?;
        Some(MessagingError::EligibilityBlocked {
            status: self.status,
            reason,
        })
    }
}

/// Gate state for the currently selected job seeker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EligibilityState {
    /// Check in flight; input stays enabled meanwhile
    Checking { seeker_id: String },
    Settled(Eligibility),
}

impl Default for EligibilityState {
    fn default() -> Self {
        Self::Settled(Eligibility::unknown())
    }
}

impl EligibilityState {
    pub fn can_message(&self) -> bool {
        match self {
            Self::Checking { .. } => true,
            Self::Settled(eligibility) => eligibility.can_message(),
        }
    }

    pub fn blocked_reason(&self) -> Option<String> {
        match self {
            Self::Checking { .. } => None,
            Self::Settled(eligibility) => eligibility.blocked_reason(),
        }
    }

    pub fn blocking_error(&self) -> Option<MessagingError> {
        match self {
            Self::Checking { .. } => None,
            Self::Settled(eligibility) => eligibility.clone().into_error(),
        }
    }

    pub fn status(&self) -> Option<&ApplicationStatus> {
        match self {
            Self::Checking { .. } => None,
            Self::Settled(eligibility) => Some(&eligibility.status),
        }
    }

    /// Start a check for `seeker_id`
    pub fn begin(&mut self, seeker_id: &str) {
        *self = Self::Checking {
            seeker_id: seeker_id.to_string(),
        };
    }

    /// Store a result unless the selection moved on meanwhile.
    ///
    /// Returns whether the result was applied.
    pub fn settle(&mut self, eligibility: Eligibility) -> bool {
        if let Self::Checking { seeker_id } = self {
            if eligibility.seeker_id.as_deref() != Some(seeker_id.as_str()) {
                debug!(
                    "Dropping stale eligibility for {:?}, now checking {}",
                    eligibility.seeker_id, seeker_id
                );
                return false;
            }
        }
        *self = Self::Settled(eligibility);
        true
    }
}

/// First conclusive lookup wins
pub fn first_conclusive<I>(lookups: I) -> Option<(usize, Lookup)>
where
    I: IntoIterator<Item = Lookup>,
{
    lookups
        .into_iter()
        .enumerate()
        .find(|(_, lookup)| lookup.is_conclusive())
}

/// Strategy 1: dedicated per-seeker endpoint
pub async fn status_endpoint(
    api: &dyn MessagingApi,
    seeker_id: &str,
) -> Result<Lookup, MessagingError> {
    match api.application_status(seeker_id).await {
        Ok(StatusLookup::NotApplied) => Ok(Lookup::NotApplied),
        Ok(StatusLookup::Status(ApplicationStatus::Unknown)) => {
            debug!("Status endpoint gave no status for {}", seeker_id);
            Ok(Lookup::Inconclusive)
        }
        Ok(StatusLookup::Status(status)) => Ok(Lookup::Resolved(status)),
        Err(MessagingError::Unauthorized) => Err(MessagingError::Unauthorized),
        Err(e) => {
            warn!("Status endpoint failed for {}: {}", seeker_id, e);
            Ok(Lookup::Inconclusive)
        }
    }
}

/// Strategy 2: prior messages in the thread
pub fn existing_thread(history_len: usize) -> Lookup {
    if history_len > 0 {
        Lookup::Grandfathered
    } else {
        Lookup::Inconclusive
    }
}

/// Strategy 3: scan the employer's applications
pub async fn application_list(
    api: &dyn MessagingApi,
    seeker_id: &str,
) -> Result<Lookup, MessagingError> {
    match api.employer_applications().await {
        Ok(applications) => Ok(match pick_application(&applications, seeker_id) {
            Some(app) => Lookup::Resolved(app.status.clone()),
            None => {
                debug!("No application from {} in employer list", seeker_id);
                Lookup::Inconclusive
            }
        }),
        Err(MessagingError::Unauthorized) => Err(MessagingError::Unauthorized),
        Err(e) => {
            warn!("Application list lookup failed for {}: {}", seeker_id, e);
            Ok(Lookup::Inconclusive)
        }
    }
}

/// A seeker may have applied to several postings. Prefer an application that
/// already permits messaging, otherwise the first one the API returned.
pub fn pick_application<'a>(
    applications: &'a [ApplicationRecord],
    seeker_id: &str,
) -> Option<&'a ApplicationRecord> {
    let mut matching = applications
        .iter()
        .filter(|app| app.seeker_id() == Some(seeker_id));
    let first = matching.next()?;
    if first.status.permits_messaging() {
        return Some(first);
    }
    matching
        .find(|app| app.status.permits_messaging())
        .or(Some(first))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EligibilityResolver;

impl EligibilityResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve eligibility for `seeker_id` given the size of the loaded thread
    pub async fn resolve(
        &self,
        api: &dyn MessagingApi,
        seeker_id: Option<&str>,
        history_len: usize,
    ) -> Result<Eligibility, MessagingError> {
        let seeker_id = match seeker_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                warn!("Eligibility requested without a job seeker id");
                return Ok(Eligibility::unknown());
            }
        };

        let has_history = history_len > 0;
        let finish = |status: ApplicationStatus, source: ResolutionSource| {
            let eligibility = Eligibility {
                seeker_id: Some(seeker_id.to_string()),
                status,
                source,
                has_history,
            };
            info!(
                "Eligibility for {}: status={} source={:?} can_message={}",
                seeker_id,
                eligibility.status,
                eligibility.source,
                eligibility.can_message()
            );
            eligibility
        };

        // Later strategies only run when earlier ones were inconclusive
        let first = status_endpoint(api, seeker_id).await?;
        let second = if first.is_conclusive() {
            Lookup::Inconclusive
        } else {
            existing_thread(history_len)
        };
        let third = if first.is_conclusive() || second.is_conclusive() {
            Lookup::Inconclusive
        } else {
            application_list(api, seeker_id).await?
        };

        let sources = [
            ResolutionSource::StatusEndpoint,
            ResolutionSource::ExistingThread,
            ResolutionSource::ApplicationList,
        ];

        Ok(match first_conclusive([first, second, third]) {
            Some((idx, Lookup::Resolved(status))) => finish(status, sources[idx]),
            Some((idx, Lookup::NotApplied)) => finish(ApplicationStatus::NotApplied, sources[idx]),
            Some((idx, Lookup::Grandfathered)) => finish(ApplicationStatus::Unknown, sources[idx]),
            Some((_, Lookup::Inconclusive)) | None => {
                finish(ApplicationStatus::Unknown, ResolutionSource::Exhausted)
            }
        })
    }
}
