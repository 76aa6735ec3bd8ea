// src/types/application.rs
//! Application pipeline status as seen by the messaging gate

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::utils::normalize_status;

/// Status of a job seeker's application(s) to the current employer's postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    NotApplied,
    Pending,
    Shortlisted,
    Interview,
    Accepted,
    Hired,
    Rejected,
    /// Workflow status the portal knows nothing about
    Other(String),
    Unknown,
}

impl ApplicationStatus {
    pub fn parse(raw: &str) -> Self {
        match normalize_status(raw).as_str() {
            "" | "unknown" => Self::Unknown,
            "not_applied" | "none" => Self::NotApplied,
            "pending" | "applied" => Self::Pending,
            "shortlisted" => Self::Shortlisted,
            "interview" | "interviewing" | "interview_scheduled" => Self::Interview,
            "accepted" => Self::Accepted,
            "hired" => Self::Hired,
            "rejected" => Self::Rejected,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotApplied => "not_applied",
            Self::Pending => "pending",
            Self::Shortlisted => "shortlisted",
            Self::Interview => "interview",
            Self::Accepted => "accepted",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
            Self::Other(raw) => raw,
            Self::Unknown => "unknown",
        }
    }

    /// Human label used in user-facing notices
    pub fn label(&self) -> String {
        match self {
            Self::NotApplied => "Not applied".to_string(),
            Self::Pending => "Pending".to_string(),
            Self::Shortlisted => "Shortlisted".to_string(),
            Self::Interview => "Interview".to_string(),
            Self::Accepted => "Accepted".to_string(),
            Self::Hired => "Hired".to_string(),
            Self::Rejected => "Rejected".to_string(),
            Self::Unknown => "Unknown".to_string(),
            Self::Other(raw) => {
                let spaced = raw.replace('_', " ");
                let mut chars = spaced.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => "Unknown".to_string(),
                }
            }
        }
    }

    pub fn permits_messaging(&self) -> bool {
        matches!(
            self,
            Self::Shortlisted | Self::Interview | Self::Accepted | Self::Hired
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ApplicationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApplicationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .map(|s| Self::parse(&s))
            .unwrap_or(ApplicationStatus::Unknown))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRef {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One application from the employer's applicant list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "applicant", alias = "jobseeker")]
    pub job_seeker: Option<ApplicantRef>,
    #[serde(default, alias = "jobSeekerId", alias = "applicantId")]
    pub job_seeker_id: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default = "unknown_status")]
    pub status: ApplicationStatus,
}

fn unknown_status() -> ApplicationStatus {
    ApplicationStatus::Unknown
}

impl ApplicationRecord {
    /// Applicant id, whether embedded or referenced
    pub fn seeker_id(&self) -> Option<&str> {
        self.job_seeker
            .as_ref()
            .map(|s| s.id.as_str())
            .or(self.job_seeker_id.as_deref())
    }
}

/// Outcome of the dedicated per-seeker status endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLookup {
    NotApplied,
    Status(ApplicationStatus),
}
