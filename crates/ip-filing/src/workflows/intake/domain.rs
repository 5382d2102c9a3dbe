use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for filed applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Filing domain determining which rule tables, steps, and statuses apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FilingDomain {
    Patent,
    Copyright,
    Consultation,
}

impl FilingDomain {
    pub const fn label(self) -> &'static str {
        match self {
            FilingDomain::Patent => "patent",
            FilingDomain::Copyright => "copyright",
            FilingDomain::Consultation => "consultation",
        }
    }

    /// Upper bound of the domain's intake steps (inclusive, starting at 1).
    pub const fn max_step(self) -> u8 {
        match self {
            FilingDomain::Patent => 7,
            FilingDomain::Copyright => 5,
            FilingDomain::Consultation => 1,
        }
    }

    pub const fn reference_prefix(self) -> &'static str {
        match self {
            FilingDomain::Patent => "PAT",
            FilingDomain::Copyright => "CPR",
            FilingDomain::Consultation => "CNS",
        }
    }

    /// Directory name for the domain's attachment partition.
    pub const fn storage_partition(self) -> &'static str {
        match self {
            FilingDomain::Patent => "patents",
            FilingDomain::Copyright => "copyrights",
            FilingDomain::Consultation => "consultations",
        }
    }

    pub const fn initial_status(self) -> ApplicationStatus {
        match self {
            FilingDomain::Patent | FilingDomain::Copyright => ApplicationStatus::Draft,
            FilingDomain::Consultation => ApplicationStatus::Pending,
        }
    }

    /// The closed status set reachable within this domain's lifecycle.
    pub const fn statuses(self) -> &'static [ApplicationStatus] {
        match self {
            FilingDomain::Patent => &[
                ApplicationStatus::Draft,
                ApplicationStatus::Submitted,
                ApplicationStatus::UnderReview,
                ApplicationStatus::PriorArtSearch,
                ApplicationStatus::Published,
                ApplicationStatus::Examined,
                ApplicationStatus::Granted,
                ApplicationStatus::Rejected,
            ],
            FilingDomain::Copyright => &[
                ApplicationStatus::Draft,
                ApplicationStatus::Submitted,
                ApplicationStatus::UnderReview,
                ApplicationStatus::Published,
                ApplicationStatus::Registered,
                ApplicationStatus::Rejected,
            ],
            FilingDomain::Consultation => &[
                ApplicationStatus::Pending,
                ApplicationStatus::Confirmed,
                ApplicationStatus::Completed,
                ApplicationStatus::Cancelled,
            ],
        }
    }

    pub fn allows_status(self, status: ApplicationStatus) -> bool {
        self.statuses().contains(&status)
    }

    /// Fixed document-type identifiers tracked for the domain.
    pub const fn document_types(self) -> &'static [u8] {
        match self {
            FilingDomain::Patent => &[1, 2, 3, 4],
            FilingDomain::Copyright => &[1, 2, 3],
            FilingDomain::Consultation => &[1],
        }
    }
}

/// Disposition of an application within its domain lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    PriorArtSearch,
    Published,
    Examined,
    Granted,
    Registered,
    Rejected,
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::PriorArtSearch => "prior_art_search",
            ApplicationStatus::Published => "published",
            ApplicationStatus::Examined => "examined",
            ApplicationStatus::Granted => "granted",
            ApplicationStatus::Registered => "registered",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Confirmed => "confirmed",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal dispositions admit no further status updates except the
    /// explicit resubmission path out of `Rejected`.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Granted
                | ApplicationStatus::Registered
                | ApplicationStatus::Rejected
                | ApplicationStatus::Completed
                | ApplicationStatus::Cancelled
        )
    }
}

/// A validated field value held by an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Flag(bool),
    List(Vec<String>),
    Date(NaiveDate),
}

/// One uploaded file bound to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub stored_name: String,
    pub original_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Independent,
    Dependent,
}

/// A patent claim, independent or dependent on an earlier claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_number: u32,
    pub claim_text: String,
    pub claim_type: ClaimType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<u32>,
}

/// The aggregate under validation: one filing with its accumulated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub application_id: ApplicationId,
    /// Human-readable public reference, e.g. `PAT-2026-00001`.
    pub reference: String,
    pub domain: FilingDomain,
    pub current_step: u8,
    pub status: ApplicationStatus,
    pub fields: BTreeMap<String, FieldValue>,
    pub completed_documents: BTreeSet<u8>,
    pub attachments: Vec<Attachment>,
    pub claims: Vec<Claim>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn open(
        application_id: ApplicationId,
        reference: String,
        domain: FilingDomain,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            application_id,
            reference,
            domain,
            current_step: 1,
            status: domain.initial_status(),
            fields: BTreeMap::new(),
            completed_documents: BTreeSet::new(),
            attachments: Vec::new(),
            claims: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn attachment(&self, stored_name: &str) -> Option<&Attachment> {
        self.attachments
            .iter()
            .find(|attachment| attachment.stored_name == stored_name)
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.application_id.clone(),
            reference: self.reference.clone(),
            domain: self.domain.label(),
            current_step: self.current_step,
            status: self.status.label(),
            completed_documents: self.completed_documents.iter().copied().collect(),
            attachment_count: self.attachments.len(),
            claim_count: self.claims.len(),
        }
    }
}

/// Sanitized representation of an application's exposed state.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub reference: String,
    pub domain: &'static str,
    pub current_step: u8,
    pub status: &'static str,
    pub completed_documents: Vec<u8>,
    pub attachment_count: usize,
    pub claim_count: usize,
}
