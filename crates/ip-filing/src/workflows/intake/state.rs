//! Step and status transitions.
//!
//! Step advancement only moves forward (same-or-higher target within the
//! domain bound); backward movement goes through the distinct revert
//! operation. Status updates accept any status the domain defines, except
//! out of a terminal status, where only the explicit resubmission path
//! (`rejected -> submitted`) remains open.

use std::collections::{BTreeMap, BTreeSet};

use super::domain::{Application, ApplicationStatus, FilingDomain};

/// Rejected step or status transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionViolation {
    #[error("step {requested} is outside the {} bound 1..={max}", domain.label())]
    StepOutOfRange {
        domain: FilingDomain,
        requested: u8,
        max: u8,
    },
    #[error("step advancement cannot move backward from {current} to {requested}; use revert")]
    BackwardStep { current: u8, requested: u8 },
    #[error("revert target {requested} must be below the current step {current}")]
    InvalidRevert { current: u8, requested: u8 },
    #[error("step {requested} requires completed documents {missing:?}")]
    MissingDocuments { requested: u8, missing: BTreeSet<u8> },
    #[error("status '{}' is not defined for {} filings", status.label(), domain.label())]
    ForeignStatus {
        domain: FilingDomain,
        status: ApplicationStatus,
    },
    #[error("status '{}' is terminal and accepts no further updates", current.label())]
    TerminalStatus { current: ApplicationStatus },
    #[error("only rejected filings may be resubmitted (current status '{}')", current.label())]
    NotResubmittable { current: ApplicationStatus },
    #[error("document type {document} is not tracked for {} filings", domain.label())]
    UnknownDocument { domain: FilingDomain, document: u8 },
}

/// Externally supplied policy: which document types must be complete before
/// a step can be entered. Never hard-coded in the engine.
#[derive(Debug, Clone, Default)]
pub struct StepRequirements {
    required: BTreeMap<u8, BTreeSet<u8>>,
}

impl StepRequirements {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn require(mut self, step: u8, documents: impl IntoIterator<Item = u8>) -> Self {
        self.required
            .entry(step)
            .or_default()
            .extend(documents);
        self
    }

    fn missing_for(&self, step: u8, completed: &BTreeSet<u8>) -> BTreeSet<u8> {
        self.required
            .get(&step)
            .map(|needed| needed.difference(completed).copied().collect())
            .unwrap_or_default()
    }
}

/// Validate a step-advancement request, returning the accepted target step.
pub fn advance_step(
    application: &Application,
    requested: u8,
    requirements: &StepRequirements,
) -> Result<u8, TransitionViolation> {
    let domain = application.domain;
    let max = domain.max_step();
    if requested == 0 || requested > max {
        return Err(TransitionViolation::StepOutOfRange {
            domain,
            requested,
            max,
        });
    }
    if requested < application.current_step {
        return Err(TransitionViolation::BackwardStep {
            current: application.current_step,
            requested,
        });
    }

    let missing = requirements.missing_for(requested, &application.completed_documents);
    if !missing.is_empty() {
        return Err(TransitionViolation::MissingDocuments { requested, missing });
    }

    Ok(requested)
}

/// Validate an explicit backward step request.
pub fn revert_step(application: &Application, requested: u8) -> Result<u8, TransitionViolation> {
    let domain = application.domain;
    let max = domain.max_step();
    if requested == 0 || requested > max {
        return Err(TransitionViolation::StepOutOfRange {
            domain,
            requested,
            max,
        });
    }
    if requested >= application.current_step {
        return Err(TransitionViolation::InvalidRevert {
            current: application.current_step,
            requested,
        });
    }
    Ok(requested)
}

/// Validate an explicit status update.
pub fn update_status(
    application: &Application,
    requested: ApplicationStatus,
) -> Result<ApplicationStatus, TransitionViolation> {
    if application.status.is_terminal() {
        return Err(TransitionViolation::TerminalStatus {
            current: application.status,
        });
    }
    if !application.domain.allows_status(requested) {
        return Err(TransitionViolation::ForeignStatus {
            domain: application.domain,
            status: requested,
        });
    }
    Ok(requested)
}

/// The one sanctioned exit from a terminal status: `rejected -> submitted`.
pub fn resubmit(application: &Application) -> Result<ApplicationStatus, TransitionViolation> {
    if application.status != ApplicationStatus::Rejected {
        return Err(TransitionViolation::NotResubmittable {
            current: application.status,
        });
    }
    Ok(ApplicationStatus::Submitted)
}

/// Check that a document type belongs to the domain's fixed set before it is
/// marked complete or incomplete.
pub fn check_document(domain: FilingDomain, document: u8) -> Result<(), TransitionViolation> {
    if domain.document_types().contains(&document) {
        Ok(())
    } else {
        Err(TransitionViolation::UnknownDocument { domain, document })
    }
}
