//! Intellectual-property filing intake: the workflow and validation engine.
//!
//! A submission enters the [`engine::WorkflowEngine`] with a step number, a
//! field-value mapping, and zero or more uploads. Field rules run first, then
//! the patent claim dependency check, then attachment handling; results are
//! merged, and any failure rolls back every file written during the request
//! before it surfaces.

pub mod attachments;
pub mod claims;
pub mod domain;
pub mod engine;
pub mod repository;
pub mod router;
pub mod service;
pub mod state;
pub mod validation;

#[cfg(test)]
mod tests;

pub use attachments::{
    AttachmentBatch, AttachmentPolicy, FileStore, FileStoreError, FileUpload, LocalFileStore,
};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationStatusView, Attachment, Claim,
    ClaimType, FieldValue, FilingDomain,
};
pub use engine::{
    ApplicationDelta, EngineError, IntakePolicies, SubmissionRequest, WorkflowEngine,
};
pub use repository::{ApplicationRepository, RepositoryError};
pub use router::filing_router;
pub use service::{FilingService, FilingServiceError};
pub use state::{StepRequirements, TransitionViolation};
pub use validation::{ConfigurationFault, ValidationMode, Violation};
