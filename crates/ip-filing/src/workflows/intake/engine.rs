//! One-request orchestration of field validation, claim checking, attachment
//! writes, and the step transition.
//!
//! Violations from every check are aggregated before anything is written; a
//! failure after files have been staged rolls those files back before the
//! error surfaces, so a partially applied request is never observable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::attachments::{AttachmentBatch, AttachmentPolicy, FileStore, FileStoreError, FileUpload};
use super::claims;
use super::domain::{Application, Attachment, Claim, FieldValue, FilingDomain};
use super::state::{self, StepRequirements, TransitionViolation};
use super::validation::{self, ConfigurationFault, ValidationMode, Violation};

/// Externally configured policy tables consumed by the engine.
#[derive(Debug, Clone)]
pub struct IntakePolicies {
    attachments: BTreeMap<FilingDomain, AttachmentPolicy>,
    step_requirements: BTreeMap<FilingDomain, StepRequirements>,
}

impl IntakePolicies {
    /// Default policy set: standard attachment rules, no document gates.
    pub fn standard() -> Self {
        let domains = [
            FilingDomain::Patent,
            FilingDomain::Copyright,
            FilingDomain::Consultation,
        ];
        Self {
            attachments: domains
                .iter()
                .map(|domain| (*domain, AttachmentPolicy::for_domain(*domain)))
                .collect(),
            step_requirements: domains
                .iter()
                .map(|domain| (*domain, StepRequirements::none()))
                .collect(),
        }
    }

    pub fn with_attachment_policy(mut self, domain: FilingDomain, policy: AttachmentPolicy) -> Self {
        self.attachments.insert(domain, policy);
        self
    }

    pub fn with_step_requirements(
        mut self,
        domain: FilingDomain,
        requirements: StepRequirements,
    ) -> Self {
        self.step_requirements.insert(domain, requirements);
        self
    }

    fn attachment_policy(&self, domain: FilingDomain) -> Result<&AttachmentPolicy, ConfigurationFault> {
        self.attachments
            .get(&domain)
            .ok_or(ConfigurationFault::MissingRuleTable { domain, step: 0 })
    }

    fn requirements(&self, domain: FilingDomain) -> Result<&StepRequirements, ConfigurationFault> {
        self.step_requirements
            .get(&domain)
            .ok_or(ConfigurationFault::MissingRuleTable { domain, step: 0 })
    }
}

/// One inbound submission or update against an application.
#[derive(Debug, Default)]
pub struct SubmissionRequest {
    /// Requested step advancement, if any.
    pub step: Option<u8>,
    pub mode: ValidationMode,
    pub fields: serde_json::Map<String, Value>,
    pub claims: Option<Vec<Claim>>,
    pub files: Vec<FileUpload>,
}

/// The accepted, fully validated outcome handed to the storage collaborator.
#[derive(Debug)]
pub struct ApplicationDelta {
    pub fields: BTreeMap<String, FieldValue>,
    pub claims: Option<Vec<Claim>>,
    pub attachments: Vec<Attachment>,
    pub step: Option<u8>,
}

impl ApplicationDelta {
    pub fn apply(self, application: &mut Application, now: DateTime<Utc>) {
        application.fields.extend(self.fields);
        if let Some(claims) = self.claims {
            application.claims = claims;
        }
        application.attachments.extend(self.attachments);
        if let Some(step) = self.step {
            application.current_step = step;
        }
        application.updated_at = now;
    }
}

/// Error taxonomy surfaced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation failed with {} violation(s)", .0.len())]
    Validation(Vec<Violation>),
    #[error(transparent)]
    Transition(#[from] TransitionViolation),
    #[error(transparent)]
    Storage(#[from] FileStoreError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationFault),
}

/// Stateless orchestrator: invoked once per inbound request.
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    policies: IntakePolicies,
}

impl WorkflowEngine {
    pub fn new(policies: IntakePolicies) -> Self {
        Self { policies }
    }

    pub fn policies(&self) -> &IntakePolicies {
        &self.policies
    }

    /// Run the full validation pipeline for one request and produce the delta
    /// to persist, or the aggregated failure.
    ///
    /// The returned batch still owns the files written for this request; the
    /// caller commits it only after the delta has been persisted, so dropping
    /// it on any later failure removes them again.
    pub fn process<'a>(
        &self,
        application: &Application,
        request: SubmissionRequest,
        store: &'a dyn FileStore,
        now: DateTime<Utc>,
    ) -> Result<(ApplicationDelta, AttachmentBatch<'a>), EngineError> {
        let domain = application.domain;
        let step_under_validation = request.step.unwrap_or(application.current_step);

        let outcome = validation::validate_fields(
            domain,
            step_under_validation,
            request.mode,
            &request.fields,
            now,
        )?;
        let mut violations = outcome.violations;

        if let Some(claims) = request.claims.as_deref() {
            if domain == FilingDomain::Patent {
                violations.extend(claims::validate_claims(claims));
            } else {
                violations.push(Violation::new(
                    "claims",
                    "unsupported",
                    format!("claims do not apply to {} filings", domain.label()),
                ));
            }
        }

        let policy = self.policies.attachment_policy(domain)?;
        if let Some(violation) = policy.validate_count(request.files.len()) {
            violations.push(violation);
        }
        for (index, upload) in request.files.iter().enumerate() {
            violations.extend(policy.validate_upload(index, upload));
        }

        if !violations.is_empty() {
            return Err(EngineError::Validation(violations));
        }

        // Everything below may write files; the batch rolls them back if the
        // remaining checks fail.
        let mut batch = AttachmentBatch::new(store, domain.storage_partition());
        for upload in &request.files {
            batch.stage(upload, now)?;
        }

        let step = match request.step {
            Some(requested) => {
                let requirements = self.policies.requirements(domain)?;
                Some(state::advance_step(application, requested, requirements)?)
            }
            None => None,
        };

        let delta = ApplicationDelta {
            fields: outcome.accepted,
            claims: request.claims,
            attachments: batch.staged().to_vec(),
            step,
        };
        Ok((delta, batch))
    }
}
