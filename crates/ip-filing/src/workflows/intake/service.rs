use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Datelike, Utc};

use super::attachments::{FileStore, FileStoreError};
use super::domain::{Application, ApplicationId, ApplicationStatus, FilingDomain};
use super::engine::{EngineError, IntakePolicies, SubmissionRequest, WorkflowEngine};
use super::repository::{ApplicationRepository, RepositoryError};
use super::state::{self, TransitionViolation};

/// Facade composing the workflow engine, repository, and file store for one
/// filing at a time.
pub struct FilingService<R, S> {
    repository: Arc<R>,
    files: Arc<S>,
    engine: WorkflowEngine,
}

static PATENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static COPYRIGHT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CONSULTATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// References count up independently per domain, so a consultation never
/// consumes a patent number.
fn domain_sequence(domain: FilingDomain) -> &'static AtomicU64 {
    match domain {
        FilingDomain::Patent => &PATENT_SEQUENCE,
        FilingDomain::Copyright => &COPYRIGHT_SEQUENCE,
        FilingDomain::Consultation => &CONSULTATION_SEQUENCE,
    }
}

fn next_identifiers(domain: FilingDomain, year: i32) -> (ApplicationId, String) {
    let sequence = domain_sequence(domain).fetch_add(1, Ordering::Relaxed);
    let prefix = domain.reference_prefix();
    let id = ApplicationId(format!("fil-{}-{sequence:06}", prefix.to_ascii_lowercase()));
    let reference = format!("{prefix}-{year}-{sequence:05}");
    (id, reference)
}

impl<R, S> FilingService<R, S>
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    pub fn new(repository: Arc<R>, files: Arc<S>, policies: IntakePolicies) -> Self {
        Self {
            repository,
            files,
            engine: WorkflowEngine::new(policies),
        }
    }

    /// Open a fresh draft for a domain and persist it.
    pub fn open(&self, domain: FilingDomain) -> Result<Application, FilingServiceError> {
        let now = Utc::now();
        let (id, reference) = next_identifiers(domain, now.year());
        let application = Application::open(id, reference, domain, now);
        let stored = self.repository.insert(application)?;
        Ok(stored)
    }

    /// Fetch by opaque id or public reference.
    pub fn get(&self, key: &str) -> Result<Application, FilingServiceError> {
        self.load(key)
    }

    pub fn list(&self, page: usize, limit: usize) -> Result<Vec<Application>, FilingServiceError> {
        Ok(self.repository.list(page, limit)?)
    }

    /// Run one submission or update request through the workflow engine and
    /// persist the accepted delta.
    ///
    /// The attachment batch stays uncommitted until the repository update
    /// succeeds; a persistence failure drops it and removes every file
    /// written during this request.
    pub fn submit(
        &self,
        key: &str,
        request: SubmissionRequest,
    ) -> Result<Application, FilingServiceError> {
        let mut application = self.load(key)?;
        let now = Utc::now();
        let (delta, batch) = self
            .engine
            .process(&application, request, self.files.as_ref(), now)?;
        delta.apply(&mut application, now);
        self.repository.update(application.clone())?;
        batch.commit();
        Ok(application)
    }

    /// Explicit status update, bounded by the domain's status set and the
    /// terminal-state rule.
    pub fn update_status(
        &self,
        key: &str,
        requested: ApplicationStatus,
    ) -> Result<Application, FilingServiceError> {
        let mut application = self.load(key)?;
        application.status = state::update_status(&application, requested)?;
        application.updated_at = Utc::now();
        self.repository.update(application.clone())?;
        Ok(application)
    }

    /// The explicit resubmission path out of `rejected`.
    pub fn resubmit(&self, key: &str) -> Result<Application, FilingServiceError> {
        let mut application = self.load(key)?;
        application.status = state::resubmit(&application)?;
        application.updated_at = Utc::now();
        self.repository.update(application.clone())?;
        Ok(application)
    }

    /// Explicit backward step movement, distinct from step advancement.
    pub fn revert_step(&self, key: &str, step: u8) -> Result<Application, FilingServiceError> {
        let mut application = self.load(key)?;
        application.current_step = state::revert_step(&application, step)?;
        application.updated_at = Utc::now();
        self.repository.update(application.clone())?;
        Ok(application)
    }

    /// Mark one required document complete or incomplete.
    pub fn set_document(
        &self,
        key: &str,
        document: u8,
        complete: bool,
    ) -> Result<Application, FilingServiceError> {
        let mut application = self.load(key)?;
        state::check_document(application.domain, document)?;
        if complete {
            application.completed_documents.insert(document);
        } else {
            application.completed_documents.remove(&document);
        }
        application.updated_at = Utc::now();
        self.repository.update(application.clone())?;
        Ok(application)
    }

    /// Delete one attachment record and its backing file.
    pub fn delete_attachment(
        &self,
        key: &str,
        stored_name: &str,
    ) -> Result<Application, FilingServiceError> {
        let mut application = self.load(key)?;
        if application.attachment(stored_name).is_none() {
            return Err(FilingServiceError::AttachmentMissing(
                stored_name.to_string(),
            ));
        }
        self.files
            .delete(application.domain.storage_partition(), stored_name)?;
        application
            .attachments
            .retain(|attachment| attachment.stored_name != stored_name);
        application.updated_at = Utc::now();
        self.repository.update(application.clone())?;
        Ok(application)
    }

    /// Delete an application together with every file it owns.
    pub fn delete(&self, key: &str) -> Result<(), FilingServiceError> {
        let application = self.load(key)?;
        let partition = application.domain.storage_partition();
        for attachment in &application.attachments {
            self.files.delete(partition, &attachment.stored_name)?;
        }
        self.repository.delete(&application.application_id)?;
        tracing::info!(
            reference = %application.reference,
            attachments = application.attachments.len(),
            "deleted application and its attachments"
        );
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Application, FilingServiceError> {
        if let Some(application) = self.repository.fetch(&ApplicationId(key.to_string()))? {
            return Ok(application);
        }
        self.repository
            .fetch_by_reference(key)?
            .ok_or(FilingServiceError::Repository(RepositoryError::NotFound))
    }
}

/// Error raised by the filing service.
#[derive(Debug, thiserror::Error)]
pub enum FilingServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Transition(#[from] TransitionViolation),
    #[error(transparent)]
    Files(#[from] FileStoreError),
    #[error("attachment '{0}' not found")]
    AttachmentMissing(String),
}
