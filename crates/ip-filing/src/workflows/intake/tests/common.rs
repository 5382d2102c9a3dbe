use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::{json, Value};

use crate::workflows::intake::attachments::{FileStore, FileStoreError, FileUpload};
use crate::workflows::intake::domain::{
    Application, ApplicationId, Claim, ClaimType, FilingDomain,
};
use crate::workflows::intake::engine::IntakePolicies;
use crate::workflows::intake::repository::{ApplicationRepository, RepositoryError};
use crate::workflows::intake::service::FilingService;
use crate::workflows::intake::validation::Violation;

pub(super) fn application(domain: FilingDomain, suffix: &str) -> Application {
    Application::open(
        ApplicationId(format!("fil-test-{suffix}")),
        format!("{}-2026-9{suffix}", domain.reference_prefix()),
        domain,
        Utc::now(),
    )
}

pub(super) fn fields(value: Value) -> serde_json::Map<String, Value> {
    value
        .as_object()
        .expect("fixture fields must be a json object")
        .clone()
}

pub(super) fn patent_step1_fields() -> serde_json::Map<String, Value> {
    fields(json!({
        "applicant_name": "Ada Lovelace",
        "applicant_email": "ada@example.com",
        "entity_type": "individual",
    }))
}

pub(super) fn patent_step3_fields() -> serde_json::Map<String, Value> {
    fields(json!({
        "invention_title": "Adaptive Widget Tensioner",
        "technical_description": "A tensioning assembly that adapts widget alignment \
             under variable load using a cam-driven feedback linkage.",
    }))
}

pub(super) fn consultation_fields() -> serde_json::Map<String, Value> {
    fields(json!({
        "client_name": "Grace Hopper",
        "client_email": "grace@example.com",
        "topic": "patent",
        "summary": "Initial guidance on protecting a compiler optimization technique.",
    }))
}

pub(super) fn claim(number: u32, claim_type: ClaimType, depends_on: Option<u32>) -> Claim {
    Claim {
        claim_number: number,
        claim_text: format!("A device characterized by element {number} of the assembly."),
        claim_type,
        depends_on,
    }
}

pub(super) fn pdf_upload() -> FileUpload {
    FileUpload {
        original_name: "specification.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        bytes: vec![0x25, 0x50, 0x44, 0x46, 0x2d, 0x31, 0x2e, 0x37],
    }
}

pub(super) fn large_pdf_upload(size_bytes: usize) -> FileUpload {
    FileUpload {
        original_name: "bundle.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        bytes: vec![0u8; size_bytes],
    }
}

pub(super) fn exe_upload() -> FileUpload {
    FileUpload {
        original_name: "installer.exe".to_string(),
        mime_type: "application/x-msdownload".to_string(),
        bytes: vec![0x4d, 0x5a, 0x90, 0x00],
    }
}

pub(super) fn violation_fields(violations: &[Violation]) -> Vec<&str> {
    violations
        .iter()
        .map(|violation| violation.field.as_str())
        .collect()
}

pub(super) fn build_service() -> (
    FilingService<MemoryRepository, MemoryFileStore>,
    Arc<MemoryRepository>,
    Arc<MemoryFileStore>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let files = Arc::new(MemoryFileStore::default());
    let service = FilingService::new(repository.clone(), files.clone(), IntakePolicies::standard());
    (service, repository, files)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.application_id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.application_id) {
            guard.insert(application.application_id.clone(), application);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|application| application.reference == reference)
            .cloned())
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.remove(id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn list(&self, page: usize, limit: usize) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut applications: Vec<Application> = guard.values().cloned().collect();
        applications.sort_by(|a, b| a.application_id.cmp(&b.application_id));
        Ok(applications
            .into_iter()
            .skip(page.saturating_sub(1).saturating_mul(limit))
            .take(limit)
            .collect())
    }
}

/// Accepts inserts and reads but fails every update, for exercising the
/// rollback path after the engine has written files.
#[derive(Default)]
pub(super) struct FailingUpdateRepository {
    inner: MemoryRepository,
}

impl ApplicationRepository for FailingUpdateRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.insert(application)
    }

    fn update(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn fetch_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_by_reference(reference)
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        self.inner.delete(id)
    }

    fn list(&self, page: usize, limit: usize) -> Result<Vec<Application>, RepositoryError> {
        self.inner.list(page, limit)
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_by_reference(
        &self,
        _reference: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &ApplicationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _page: usize, _limit: usize) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// File store recording writes in memory so tests can assert the
/// all-or-nothing discipline.
#[derive(Default)]
pub(super) struct MemoryFileStore {
    files: Mutex<BTreeSet<(String, String)>>,
}

impl MemoryFileStore {
    pub(super) fn stored(&self) -> Vec<(String, String)> {
        self.files
            .lock()
            .expect("file store mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.files
            .lock()
            .expect("file store mutex poisoned")
            .is_empty()
    }
}

impl FileStore for MemoryFileStore {
    fn write(
        &self,
        partition: &str,
        stored_name: &str,
        _bytes: &[u8],
    ) -> Result<(), FileStoreError> {
        self.files
            .lock()
            .expect("file store mutex poisoned")
            .insert((partition.to_string(), stored_name.to_string()));
        Ok(())
    }

    fn delete(&self, partition: &str, stored_name: &str) -> Result<(), FileStoreError> {
        self.files
            .lock()
            .expect("file store mutex poisoned")
            .remove(&(partition.to_string(), stored_name.to_string()));
        Ok(())
    }
}

/// Fails every write after the first `allow` successes; deletes still work so
/// rollback can be observed.
pub(super) struct FlakyFileStore {
    pub(super) allow: usize,
    pub(super) inner: MemoryFileStore,
    writes: Mutex<usize>,
}

impl FlakyFileStore {
    pub(super) fn new(allow: usize) -> Self {
        Self {
            allow,
            inner: MemoryFileStore::default(),
            writes: Mutex::new(0),
        }
    }
}

impl FileStore for FlakyFileStore {
    fn write(
        &self,
        partition: &str,
        stored_name: &str,
        bytes: &[u8],
    ) -> Result<(), FileStoreError> {
        let mut writes = self.writes.lock().expect("write counter poisoned");
        if *writes >= self.allow {
            return Err(FileStoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        *writes += 1;
        self.inner.write(partition, stored_name, bytes)
    }

    fn delete(&self, partition: &str, stored_name: &str) -> Result<(), FileStoreError> {
        self.inner.delete(partition, stored_name)
    }
}
