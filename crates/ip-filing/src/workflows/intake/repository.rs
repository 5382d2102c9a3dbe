use super::domain::{Application, ApplicationId};

/// Storage abstraction so the service module can be exercised in isolation.
/// Implementations provide atomic single-document semantics; the engine never
/// assumes a transaction spanning multiple applications.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn fetch_by_reference(&self, reference: &str)
        -> Result<Option<Application>, RepositoryError>;
    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError>;
    /// Page is 1-based; ordering is by application id.
    fn list(&self, page: usize, limit: usize) -> Result<Vec<Application>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
