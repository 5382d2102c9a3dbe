//! Attachment validation, storage, and all-or-nothing rollback.
//!
//! Files accepted during a request are staged through an [`AttachmentBatch`].
//! The batch deletes everything it wrote unless explicitly committed, so a
//! failure later in the same request (field validation, claim check, state
//! transition, persistence) can never leave orphaned files behind. This also
//! covers the case where the request is abandoned mid-flight and the batch is
//! simply dropped.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use super::domain::{Attachment, FilingDomain};
use super::validation::Violation;

/// Per-domain upload policy: MIME allow-list, size cap, and per-request count.
#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    pub allowed_types: Vec<String>,
    pub max_size_bytes: u64,
    pub max_files: usize,
}

const DOCUMENT_TYPES: [&str; 5] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
];

impl AttachmentPolicy {
    pub fn for_domain(domain: FilingDomain) -> Self {
        let max_size_bytes = match domain {
            FilingDomain::Consultation => 10 * 1024 * 1024,
            FilingDomain::Patent | FilingDomain::Copyright => 20 * 1024 * 1024,
        };

        Self {
            allowed_types: DOCUMENT_TYPES.iter().map(|kind| kind.to_string()).collect(),
            max_size_bytes,
            max_files: 10,
        }
    }

    /// Check one candidate file; every violated rule is reported.
    pub fn validate_upload(&self, index: usize, upload: &FileUpload) -> Vec<Violation> {
        let field = format!("files[{index}]");
        let mut violations = Vec::new();

        if upload.original_name.trim().is_empty() {
            violations.push(Violation::new(
                field.clone(),
                "original_name",
                "uploaded files must carry an original name",
            ));
        }

        match upload.mime_type.parse::<mime::Mime>() {
            Ok(parsed) => {
                let essence = parsed.essence_str();
                if !self.allowed_types.iter().any(|allowed| allowed == essence) {
                    violations.push(Violation::new(
                        field.clone(),
                        "mime_type",
                        format!("{essence} is not an accepted file type"),
                    ));
                }
            }
            Err(_) => violations.push(Violation::new(
                field.clone(),
                "mime_type",
                format!("'{}' is not a valid MIME type", upload.mime_type),
            )),
        }

        let size = upload.bytes.len() as u64;
        if size == 0 {
            violations.push(Violation::new(field, "size", "uploaded files must not be empty"));
        } else if size > self.max_size_bytes {
            violations.push(Violation::new(
                field,
                "size",
                format!(
                    "file exceeds the {} byte limit ({size} bytes)",
                    self.max_size_bytes
                ),
            ));
        }

        violations
    }

    pub fn validate_count(&self, count: usize) -> Option<Violation> {
        (count > self.max_files).then(|| {
            Violation::new(
                "files",
                "max_files",
                format!("at most {} files may be submitted per request", self.max_files),
            )
        })
    }
}

/// One candidate file as received by the transport layer.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Error enumeration for file-store failures.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("file store io failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage abstraction so the engine can be exercised without a filesystem.
pub trait FileStore: Send + Sync {
    fn write(
        &self,
        partition: &str,
        stored_name: &str,
        bytes: &[u8],
    ) -> Result<(), FileStoreError>;

    /// Idempotent: deleting a missing file succeeds.
    fn delete(&self, partition: &str, stored_name: &str) -> Result<(), FileStoreError>;
}

/// Filesystem-backed store; partitions are directories created lazily under
/// the configured root.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, partition: &str, stored_name: &str) -> PathBuf {
        self.root.join(partition).join(stored_name)
    }
}

impl FileStore for LocalFileStore {
    fn write(
        &self,
        partition: &str,
        stored_name: &str,
        bytes: &[u8],
    ) -> Result<(), FileStoreError> {
        let directory = self.root.join(partition);
        fs::create_dir_all(&directory)?;
        fs::write(directory.join(stored_name), bytes)?;
        Ok(())
    }

    fn delete(&self, partition: &str, stored_name: &str) -> Result<(), FileStoreError> {
        match fs::remove_file(self.path_for(partition, stored_name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

static UPLOAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Collision-resistant stored name: upload instant, a monotonic suffix, and
/// the sanitized original extension.
fn stored_name_for(original_name: &str, now: DateTime<Utc>) -> String {
    let sequence = UPLOAD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ext.chars()
                .filter(char::is_ascii_alphanumeric)
                .take(10)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|ext| !ext.is_empty());

    match extension {
        Some(ext) => format!("{}-{sequence:06}.{ext}", now.timestamp_millis()),
        None => format!("{}-{sequence:06}", now.timestamp_millis()),
    }
}

/// Tracks every file written during one request and rolls them back unless
/// the request commits.
pub struct AttachmentBatch<'a> {
    store: &'a dyn FileStore,
    partition: &'static str,
    staged: Vec<Attachment>,
    committed: bool,
}

impl<'a> AttachmentBatch<'a> {
    pub fn new(store: &'a dyn FileStore, partition: &'static str) -> Self {
        Self {
            store,
            partition,
            staged: Vec::new(),
            committed: false,
        }
    }

    /// Write one accepted upload; the file is rolled back with the batch on
    /// failure or drop.
    pub fn stage(
        &mut self,
        upload: &FileUpload,
        now: DateTime<Utc>,
    ) -> Result<(), FileStoreError> {
        let stored_name = stored_name_for(&upload.original_name, now);
        self.store
            .write(self.partition, &stored_name, &upload.bytes)?;
        self.staged.push(Attachment {
            stored_name,
            original_name: upload.original_name.clone(),
            size_bytes: upload.bytes.len() as u64,
            mime_type: upload.mime_type.clone(),
            uploaded_at: now,
        });
        Ok(())
    }

    /// Records staged so far, without giving up the rollback guard.
    pub fn staged(&self) -> &[Attachment] {
        &self.staged
    }

    /// Keep every staged file and hand the records to the caller.
    pub fn commit(mut self) -> Vec<Attachment> {
        self.committed = true;
        std::mem::take(&mut self.staged)
    }
}

impl fmt::Debug for AttachmentBatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentBatch")
            .field("partition", &self.partition)
            .field("staged", &self.staged)
            .field("committed", &self.committed)
            .finish()
    }
}

impl Drop for AttachmentBatch<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for attachment in self.staged.drain(..) {
            if let Err(err) = self.store.delete(self.partition, &attachment.stored_name) {
                tracing::warn!(
                    stored_name = %attachment.stored_name,
                    partition = self.partition,
                    error = %err,
                    "failed to roll back staged attachment"
                );
            }
        }
    }
}
