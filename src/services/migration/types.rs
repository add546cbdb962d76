//! Migration service types and events.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::layout::LayoutError;
use crate::remote::RemoteError;
use crate::repository::PendingFilter;

/// Configuration for a migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Root of the `Legal/` tree.
    pub root: PathBuf,
    /// Storage bucket holding the attachments.
    pub bucket: String,
    /// Preview only: no downloads, writes or record updates.
    pub dry_run: bool,
    pub filter: PendingFilter,
}

/// Events emitted while migrating, in processing order.
#[derive(Debug, Clone)]
pub enum MigrationEvent {
    /// Folder mappings loaded.
    MappingsLoaded { mappings: usize, cases: usize },
    /// Pending documents loaded.
    DocumentsLoaded { count: usize },
    /// Document has no case or no folder for its case.
    SkippedNoMapping {
        index: usize,
        total: usize,
        document: SkippedDocument,
    },
    /// Processing a document into `destination` (relative to the root).
    DocumentStarted {
        index: usize,
        total: usize,
        title: String,
        destination: String,
    },
    /// Name chosen for one attachment.
    AttachmentPlanned {
        index: usize,
        total: usize,
        original_name: String,
        new_name: String,
    },
    /// Dry run: where the attachment would be written.
    WouldSave { path: PathBuf },
    /// Attachment written to disk.
    Saved { path: PathBuf, bytes: u64 },
    /// Document row updated with its new location.
    RecordUpdated { server_path: String },
    /// Processing failed for one attachment (or a whole document).
    Failed(FailedAttachment),
}

/// A document left alone because its case has no folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub id: String,
    pub title: String,
    pub case_id: Option<String>,
}

/// A failure recorded against a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttachment {
    pub id: String,
    pub title: String,
    /// Attachment reference, or `None` when the whole document failed.
    pub attachment: Option<String>,
    pub error: String,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub dry_run: bool,
    /// Eligible documents loaded.
    pub total: usize,
    /// Attachments downloaded and written.
    pub migrated: usize,
    /// Documents whose server path was set.
    pub documents_updated: usize,
    /// Attachments previewed in a dry run.
    pub planned: usize,
    pub bytes_written: u64,
    pub skipped_no_mapping: Vec<SkippedDocument>,
    pub errors: Vec<FailedAttachment>,
}

/// Errors from migrating a document or attachment.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MigrationError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MigrationError::Io {
            path: path.into(),
            source,
        }
    }
}
