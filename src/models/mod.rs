//! Data models for the migration.

mod document;
mod folder_mapping;

pub use document::{AttachmentRef, DocumentRow, Ineligible, LegalDocument, DOCUMENT_COLUMNS};
pub use folder_mapping::{CaseFolders, FolderMapping};
