//! Destination folders under the root.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use super::dates::month_subfolder;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Folder path '{0}' escapes the destination root")]
    OutsideRoot(String),
    #[error("Folder path is empty")]
    EmptyFolder,
}

/// Where a record's files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Absolute directory on disk.
    pub dir: PathBuf,
    /// Same directory relative to the root, `/`-separated, as stored in
    /// `server_path`.
    pub relative: String,
}

impl Destination {
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Value recorded on the document for a file in this folder.
    pub fn server_path(&self, filename: &str) -> String {
        format!("{}/{}", self.relative, filename)
    }
}

/// Resolve the folder for a case mapping and record date.
///
/// The mapped folder must stay inside `root`: absolute paths and `..`
/// components are rejected.
pub fn resolve_destination(
    root: &Path,
    folder: &str,
    date: Option<&str>,
) -> Result<Destination, LayoutError> {
    let folder = folder.trim_end_matches('/');
    if folder.trim().is_empty() {
        return Err(LayoutError::EmptyFolder);
    }

    let escapes = Path::new(folder)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(LayoutError::OutsideRoot(folder.to_string()));
    }

    let (dir, relative) = match month_subfolder(date) {
        Some(sub) => (root.join(folder).join(&sub), format!("{}/{}", folder, sub)),
        None => (root.join(folder), folder.to_string()),
    };

    Ok(Destination { dir, relative })
}
