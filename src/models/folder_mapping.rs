//! Case to folder mappings (`legal_case_folders`).

use std::collections::HashMap;

use serde::Deserialize;

/// A single row of the case folder mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FolderMapping {
    pub case_id: String,
    /// Folder path relative to the `Legal/` root.
    pub folder_path: String,
}

/// Lookup table from case id to the folder it migrates into.
#[derive(Debug, Clone, Default)]
pub struct CaseFolders {
    folders: HashMap<String, String>,
    mapping_count: usize,
}

impl CaseFolders {
    /// Index mapping rows by case. When a case has several rows, the first
    /// one to arrive wins.
    pub fn from_mappings(mappings: Vec<FolderMapping>) -> Self {
        let mapping_count = mappings.len();
        let mut folders: HashMap<String, String> = HashMap::new();
        for mapping in mappings {
            folders
                .entry(mapping.case_id)
                .or_insert(mapping.folder_path);
        }
        Self {
            folders,
            mapping_count,
        }
    }

    /// The folder a case migrates into.
    pub fn primary_folder(&self, case_id: &str) -> Option<&str> {
        self.folders.get(case_id).map(String::as_str)
    }

    /// Number of distinct cases with at least one mapping.
    pub fn case_count(&self) -> usize {
        self.folders.len()
    }

    /// Number of mapping rows loaded.
    pub fn mapping_count(&self) -> usize {
        self.mapping_count
    }
}
