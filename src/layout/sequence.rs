//! Sequence numbers for files inside a destination folder.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tokio::fs;

static NUMBERED_ENTRY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.").unwrap());

/// Next free number in `folder`: one past the highest `<n>.` prefix among
/// its direct entries, or 1 when the folder is missing or unnumbered.
pub async fn next_sequence_number(folder: &Path) -> io::Result<u64> {
    let mut entries = match fs::read_dir(folder).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(1),
        Err(e) => return Err(e),
    };

    let mut max_num = 0u64;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(num) = NUMBERED_ENTRY
            .captures(name)
            .and_then(|c| c[1].parse::<u64>().ok())
        {
            max_num = max_num.max(num);
        }
    }
    Ok(max_num + 1)
}

/// Hands out sequence numbers per folder.
///
/// Live runs rescan the folder for every file, so a failed write leaves its
/// number free for the next attachment. Dry runs write nothing, so the
/// allocator remembers what it handed out to keep previews in step with
/// what a successful live run would produce.
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    reserve: bool,
    planned: HashMap<PathBuf, u64>,
}

impl SequenceAllocator {
    /// Allocator for a run that writes files.
    pub fn live() -> Self {
        Self::default()
    }

    /// Allocator for a preview run.
    pub fn dry_run() -> Self {
        Self {
            reserve: true,
            planned: HashMap::new(),
        }
    }

    pub async fn next(&mut self, folder: &Path) -> io::Result<u64> {
        let scanned = next_sequence_number(folder).await?;
        if !self.reserve {
            return Ok(scanned);
        }

        let next = match self.planned.get(folder) {
            Some(&last) => scanned.max(last + 1),
            None => scanned,
        };
        self.planned.insert(folder.to_path_buf(), next);
        Ok(next)
    }
}
