//! Attachment key parsing and destination file names.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::dates::parse_record_date;

/// Extension used when neither the stripped nor the original name has one.
pub const DEFAULT_EXTENSION: &str = ".pdf";

/// Number of title words kept in a file name.
const TITLE_WORDS: usize = 5;

/// Upload prefix added by the web client: `<uuid>_<original name>`.
static UUID_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}_").unwrap()
});

/// Object key inside `bucket`, dropping anything up to and including an
/// embedded `<bucket>/` segment (public URLs, bucket-qualified paths).
pub fn storage_key<'a>(raw: &'a str, bucket: &str) -> &'a str {
    let marker = format!("{}/", bucket);
    match raw.split_once(marker.as_str()) {
        Some((_, key)) => key,
        None => raw,
    }
}

/// Last path segment of a key.
pub fn original_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Drop a `<uuid>_` upload prefix if present.
pub fn strip_uuid_prefix(name: &str) -> &str {
    match UUID_PREFIX.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// `.ext` of a file name, if it has a non-empty one.
fn dotted_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
}

/// Extension for the migrated file: from the stripped name, then the
/// original name, then [`DEFAULT_EXTENSION`].
pub fn attachment_extension(original: &str) -> String {
    dotted_extension(strip_uuid_prefix(original))
        .or_else(|| dotted_extension(original))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Turn a file name into a title-like description (`relatorio_final-v2.pdf`
/// becomes `relatorio final v2`).
pub fn description_from_filename(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or(name);
    stem.replace(['_', '-'], " ")
}

/// Build `<seq>. <first five title words>[ (<DD-MM-YYYY>)]<ext>`.
///
/// The date part is only added when `date` starts with a valid `YYYY-MM-DD`.
pub fn format_filename(title: &str, date: Option<&str>, extension: &str, seq: u64) -> String {
    let description = title
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    let date_part = parse_record_date(date)
        .map(|d| format!(" ({})", d.format("%d-%m-%Y")))
        .unwrap_or_default();

    format!("{}. {}{}{}", seq, description, date_part, extension)
}

/// The pieces of an attachment reference needed to place it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentName {
    /// Key to download from the bucket.
    pub key: String,
    /// Last segment of the key, as uploaded.
    pub original_name: String,
    /// Original name without the upload prefix.
    pub display_name: String,
    /// Extension including the dot.
    pub extension: String,
}

impl AttachmentName {
    pub fn parse(raw: &str, bucket: &str) -> Self {
        let key = storage_key(raw, bucket);
        let original = original_name(key);
        Self {
            key: key.to_string(),
            original_name: original.to_string(),
            display_name: strip_uuid_prefix(original).to_string(),
            extension: attachment_extension(original),
        }
    }
}
