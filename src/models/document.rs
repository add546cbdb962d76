//! Legal document records (`legal_documents`).

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Columns read from the documents table.
pub const DOCUMENT_COLUMNS: &[&str] = &[
    "id",
    "title",
    "created_date",
    "case_id",
    "attachment_url",
    "attachments",
    "server_path",
];

/// A raw document row as returned by the REST API.
///
/// Attachments arrive either in the legacy `attachment_url` column or in the
/// `attachments` array; [`LegalDocument`] normalizes both.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRow {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub case_id: Option<String>,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub server_path: Option<String>,
}

/// Accept both text (uuid) and integer primary keys.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// A storage reference to one attached file, as stored on the record.
///
/// May carry a `legal-documents/` bucket segment and a UUID upload prefix,
/// see [`crate::layout`] for how those are stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef(String);

impl AttachmentRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a row is not eligible for migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    NoAttachments,
    AlreadyMigrated(String),
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligible::NoAttachments => f.write_str("no attachments"),
            Ineligible::AlreadyMigrated(path) => write!(f, "already migrated to {}", path),
        }
    }
}

/// A document eligible for migration: no server path yet and at least one
/// attachment.
#[derive(Debug, Clone)]
pub struct LegalDocument {
    pub id: String,
    pub title: String,
    pub created_date: Option<String>,
    pub case_id: Option<String>,
    attachments: Vec<AttachmentRef>,
}

impl LegalDocument {
    /// Attachments in record order. Never empty.
    pub fn attachments(&self) -> &[AttachmentRef] {
        &self.attachments
    }

    /// Case id, treating an empty string as absent.
    pub fn case_id(&self) -> Option<&str> {
        self.case_id.as_deref().filter(|c| !c.is_empty())
    }
}

impl TryFrom<DocumentRow> for LegalDocument {
    type Error = Ineligible;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        if let Some(path) = row.server_path.filter(|p| !p.is_empty()) {
            return Err(Ineligible::AlreadyMigrated(path));
        }

        // The list column wins when it has entries; the legacy column is a
        // one-element fallback.
        let mut attachments: Vec<AttachmentRef> = row
            .attachments
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(AttachmentRef(s)),
                serde_json::Value::String(_) => None,
                other => {
                    tracing::warn!("Ignoring non-text attachment entry on {}: {}", row.id, other);
                    None
                }
            })
            .collect();

        if attachments.is_empty() {
            if let Some(url) = row.attachment_url.filter(|u| !u.trim().is_empty()) {
                attachments.push(AttachmentRef(url));
            }
        }

        if attachments.is_empty() {
            return Err(Ineligible::NoAttachments);
        }

        Ok(Self {
            id: row.id,
            title: row.title.unwrap_or_default(),
            created_date: row.created_date,
            case_id: row.case_id,
            attachments,
        })
    }
}
