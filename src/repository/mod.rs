//! Typed access to the legal tables over a [`RemoteStore`].

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::models::{CaseFolders, DocumentRow, FolderMapping, LegalDocument, DOCUMENT_COLUMNS};
use crate::remote::{Filter, RemoteResult, RemoteStore, RowQuery};

/// Narrowing applied to the pending-document query.
#[derive(Debug, Clone, Default)]
pub struct PendingFilter {
    /// Only documents of this case.
    pub case_id: Option<String>,
    /// Maximum rows to fetch (0 = unlimited).
    pub limit: usize,
}

/// Repository for case folder mappings and legal documents.
#[derive(Clone)]
pub struct LegalRepository {
    store: Arc<dyn RemoteStore>,
    documents_table: String,
    folders_table: String,
}

impl LegalRepository {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        documents_table: impl Into<String>,
        folders_table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            documents_table: documents_table.into(),
            folders_table: folders_table.into(),
        }
    }

    /// Load every case to folder mapping.
    pub async fn case_folders(&self) -> RemoteResult<CaseFolders> {
        let rows = self
            .store
            .fetch_rows(&RowQuery::table(&self.folders_table))
            .await?;

        let mappings = rows
            .into_iter()
            .map(serde_json::from_value::<FolderMapping>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CaseFolders::from_mappings(mappings))
    }

    /// Query for documents that still have attachments to migrate.
    pub fn pending_query(&self, filter: &PendingFilter) -> RowQuery {
        let mut query = RowQuery::table(&self.documents_table)
            .select(DOCUMENT_COLUMNS)
            .filter(Filter::or([
                Filter::not_null("attachment_url"),
                Filter::not_null("attachments"),
            ]))
            .filter(Filter::is_null("server_path"));

        if let Some(ref case_id) = filter.case_id {
            query = query.filter(Filter::eq("case_id", case_id.as_str()));
        }
        query.limit(filter.limit)
    }

    /// Load documents eligible for migration, in server order.
    ///
    /// Rows that fail to decode, come back without a usable attachment, or
    /// already carry a server path are dropped here.
    pub async fn pending_documents(&self, filter: &PendingFilter) -> RemoteResult<Vec<LegalDocument>> {
        let rows = self.store.fetch_rows(&self.pending_query(filter)).await?;

        let mut documents = Vec::with_capacity(rows.len());
        for value in rows {
            let row = match serde_json::from_value::<DocumentRow>(value.clone()) {
                Ok(row) => row,
                Err(e) => {
                    let id = value.get("id").cloned().unwrap_or_default();
                    warn!("Skipping malformed document row {}: {}", id, e);
                    continue;
                }
            };
            let id = row.id.clone();
            match LegalDocument::try_from(row) {
                Ok(doc) => documents.push(doc),
                Err(reason) => warn!("Skipping document {}: {}", id, reason),
            }
        }
        debug!("{} documents pending migration", documents.len());
        Ok(documents)
    }

    /// Record where a document's file now lives.
    pub async fn set_server_path(&self, document_id: &str, server_path: &str) -> RemoteResult<u16> {
        self.store
            .update_row(
                &self.documents_table,
                &json!({ "server_path": server_path }),
                &[Filter::eq("id", document_id)],
            )
            .await
    }
}
