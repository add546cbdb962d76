//! Attachment migration service.
//!
//! Walks the pending documents one at a time: resolves the case folder,
//! names each attachment, downloads it into place and records the new path
//! on the document. Separated from UI concerns - emits events for progress.

mod types;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::layout::{
    description_from_filename, format_filename, resolve_destination, AttachmentName, Destination,
    SequenceAllocator,
};
use crate::models::{AttachmentRef, LegalDocument};
use crate::remote::RemoteStore;
use crate::repository::LegalRepository;

pub use types::{
    FailedAttachment, MigrationConfig, MigrationError, MigrationEvent, MigrationReport,
    SkippedDocument,
};

/// What happened to one attachment in a live run.
struct AttachmentOutcome {
    bytes: u64,
    record_updated: bool,
}

/// Service moving document attachments from storage into the `Legal/` tree.
pub struct MigrationService {
    store: Arc<dyn RemoteStore>,
    repo: LegalRepository,
    config: MigrationConfig,
}

impl MigrationService {
    pub fn new(store: Arc<dyn RemoteStore>, repo: LegalRepository, config: MigrationConfig) -> Self {
        Self {
            store,
            repo,
            config,
        }
    }

    /// Run the migration to completion.
    ///
    /// Failing to load the mappings or the documents aborts the run. Anything
    /// that goes wrong for a single attachment is recorded in the report and
    /// the run moves on.
    pub async fn run(
        &self,
        event_tx: mpsc::Sender<MigrationEvent>,
    ) -> Result<MigrationReport, MigrationError> {
        let mut report = MigrationReport {
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        let case_folders = self.repo.case_folders().await?;
        info!(
            "Loaded {} folder mappings for {} cases",
            case_folders.mapping_count(),
            case_folders.case_count()
        );
        let _ = event_tx
            .send(MigrationEvent::MappingsLoaded {
                mappings: case_folders.mapping_count(),
                cases: case_folders.case_count(),
            })
            .await;

        let documents = self.repo.pending_documents(&self.config.filter).await?;
        report.total = documents.len();
        info!("Loaded {} documents pending migration", documents.len());
        let _ = event_tx
            .send(MigrationEvent::DocumentsLoaded {
                count: documents.len(),
            })
            .await;

        let mut sequences = if self.config.dry_run {
            SequenceAllocator::dry_run()
        } else {
            SequenceAllocator::live()
        };

        let total = documents.len();
        for (i, doc) in documents.iter().enumerate() {
            let index = i + 1;

            let folder = doc
                .case_id()
                .and_then(|case_id| case_folders.primary_folder(case_id));
            let Some(folder) = folder else {
                debug!("No folder mapping for document {} (case {:?})", doc.id, doc.case_id);
                let skipped = SkippedDocument {
                    id: doc.id.clone(),
                    title: doc.title.clone(),
                    case_id: doc.case_id.clone(),
                };
                report.skipped_no_mapping.push(skipped.clone());
                let _ = event_tx
                    .send(MigrationEvent::SkippedNoMapping {
                        index,
                        total,
                        document: skipped,
                    })
                    .await;
                continue;
            };

            let destination =
                match resolve_destination(&self.config.root, folder, doc.created_date.as_deref()) {
                    Ok(d) => d,
                    Err(e) => {
                        warn!("Rejected folder for document {}: {}", doc.id, e);
                        self.record_failure(&mut report, &event_tx, doc, None, e.into())
                            .await;
                        continue;
                    }
                };

            let _ = event_tx
                .send(MigrationEvent::DocumentStarted {
                    index,
                    total,
                    title: doc.title.clone(),
                    destination: destination.relative.clone(),
                })
                .await;

            let attachment_total = doc.attachments().len();
            for (att_idx, attachment) in doc.attachments().iter().enumerate() {
                let name = AttachmentName::parse(attachment.as_str(), &self.config.bucket);

                let seq = match sequences.next(&destination.dir).await {
                    Ok(n) => n,
                    Err(e) => {
                        let err = MigrationError::io(&destination.dir, e);
                        self.record_failure(&mut report, &event_tx, doc, Some(attachment), err)
                            .await;
                        continue;
                    }
                };

                let title = if doc.title.trim().is_empty() {
                    description_from_filename(&name.display_name)
                } else {
                    doc.title.clone()
                };
                let new_name =
                    format_filename(&title, doc.created_date.as_deref(), &name.extension, seq);

                let _ = event_tx
                    .send(MigrationEvent::AttachmentPlanned {
                        index: att_idx + 1,
                        total: attachment_total,
                        original_name: name.original_name.clone(),
                        new_name: new_name.clone(),
                    })
                    .await;

                if self.config.dry_run {
                    report.planned += 1;
                    let _ = event_tx
                        .send(MigrationEvent::WouldSave {
                            path: destination.file_path(&new_name),
                        })
                        .await;
                    continue;
                }

                match self
                    .migrate_attachment(doc, att_idx, &name, &destination, &new_name, &event_tx)
                    .await
                {
                    Ok(outcome) => {
                        report.migrated += 1;
                        report.bytes_written += outcome.bytes;
                        if outcome.record_updated {
                            report.documents_updated += 1;
                        }
                    }
                    Err(e) => {
                        self.record_failure(&mut report, &event_tx, doc, Some(attachment), e)
                            .await;
                    }
                }
            }
        }

        info!(
            "Migration finished: {} migrated, {} skipped, {} errors",
            report.migrated,
            report.skipped_no_mapping.len(),
            report.errors.len()
        );
        Ok(report)
    }

    /// Download one attachment, write it and, for the first attachment of a
    /// document, record its server path.
    async fn migrate_attachment(
        &self,
        doc: &LegalDocument,
        att_idx: usize,
        name: &AttachmentName,
        destination: &Destination,
        new_name: &str,
        event_tx: &mpsc::Sender<MigrationEvent>,
    ) -> Result<AttachmentOutcome, MigrationError> {
        let data = self
            .store
            .download_object(&self.config.bucket, &name.key)
            .await?;

        let path = destination.file_path(new_name);
        write_file(&destination.dir, &path, &data).await?;
        let bytes = data.len() as u64;
        debug!("Wrote {} bytes to {}", bytes, path.display());
        let _ = event_tx
            .send(MigrationEvent::Saved {
                path: path.clone(),
                bytes,
            })
            .await;

        // Only the first attachment's location is stored on the record.
        let record_updated = if att_idx == 0 {
            let server_path = destination.server_path(new_name);
            self.repo.set_server_path(&doc.id, &server_path).await?;
            let _ = event_tx
                .send(MigrationEvent::RecordUpdated { server_path })
                .await;
            true
        } else {
            false
        };

        Ok(AttachmentOutcome {
            bytes,
            record_updated,
        })
    }

    async fn record_failure(
        &self,
        report: &mut MigrationReport,
        event_tx: &mpsc::Sender<MigrationEvent>,
        doc: &LegalDocument,
        attachment: Option<&AttachmentRef>,
        error: MigrationError,
    ) {
        warn!("Document {} ({}) failed: {}", doc.id, doc.title, error);
        let failure = FailedAttachment {
            id: doc.id.clone(),
            title: doc.title.clone(),
            attachment: attachment.map(|a| a.to_string()),
            error: error.to_string(),
        };
        report.errors.push(failure.clone());
        let _ = event_tx.send(MigrationEvent::Failed(failure)).await;
    }
}

/// Create `dir` if needed and write `data` to `path`, replacing any file
/// already there.
async fn write_file(dir: &Path, path: &Path, data: &[u8]) -> Result<(), MigrationError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| MigrationError::io(dir, e))?;
    tokio::fs::write(path, data)
        .await
        .map_err(|e| MigrationError::io(path, e))?;
    Ok(())
}
