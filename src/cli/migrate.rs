//! Migrate command.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::report::Reporter;
use crate::config::Settings;
use crate::remote::{RemoteStore, SupabaseClient};
use crate::repository::{LegalRepository, PendingFilter};
use crate::services::{MigrationConfig, MigrationEvent, MigrationService};

/// Command-line choices for a migration run.
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    pub dry_run: bool,
    pub case_id: Option<String>,
    pub limit: usize,
}

/// Run the migration against the configured project and print progress.
pub async fn cmd_migrate(
    settings: &Settings,
    service_key: &str,
    options: MigrateOptions,
) -> anyhow::Result<()> {
    let client = SupabaseClient::new(
        &settings.supabase_url,
        service_key,
        settings.request_timeout(),
    )?;
    let store: Arc<dyn RemoteStore> = Arc::new(client);
    let repo = LegalRepository::new(
        store.clone(),
        &settings.documents_table,
        &settings.folders_table,
    );

    let service = MigrationService::new(
        store,
        repo,
        MigrationConfig {
            root: settings.base_dir.clone(),
            bucket: settings.bucket.clone(),
            dry_run: options.dry_run,
            filter: PendingFilter {
                case_id: options.case_id,
                limit: options.limit,
            },
        },
    );

    let reporter = Reporter::new(options.dry_run);
    reporter.print_header(&settings.base_dir);

    // Event channel for progress output
    let (event_tx, mut event_rx) = mpsc::channel::<MigrationEvent>(100);
    let event_handler = tokio::spawn(async move {
        let mut reporter = reporter;
        while let Some(event) = event_rx.recv().await {
            reporter.handle(event);
        }
        reporter
    });

    let result = service.run(event_tx).await;
    let reporter = event_handler.await?;
    let report = result?;

    reporter.print_summary(&report);
    Ok(())
}
