//! End-to-end migration runs against an in-memory store.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;

use legal_migrate::remote::{Filter, RemoteError, RemoteResult, RemoteStore, RowQuery};
use legal_migrate::repository::{LegalRepository, PendingFilter};
use legal_migrate::services::{MigrationConfig, MigrationEvent, MigrationReport, MigrationService};

const BUCKET: &str = "legal-documents";
const DOCUMENTS: &str = "legal_documents";
const FOLDERS: &str = "legal_case_folders";

/// Tables and objects held in memory. Row filters are evaluated the way the
/// REST API would.
struct FakeStore {
    documents: Mutex<Vec<Value>>,
    folders: Vec<Value>,
    objects: HashMap<String, Vec<u8>>,
    missing: HashSet<String>,
    downloads: AtomicUsize,
    updates: AtomicUsize,
}

impl FakeStore {
    fn new(folders: Vec<Value>, documents: Vec<Value>) -> Self {
        Self {
            documents: Mutex::new(documents),
            folders,
            objects: HashMap::new(),
            missing: HashSet::new(),
            downloads: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        }
    }

    fn with_object(mut self, key: &str, data: &[u8]) -> Self {
        self.objects.insert(key.to_string(), data.to_vec());
        self
    }

    fn with_missing(mut self, key: &str) -> Self {
        self.missing.insert(key.to_string());
        self
    }

    fn server_path(&self, id: &str) -> Option<String> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|row| row["id"] == id)
            .and_then(|row| row["server_path"].as_str().map(String::from))
    }

    fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match &row[column] {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn row_matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(column, value) => column_text(row, column).as_deref() == Some(value.as_str()),
        Filter::IsNull(column) => row[column].is_null(),
        Filter::NotNull(column) => !row[column].is_null(),
        Filter::Or(filters) => filters.iter().any(|f| row_matches(row, f)),
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn fetch_rows(&self, query: &RowQuery) -> RemoteResult<Vec<Value>> {
        let rows = match query.table_name() {
            FOLDERS => self.folders.clone(),
            DOCUMENTS => self.documents.lock().unwrap().clone(),
            other => return Err(RemoteError::status(404, &format!("no table {}", other))),
        };
        let mut rows: Vec<Value> = rows
            .into_iter()
            .filter(|row| query.filters().iter().all(|f| row_matches(row, f)))
            .collect();
        if let Some(limit) = query.row_limit() {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn update_row(&self, table: &str, fields: &Value, matching: &[Filter]) -> RemoteResult<u16> {
        assert_eq!(table, DOCUMENTS);
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut documents = self.documents.lock().unwrap();
        for row in documents.iter_mut() {
            if matching.iter().all(|f| row_matches(row, f)) {
                if let (Some(row), Some(fields)) = (row.as_object_mut(), fields.as_object()) {
                    for (k, v) in fields {
                        row.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        Ok(204)
    }

    async fn download_object(&self, bucket: &str, key: &str) -> RemoteResult<Vec<u8>> {
        assert_eq!(bucket, BUCKET);
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.missing.contains(key) {
            return Err(RemoteError::status(404, "{\"error\":\"not_found\"}"));
        }
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| RemoteError::status(404, "{\"error\":\"not_found\"}"))
    }
}

fn storage_url(key: &str) -> String {
    format!(
        "https://example.supabase.co/storage/v1/object/public/{}/{}",
        BUCKET, key
    )
}

fn folder(case_id: &str, path: &str) -> Value {
    json!({ "case_id": case_id, "folder_path": path, "label": null })
}

fn document(id: &str, title: &str, date: &str, case_id: &str, keys: &[&str]) -> Value {
    let attachments: Vec<String> = keys.iter().map(|k| storage_url(k)).collect();
    json!({
        "id": id,
        "title": title,
        "created_date": date,
        "case_id": case_id,
        "attachment_url": attachments.first(),
        "attachments": attachments,
        "server_path": null,
    })
}

async fn run(
    store: Arc<FakeStore>,
    root: &Path,
    dry_run: bool,
) -> (MigrationReport, Vec<MigrationEvent>) {
    let remote: Arc<dyn RemoteStore> = store;
    let repo = LegalRepository::new(remote.clone(), DOCUMENTS, FOLDERS);
    let config = MigrationConfig {
        root: root.to_path_buf(),
        bucket: BUCKET.to_string(),
        dry_run,
        filter: PendingFilter::default(),
    };
    let service = MigrationService::new(remote, repo, config);

    let (event_tx, mut event_rx) = mpsc::channel(1000);
    let report = service.run(event_tx).await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }
    (report, events)
}

fn two_case_store() -> FakeStore {
    FakeStore::new(
        vec![
            folder("case-1", "Processo Trabalhista"),
            folder("case-2", "Inventário"),
        ],
        vec![
            document(
                "d1",
                "Petição Inicial da Reclamação Trabalhista",
                "2024-03-15",
                "case-1",
                &["case-1/peticao.pdf"],
            ),
            document(
                "d2",
                "Certidão de Óbito",
                "2023-11-02T10:00:00Z",
                "case-2",
                &["case-2/certidao.jpg"],
            ),
        ],
    )
    .with_object("case-1/peticao.pdf", b"%PDF-1.7 petition")
    .with_object("case-2/certidao.jpg", b"jpeg bytes")
}

#[tokio::test]
async fn test_live_run_writes_files_and_updates_records() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(two_case_store());

    let (report, _) = run(store.clone(), dir.path(), false).await;

    assert_eq!(report.total, 2);
    assert_eq!(report.migrated, 2);
    assert_eq!(report.documents_updated, 2);
    assert!(report.errors.is_empty());

    let petition = dir.path().join(
        "Processo Trabalhista/2024/03 Março 2024/1. Petição Inicial da Reclamação Trabalhista (15-03-2024).pdf",
    );
    assert_eq!(std::fs::read(&petition).unwrap(), b"%PDF-1.7 petition");
    assert_eq!(
        store.server_path("d1").as_deref(),
        Some("Processo Trabalhista/2024/03 Março 2024/1. Petição Inicial da Reclamação Trabalhista (15-03-2024).pdf")
    );
    assert_eq!(
        store.server_path("d2").as_deref(),
        Some("Inventário/2023/11 Novembro 2023/1. Certidão de Óbito (02-11-2023).jpg")
    );
}

#[tokio::test]
async fn test_second_run_migrates_nothing() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(two_case_store());

    let (first, _) = run(store.clone(), dir.path(), false).await;
    assert_eq!(first.migrated, 2);
    let downloads = store.downloads();

    let (second, events) = run(store.clone(), dir.path(), false).await;
    assert_eq!(second.total, 0);
    assert_eq!(second.migrated, 0);
    assert_eq!(store.downloads(), downloads);
    assert!(events
        .iter()
        .any(|e| matches!(e, MigrationEvent::DocumentsLoaded { count: 0 })));
}

#[tokio::test]
async fn test_failed_download_does_not_stop_other_documents() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::new(
        vec![folder("case-1", "Processo")],
        vec![
            document("d1", "Contrato Social", "2024-01-10", "case-1", &["case-1/contrato.pdf"]),
            document("d2", "Procuração", "2024-01-12", "case-1", &["case-1/procuracao.pdf"]),
        ],
    )
    .with_missing("case-1/contrato.pdf")
    .with_object("case-1/procuracao.pdf", b"poa");
    let store = Arc::new(store);

    let (report, events) = run(store.clone(), dir.path(), false).await;

    assert_eq!(report.migrated, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].id, "d1");
    assert_eq!(report.errors[0].title, "Contrato Social");
    assert!(report.errors[0].error.contains("404"));
    assert!(store.server_path("d1").is_none());
    assert!(store.server_path("d2").is_some());
    assert!(events
        .iter()
        .any(|e| matches!(e, MigrationEvent::Failed(f) if f.id == "d1")));

    // The failed attachment never claimed its number.
    let written = dir
        .path()
        .join("Processo/2024/01 Janeiro 2024/1. Procuração (12-01-2024).pdf");
    assert!(written.exists());
}

#[tokio::test]
async fn test_dry_run_touches_nothing_and_matches_live_paths() {
    let dry_dir = TempDir::new().unwrap();
    let dry_store = Arc::new(two_case_store());

    let (dry_report, dry_events) = run(dry_store.clone(), dry_dir.path(), true).await;

    assert!(dry_report.dry_run);
    assert_eq!(dry_report.planned, 2);
    assert_eq!(dry_report.migrated, 0);
    assert_eq!(dry_store.downloads(), 0);
    assert_eq!(dry_store.updates(), 0);
    assert_eq!(std::fs::read_dir(dry_dir.path()).unwrap().count(), 0);

    let live_dir = TempDir::new().unwrap();
    let (_, live_events) = run(Arc::new(two_case_store()), live_dir.path(), false).await;

    let planned: Vec<_> = dry_events
        .iter()
        .filter_map(|e| match e {
            MigrationEvent::WouldSave { path } => {
                Some(path.strip_prefix(dry_dir.path()).unwrap().to_path_buf())
            }
            _ => None,
        })
        .collect();
    let saved: Vec<_> = live_events
        .iter()
        .filter_map(|e| match e {
            MigrationEvent::Saved { path, .. } => {
                Some(path.strip_prefix(live_dir.path()).unwrap().to_path_buf())
            }
            _ => None,
        })
        .collect();
    assert_eq!(planned.len(), 2);
    assert_eq!(planned, saved);
}

#[tokio::test]
async fn test_document_without_mapping_is_skipped() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::new(
        vec![folder("case-1", "Processo")],
        vec![
            document("d1", "Parecer Técnico", "2024-05-01", "case-9", &["case-9/parecer.pdf"]),
            document("d2", "Laudo Pericial", "2024-05-02", "case-1", &["case-1/laudo.pdf"]),
        ],
    )
    .with_object("case-9/parecer.pdf", b"opinion")
    .with_object("case-1/laudo.pdf", b"report");
    let store = Arc::new(store);

    let (report, _) = run(store.clone(), dir.path(), false).await;

    assert_eq!(report.total, 2);
    assert_eq!(report.migrated, 1);
    assert_eq!(report.skipped_no_mapping.len(), 1);
    assert_eq!(report.skipped_no_mapping[0].id, "d1");
    assert_eq!(report.skipped_no_mapping[0].case_id.as_deref(), Some("case-9"));
    assert_eq!(store.downloads(), 1);
    assert!(store.server_path("d1").is_none());
}

#[tokio::test]
async fn test_only_first_attachment_updates_record() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::new(
        vec![folder("case-1", "Processo")],
        vec![document(
            "d1",
            "Recurso Ordinário",
            "2024-06-20",
            "case-1",
            &["case-1/recurso.pdf", "case-1/anexo.docx"],
        )],
    )
    .with_object("case-1/recurso.pdf", b"appeal")
    .with_object("case-1/anexo.docx", b"annex");
    let store = Arc::new(store);

    let (report, _) = run(store.clone(), dir.path(), false).await;

    assert_eq!(report.migrated, 2);
    assert_eq!(report.documents_updated, 1);
    assert_eq!(store.updates(), 1);

    let month = dir.path().join("Processo/2024/06 Junho 2024");
    assert!(month.join("1. Recurso Ordinário (20-06-2024).pdf").exists());
    assert!(month.join("2. Recurso Ordinário (20-06-2024).docx").exists());
    assert_eq!(
        store.server_path("d1").as_deref(),
        Some("Processo/2024/06 Junho 2024/1. Recurso Ordinário (20-06-2024).pdf")
    );
}

#[tokio::test]
async fn test_numbering_continues_from_existing_files() {
    let dir = TempDir::new().unwrap();
    let month = dir.path().join("Processo/2024/06 Junho 2024");
    std::fs::create_dir_all(&month).unwrap();
    std::fs::write(month.join("3. Antigo.pdf"), b"old").unwrap();
    std::fs::write(month.join("notas.txt"), b"notes").unwrap();

    let store = FakeStore::new(
        vec![folder("case-1", "Processo")],
        vec![document("d1", "Sentença", "2024-06-01", "case-1", &["case-1/sentenca.pdf"])],
    )
    .with_object("case-1/sentenca.pdf", b"ruling");

    let (report, _) = run(Arc::new(store), dir.path(), false).await;

    assert_eq!(report.migrated, 1);
    assert!(month.join("4. Sentença (01-06-2024).pdf").exists());
}

#[tokio::test]
async fn test_folder_outside_root_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::new(
        vec![folder("case-1", "../escape")],
        vec![document("d1", "Acordo", "2024-02-02", "case-1", &["case-1/acordo.pdf"])],
    )
    .with_object("case-1/acordo.pdf", b"deal");
    let store = Arc::new(store);

    let (report, _) = run(store.clone(), dir.path(), false).await;

    assert_eq!(report.migrated, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].id, "d1");
    assert_eq!(store.downloads(), 0);
    assert!(store.server_path("d1").is_none());
}

#[tokio::test]
async fn test_malformed_row_does_not_block_others() {
    let dir = TempDir::new().unwrap();
    let mut broken = document("d2", "x", "2024-04-01", "case-1", &["case-1/b.pdf"]);
    broken["title"] = json!(123);
    let store = FakeStore::new(
        vec![folder("case-1", "Processo")],
        vec![
            document("d1", "Notificação Extrajudicial", "2024-04-01", "case-1", &["case-1/a.pdf"]),
            broken,
        ],
    )
    .with_object("case-1/a.pdf", b"notice")
    .with_object("case-1/b.pdf", b"other");
    let store = Arc::new(store);

    let (report, _) = run(store.clone(), dir.path(), false).await;

    assert_eq!(report.total, 1);
    assert_eq!(report.migrated, 1);
    assert_eq!(store.downloads(), 1);
    assert_eq!(
        store.server_path("d1").as_deref(),
        Some("Processo/2024/04 Abril 2024/1. Notificação Extrajudicial (01-04-2024).pdf")
    );
    assert!(store.server_path("d2").is_none());
}
