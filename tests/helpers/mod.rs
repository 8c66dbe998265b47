//! Shared fakes and server bootstrapping for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use template_relay::app_state::AppState;
use template_relay::models::record::Record;
use template_relay::routes;
use template_relay::services::{
    lark::{RecordStore, RecordStoreError, Table},
    storage::{BlobStore, KeyClock, StorageError},
    version::{MemoryVersionStore, VersionError, VersionStore},
    webhook::{DeliveryOutcome, Notifier},
};

/// Smallest byte prefix `image::guess_format` recognises as PNG.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

#[derive(Default)]
pub struct FakeRecords {
    pub templates: Mutex<Vec<Record>>,
    pub options: Mutex<Vec<Record>>,
    pub created: Mutex<Vec<Map<String, Value>>>,
    pub calls: AtomicUsize,
    pub reject_writes: AtomicBool,
}

impl FakeRecords {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        let records = rows.into_iter().map(|fields| {
            serde_json::from_value::<Record>(json!({ "record_id": "rec", "fields": fields })).unwrap()
        });
        match table {
            Table::Templates => self.templates.lock().unwrap().extend(records),
            Table::Options => self.options.lock().unwrap().extend(records),
        }
    }
}

#[async_trait]
impl RecordStore for FakeRecords {
    async fn list_records(&self, table: Table) -> Result<Vec<Record>, RecordStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match table {
            Table::Templates => self.templates.lock().unwrap().clone(),
            Table::Options => self.options.lock().unwrap().clone(),
        })
    }

    async fn create_record(
        &self,
        _table: Table,
        fields: Map<String, Value>,
    ) -> Result<Record, RecordStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(RecordStoreError::Api {
                code: 1254045,
                msg: "FieldNameNotFound".into(),
                payload: json!({ "code": 1254045, "msg": "FieldNameNotFound" }),
            });
        }
        let mut created = self.created.lock().unwrap();
        created.push(fields.clone());
        Ok(Record {
            record_id: format!("rec{}", created.len()),
            fields,
        })
    }
}

#[derive(Default)]
pub struct FakeBlobs {
    pub keys: Mutex<Vec<String>>,
    pub reject_puts: AtomicBool,
}

impl FakeBlobs {
    pub fn calls(&self) -> usize {
        self.keys.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for FakeBlobs {
    async fn put(&self, key: &str, _data: &[u8], _content_type: &str) -> Result<String, StorageError> {
        if self.reject_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected(503));
        }
        self.keys.lock().unwrap().push(key.to_string());
        Ok(format!("https://cdn.test/{key}"))
    }
}

pub struct FakeNotifier {
    pub received: Mutex<Vec<Value>>,
    pub outcome: DeliveryOutcome,
}

impl FakeNotifier {
    pub fn answering(outcome: DeliveryOutcome) -> Self {
        Self {
            received: Mutex::new(Vec::new()),
            outcome,
        }
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, payload: &Value) -> DeliveryOutcome {
        self.received.lock().unwrap().push(payload.clone());
        self.outcome.clone()
    }
}

/// Memory version store that can be switched to behave like an unreachable backend.
pub struct FakeVersions {
    pub inner: MemoryVersionStore,
    pub down: AtomicBool,
}

impl FakeVersions {
    fn check(&self) -> Result<(), VersionError> {
        if self.down.load(Ordering::SeqCst) {
            let refused = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"));
            return Err(VersionError::Redis(refused));
        }
        Ok(())
    }
}

#[async_trait]
impl VersionStore for FakeVersions {
    async fn current(&self) -> Result<i64, VersionError> {
        self.check()?;
        self.inner.current().await
    }

    async fn bump(&self) -> Result<i64, VersionError> {
        self.check()?;
        self.inner.bump().await
    }

    async fn health_check(&self) -> Result<(), VersionError> {
        self.check()
    }
}

/// A running relay wired to fakes.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub records: Arc<FakeRecords>,
    pub blobs: Arc<FakeBlobs>,
    pub submit_hook: Arc<FakeNotifier>,
    pub slide_hook: Arc<FakeNotifier>,
    pub versions: Arc<FakeVersions>,
}

impl TestApp {
    pub async fn start() -> Self {
        Self::with_submit_outcome(DeliveryOutcome::Delivered {
            status: 200,
            body: Some(json!({ "success": true, "request_id": "n8n-1" })),
        })
        .await
    }

    pub async fn with_submit_outcome(outcome: DeliveryOutcome) -> Self {
        let records = Arc::new(FakeRecords::default());
        let blobs = Arc::new(FakeBlobs::default());
        let submit_hook = Arc::new(FakeNotifier::answering(outcome));
        let slide_hook = Arc::new(FakeNotifier::answering(DeliveryOutcome::Delivered {
            status: 200,
            body: None,
        }));
        let versions = Arc::new(FakeVersions {
            inner: MemoryVersionStore::starting_at(1_000),
            down: AtomicBool::new(false),
        });

        let state = AppState {
            records: records.clone(),
            blobs: blobs.clone(),
            submit_hook: submit_hook.clone(),
            slide_hook: slide_hook.clone(),
            versions: versions.clone() as Arc<dyn VersionStore>,
            key_clock: Arc::new(KeyClock::new()),
        };

        let app = routes::with_layers(routes::build_router(state), 10 * 1024 * 1024);
        let base_url = serve(app).await;

        Self {
            base_url,
            client: reqwest::Client::new(),
            records,
            blobs,
            submit_hook,
            slide_hook,
            versions,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Serve a router on an ephemeral local port and return its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Multipart form for a template upload.
pub fn upload_form(style: &str, job_count: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .part(
            "file",
            reqwest::multipart::Part::bytes(PNG_BYTES.to_vec())
                .file_name("template.png")
                .mime_str("image/png")
                .unwrap(),
        )
        .text("style", style.to_string())
        .text("job_count", job_count.to_string())
}

pub fn submission(job_count: u32, jobs: usize) -> Value {
    let jobs: Vec<Value> = (0..jobs)
        .map(|i| {
            json!({
                "company": format!("Company {i}"),
                "position": "Barista",
                "job_code": format!("J{i}")
            })
        })
        .collect();
    json!({
        "image_title": "Tuyển dụng tháng 12",
        "job_count": job_count,
        "template_code": format!("noel_{job_count}"),
        "jobs": jobs,
        "contact": { "email": "hr@example.com", "zalo": "0901234567" }
    })
}
