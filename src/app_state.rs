use std::sync::Arc;

use crate::services::{
    lark::RecordStore,
    storage::{BlobStore, KeyClock},
    version::VersionStore,
    webhook::Notifier,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub submit_hook: Arc<dyn Notifier>,
    pub slide_hook: Arc<dyn Notifier>,
    pub versions: Arc<dyn VersionStore>,
    pub key_clock: Arc<KeyClock>,
}

impl AppState {
    pub fn new(
        records: impl RecordStore + 'static,
        blobs: impl BlobStore + 'static,
        submit_hook: impl Notifier + 'static,
        slide_hook: impl Notifier + 'static,
        versions: Arc<dyn VersionStore>,
    ) -> Self {
        Self {
            records: Arc::new(records),
            blobs: Arc::new(blobs),
            submit_hook: Arc::new(submit_hook),
            slide_hook: Arc::new(slide_hook),
            versions,
            key_clock: Arc::new(KeyClock::new()),
        }
    }
}
