//! Application state management

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::convert::{ConvertService, PdfInspector};
use crate::documents::DocumentStore;
use crate::render::PdfRenderer;
use crate::storage::{AdmissionGate, FileRegistry, RegistryError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    registry: FileRegistry,
    admission: AdmissionGate,
    inspector: PdfInspector,
    converter: ConvertService,
    renderer: PdfRenderer,
    documents: DocumentStore,
}

impl AppState {
    /// Create a new application state
    ///
    /// Opens the file registry (creating the upload directory and loading
    /// its snapshot), so this can fail on an unusable upload path.
    pub async fn new(config: Config) -> Result<Self, RegistryError> {
        let registry = FileRegistry::open(&config.storage.upload_dir).await?;
        let admission = AdmissionGate::new(registry.clone(), config.storage.max_upload_bytes);
        let inspector = PdfInspector::new(&config.convert.pdfinfo_bin);
        let converter = ConvertService::new(&config.convert);
        let renderer = PdfRenderer::new(&config.render);
        let documents = DocumentStore::new(&config.documents);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                registry,
                admission,
                inspector,
                converter,
                renderer,
                documents,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.inner.registry
    }

    pub fn admission(&self) -> &AdmissionGate {
        &self.inner.admission
    }

    pub fn inspector(&self) -> &PdfInspector {
        &self.inner.inspector
    }

    pub fn converter(&self) -> &ConvertService {
        &self.inner.converter
    }

    pub fn renderer(&self) -> &PdfRenderer {
        &self.inner.renderer
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.inner.documents
    }

    /// Start the registry reaper with the configured interval and age
    pub fn start_reaper(&self) -> tokio::task::JoinHandle<()> {
        let storage = &self.inner.config.storage;
        self.inner.registry.clone().start_reaper(
            Duration::from_secs(storage.reaper_interval_secs),
            Duration::from_secs(storage.max_file_age_secs),
        )
    }
}
