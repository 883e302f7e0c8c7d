// Orchestration over the engine: the operations a transport layer exposes.
pub mod helpers;
pub mod ingest;
pub mod normalize;
pub mod pipeline;
pub mod suggest;

use crate::classifier::SemanticClassifier;
use crate::config::EngineSettings;
use crate::dashboard::{DashboardBuild, DashboardOptions};
use crate::data::DatasetStore;
use crate::error::{EngineError, Result};
use shared::models::{ColumnClassification, DashboardDoc, DatasetPreview, NormalizeResult, PipelineResult, RawDataset};
use std::sync::Arc;

pub struct DashboardService {
    store: Arc<DatasetStore>,
    settings: EngineSettings,
}

impl DashboardService {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_store(Arc::new(DatasetStore::new()), settings)
    }

    pub fn with_store(store: Arc<DatasetStore>, settings: EngineSettings) -> Self {
        DashboardService { store, settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn ingest(&self, raw: RawDataset) -> Result<DatasetPreview> {
        ingest::handle_ingest(&self.store, &self.settings, raw)
    }

    pub fn detect(&self, dataset_id: &str, classifier: &dyn SemanticClassifier) -> Result<Vec<ColumnClassification>> {
        ingest::handle_detect(&self.store, &self.settings, dataset_id, classifier)
    }

    pub fn normalize(&self, dataset_id: &str, columns: Option<Vec<ColumnClassification>>) -> Result<NormalizeResult> {
        normalize::handle_normalize(&self.store, dataset_id, columns)
    }

    pub fn suggest(
        &self,
        normalized_dataset_id: &str,
        classifier: &dyn SemanticClassifier,
        options: &DashboardOptions,
    ) -> Result<DashboardBuild> {
        tracing::info!(normalized_dataset_id, classifier = classifier.name(), "Suggesting dashboard");
        suggest::handle_suggest(&self.store, &self.settings, normalized_dataset_id, classifier, options)
    }

    /// Last dashboard computed for a normalized dataset.
    pub fn latest(&self, normalized_dataset_id: &str) -> Result<Arc<DashboardDoc>> {
        self.store
            .dashboards
            .get(normalized_dataset_id)
            .ok_or_else(|| EngineError::NotFound(format!("no dashboard for '{}'", normalized_dataset_id)))
    }

    pub fn run_pipeline(
        &self,
        raw: RawDataset,
        classifier: &dyn SemanticClassifier,
        options: &DashboardOptions,
    ) -> Result<PipelineResult> {
        tracing::info!(classifier = classifier.name(), "Running dashboard pipeline");
        pipeline::handle_run_pipeline(&self.store, &self.settings, raw, classifier, options)
    }
}
