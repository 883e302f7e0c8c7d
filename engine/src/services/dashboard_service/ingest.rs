// Upload and column detection.
use super::helpers::build_preview;
use crate::classifier::{decode_reply, validate_classification, SemanticClassifier};
use crate::config::EngineSettings;
use crate::data::DatasetStore;
use crate::error::{EngineError, Result};
use shared::models::{ClassificationReply, ColumnClassification, DatasetPreview, RawDataset};

pub fn handle_ingest(store: &DatasetStore, settings: &EngineSettings, raw: RawDataset) -> Result<DatasetPreview> {
    if raw.row_count() == 0 {
        return Err(EngineError::CsvDataFormatError("empty or unreadable file".to_string()));
    }
    let rows = raw.row_count();
    let preview_rows = settings.preview_rows;
    let (dataset_id, raw) = store.raw.insert_new("ds", raw);
    tracing::info!(dataset_id = %dataset_id, rows, columns = raw.columns.len(), "Dataset ingested");
    Ok(build_preview(&dataset_id, &raw, preview_rows))
}

pub fn handle_detect(
    store: &DatasetStore,
    settings: &EngineSettings,
    dataset_id: &str,
    classifier: &dyn SemanticClassifier,
) -> Result<Vec<ColumnClassification>> {
    let raw = store
        .raw
        .get(dataset_id)
        .ok_or_else(|| EngineError::NotFound(format!("dataset '{}'", dataset_id)))?;
    let preview = build_preview(dataset_id, &raw, settings.preview_rows);
    let reply = classifier.detect_columns(&preview)?;
    let decoded: ClassificationReply = decode_reply(&reply)?;
    let columns = validate_classification(&raw, decoded.columns)?;
    tracing::info!(dataset_id, classifier = classifier.name(), columns = columns.len(), "Columns classified");
    Ok(columns)
}
