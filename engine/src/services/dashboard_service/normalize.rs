// Normalization of a stored upload into a new normalized dataset.
use crate::classifier::validate_classification;
use crate::data::{DatasetStore, NormalizedEntry};
use crate::error::{EngineError, Result};
use crate::normalize::normalize;
use shared::models::{ColumnClassification, NormalizeResult};
use std::collections::HashMap;

pub fn handle_normalize(
    store: &DatasetStore,
    dataset_id: &str,
    columns: Option<Vec<ColumnClassification>>,
) -> Result<NormalizeResult> {
    let raw = store
        .raw
        .get(dataset_id)
        .ok_or_else(|| EngineError::NotFound(format!("dataset '{}'", dataset_id)))?;
    let classification = validate_classification(&raw, columns.unwrap_or_default())?;
    let normalized = normalize(&raw, &classification);

    let hints: HashMap<&str, &ColumnClassification> =
        classification.iter().map(|c| (c.name.as_str(), c)).collect();
    let output_columns = normalized
        .dataset
        .columns
        .iter()
        .map(|c| {
            let mut out = ColumnClassification::new(c.name.clone(), c.dtype);
            if let Some(hint) = hints.get(c.name.as_str()) {
                out.semantic = hint.semantic.clone();
                out.format = hint.format.clone();
            }
            out
        })
        .collect();

    let rows = normalized.dataset.row_count;
    let (normalized_dataset_id, _) = store.normalized.insert_new(
        "nds",
        NormalizedEntry { dataset_id: dataset_id.to_string(), dataset: normalized.dataset, columns: classification },
    );
    tracing::info!(
        dataset_id,
        normalized_dataset_id = %normalized_dataset_id,
        rows,
        issues = normalized.quality.len(),
        "Dataset normalized"
    );

    Ok(NormalizeResult {
        normalized_dataset_id,
        rows,
        columns: output_columns,
        quality: normalized.quality,
    })
}
