// Helpers shared by the dashboard service handlers.
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use shared::models::{ColumnClassification, DatasetPreview, Dtype, PipelineStage, RawDataset};
use std::collections::BTreeMap;

/// Neutral preview of an upload: every column `unknown`, the first `rows` rows rendered
/// as strings with nulls as `""`.
pub fn build_preview(dataset_id: &str, raw: &RawDataset, rows: usize) -> DatasetPreview {
    let columns = raw
        .columns
        .iter()
        .map(|c| ColumnClassification::new(c.name.clone(), Dtype::Unknown))
        .collect();
    let sample_rows = (0..raw.row_count().min(rows))
        .map(|row| {
            raw.columns
                .iter()
                .enumerate()
                .map(|(pos, column)| (column.name.clone(), raw.cell(pos, row).as_text().unwrap_or_default()))
                .collect::<BTreeMap<_, _>>()
        })
        .collect();
    DatasetPreview { dataset_id: dataset_id.to_string(), columns, sample_rows }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn start_stage(name: &str) -> PipelineStage {
    tracing::info!(stage = name, "Pipeline stage started");
    PipelineStage { name: name.to_string(), start: now(), end: None, meta: Value::Object(Default::default()) }
}

pub fn finish_stage(stage: &mut PipelineStage, meta: Value) {
    stage.end = Some(now());
    stage.meta = meta;
    tracing::info!(stage = %stage.name, "Pipeline stage finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CellValue, RawColumn};

    #[test]
    fn test_preview_renders_cells_as_text() {
        let raw = RawDataset::new(vec![
            RawColumn::new("receita", vec!["R$ 10,00".into(), CellValue::Null, "R$ 5,00".into()]),
            RawColumn::new("qtd", vec![3.0.into(), 4.5.into(), 1.0.into()]),
        ]);
        let preview = build_preview("ds_abc123", &raw, 2);

        assert_eq!(preview.sample_rows.len(), 2);
        assert_eq!(preview.sample_rows[0]["receita"], "R$ 10,00");
        assert_eq!(preview.sample_rows[1]["receita"], "");
        assert_eq!(preview.sample_rows[1]["qtd"], "4.5");
        assert!(preview.columns.iter().all(|c| c.dtype == Dtype::Unknown));
    }

    #[test]
    fn test_stage_timestamps() {
        let mut stage = start_stage("upload");
        assert!(stage.end.is_none());
        finish_stage(&mut stage, serde_json::json!({"rows": 3}));
        assert!(stage.start.ends_with('Z'));
        assert!(stage.end.as_deref().is_some_and(|e| e >= stage.start.as_str()));
        assert_eq!(stage.meta["rows"], 3);
    }
}
