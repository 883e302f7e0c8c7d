// Boundary to the external semantic classifier. Its replies are untrusted text.
use crate::error::{EngineError, Result};
use crate::profile::DataProfile;
use serde::de::DeserializeOwned;
use shared::models::{ColumnClassification, DatasetPreview, RawDataset};
use shared::utils::{clean_null_placeholder, strip_code_fence};
use std::collections::HashSet;

/// Produces column classifications and dashboard plans as raw JSON text.
pub trait SemanticClassifier: Send + Sync {
    fn name(&self) -> &str;
    /// Reply expected to decode as a [`ClassificationReply`](shared::models::ClassificationReply).
    fn detect_columns(&self, preview: &DatasetPreview) -> Result<String>;
    /// Reply expected to decode as a [`DashboardPlan`](shared::models::DashboardPlan).
    fn suggest_dashboard(&self, profile: &DataProfile, columns: &[ColumnClassification]) -> Result<String>;
}

/// Replays fixed replies, whatever the input.
#[derive(Debug, Clone)]
pub struct StaticClassifier {
    columns_reply: String,
    plan_reply: String,
}

impl StaticClassifier {
    pub fn new(columns_reply: impl Into<String>, plan_reply: impl Into<String>) -> Self {
        Self { columns_reply: columns_reply.into(), plan_reply: plan_reply.into() }
    }
}

impl SemanticClassifier for StaticClassifier {
    fn name(&self) -> &str {
        "static"
    }

    fn detect_columns(&self, preview: &DatasetPreview) -> Result<String> {
        tracing::debug!(dataset_id = %preview.dataset_id, "Replaying static column classification");
        Ok(self.columns_reply.clone())
    }

    fn suggest_dashboard(&self, _profile: &DataProfile, _columns: &[ColumnClassification]) -> Result<String> {
        Ok(self.plan_reply.clone())
    }
}

/// Decodes a classifier reply, tolerating a surrounding Markdown code fence.
pub fn decode_reply<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
        tracing::warn!(error = %e, "Classifier reply is not the expected JSON");
        EngineError::ClassifierReply { reason: e.to_string(), raw: raw.to_string() }
    })
}

/// Checks a classification against the dataset it claims to describe.
///
/// Names must exist in the dataset and be unique. Dtypes were already degraded to
/// `unknown` when decoding; `"null"` placeholders in `semantic`/`format` are cleared.
pub fn validate_classification(
    dataset: &RawDataset,
    columns: Vec<ColumnClassification>,
) -> Result<Vec<ColumnClassification>> {
    let mut seen = HashSet::new();
    columns
        .into_iter()
        .map(|mut column| {
            if dataset.column(&column.name).is_none() {
                return Err(EngineError::InvalidClassification(format!(
                    "column '{}' does not exist in the dataset",
                    column.name
                )));
            }
            if !seen.insert(column.name.clone()) {
                return Err(EngineError::InvalidClassification(format!(
                    "column '{}' is classified more than once",
                    column.name
                )));
            }
            column.semantic = clean_null_placeholder(column.semantic);
            column.format = clean_null_placeholder(column.format);
            Ok(column)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{ClassificationReply, DashboardPlan, Dtype, RawColumn};

    fn raw() -> RawDataset {
        RawDataset::new(vec![
            RawColumn::new("data", vec!["2024-01-01".into()]),
            RawColumn::new("receita", vec!["R$ 10,00".into()]),
        ])
    }

    #[test]
    fn test_decode_fenced_reply() {
        let reply = "```json\n{\"columns\":[{\"name\":\"data\",\"dtype\":\"date\",\"semantic\":\"null\"},{\"name\":\"receita\",\"dtype\":\"money\"}]}\n```";
        let decoded: ClassificationReply = decode_reply(reply).unwrap();
        assert_eq!(decoded.columns[0].dtype, Dtype::Date);
        assert_eq!(decoded.columns[1].dtype, Dtype::Unknown);

        let columns = validate_classification(&raw(), decoded.columns).unwrap();
        assert_eq!(columns[0].semantic, None);
    }

    #[test]
    fn test_undecodable_reply_keeps_raw_text() {
        let err = decode_reply::<DashboardPlan>("Sorry, I cannot help with that").unwrap_err();
        match err {
            EngineError::ClassifierReply { raw, .. } => assert_eq!(raw, "Sorry, I cannot help with that"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(decode_reply::<ClassificationReply>("{\"cols\": []}").is_err());
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let err = validate_classification(&raw(), vec![ColumnClassification::new("lucro", Dtype::Number)]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidClassification(_)));
        assert!(err.to_string().contains("lucro"));
    }

    #[test]
    fn test_duplicate_column_is_rejected() {
        let columns = vec![
            ColumnClassification::new("receita", Dtype::Currency),
            ColumnClassification::new("receita", Dtype::Number),
        ];
        let err = validate_classification(&raw(), columns).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_static_classifier_replays() {
        let classifier = StaticClassifier::new("{\"columns\":[]}", "{}");
        let preview = DatasetPreview { dataset_id: "ds_1".into(), columns: vec![], sample_rows: vec![] };
        let reply: ClassificationReply = decode_reply(&classifier.detect_columns(&preview).unwrap()).unwrap();
        assert!(reply.columns.is_empty());
        assert_eq!(classifier.name(), "static");
    }
}
