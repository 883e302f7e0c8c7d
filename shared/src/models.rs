use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// An untyped cell as it came out of the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// String rendering of the cell, `None` for nulls.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawColumn {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self { name: name.into(), values }
    }
}

/// Column-oriented dataset exactly as read from its source. Never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    pub columns: Vec<RawColumn>,
}

impl RawDataset {
    pub fn new(columns: Vec<RawColumn>) -> Self {
        Self { columns }
    }

    /// Number of rows; ragged columns are read as if padded with nulls.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn cell(&self, column: usize, row: usize) -> &CellValue {
        self.columns[column].values.get(row).unwrap_or(&CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Number,
    String,
    Date,
    Percent,
    Currency,
    Category,
    #[default]
    Unknown,
}

impl Dtype {
    /// Maps a classifier label onto a dtype. Anything unrecognised is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "number" => Dtype::Number,
            "string" => Dtype::String,
            "date" => Dtype::Date,
            "percent" => Dtype::Percent,
            "currency" => Dtype::Currency,
            "category" => Dtype::Category,
            _ => Dtype::Unknown,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Dtype::Number | Dtype::Percent | Dtype::Currency)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::Number => "number",
            Dtype::String => "string",
            Dtype::Date => "date",
            Dtype::Percent => "percent",
            Dtype::Currency => "currency",
            Dtype::Category => "category",
            Dtype::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// The classifier is free to send any label (or null); both degrade to Unknown.
impl<'de> Deserialize<'de> for Dtype {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map_or(Dtype::Unknown, Dtype::from_label))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnClassification {
    pub name: String,
    #[serde(default)]
    pub dtype: Dtype,
    #[serde(default)]
    pub semantic: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

impl ColumnClassification {
    pub fn new(name: impl Into<String>, dtype: Dtype) -> Self {
        Self { name: name.into(), dtype, semantic: None, format: None }
    }
}

/// Reply shape of the classifier's column detection step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReply {
    pub columns: Vec<ColumnClassification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    DateParseError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    #[serde(rename = "col")]
    pub column: String,
    #[serde(rename = "issue")]
    pub kind: IssueKind,
    #[serde(rename = "details")]
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Dashboard plan (untrusted, produced by the classifier)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiPlan {
    pub name: String,
    pub value_expr: String,
    #[serde(default)]
    pub fmt: Option<String>,
    #[serde(default)]
    pub explain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPlan {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub title: String,
    #[serde(default)]
    pub x_key: Option<String>,
    #[serde(default)]
    pub y_key: Option<String>,
    #[serde(default)]
    pub series: Option<Vec<ChartSeries>>,
    #[serde(default)]
    pub category_key: Option<String>,
    #[serde(default)]
    pub value_key: Option<String>,
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightPlan {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardPlan {
    #[serde(default)]
    pub kpis: Vec<KpiPlan>,
    #[serde(default)]
    pub charts: Vec<ChartPlan>,
    #[serde(default)]
    pub insights: Vec<InsightPlan>,
}

// ---------------------------------------------------------------------------
// Output document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Renderable chart. `data` rows are keyed by the chart's axis keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub title: String,
    pub data: Vec<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<ChartSeries>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
}

impl From<InsightPlan> for Insight {
    fn from(plan: InsightPlan) -> Self {
        Insight {
            kind: plan.kind.unwrap_or_else(|| "info".to_string()),
            title: plan.title.unwrap_or_else(|| "Insight".to_string()),
            message: plan.message.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardFilters {
    pub time_grain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardDoc {
    /// Reference of the normalized dataset the document was computed from.
    pub dataset_id: String,
    pub kpis: Vec<Kpi>,
    pub charts: Vec<ChartSpec>,
    pub insights: Vec<Insight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<DashboardFilters>,
    pub version: String,
}

// ---------------------------------------------------------------------------
// Service-level results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetPreview {
    pub dataset_id: String,
    pub columns: Vec<ColumnClassification>,
    pub sample_rows: Vec<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeResult {
    pub normalized_dataset_id: String,
    pub rows: usize,
    pub columns: Vec<ColumnClassification>,
    pub quality: Vec<QualityIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub name: String,
    pub start: String,
    pub end: Option<String>,
    pub meta: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub dataset_id: String,
    pub normalized_dataset_id: String,
    pub dashboard: DashboardDoc,
    pub stages: Vec<PipelineStage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_unknown_labels_degrade() {
        let cols: Vec<ColumnClassification> = serde_json::from_str(
            r#"[{"name":"a","dtype":"Currency"},{"name":"b","dtype":"money"},{"name":"c","dtype":null},{"name":"d"}]"#,
        )
        .unwrap();
        assert_eq!(cols[0].dtype, Dtype::Currency);
        assert_eq!(cols[1].dtype, Dtype::Unknown);
        assert_eq!(cols[2].dtype, Dtype::Unknown);
        assert_eq!(cols[3].dtype, Dtype::Unknown);
    }

    #[test]
    fn chart_plan_reads_camel_case_keys() {
        let plan: ChartPlan = serde_json::from_str(
            r#"{"type":"bar","title":"Top vendedores","xKey":"vendedor","yKey":"receita","topN":3}"#,
        )
        .unwrap();
        assert_eq!(plan.chart_type, "bar");
        assert_eq!(plan.x_key.as_deref(), Some("vendedor"));
        assert_eq!(plan.y_key.as_deref(), Some("receita"));
        assert_eq!(plan.top_n, Some(3));
        assert!(plan.series.is_none());
    }

    #[test]
    fn insight_defaults_fill_absent_fields() {
        let insight = Insight::from(InsightPlan::default());
        assert_eq!(insight.kind, "info");
        assert_eq!(insight.title, "Insight");
        assert_eq!(insight.message, "");
    }

    #[test]
    fn quality_issue_uses_wire_names() {
        let issue = QualityIssue {
            column: "receita".into(),
            kind: IssueKind::DateParseError,
            detail: None,
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["col"], "receita");
        assert_eq!(json["issue"], "date_parse_error");
    }

    #[test]
    fn raw_dataset_pads_ragged_columns() {
        let ds = RawDataset::new(vec![
            RawColumn::new("a", vec!["1".into(), "2".into()]),
            RawColumn::new("b", vec!["x".into()]),
        ]);
        assert_eq!(ds.row_count(), 2);
        assert!(ds.cell(1, 1).is_null());
    }
}
