// Schema normalizer: applies a column classification to a raw dataset.
use crate::data::value_parser::{parse_date_column, parse_number};
use crate::models::{ColumnValues, NormalizedColumn, NormalizedDataset};
use shared::models::{CellValue, ColumnClassification, Dtype, IssueKind, QualityIssue, RawColumn, RawDataset};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub dataset: NormalizedDataset,
    pub quality: Vec<QualityIssue>,
}

/// Converts every column according to its dtype and reports data-quality issues.
///
/// Columns without a classification are treated as `unknown` and passed through; their
/// output dtype is inferred from the stored values. Row order and count never change.
pub fn normalize(raw: &RawDataset, classification: &[ColumnClassification]) -> Normalized {
    let dtypes: HashMap<&str, Dtype> = classification
        .iter()
        .map(|c| (c.name.as_str(), c.dtype))
        .collect();
    let rows = raw.row_count();
    let mut quality = Vec::new();
    let mut columns = Vec::with_capacity(raw.columns.len());

    for column in &raw.columns {
        let dtype = dtypes.get(column.name.as_str()).copied().unwrap_or_default();
        let cells = padded(column, rows);

        let values = match dtype {
            Dtype::Date => match parse_date_column(&cells) {
                Ok(dates) => ColumnValues::Date(dates),
                Err(e) => {
                    tracing::warn!(column = %column.name, error = %e, "Date column left unparsed");
                    quality.push(QualityIssue {
                        column: column.name.clone(),
                        kind: IssueKind::DateParseError,
                        detail: Some(format!("failed to convert dates: {}", e)),
                    });
                    passthrough(cells)
                }
            },
            Dtype::Currency | Dtype::Percent | Dtype::Number => {
                ColumnValues::Number(cells.iter().map(parse_number).collect())
            }
            Dtype::String | Dtype::Category | Dtype::Unknown => passthrough(cells),
        };

        let dtype = match dtype {
            Dtype::Unknown => values.inferred_dtype(),
            classified => classified,
        };
        tracing::debug!(column = %column.name, %dtype, "Column normalized");
        columns.push(NormalizedColumn { name: column.name.clone(), dtype, values });
    }

    for column in &columns {
        let missing = column.values.missing_count();
        if missing > 0 {
            quality.push(QualityIssue {
                column: column.name.clone(),
                kind: IssueKind::Missing,
                detail: Some(format!("{} missing cells", missing)),
            });
        }
    }

    Normalized {
        dataset: NormalizedDataset { columns, row_count: rows },
        quality,
    }
}

fn padded(column: &RawColumn, rows: usize) -> Vec<CellValue> {
    let mut cells = column.values.clone();
    cells.resize(rows, CellValue::Null);
    cells
}

/// Untouched cells, stored as numbers when every present cell already is one.
fn passthrough(cells: Vec<CellValue>) -> ColumnValues {
    let all_numeric = cells
        .iter()
        .all(|c| matches!(c, CellValue::Null | CellValue::Number(_)));
    if all_numeric {
        ColumnValues::Number(
            cells
                .iter()
                .map(|c| match c {
                    CellValue::Number(n) if !n.is_nan() => Some(*n),
                    _ => None,
                })
                .collect(),
        )
    } else {
        ColumnValues::Text(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::RawColumn;

    fn raw() -> RawDataset {
        RawDataset::new(vec![
            RawColumn::new("data", vec!["05/01/2024".into(), "20/02/2024".into(), CellValue::Null]),
            RawColumn::new("receita", vec!["R$ 1.000,00".into(), "—".into(), "R$ 250,50".into()]),
            RawColumn::new("vendedor", vec!["Ana".into(), "Bruno".into(), "Ana".into()]),
            RawColumn::new("pedidos", vec![3.0.into(), CellValue::Null, 5.0.into()]),
            RawColumn::new("obs", vec!["x".into(), "y".into()]),
        ])
    }

    fn classification() -> Vec<ColumnClassification> {
        vec![
            ColumnClassification::new("data", Dtype::Date),
            ColumnClassification::new("receita", Dtype::Currency),
            ColumnClassification::new("vendedor", Dtype::Category),
        ]
    }

    #[test]
    fn test_shape_is_preserved() {
        let out = normalize(&raw(), &classification());
        assert_eq!(out.dataset.row_count, 3);
        assert_eq!(out.dataset.columns.len(), 5);
        for column in &out.dataset.columns {
            assert_eq!(column.values.len(), 3, "column {}", column.name);
        }
        for issue in &out.quality {
            assert!(out.dataset.contains(&issue.column));
        }
    }

    #[test]
    fn test_columns_converted_by_dtype() {
        let out = normalize(&raw(), &classification());
        let ds = &out.dataset;
        assert!(ds.is_date_column("data"));
        assert_eq!(
            ds.column("receita").unwrap().values,
            ColumnValues::Number(vec![Some(1000.0), None, Some(250.5)])
        );
        assert!(matches!(ds.column("vendedor").unwrap().values, ColumnValues::Text(_)));
        assert_eq!(ds.column("vendedor").unwrap().dtype, Dtype::Category);
    }

    #[test]
    fn test_unclassified_columns_get_inferred_dtype() {
        let out = normalize(&raw(), &classification());
        assert_eq!(out.dataset.column("pedidos").unwrap().dtype, Dtype::Number);
        assert_eq!(out.dataset.column("obs").unwrap().dtype, Dtype::String);
        assert!(out.dataset.columns.iter().all(|c| c.dtype != Dtype::Unknown));
    }

    #[test]
    fn test_missing_issues_per_column() {
        let out = normalize(&raw(), &classification());
        let missing: Vec<(&str, &str)> = out
            .quality
            .iter()
            .filter(|q| q.kind == IssueKind::Missing)
            .map(|q| (q.column.as_str(), q.detail.as_deref().unwrap()))
            .collect();
        assert_eq!(
            missing,
            vec![
                ("data", "1 missing cells"),
                ("receita", "1 missing cells"),
                ("pedidos", "1 missing cells"),
                ("obs", "1 missing cells"),
            ]
        );
    }

    #[test]
    fn test_unparseable_date_column_is_passed_through() {
        let raw = RawDataset::new(vec![RawColumn::new("quando", vec!["ontem".into(), "hoje".into()])]);
        let out = normalize(&raw, &[ColumnClassification::new("quando", Dtype::Date)]);
        assert_eq!(out.quality.len(), 1);
        assert_eq!(out.quality[0].kind, IssueKind::DateParseError);
        assert_eq!(out.quality[0].column, "quando");
        assert!(!out.dataset.is_date_column("quando"));
        assert_eq!(
            out.dataset.column("quando").unwrap().values,
            ColumnValues::Text(vec!["ontem".into(), "hoje".into()])
        );
    }

    #[test]
    fn test_no_classification_at_all() {
        let out = normalize(&raw(), &[]);
        assert!(out.dataset.columns.iter().all(|c| !c.is_date()));
        assert_eq!(out.dataset.column("receita").unwrap().dtype, Dtype::String);
    }
}
