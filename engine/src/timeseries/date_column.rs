use crate::models::NormalizedDataset;

const PRIMARY: &str = "data";
const PREFERRED: [&str; 5] = ["date", "dt", "dia", "competencia", "month"];
/// Calendar-part columns hold numbers (month, year), never a date axis.
const CALENDAR_PARTS: [&str; 2] = ["mes", "ano"];

/// Picks "the" date axis of a dataset. Shared by KPI evaluation and chart building.
///
/// Order: a date-typed `data` column, then the first date-typed column among the
/// preferred names, then the first date-typed column in column order that is not
/// `mes` or `ano`. Names are matched case-sensitively.
pub fn resolve_date_column(dataset: &NormalizedDataset) -> Option<&str> {
    if dataset.is_date_column(PRIMARY) {
        return Some(PRIMARY);
    }
    if let Some(name) = PREFERRED.into_iter().find(|name| dataset.is_date_column(name)) {
        return Some(name);
    }
    dataset
        .columns
        .iter()
        .find(|c| c.is_date() && !CALENDAR_PARTS.contains(&c.name.as_str()))
        .map(|c| c.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnValues, NormalizedColumn};
    use shared::models::Dtype;

    fn date_col(name: &str) -> NormalizedColumn {
        NormalizedColumn {
            name: name.to_string(),
            dtype: Dtype::Date,
            values: ColumnValues::Date(vec![None]),
        }
    }

    fn number_col(name: &str) -> NormalizedColumn {
        NormalizedColumn {
            name: name.to_string(),
            dtype: Dtype::Number,
            values: ColumnValues::Number(vec![Some(1.0)]),
        }
    }

    fn dataset(columns: Vec<NormalizedColumn>) -> NormalizedDataset {
        NormalizedDataset { columns, row_count: 1 }
    }

    #[test]
    fn test_data_column_wins() {
        let ds = dataset(vec![date_col("emissao"), date_col("date"), date_col("data")]);
        assert_eq!(resolve_date_column(&ds), Some("data"));
    }

    #[test]
    fn test_data_must_be_date_typed() {
        let ds = dataset(vec![number_col("data"), date_col("competencia"), date_col("dt")]);
        assert_eq!(resolve_date_column(&ds), Some("dt"));
    }

    #[test]
    fn test_calendar_parts_are_never_the_axis() {
        let ds = dataset(vec![date_col("mes"), date_col("ano"), date_col("emissao")]);
        assert_eq!(resolve_date_column(&ds), Some("emissao"));

        let ds = dataset(vec![date_col("mes"), date_col("ano")]);
        assert_eq!(resolve_date_column(&ds), None);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let ds = dataset(vec![date_col("Data"), date_col("vencimento")]);
        assert_eq!(resolve_date_column(&ds), Some("Data"));
        let ds = dataset(vec![number_col("receita")]);
        assert_eq!(resolve_date_column(&ds), None);
    }
}
