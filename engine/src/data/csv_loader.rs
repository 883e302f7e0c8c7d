// Reads an uploaded CSV into a RawDataset, sniffing `,` vs `;` delimiters.
use crate::error::{EngineError, Result};
use csv::{ReaderBuilder, StringRecord};
use shared::models::{CellValue, RawColumn, RawDataset};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell texts a dataframe reader treats as missing.
const NA_VALUES: [&str; 12] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>", "#NA",
];

pub fn load_raw_dataset(path: &Path) -> Result<RawDataset> {
    let file = File::open(path).map_err(|e| {
        EngineError::CsvDataFormatError(format!("Failed to open CSV file '{}': {}", path.display(), e))
    })?;
    read_raw_dataset(file)
}

pub fn read_raw_dataset<R: Read>(mut reader: R) -> Result<RawDataset> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    let content = content.trim_start_matches('\u{feff}');

    let mut dataset = parse_with_delimiter(content, b',')?;
    if dataset.columns.len() == 1 && dataset.columns[0].name.contains(';') {
        tracing::debug!("Single comma-separated column contains ';', re-reading as semicolon CSV");
        dataset = parse_with_delimiter(content, b';')?;
    }

    if dataset.row_count() == 0 {
        return Err(EngineError::CsvDataFormatError("empty or unreadable file".to_string()));
    }
    tracing::info!(
        columns = dataset.columns.len(),
        rows = dataset.row_count(),
        "Raw dataset loaded from CSV"
    );
    Ok(dataset)
}

fn parse_with_delimiter(content: &str, delimiter: u8) -> Result<RawDataset> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = column_names(rdr.headers()?)?;
    let mut columns: Vec<RawColumn> = headers
        .into_iter()
        .map(|name| RawColumn::new(name, Vec::new()))
        .collect();

    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| {
            EngineError::CsvDataFormatError(format!("Error reading CSV record at line {}: {}", idx + 2, e))
        })?;
        for (pos, column) in columns.iter_mut().enumerate() {
            column.values.push(record.get(pos).map_or(CellValue::Null, read_cell));
        }
    }
    Ok(RawDataset::new(columns))
}

fn column_names(headers: &StringRecord) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());
    for (pos, header) in headers.iter().enumerate() {
        let name = match header.trim() {
            "" => format!("Unnamed: {}", pos),
            trimmed => trimmed.to_string(),
        };
        if !seen.insert(name.clone()) {
            return Err(EngineError::CsvDataFormatError(format!("Duplicate column name '{}'", name)));
        }
        names.push(name);
    }
    Ok(names)
}

/// Empty and NA-like cells are null, plain `.`-decimal numbers are numbers, the rest is text.
fn read_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NA_VALUES.contains(&trimmed) {
        return CellValue::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_comma_separated() {
        let tmp_file = create_test_csv("data,receita,vendedor\n2024-01-05,\"R$ 1.000,00\",Ana\n2024-02-01,,Bruno");
        let ds = load_raw_dataset(tmp_file.path()).unwrap();

        assert_eq!(ds.column_names().collect::<Vec<_>>(), vec!["data", "receita", "vendedor"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.columns[1].values[0], CellValue::from("R$ 1.000,00"));
        assert_eq!(ds.columns[1].values[1], CellValue::Null);
        assert_eq!(ds.columns[2].values[1], CellValue::from("Bruno"));
    }

    #[test]
    fn test_semicolon_fallback_and_numeric_cells() {
        let content = "Ativo;Data;Quantidade;Volume\nWINFUT;30/12/2024;24228;600.822.115,84\nPETR4;02/01/2023;1000;NaN";
        let ds = read_raw_dataset(content.as_bytes()).unwrap();

        assert_eq!(ds.columns.len(), 4);
        assert_eq!(ds.columns[2].values[0], CellValue::Number(24228.0));
        assert_eq!(ds.columns[3].values[0], CellValue::from("600.822.115,84"));
        assert_eq!(ds.columns[3].values[1], CellValue::Null);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let ds = read_raw_dataset("a,b,c\n1,2\n3,4,5".as_bytes()).unwrap();
        assert_eq!(ds.columns[2].values, vec![CellValue::Null, CellValue::Number(5.0)]);
    }

    #[test]
    fn test_header_only_file_is_rejected() {
        let err = read_raw_dataset("a,b\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("empty or unreadable file"));
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let err = read_raw_dataset("a,a\n1,2".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Duplicate column name 'a'"));

        let ds = read_raw_dataset("\u{feff}a,,c\n1,2,3".as_bytes()).unwrap();
        assert_eq!(ds.columns[0].name, "a");
        assert_eq!(ds.columns[1].name, "Unnamed: 1");
    }
}
