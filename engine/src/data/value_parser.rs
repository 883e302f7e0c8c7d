// Locale-tolerant cell parsing: pt-BR / international numbers and column-wide date detection.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use shared::models::CellValue;
use thiserror::Error;

/// Currency symbols stripped from the start of a number, checked in this order.
const MONEY_SYMBOLS: [&str; 4] = ["R$", "US$", "€", "£"];

/// Placeholder some spreadsheets use for "no value".
const EM_DASH: &str = "—";

pub fn parse_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Null | CellValue::Bool(_) => None,
        CellValue::Number(n) => (!n.is_nan()).then_some(*n),
        CellValue::Text(s) => parse_number_str(s),
    }
}

/// Parses "R$ 1.234,56", "1,234.56", "12,5%" and friends. `None` means missing.
///
/// When both `,` and `.` appear, whichever comes last is the decimal separator and the
/// other one is dropped as a thousands separator. A lone `,` is a decimal comma.
/// Percentages always read `,` as the decimal separator and are divided by 100.
pub fn parse_number_str(raw: &str) -> Option<f64> {
    let mut s = raw.trim();
    if s.is_empty() || s == EM_DASH {
        return None;
    }
    for symbol in MONEY_SYMBOLS {
        if let Some(rest) = s.strip_prefix(symbol) {
            s = rest;
        }
    }
    // Covers NBSP, narrow no-break, figure and thin spaces as well as ordinary ones.
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(body) = compact.strip_suffix('%') {
        let normalized = body.replace('.', "").replace(',', ".");
        return to_float(&normalized).map(|v| v / 100.0);
    }

    let normalized = match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (Some(_), None) => compact.replace(',', "."),
        _ => compact,
    };
    to_float(&normalized)
}

fn to_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Lenient coercion used by the evaluator and aggregator: numbers stay numbers, text must
/// be a plain `.`-decimal literal, everything else is missing.
pub fn coerce_numeric(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => (!n.is_nan()).then_some(*n),
        CellValue::Text(s) => to_float(s.trim()),
        CellValue::Null | CellValue::Bool(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Format chosen for a whole column from its first non-empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `YYYY-MM-DD`
    Iso,
    /// `DD/MM/YYYY`
    DayMonthYear,
    /// Anything else: each cell goes through the tolerant parser.
    Mixed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DateParseError {
    #[error("none of the {0} non-empty values could be read as a date")]
    NoParsableValues(usize),
}

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

// Day-first comes before month-first, so "05/01/2024" is 5 January.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%B %d, %Y",
];

const SHORT_YEAR_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y", "%m/%d/%y"];

pub fn detect_layout(sample: &str) -> DateLayout {
    let b = sample.as_bytes();
    let digits = |range: std::ops::Range<usize>| b[range].iter().all(u8::is_ascii_digit);
    if b.len() == 10 {
        if b[4] == b'-' && b[7] == b'-' && digits(0..4) && digits(5..7) && digits(8..10) {
            return DateLayout::Iso;
        }
        if b[2] == b'/' && b[5] == b'/' && digits(0..2) && digits(3..5) && digits(6..10) {
            return DateLayout::DayMonthYear;
        }
    }
    DateLayout::Mixed
}

/// Parses a whole column with one layout decided from its first non-empty value.
///
/// Individual cells that do not fit become `None`. The column as a whole fails only
/// when it has values and not a single one of them is a date.
pub fn parse_date_column(values: &[CellValue]) -> Result<Vec<Option<NaiveDateTime>>, DateParseError> {
    let texts: Vec<Option<String>> = values
        .iter()
        .map(|v| v.as_text().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect();

    let layout = texts
        .iter()
        .flatten()
        .next()
        .map_or(DateLayout::Mixed, |first| detect_layout(first));

    let parsed: Vec<Option<NaiveDateTime>> = texts
        .iter()
        .map(|t| {
            t.as_deref().and_then(|s| match layout {
                DateLayout::Iso => parse_fixed(s, "%Y-%m-%d"),
                DateLayout::DayMonthYear => parse_fixed(s, "%d/%m/%Y"),
                DateLayout::Mixed => parse_date_tolerant(s),
            })
        })
        .collect();

    let non_empty = texts.iter().flatten().count();
    if non_empty > 0 && parsed.iter().all(Option::is_none) {
        return Err(DateParseError::NoParsableValues(non_empty));
    }
    tracing::debug!(?layout, non_empty, parsed = parsed.iter().flatten().count(), "Date column parsed");
    Ok(parsed)
}

fn parse_fixed(s: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(s, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Best-effort parse of a single value, preferring day-before-month.
pub fn parse_date_tolerant(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt);
    }
    let date_formats = if has_short_year(s) { SHORT_YEAR_FORMATS } else { DATE_FORMATS };
    if let Some(dt) = date_formats.iter().find_map(|f| parse_fixed(s, f)) {
        return Some(dt);
    }
    // Month-only values ("2024-03", "03/2024") anchor to the first day.
    parse_fixed(&format!("{}-01", s), "%Y-%m-%d").or_else(|| parse_fixed(&format!("01/{}", s), "%d/%m/%Y"))
}

fn has_short_year(s: &str) -> bool {
    let parts: Vec<&str> = s.split(['/', '-', '.']).collect();
    parts.len() == 3
        && parts[2].len() == 2
        && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn text(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    #[test]
    fn test_parse_number_brl_currency() {
        assert_eq!(parse_number_str("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse_number_str("R$\u{a0}600.822.115,84"), Some(600822115.84));
        assert_eq!(parse_number_str("US$ 10,5"), Some(10.5));
        assert_eq!(parse_number_str("€1\u{202f}000,00"), Some(1000.0));
    }

    #[test]
    fn test_parse_number_international_thousands() {
        assert_eq!(parse_number_str("1,234.56"), Some(1234.56));
        assert_eq!(parse_number_str("1234.5"), Some(1234.5));
        assert_eq!(parse_number_str("123,45"), Some(123.45));
    }

    #[test]
    fn test_parse_number_percent() {
        assert_eq!(parse_number_str("12,5%"), Some(0.125));
        assert_eq!(parse_number_str("100%"), Some(1.0));
        assert_eq!(parse_number_str("abc%"), None);
    }

    #[test]
    fn test_parse_number_missing_markers() {
        assert_eq!(parse_number_str(""), None);
        assert_eq!(parse_number_str("   "), None);
        assert_eq!(parse_number_str("—"), None);
        assert_eq!(parse_number_str("R$"), None);
        assert_eq!(parse_number_str("n/a"), None);
        assert_eq!(parse_number_str("1.234.567"), None);
        assert_eq!(parse_number(&CellValue::Null), None);
        assert_eq!(parse_number(&CellValue::Number(f64::NAN)), None);
        assert_eq!(parse_number(&CellValue::Number(42.0)), Some(42.0));
    }

    #[test]
    fn test_coerce_numeric_is_plain() {
        assert_eq!(coerce_numeric(&CellValue::from(" 12.5 ")), Some(12.5));
        assert_eq!(coerce_numeric(&CellValue::from("1.234,56")), None);
        assert_eq!(coerce_numeric(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_detect_layout() {
        assert_eq!(detect_layout("2024-03-01"), DateLayout::Iso);
        assert_eq!(detect_layout("01/03/2024"), DateLayout::DayMonthYear);
        assert_eq!(detect_layout("1/3/2024"), DateLayout::Mixed);
        assert_eq!(detect_layout("2024-03-01 10:00"), DateLayout::Mixed);
    }

    #[test]
    fn test_iso_column_is_parsed_with_fixed_format() {
        let parsed = parse_date_column(&text(&["2024-01-15", "", "15/01/2024", "2024-02-30"])).unwrap();
        assert_eq!(parsed[0].unwrap().date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(parsed[1], None);
        // Fixed layout: a differently formatted cell is missing, not re-guessed.
        assert_eq!(parsed[2], None);
        assert_eq!(parsed[3], None);
    }

    #[test]
    fn test_day_month_year_column() {
        let parsed = parse_date_column(&text(&["05/01/2024", "31/12/2023"])).unwrap();
        let first = parsed[0].unwrap();
        assert_eq!((first.day(), first.month(), first.year()), (5, 1, 2024));
        assert_eq!(parsed[1].unwrap().month(), 12);
    }

    #[test]
    fn test_tolerant_fallback_prefers_day_first() {
        let parsed = parse_date_column(&text(&["5/1/2024", "12/31/2024", "2024-03", "lixo"])).unwrap();
        assert_eq!(parsed[0].unwrap().date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        // Day-first impossible, month-first accepted.
        assert_eq!(parsed[1].unwrap().date(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(parsed[2].unwrap().date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(parsed[3], None);
    }

    #[test]
    fn test_tolerant_keeps_time_and_short_years() {
        let dt = parse_date_tolerant("30/12/2024 18:20:00").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (18, 20));
        let short = parse_date_tolerant("05/01/24").unwrap();
        assert_eq!(short.year(), 2024);
        assert_eq!(short.month(), 1);
    }

    #[test]
    fn test_first_value_skips_nulls_and_blanks() {
        let values = vec![CellValue::Null, CellValue::from("  "), CellValue::from("2024-06-01")];
        let parsed = parse_date_column(&values).unwrap();
        assert_eq!(parsed[0], None);
        assert_eq!(parsed[2].unwrap().month(), 6);
    }

    #[test]
    fn test_column_without_any_date_fails() {
        let err = parse_date_column(&text(&["foo", "bar", ""])).unwrap_err();
        assert_eq!(err, DateParseError::NoParsableValues(2));
        // An all-empty column is not a failure, just missing values.
        assert_eq!(parse_date_column(&[CellValue::Null]).unwrap(), vec![None]);
    }
}
