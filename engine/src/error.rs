use thiserror::Error;

/// Failures of the KPI expression sandbox. Every variant names the offending expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("invalid KPI expression: '{expr}'")]
    Syntax { expr: String },

    #[error("function '{function}' is not allowed in '{expr}'")]
    FunctionNotAllowed { function: String, expr: String },

    #[error("function '{function}' takes {expected} argument(s) but got {found} in '{expr}'")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
        expr: String,
    },

    #[error("column '{column}' not found in '{expr}'")]
    ColumnNotFound { column: String, expr: String },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    #[error("Classifier returned an unusable reply ({reason})")]
    ClassifierReply { reason: String, raw: String },

    #[error("Invalid column classification: {0}")]
    InvalidClassification(String),

    #[error("Failed to compute KPI '{name}': {source}")]
    KpiError {
        name: String,
        #[source]
        source: ExprError,
    },

    #[error("Chart '{title}': {reason}")]
    ChartValidation { title: String, reason: String },

    #[error("Aggregation error: {0}")]
    AggregationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl EngineError {
    pub fn chart(title: &str, reason: impl Into<String>) -> Self {
        EngineError::ChartValidation {
            title: title.to_string(),
            reason: reason.into(),
        }
    }

    /// Status code an HTTP front-end should answer with for this error.
    pub fn status_code(&self) -> u16 {
        tracing::error!("Mapping EngineError to status code: {:?}", self);
        match self {
            EngineError::NotFound(_) => 404,
            EngineError::ClassifierReply { .. } => 502,
            EngineError::CsvSystemError { .. }
            | EngineError::CsvDataFormatError(_)
            | EngineError::JsonError { .. }
            | EngineError::InvalidClassification(_)
            | EngineError::KpiError { .. }
            | EngineError::ChartValidation { .. } => 400,
            EngineError::ConfigError(_)
            | EngineError::IoError { .. }
            | EngineError::AggregationError(_)
            | EngineError::AnyhowError(_) => 500,
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
