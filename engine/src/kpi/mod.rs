// KPI expression sandbox: parse, whitelist, resolve columns, evaluate.
pub mod expression;
pub mod functions;

pub use expression::{parse_expression, Expression};
pub use functions::{lookup, KpiFunction, FUNCTIONS};

use crate::error::{EngineError, ExprError, Result};
use crate::models::{NormalizedColumn, NormalizedDataset};
use shared::models::{Kpi, KpiPlan};

/// Evaluates one whitelisted call against the dataset.
///
/// Errors, in order of checking: syntax, function outside the whitelist, wrong arity,
/// first referenced column that does not exist.
pub fn evaluate_expression(expr: &str, dataset: &NormalizedDataset) -> std::result::Result<f64, ExprError> {
    let parsed = parse_expression(expr)?;
    let function = lookup(&parsed.function).ok_or_else(|| ExprError::FunctionNotAllowed {
        function: parsed.function.clone(),
        expr: expr.to_string(),
    })?;
    let arity_error = || ExprError::Arity {
        function: parsed.function.clone(),
        expected: function.arity,
        found: parsed.args.len(),
        expr: expr.to_string(),
    };
    if parsed.args.len() != function.arity {
        return Err(arity_error());
    }

    let columns = parsed
        .args
        .iter()
        .map(|name| {
            dataset.column(name).ok_or_else(|| ExprError::ColumnNotFound {
                column: name.clone(),
                expr: expr.to_string(),
            })
        })
        .collect::<std::result::Result<Vec<&NormalizedColumn>, _>>()?;

    function.apply(dataset, &columns).ok_or_else(arity_error)
}

/// Computes a planned KPI. Failures carry the KPI name.
pub fn evaluate_kpi(plan: &KpiPlan, dataset: &NormalizedDataset, default_currency: &str) -> Result<Kpi> {
    let value = evaluate_expression(&plan.value_expr, dataset).map_err(|source| EngineError::KpiError {
        name: plan.name.clone(),
        source,
    })?;
    tracing::debug!(kpi = %plan.name, expr = %plan.value_expr, value, "KPI evaluated");
    Ok(Kpi {
        name: plan.name.clone(),
        value,
        unit: unit_for_format(plan.fmt.as_deref(), default_currency),
    })
}

/// Maps a KPI `fmt` tag to the output unit: `currency[:CODE]` becomes `currency:<code>`
/// (lowercased, falling back to `default_currency`), `percent`/`%` becomes `percent`,
/// anything else has no unit.
pub fn unit_for_format(fmt: Option<&str>, default_currency: &str) -> Option<String> {
    let fmt = fmt?.to_lowercase();
    if fmt.starts_with("currency") {
        let code = fmt.split(':').nth(1).unwrap_or(default_currency);
        Some(format!("currency:{}", code))
    } else if fmt == "percent" || fmt == "%" {
        Some("percent".to_string())
    } else {
        None
    }
}
