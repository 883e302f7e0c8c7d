// Whitelisted KPI functions. Nothing outside this table can be evaluated.
use crate::models::{NormalizedColumn, NormalizedDataset};
use crate::timeseries::aggregate::sum_by_month;
use crate::timeseries::{resolve_date_column, AggMode};

type EvalFn = fn(&NormalizedDataset, &[&NormalizedColumn]) -> f64;

/// One entry of the dispatch table: name, fixed arity and a pure evaluation function.
pub struct KpiFunction {
    pub name: &'static str,
    pub arity: usize,
    eval: EvalFn,
}

impl KpiFunction {
    /// `None` when `args` does not match the arity.
    pub fn apply(&self, dataset: &NormalizedDataset, args: &[&NormalizedColumn]) -> Option<f64> {
        if args.len() != self.arity {
            return None;
        }
        Some((self.eval)(dataset, args))
    }
}

pub static FUNCTIONS: [KpiFunction; 7] = [
    KpiFunction { name: "sum", arity: 1, eval: |_, args| sum(args[0]) },
    KpiFunction { name: "avg", arity: 1, eval: |_, args| avg(args[0]) },
    KpiFunction { name: "min", arity: 1, eval: |_, args| present(args[0]).reduce(f64::min).unwrap_or(0.0) },
    KpiFunction { name: "max", arity: 1, eval: |_, args| present(args[0]).reduce(f64::max).unwrap_or(0.0) },
    KpiFunction { name: "count", arity: 1, eval: |_, args| present(args[0]).count() as f64 },
    KpiFunction { name: "growth_mom", arity: 1, eval: growth_mom },
    KpiFunction { name: "attainment", arity: 2, eval: |_, args| attainment(args[0], args[1]) },
];

pub fn lookup(name: &str) -> Option<&'static KpiFunction> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

fn present(column: &NormalizedColumn) -> impl Iterator<Item = f64> {
    column.numeric_values().into_iter().flatten()
}

fn sum(column: &NormalizedColumn) -> f64 {
    present(column).sum()
}

fn avg(column: &NormalizedColumn) -> f64 {
    let (total, n) = present(column).fold((0.0, 0usize), |(t, n), v| (t + v, n + 1));
    if n == 0 {
        0.0
    } else {
        total / n as f64
    }
}

/// Month-over-month change of the last two non-zero months; 0.0 without a date axis,
/// with fewer than two months, or with a zero baseline.
fn growth_mom(dataset: &NormalizedDataset, args: &[&NormalizedColumn]) -> f64 {
    let Some(dates) = resolve_date_column(dataset).and_then(|name| dataset.dates(name)) else {
        tracing::warn!(column = %args[0].name, "No date axis, growth_mom defaults to 0.0");
        return 0.0;
    };
    let months = sum_by_month(dates, &[args[0].numeric_values()], AggMode::GroupBy, true);
    match months.as_slice() {
        [.., (_, prev), (_, last)] if prev[0] != 0.0 => (last[0] - prev[0]) / prev[0].abs(),
        _ => 0.0,
    }
}

fn attainment(actual: &NormalizedColumn, target: &NormalizedColumn) -> f64 {
    let target = sum(target);
    if target == 0.0 {
        0.0
    } else {
        sum(actual) / target
    }
}
