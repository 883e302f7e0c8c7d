// Parser for the single-call KPI expression language: `name(arg[, arg])`.
use crate::error::ExprError;

/// A parsed `function(arg, ...)` call. The function name is lowercased; arguments are
/// trimmed column names, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub function: String,
    pub args: Vec<String>,
}

/// Accepts exactly one call: an identifier of letters and `_`, optional whitespace, then a
/// parenthesised comma-separated argument list. Nested calls, operators and literals are
/// rejected as syntax errors.
pub fn parse_expression(source: &str) -> Result<Expression, ExprError> {
    let syntax = || ExprError::Syntax { expr: source.to_string() };
    let text = source.trim();

    let open = text.find('(').ok_or_else(syntax)?;
    let name = text[..open].trim_end();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        return Err(syntax());
    }

    let inner = text[open + 1..].strip_suffix(')').ok_or_else(syntax)?;
    if inner.contains(['(', ')']) {
        return Err(syntax());
    }

    let args: Vec<String> = inner.split(',').map(|a| a.trim().to_string()).collect();
    if args.iter().any(String::is_empty) {
        return Err(syntax());
    }

    Ok(Expression { function: name.to_lowercase(), args })
}
