//! The `cel[<expression>]` rule.
//!
//! The expression sees three variables: `value` (the value under validation),
//! `field` (its field name) and `data` (the submitted data). A boolean result
//! gates; any other result replaces the value, like any transform rule.
//!
//! ```text
//! cel[size(value) >= 3 && value.startsWith("sk_")]
//! cel[value.lowerAscii()]
//! ```

use crate::error::{ExpressionError, ExpressionErrorKind};
use crate::rules::{RuleContext, RuleOutcome, RuleTable};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Rule name the expression evaluator is registered under.
pub const CEL_RULE: &str = "cel";

/// Registers the `cel` rule into `table`.
pub fn register(table: &mut RuleTable) {
    table.register(CEL_RULE, cel_rule);
}

fn cel_rule(value: &Value, param: Option<&str>, ctx: &RuleContext<'_>) -> RuleOutcome {
    let Some(expression) = param else {
        tracing::debug!(field = ctx.field(), "cel rule without an expression");
        return RuleOutcome::Invalid;
    };

    let mut variables = serde_json::Map::new();
    variables.insert("value".to_string(), value.clone());
    variables.insert("field".to_string(), Value::String(ctx.field().to_string()));
    variables.insert("data".to_string(), ctx.data().clone());

    match evaluate(expression, &Value::Object(variables)) {
        Ok(result) => result.into(),
        Err(e) => {
            tracing::debug!(field = ctx.field(), expression, error = %e, "cel rule failed");
            RuleOutcome::Invalid
        }
    }
}

/// Evaluates a CEL expression against a context of named variables.
///
/// `context` is a JSON object; each key becomes a variable.
pub fn evaluate(expression: &str, context: &Value) -> Result<Value, ExpressionError> {
    let program = cel::Program::compile(expression).map_err(|e| ExpressionError {
        kind: ExpressionErrorKind::Compile,
        message: format!("CEL compile error: {}", e),
    })?;

    let mut cel_ctx = cel::Context::default();

    if let Value::Object(map) = context {
        for (key, value) in map {
            cel_ctx.add_variable_from_value(key.as_str(), json_to_cel(value));
        }
    }

    let result = program.execute(&cel_ctx).map_err(|e| ExpressionError {
        kind: ExpressionErrorKind::Execution,
        message: format!("CEL execution error: {}", e),
    })?;

    cel_to_json(&result).ok_or_else(|| ExpressionError {
        kind: ExpressionErrorKind::Execution,
        message: format!("CEL result has no JSON form: {}", result.type_of()),
    })
}

// ─── Conversion ─────────────────────────────────────────────────────────────

fn json_to_cel(value: &Value) -> cel::Value {
    match value {
        Value::Null => cel::Value::Null,
        Value::Bool(b) => cel::Value::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(cel::Value::Int)
            .or_else(|| n.as_u64().map(cel::Value::UInt))
            .or_else(|| n.as_f64().map(cel::Value::Float))
            .unwrap_or(cel::Value::Null),
        Value::String(s) => cel::Value::String(Arc::new(s.clone())),
        Value::Array(items) => cel::Value::List(Arc::new(items.iter().map(json_to_cel).collect())),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), json_to_cel(v)))
            .collect::<HashMap<String, cel::Value>>()
            .into(),
    }
}

/// Converts a CEL result back to JSON.
///
/// Returns `None` for values JSON cannot carry: bytes, timestamps,
/// durations, functions and non-finite floats, also when nested.
fn cel_to_json(value: &cel::Value) -> Option<Value> {
    let json = match value {
        cel::Value::Null => Value::Null,
        cel::Value::Bool(b) => Value::Bool(*b),
        cel::Value::Int(i) => Value::from(*i),
        cel::Value::UInt(u) => Value::from(*u),
        cel::Value::Float(f) => Value::Number(serde_json::Number::from_f64(*f)?),
        cel::Value::String(s) => Value::String(s.to_string()),
        cel::Value::List(items) => Value::Array(
            items
                .iter()
                .map(cel_to_json)
                .collect::<Option<Vec<_>>>()?,
        ),
        cel::Value::Map(m) => Value::Object(
            m.map
                .iter()
                .map(|(key, val)| Some((map_key(key), cel_to_json(val)?)))
                .collect::<Option<serde_json::Map<_, _>>>()?,
        ),
        _ => return None,
    };
    Some(json)
}

fn map_key(key: &cel::objects::Key) -> String {
    match key {
        cel::objects::Key::String(s) => s.to_string(),
        cel::objects::Key::Int(i) => i.to_string(),
        cel::objects::Key::Uint(u) => u.to_string(),
        cel::objects::Key::Bool(b) => b.to_string(),
    }
}
