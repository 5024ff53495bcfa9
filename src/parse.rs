//! Field declaration parsing: bracket paths, legacy rule strings, rule tokens.

use crate::types::{FieldSpec, RuleSet};
use std::collections::HashMap;

/// Separator between rules in a legacy rule string.
pub const RULE_SEPARATOR: char = '|';

// ─── Field names ────────────────────────────────────────────────────────────

/// Splits a bracketed field name into `(is_array, keys)`.
///
/// `user[address][city]` → `(true, ["user", "address", "city"])`. Empty
/// brackets mark the field as array-typed but add no key: `tags[]` →
/// `(true, ["tags"])`. Names without `[` → `(false, [])`.
pub fn parse_field_name(name: &str) -> (bool, Vec<String>) {
    let Some(open) = name.find('[') else {
        return (false, Vec::new());
    };

    let mut keys = vec![name[..open].to_string()];
    let mut rest = &name[open..];
    let mut groups = 0;

    // Each segment runs from a '[' to the nearest following ']'.
    while let Some(start) = rest.find('[') {
        let after = &rest[start + 1..];
        let Some(end) = after.find(']') else {
            break;
        };
        let segment = &after[..end];
        if !segment.is_empty() {
            keys.push(segment.to_string());
        }
        groups += 1;
        rest = &after[end + 1..];
    }

    // An unterminated '[' is part of a plain name.
    if groups == 0 {
        return (false, Vec::new());
    }

    (true, keys)
}

// ─── Rule strings ───────────────────────────────────────────────────────────

/// Splits a legacy `|`-joined rule string into tokens.
///
/// A `|` inside brackets belongs to the rule parameter:
/// `in_list[red|green]|required` → `["in_list[red|green]", "required"]`.
/// Bracket depth is tracked so nested and repeated groups split correctly.
/// Empty tokens are dropped.
pub fn split_rules(rules: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;

    for c in rules.chars() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            RULE_SEPARATOR if depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Splits `name[param]` into its name and parameter.
///
/// The name ends at the first `[`; the parameter runs to the last `]`, so
/// parameters may contain brackets themselves (`regex_match[/^[a-z]+$/]`).
/// Without a matching `]` the whole token is the name.
pub fn decompose_rule(token: &str) -> (&str, Option<&str>) {
    match (token.find('['), token.rfind(']')) {
        (Some(open), Some(close)) if close > open => {
            (&token[..open], Some(&token[open + 1..close]))
        }
        _ => (token, None),
    }
}

// ─── Field declarations ─────────────────────────────────────────────────────

/// Builds a [`FieldSpec`] from a declaration.
///
/// Returns `None` for an empty field name or an empty rule list; callers treat
/// that as "nothing to validate", not as an error. An empty label falls back
/// to the field name.
pub fn field_spec(
    field: &str,
    label: &str,
    rules: RuleSet,
    errors: HashMap<String, String>,
) -> Option<FieldSpec> {
    if field.is_empty() {
        return None;
    }

    let rules = rules.into_rules();
    if rules.is_empty() {
        return None;
    }

    let (is_array, keys) = parse_field_name(field);
    let label = if label.is_empty() { field } else { label };

    Some(FieldSpec {
        name: field.to_string(),
        label: label.to_string(),
        rules,
        errors,
        is_array,
        keys,
        value: None,
        error: String::new(),
    })
}
