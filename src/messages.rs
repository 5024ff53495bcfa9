//! Error message resolution and the message catalog.

use crate::types::Rule;
use std::collections::HashMap;

/// Namespace prefix for catalog keys (`form_validation_required`).
pub const CATALOG_PREFIX: &str = "form_validation_";

/// Catalog key of the "no message configured" line.
pub const MESSAGE_NOT_SET_KEY: &str = "form_validation_error_message_not_set";

const ANONYMOUS: &str = "Anonymous function";

// ─── Catalog ────────────────────────────────────────────────────────────────

/// Extension point for human-language message lookup.
pub trait MessageCatalog {
    fn line(&self, key: &str) -> Option<&str>;
}

/// Default English lines, keyed without the namespace prefix.
static DEFAULT_LINES: &[(&str, &str)] = &[
    ("required", "The {field} field is required."),
    ("isset", "The {field} field must have a value."),
    ("uploaded", "The {field} field must contain an uploaded file."),
    ("matches", "The {field} field does not match the {param} field."),
    ("differs", "The {field} field must differ from the {param} field."),
    ("regex_match", "The {field} field is not in the correct format."),
    ("min_length", "The {field} field must be at least {param} characters in length."),
    ("max_length", "The {field} field cannot exceed {param} characters in length."),
    ("exact_length", "The {field} field must be exactly {param} characters in length."),
    ("valid_url", "The {field} field must contain a valid URL."),
    ("valid_email", "The {field} field must contain a valid email address."),
    ("valid_emails", "The {field} field must contain all valid email addresses."),
    ("valid_ip", "The {field} field must contain a valid IP."),
    ("valid_base64", "The {field} field must contain a valid Base64 string."),
    ("valid_json", "The {field} field must contain valid JSON."),
    ("valid_date", "The {field} field must contain a valid date."),
    ("alpha", "The {field} field may only contain alphabetical characters."),
    ("alpha_numeric", "The {field} field may only contain alpha-numeric characters."),
    (
        "alpha_numeric_spaces",
        "The {field} field may only contain alpha-numeric characters and spaces.",
    ),
    (
        "alpha_dash",
        "The {field} field may only contain alpha-numeric characters, underscores, and dashes.",
    ),
    ("numeric", "The {field} field must contain only numbers."),
    ("integer", "The {field} field must contain an integer."),
    ("decimal", "The {field} field must contain a decimal number."),
    ("greater_than", "The {field} field must contain a number greater than {param}."),
    (
        "greater_than_equal_to",
        "The {field} field must contain a number greater than or equal to {param}.",
    ),
    ("less_than", "The {field} field must contain a number less than {param}."),
    (
        "less_than_equal_to",
        "The {field} field must contain a number less than or equal to {param}.",
    ),
    ("in_list", "The {field} field must be one of: {param}."),
    ("is_natural", "The {field} field must only contain digits."),
    (
        "is_natural_no_zero",
        "The {field} field must only contain digits and must be greater than zero.",
    ),
    ("cel", "The {field} field does not satisfy its expression."),
    (
        "error_message_not_set",
        "Unable to access an error message corresponding to your field name.",
    ),
];

/// Key → message store seeded with the default English catalog.
#[derive(Clone, Debug)]
pub struct Catalog {
    lines: HashMap<String, String>,
}

impl Catalog {
    /// The default catalog.
    pub fn new() -> Self {
        let lines = DEFAULT_LINES
            .iter()
            .map(|(k, v)| (format!("{}{}", CATALOG_PREFIX, k), v.to_string()))
            .collect();
        Catalog { lines }
    }

    /// A catalog with no lines at all.
    pub fn empty() -> Self {
        Catalog {
            lines: HashMap::new(),
        }
    }

    /// Merges caller lines over the current ones.
    pub fn merge<I, K, V>(&mut self, lines: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.lines
            .extend(lines.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCatalog for Catalog {
    fn line(&self, key: &str) -> Option<&str> {
        self.lines.get(key).map(String::as_str)
    }
}

// ─── Resolution ─────────────────────────────────────────────────────────────

/// Resolves the message template for a failing rule.
///
/// First match wins: field-scoped override, global override, namespaced
/// catalog key, bare catalog key, then the "not set" line naming the rule.
/// Rules without a name go straight to the anonymous "not set" line.
pub fn resolve_line(
    rule: &Rule,
    field_overrides: &HashMap<String, String>,
    global_overrides: &HashMap<String, String>,
    catalog: &dyn MessageCatalog,
) -> String {
    let Some(name) = rule.name() else {
        return not_set(catalog, ANONYMOUS);
    };

    if let Some(line) = field_overrides.get(name) {
        return line.clone();
    }
    if let Some(line) = global_overrides.get(name) {
        return line.clone();
    }
    if let Some(line) = catalog.line(&format!("{}{}", CATALOG_PREFIX, name)) {
        return line.to_string();
    }
    if let Some(line) = catalog.line(name) {
        return line.to_string();
    }

    not_set(catalog, name)
}

fn not_set(catalog: &dyn MessageCatalog, what: &str) -> String {
    format!(
        "{}({})",
        catalog.line(MESSAGE_NOT_SET_KEY).unwrap_or_default(),
        what
    )
}

/// Substitutes the field label and rule parameter into a template.
///
/// Templates with a legacy placeholder (`%s`, `%1$s`, `%2$s`) are filled
/// positionally with label then parameter. Anything else gets `{field}` and
/// `{param}` replaced.
pub fn build_message(line: &str, label: &str, param: &str) -> String {
    if has_positional(line) {
        return format_positional(line, &[label, param]);
    }
    line.replace("{field}", label).replace("{param}", param)
}

fn has_positional(line: &str) -> bool {
    line.contains("%s") || line.contains("%1$s") || line.contains("%2$s")
}

fn format_positional(line: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(line.len());
    let mut next = 0;
    let mut rest = line;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        if let Some(after) = tail.strip_prefix('%') {
            out.push('%');
            rest = after;
        } else if let Some(after) = tail.strip_prefix('s') {
            match args.get(next) {
                Some(arg) => out.push_str(arg),
                None => out.push_str("%s"),
            }
            next += 1;
            rest = after;
        } else if let Some((index, after)) = explicit_position(tail) {
            match index.checked_sub(1).and_then(|i| args.get(i)) {
                Some(arg) => out.push_str(arg),
                None => out.push_str(&rest[pos..rest.len() - after.len()]),
            }
            rest = after;
        } else {
            out.push('%');
            rest = tail;
        }
    }

    out.push_str(rest);
    out
}

/// Parses `N$s` at the start of `tail`, returning `N` and what follows.
fn explicit_position(tail: &str) -> Option<(usize, &str)> {
    let digits = tail.len() - tail.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let after = tail[digits..].strip_prefix("$s")?;
    let index = tail[..digits].parse().ok()?;
    Some((index, after))
}
