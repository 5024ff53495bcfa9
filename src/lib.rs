//! Declarative field-rule validation for submitted form data.
//!
//! Each field is registered with a label and a rule string such as
//! `"trim|required|min_length[5]"`. A run resolves every field's value from the
//! submitted data, executes its rules in scheduled order (predicates gate,
//! transforms rewrite the value), and records one message per failing field:
//!
//! ```text
//! set_rules(field, label, "a|b[x]") → run() → error_array() / error(field)
//!                                           → request() (transformed values)
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use formrules::{FieldDescriptor, Validator};
//! use serde_json::json;
//!
//! let mut v = Validator::new();
//! v.set_rules_bulk([
//!     FieldDescriptor::new("email", "trim|required|valid_email").label("Email"),
//!     FieldDescriptor::new("tags[]", "alpha").label("Tags"),
//! ])
//! .set_data(json!({
//!     "email": " ada@example.com ",
//!     "tags": ["rust", "42"],
//! }));
//!
//! assert!(!v.run());
//! assert_eq!(v.value("email"), Some(&json!("ada@example.com")));
//! assert_eq!(
//!     v.error_array()["tags[]"],
//!     "The Tags field may only contain alphabetical characters."
//! );
//! ```
//!
//! # Feature Flags
//!
//! | Feature         | Default | Description |
//! |-----------------|---------|-------------|
//! | `builtin-rules` | yes     | The common predicates and transforms in [`builtin`]. |
//! | `cel-eval`      | yes     | The `cel[...]` rule via the [`cel`] crate. See [`expression`]. |

#[cfg(feature = "builtin-rules")]
pub mod builtin;
pub mod config;
pub mod engine;
pub mod error;
#[cfg(feature = "cel-eval")]
pub mod expression;
pub mod messages;
pub mod parse;
pub mod primitives;
pub mod registry;
pub mod rules;
pub mod schedule;
pub mod types;

pub use error::*;
pub use types::*;

pub use config::Config;
pub use engine::Validator;
pub use messages::{Catalog, MessageCatalog};
pub use registry::FieldRegistry;
pub use rules::{RuleContext, RuleOutcome, RuleProvider, RuleTable};

/// Convenience entry point: validates `data` against `fields` with the
/// built-in rules and returns the report.
///
/// # Example
///
/// ```rust
/// use formrules::FieldDescriptor;
/// use serde_json::json;
///
/// let report = formrules::validate(
///     json!({ "age": "forty" }),
///     [FieldDescriptor::new("age", "required|integer").label("Age")],
/// );
///
/// assert!(!report.valid);
/// assert_eq!(report.errors["age"], "The Age field must contain an integer.");
/// ```
pub fn validate<I>(data: serde_json::Value, fields: I) -> Report
where
    I: IntoIterator<Item = FieldDescriptor>,
{
    let mut validator = Validator::new();
    validator.set_rules_bulk(fields).set_data(data);
    validator.run();
    validator.report()
}
