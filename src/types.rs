//! Field specifications, rule references, registration descriptors and reports.

use crate::parse::{decompose_rule, split_rules};
use crate::rules::{RuleContext, RuleOutcome};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Prefix marking a legacy callback rule (`callback_unique_email`).
pub const CALLBACK_PREFIX: &str = "callback_";

/// An invocable rule body: `(value, parameter, context) -> outcome`.
pub type RuleFn = Arc<dyn Fn(&Value, Option<&str>, &RuleContext<'_>) -> RuleOutcome + Send + Sync>;

// ─── Rule ───────────────────────────────────────────────────────────────────

/// A single rule applied to a field value.
///
/// Named and callback rules are dispatched by name through a
/// [`RuleProvider`](crate::rules::RuleProvider); callables carry their own body.
#[derive(Clone)]
pub enum Rule {
    /// `max_length[5]` → name `max_length`, param `5`.
    Named { name: String, param: Option<String> },
    /// `callback_foo[bar]` with the prefix stripped.
    Callback { name: String, param: Option<String> },
    /// Anonymous callable. Has no name for message lookup.
    Callable(RuleFn),
    /// Callable with an alias used for message lookup.
    NamedCallable { name: String, func: RuleFn },
}

impl Rule {
    /// Parses one rule token. Tokens starting with `callback_` become
    /// [`Rule::Callback`]; everything else is [`Rule::Named`].
    pub fn parse(token: &str) -> Rule {
        match token.strip_prefix(CALLBACK_PREFIX) {
            Some(rest) => {
                let (name, param) = decompose_rule(rest);
                Rule::Callback {
                    name: name.to_string(),
                    param: param.map(str::to_string),
                }
            }
            None => {
                let (name, param) = decompose_rule(token);
                Rule::Named {
                    name: name.to_string(),
                    param: param.map(str::to_string),
                }
            }
        }
    }

    pub fn named(name: impl Into<String>, param: Option<&str>) -> Rule {
        Rule::Named {
            name: name.into(),
            param: param.map(str::to_string),
        }
    }

    pub fn callable<F>(func: F) -> Rule
    where
        F: Fn(&Value, Option<&str>, &RuleContext<'_>) -> RuleOutcome + Send + Sync + 'static,
    {
        Rule::Callable(Arc::new(func))
    }

    pub fn named_callable<F>(name: impl Into<String>, func: F) -> Rule
    where
        F: Fn(&Value, Option<&str>, &RuleContext<'_>) -> RuleOutcome + Send + Sync + 'static,
    {
        Rule::NamedCallable {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// The string identity of the rule, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Rule::Named { name, .. }
            | Rule::Callback { name, .. }
            | Rule::NamedCallable { name, .. } => Some(name),
            Rule::Callable(_) => None,
        }
    }

    pub fn param(&self) -> Option<&str> {
        match self {
            Rule::Named { param, .. } | Rule::Callback { param, .. } => param.as_deref(),
            Rule::Callable(_) | Rule::NamedCallable { .. } => None,
        }
    }

    /// Callback-style rules always run, even on empty values.
    pub fn is_callback(&self) -> bool {
        !matches!(self, Rule::Named { .. })
    }

    /// True for a parameterless named rule called `name` (`required`, not
    /// `required[x]` or `callback_required`).
    pub fn is_bare(&self, name: &str) -> bool {
        matches!(self, Rule::Named { name: n, param: None } if n == name)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Named { name, param } => f
                .debug_struct("Named")
                .field("name", name)
                .field("param", param)
                .finish(),
            Rule::Callback { name, param } => f
                .debug_struct("Callback")
                .field("name", name)
                .field("param", param)
                .finish(),
            Rule::Callable(_) => f.write_str("Callable(..)"),
            Rule::NamedCallable { name, .. } => f
                .debug_struct("NamedCallable")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Rule::Named { name: a, param: pa }, Rule::Named { name: b, param: pb })
            | (Rule::Callback { name: a, param: pa }, Rule::Callback { name: b, param: pb }) => {
                a == b && pa == pb
            }
            (Rule::Callable(a), Rule::Callable(b)) => Arc::ptr_eq(a, b),
            (
                Rule::NamedCallable { name: a, func: fa },
                Rule::NamedCallable { name: b, func: fb },
            ) => a == b && Arc::ptr_eq(fa, fb),
            _ => false,
        }
    }
}

impl From<&str> for Rule {
    fn from(token: &str) -> Self {
        Rule::parse(token)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Rule::parse(&token))
    }
}

// ─── RuleSet ────────────────────────────────────────────────────────────────

/// The rules supplied at registration: a legacy `|`-joined string or a list.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleSet {
    Joined(String),
    List(Vec<Rule>),
}

impl RuleSet {
    pub fn into_rules(self) -> Vec<Rule> {
        match self {
            RuleSet::Joined(s) => split_rules(&s).iter().map(|t| Rule::parse(t)).collect(),
            RuleSet::List(rules) => rules,
        }
    }
}

impl From<&str> for RuleSet {
    fn from(s: &str) -> Self {
        RuleSet::Joined(s.to_string())
    }
}

impl From<String> for RuleSet {
    fn from(s: String) -> Self {
        RuleSet::Joined(s)
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        RuleSet::List(rules)
    }
}

impl From<Vec<&str>> for RuleSet {
    fn from(tokens: Vec<&str>) -> Self {
        RuleSet::List(tokens.into_iter().map(Rule::parse).collect())
    }
}

impl From<Rule> for RuleSet {
    fn from(rule: Rule) -> Self {
        RuleSet::List(vec![rule])
    }
}

// ─── FieldSpec ──────────────────────────────────────────────────────────────

/// One registered field.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    /// Raw identifier as registered, e.g. `user[emails][]`.
    pub name: String,
    pub label: String,
    pub rules: Vec<Rule>,
    /// Field-scoped message overrides, keyed by rule name.
    pub errors: HashMap<String, String>,
    /// The name uses bracket syntax.
    pub is_array: bool,
    /// Root segment then each non-empty bracket segment. Empty unless `is_array`.
    pub keys: Vec<String>,
    /// `None` until resolved by a run.
    pub value: Option<Value>,
    /// First resolved failure message, or empty.
    pub error: String,
}

impl FieldSpec {
    /// True if the rule list contains the bare rule `name`.
    pub fn has_bare_rule(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.is_bare(name))
    }
}

// ─── FieldDescriptor ────────────────────────────────────────────────────────

/// Bulk-registration entry. Entries without `field` or `rules` are skipped.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FieldDescriptor {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub rules: Option<RuleSet>,
    #[serde(default)]
    pub errors: Option<HashMap<String, String>>,
}

impl FieldDescriptor {
    pub fn new(field: impl Into<String>, rules: impl Into<RuleSet>) -> Self {
        FieldDescriptor {
            field: Some(field.into()),
            label: None,
            rules: Some(rules.into()),
            errors: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn error(mut self, rule: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors
            .get_or_insert_with(HashMap::new)
            .insert(rule.into(), message.into());
        self
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Outcome of a run in a serializable form.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub valid: bool,
    /// Field name → first failure message, in failure order.
    pub errors: IndexMap<String, String>,
    /// The validated data with transformed values written back.
    pub data: Value,
}
