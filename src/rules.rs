//! The predicate/transform provider seam.
//!
//! Rules are located by name in an explicit registration table. A name with
//! no registration is a first-class "not found" case the engine can report.

use crate::parse::parse_field_name;
use crate::primitives::resolve_keys;
use crate::types::{Rule, RuleFn};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ─── RuleOutcome ────────────────────────────────────────────────────────────

/// What a rule returned.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleOutcome {
    Valid,
    Invalid,
    /// The rule passed and replaces the value seen by later rules and by the
    /// final output.
    Transformed(Value),
}

impl RuleOutcome {
    pub fn is_invalid(&self) -> bool {
        matches!(self, RuleOutcome::Invalid)
    }
}

impl From<bool> for RuleOutcome {
    fn from(valid: bool) -> Self {
        if valid {
            RuleOutcome::Valid
        } else {
            RuleOutcome::Invalid
        }
    }
}

/// Booleans are pass/fail signals; any other value is a transform.
impl From<Value> for RuleOutcome {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => b.into(),
            other => RuleOutcome::Transformed(other),
        }
    }
}

impl From<String> for RuleOutcome {
    fn from(value: String) -> Self {
        RuleOutcome::Transformed(Value::String(value))
    }
}

// ─── RuleContext ────────────────────────────────────────────────────────────

/// Read-only view of the run handed to every rule invocation.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    data: &'a Value,
    labels: &'a IndexMap<String, String>,
    field: &'a str,
}

impl<'a> RuleContext<'a> {
    pub fn new(data: &'a Value, labels: &'a IndexMap<String, String>, field: &'a str) -> Self {
        RuleContext {
            data,
            labels,
            field,
        }
    }

    /// The submitted data being validated, as it was before this run.
    pub fn data(&self) -> &'a Value {
        self.data
    }

    /// Name of the field under validation.
    pub fn field(&self) -> &'a str {
        self.field
    }

    /// Looks up another field's submitted value by name, bracket paths
    /// included.
    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        match parse_field_name(name) {
            (true, keys) => resolve_keys(self.data, &keys),
            (false, _) => self.data.get(name),
        }
    }

    /// Label of a registered field.
    pub fn label_of(&self, name: &str) -> Option<&'a str> {
        self.labels.get(name).map(String::as_str)
    }
}

impl fmt::Debug for RuleContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleContext")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

// ─── RuleProvider ───────────────────────────────────────────────────────────

/// Extension point supplying named rule implementations.
pub trait RuleProvider {
    /// Invokes the rule registered as `name`.
    ///
    /// Returns `None` when no rule has that name.
    fn invoke(
        &self,
        name: &str,
        value: &Value,
        param: Option<&str>,
        ctx: &RuleContext<'_>,
    ) -> Option<RuleOutcome>;

    fn contains(&self, name: &str) -> bool;
}

/// Explicit name → function table.
#[derive(Clone, Default)]
pub struct RuleTable {
    rules: HashMap<String, RuleFn>,
}

impl RuleTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table pre-loaded with the built-in rules (and `cel` with the
    /// `cel-eval` feature).
    #[allow(unused_mut)]
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        #[cfg(feature = "builtin-rules")]
        crate::builtin::register(&mut table);
        #[cfg(feature = "cel-eval")]
        crate::expression::register(&mut table);
        table
    }

    /// Registers `func` under `name`, replacing any earlier registration.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&Value, Option<&str>, &RuleContext<'_>) -> RuleOutcome + Send + Sync + 'static,
    {
        self.rules.insert(name.into(), Arc::new(func));
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<RuleFn> {
        self.rules.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&RuleFn> {
        self.rules.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTable")
            .field("rules", &self.names())
            .finish()
    }
}

impl RuleProvider for RuleTable {
    fn invoke(
        &self,
        name: &str,
        value: &Value,
        param: Option<&str>,
        ctx: &RuleContext<'_>,
    ) -> Option<RuleOutcome> {
        self.rules.get(name).map(|func| func(value, param, ctx))
    }

    fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }
}

// ─── Dispatch ───────────────────────────────────────────────────────────────

/// How a scheduled rule is invoked.
pub(crate) enum Invoker<'r> {
    /// Look the name up in the provider.
    Provider(&'r str),
    /// Call the rule's own body.
    Func(&'r RuleFn),
}

pub(crate) fn resolve(rule: &Rule) -> Invoker<'_> {
    match rule {
        Rule::Named { name, .. } | Rule::Callback { name, .. } => Invoker::Provider(name),
        Rule::Callable(func) | Rule::NamedCallable { func, .. } => Invoker::Func(func),
    }
}
