//! The execution engine and its caller-facing surface.
//!
//! A [`Validator`] owns its run state: registered fields, the explicit data
//! set, recorded errors and global message overrides. That state accumulates
//! across calls to [`Validator::run`] until [`Validator::reset`] discards it.

use crate::config::{self, Config};
use crate::error::{ConfigError, UnknownRule};
use crate::messages::{Catalog, MessageCatalog, build_message, resolve_line};
use crate::primitives::{
    assign_keys, element_keys, is_empty_value, is_fan_out, reduce_keys, resolve_keys,
};
use crate::registry::FieldRegistry;
use crate::rules::{Invoker, RuleContext, RuleOutcome, RuleProvider, RuleTable, resolve};
use crate::schedule::schedule;
use crate::types::{FieldDescriptor, FieldSpec, Report, Rule, RuleSet};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Named rules that still run when the value is empty.
pub const EMPTY_EXEMPT_RULES: &[&str] = &["required", "isset", "matches", "uploaded"];

/// Suffix wrapped around rendered messages unless configured otherwise.
pub const DEFAULT_ERROR_SUFFIX: &str = "<br>";

#[derive(Debug, Default)]
struct RunState {
    fields: FieldRegistry,
    data: Option<Value>,
    errors: IndexMap<String, String>,
    messages: HashMap<String, String>,
}

/// Validates submitted data against registered field rules.
///
/// ```
/// use formrules::Validator;
/// use serde_json::json;
///
/// let mut v = Validator::new().with_request(json!({ "name": "  Ada ", "age": "" }));
/// v.set_rules("name", "Name", "trim|required|alpha")
///     .set_rules("age", "Age", "required|integer");
///
/// assert!(!v.run());
/// assert_eq!(v.error_array()["age"], "The Age field is required.");
/// assert_eq!(v.request()["name"], "Ada");
/// ```
pub struct Validator {
    provider: Box<dyn RuleProvider + Send + Sync>,
    catalog: Catalog,
    error_prefix: String,
    error_suffix: String,
    config_rules: Vec<FieldDescriptor>,
    config_messages: HashMap<String, String>,
    request: Value,
    run: RunState,
}

impl Validator {
    /// A validator using the built-in rules and the default catalog.
    pub fn new() -> Self {
        Self::with_provider(RuleTable::with_builtins())
    }

    /// A validator dispatching named rules to `provider`.
    pub fn with_provider(provider: impl RuleProvider + Send + Sync + 'static) -> Self {
        Validator {
            provider: Box::new(provider),
            catalog: Catalog::new(),
            error_prefix: String::new(),
            error_suffix: DEFAULT_ERROR_SUFFIX.to_string(),
            config_rules: Vec::new(),
            config_messages: HashMap::new(),
            request: Value::Object(serde_json::Map::new()),
            run: RunState::default(),
        }
    }

    /// Builds a validator from a loaded configuration.
    pub fn from_config(config: Config) -> Self {
        let mut validator = Self::new();
        validator.apply_config(config);
        validator
    }

    /// Parses a YAML configuration and builds a validator from it.
    pub fn from_yaml(input: &str) -> Result<Self, ConfigError> {
        config::parse(input).map(Self::from_config)
    }

    /// Sets the ambient request data. Unless [`set_data`](Self::set_data)
    /// supplies an explicit data set, runs validate this tree and write
    /// transformed values back into it.
    pub fn with_request(mut self, request: Value) -> Self {
        self.request = request;
        self
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Applies delimiters, messages, catalog lines and configured rules.
    pub fn apply_config(&mut self, config: Config) -> &mut Self {
        if let Some(prefix) = config.error_prefix {
            self.error_prefix = prefix;
        }
        if let Some(suffix) = config.error_suffix {
            self.error_suffix = suffix;
        }
        self.catalog.merge(config.language);
        self.config_messages.extend(config.messages);
        self.run.messages.extend(
            self.config_messages
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        self.config_rules.extend(config.fields);
        self
    }

    // ─── Registration ───────────────────────────────────────────────────────

    /// Registers rules for one field. An empty label falls back to the field
    /// name; an empty name or rule list registers nothing.
    pub fn set_rules(&mut self, field: &str, label: &str, rules: impl Into<RuleSet>) -> &mut Self {
        self.set_rules_with(field, label, rules, HashMap::new())
    }

    /// Like [`set_rules`](Self::set_rules) with field-scoped message overrides.
    pub fn set_rules_with(
        &mut self,
        field: &str,
        label: &str,
        rules: impl Into<RuleSet>,
        errors: HashMap<String, String>,
    ) -> &mut Self {
        self.run.fields.register(field, label, rules, errors);
        self
    }

    /// Registers a list of descriptors, skipping incomplete ones.
    pub fn set_rules_bulk<I>(&mut self, descriptors: I) -> &mut Self
    where
        I: IntoIterator<Item = FieldDescriptor>,
    {
        self.run.fields.register_bulk(descriptors);
        self
    }

    /// Rules registered by [`run`](Self::run) when nothing else was.
    pub fn set_config_rules<I>(&mut self, descriptors: I) -> &mut Self
    where
        I: IntoIterator<Item = FieldDescriptor>,
    {
        self.config_rules = descriptors.into_iter().collect();
        self
    }

    /// Validates `data` instead of the ambient request. Empty data is ignored.
    ///
    /// Transformed values are not written back into an explicit data set;
    /// read them from [`value`](Self::value) or [`report`](Self::report).
    pub fn set_data(&mut self, data: Value) -> &mut Self {
        if !is_empty_value(&data) {
            self.run.data = Some(data);
        }
        self
    }

    /// Sets a global message override for a rule name.
    pub fn set_message(&mut self, rule: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.run.messages.insert(rule.into(), message.into());
        self
    }

    pub fn set_messages<I, K, V>(&mut self, messages: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.run
            .messages
            .extend(messages.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Merges lines into the message catalog.
    pub fn set_language<I, K, V>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.catalog.merge(lines);
        self
    }

    pub fn set_error_delimiters(
        &mut self,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> &mut Self {
        self.error_prefix = prefix.into();
        self.error_suffix = suffix.into();
        self
    }

    // ─── Execution ──────────────────────────────────────────────────────────

    /// Runs every registered field's rules and reports overall success.
    ///
    /// With no registered fields the configured rules are used; with none of
    /// those either, the run fails.
    pub fn run(&mut self) -> bool {
        if self.run.fields.is_empty() {
            self.run.fields.register_bulk(self.config_rules.iter().cloned());
            if self.run.fields.is_empty() {
                tracing::debug!("no validation rules registered");
                return false;
            }
        }

        let explicit = self.run.data.is_some();
        let RunState {
            fields,
            data,
            errors,
            messages,
        } = &mut self.run;
        let source = data.as_ref().unwrap_or(&self.request);

        tracing::debug!(
            fields = fields.len(),
            explicit_data = explicit,
            "running validation"
        );

        // All values are resolved before any rule runs, so cross-field rules
        // see every field in the same state.
        resolve_values(fields, source);

        let labels: IndexMap<String, String> = fields
            .iter()
            .map(|f| (f.name.clone(), f.label.clone()))
            .collect();

        let executor = Executor {
            provider: &*self.provider,
            catalog: &self.catalog,
            messages,
            labels: &labels,
            data: source,
        };
        for spec in fields.iter_mut() {
            executor.execute_field(spec, errors);
        }

        let valid = errors.is_empty();
        tracing::debug!(errors = errors.len(), valid, "validation finished");

        if !explicit {
            project(&self.run.fields, &mut self.request);
        }

        valid
    }

    // ─── Results ────────────────────────────────────────────────────────────

    /// A field's message wrapped in the configured delimiters, or an empty
    /// string if the field passed.
    pub fn error(&self, field: &str) -> String {
        self.error_with(field, "", "")
    }

    /// Like [`error`](Self::error); an empty prefix or suffix falls back to
    /// the configured one.
    pub fn error_with(&self, field: &str, prefix: &str, suffix: &str) -> String {
        let Some(message) = self.run.fields.error_of(field).filter(|m| !m.is_empty()) else {
            return String::new();
        };
        let (prefix, suffix) = self.delimiters(prefix, suffix);
        format!("{}{}{}", prefix, message, suffix)
    }

    /// Field name → first failure message, in failure order.
    pub fn error_array(&self) -> &IndexMap<String, String> {
        &self.run.errors
    }

    /// Every message wrapped in the configured delimiters, one per line.
    pub fn error_string(&self) -> String {
        self.error_string_with("", "")
    }

    pub fn error_string_with(&self, prefix: &str, suffix: &str) -> String {
        let (prefix, suffix) = self.delimiters(prefix, suffix);
        self.run
            .errors
            .values()
            .filter(|m| !m.is_empty())
            .map(|m| format!("{}{}{}\n", prefix, m, suffix))
            .collect()
    }

    fn delimiters<'s>(&'s self, prefix: &'s str, suffix: &'s str) -> (&'s str, &'s str) {
        let prefix = if prefix.is_empty() {
            self.error_prefix.as_str()
        } else {
            prefix
        };
        let suffix = if suffix.is_empty() {
            self.error_suffix.as_str()
        } else {
            suffix
        };
        (prefix, suffix)
    }

    /// True if rules are registered for `field`.
    pub fn has_rule(&self, field: &str) -> bool {
        self.run.fields.contains(field)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.run.fields.get(name)
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.run.fields
    }

    /// A field's value after the last run, transforms applied.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.run.fields.get(name).and_then(|f| f.value.as_ref())
    }

    /// The ambient request data, with transformed values written back after
    /// a run.
    pub fn request(&self) -> &Value {
        &self.request
    }

    /// The current results. The data is the validated tree with transformed
    /// values written back, whichever source was validated.
    pub fn report(&self) -> Report {
        let data = match &self.run.data {
            Some(explicit) => {
                let mut data = explicit.clone();
                project(&self.run.fields, &mut data);
                data
            }
            None => self.request.clone(),
        };
        Report {
            valid: self.run.errors.is_empty(),
            errors: self.run.errors.clone(),
            data,
        }
    }

    /// Registered named rules the provider does not know. Such rules always
    /// fail at run time.
    pub fn unknown_rules(&self) -> Vec<UnknownRule> {
        self.run
            .fields
            .iter()
            .flat_map(|spec| {
                spec.rules.iter().filter_map(move |rule| match rule {
                    Rule::Named { name, .. } | Rule::Callback { name, .. }
                        if !self.provider.contains(name) =>
                    {
                        Some(UnknownRule {
                            field: spec.name.clone(),
                            rule: name.clone(),
                        })
                    }
                    _ => None,
                })
            })
            .collect()
    }

    /// Discards all run state: fields, explicit data, errors and global
    /// messages set since construction. Configuration is kept.
    pub fn reset(&mut self) -> &mut Self {
        self.run = RunState {
            messages: self.config_messages.clone(),
            ..RunState::default()
        };
        self
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("fields", &self.run.fields.len())
            .field("errors", &self.run.errors)
            .field("error_prefix", &self.error_prefix)
            .field("error_suffix", &self.error_suffix)
            .finish_non_exhaustive()
    }
}

// ─── Value resolution ───────────────────────────────────────────────────────

fn resolve_values(fields: &mut FieldRegistry, source: &Value) {
    for spec in fields.iter_mut() {
        let value = if spec.is_array {
            reduce_keys(source, &spec.keys)
        } else {
            match source.get(spec.name.as_str()) {
                Some(v) if !v.is_null() => v.clone(),
                // Upload rules locate file metadata by field name.
                _ if spec.has_bare_rule("uploaded") => Value::String(spec.name.clone()),
                _ => Value::Null,
            }
        };
        spec.value = Some(value);
    }
}

/// Writes resolved values back into `target` at their original locations.
///
/// Plain fields are only written where the key already holds a value;
/// bracketed fields are written at their full path.
fn project(fields: &FieldRegistry, target: &mut Value) {
    for spec in fields.iter() {
        let Some(value) = spec.value.as_ref().filter(|v| !v.is_null()) else {
            continue;
        };
        if spec.is_array {
            assign_keys(target, &spec.keys, value.clone());
        } else if let Some(slot) = target.get_mut(spec.name.as_str())
            && !slot.is_null()
        {
            *slot = value.clone();
        }
    }
}

// ─── Rule execution ─────────────────────────────────────────────────────────

struct Executor<'a> {
    provider: &'a dyn RuleProvider,
    catalog: &'a dyn MessageCatalog,
    messages: &'a HashMap<String, String>,
    labels: &'a IndexMap<String, String>,
    data: &'a Value,
}

/// The parts of a [`FieldSpec`] one execution reads and writes.
struct Slot<'s> {
    name: &'s str,
    label: &'s str,
    overrides: &'s HashMap<String, String>,
    is_array: bool,
    value: &'s mut Option<Value>,
    error: &'s mut String,
}

impl Executor<'_> {
    fn execute_field(&self, spec: &mut FieldSpec, errors: &mut IndexMap<String, String>) {
        let FieldSpec {
            name,
            label,
            rules,
            errors: overrides,
            is_array,
            value,
            error,
            ..
        } = spec;

        if rules.is_empty() {
            return;
        }

        let scheduled = schedule(rules);
        let mut slot = Slot {
            name: name.as_str(),
            label: label.as_str(),
            overrides,
            is_array: *is_array,
            value,
            error,
        };

        // Only bracketed fields fan out. A container submitted for a plain
        // field is treated as empty by `current_value`.
        if slot.is_array && slot.value.as_ref().is_some_and(is_fan_out) {
            self.fan_out(&mut slot, &scheduled, &mut Vec::new(), errors);
        } else {
            self.run_chain(&mut slot, &scheduled, None, errors);
        }
    }

    /// Runs the chain once per element under `cursor`, descending into
    /// non-empty nested containers.
    fn fan_out(
        &self,
        slot: &mut Slot<'_>,
        rules: &[&Rule],
        cursor: &mut Vec<String>,
        errors: &mut IndexMap<String, String>,
    ) {
        let keys = slot
            .value
            .as_ref()
            .and_then(|v| resolve_keys(v, cursor))
            .map(element_keys)
            .unwrap_or_default();

        for key in keys {
            cursor.push(key);
            let nested = slot
                .value
                .as_ref()
                .and_then(|v| resolve_keys(v, cursor))
                .is_some_and(is_fan_out);
            if nested {
                self.fan_out(slot, rules, cursor, errors);
            } else {
                self.run_chain(slot, rules, Some(cursor.as_slice()), errors);
            }
            cursor.pop();
        }
    }

    /// Runs the scheduled rules against one value, stopping at the first
    /// failure.
    fn run_chain(
        &self,
        slot: &mut Slot<'_>,
        rules: &[&Rule],
        cursor: Option<&[String]>,
        errors: &mut IndexMap<String, String>,
    ) {
        for &rule in rules {
            // Re-read every time: an earlier rule may have transformed it.
            let Some(current) = current_value(slot, cursor) else {
                continue;
            };

            let name = rule.name();
            if is_empty_value(&current)
                && !rule.is_callback()
                && !name.is_some_and(|n| EMPTY_EXEMPT_RULES.contains(&n))
            {
                tracing::trace!(field = slot.name, rule = ?name, "skipping rule on empty value");
                continue;
            }

            let ctx = RuleContext::new(self.data, self.labels, slot.name);
            let outcome = match resolve(rule) {
                Invoker::Provider(rule_name) => self
                    .provider
                    .invoke(rule_name, &current, rule.param(), &ctx)
                    .unwrap_or_else(|| {
                        tracing::debug!(
                            field = slot.name,
                            rule = rule_name,
                            "no rule registered under this name"
                        );
                        RuleOutcome::Invalid
                    }),
                Invoker::Func(func) => func(&current, rule.param(), &ctx),
            };
            tracing::trace!(field = slot.name, rule = ?name, ?outcome, "rule evaluated");

            match outcome {
                RuleOutcome::Valid => {}
                RuleOutcome::Transformed(new) => store(slot, cursor, new),
                RuleOutcome::Invalid => {
                    self.record_failure(slot, rule, errors);
                    return;
                }
            }
        }
    }

    fn record_failure(
        &self,
        slot: &mut Slot<'_>,
        rule: &Rule,
        errors: &mut IndexMap<String, String>,
    ) {
        let line = resolve_line(rule, slot.overrides, self.messages, self.catalog);

        // A parameter naming another field is shown as that field's label.
        let param = rule
            .param()
            .map(|p| self.labels.get(p).map(String::as_str).unwrap_or(p))
            .unwrap_or_default();

        let message = build_message(&line, slot.label, param);
        tracing::debug!(field = slot.name, rule = ?rule.name(), %message, "rule failed");

        if slot.error.is_empty() {
            *slot.error = message.clone();
        }
        errors.entry(slot.name.to_string()).or_insert(message);
    }
}

/// The value the next rule sees. `None` when the element at `cursor` no
/// longer exists.
fn current_value(slot: &Slot<'_>, cursor: Option<&[String]>) -> Option<Value> {
    let stored = slot.value.as_ref();
    match cursor {
        Some(path) => stored.and_then(|v| resolve_keys(v, path)).cloned(),
        None => Some(match stored {
            Some(v) if !slot.is_array && (v.is_array() || v.is_object()) => Value::Null,
            Some(v) => v.clone(),
            None => Value::Null,
        }),
    }
}

fn store(slot: &mut Slot<'_>, cursor: Option<&[String]>, new: Value) {
    match cursor {
        Some(path) => assign_keys(slot.value.get_or_insert(Value::Null), path, new),
        None => *slot.value = Some(new),
    }
}
