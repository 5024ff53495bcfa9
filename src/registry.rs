//! The ordered set of field specifications for one validation run.

use crate::parse::field_spec;
use crate::types::{FieldDescriptor, FieldSpec, RuleSet};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Registered fields keyed by name, in first-registration order.
///
/// Re-registering a name replaces its specification entirely but keeps the
/// original position.
#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
    fields: IndexMap<String, FieldSpec>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one field. Returns `false` (and changes nothing) for an empty
    /// name or rule list.
    pub fn register(
        &mut self,
        field: &str,
        label: &str,
        rules: impl Into<RuleSet>,
        errors: HashMap<String, String>,
    ) -> bool {
        match field_spec(field, label, rules.into(), errors) {
            Some(spec) => {
                self.fields.insert(spec.name.clone(), spec);
                true
            }
            None => {
                tracing::trace!(field, "ignoring field registration without rules");
                false
            }
        }
    }

    /// Registers every usable descriptor and returns how many were accepted.
    ///
    /// Descriptors missing the field identifier or the rule set are skipped.
    pub fn register_bulk<I>(&mut self, descriptors: I) -> usize
    where
        I: IntoIterator<Item = FieldDescriptor>,
    {
        let mut accepted = 0;
        for desc in descriptors {
            let (Some(field), Some(rules)) = (desc.field, desc.rules) else {
                continue;
            };
            let label = desc.label.unwrap_or_else(|| field.clone());
            if self.register(&field, &label, rules, desc.errors.unwrap_or_default()) {
                accepted += 1;
            }
        }
        accepted
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// The label of a registered field.
    pub fn label_of(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.label.as_str())
    }

    /// The current error of a registered field; empty when it passed.
    pub fn error_of(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.error.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut FieldSpec> {
        self.fields.values_mut()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Drops every field specification.
    pub fn clear(&mut self) {
        self.fields.clear();
    }
}
