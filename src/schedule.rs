//! Rule scheduling: the order in which a field's rules execute.

use crate::types::Rule;

/// Rules moved to the front of the non-callback rules when encountered.
pub const HOISTED_RULES: &[&str] = &["required", "uploaded"];

/// Reorders a field's rules into execution order.
///
/// Callback-style rules run first, in declaration order, so they always run.
/// Each bare `required` or `uploaded` is then inserted at the front of the
/// remaining rules as it is encountered, so among several hoisted rules the
/// one declared last runs first. Everything else keeps its declared order.
///
/// ```
/// use formrules::schedule::schedule;
/// use formrules::types::RuleSet;
///
/// let rules = RuleSet::from("min_length[3]|required|callback_unique").into_rules();
/// let names: Vec<_> = schedule(&rules).iter().filter_map(|r| r.name()).collect();
/// assert_eq!(names, ["unique", "required", "min_length"]);
/// ```
pub fn schedule(rules: &[Rule]) -> Vec<&Rule> {
    let mut callbacks = Vec::new();
    let mut ordered: Vec<&Rule> = Vec::with_capacity(rules.len());

    for rule in rules {
        if HOISTED_RULES.iter().any(|name| rule.is_bare(name)) {
            ordered.insert(0, rule);
        } else if rule.is_callback() {
            callbacks.push(rule);
        } else {
            ordered.push(rule);
        }
    }

    callbacks.extend(ordered);
    callbacks
}
