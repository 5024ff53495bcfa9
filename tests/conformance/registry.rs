use formrules::{FieldDescriptor, FieldRegistry, Rule, RuleSet};
use std::collections::HashMap;

#[test]
fn register_keeps_declaration_order() {
    let mut registry = FieldRegistry::new();
    assert!(registry.register("b", "B", "required", HashMap::new()));
    assert!(registry.register("a", "A", "alpha", HashMap::new()));
    assert!(registry.register("c[]", "C", "trim", HashMap::new()));

    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names, ["b", "a", "c[]"]);
}

#[test]
fn reregistering_replaces_the_spec_in_place() {
    let mut registry = FieldRegistry::new();
    registry.register("a", "A", "required", HashMap::new());
    registry.register("b", "B", "required", HashMap::new());
    registry.register("a", "First", "alpha|trim", HashMap::new());

    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(registry.label_of("a"), Some("First"));
    assert_eq!(registry.get("a").unwrap().rules.len(), 2);
}

#[test]
fn incomplete_registrations_are_ignored() {
    let mut registry = FieldRegistry::new();
    assert!(!registry.register("", "Label", "required", HashMap::new()));
    assert!(!registry.register("name", "Name", "", HashMap::new()));
    assert!(!registry.register("name", "Name", Vec::<Rule>::new(), HashMap::new()));
    assert!(registry.is_empty());
}

#[test]
fn bulk_registration_skips_incomplete_descriptors() {
    let mut registry = FieldRegistry::new();
    let accepted = registry.register_bulk([
        FieldDescriptor::new("email", "required|valid_email").label("Email"),
        FieldDescriptor {
            field: Some("orphan".to_string()),
            ..FieldDescriptor::default()
        },
        FieldDescriptor {
            rules: Some(RuleSet::from("required")),
            ..FieldDescriptor::default()
        },
        FieldDescriptor::new("tags[]", vec!["alpha"]).error("alpha", "Letters only"),
    ]);

    assert_eq!(accepted, 2);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.label_of("tags[]"), Some("tags[]"));
    assert_eq!(
        registry.get("tags[]").unwrap().errors.get("alpha").map(String::as_str),
        Some("Letters only")
    );
}

#[test]
fn bracketed_names_are_parsed_at_registration() {
    let mut registry = FieldRegistry::new();
    registry.register("user[address][city]", "City", "required", HashMap::new());

    let spec = registry.get("user[address][city]").unwrap();
    assert!(spec.is_array);
    assert_eq!(spec.keys, ["user", "address", "city"]);
    assert!(spec.has_bare_rule("required"));
    assert!(!spec.has_bare_rule("alpha"));
}

#[test]
fn error_of_is_empty_before_a_run() {
    let mut registry = FieldRegistry::new();
    registry.register("name", "Name", "required", HashMap::new());
    assert_eq!(registry.error_of("name"), Some(""));
    assert_eq!(registry.error_of("missing"), None);
}

#[test]
fn clear_drops_everything() {
    let mut registry = FieldRegistry::new();
    registry.register("name", "Name", "required", HashMap::new());
    registry.clear();
    assert!(registry.is_empty());
    assert!(!registry.contains("name"));
}
