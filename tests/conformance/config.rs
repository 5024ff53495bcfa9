use formrules::config::parse;
use formrules::{ConfigError, RuleSet, Validator};
use serde_json::json;

const FORM: &str = r#"
error_prefix: "<p>"
error_suffix: "</p>"
messages:
  required: "Please fill in {field}."
language:
  form_validation_min_length: "{field} is too short."
fields:
  - field: email
    label: Email address
    rules: required|valid_email
  - field: username
    label: Username
    rules: ["trim", "min_length[4]", "regex_match[/^[a-z|_]+$/]"]
  - field: tags[]
    rules: alpha
    errors:
      alpha: "Tags are letters only."
"#;

#[test]
fn parses_every_section() {
    let config = parse(FORM).unwrap();
    assert_eq!(config.error_prefix.as_deref(), Some("<p>"));
    assert_eq!(config.error_suffix.as_deref(), Some("</p>"));
    assert_eq!(config.messages["required"], "Please fill in {field}.");
    assert_eq!(config.language["form_validation_min_length"], "{field} is too short.");
    assert_eq!(config.fields.len(), 3);
    assert_eq!(
        config.fields[0].rules,
        Some(RuleSet::Joined("required|valid_email".to_string()))
    );
    let username = config.fields[1].rules.clone().unwrap().into_rules();
    assert_eq!(username.len(), 3);
    assert_eq!(username[2].param(), Some("/^[a-z|_]+$/"));
}

#[test]
fn configured_validator_uses_its_settings() {
    let mut v = Validator::from_yaml(FORM).unwrap();
    v.set_data(json!({
        "email": "",
        "username": "  ab ",
        "tags": ["ok", "n0"],
    }));

    assert!(!v.run());
    assert_eq!(v.error("email"), "<p>Please fill in Email address.</p>");
    assert_eq!(v.error("username"), "<p>Username is too short.</p>");
    assert_eq!(v.error("tags[]"), "<p>Tags are letters only.</p>");
    assert_eq!(v.value("username"), Some(&json!("ab")));
}

#[test]
fn configured_rules_give_way_to_explicit_ones() {
    let mut v = Validator::from_yaml(FORM).unwrap();
    v.set_rules("nickname", "Nickname", "alpha")
        .set_data(json!({ "nickname": "Ada" }));

    assert!(v.run());
    assert!(!v.has_rule("email"));
}

#[test]
fn minimal_config_is_accepted() {
    let config = parse("fields: []").unwrap();
    assert!(config.fields.is_empty());
    assert!(config.error_prefix.is_none());
}

#[test]
fn empty_input_is_rejected() {
    assert!(matches!(parse("   \n"), Err(ConfigError::Empty)));
}

#[test]
fn non_mapping_root_is_rejected() {
    assert!(matches!(parse("- a\n- b\n"), Err(ConfigError::NotAMapping)));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = parse("colour: blue\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("colour"));
}

#[test]
fn malformed_yaml_is_a_syntax_error() {
    let err = parse("fields: [unclosed\n").unwrap_err();
    assert!(matches!(err, ConfigError::Syntax(_)));
    assert!(err.to_string().starts_with("invalid YAML"));
}

#[test]
fn wrong_types_are_reported() {
    let err = parse("fields:\n  - field: name\n    rules: 5\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}
