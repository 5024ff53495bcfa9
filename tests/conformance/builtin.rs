#![cfg(feature = "builtin-rules")]

use formrules::{RuleContext, RuleOutcome, RuleProvider, RuleTable};
use indexmap::IndexMap;
use serde_json::{Value, json};

struct Harness {
    table: RuleTable,
    data: Value,
    labels: IndexMap<String, String>,
}

impl Harness {
    fn new(data: Value) -> Self {
        Harness {
            table: RuleTable::with_builtins(),
            data,
            labels: IndexMap::new(),
        }
    }

    fn outcome(&self, rule: &str, value: Value, param: Option<&str>) -> RuleOutcome {
        let ctx = RuleContext::new(&self.data, &self.labels, "field");
        self.table
            .invoke(rule, &value, param, &ctx)
            .unwrap_or_else(|| panic!("{} is not registered", rule))
    }

    fn passes(&self, rule: &str, value: Value, param: Option<&str>) -> bool {
        !self.outcome(rule, value, param).is_invalid()
    }
}

fn check(rule: &str, param: Option<&str>, good: &[Value], bad: &[Value]) {
    let h = Harness::new(json!({}));
    for value in good {
        assert!(h.passes(rule, value.clone(), param), "{} should accept {}", rule, value);
    }
    for value in bad {
        assert!(!h.passes(rule, value.clone(), param), "{} should reject {}", rule, value);
    }
}

// ─── Presence ───────────────────────────────────────────────────────────────

#[test]
fn required() {
    check(
        "required",
        None,
        &[json!("x"), json!(0), json!(true), json!(["a"])],
        &[json!(null), json!(""), json!("  \t"), json!(false), json!([]), json!({})],
    );
}

#[test]
fn isset() {
    check("isset", None, &[json!(""), json!(0)], &[json!(null)]);
}

// ─── Cross-field ────────────────────────────────────────────────────────────

#[test]
fn matches_and_differs_read_other_fields() {
    let h = Harness::new(json!({
        "password": "s3cret",
        "user": { "email": "a@b.co" },
    }));
    assert!(h.passes("matches", json!("s3cret"), Some("password")));
    assert!(!h.passes("matches", json!("other"), Some("password")));
    assert!(!h.passes("matches", json!("s3cret"), Some("missing")));
    assert!(h.passes("matches", json!("a@b.co"), Some("user[email]")));
    assert!(!h.passes("matches", json!("x"), None));

    assert!(h.passes("differs", json!("other"), Some("password")));
    assert!(!h.passes("differs", json!("s3cret"), Some("password")));
    assert!(h.passes("differs", json!("x"), Some("missing")));
}

// ─── Format ─────────────────────────────────────────────────────────────────

#[test]
fn regex_match_accepts_delimited_and_bare_patterns() {
    let h = Harness::new(json!({}));
    assert!(h.passes("regex_match", json!("abc"), Some("/^[a-z]+$/")));
    assert!(h.passes("regex_match", json!("ABC"), Some("/^[a-z]+$/i")));
    assert!(!h.passes("regex_match", json!("ABC"), Some("/^[a-z]+$/")));
    assert!(h.passes("regex_match", json!("a-1"), Some("#^a-\\d$#")));
    assert!(h.passes("regex_match", json!("abc"), Some("^[a-z]+$")));
    assert!(!h.passes("regex_match", json!("abc"), Some("/[a-z/")));
    assert!(!h.passes("regex_match", json!("abc"), Some("/abc/q")));
    assert!(!h.passes("regex_match", json!("abc"), None));
}

#[test]
fn valid_email() {
    check(
        "valid_email",
        None,
        &[json!("ada@example.com"), json!("first.last+tag@sub.example.org")],
        &[json!("ada"), json!("ada@"), json!("@example.com"), json!("a b@example.com")],
    );
}

#[test]
fn valid_emails() {
    check(
        "valid_emails",
        None,
        &[json!("a@b.co"), json!("a@b.co, c@d.io"), json!("a@b.co,")],
        &[json!("a@b.co, nope"), json!("nope")],
    );
}

#[test]
fn valid_url() {
    check(
        "valid_url",
        None,
        &[json!("https://example.com"), json!("ftp://files.example.com/a?b=c")],
        &[json!("example.com"), json!("http://"), json!("https://exa mple.com")],
    );
}

#[test]
fn valid_ip_honours_the_family() {
    let h = Harness::new(json!({}));
    assert!(h.passes("valid_ip", json!("192.168.0.1"), None));
    assert!(h.passes("valid_ip", json!("::1"), None));
    assert!(h.passes("valid_ip", json!("10.0.0.1"), Some("ipv4")));
    assert!(!h.passes("valid_ip", json!("::1"), Some("ipv4")));
    assert!(h.passes("valid_ip", json!("fe80::1"), Some("IPv6")));
    assert!(!h.passes("valid_ip", json!("10.0.0.1"), Some("ipv6")));
    assert!(!h.passes("valid_ip", json!("256.1.1.1"), None));
}

#[test]
fn valid_base64() {
    check(
        "valid_base64",
        None,
        &[json!("aGVsbG8="), json!("aGk=")],
        &[json!("aGVsbG8"), json!("not base64!")],
    );
}

#[test]
fn valid_json() {
    check(
        "valid_json",
        None,
        &[json!("{\"a\":1}"), json!("[1,2]"), json!("3")],
        &[json!("{a:1}"), json!("[1,")],
    );
}

#[test]
fn valid_date_defaults_to_day_month_year() {
    check(
        "valid_date",
        None,
        &[json!("24/12/2020"), json!("29/02/2020")],
        &[
            json!("31/02/2020"),
            json!("29/02/2021"),
            json!("24/12/20"),
            json!("2020-12-24"),
            json!("1/12/2020"),
            json!(""),
            json!(["24/12/2020"]),
        ],
    );
}

#[test]
fn valid_date_follows_the_given_format() {
    check("valid_date", Some("Y-m-d"), &[json!("2020-02-29")], &[json!("2020-2-29")]);
    check(
        "valid_date",
        Some("j/n/Y"),
        &[json!("1/2/2020"), json!("12/11/2020")],
        &[json!("01/2/2020"), json!("1/02/2020")],
    );
    check(
        "valid_date",
        Some("Y-m-d H:i"),
        &[json!("2020-12-24 13:05")],
        &[json!("2020-12-24 25:05"), json!("2020-12-24")],
    );
    check("valid_date", Some("H:i:s"), &[json!("23:59:59")], &[json!("24:00:00")]);
    check("valid_date", Some("D, d M Y"), &[json!("Thu, 24 Dec 2020")], &[json!("Fri, 24 Dec 2020")]);
}

#[test]
fn valid_date_escapes_and_unknown_letters() {
    check(
        "valid_date",
        Some(r"\Y\m d/m/Y"),
        &[json!("Ym 24/12/2020")],
        &[json!("2020 24/12/2020")],
    );
    check("valid_date", Some("d/m/Y Q"), &[], &[json!("24/12/2020 Q")]);
}

// ─── Length ─────────────────────────────────────────────────────────────────

#[test]
fn lengths_count_characters() {
    let h = Harness::new(json!({}));
    assert!(h.passes("min_length", json!("héllo"), Some("5")));
    assert!(!h.passes("min_length", json!("héll"), Some("5")));
    assert!(h.passes("max_length", json!("日本語"), Some("3")));
    assert!(!h.passes("max_length", json!("日本語!"), Some("3")));
    assert!(h.passes("exact_length", json!("abc"), Some("3")));
    assert!(!h.passes("exact_length", json!("abcd"), Some("3")));
    assert!(h.passes("min_length", json!(12345), Some("5")));
}

#[test]
fn length_rules_need_a_numeric_parameter() {
    let h = Harness::new(json!({}));
    assert!(!h.passes("min_length", json!("abc"), Some("three")));
    assert!(!h.passes("max_length", json!("abc"), None));
}

// ─── Character classes ──────────────────────────────────────────────────────

#[test]
fn character_classes() {
    check("alpha", None, &[json!("abcXYZ")], &[json!("abc1"), json!("ab c")]);
    check(
        "alpha_numeric",
        None,
        &[json!("abc123"), json!(42)],
        &[json!("abc-123")],
    );
    check(
        "alpha_numeric_spaces",
        None,
        &[json!("abc 123")],
        &[json!("abc_123")],
    );
    check(
        "alpha_dash",
        None,
        &[json!("abc-1_2")],
        &[json!("abc.1"), json!("a b")],
    );
}

#[test]
fn natural_numbers() {
    check("is_natural", None, &[json!("0"), json!("123"), json!(7)], &[json!("-1"), json!("1.5")]);
    check(
        "is_natural_no_zero",
        None,
        &[json!("1"), json!("100")],
        &[json!("0"), json!("000"), json!("-3")],
    );
}

// ─── Numbers ────────────────────────────────────────────────────────────────

#[test]
fn numeric_formats() {
    check(
        "numeric",
        None,
        &[json!("12"), json!("-1.5"), json!("+.5"), json!(3.25)],
        &[json!("1e3"), json!("abc"), json!("1.")],
    );
    check("integer", None, &[json!("-12"), json!(7)], &[json!("1.0"), json!("x")]);
    check("decimal", None, &[json!("1.0"), json!("-0.25")], &[json!("1"), json!(".5")]);
}

#[test]
fn numeric_comparisons() {
    let h = Harness::new(json!({}));
    assert!(h.passes("greater_than", json!("11"), Some("10")));
    assert!(!h.passes("greater_than", json!("10"), Some("10")));
    assert!(h.passes("greater_than_equal_to", json!(10), Some("10")));
    assert!(h.passes("less_than", json!("-1"), Some("0")));
    assert!(!h.passes("less_than", json!("0"), Some("0")));
    assert!(h.passes("less_than_equal_to", json!("2.5"), Some("2.5")));
    assert!(!h.passes("greater_than", json!("abc"), Some("1")));
    assert!(!h.passes("less_than", json!("1"), Some("abc")));
}

#[test]
fn in_list_splits_on_commas() {
    let h = Harness::new(json!({}));
    assert!(h.passes("in_list", json!("green"), Some("red,green,blue")));
    assert!(!h.passes("in_list", json!("Green"), Some("red,green,blue")));
    assert!(!h.passes("in_list", json!("purple"), Some("red,green,blue")));
    assert!(h.passes("in_list", json!(2), Some("1,2,3")));
}

// ─── Transforms ─────────────────────────────────────────────────────────────

#[test]
fn transforms_return_the_new_value() {
    let h = Harness::new(json!({}));
    assert_eq!(
        h.outcome("trim", json!("  a b  "), None),
        RuleOutcome::Transformed(json!("a b"))
    );
    assert_eq!(
        h.outcome("strtolower", json!("MiXeD"), None),
        RuleOutcome::Transformed(json!("mixed"))
    );
    assert_eq!(
        h.outcome("strtoupper", json!("ß"), None),
        RuleOutcome::Transformed(json!("SS"))
    );
    assert_eq!(
        h.outcome("trim", json!(42), None),
        RuleOutcome::Transformed(json!("42"))
    );
    assert_eq!(h.outcome("trim", json!(true), None), RuleOutcome::Valid);
}

#[test]
fn containers_fail_text_rules() {
    check("alpha", None, &[], &[json!(["a"]), json!({ "a": "b" })]);
    check("min_length", Some("0"), &[], &[json!(["a"])]);
}

#[test]
fn table_lists_every_builtin() {
    let table = RuleTable::with_builtins();
    for name in ["required", "matches", "valid_email", "in_list", "trim", "strtoupper"] {
        assert!(table.contains(name), "{} missing", name);
    }
    assert!(!table.contains("uploaded"));
}

#[test]
fn builtins_can_be_replaced() {
    let mut table = RuleTable::with_builtins();
    table.register("alpha", |_, _, _| RuleOutcome::Valid);
    let labels = IndexMap::new();
    let data = json!({});
    let ctx = RuleContext::new(&data, &labels, "f");
    assert_eq!(
        table.invoke("alpha", &json!("123"), None, &ctx),
        Some(RuleOutcome::Valid)
    );
    assert!(table.remove("alpha").is_some());
    assert_eq!(table.invoke("alpha", &json!("abc"), None, &ctx), None);
}
