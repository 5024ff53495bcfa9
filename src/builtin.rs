//! Default rule implementations.
//!
//! These are ordinary registrations in a [`RuleTable`]; callers can replace or
//! remove any of them. Values reach them already past the empty-skip policy,
//! except for `required`, `isset` and `matches`.

use crate::primitives::scalar_text;
use crate::rules::{RuleContext, RuleOutcome, RuleTable};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::fmt::Write;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

// ─── Cached regexes ─────────────────────────────────────────────────────────

static ALPHA_NUMERIC_SPACES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z0-9 ]+$").unwrap());

static ALPHA_DASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9_-]+$").unwrap());

static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-+]?[0-9]*\.?[0-9]+$").unwrap());

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\-+]?[0-9]+$").unwrap());

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-+]?[0-9]+\.[0-9]+$").unwrap());

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .unwrap()
});

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").unwrap());

static BASE64_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$").unwrap()
});

/// Registers every default rule into `table`.
pub fn register(table: &mut RuleTable) {
    table
        .register("required", required)
        .register("isset", isset)
        .register("matches", matches)
        .register("differs", differs)
        .register("regex_match", regex_match)
        .register("min_length", min_length)
        .register("max_length", max_length)
        .register("exact_length", exact_length)
        .register("valid_url", valid_url)
        .register("valid_email", valid_email)
        .register("valid_emails", valid_emails)
        .register("valid_ip", valid_ip)
        .register("valid_base64", valid_base64)
        .register("valid_json", valid_json)
        .register("valid_date", valid_date)
        .register("alpha", alpha)
        .register("alpha_numeric", alpha_numeric)
        .register("alpha_numeric_spaces", alpha_numeric_spaces)
        .register("alpha_dash", alpha_dash)
        .register("numeric", numeric)
        .register("integer", integer)
        .register("decimal", decimal)
        .register("greater_than", greater_than)
        .register("greater_than_equal_to", greater_than_equal_to)
        .register("less_than", less_than)
        .register("less_than_equal_to", less_than_equal_to)
        .register("in_list", in_list)
        .register("is_natural", is_natural)
        .register("is_natural_no_zero", is_natural_no_zero)
        .register("trim", trim)
        .register("strtolower", strtolower)
        .register("strtoupper", strtoupper);
}

// ─── Presence ───────────────────────────────────────────────────────────────

fn required(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    match value {
        Value::Null => RuleOutcome::Invalid,
        Value::Array(arr) => (!arr.is_empty()).into(),
        Value::Object(map) => (!map.is_empty()).into(),
        other => scalar_text(other).is_some_and(|s| !s.trim().is_empty()).into(),
    }
}

fn isset(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    (!value.is_null()).into()
}

// ─── Cross-field ────────────────────────────────────────────────────────────

fn matches(value: &Value, param: Option<&str>, ctx: &RuleContext<'_>) -> RuleOutcome {
    let Some(other) = param else {
        return RuleOutcome::Invalid;
    };
    ctx.lookup(other).is_some_and(|v| v == value).into()
}

fn differs(value: &Value, param: Option<&str>, ctx: &RuleContext<'_>) -> RuleOutcome {
    let Some(other) = param else {
        return RuleOutcome::Invalid;
    };
    (!ctx.lookup(other).is_some_and(|v| v == value)).into()
}

// ─── Format ─────────────────────────────────────────────────────────────────

fn regex_match(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    let (Some(text), Some(re)) = (scalar_text(value), param.and_then(compile_pattern)) else {
        return RuleOutcome::Invalid;
    };
    re.is_match(&text).into()
}

/// Delimiters accepted around a `/body/flags` pattern.
const PATTERN_DELIMITERS: &[char] = &['/', '#', '~', '!', '@', '%', '`', ';'];

/// Compiles a pattern given either bare or in `/body/flags` form.
fn compile_pattern(pattern: &str) -> Option<Regex> {
    let delimiter = pattern.chars().next()?;
    if !PATTERN_DELIMITERS.contains(&delimiter) {
        return Regex::new(pattern).ok();
    }

    let start = delimiter.len_utf8();
    let close = pattern.rfind(delimiter).filter(|&close| close >= start)?;
    let body = &pattern[start..close];
    let flags = &pattern[close + delimiter.len_utf8()..];

    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'u' => builder.unicode(true),
            _ => return None,
        };
    }
    builder.build().ok()
}

fn valid_url(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_matches(value, &URL_RE)
}

fn valid_email(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_matches(value, &EMAIL_RE)
}

fn valid_emails(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    let Some(text) = scalar_text(value) else {
        return RuleOutcome::Invalid;
    };
    if !text.contains(',') {
        return EMAIL_RE.is_match(text.trim()).into();
    }
    text.split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .all(|email| EMAIL_RE.is_match(email))
        .into()
}

fn valid_ip(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    let Some(text) = scalar_text(value) else {
        return RuleOutcome::Invalid;
    };
    let which = param.unwrap_or_default().to_ascii_lowercase();
    match which.as_str() {
        "ipv4" => text.parse::<Ipv4Addr>().is_ok().into(),
        "ipv6" => text.parse::<Ipv6Addr>().is_ok().into(),
        _ => text.parse::<IpAddr>().is_ok().into(),
    }
}

fn valid_base64(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_matches(value, &BASE64_RE)
}

fn valid_json(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    scalar_text(value)
        .is_some_and(|text| serde_json::from_str::<Value>(&text).is_ok())
        .into()
}

// ─── Dates ──────────────────────────────────────────────────────────────────

/// Date format used when `valid_date` has no parameter.
const DEFAULT_DATE_FORMAT: &str = "d/m/Y";

/// Accepts a date written exactly in `param`'s format (`d/m/Y` letters).
///
/// The value must parse and format back to the same text, so `31/02/2020`
/// and `1/12/2020` both fail under `d/m/Y`.
fn valid_date(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    let format = param
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_DATE_FORMAT);
    let (Some(text), Some(pattern)) = (scalar_text(value), strftime_pattern(format)) else {
        return RuleOutcome::Invalid;
    };
    reformat_date(&text, &pattern).is_some_and(|out| out == text).into()
}

/// Parses `text` as a date-time, date or time and renders it back.
fn reformat_date(text: &str, pattern: &str) -> Option<String> {
    let mut out = String::new();
    // Rendering fails (rather than panicking) when the pattern asks for a
    // component the parsed value does not have.
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
        write!(out, "{}", dt.format(pattern)).ok()?;
    } else if let Ok(date) = NaiveDate::parse_from_str(text, pattern) {
        write!(out, "{}", date.format(pattern)).ok()?;
    } else if let Ok(time) = NaiveTime::parse_from_str(text, pattern) {
        write!(out, "{}", time.format(pattern)).ok()?;
    } else {
        return None;
    }
    Some(out)
}

/// Translates a `d/m/Y`-style date format into a chrono strftime pattern.
///
/// A backslash makes the next character literal. Letters without a chrono
/// counterpart make the format unusable.
fn strftime_pattern(format: &str) -> Option<String> {
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        let item = match c {
            'd' => "%d",
            'j' => "%-d",
            'D' => "%a",
            'l' => "%A",
            'm' => "%m",
            'n' => "%-m",
            'M' => "%b",
            'F' => "%B",
            'Y' => "%Y",
            'y' => "%y",
            'H' => "%H",
            'G' => "%-H",
            'h' => "%I",
            'g' => "%-I",
            'i' => "%M",
            's' => "%S",
            'A' => "%p",
            'a' => "%P",
            'U' => "%s",
            '%' => "%%",
            '\\' => {
                match chars.next()? {
                    '%' => out.push_str("%%"),
                    literal => out.push(literal),
                }
                continue;
            }
            c if c.is_ascii_alphabetic() => return None,
            literal => {
                out.push(literal);
                continue;
            }
        };
        out.push_str(item);
    }

    Some(out)
}

// ─── Length ─────────────────────────────────────────────────────────────────

fn min_length(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    compare_length(value, param, |len, limit| limit <= len)
}

fn max_length(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    compare_length(value, param, |len, limit| limit >= len)
}

fn exact_length(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    compare_length(value, param, |len, limit| len == limit.trunc())
}

fn compare_length(
    value: &Value,
    param: Option<&str>,
    cmp: impl Fn(f64, f64) -> bool,
) -> RuleOutcome {
    let (Some(text), Some(limit)) = (scalar_text(value), param.and_then(parse_number)) else {
        return RuleOutcome::Invalid;
    };
    cmp(text.chars().count() as f64, limit).into()
}

// ─── Character classes ──────────────────────────────────────────────────────

fn alpha(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_all(value, |c| c.is_ascii_alphabetic())
}

fn alpha_numeric(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_all(value, |c| c.is_ascii_alphanumeric())
}

fn alpha_numeric_spaces(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_matches(value, &ALPHA_NUMERIC_SPACES_RE)
}

fn alpha_dash(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_matches(value, &ALPHA_DASH_RE)
}

fn is_natural(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_all(value, |c| c.is_ascii_digit())
}

fn is_natural_no_zero(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    let Some(text) = scalar_text(value) else {
        return RuleOutcome::Invalid;
    };
    let digits = !text.is_empty() && text.chars().all(|c| c.is_ascii_digit());
    (digits && text.chars().any(|c| c != '0')).into()
}

// ─── Numbers ────────────────────────────────────────────────────────────────

fn numeric(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_matches(value, &NUMERIC_RE)
}

fn integer(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_matches(value, &INTEGER_RE)
}

fn decimal(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    text_matches(value, &DECIMAL_RE)
}

fn greater_than(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    compare_number(value, param, |v, limit| v > limit)
}

fn greater_than_equal_to(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    compare_number(value, param, |v, limit| v >= limit)
}

fn less_than(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    compare_number(value, param, |v, limit| v < limit)
}

fn less_than_equal_to(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    compare_number(value, param, |v, limit| v <= limit)
}

fn compare_number(
    value: &Value,
    param: Option<&str>,
    cmp: impl Fn(f64, f64) -> bool,
) -> RuleOutcome {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        other => scalar_text(other).as_deref().and_then(parse_number),
    };
    match (number, param.and_then(parse_number)) {
        (Some(v), Some(limit)) => cmp(v, limit).into(),
        _ => RuleOutcome::Invalid,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

// ─── Lists ──────────────────────────────────────────────────────────────────

fn in_list(value: &Value, param: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    let (Some(text), Some(list)) = (scalar_text(value), param) else {
        return RuleOutcome::Invalid;
    };
    list.split(',').any(|item| item == text).into()
}

// ─── Transforms ─────────────────────────────────────────────────────────────

fn trim(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    transform_text(value, |s| s.trim().to_string())
}

fn strtolower(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    transform_text(value, str::to_lowercase)
}

fn strtoupper(value: &Value, _: Option<&str>, _: &RuleContext<'_>) -> RuleOutcome {
    transform_text(value, str::to_uppercase)
}

fn transform_text(value: &Value, f: impl Fn(&str) -> String) -> RuleOutcome {
    match value {
        Value::String(s) => RuleOutcome::Transformed(Value::String(f(s))),
        Value::Number(n) => RuleOutcome::Transformed(Value::String(f(&n.to_string()))),
        _ => RuleOutcome::Valid,
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn text_matches(value: &Value, re: &Regex) -> RuleOutcome {
    scalar_text(value).is_some_and(|s| re.is_match(&s)).into()
}

fn text_all(value: &Value, pred: impl Fn(char) -> bool) -> RuleOutcome {
    scalar_text(value)
        .is_some_and(|s| !s.is_empty() && s.chars().all(&pred))
        .into()
}
