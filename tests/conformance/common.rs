use serde::de::DeserializeOwned;
use std::path::PathBuf;

pub fn fixtures_dir() -> PathBuf {
    std::env::var("FORMRULES_CONFORMANCE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/conformance/fixtures")
        })
}

/// Loads a YAML fixture file of test cases.
pub fn load_cases<T: DeserializeOwned>(file: &str) -> Vec<T> {
    load_fixture(file)
}

/// Loads a YAML fixture file.
///
/// Goes through `serde_json::Value` first so untagged rule sets deserialize
/// the same way configuration does.
pub fn load_fixture<T: DeserializeOwned>(file: &str) -> T {
    let path = fixtures_dir().join(file);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {:?}: {}", path, e));
    let raw: serde_json::Value = serde_saphyr::from_str(&content)
        .unwrap_or_else(|e| panic!("cannot parse {:?}: {}", path, e));
    serde_json::from_value(raw).unwrap_or_else(|e| panic!("bad case in {:?}: {}", path, e))
}

/// Prints a suite summary and fails if any case failed.
pub fn finish(suite: &str, passed: usize, failures: &[String]) {
    eprintln!("{}: {} passed, {} failed", suite, passed, failures.len());
    assert!(
        failures.is_empty(),
        "{} failures:\n{}",
        suite,
        failures.join("\n")
    );
}
