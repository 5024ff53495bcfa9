#![no_main]

use formrules::parse::{decompose_rule, split_rules};
use formrules::types::RuleSet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    for token in split_rules(data) {
        assert!(!token.is_empty());
        let (name, param) = decompose_rule(&token);
        assert!(name.len() + param.map_or(0, str::len) <= token.len());
    }
    let _ = RuleSet::from(data).into_rules();
});
