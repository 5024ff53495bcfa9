#![no_main]

use arbitrary::Arbitrary;
use formrules::Validator;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    field: &'a str,
    rules: &'a str,
    data: &'a [u8],
}

fuzz_target!(|input: Input<'_>| {
    let Ok(data) = serde_json::from_slice::<serde_json::Value>(input.data) else {
        return;
    };

    let mut v = Validator::new().with_request(data);
    v.set_rules(input.field, "", input.rules);
    let valid = v.run();
    assert_eq!(valid, v.has_rule(input.field) && v.error_array().is_empty());
    let _ = v.error_string();
    let _ = v.report();
});
