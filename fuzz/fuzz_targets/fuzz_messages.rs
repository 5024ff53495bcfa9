#![no_main]

use arbitrary::Arbitrary;
use formrules::messages::build_message;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    line: &'a str,
    label: &'a str,
    param: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let _ = build_message(input.line, input.label, input.param);
});
