#![no_main]

use formrules::parse::parse_field_name;
use formrules::primitives::{assign_keys, reduce_keys, resolve_keys};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // The first byte picks the split point between field name and JSON value.
    let split = data[0] as usize % data.len().max(1);
    let (name_bytes, value_bytes) = data.split_at(split.min(data.len()));

    let name = String::from_utf8_lossy(name_bytes);
    let (_, keys) = parse_field_name(&name);

    if let Ok(mut value) = serde_json::from_slice::<serde_json::Value>(value_bytes) {
        let _ = reduce_keys(&value, &keys);
        assign_keys(&mut value, &keys, serde_json::Value::Bool(true));
        assert_eq!(
            resolve_keys(&value, &keys),
            Some(&serde_json::Value::Bool(true))
        );
    }
});
