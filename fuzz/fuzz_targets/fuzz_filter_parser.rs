#![no_main]

use libfuzzer_sys::fuzz_target;
use odata_filter::{DEFAULT_FUNCTIONS, normalize_function_names, parse_filter};

fuzz_target!(|data: &[u8]| {
    // Limit input size to avoid OOM on pathological inputs
    if data.len() > 2048 {
        return;
    }
    if let Ok(s) = std::str::from_utf8(data) {
        let normalized = normalize_function_names(s, DEFAULT_FUNCTIONS);
        if let Ok(tree) = parse_filter(&normalized) {
            // Re-parsing the rendered tree must not panic either
            let _ = parse_filter(&tree.to_string());
        }
    }
});
