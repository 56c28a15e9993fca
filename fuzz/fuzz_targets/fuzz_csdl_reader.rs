#![no_main]

use libfuzzer_sys::fuzz_target;
use odata_csdl::parse_csdl;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(model) = parse_csdl(s) {
            for entity in &model.entity_types {
                let _ = model.flatten_entity_properties(&entity.name, None);
            }
        }
    }
});
