#![no_main]

use libfuzzer_sys::fuzz_target;
use odata_filter::{
    FunctionCatalog, FunctionMapping, PropertyMap, PropertyMapping, SqlCompiler,
    WildcardPosition,
};

fuzz_target!(|data: &[u8]| {
    if data.len() > 2048 {
        return;
    }
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let functions: FunctionCatalog = [
        FunctionMapping::new("startswith", "ILIKE({0}, {1})", "Edm.String")
            .with_arguments(["Edm.String", "Edm.String"])
            .with_wildcard(WildcardPosition::Right, "%"),
        FunctionMapping::new("distance", "ST_Distance({0}, {2})", "Edm.Double")
            .with_arguments(["Edm.Geography", "Edm.String", "Edm.Geography"]),
    ]
    .into_iter()
    .collect();
    let properties: PropertyMap = [
        PropertyMapping::new("Name", "name", "Edm.String"),
        PropertyMapping::new("Price", "price", "Edm.Double"),
        PropertyMapping::new("Location", "location", "Edm.GeographyPoint"),
    ]
    .into_iter()
    .collect();

    // Errors are expected; panics are not
    let _ = SqlCompiler::new(&properties, &functions).compile_str(s);
});
