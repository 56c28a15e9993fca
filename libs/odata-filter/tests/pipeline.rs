#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use odata_filter::{
    FilterError, FilterOptions, FilterPipeline, METERS_PER_DEGREE, SqlValue, SyntaxError,
};

#[test]
fn simple_comparison_binds_parameter() {
    // Arrange
    let pipeline = common::pipeline();

    // Act
    let result = pipeline.process("$filter=Name eq '123'", "Products").unwrap();

    // Assert
    assert_eq!(result.sql.as_deref(), Some("name = @p1"));
    assert_eq!(result.parameters.get("@p1"), Some(&SqlValue::from("123")));
}

#[test]
fn logical_operators_number_parameters_left_to_right() {
    // Arrange
    let pipeline = common::pipeline();

    // Act
    let result = pipeline
        .process("Name eq 'Product' and Price gt 10", "Products")
        .unwrap();

    // Assert
    assert_eq!(result.sql.as_deref(), Some("name = @p1 AND price > @p2"));
    assert_eq!(result.parameters.get("@p2"), Some(&SqlValue::Int(10)));
}

#[test]
fn nested_logical_operands_are_parenthesized() {
    let pipeline = common::pipeline();

    let sql = pipeline
        .process_sql("Name eq 'a' or Name eq 'b' and not (Price le 3)", "Products")
        .unwrap();

    assert_eq!(
        sql.as_deref(),
        Some("name = @p1 OR (name = @p2 AND NOT ((price <= @p3)))")
    );
}

#[test]
fn empty_filter_succeeds_without_sql() {
    // Arrange
    let pipeline = common::pipeline();

    // Act
    let bare = pipeline.process_sql("", "Products").unwrap();
    let prefixed = pipeline.process("$filter=  ", "Products").unwrap();

    // Assert
    assert_eq!(bare, None);
    assert_eq!(prefixed.sql, None);
    assert!(prefixed.parameters.is_empty());
}

#[test]
fn null_comparisons_become_is_null() {
    // Arrange
    let pipeline = common::pipeline();

    // Act
    let eq = pipeline.process("(Price eq null)", "Products").unwrap();
    let ne = pipeline.process("Price ne null", "Products").unwrap();

    // Assert
    assert_eq!(eq.sql.as_deref(), Some("(price IS NULL)"));
    assert!(eq.parameters.is_empty());
    assert_eq!(ne.sql.as_deref(), Some("price IS NOT NULL"));
    assert!(ne.parameters.is_empty());
}

#[test]
fn ordering_against_null_is_rejected() {
    let pipeline = common::pipeline();

    let err = pipeline.process("Price gt null", "Products").unwrap_err();

    assert_eq!(
        err.to_string(),
        "Operator 'gt' cannot be used to compare with null."
    );
}

#[test]
fn in_list_expands_to_parameters() {
    // Arrange
    let pipeline = common::pipeline();

    // Act
    let result = pipeline
        .process("Price in (123.456, 234.56)", "Products")
        .unwrap();

    // Assert
    assert_eq!(result.sql.as_deref(), Some("price IN (@p1,@p2)"));
    assert_eq!(result.parameters.get("@p1"), Some(&SqlValue::Double(123.456)));
    assert_eq!(result.parameters.len(), 2);
}

#[test]
fn in_list_type_mismatch_is_rejected() {
    let pipeline = common::pipeline();

    let err = pipeline.process("Price in ('a', 'b')", "Products").unwrap_err();

    assert!(matches!(err, FilterError::Validation(_)));
    assert_eq!(
        err.to_string(),
        "Invalid filter expression: Type mismatch in IN clause: 'a' does not match type of 'Price'"
    );
}

#[test]
fn in_list_accepts_literals_of_the_property_family() {
    let pipeline = common::pipeline();

    for (filter, sql) in [
        (
            "Token in ('6f1a2b3c-0000-4000-8000-000000000001')",
            "token IN (@p1)",
        ),
        ("Quantity in (1, 2)", "quantity IN (@p1,@p2)"),
        ("Day in (2025-01-01)", "day IN (@p1)"),
    ] {
        let result = pipeline
            .process(filter, "Products")
            .unwrap_or_else(|e| panic!("{filter}: {e}"));
        assert_eq!(result.sql.as_deref(), Some(sql), "{filter}");
    }
}

#[test]
fn in_list_on_narrow_integer_rejects_fractions() {
    let pipeline = common::pipeline();

    let err = pipeline.process("Quantity in (1, 2.5)", "Products").unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid filter expression: Type mismatch in IN clause: '2.5' does not match type of 'Quantity'"
    );
}

#[test]
fn wkt_shaped_text_is_a_plain_string_search() {
    // Arrange
    let pipeline = common::pipeline();

    // Act
    let result = pipeline
        .process("startswith(Name, 'POINT(1 2)')", "Products")
        .unwrap();

    // Assert
    assert_eq!(result.sql.as_deref(), Some("ILIKE(name, @p1)"));
    assert_eq!(
        result.parameters.get("@p1"),
        Some(&SqlValue::from("POINT(1 2)%"))
    );
}

#[test]
fn in_list_requires_literals() {
    let pipeline = common::pipeline();

    let err = pipeline.process("Price in (Price)", "Products").unwrap_err();

    assert!(err.to_string().contains("'Price' must be a literal value."));
}

#[test]
fn empty_in_list_fails_to_parse() {
    let pipeline = common::pipeline();

    let err = pipeline.process("$filter=Price in ()", "Products").unwrap_err();

    assert_eq!(err, FilterError::Syntax(SyntaxError::FailedToParse));
    assert_eq!(err.to_string(), "Failed to parse filter query.");
}

#[test]
fn unknown_operator_is_a_syntax_error() {
    let pipeline = common::pipeline();

    let err = pipeline.process("$filter=Name bla '123'", "Products").unwrap_err();

    assert!(err.to_string().starts_with("Unexpected token found"));
}

#[test]
fn dotted_paths_are_syntax_errors() {
    let pipeline = common::pipeline();

    for filter in ["Bla.Name eq 'Test'", "Address.Bla eq 'Test'"] {
        let err = pipeline.process(filter, "Products").unwrap_err();
        assert!(
            err.to_string().contains("Unexpected token found"),
            "{filter}: {err}"
        );
    }
}

#[test]
fn unknown_entity_set_is_named() {
    let pipeline = common::pipeline();

    let err = pipeline
        .process("$filter=Name eq 'Test'", "UnknownEntitySet")
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "EntitySet 'UnknownEntitySet' not found in the CSDL model."
    );
}

#[test]
fn dangling_entity_type_is_reported() {
    let pipeline = common::pipeline();

    let err = pipeline.process("ID eq 1", "Orphans").unwrap_err();

    assert_eq!(
        err.to_string(),
        "EntityType 'ODataDemo.Missing' of EntitySet 'Orphans' not found in the CSDL model."
    );
}

#[test]
fn unknown_schema_property_is_rejected_before_compilation() {
    let pipeline = common::pipeline();

    let err = pipeline.process("$filter=Blurp eq '123'", "Products").unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid filter expression: Property 'Blurp' not found in EntityType 'Product'"
    );
}

#[test]
fn complex_path_needs_a_property_mapping() {
    // Arrange
    let pipeline = common::pipeline();

    // Act
    let mapped = pipeline
        .process_sql("$filter=Address/Street eq 'TestStreet'", "Products")
        .unwrap();
    let unmapped = pipeline
        .process("$filter=Address/City eq 'Test'", "Products")
        .unwrap_err();

    // Assert
    assert_eq!(mapped.as_deref(), Some("street = @p1"));
    assert_eq!(unmapped.to_string(), "Unknown property 'Address/City'.");
}

#[test]
fn navigating_past_a_primitive_is_rejected() {
    let pipeline = common::pipeline();

    let err = pipeline.process("Name/Length eq 3", "Products").unwrap_err();

    assert!(matches!(err, FilterError::Validation(_)));
    assert!(err.to_string().contains("'Name'"), "{err}");
}

#[test]
fn startswith_appends_wildcard_to_bound_value() {
    // Arrange
    let pipeline = common::pipeline();

    // Act
    let result = pipeline
        .process("$filter=startswith(Name, '123')", "Products")
        .unwrap();

    // Assert
    assert_eq!(result.sql.as_deref(), Some("ILIKE(name, @p1)"));
    assert_eq!(result.parameters.get("@p1"), Some(&SqlValue::from("123%")));
}

#[test]
fn wildcard_positions_follow_the_catalog() {
    let pipeline = common::pipeline();

    let ends = pipeline.process("endswith(Name, 'x')", "Products").unwrap();
    let contains = pipeline.process("contains(Name, 'x')", "Products").unwrap();

    assert_eq!(ends.parameters.get("@p1"), Some(&SqlValue::from("%x")));
    assert_eq!(contains.parameters.get("@p1"), Some(&SqlValue::from("%x%")));
}

#[test]
fn function_names_are_case_insensitive() {
    let pipeline = common::pipeline();

    let sql = pipeline
        .process_sql("StartsWith(Name, 'O''Brien')", "Products")
        .unwrap();

    assert_eq!(sql.as_deref(), Some("ILIKE(name, @p1)"));
}

#[test]
fn unknown_function_is_rejected() {
    let pipeline = common::pipeline();

    let err = pipeline.process("startswith(Bla, 'value')", "Products").unwrap_err();
    let unknown = pipeline.process("frobnicate(Name) eq 1", "Products").unwrap_err();

    assert!(matches!(err, FilterError::Validation(_)));
    assert!(unknown.to_string().contains("Unknown function 'frobnicate'."));
}

#[test]
fn argument_type_is_checked() {
    let pipeline = common::pipeline();

    let err = pipeline.process("startswith(Price, 'x')", "Products").unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid filter expression: Argument 1 of function 'startswith' has type 'Edm.Double', but expected 'Edm.String'."
    );
}

#[test]
fn argument_count_is_checked() {
    let pipeline = common::pipeline();

    let err = pipeline.process("startswith(Name)", "Products").unwrap_err();

    assert!(
        err.to_string()
            .contains("Function 'startswith' expects 2 arguments, but 1 were provided."),
        "{err}"
    );
}

#[test]
fn zero_argument_function_renders_template() {
    let pipeline = common::pipeline();

    let sql = pipeline.process_sql("Released lt now()", "Products").unwrap();

    assert_eq!(sql.as_deref(), Some("released_at < NOW()"));
}

#[test]
fn timestamps_bind_as_datetimes() {
    let pipeline = common::pipeline();

    let result = pipeline
        .process("Released ge 2025-01-01T12:00:00Z", "Products")
        .unwrap();

    assert!(matches!(
        result.parameters.get("@p1"),
        Some(SqlValue::DateTime(_))
    ));
}

#[test]
fn boolean_functions_become_predicates() {
    // Arrange
    let pipeline = common::pipeline();

    // Act
    let result = pipeline
        .process("intersects(Location, 'POINT(5.1 52.1)')", "Products")
        .unwrap();

    // Assert
    assert_eq!(
        result.sql.as_deref(),
        Some("((ST_Intersects(location, ST_GeomFromText(@p1, 4258))) = 1)")
    );
    let wkt = result.parameters.get("@p1").and_then(SqlValue::as_str).unwrap();
    assert!(wkt.starts_with("POINT"), "{wkt}");
}

#[test]
fn distance_in_meters_is_converted_to_degrees() {
    // Arrange
    let pipeline = common::pipeline();

    // Act
    let result = pipeline
        .process("distance(Location, 'm', 'POINT(5.1 52.1)') lt 1000", "Products")
        .unwrap();

    // Assert
    assert_eq!(
        result.sql.as_deref(),
        Some("ST_Distance(location, ST_GeomFromText(@p2, 4258)) < @p3")
    );
    assert!(!result.parameters.contains("@p1"));
    let degrees = result.parameters.get("@p3").and_then(SqlValue::as_f64).unwrap();
    assert!((degrees - 1000.0 / METERS_PER_DEGREE).abs() < 1e-12);
}

#[test]
fn distance_in_degrees_passes_through() {
    let pipeline = common::pipeline();

    let result = pipeline
        .process("distance(Location, 'd', 'POINT(5.1 52.1)') le 0.5", "Products")
        .unwrap();

    assert_eq!(result.parameters.get("@p3"), Some(&SqlValue::Double(0.5)));
    assert_eq!(result.parameters.len(), 2);
}

#[test]
fn distance_rejects_unknown_units() {
    let pipeline = common::pipeline();

    let err = pipeline
        .process("distance(Location, 'km', 'POINT(5.1 52.1)') lt 1", "Products")
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid filter expression: Invalid unit 'km' for distance. Allowed: 'm' (meters), 'd' (degrees)."
    );
}

#[test]
fn spatial_literals_are_reprojected_to_storage_crs() {
    // Arrange
    let pipeline = common::pipeline()
        .with_options(FilterOptions::default().with_source_srid(28992));

    // Act
    let result = pipeline
        .process("intersects(Location, 'POINT(155000 463000)')", "Products")
        .unwrap();

    // Assert
    let wkt = result.parameters.get("@p1").and_then(SqlValue::as_str).unwrap();
    assert!(wkt.starts_with("POINT(5.38"), "{wkt}");
}

#[test]
fn unsupported_source_crs_binds_literal_unchanged() {
    let pipeline = common::pipeline()
        .with_options(FilterOptions::default().with_source_srid(2154));

    let result = pipeline
        .process("intersects(Location, 'POINT(1 2)')", "Products")
        .unwrap();

    assert_eq!(result.parameters.get("@p1"), Some(&SqlValue::from("POINT(1 2)")));
}

#[test]
fn parameter_prefix_is_configurable() {
    let pipeline = common::pipeline()
        .with_options(FilterOptions::default().with_parameter_prefix(':'));

    let result = pipeline.process("Name eq 'a' and ID eq 2", "Products").unwrap();

    assert_eq!(result.sql.as_deref(), Some("name = :p1 AND id = :p2"));
}

#[test]
fn overlong_filters_are_rejected() {
    let pipeline = common::pipeline()
        .with_options(FilterOptions::default().with_max_filter_length(10));

    let err = pipeline.process("Name eq 'abcdefgh'", "Products").unwrap_err();

    assert_eq!(err, FilterError::TooLong { length: 18, max: 10 });
}

#[test]
fn processing_is_repeatable() {
    // Arrange
    let pipeline = common::pipeline();
    let filter = "Name eq 'x' or Price in (1, 2, 3)";

    // Act
    let first = pipeline.process(filter, "Products").unwrap();
    let second = pipeline.process(filter, "Products").unwrap();

    // Assert
    assert_eq!(first, second);
    assert_eq!(first.parameters.len(), 4);
}

#[test]
fn pipeline_is_shareable_across_threads() {
    let pipeline = Arc::new(common::pipeline());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            std::thread::spawn(move || {
                pipeline
                    .process_sql(&format!("ID eq {i}"), "Products")
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().as_deref(), Some("id = @p1"));
    }
}

#[test]
fn entity_set_lookup_ignores_case() {
    let pipeline = FilterPipeline::new(
        Arc::new(common::schema()),
        common::functions(),
        common::properties(),
    );

    assert!(pipeline.process("ID eq 1", "products").is_ok());
}
