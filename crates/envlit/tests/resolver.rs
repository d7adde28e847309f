//! Integration tests for the resolution pipeline.
//!
//! Tests that touch the live process environment are serialized, since the
//! environment is shared process state.

use std::io::Write;

use envlit::{
    DefaultValue, Error, FieldSpec, FieldType, GroupConfig, Origin, Resolver, SourceMap,
};
use serial_test::serial;
use tempfile::NamedTempFile;

fn map(pairs: &[(&str, &str)]) -> SourceMap {
    pairs.iter().copied().collect()
}

fn set_var(key: &str, value: &str) {
    // SAFETY: tests mutating the environment are #[serial].
    unsafe { std::env::set_var(key, value) }
}

fn remove_var(key: &str) {
    // SAFETY: tests mutating the environment are #[serial].
    unsafe { std::env::remove_var(key) }
}

#[test]
#[serial]
fn source_map_wins_over_process_environment() {
    set_var("ENVLIT_TEST_X", "b");

    let resolver = Resolver::new(map(&[("ENVLIT_TEST_X", "a")]), true);
    let generated = resolver
        .resolve_field(&FieldSpec::new("ENVLIT_TEST_X", FieldType::String), "KEY")
        .unwrap()
        .unwrap();

    assert_eq!(generated.expr, "\"a\"");
    assert_eq!(generated.origin, Origin::SourceMap);

    remove_var("ENVLIT_TEST_X");
}

#[test]
#[serial]
fn process_environment_is_second_tier() {
    set_var("ENVLIT_TEST_Y", "from_env");

    let resolver = Resolver::new(SourceMap::new(), true);
    let generated = resolver
        .resolve_field(&FieldSpec::new("ENVLIT_TEST_Y", FieldType::String), "KEY")
        .unwrap()
        .unwrap();

    assert_eq!(generated.expr, "\"from_env\"");
    assert_eq!(generated.origin, Origin::Environment);

    remove_var("ENVLIT_TEST_Y");
}

#[test]
#[serial]
fn default_applies_when_both_tiers_are_empty() {
    remove_var("ENVLIT_TEST_Z");

    let resolver = Resolver::new(SourceMap::new(), true);
    let mut spec = FieldSpec::new("ENVLIT_TEST_Z", FieldType::String);
    spec.default = Some(DefaultValue::Str("z".into()));

    let generated = resolver.resolve_field(&spec, "KEY").unwrap().unwrap();
    assert_eq!(generated.expr, "\"z\"");
    assert_eq!(generated.origin, Origin::Default);
}

#[test]
#[serial]
fn missing_everywhere_is_a_missing_variable_fault() {
    remove_var("ENVLIT_TEST_W");

    let resolver = Resolver::new(SourceMap::new(), true);
    let errors = resolver
        .resolve_field(&FieldSpec::new("ENVLIT_TEST_W", FieldType::String), "KEY")
        .unwrap_err();

    assert!(matches!(&errors[0], Error::MissingVariable { var, .. } if var == "ENVLIT_TEST_W"));
}

#[test]
#[serial]
fn indirection_reads_a_second_environment_variable() {
    set_var("ENVLIT_TEST_TARGET", "final_value");

    let resolver = Resolver::new(map(&[("POINTER", "ENVLIT_TEST_TARGET")]), true);
    let mut spec = FieldSpec::new("POINTER", FieldType::String);
    spec.environment = true;

    let generated = resolver.resolve_field(&spec, "KEY").unwrap().unwrap();
    assert_eq!(generated.expr, "\"final_value\"");

    remove_var("ENVLIT_TEST_TARGET");
}

#[test]
#[serial]
fn indirection_name_not_renormalized() {
    // The first lookup is case-normalized; the value it yields is used
    // verbatim for the second lookup, so the lower-case target is read even
    // though the field itself is constant-case.
    set_var("envlit_test_lower", "indirect_value");
    remove_var("ENVLIT_TEST_LOWER");

    let resolver = Resolver::new(map(&[("POINTER", "envlit_test_lower")]), true);
    let mut spec = FieldSpec::new("pointer", FieldType::String);
    spec.constant_case = true;
    spec.var_name = Some("POINTER".into());
    spec.environment = true;

    let generated = resolver.resolve_field(&spec, "KEY").unwrap().unwrap();
    assert_eq!(generated.expr, "\"indirect_value\"");

    remove_var("envlit_test_lower");
}

#[test]
#[serial]
fn indirection_keeps_value_when_second_lookup_is_empty() {
    remove_var("no_such_second_variable");

    let resolver = Resolver::new(map(&[("POINTER", "no_such_second_variable")]), true);
    let mut spec = FieldSpec::new("POINTER", FieldType::String);
    spec.environment = true;

    let generated = resolver.resolve_field(&spec, "KEY").unwrap().unwrap();
    assert_eq!(generated.expr, "\"no_such_second_variable\"");
}

#[test]
fn source_map_loads_from_env_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# comment line").unwrap();
    writeln!(file, "API_URL=https://example.com").unwrap();
    writeln!(file, "PORT=8080").unwrap();
    file.flush().unwrap();

    let (map, found) = SourceMap::load(file.path()).unwrap();
    assert!(found);
    assert_eq!(map.get("API_URL"), Some("https://example.com"));
    assert_eq!(map.get("PORT"), Some("8080"));
}

#[test]
fn missing_required_source_file_aborts_group() {
    let (map, found) = SourceMap::load("definitely/missing/.env").unwrap();
    assert!(!found);

    let resolver = Resolver::new(map, found);
    let mut group = GroupConfig::new("definitely/missing/.env");
    group.require_source = true;

    let err = resolver
        .resolve_group(&group, &[FieldSpec::new("ANY", FieldType::String)])
        .unwrap_err();
    assert!(matches!(err, Error::MissingSourceFile { .. }));
}

#[test]
#[serial]
fn full_group_pass_with_mixed_outcomes() {
    remove_var("ENVLIT_TEST_MISSING");
    remove_var("ENVLIT_TEST_OPT");

    let resolver = Resolver::new(
        map(&[
            ("API_URL", "https://example.com/api"),
            ("PORT", "8080"),
            ("RETRIES", "banana"),
        ]),
        true,
    );
    let group = GroupConfig::new(".env");

    let mut optional = FieldSpec::new("ENVLIT_TEST_OPT", FieldType::String);
    optional.optional = true;

    let fields = vec![
        FieldSpec::new("API_URL", FieldType::Uri),
        FieldSpec::new("PORT", FieldType::U16),
        FieldSpec::new("RETRIES", FieldType::U8),
        FieldSpec::new("ENVLIT_TEST_MISSING", FieldType::String),
        optional,
    ];

    let output = resolver.resolve_group(&group, &fields).unwrap();

    // Two valid fields generated; the invalid and the missing one fault;
    // the optional one resolves to "not set" without a fault.
    assert_eq!(output.fields.len(), 2);
    assert_eq!(output.errors.len(), 2);
    assert!(
        output
            .errors
            .iter()
            .any(|e| matches!(e, Error::TypeMismatch { .. }))
    );
    assert!(
        output
            .errors
            .iter()
            .any(|e| matches!(e, Error::MissingVariable { .. }))
    );

    let (_, origin) = output.sources.get("ENVLIT_TEST_OPT").unwrap();
    assert_eq!(*origin, Origin::NotSet);

    let folded = output.into_result().unwrap_err();
    assert!(matches!(folded, Error::Multiple { .. }));
}

#[test]
fn uri_field_renders_parse_expression() {
    let resolver = Resolver::new(map(&[("API_URL", "https://example.com/api")]), true);
    let generated = resolver
        .resolve_field(&FieldSpec::new("API_URL", FieldType::Uri), "KEY")
        .unwrap()
        .unwrap();
    assert_eq!(generated.expr, "\"https://example.com/api\".parse::<Url>()");
}

#[test]
fn enum_field_renders_member_reference() {
    let resolver = Resolver::new(map(&[("LEVEL", "Warn")]), true);
    let ty = FieldType::Enum {
        name: "LogLevel".into(),
        members: vec!["Error".into(), "Warn".into(), "Info".into()],
    };
    let generated = resolver
        .resolve_field(&FieldSpec::new("LEVEL", ty), "KEY")
        .unwrap()
        .unwrap();
    assert_eq!(generated.expr, "LogLevel::Warn");
}
