#![no_main]

use envlit::{FieldType, FieldValue};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // === Type-name parsing - should never panic ===
    let _ = FieldType::parse(data);

    // === Validation of arbitrary raw values - should never panic ===
    let types = [
        FieldType::String,
        FieldType::Bool,
        FieldType::I8,
        FieldType::I64,
        FieldType::U8,
        FieldType::U64,
        FieldType::F64,
        FieldType::Decimal,
        FieldType::DateTime,
        FieldType::Duration,
        FieldType::Version,
        FieldType::Uri,
        FieldType::Uuid,
        FieldType::Enum {
            name: "LogLevel".into(),
            members: vec!["Error".into(), "Warn".into(), "Info".into()],
        },
        FieldType::Optional(Box::new(FieldType::U16)),
    ];

    for ty in &types {
        let _ = ty.is_valid(data);
        let _ = ty.validate_value(&FieldValue::Plain(data.to_string()));

        // Deferred values skip validation entirely.
        assert!(ty.validate_value(&FieldValue::DeferredDecrypt(data.to_string())));

        // Expression rendering must not panic on odd inputs.
        let _ = ty.conversion_expr(&FieldValue::Plain(data.to_string()), "\"x\"");
    }
});
