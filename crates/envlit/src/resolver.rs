//! The per-field value resolver and group driver.
//!
//! For each configured field the resolver walks the precedence chain
//! (source map, then the live process environment, then the configured
//! default), applies optional environment indirection, interpolates and
//! escapes string values, validates against the declared type, and finally
//! swaps the plain value for ciphertext plus a deferred decrypt expression
//! when obfuscation is requested.
//!
//! Per-field faults accumulate; one bad field never prevents generation of
//! the rest of the group. Only group-level faults (a missing required
//! source file, or obfuscation without a surface) short-circuit.

use std::cell::OnceCell;

use crate::codec;
use crate::config::{FieldSpec, GroupConfig};
use crate::error::Error;
use crate::source::{GroupSources, Origin, ResolvedValue, SourceMap};
use crate::surface::{DerivedKey, SurfaceDescriptor, derive_key};
use crate::transform;
use crate::ty::FieldType;
use crate::value::FieldValue;

/// One successfully generated field.
#[derive(Clone, Debug)]
pub struct GeneratedField {
    /// The logical field name.
    pub name: String,

    /// The effective variable name that was resolved.
    pub var: String,

    /// The declared type name.
    pub type_name: String,

    /// The resolved value, plain or deferred.
    pub value: FieldValue,

    /// The rendered literal-construction expression.
    pub expr: String,

    /// Which tier produced the value.
    pub origin: Origin,

    /// Whether the value was obfuscated.
    pub obfuscated: bool,
}

/// Everything produced by one group pass.
#[derive(Debug, Default)]
pub struct GroupOutput {
    /// Fields that resolved to a value. Optional fields that resolved to
    /// none appear only in the attribution table, tagged not-set.
    pub fields: Vec<GeneratedField>,

    /// Per-field origin attribution.
    pub sources: GroupSources,

    /// Accumulated per-field faults.
    pub errors: Vec<Error>,
}

impl GroupOutput {
    /// Folds accumulated faults into a single error, keeping the fields.
    ///
    /// # Errors
    ///
    /// Returns the folded fault set when any field failed.
    pub fn into_result(self) -> Result<(Vec<GeneratedField>, GroupSources), Error> {
        match Error::multiple(self.errors) {
            None => Ok((self.fields, self.sources)),
            Some(err) => Err(err),
        }
    }
}

/// Resolves fields against a source-map snapshot and an optional program
/// surface.
///
/// The source map and surface are read-only snapshots for the duration of
/// one pass; fields are independent, and the derived key is computed at most
/// once per resolver.
pub struct Resolver {
    map: SourceMap,
    source_found: bool,
    surface: Option<SurfaceDescriptor>,
    key: OnceCell<DerivedKey>,
}

impl Resolver {
    /// Creates a resolver over a loaded source map.
    ///
    /// `source_found` is the loader's "file was found" signal; it decides
    /// whether a require-source group aborts.
    #[must_use]
    pub fn new(map: SourceMap, source_found: bool) -> Self {
        Self {
            map,
            source_found,
            surface: None,
            key: OnceCell::new(),
        }
    }

    /// Attaches the program surface used for key derivation.
    ///
    /// The enumerator must already have excluded the obfuscated fields
    /// themselves from the descriptor (see
    /// [`SurfaceDescriptor::without_fields`]).
    #[must_use]
    pub fn with_surface(mut self, surface: SurfaceDescriptor) -> Self {
        self.surface = Some(surface);
        self
    }

    /// The derived key, computed on first use.
    fn derived_key(&self) -> Option<&DerivedKey> {
        let surface = self.surface.as_ref()?;
        Some(self.key.get_or_init(|| derive_key(surface)))
    }

    /// Resolves every field in a group.
    ///
    /// # Errors
    ///
    /// Returns a group-level fault when the source file is absent while
    /// required, or when obfuscation is requested with no surface attached.
    /// Per-field faults do not error here; they accumulate in the output.
    pub fn resolve_group(
        &self,
        group: &GroupConfig,
        fields: &[FieldSpec],
    ) -> Result<GroupOutput, Error> {
        if group.require_source && !self.source_found {
            return Err(Error::MissingSourceFile {
                path: group.path.clone(),
            });
        }

        if fields.iter().any(|f| f.obfuscate) && self.surface.is_none() {
            return Err(Error::MissingSurface);
        }

        let mut output = GroupOutput::default();
        for field in fields {
            let var = field.effective_name();
            match self.resolve_field(field, &group.key_ident) {
                Ok(Some(generated)) => {
                    output.sources.add(&field.name, &var, generated.origin.clone());
                    output.fields.push(generated);
                }
                Ok(None) => {
                    output.sources.add(&field.name, &var, Origin::NotSet);
                }
                Err(mut errors) => {
                    output.errors.append(&mut errors);
                }
            }
        }

        tracing::debug!(
            fields = fields.len(),
            generated = output.fields.len(),
            faults = output.errors.len(),
            "resolved group"
        );

        Ok(output)
    }

    /// Resolves a single field.
    ///
    /// `Ok(Some(_))` is a generated field; `Ok(None)` is the non-fault
    /// "missing" outcome for an optional field; `Err(_)` carries the
    /// per-field faults.
    ///
    /// # Errors
    ///
    /// Returns the faults recorded while resolving this field.
    pub fn resolve_field(
        &self,
        field: &FieldSpec,
        key_ident: &str,
    ) -> Result<Option<GeneratedField>, Vec<Error>> {
        let var = field.effective_name();

        let resolved = self.lookup(field, &var);
        let Some(mut value) = resolved.value else {
            if !field.optional {
                return Err(vec![Error::missing(&var)]);
            }
            if field.ty.is_value_type() {
                return Err(vec![Error::invalid_optional_type(
                    &field.name,
                    field.ty.type_name(),
                )]);
            }
            tracing::debug!(field = %field.name, %var, "optional field not set");
            return Ok(None);
        };

        // One level of indirection through the live environment; the second
        // lookup uses the value verbatim, with no case re-normalization.
        if field.environment
            && let Ok(indirect) = std::env::var(&value)
            && !indirect.is_empty()
        {
            value = indirect;
        }

        let mut errors = Vec::new();
        let is_string = matches!(field.ty.unwrap_optional(), FieldType::String);

        if is_string && field.interpolate {
            let (interpolated, faults) =
                transform::interpolate(&value, &self.map, field.constant_case, field.optional);
            errors.extend(faults);
            value = interpolated;
        }

        // Validation runs against the plain transformed value; the deferred
        // rule in validate_value covers values that are already envelopes.
        if !field.ty.validate_value(&FieldValue::Plain(value.clone())) {
            // Wrong-type is a distinct fault class from absent.
            errors.push(Error::type_mismatch(&var, &value, field.ty.type_name()));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let (field_value, value_expr) = if field.obfuscate {
            // Ciphertext is base64; escaping is skipped entirely.
            let Some(key) = self.derived_key() else {
                return Err(vec![Error::MissingSurface]);
            };
            let envelope = codec::encrypt(&value, key, field.random_seed);
            let call = format!("decrypt(\"{envelope}\", &{key_ident})");
            (FieldValue::DeferredDecrypt(envelope), call)
        } else {
            let literal = if is_string && field.raw_string {
                transform::escape_raw(&value)
            } else {
                format!("\"{}\"", transform::escape_quoted(&value))
            };
            (FieldValue::Plain(value), literal)
        };

        let expr = field.ty.conversion_expr(&field_value, &value_expr);
        tracing::debug!(field = %field.name, %var, origin = %resolved.origin, "resolved field");

        Ok(Some(GeneratedField {
            name: field.name.clone(),
            var,
            type_name: field.ty.type_name(),
            obfuscated: field_value.is_deferred(),
            value: field_value,
            expr,
            origin: resolved.origin,
        }))
    }

    /// Walks the precedence chain for one variable name.
    ///
    /// Source map wins over the live process environment; the default is the
    /// last resort before optionality is evaluated. Empty strings are
    /// treated as absent at every tier.
    fn lookup(&self, field: &FieldSpec, var: &str) -> ResolvedValue {
        if let Some(value) = self.map.get(var)
            && !value.is_empty()
        {
            return ResolvedValue::new(value, Origin::SourceMap);
        }

        if let Ok(value) = std::env::var(var)
            && !value.is_empty()
        {
            return ResolvedValue::new(value, Origin::Environment);
        }

        if let Some(default) = &field.default {
            let rendered = default.render();
            if !rendered.is_empty() {
                return ResolvedValue::new(rendered, Origin::Default);
            }
        }

        ResolvedValue::not_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DefaultValue, FieldOverrides};

    fn map(pairs: &[(&str, &str)]) -> SourceMap {
        pairs.iter().copied().collect()
    }

    fn field(name: &str, ty: FieldType) -> FieldSpec {
        FieldSpec::new(name, ty)
    }

    #[test]
    fn source_map_value_resolves() {
        let resolver = Resolver::new(map(&[("PORT", "8080")]), true);
        let generated = resolver
            .resolve_field(&field("PORT", FieldType::U16), "KEY")
            .unwrap()
            .unwrap();
        assert_eq!(generated.expr, "8080");
        assert_eq!(generated.origin, Origin::SourceMap);
    }

    #[test]
    fn missing_required_field_faults() {
        let resolver = Resolver::new(SourceMap::new(), true);
        let errors = resolver
            .resolve_field(&field("ABSENT_VAR_FOR_TEST", FieldType::String), "KEY")
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::MissingVariable { .. }));
    }

    #[test]
    fn default_is_last_resort() {
        let resolver = Resolver::new(SourceMap::new(), true);
        let mut spec = field("ABSENT_VAR_FOR_TEST", FieldType::String);
        spec.default = Some(DefaultValue::Str("z".into()));

        let generated = resolver.resolve_field(&spec, "KEY").unwrap().unwrap();
        assert_eq!(generated.expr, "\"z\"");
        assert_eq!(generated.origin, Origin::Default);
    }

    #[test]
    fn bool_default_renders_lowercase() {
        let resolver = Resolver::new(SourceMap::new(), true);
        let mut spec = field("ABSENT_FLAG_FOR_TEST", FieldType::Bool);
        spec.default = Some(DefaultValue::Bool(true));

        let generated = resolver.resolve_field(&spec, "KEY").unwrap().unwrap();
        assert_eq!(generated.expr, "true");
    }

    #[test]
    fn empty_source_map_value_is_absent() {
        let resolver = Resolver::new(map(&[("NAME", "")]), true);
        let mut spec = field("NAME", FieldType::String);
        spec.default = Some(DefaultValue::Str("fallback".into()));

        let generated = resolver.resolve_field(&spec, "KEY").unwrap().unwrap();
        assert_eq!(generated.origin, Origin::Default);
    }

    #[test]
    fn optional_reference_type_resolves_to_none() {
        let resolver = Resolver::new(SourceMap::new(), true);
        let mut spec = field("ABSENT_VAR_FOR_TEST", FieldType::String);
        spec.optional = true;

        assert!(resolver.resolve_field(&spec, "KEY").unwrap().is_none());
    }

    #[test]
    fn optional_value_type_must_be_nullable() {
        let resolver = Resolver::new(SourceMap::new(), true);
        let mut spec = field("ABSENT_VAR_FOR_TEST", FieldType::U16);
        spec.optional = true;

        let errors = resolver.resolve_field(&spec, "KEY").unwrap_err();
        assert!(matches!(errors[0], Error::InvalidOptionalType { .. }));
    }

    #[test]
    fn optional_nullable_value_type_is_fine() {
        let resolver = Resolver::new(SourceMap::new(), true);
        let mut spec = field(
            "ABSENT_VAR_FOR_TEST",
            FieldType::Optional(Box::new(FieldType::U16)),
        );
        spec.optional = true;

        assert!(resolver.resolve_field(&spec, "KEY").unwrap().is_none());
    }

    #[test]
    fn type_mismatch_is_distinct_from_missing() {
        let resolver = Resolver::new(map(&[("PORT", "not_a_number")]), true);
        let errors = resolver
            .resolve_field(&field("PORT", FieldType::U16), "KEY")
            .unwrap_err();
        assert!(matches!(errors[0], Error::TypeMismatch { .. }));
    }

    #[test]
    fn interpolation_flows_through_resolution() {
        let resolver = Resolver::new(
            map(&[("API_URL", "http://${HOST}"), ("HOST", "example.com")]),
            true,
        );
        let mut spec = field("API_URL", FieldType::String);
        spec.interpolate = true;

        let generated = resolver.resolve_field(&spec, "KEY").unwrap().unwrap();
        assert_eq!(generated.expr, "\"http://example.com\"");
    }

    #[test]
    fn interpolation_fault_keeps_placeholder_and_reports() {
        let resolver = Resolver::new(map(&[("API_URL", "http://${HOST}")]), true);
        let mut spec = field("API_URL", FieldType::String);
        spec.interpolate = true;

        let errors = resolver.resolve_field(&spec, "KEY").unwrap_err();
        assert!(matches!(&errors[0], Error::MissingVariable { var, .. } if var == "HOST"));
    }

    #[test]
    fn raw_string_escaping_applies() {
        let resolver = Resolver::new(map(&[("MOTD", "say \"hi\"")]), true);
        let mut spec = field("MOTD", FieldType::String);
        spec.raw_string = true;

        let generated = resolver.resolve_field(&spec, "KEY").unwrap().unwrap();
        assert!(generated.expr.starts_with("\"\"\""));
        assert!(generated.expr.contains("say \"hi\""));
    }

    #[test]
    fn group_accumulates_faults_without_aborting() {
        let resolver = Resolver::new(map(&[("GOOD", "fine")]), true);
        let group = GroupConfig::new(".env");
        let fields = vec![
            field("GOOD", FieldType::String),
            field("ABSENT_VAR_FOR_TEST", FieldType::String),
        ];

        let output = resolver.resolve_group(&group, &fields).unwrap();
        assert_eq!(output.fields.len(), 1);
        assert_eq!(output.errors.len(), 1);
        assert!(output.into_result().is_err());
    }

    #[test]
    fn required_source_file_aborts_the_group() {
        let resolver = Resolver::new(SourceMap::new(), false);
        let mut group = GroupConfig::new("missing.env");
        group.require_source = true;

        let err = resolver
            .resolve_group(&group, &[field("ANY", FieldType::String)])
            .unwrap_err();
        assert!(matches!(err, Error::MissingSourceFile { .. }));
        assert!(err.is_group_fatal());
    }

    #[test]
    fn missing_source_file_without_require_proceeds_with_defaults() {
        let resolver = Resolver::new(SourceMap::new(), false);
        let group = GroupConfig::new("missing.env");
        let mut spec = field("ABSENT_VAR_FOR_TEST", FieldType::String);
        spec.default = Some(DefaultValue::Str("fallback".into()));

        let output = resolver.resolve_group(&group, &[spec]).unwrap();
        assert_eq!(output.fields.len(), 1);
        assert!(output.errors.is_empty());
    }

    #[test]
    fn obfuscation_without_surface_is_group_fatal() {
        let resolver = Resolver::new(map(&[("SECRET", "v")]), true);
        let group = GroupConfig::new(".env");
        let mut spec = field("SECRET", FieldType::String);
        spec.obfuscate = true;

        let err = resolver.resolve_group(&group, &[spec]).unwrap_err();
        assert!(matches!(err, Error::MissingSurface));
    }

    #[test]
    fn group_merge_feeds_resolution() {
        let resolver = Resolver::new(map(&[("API_KEY", "k-123")]), true);
        let mut group = GroupConfig::new(".env");
        group.constant_case = true;

        let spec = FieldSpec::for_group(
            "api_key",
            FieldType::String,
            FieldOverrides::default(),
            &group,
        );
        let generated = resolver.resolve_field(&spec, "KEY").unwrap().unwrap();
        assert_eq!(generated.var, "API_KEY");
    }
}
