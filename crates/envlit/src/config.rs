//! Group and field configuration for one resolution pass.
//!
//! A [`GroupConfig`] describes one logical configuration group (its source
//! file plus group-wide overrides); each [`FieldSpec`] describes one field
//! and inherits the group's overrides unless it sets its own. Both are
//! immutable once constructed; the front end that parses source-level
//! declarations into these structs lives outside the engine.

use std::path::PathBuf;

use crate::ty::FieldType;

/// A default value configured for a field.
///
/// Booleans render as lower-case `true`/`false`; other scalars render via
/// their natural string form.
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultValue {
    /// A boolean default.
    Bool(bool),

    /// An integer default.
    Int(i64),

    /// A floating-point default.
    Float(f64),

    /// A string default.
    Str(String),
}

impl DefaultValue {
    /// Renders the default as the raw string the resolver works with.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(x) => x.to_string(),
            Self::Str(s) => s.clone(),
        }
    }
}

impl From<&str> for DefaultValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<bool> for DefaultValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for DefaultValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Configuration for one logical group of fields.
///
/// Global overrides here are inherited by every [`FieldSpec`] in the group
/// unless the field overrides them itself.
#[derive(Clone, Debug)]
pub struct GroupConfig {
    /// Path of the `.env`-style source file for this group.
    pub path: PathBuf,

    /// Whether a missing source file aborts the whole group.
    pub require_source: bool,

    /// Obfuscate every field unless overridden.
    pub obfuscate: bool,

    /// Permit optional fields group-wide.
    pub allow_optional: bool,

    /// Upper-case effective variable names group-wide.
    pub constant_case: bool,

    /// Interpolate `${name}` placeholders group-wide.
    pub interpolate: bool,

    /// Use raw-string escaping group-wide.
    pub raw_strings: bool,

    /// Treat resolved values as environment variable names (one level of
    /// indirection) group-wide.
    pub environment: bool,

    /// Group-wide random seed for reproducible obfuscation.
    pub random_seed: Option<u64>,

    /// Identifier of the key binding referenced by rendered decrypt calls.
    pub key_ident: String,
}

impl GroupConfig {
    /// Creates a group config with all overrides off and the given source path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            require_source: false,
            obfuscate: false,
            allow_optional: false,
            constant_case: false,
            interpolate: false,
            raw_strings: false,
            environment: false,
            random_seed: None,
            key_ident: "KEY".to_string(),
        }
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self::new(".env")
    }
}

/// Per-field overrides as declared by the front end, before group merging.
///
/// Boolean flags here mean "the field itself asked for this"; the effective
/// flag is the OR of the field's and the group's setting.
#[derive(Clone, Debug, Default)]
pub struct FieldOverrides {
    /// Variable name override (the logical field name is used otherwise).
    pub name: Option<String>,

    /// Upper-case the effective variable name.
    pub constant_case: bool,

    /// Resolving to "no value" is not a fault for this field.
    pub optional: bool,

    /// Interpolate `${name}` placeholders in the value.
    pub interpolate: bool,

    /// Escape using raw-string delimiter escalation instead of quoting.
    pub raw_string: bool,

    /// Replace the plain value with ciphertext plus a deferred decrypt call.
    pub obfuscate: bool,

    /// Treat the resolved value as the name of another environment variable.
    pub environment: bool,

    /// Seed for reproducible ciphertext across generation runs.
    pub random_seed: Option<u64>,

    /// Value used when every lookup tier comes up empty.
    pub default: Option<DefaultValue>,
}

/// One field's fully merged request, owned by the pipeline for the duration
/// of one resolution.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    /// The logical field name (also the default variable name).
    pub name: String,

    /// The declared semantic type.
    pub ty: FieldType,

    /// Variable name override.
    pub var_name: Option<String>,

    /// Upper-case the effective variable name.
    pub constant_case: bool,

    /// "No value" is an acceptable terminal outcome.
    pub optional: bool,

    /// Interpolate `${name}` placeholders.
    pub interpolate: bool,

    /// Raw-string escaping mode.
    pub raw_string: bool,

    /// Obfuscate the resolved value.
    pub obfuscate: bool,

    /// One level of environment indirection.
    pub environment: bool,

    /// Seed for reproducible ciphertext.
    pub random_seed: Option<u64>,

    /// Default value, the last resort before optionality.
    pub default: Option<DefaultValue>,
}

impl FieldSpec {
    /// Creates a field spec with no overrides set.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            var_name: None,
            constant_case: false,
            optional: false,
            interpolate: false,
            raw_string: false,
            obfuscate: false,
            environment: false,
            random_seed: None,
            default: None,
        }
    }

    /// Merges per-field overrides with the group's global overrides.
    ///
    /// Boolean flags OR with the group setting; the name and seed fall back
    /// to the group only when the field does not set them.
    pub fn for_group(
        name: impl Into<String>,
        ty: FieldType,
        overrides: FieldOverrides,
        group: &GroupConfig,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            var_name: overrides.name,
            constant_case: overrides.constant_case || group.constant_case,
            optional: overrides.optional || group.allow_optional,
            interpolate: overrides.interpolate || group.interpolate,
            raw_string: overrides.raw_string || group.raw_strings,
            obfuscate: overrides.obfuscate || group.obfuscate,
            environment: overrides.environment || group.environment,
            random_seed: overrides.random_seed.or(group.random_seed),
            default: overrides.default,
        }
    }

    /// The effective variable name after overrides and case normalization.
    #[must_use]
    pub fn effective_name(&self) -> String {
        let name = self.var_name.as_deref().unwrap_or(&self.name);
        if self.constant_case {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }
}
