//! Error types for value resolution and obfuscation.
//!
//! This module contains the [`Error`] enum covering every fault class the
//! engine can report, with rich diagnostics via [`miette`].
//!
//! # Error Accumulation
//!
//! Resolution-time faults are recoverable per field: the resolver collects
//! them instead of failing fast, so one bad field does not prevent generation
//! of the rest of the group. Collected faults fold into [`Error::Multiple`]
//! via [`Error::multiple`]. Only two classes short-circuit:
//!
//! - [`Error::MissingSourceFile`] and [`Error::MissingSurface`] abort the
//!   whole group (no fields generated)
//! - [`Error::DecryptionFailure`] is fatal at run time, with no fallback value
//!
//! # Diagnostic Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | `envlit::missing_var` | Required variable absent from every tier |
//! | `envlit::invalid_optional_type` | Optional field with a non-nullable value type |
//! | `envlit::type_mismatch` | Resolved value failed type validation |
//! | `envlit::missing_source_file` | Required source file not found |
//! | `envlit::missing_surface` | Obfuscation requested with no program surface |
//! | `envlit::unsupported_type` | Declared field type has no coercion rule |
//! | `envlit::decryption_failure` | Malformed envelope or surface drift |
//! | `envlit::multiple_errors` | Multiple faults accumulated |

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error as ThisError;

/// Faults reported by the resolution pipeline and the obfuscation codec.
///
/// Wrong-type and absent are distinct fault classes and must be reported
/// differently; this enum keeps one variant per class from the fault
/// taxonomy so callers can match on the failure mode.
#[derive(Debug, ThisError, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    /// A required variable was absent from every resolution tier.
    #[error("missing environment variable: {var}")]
    #[diagnostic(code(envlit::missing_var), severity(Error))]
    MissingVariable {
        /// The effective (case-normalized) variable name that was looked up.
        var: String,

        /// Dynamic help naming the variable to set.
        #[help]
        help: String,
    },

    /// An optional field has a non-nullable value type.
    ///
    /// There is no in-memory representation of "absent" for an unwrapped
    /// value type, so optionality requires an optional-of-T field type.
    #[error("optional field '{field}' of type {type_name} must be nullable")]
    #[diagnostic(
        code(envlit::invalid_optional_type),
        help("wrap the field type in an optional, or remove the optional flag")
    )]
    InvalidOptionalType {
        /// The logical field name.
        field: String,

        /// The declared field type.
        type_name: String,
    },

    /// A resolved value failed validation against the declared field type.
    #[error("value {value:?} for {var} is not a valid {expected_type}")]
    #[diagnostic(code(envlit::type_mismatch))]
    TypeMismatch {
        /// The effective variable name.
        var: String,

        /// The raw value that failed validation.
        value: String,

        /// The declared type name (for diagnostic messages).
        expected_type: String,

        /// Dynamic help text generated from the expected type.
        #[help]
        help: String,
    },

    /// The configured source file is absent while required.
    ///
    /// Aborts the whole group: no fields are generated.
    #[error("source file not found: {path}")]
    #[diagnostic(
        code(envlit::missing_source_file),
        help("create the file or clear the require-source flag to proceed with defaults")
    )]
    MissingSourceFile {
        /// The configured source file path.
        path: PathBuf,
    },

    /// Obfuscation was requested but no program surface was supplied.
    ///
    /// The key can only be derived from a surface descriptor; a group with
    /// obfuscated fields cannot be resolved without one.
    #[error("obfuscation requested but no program surface was supplied")]
    #[diagnostic(
        code(envlit::missing_surface),
        help("supply a surface descriptor to the resolver before resolving obfuscated fields")
    )]
    MissingSurface,

    /// A declared field type has no coercion rule.
    ///
    /// Aborts generation for that field; the rest of the group proceeds.
    #[error("type '{type_name}' is not supported for conversion")]
    #[diagnostic(
        code(envlit::unsupported_type),
        help("use one of the supported field types")
    )]
    UnsupportedType {
        /// The unrecognized type name.
        type_name: String,
    },

    /// An obfuscated value could not be decrypted at run time.
    ///
    /// Malformed ciphertext or surface drift since generation. Fatal and
    /// non-recoverable; propagated to the caller of the decrypt operation.
    #[error("failed to decrypt obfuscated value: {reason}")]
    #[diagnostic(
        code(envlit::decryption_failure),
        help(
            "the program's public surface must be identical to the one hashed at generation time"
        )
    )]
    DecryptionFailure {
        /// What went wrong (bad encoding, truncated envelope, bad padding, invalid UTF-8).
        reason: String,
    },

    /// Multiple faults accumulated during one resolution pass.
    #[error("{} resolution error(s) occurred", errors.len())]
    #[diagnostic(code(envlit::multiple_errors), help("fix all listed errors"))]
    Multiple {
        /// All accumulated faults, rendered as related diagnostics.
        #[related]
        errors: Vec<Error>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Constructor helpers for ergonomic error creation
// ─────────────────────────────────────────────────────────────────────────────

impl Error {
    /// Creates a `MissingVariable` fault with a standard help message.
    pub fn missing(var: impl Into<String>) -> Self {
        let var = var.into();
        let help = format!("set {var} in your environment or source file");
        Error::MissingVariable { var, help }
    }

    /// Creates a `TypeMismatch` fault with help text derived from the type.
    pub fn type_mismatch(
        var: impl Into<String>,
        value: impl Into<String>,
        expected_type: impl Into<String>,
    ) -> Self {
        let expected_type = expected_type.into();
        let help = format!("expected a valid {expected_type}");
        Error::TypeMismatch {
            var: var.into(),
            value: value.into(),
            expected_type,
            help,
        }
    }

    /// Creates an `InvalidOptionalType` fault.
    pub fn invalid_optional_type(field: impl Into<String>, type_name: impl Into<String>) -> Self {
        Error::InvalidOptionalType {
            field: field.into(),
            type_name: type_name.into(),
        }
    }

    /// Creates an `UnsupportedType` fault.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Error::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Creates a `DecryptionFailure` fault.
    pub fn decryption(reason: impl Into<String>) -> Self {
        Error::DecryptionFailure {
            reason: reason.into(),
        }
    }

    /// Collects multiple faults into a single error.
    ///
    /// Returns `None` for an empty input; a single fault is unwrapped
    /// instead of being wrapped in `Multiple`.
    pub fn multiple(errors: Vec<Error>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.into_iter().next(),
            _ => Some(Error::Multiple { errors }),
        }
    }

    /// Whether this fault aborts the whole group rather than a single field.
    #[must_use]
    pub fn is_group_fatal(&self) -> bool {
        matches!(
            self,
            Error::MissingSourceFile { .. } | Error::MissingSurface
        )
    }
}
