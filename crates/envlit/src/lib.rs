//! # envlit
//!
//! An environment value resolution and obfuscation engine: it turns named
//! configuration values (from a `.env`-style source file and/or process
//! environment variables) into strongly-typed, optionally-encrypted literal
//! expressions for embedding in generated code, together with the run-time
//! decryption half of the scheme.
//!
//! ## Pipeline
//!
//! For each configured field:
//!
//! 1. The [`Resolver`] walks the precedence chain — source map, then the
//!    live process environment, then the configured default — with
//!    error/optionality semantics at the end of the chain.
//! 2. String values optionally get `${name}` interpolation and one of two
//!    escaping modes: backslash quoting or raw-string delimiter escalation.
//! 3. The value is validated against the declared [`FieldType`].
//! 4. With obfuscation requested, the plain value is replaced by an
//!    AES-256-CBC envelope encrypted under a key derived from the consuming
//!    program's public member surface, plus an expression that decrypts at
//!    run time with a key recomputed from the same surface.
//!
//! The key is never configured or stored: [`derive_key`] recomputes it from
//! a [`SurfaceDescriptor`] at generation time and again at run time, and the
//! two computations must agree byte-for-byte. Obfuscation is deterrence
//! against casual inspection of emitted literals, not a security boundary.
//!
//! ## Error Accumulation
//!
//! Per-field faults accumulate instead of failing fast, so every problem in
//! a group is reported at once (folded into [`Error::Multiple`]); only
//! group-level faults short-circuit. Diagnostics integrate with [`miette`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use envlit::{FieldSpec, FieldType, GroupConfig, Resolver, SourceMap};
//!
//! let (map, found) = SourceMap::load(".env")?;
//! let resolver = Resolver::new(map, found);
//!
//! let group = GroupConfig::new(".env");
//! let fields = vec![
//!     FieldSpec::new("API_URL", FieldType::Uri),
//!     FieldSpec::new("PORT", FieldType::U16),
//! ];
//!
//! let (generated, origins) = resolver.resolve_group(&group, &fields)?.into_result()?;
//! for field in &generated {
//!     println!("{} = {}", field.name, field.expr);
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// Re-export miette so callers don't need it as a direct dependency for
// pretty-printing engine errors.
pub use miette;

mod error;
pub use error::Error;

/// A Result type that displays errors with miette's fancy formatting.
///
/// Use this as a main-function return type for pretty diagnostic output.
pub type Result<T> = miette::Result<T>;

mod source;
pub use source::{GroupSources, Origin, ResolvedValue, SourceMap};

mod config;
pub use config::{DefaultValue, FieldOverrides, FieldSpec, GroupConfig};

mod ty;
pub use ty::FieldType;

mod value;
pub use value::FieldValue;

pub mod transform;

mod surface;
pub use surface::{
    DerivedKey, Member, SurfaceDescriptor, SurfaceEnumerator, TypeSurface, derive_key,
};

pub mod codec;
pub use codec::{decrypt, encrypt};

mod resolver;
pub use resolver::{GeneratedField, GroupOutput, Resolver};
