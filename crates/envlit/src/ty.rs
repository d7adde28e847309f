//! Type coercion and validation for resolved values.
//!
//! Given a raw string and a declared [`FieldType`], this module decides
//! whether the string is a syntactically valid literal of that type and, if
//! so, renders the type-specific construction expression. Validation always
//! unwraps an optional-of-T to its underlying T first; deferred-decrypt
//! values are always treated as valid because their real value is only known
//! at run time.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use url::Url;
use uuid::Uuid;

use crate::error::Error;
use crate::value::FieldValue;

/// The supported set of semantic field types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// UTF-8 text.
    String,

    /// `true` / `false`.
    Bool,

    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,

    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,

    /// Single-precision float.
    F32,
    /// Double-precision float.
    F64,

    /// High-precision decimal: sign, digits, optional fraction. No exponent.
    Decimal,

    /// Calendar date-time (RFC 3339, `YYYY-MM-DDTHH:MM:SS`, or bare date).
    DateTime,

    /// Duration in `[-][d.]hh:mm[:ss[.frac]]` notation, or a bare day count.
    Duration,

    /// Dotted numeric version with two to four components.
    Version,

    /// Absolute URI.
    Uri,

    /// Globally-unique identifier.
    Uuid,

    /// An enumeration; validity is an exact member-name match.
    Enum {
        /// The qualified enum type name used in rendered expressions.
        name: String,

        /// The member names, matched case-sensitively.
        members: Vec<String>,
    },

    /// Optional-of-T. Unwrapped before validation and key hashing.
    Optional(Box<FieldType>),
}

impl FieldType {
    /// Maps a front-end type name to a `FieldType`.
    ///
    /// Enum types are constructed directly by the front end and have no
    /// textual spelling here. `option<T>` wraps any supported inner name.
    ///
    /// # Errors
    ///
    /// An unrecognized name is an [`Error::UnsupportedType`] fault, aborting
    /// generation for the field that declared it.
    pub fn parse(name: &str) -> Result<Self, Error> {
        let trimmed = name.trim();

        if let Some(inner) = trimmed
            .strip_prefix("option<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return Ok(Self::Optional(Box::new(Self::parse(inner)?)));
        }

        match trimmed {
            "string" | "str" => Ok(Self::String),
            "bool" => Ok(Self::Bool),
            "i8" => Ok(Self::I8),
            "i16" => Ok(Self::I16),
            "i32" => Ok(Self::I32),
            "i64" => Ok(Self::I64),
            "u8" => Ok(Self::U8),
            "u16" => Ok(Self::U16),
            "u32" => Ok(Self::U32),
            "u64" => Ok(Self::U64),
            "f32" => Ok(Self::F32),
            "f64" => Ok(Self::F64),
            "decimal" => Ok(Self::Decimal),
            "datetime" => Ok(Self::DateTime),
            "duration" => Ok(Self::Duration),
            "version" => Ok(Self::Version),
            "uri" | "url" => Ok(Self::Uri),
            "uuid" | "guid" => Ok(Self::Uuid),
            other => Err(Error::unsupported_type(other)),
        }
    }

    /// Unwraps optional-of-T to the underlying T.
    #[must_use]
    pub fn unwrap_optional(&self) -> &Self {
        match self {
            Self::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    /// Whether the underlying type has no representation of "absent".
    ///
    /// Optional fields of such types must be declared optional-of-T, or
    /// resolving to "no value" is a configuration error.
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        !matches!(
            self,
            Self::String | Self::Uri | Self::Version | Self::Optional(_)
        )
    }

    /// The type name used in diagnostics and rendered expressions.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::Bool => "bool".into(),
            Self::I8 => "i8".into(),
            Self::I16 => "i16".into(),
            Self::I32 => "i32".into(),
            Self::I64 => "i64".into(),
            Self::U8 => "u8".into(),
            Self::U16 => "u16".into(),
            Self::U32 => "u32".into(),
            Self::U64 => "u64".into(),
            Self::F32 => "f32".into(),
            Self::F64 => "f64".into(),
            Self::Decimal => "Decimal".into(),
            Self::DateTime => "DateTime".into(),
            Self::Duration => "Duration".into(),
            Self::Version => "Version".into(),
            Self::Uri => "Url".into(),
            Self::Uuid => "Uuid".into(),
            Self::Enum { name, .. } => name.clone(),
            Self::Optional(inner) => format!("option<{}>", inner.type_name()),
        }
    }

    /// Checks whether `raw` is a syntactically valid literal of this type.
    ///
    /// Deferred-decrypt values never reach this function; the resolver
    /// treats them as valid structurally.
    #[must_use]
    pub fn is_valid(&self, raw: &str) -> bool {
        match self.unwrap_optional() {
            Self::String => true,
            Self::Bool => raw.parse::<bool>().is_ok(),
            Self::I8 => raw.parse::<i8>().is_ok(),
            Self::I16 => raw.parse::<i16>().is_ok(),
            Self::I32 => raw.parse::<i32>().is_ok(),
            Self::I64 => raw.parse::<i64>().is_ok(),
            Self::U8 => raw.parse::<u8>().is_ok(),
            Self::U16 => raw.parse::<u16>().is_ok(),
            Self::U32 => raw.parse::<u32>().is_ok(),
            Self::U64 => raw.parse::<u64>().is_ok(),
            Self::F32 => raw.parse::<f32>().is_ok(),
            Self::F64 => raw.parse::<f64>().is_ok(),
            Self::Decimal => is_valid_decimal(raw),
            Self::DateTime => is_valid_datetime(raw),
            Self::Duration => is_valid_duration(raw),
            Self::Version => is_valid_version(raw),
            Self::Uri => Url::parse(raw).is_ok(),
            Self::Uuid => Uuid::parse_str(raw).is_ok(),
            Self::Enum { members, .. } => members.iter().any(|m| m == raw),
            Self::Optional(_) => unreachable!("unwrap_optional flattens nesting"),
        }
    }

    /// Validates a resolved value against this type.
    ///
    /// A deferred-decrypt value is always valid: its real value cannot be
    /// known until run time, so validation falls to the runtime coercion the
    /// generated code performs after decryption.
    #[must_use]
    pub fn validate_value(&self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Plain(raw) => self.is_valid(raw),
            FieldValue::DeferredDecrypt(_) => true,
        }
    }

    /// Renders the literal-construction expression for a resolved value.
    ///
    /// `value_expr` is the embeddable expression text: the finished
    /// (escaped, delimited) literal for plain values, or the decrypt call
    /// for deferred ones. Numerics and booleans render as bare literals;
    /// enumerations render as a qualified member reference, never a parse
    /// call; structured types render as a parse of the literal.
    #[must_use]
    pub fn conversion_expr(&self, value: &FieldValue, value_expr: &str) -> String {
        let underlying = self.unwrap_optional();

        if let Self::Enum { name, .. } = underlying {
            return match value {
                FieldValue::Plain(member) => format!("{name}::{member}"),
                FieldValue::DeferredDecrypt(_) => {
                    format!("{value_expr}.parse::<{name}>()")
                }
            };
        }

        match underlying {
            Self::String => value_expr.to_string(),

            Self::Bool
            | Self::I8
            | Self::I16
            | Self::I32
            | Self::I64
            | Self::U8
            | Self::U16
            | Self::U32
            | Self::U64
            | Self::F32
            | Self::F64 => match value {
                FieldValue::Plain(raw) => raw.clone(),
                FieldValue::DeferredDecrypt(_) => {
                    format!("{value_expr}.parse::<{}>()", underlying.type_name())
                }
            },

            Self::Decimal | Self::DateTime | Self::Duration | Self::Version | Self::Uri
            | Self::Uuid => {
                format!("{value_expr}.parse::<{}>()", underlying.type_name())
            }

            Self::Enum { .. } | Self::Optional(_) => unreachable!("handled above"),
        }
    }
}

/// Decimal syntax: optional sign, digits with at most one decimal point,
/// at least one digit overall. Exponents are not part of the grammar.
fn is_valid_decimal(raw: &str) -> bool {
    let body = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if body.is_empty() {
        return false;
    }

    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in body.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }

    seen_digit
}

/// Date-time validity: RFC 3339, `YYYY-MM-DDTHH:MM:SS`, a space-separated
/// equivalent, or a bare calendar date. Impossible dates (`2024-02-30`) fail
/// the calendar check inside chrono.
fn is_valid_datetime(raw: &str) -> bool {
    DateTime::parse_from_rfc3339(raw).is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

/// Duration notation: `[-][d.]hh:mm[:ss[.frac]]`, or a bare integer meaning
/// whole days. Minutes and seconds must stay below 60 and hours below 24;
/// anything larger belongs in the day component.
fn is_valid_duration(raw: &str) -> bool {
    let body = raw.strip_prefix('-').unwrap_or(raw);
    if body.is_empty() {
        return false;
    }

    // Bare day count.
    if body.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    let (days, clock) = match body.split_once('.') {
        // A leading "d." prefix only; a '.' later on starts the fraction.
        Some((d, rest)) if d.chars().all(|c| c.is_ascii_digit()) && rest.contains(':') => {
            (Some(d), rest)
        }
        _ => (None, body),
    };

    if days.is_some_and(str::is_empty) {
        return false;
    }

    let mut parts = clock.split(':');
    let (Some(hh), Some(mm)) = (parts.next(), parts.next()) else {
        return false;
    };

    let Ok(hours) = hh.parse::<u32>() else {
        return false;
    };
    if hours >= 24 {
        return false;
    }

    let Ok(minutes) = mm.parse::<u32>() else {
        return false;
    };
    if minutes >= 60 {
        return false;
    }

    if let Some(ss) = parts.next() {
        let (sec, frac) = ss.split_once('.').unwrap_or((ss, "0"));
        let Ok(seconds) = sec.parse::<u32>() else {
            return false;
        };
        if seconds >= 60 || frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
    }

    parts.next().is_none()
}

/// Version syntax: two to four dot-separated non-negative integers.
fn is_valid_version(raw: &str) -> bool {
    let parts: Vec<&str> = raw.split('.').collect();
    (2..=4).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.parse::<u64>().is_ok())
}
