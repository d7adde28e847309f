//! String transformation: `${name}` interpolation and literal escaping.
//!
//! Two independent, composable operations. Interpolation substitutes nested
//! variable references from the source map in a single, non-recursive pass.
//! Escaping makes a string value safe for embedding inside a delimited
//! literal, in one of two mutually exclusive modes: backslash quoting, or
//! raw-string delimiter escalation. Escaping is skipped entirely for values
//! about to be obfuscated, since ciphertext is base64 and never needs it.

use crate::error::Error;
use crate::source::SourceMap;

/// Substitutes `${name}` placeholders from the source map.
///
/// Lookup names are upper-cased first when `constant_case` is set, matching
/// the group policy. A missing name on a non-optional field records a
/// [`Error::MissingVariable`] fault and leaves the placeholder text in place
/// so the caller can still report a location-accurate diagnostic; optional
/// fields substitute nothing silently. Substituted values are not re-scanned
/// for further placeholders.
pub fn interpolate(
    value: &str,
    map: &SourceMap,
    constant_case: bool,
    optional: bool,
) -> (String, Vec<Error>) {
    let mut out = String::with_capacity(value.len());
    let mut errors = Vec::new();
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated placeholder; keep the tail verbatim.
            break;
        };

        out.push_str(&rest[..start]);

        let raw_name = after[..end].trim();
        let name = if constant_case {
            raw_name.to_uppercase()
        } else {
            raw_name.to_string()
        };

        match map.get(&name) {
            Some(replacement) => out.push_str(replacement),
            None if optional => {}
            None => {
                errors.push(Error::missing(&name));
                // Keep the placeholder so diagnostics can point at it.
                out.push_str(&rest[start..start + 2 + end + 1]);
            }
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    (out, errors)
}

/// Escape sequences recognized by [`escape_quoted`]; already-escaped text
/// passes through untouched so the operation is idempotent.
fn recognized_escape_len(bytes: &[u8]) -> Option<usize> {
    match bytes.get(1)? {
        b'\\' | b'"' | b'n' | b'r' | b't' | b'0' => Some(2),
        b'u' => {
            let hex = bytes.get(2..6)?;
            hex.iter()
                .all(u8::is_ascii_hexdigit)
                .then_some(6)
        }
        _ => None,
    }
}

/// Backslash-escapes quote and control characters for a quoted literal.
///
/// Characters that are already part of a recognized escape sequence are left
/// alone, so applying this twice never double-escapes.
#[must_use]
pub fn escape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let bytes = value.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if let Some(len) = recognized_escape_len(&bytes[i..]) {
                out.push_str(&value[i..i + len]);
                i += len;
                continue;
            }
            // A lone backslash before anything else stays verbatim.
            out.push('\\');
            i += 1;
            continue;
        }

        // bytes[i] is ASCII here for every case we rewrite, so indexing by
        // byte stays on a char boundary.
        match bytes[i] {
            b'"' => out.push_str("\\\""),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                out.push_str(&format!("\\u{c:04x}"));
            }
            _ => {
                let c = value[i..].chars().next().unwrap_or('\u{FFFD}');
                out.push(c);
                i += c.len_utf8();
                continue;
            }
        }
        i += 1;
    }

    out
}

/// Wraps a value in a raw-string delimiter of escalating length.
///
/// The delimiter is three or more repeated quote characters, one more than
/// the longest run of consecutive quotes already present, so the value can
/// never terminate the literal early. Raw mode never processes backslashes;
/// any literal occurrence of the delimiter substring is replaced with
/// delimiter-plus-quote.
#[must_use]
pub fn escape_raw(value: &str) -> String {
    let longest_run = value
        .split(|c| c != '"')
        .map(str::len)
        .max()
        .unwrap_or(0);

    let delimiter = "\"".repeat((longest_run + 1).max(3));
    let escaped = value.replace(&delimiter, &format!("{delimiter}\""));

    format!("{delimiter}{escaped}{delimiter}")
}
