//! The tagged value flowing between resolution and rendering.
//!
//! A value that is about to be embedded is either plain text or ciphertext
//! that a generated decrypt call will unwrap at run time. Making the
//! deferred case a variant (rather than a marker substring inside the value)
//! lets validation and rendering match on it structurally.

/// A resolved value heading for literal embedding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// A plain value, validated and rendered directly.
    Plain(String),

    /// Ciphertext to be decrypted by the compiled program.
    ///
    /// Holds the base64 `iv || ciphertext` envelope. Validation is deferred
    /// to the runtime coercion performed after decryption, since the real
    /// value cannot be known at generation time.
    DeferredDecrypt(String),
}

impl FieldValue {
    /// The plain text, if this value is not deferred.
    #[must_use]
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            Self::Plain(s) => Some(s),
            Self::DeferredDecrypt(_) => None,
        }
    }

    /// Whether this value is a deferred decrypt envelope.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::DeferredDecrypt(_))
    }
}
