//! Source maps and origin attribution for resolved values.
//!
//! A [`SourceMap`] is the name→value table loaded from a `.env`-style file.
//! Every resolved value carries an [`Origin`] tag recording which tier of the
//! precedence chain produced it, and [`GroupSources`] collects those tags per
//! field for debugging and auditing a generation pass.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::path::Path;

/// Name→value table loaded from the external `.env`-style collaborator.
///
/// Keys are unique and case-sensitive; insertion order is irrelevant.
/// Read-only for the resolution engine: the map is a snapshot taken before
/// resolution begins.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    values: HashMap<String, String>,
}

impl SourceMap {
    /// Creates an empty source map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a source map from a `.env`-style file.
    ///
    /// Returns the map together with a "file was found" signal. A missing
    /// file yields an empty map and `false`; whether that aborts the group
    /// is the resolver's decision, driven by the require-source flag.
    ///
    /// Values are trimmed of surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, bool), dotenvy::Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Self::new(), false));
        }

        let mut values = HashMap::new();
        for entry in dotenvy::from_path_iter(path)? {
            let (key, value) = entry?;
            values.insert(key, value.trim().to_string());
        }

        Ok((Self { values }, true))
    }

    /// Inserts a value, replacing any previous value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Looks up a value by exact, case-sensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SourceMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Which tier of the precedence chain produced a resolved value.
///
/// The tie-break rule: the source map always wins over the live process
/// environment; defaults are the last resort before optionality is evaluated.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Origin {
    /// Value came from the loaded source map.
    SourceMap,

    /// Value came from a live process environment variable.
    Environment,

    /// Value came from the configured default.
    Default,

    /// No value from any tier (optional fields only).
    NotSet,
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceMap => write!(f, "Source map"),
            Self::Environment => write!(f, "Environment variable"),
            Self::Default => write!(f, "Default value"),
            Self::NotSet => write!(f, "Not set"),
        }
    }
}

/// A raw resolved value plus the tier it came from.
///
/// Produced by the resolver and consumed immediately by the downstream
/// transformation stages; not retained between fields.
#[derive(Clone, Debug)]
pub struct ResolvedValue {
    /// The raw string value, or `None` for an optional field with no value.
    pub value: Option<String>,

    /// Where the value originated.
    pub origin: Origin,
}

impl ResolvedValue {
    /// Creates a resolved value.
    pub fn new(value: impl Into<String>, origin: Origin) -> Self {
        Self {
            value: Some(value.into()),
            origin,
        }
    }

    /// Creates the "no value" outcome for an optional field.
    #[must_use]
    pub const fn not_set() -> Self {
        Self {
            value: None,
            origin: Origin::NotSet,
        }
    }
}

/// Origin attribution for every field resolved in one group pass.
///
/// # Display Output
///
/// ```text
/// Resolution origins:
/// --------------------------------------------------
///   api_url  <- Source map [API_URL]
///   port     <- Default value [PORT]
/// ```
#[derive(Clone, Debug, Default)]
pub struct GroupSources {
    entries: Vec<(String, String, Origin)>,
}

impl GroupSources {
    /// Creates an empty attribution table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records the origin for a field.
    pub fn add(&mut self, field: impl Into<String>, var: impl Into<String>, origin: Origin) {
        self.entries.push((field.into(), var.into(), origin));
    }

    /// Looks up the variable name and origin recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<(&str, &Origin)> {
        self.entries
            .iter()
            .find(|(name, _, _)| name == field)
            .map(|(_, var, origin)| (var.as_str(), origin))
    }

    /// Iterates over `(field, variable, origin)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Origin)> {
        self.entries
            .iter()
            .map(|(f, v, o)| (f.as_str(), v.as_str(), o))
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Display for GroupSources {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolution origins:")?;
        writeln!(f, "{}", "-".repeat(50))?;

        let max_len = self
            .entries
            .iter()
            .map(|(name, _, _)| name.len())
            .max()
            .unwrap_or(0);

        for (field, var, origin) in &self.entries {
            writeln!(f, "  {field:<max_len$}  <- {origin} [{var}]")?;
        }

        Ok(())
    }
}
