//! Surface hashing and key derivation.
//!
//! The obfuscation key is never configured or stored: it is recomputed from
//! a hash of the public member surface of the consuming program, once at
//! generation time and once at run time. The two computations must agree
//! byte-for-byte, so everything here is deterministic and free of random or
//! time-based input, and all sorting is ordinal (byte-wise), never
//! locale-aware.
//!
//! Any change to the public surface between generation and execution
//! invalidates previously generated ciphertext. That is an accepted,
//! documented limitation of the scheme, not a defect.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

/// A 32-byte symmetric key derived from a program surface.
///
/// For a given (name, version, surface) triple the key is bit-for-bit
/// reproducible; this is the linchpin invariant of the obfuscation scheme.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DerivedKey(pub [u8; 32]);

impl DerivedKey {
    /// The raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs.
        f.write_str("DerivedKey(..)")
    }
}

/// One publicly visible member of a type.
///
/// Constructors, static initializers, and compiler-synthesized members are
/// excluded by the enumerator before they get here. Optional-of-T wrappers
/// must be unwrapped to T when naming types, so that presence or absence of
/// optionality does not change the derived key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Member {
    /// A method with its return type and parameter list.
    Method {
        /// The method name.
        name: String,

        /// The (unwrapped) return type name.
        return_type: String,

        /// Parameter `(name, type)` pairs in declaration order.
        params: Vec<(String, String)>,
    },

    /// A non-method member (field or property).
    Field {
        /// The member name.
        name: String,
    },
}

impl Member {
    /// Renders the canonical signature string for hashing.
    ///
    /// Methods render as `M:name:returnType:p1Name:p1Type,p2Name:p2Type,...`;
    /// non-method members render with the `F:` field marker prefix.
    #[must_use]
    pub fn signature(&self) -> String {
        match self {
            Self::Field { name } => format!("F:{name}"),
            Self::Method {
                name,
                return_type,
                params,
            } => {
                if params.is_empty() {
                    return format!("M:{name}:{return_type}");
                }
                let list = params
                    .iter()
                    .map(|(pn, pt)| format!("{pn}:{pt}"))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("M:{name}:{return_type}:{list}")
            }
        }
    }
}

/// The public surface of one type: its name plus member signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSurface {
    /// The type name.
    pub name: String,

    /// Publicly visible members, in any order.
    pub members: Vec<Member>,
}

impl TypeSurface {
    /// Creates a type surface.
    pub fn new(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// Hashes this type: SHA-256 over `typeName|sig1,sig2,...` with
    /// signatures lowercased and sorted ordinally, rendered as base64.
    #[must_use]
    pub fn hash(&self) -> String {
        let mut signatures: Vec<String> = self
            .members
            .iter()
            .map(|m| m.signature().to_lowercase())
            .collect();
        signatures.sort_unstable();

        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update(b"|");
        hasher.update(signatures.join(",").as_bytes());

        BASE64.encode(hasher.finalize())
    }
}

/// The full hashing input: program identity plus every type's surface.
///
/// Derived fresh on every key-derivation call, never cached across distinct
/// inputs, because it must reflect exactly the surface visible at that call
/// site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    /// The program (assembly/crate) name.
    pub name: String,

    /// The program version string.
    pub version: String,

    /// Public surfaces of every type in the program unit.
    pub types: Vec<TypeSurface>,
}

impl SurfaceDescriptor {
    /// Creates a surface descriptor.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        types: Vec<TypeSurface>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            types,
        }
    }

    /// Drops the named field members from every type surface.
    ///
    /// The obfuscated fields themselves must be excluded from the surface
    /// walk, or the key would depend on its own ciphertext. Enumerators call
    /// this with the group's obfuscated field names before key derivation.
    #[must_use]
    pub fn without_fields(mut self, names: &[&str]) -> Self {
        for ty in &mut self.types {
            ty.members.retain(|m| match m {
                Member::Field { name } => !names.contains(&name.as_str()),
                Member::Method { .. } => true,
            });
        }
        self
    }
}

/// The pluggable collaborator that lists the public members of a program
/// unit: the one being compiled at generation time, the one executing at run
/// time. Both sides must use identical enumeration and exclusion rules or
/// the derived keys will not agree.
pub trait SurfaceEnumerator {
    /// Produces the surface descriptor for the target program unit.
    fn enumerate(&self) -> SurfaceDescriptor;
}

/// Derives the 32-byte obfuscation key from a program surface.
///
/// Per-type hashes are computed by [`TypeSurface::hash`], sorted ordinally,
/// and folded into a final SHA-256 over `name|version|hash1|hash2|...`.
#[must_use]
pub fn derive_key(surface: &SurfaceDescriptor) -> DerivedKey {
    let mut type_hashes: Vec<String> = surface.types.iter().map(TypeSurface::hash).collect();
    type_hashes.sort_unstable();

    let mut combined = String::with_capacity(
        surface.name.len() + surface.version.len() + type_hashes.len() * 45,
    );
    combined.push_str(&surface.name);
    combined.push('|');
    combined.push_str(&surface.version);
    for hash in &type_hashes {
        combined.push('|');
        combined.push_str(hash);
    }

    let digest = Sha256::digest(combined.as_bytes());
    DerivedKey(digest.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_surface() -> SurfaceDescriptor {
        SurfaceDescriptor::new(
            "demo",
            "1.0.0",
            vec![
                TypeSurface::new(
                    "AppConfig",
                    vec![
                        Member::Field {
                            name: "api_url".into(),
                        },
                        Member::Method {
                            name: "reload".into(),
                            return_type: "bool".into(),
                            params: vec![("force".into(), "bool".into())],
                        },
                    ],
                ),
                TypeSurface::new(
                    "Client",
                    vec![Member::Method {
                        name: "fetch".into(),
                        return_type: "string".into(),
                        params: vec![],
                    }],
                ),
            ],
        )
    }

    #[test]
    fn method_signature_format() {
        let m = Member::Method {
            name: "connect".into(),
            return_type: "bool".into(),
            params: vec![
                ("host".into(), "string".into()),
                ("port".into(), "u16".into()),
            ],
        };
        assert_eq!(m.signature(), "M:connect:bool:host:string,port:u16");

        let no_params = Member::Method {
            name: "close".into(),
            return_type: "unit".into(),
            params: vec![],
        };
        assert_eq!(no_params.signature(), "M:close:unit");
    }

    #[test]
    fn field_signature_has_marker_prefix() {
        let f = Member::Field {
            name: "timeout".into(),
        };
        assert_eq!(f.signature(), "F:timeout");
    }

    #[test]
    fn derive_key_is_deterministic() {
        let a = derive_key(&sample_surface());
        let b = derive_key(&sample_surface());
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn member_order_does_not_change_the_key() {
        let mut reordered = sample_surface();
        reordered.types[0].members.reverse();
        assert_eq!(
            derive_key(&sample_surface()).as_bytes(),
            derive_key(&reordered).as_bytes()
        );
    }

    #[test]
    fn type_order_does_not_change_the_key() {
        let mut reordered = sample_surface();
        reordered.types.reverse();
        assert_eq!(
            derive_key(&sample_surface()).as_bytes(),
            derive_key(&reordered).as_bytes()
        );
    }

    #[test]
    fn surface_change_changes_the_key() {
        let mut drifted = sample_surface();
        drifted.types[0].members.push(Member::Field {
            name: "extra".into(),
        });
        assert_ne!(
            derive_key(&sample_surface()).as_bytes(),
            derive_key(&drifted).as_bytes()
        );
    }

    #[test]
    fn version_change_changes_the_key() {
        let mut bumped = sample_surface();
        bumped.version = "1.0.1".into();
        assert_ne!(
            derive_key(&sample_surface()).as_bytes(),
            derive_key(&bumped).as_bytes()
        );
    }

    #[test]
    fn without_fields_excludes_named_members() {
        let trimmed = sample_surface().without_fields(&["api_url"]);
        assert!(trimmed.types[0].members.iter().all(|m| !matches!(
            m,
            Member::Field { name } if name == "api_url"
        )));
        // Methods are untouched.
        assert!(
            trimmed.types[0]
                .members
                .iter()
                .any(|m| matches!(m, Member::Method { .. }))
        );
    }

    #[test]
    fn excluding_an_obfuscated_field_changes_the_key() {
        let full = derive_key(&sample_surface());
        let trimmed = derive_key(&sample_surface().without_fields(&["api_url"]));
        assert_ne!(full.as_bytes(), trimmed.as_bytes());
    }

    #[test]
    fn debug_does_not_leak_key_material() {
        let key = derive_key(&sample_surface());
        assert_eq!(format!("{key:?}"), "DerivedKey(..)");
    }
}
