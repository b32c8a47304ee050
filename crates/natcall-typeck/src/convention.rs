//! Calling-convention tags and the convention registry.
//!
//! Every call handle carries exactly one `ConventionTag`. Tags fall into two
//! families, managed and unmanaged, and two tags are compatible only when
//! they are equal. Extension conventions are registered at setup time and
//! need no special casing anywhere else, since compatibility never looks at
//! which tag it is comparing.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// First convention byte handed out to extension conventions.
pub const EXTENSION_CODE_BASE: u8 = 0x10;

/// The two convention families. Conversions never cross families.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConventionFamily {
    Managed,
    Unmanaged,
}

/// A convention registered after startup, e.g. `unmanaged[SuppressGCTransition]`.
///
/// Only [`ConventionRegistry::register`] hands these out, so an extension
/// never shares a byte with a built-in convention.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawExtensionTag")]
pub struct ExtensionTag {
    code: u8,
    name: String,
}

impl ExtensionTag {
    /// The byte this convention is persisted as.
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Display name as it was registered.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Deserialize)]
struct RawExtensionTag {
    code: u8,
    name: String,
}

impl TryFrom<RawExtensionTag> for ExtensionTag {
    type Error = RegistryError;

    fn try_from(raw: RawExtensionTag) -> Result<Self, Self::Error> {
        if raw.code < EXTENSION_CODE_BASE {
            return Err(RegistryError::ReservedCode { code: raw.code });
        }
        Ok(ExtensionTag {
            code: raw.code,
            name: raw.name,
        })
    }
}

/// A calling-convention tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConventionTag {
    /// The runtime's own convention; the only member of the managed family.
    Managed,
    Cdecl,
    Stdcall,
    Thiscall,
    /// The platform default unmanaged convention (`unmanaged` with no list).
    UnmanagedDefault,
    /// A convention added through [`ConventionRegistry::register`].
    Extension(ExtensionTag),
}

impl ConventionTag {
    pub fn family(&self) -> ConventionFamily {
        match self {
            ConventionTag::Managed => ConventionFamily::Managed,
            _ => ConventionFamily::Unmanaged,
        }
    }

    /// The persisted convention byte.
    pub fn code(&self) -> u8 {
        match self {
            ConventionTag::Managed => 0x00,
            ConventionTag::Cdecl => 0x01,
            ConventionTag::Stdcall => 0x02,
            ConventionTag::Thiscall => 0x03,
            ConventionTag::UnmanagedDefault => 0x09,
            ConventionTag::Extension(ext) => ext.code,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ConventionTag::Managed => "managed",
            ConventionTag::Cdecl => "Cdecl",
            ConventionTag::Stdcall => "Stdcall",
            ConventionTag::Thiscall => "Thiscall",
            ConventionTag::UnmanagedDefault => "unmanaged",
            ConventionTag::Extension(ext) => &ext.name,
        }
    }
}

impl fmt::Display for ConventionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConventionTag::Managed => write!(f, "managed"),
            ConventionTag::UnmanagedDefault => write!(f, "unmanaged"),
            other => write!(f, "unmanaged[{}]", other.name()),
        }
    }
}

/// Family of a tag.
pub fn family_of(tag: &ConventionTag) -> ConventionFamily {
    tag.family()
}

/// Two conventions are compatible only when they are the same tag. Even two
/// unmanaged conventions (cdecl vs stdcall) disagree on stack layout.
pub fn are_compatible(a: &ConventionTag, b: &ConventionTag) -> bool {
    a == b
}

/// Name and byte lookup for convention tags.
///
/// Seeded with the built-in tags by [`ConventionRegistry::new`]. Extension
/// conventions are appended during setup; after that the registry is only
/// read, so it can be shared by reference across compilation units.
#[derive(Debug)]
pub struct ConventionRegistry {
    /// Lowercased name -> tag, for both built-in and extension tags.
    by_name: FxHashMap<String, ConventionTag>,
    /// Extension tags in registration order; index `i` has code
    /// `EXTENSION_CODE_BASE + i`.
    extensions: Vec<ExtensionTag>,
}

impl ConventionRegistry {
    /// Create a registry holding only the built-in conventions.
    pub fn new() -> Self {
        let mut by_name = FxHashMap::default();
        for tag in Self::builtin_tags() {
            by_name.insert(tag.name().to_ascii_lowercase(), tag);
        }
        ConventionRegistry {
            by_name,
            extensions: Vec::new(),
        }
    }

    fn builtin_tags() -> [ConventionTag; 5] {
        [
            ConventionTag::Managed,
            ConventionTag::Cdecl,
            ConventionTag::Stdcall,
            ConventionTag::Thiscall,
            ConventionTag::UnmanagedDefault,
        ]
    }

    /// Register an extension convention and return its tag.
    ///
    /// Registering a name twice returns the tag from the first registration.
    /// Built-in names cannot be re-registered.
    pub fn register(&mut self, name: &str) -> Result<ConventionTag, RegistryError> {
        let key = name.to_ascii_lowercase();
        if let Some(existing) = self.by_name.get(&key) {
            return match existing {
                ConventionTag::Extension(_) => Ok(existing.clone()),
                _ => Err(RegistryError::ReservedName {
                    name: name.to_string(),
                }),
            };
        }

        let code = u8::try_from(EXTENSION_CODE_BASE as usize + self.extensions.len())
            .map_err(|_| RegistryError::CodeSpaceExhausted)?;
        let ext = ExtensionTag {
            code,
            name: name.to_string(),
        };
        self.extensions.push(ext.clone());
        let tag = ConventionTag::Extension(ext);
        self.by_name.insert(key, tag.clone());
        tracing::debug!(convention = name, code, "registered extension convention");
        Ok(tag)
    }

    /// Resolve a convention name as written in source (case-insensitive).
    pub fn resolve(&self, name: &str) -> Option<ConventionTag> {
        self.by_name.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Map a persisted convention byte back to its tag.
    pub fn from_code(&self, code: u8) -> Option<ConventionTag> {
        if let Some(tag) = Self::builtin_tags().into_iter().find(|t| t.code() == code) {
            return Some(tag);
        }
        let index = code.checked_sub(EXTENSION_CODE_BASE)? as usize;
        self.extensions
            .get(index)
            .map(|ext| ConventionTag::Extension(ext.clone()))
    }

    /// Number of registered extension conventions.
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }
}

impl Default for ConventionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_is_alone_in_its_family() {
        assert_eq!(family_of(&ConventionTag::Managed), ConventionFamily::Managed);
        for tag in [
            ConventionTag::Cdecl,
            ConventionTag::Stdcall,
            ConventionTag::Thiscall,
            ConventionTag::UnmanagedDefault,
        ] {
            assert_eq!(family_of(&tag), ConventionFamily::Unmanaged);
        }
    }

    #[test]
    fn compatibility_is_exact_match() {
        assert!(are_compatible(&ConventionTag::Cdecl, &ConventionTag::Cdecl));
        assert!(!are_compatible(&ConventionTag::Cdecl, &ConventionTag::Stdcall));
        assert!(!are_compatible(
            &ConventionTag::UnmanagedDefault,
            &ConventionTag::Cdecl
        ));
        assert!(!are_compatible(&ConventionTag::Managed, &ConventionTag::Cdecl));
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = ConventionRegistry::new();
        assert_eq!(registry.resolve("Cdecl"), Some(ConventionTag::Cdecl));
        assert_eq!(registry.resolve("STDCALL"), Some(ConventionTag::Stdcall));
        assert_eq!(registry.resolve("fastcall"), None);
    }

    #[test]
    fn register_extension() {
        let mut registry = ConventionRegistry::new();
        let tag = registry.register("SuppressGCTransition").unwrap();
        assert_eq!(tag.code(), EXTENSION_CODE_BASE);
        assert_eq!(tag.family(), ConventionFamily::Unmanaged);
        assert_eq!(tag.to_string(), "unmanaged[SuppressGCTransition]");

        let again = registry.register("suppressgctransition").unwrap();
        assert_eq!(again, tag);
        assert_eq!(registry.extension_count(), 1);

        let second = registry.register("Vectorcall").unwrap();
        assert_eq!(second.code(), EXTENSION_CODE_BASE + 1);
        assert!(!are_compatible(&tag, &second));
    }

    #[test]
    fn builtin_names_are_reserved() {
        let mut registry = ConventionRegistry::new();
        assert_eq!(
            registry.register("cdecl"),
            Err(RegistryError::ReservedName {
                name: "cdecl".to_string()
            })
        );
    }

    #[test]
    fn code_round_trip() {
        let mut registry = ConventionRegistry::new();
        let ext = registry.register("Vectorcall").unwrap();
        for tag in [
            ConventionTag::Managed,
            ConventionTag::Cdecl,
            ConventionTag::Stdcall,
            ConventionTag::Thiscall,
            ConventionTag::UnmanagedDefault,
            ext,
        ] {
            assert_eq!(registry.from_code(tag.code()), Some(tag));
        }
        assert_eq!(registry.from_code(0x07), None);
        assert_eq!(registry.from_code(EXTENSION_CODE_BASE + 1), None);
    }

    #[test]
    fn extension_tags_cannot_claim_builtin_bytes() {
        let forged = r#"{"Extension":{"code":1,"name":"Fake"}}"#;
        assert!(serde_json::from_str::<ConventionTag>(forged).is_err());

        let mut registry = ConventionRegistry::new();
        let tag = registry.register("Vectorcall").unwrap();
        if let ConventionTag::Extension(ext) = &tag {
            assert_eq!(ext.code(), EXTENSION_CODE_BASE);
            assert_eq!(ext.name(), "Vectorcall");
        }
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(serde_json::from_str::<ConventionTag>(&json).unwrap(), tag);
    }

    #[test]
    fn extension_code_space_runs_out() {
        let mut registry = ConventionRegistry::new();
        let capacity = 256 - EXTENSION_CODE_BASE as usize;
        for i in 0..capacity {
            registry.register(&format!("ext{i}")).unwrap();
        }
        assert_eq!(
            registry.register("one_too_many"),
            Err(RegistryError::CodeSpaceExhausted)
        );
    }
}
