//! Type representation for call handle descriptors.
//!
//! Defines the `Ty` enum used as the parameter and return types of a call
//! handle signature, and the named type constructor `TyCon`. Handle types
//! nest through `Ty::FnPtr`, so a handle taking another handle as its first
//! parameter is an ordinary `Ty`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sig::HandleType;

/// A named type -- `int`, `string`, `object`, or a user class.
///
/// Type constructors are identified by name only. Whether two named types
/// convert to each other is decided by a [`TypeRelations`] oracle, never
/// by this crate.
///
/// [`TypeRelations`]: crate::oracle::TypeRelations
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TyCon {
    pub name: String,
}

impl TyCon {
    pub fn new(name: impl Into<String>) -> Self {
        TyCon { name: name.into() }
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A descriptor type.
///
/// - `Con`: a named type (int, string, object, classes)
/// - `Ptr`: a data pointer `T*`
/// - `VoidPtr`: the untyped pointer `void*`
/// - `FnPtr`: a native call handle
/// - `Void`: the empty return type
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ty {
    /// A named type constructor.
    Con(TyCon),
    /// A typed data pointer: `int*`.
    Ptr(Box<Ty>),
    /// The untyped pointer: `void*`.
    VoidPtr,
    /// A call handle: `delegate*<int, void>`.
    FnPtr(Box<HandleType>),
    /// `void`, only meaningful as a by-value return type.
    Void,
}

impl Ty {
    /// Create a named type.
    pub fn con(name: impl Into<String>) -> Ty {
        Ty::Con(TyCon::new(name))
    }

    /// Create an `int` type.
    pub fn int() -> Ty {
        Ty::con("int")
    }

    /// Create a `long` type.
    pub fn long() -> Ty {
        Ty::con("long")
    }

    /// Create a `bool` type.
    pub fn bool() -> Ty {
        Ty::con("bool")
    }

    /// Create a `string` type.
    pub fn string() -> Ty {
        Ty::con("string")
    }

    /// Create the root reference type `object`.
    pub fn object() -> Ty {
        Ty::con("object")
    }

    /// Create a typed data pointer `T*`.
    pub fn ptr(inner: Ty) -> Ty {
        Ty::Ptr(Box::new(inner))
    }

    /// Create a call handle type.
    pub fn fn_ptr(handle: HandleType) -> Ty {
        Ty::FnPtr(Box::new(handle))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Ty::Void)
    }

    /// Pointer-category types: data pointers, `void*`, and call handles.
    pub fn is_pointer(&self) -> bool {
        matches!(self, Ty::Ptr(_) | Ty::VoidPtr | Ty::FnPtr(_))
    }

    /// Whether a call handle appears anywhere inside this type, including
    /// behind data pointers (`delegate*<void>*`).
    pub fn contains_handle(&self) -> bool {
        match self {
            Ty::FnPtr(_) => true,
            Ty::Ptr(inner) => inner.contains_handle(),
            Ty::Con(_) | Ty::VoidPtr | Ty::Void => false,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Con(c) => write!(f, "{}", c),
            Ty::Ptr(inner) => write!(f, "{}*", inner),
            Ty::VoidPtr => write!(f, "void*"),
            Ty::FnPtr(handle) => write!(f, "{}", handle),
            Ty::Void => write!(f, "void"),
        }
    }
}
