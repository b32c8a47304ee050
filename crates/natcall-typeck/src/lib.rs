//! Type checking for native call handles.
//!
//! A call handle (`delegate* unmanaged[Cdecl]<int, void>`) is a pointer to a
//! function rather than to data. This crate models handle signatures, decides
//! which handle conversions exist, binds `&name` over a group of overloads to
//! a handle type, and produces the persisted form of a signature.
//!
//! # Architecture
//!
//! - [`ty`]: Descriptor types (`Ty`, `TyCon`)
//! - [`sig`]: Signatures, passing modes, and `HandleType`
//! - [`convention`]: Calling-convention tags and the registry
//! - [`oracle`]: Traits for the type checker services this crate consumes
//! - [`builtins`]: Reference implementations of those services
//! - [`convert`]: Handle and `void*` conversions
//! - [`bind`]: Address-of binding over function groups
//! - [`modifiers`]: Encoding of `in`/`out`/`ref readonly` as custom modifiers
//! - [`usage`]: Where handle types may appear
//! - [`error`]: Error types
//! - [`diagnostics`]: Ariadne rendering of errors

pub mod bind;
pub mod builtins;
pub mod convention;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod modifiers;
pub mod oracle;
pub mod sig;
pub mod ty;
pub mod usage;

pub use crate::bind::{BindTarget, BoundHandle, CandidateBinder, CandidateSet, FunctionDecl};
pub use crate::convention::{ConventionFamily, ConventionRegistry, ConventionTag};
pub use crate::convert::{
    classify_conversion, convertible, ConversionDirection, HandleConversion, PointerOperand,
};
pub use crate::error::HandleError;
pub use crate::sig::{HandleType, Signature};
pub use crate::ty::Ty;
