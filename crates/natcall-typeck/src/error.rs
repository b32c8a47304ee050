//! Error types for call handle type checking.
//!
//! Each stage has its own error enum, and every variant carries the detail
//! a diagnostic needs: which parameter, which rule, which types. None of
//! these are fatal; the caller reports them and keeps compiling.
//! `HandleError` wraps all of them so stages can be chained with `?`.

use std::fmt;

use crate::convention::ConventionTag;
use crate::sig::{DescriptorPosition, ParamMode, RefKeyword, ReturnDescriptor, Signature};
use crate::ty::Ty;

/// A signature could not be constructed from its declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstructionError {
    /// The modifier keywords on one descriptor do not form a passing mode,
    /// e.g. `out in int` or `readonly int`.
    InvalidModifierCombination {
        position: DescriptorPosition,
        modifiers: Vec<RefKeyword>,
    },
    /// `out` written on a return type.
    InvalidOutOnReturn,
    /// `void` used as a parameter type.
    VoidParameter { index: usize },
    /// `ref void` / `ref readonly void` as the return.
    ByRefVoidReturn,
}

/// Why one handle (or `void*`) does not convert to another.
///
/// Variants are listed in the order the rules are checked; the first rule
/// that fails is the one reported.
#[derive(Clone, Debug, PartialEq)]
pub enum ConversionError {
    /// `void*` to a handle type without a cast.
    ExplicitConversionRequired { target: Signature },
    ParameterCount { source: usize, target: usize },
    ModeMismatch {
        index: usize,
        source: ParamMode,
        target: ParamMode,
    },
    TypeMismatch { index: usize, source: Ty, target: Ty },
    ReturnMismatch {
        source: ReturnDescriptor,
        target: ReturnDescriptor,
    },
    ConventionMismatch {
        source: ConventionTag,
        target: ConventionTag,
    },
}

/// Binding an address-of expression over a function group failed.
#[derive(Clone, Debug, PartialEq)]
pub enum BindError {
    /// No target handle type and the group does not have exactly one
    /// static member.
    AmbiguousGroup { name: String, count: usize },
    /// No static member is applicable to the target signature.
    NoApplicableCandidate { name: String },
    /// Several members are applicable and none is better than the rest.
    Ambiguous {
        name: String,
        candidates: Vec<Signature>,
    },
    /// The best member's full signature does not convert to the target.
    SignatureMismatch {
        name: String,
        candidate: Signature,
        reason: ConversionError,
    },
}

/// A persisted signature could not be decoded.
#[derive(Clone, Debug, PartialEq)]
pub enum EncodingError {
    /// The output marker on a return descriptor.
    InvalidOutOnReturn,
    /// Both the read-only and the output marker on one descriptor.
    ConflictingMarkers { position: DescriptorPosition },
    /// A required marker on a descriptor that is not by reference.
    MarkerWithoutReference { position: DescriptorPosition },
    /// The convention byte is neither built in nor registered.
    UnknownConvention { code: u8 },
}

/// A handle type used where pointer-category types are not allowed.
#[derive(Clone, Debug, PartialEq)]
pub enum UsageError {
    RequiresUnsafeContext { ty: Ty },
    HandleAsTypeArgument { ty: Ty },
    HandleBoxing { ty: Ty },
}

/// Registering an extension convention failed.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryError {
    /// The name belongs to a built-in convention.
    ReservedName { name: String },
    /// An extension tag claimed a byte below the extension range.
    ReservedCode { code: u8 },
    /// Every convention byte from the extension base up is taken.
    CodeSpaceExhausted,
}

/// Any error produced while checking call handles.
#[derive(Clone, Debug, PartialEq)]
pub enum HandleError {
    Construction(ConstructionError),
    Conversion(ConversionError),
    Bind(BindError),
    Encoding(EncodingError),
    Usage(UsageError),
}

impl From<ConstructionError> for HandleError {
    fn from(err: ConstructionError) -> Self {
        HandleError::Construction(err)
    }
}

impl From<ConversionError> for HandleError {
    fn from(err: ConversionError) -> Self {
        HandleError::Conversion(err)
    }
}

impl From<BindError> for HandleError {
    fn from(err: BindError) -> Self {
        HandleError::Bind(err)
    }
}

impl From<EncodingError> for HandleError {
    fn from(err: EncodingError) -> Self {
        HandleError::Encoding(err)
    }
}

impl From<UsageError> for HandleError {
    fn from(err: UsageError) -> Self {
        HandleError::Usage(err)
    }
}

fn join_keywords(modifiers: &[RefKeyword]) -> String {
    modifiers
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionError::InvalidModifierCombination {
                position,
                modifiers,
            } => {
                write!(
                    f,
                    "invalid modifier combination `{}` on {}",
                    join_keywords(modifiers),
                    position
                )
            }
            ConstructionError::InvalidOutOnReturn => {
                write!(f, "return type cannot be `out`")
            }
            ConstructionError::VoidParameter { index } => {
                write!(f, "parameter {} cannot have type `void`", index + 1)
            }
            ConstructionError::ByRefVoidReturn => {
                write!(f, "`void` cannot be returned by reference")
            }
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::ExplicitConversionRequired { target } => {
                write!(
                    f,
                    "cannot implicitly convert `void*` to `{}`; an explicit cast is required",
                    target
                )
            }
            ConversionError::ParameterCount { source, target } => {
                write!(
                    f,
                    "parameter count mismatch: source has {}, target has {}",
                    source, target
                )
            }
            ConversionError::ModeMismatch {
                index,
                source,
                target,
            } => {
                write!(
                    f,
                    "parameter {} passing mode mismatch: source is `{}`, target is `{}`",
                    index + 1,
                    source,
                    target
                )
            }
            ConversionError::TypeMismatch {
                index,
                source,
                target,
            } => {
                write!(
                    f,
                    "parameter {} type mismatch: `{}` does not convert to `{}`",
                    index + 1,
                    source,
                    target
                )
            }
            ConversionError::ReturnMismatch { source, target } => {
                write!(
                    f,
                    "return type mismatch: source returns `{}`, target returns `{}`",
                    source, target
                )
            }
            ConversionError::ConventionMismatch { source, target } => {
                write!(
                    f,
                    "calling convention mismatch: `{}` vs `{}`",
                    source, target
                )
            }
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::AmbiguousGroup { name, count } => {
                write!(
                    f,
                    "cannot take the address of `{}`: {} static overloads and no target type",
                    name, count
                )
            }
            BindError::NoApplicableCandidate { name } => {
                write!(f, "no static overload of `{}` matches the target", name)
            }
            BindError::Ambiguous { name, candidates } => {
                let list: Vec<String> = candidates.iter().map(|c| c.to_string()).collect();
                write!(
                    f,
                    "ambiguous address of `{}` between [{}]",
                    name,
                    list.join(", ")
                )
            }
            BindError::SignatureMismatch {
                name,
                candidate,
                reason,
            } => {
                write!(
                    f,
                    "`{}` with signature `{}` does not match the target: {}",
                    name, candidate, reason
                )
            }
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingError::InvalidOutOnReturn => {
                write!(f, "output marker is not allowed on the return type")
            }
            EncodingError::ConflictingMarkers { position } => {
                write!(f, "conflicting read-only and output markers on {}", position)
            }
            EncodingError::MarkerWithoutReference { position } => {
                write!(f, "passing-mode marker on by-value {}", position)
            }
            EncodingError::UnknownConvention { code } => {
                write!(f, "unknown calling convention byte 0x{:02x}", code)
            }
        }
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::RequiresUnsafeContext { ty } => {
                write!(f, "`{}` may only be used in an unsafe context", ty)
            }
            UsageError::HandleAsTypeArgument { ty } => {
                write!(f, "`{}` cannot be used as a type argument", ty)
            }
            UsageError::HandleBoxing { ty } => {
                write!(f, "`{}` cannot be converted to `object`", ty)
            }
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::ReservedName { name } => {
                write!(f, "calling convention `{}` is built in", name)
            }
            RegistryError::ReservedCode { code } => {
                write!(f, "calling convention byte 0x{:02x} is reserved", code)
            }
            RegistryError::CodeSpaceExhausted => {
                write!(f, "no calling convention bytes left for extensions")
            }
        }
    }
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleError::Construction(err) => write!(f, "{}", err),
            HandleError::Conversion(err) => write!(f, "{}", err),
            HandleError::Bind(err) => write!(f, "{}", err),
            HandleError::Encoding(err) => write!(f, "{}", err),
            HandleError::Usage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ConstructionError {}
impl std::error::Error for ConversionError {}
impl std::error::Error for BindError {}
impl std::error::Error for EncodingError {}
impl std::error::Error for UsageError {}
impl std::error::Error for RegistryError {}
impl std::error::Error for HandleError {}
