//! Conversions between call handles and `void*`.
//!
//! Handle -> `void*` is always implicit. `void*` -> handle needs a cast.
//! Handle -> handle is checked rule by rule, and the first rule that fails
//! is reported:
//!
//! 1. parameter counts match
//! 2. every parameter has the same passing mode
//! 3. by-value parameter types widen from source to target; by-reference
//!    parameter types are identical
//! 4. the return mode matches; a by-value return type widens from target to
//!    source, a by-reference one is identical
//! 5. the conventions are the same tag
//!
//! A cast does not relax any of these. Two handles that differ only in
//! convention never convert, in either direction.

use std::fmt;

use crate::convention::are_compatible;
use crate::error::ConversionError;
use crate::oracle::TypeRelations;
use crate::sig::{structural_equals, HandleType, ParamMode, ReturnDescriptor, Signature};
use crate::ty::Ty;

/// Whether a cast was written.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConversionDirection {
    Implicit,
    Explicit,
}

/// One side of a pointer conversion.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PointerOperand<'a> {
    Handle(&'a HandleType),
    /// `void*`.
    Untyped,
}

impl<'a> PointerOperand<'a> {
    /// The operand for a descriptor type, if it is a handle or `void*`.
    pub fn from_ty(ty: &'a Ty) -> Option<PointerOperand<'a>> {
        match ty {
            Ty::FnPtr(handle) => Some(PointerOperand::Handle(&**handle)),
            Ty::VoidPtr => Some(PointerOperand::Untyped),
            _ => None,
        }
    }
}

impl fmt::Display for PointerOperand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerOperand::Handle(handle) => write!(f, "{}", handle),
            PointerOperand::Untyped => write!(f, "void*"),
        }
    }
}

/// The kind of an accepted conversion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HandleConversion {
    /// Both sides are the same handle type.
    Identity,
    HandleToHandle,
    HandleToUntyped,
    /// Only produced for explicit conversions.
    UntypedToHandle,
    UntypedIdentity,
}

/// Classify the conversion from `source` to `target`, or explain why there
/// is none.
pub fn classify_conversion<R: TypeRelations + ?Sized>(
    relations: &R,
    source: PointerOperand<'_>,
    target: PointerOperand<'_>,
    direction: ConversionDirection,
) -> Result<HandleConversion, ConversionError> {
    let verdict = match (source, target) {
        (PointerOperand::Untyped, PointerOperand::Untyped) => Ok(HandleConversion::UntypedIdentity),
        (PointerOperand::Handle(_), PointerOperand::Untyped) => {
            Ok(HandleConversion::HandleToUntyped)
        }
        (PointerOperand::Untyped, PointerOperand::Handle(handle)) => match direction {
            ConversionDirection::Explicit => Ok(HandleConversion::UntypedToHandle),
            ConversionDirection::Implicit => Err(ConversionError::ExplicitConversionRequired {
                target: handle.signature().clone(),
            }),
        },
        (PointerOperand::Handle(from), PointerOperand::Handle(to)) => {
            convert_signatures(relations, from.signature(), to.signature())
        }
    };
    tracing::trace!(
        source = %source,
        target = %target,
        ?direction,
        accepted = verdict.is_ok(),
        "pointer conversion"
    );
    verdict
}

/// Boolean form of [`classify_conversion`].
pub fn convertible<R: TypeRelations + ?Sized>(
    relations: &R,
    source: PointerOperand<'_>,
    target: PointerOperand<'_>,
    direction: ConversionDirection,
) -> bool {
    classify_conversion(relations, source, target, direction).is_ok()
}

/// Handle-to-handle conversion between two signatures.
///
/// Identical signatures short-circuit to `Identity`; the rules below would
/// accept them anyway.
pub fn convert_signatures<R: TypeRelations + ?Sized>(
    relations: &R,
    source: &Signature,
    target: &Signature,
) -> Result<HandleConversion, ConversionError> {
    if structural_equals(source, target) {
        return Ok(HandleConversion::Identity);
    }

    if source.param_count() != target.param_count() {
        return Err(ConversionError::ParameterCount {
            source: source.param_count(),
            target: target.param_count(),
        });
    }

    let pairs = || source.params().iter().zip(target.params()).enumerate();

    for (index, (from, to)) in pairs() {
        if from.mode != to.mode {
            return Err(ConversionError::ModeMismatch {
                index,
                source: from.mode,
                target: to.mode,
            });
        }
    }

    for (index, (from, to)) in pairs() {
        let ok = match from.mode {
            ParamMode::Value => relations.widens(&from.ty, &to.ty),
            ParamMode::Ref | ParamMode::Out | ParamMode::In => from.ty == to.ty,
        };
        if !ok {
            return Err(ConversionError::TypeMismatch {
                index,
                source: from.ty.clone(),
                target: to.ty.clone(),
            });
        }
    }

    check_return(relations, source.ret(), target.ret())?;

    if !are_compatible(source.convention(), target.convention()) {
        return Err(ConversionError::ConventionMismatch {
            source: source.convention().clone(),
            target: target.convention().clone(),
        });
    }

    Ok(HandleConversion::HandleToHandle)
}

// By-value returns widen target -> source, the reverse of parameters.
fn check_return<R: TypeRelations + ?Sized>(
    relations: &R,
    source: &ReturnDescriptor,
    target: &ReturnDescriptor,
) -> Result<(), ConversionError> {
    let ok = source.mode == target.mode
        && if source.mode.is_by_ref() {
            source.ty == target.ty
        } else {
            relations.widens(&target.ty, &source.ty)
        };
    if ok {
        Ok(())
    } else {
        Err(ConversionError::ReturnMismatch {
            source: source.clone(),
            target: target.clone(),
        })
    }
}
