//! Interfaces to the rest of the type checker.
//!
//! Handle checking leans on two services it does not implement itself:
//! ordinary type convertibility and ordinary overload resolution. Both are
//! traits here so the host compiler can plug its own in; [`crate::builtins`]
//! has a small reference implementation of each.

use crate::bind::FunctionDecl;
use crate::convention::ConventionTag;
use crate::sig::{ParamDescriptor, ParamMode};
use crate::ty::Ty;

/// The conversion kinds handle checking is allowed to rely on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConversionClass {
    Identity,
    /// Implicit reference conversion: `string` -> `object`, derived -> base.
    Reference,
    /// Implicit pointer conversion: `int*` -> `void*`.
    Pointer,
}

impl ConversionClass {
    pub const ALL: [ConversionClass; 3] = [
        ConversionClass::Identity,
        ConversionClass::Reference,
        ConversionClass::Pointer,
    ];
}

/// Convertibility between descriptor types.
pub trait TypeRelations {
    /// Whether a conversion of exactly this class exists from `source` to
    /// `target`.
    fn is_convertible(&self, source: &Ty, target: &Ty, class: ConversionClass) -> bool;

    /// Whether an identity, implicit reference, or implicit pointer
    /// conversion exists.
    fn widens(&self, source: &Ty, target: &Ty) -> bool {
        ConversionClass::ALL
            .iter()
            .any(|class| self.is_convertible(source, target, *class))
    }
}

/// One argument of the call the binder pretends to make: the target
/// handle's parameter type and mode at that position.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticArg {
    pub ty: Ty,
    pub mode: ParamMode,
}

impl From<&ParamDescriptor> for SyntheticArg {
    fn from(param: &ParamDescriptor) -> Self {
        SyntheticArg {
            ty: param.ty.clone(),
            mode: param.mode,
        }
    }
}

/// Outcome of the tie-break among applicable members.
#[derive(Clone, Debug)]
pub enum BestMember<'g> {
    Unique(&'g FunctionDecl),
    Ambiguous(Vec<&'g FunctionDecl>),
    NoneApplicable,
}

/// Overload resolution, normal form only: a variadic member is matched
/// against its declared parameter list, never an expanded one.
pub trait OverloadOracle {
    fn is_applicable_normal_form(&self, candidate: &FunctionDecl, args: &[SyntheticArg]) -> bool;

    fn best_member<'g>(
        &self,
        applicable: &[&'g FunctionDecl],
        args: &[SyntheticArg],
    ) -> BestMember<'g>;
}

/// Decides the convention of a function whose address is taken, e.g. from
/// an attribute marking it callable from native code. Returning `None`
/// leaves the binder's default of `managed`.
pub trait ConventionStrategy {
    fn infer(&self, candidate: &FunctionDecl) -> Option<ConventionTag>;
}
