//! Reference implementations of the type checker services.
//!
//! `TypeHierarchy` answers convertibility questions from a single-inheritance
//! class table, and `NormalFormResolver` is a small overload resolver built
//! on top of any [`TypeRelations`]. Hosts with a full type checker plug in
//! their own; these back the tests and standalone use.

use rustc_hash::FxHashMap;

use crate::bind::FunctionDecl;
use crate::convert::convert_signatures;
use crate::oracle::{BestMember, ConversionClass, OverloadOracle, SyntheticArg, TypeRelations};
use crate::sig::ParamMode;
use crate::ty::Ty;

/// Class table: each registered reference type and its base class.
///
/// `object` is the root and `string` derives from it. Types that are never
/// registered (`int`, `bool`, ...) take part in identity conversions only.
#[derive(Debug)]
pub struct TypeHierarchy {
    bases: FxHashMap<String, String>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        let mut hierarchy = TypeHierarchy {
            bases: FxHashMap::default(),
        };
        hierarchy.register_class("string", "object");
        hierarchy
    }

    /// Register `name` as a reference type deriving from `base`.
    pub fn register_class(&mut self, name: impl Into<String>, base: impl Into<String>) {
        self.bases.insert(name.into(), base.into());
    }

    /// Whether `derived` is a proper subclass of `base`.
    pub fn is_subclass(&self, derived: &str, base: &str) -> bool {
        let mut current = derived;
        // A chain longer than the table means a cycle.
        for _ in 0..=self.bases.len() {
            match self.bases.get(current) {
                Some(parent) if parent == base => return true,
                Some(parent) => current = parent.as_str(),
                None => return false,
            }
        }
        false
    }
}

impl Default for TypeHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRelations for TypeHierarchy {
    fn is_convertible(&self, source: &Ty, target: &Ty, class: ConversionClass) -> bool {
        match class {
            ConversionClass::Identity => source == target,
            ConversionClass::Reference => match (source, target) {
                (Ty::Con(from), Ty::Con(to)) => self.is_subclass(&from.name, &to.name),
                _ => false,
            },
            ConversionClass::Pointer => match (source, target) {
                (Ty::Ptr(_), Ty::VoidPtr) | (Ty::FnPtr(_), Ty::VoidPtr) => true,
                (Ty::FnPtr(from), Ty::FnPtr(to)) => {
                    from != to && convert_signatures(self, from.signature(), to.signature()).is_ok()
                }
                _ => false,
            },
        }
    }
}

/// Normal-form overload resolution over a [`TypeRelations`].
///
/// A member is applicable when it has exactly as many parameters as there
/// are arguments, every mode matches, by-value arguments widen to the
/// parameter type, and by-reference arguments have the parameter's exact
/// type. The tie-break prefers identity over widening, then the more
/// specific parameter type.
pub struct NormalFormResolver<'r, R: ?Sized> {
    relations: &'r R,
}

impl<'r, R: TypeRelations + ?Sized> NormalFormResolver<'r, R> {
    pub fn new(relations: &'r R) -> Self {
        NormalFormResolver { relations }
    }

    /// Whether passing `arg` to `left` is a better conversion than to `right`.
    fn better_conversion(&self, arg: &Ty, left: &Ty, right: &Ty) -> bool {
        if left == right {
            return false;
        }
        if arg == left {
            return true;
        }
        if arg == right {
            return false;
        }
        self.relations.widens(left, right) && !self.relations.widens(right, left)
    }

    fn better_member(
        &self,
        left: &FunctionDecl,
        right: &FunctionDecl,
        args: &[SyntheticArg],
    ) -> bool {
        let mut strictly_better = false;
        let positions = left
            .signature
            .params()
            .iter()
            .zip(right.signature.params())
            .zip(args);
        for ((l, r), arg) in positions {
            if self.better_conversion(&arg.ty, &r.ty, &l.ty) {
                return false;
            }
            if self.better_conversion(&arg.ty, &l.ty, &r.ty) {
                strictly_better = true;
            }
        }
        strictly_better
    }
}

impl<R: TypeRelations + ?Sized> OverloadOracle for NormalFormResolver<'_, R> {
    fn is_applicable_normal_form(&self, candidate: &FunctionDecl, args: &[SyntheticArg]) -> bool {
        let params = candidate.signature.params();
        params.len() == args.len()
            && params.iter().zip(args).all(|(param, arg)| {
                param.mode == arg.mode
                    && match arg.mode {
                        ParamMode::Value => self.relations.widens(&arg.ty, &param.ty),
                        ParamMode::Ref | ParamMode::Out | ParamMode::In => arg.ty == param.ty,
                    }
            })
    }

    fn best_member<'g>(
        &self,
        applicable: &[&'g FunctionDecl],
        args: &[SyntheticArg],
    ) -> BestMember<'g> {
        match applicable {
            [] => return BestMember::NoneApplicable,
            [only] => return BestMember::Unique(*only),
            _ => {}
        }

        let beats_all = |candidate: &FunctionDecl| {
            applicable
                .iter()
                .filter(|other| !std::ptr::eq(**other, candidate))
                .all(|other| self.better_member(candidate, other, args))
        };
        if let Some(best) = applicable.iter().find(|c| beats_all(**c)) {
            return BestMember::Unique(*best);
        }

        let undominated: Vec<&'g FunctionDecl> = applicable
            .iter()
            .copied()
            .filter(|candidate| {
                !applicable
                    .iter()
                    .any(|other| self.better_member(other, candidate, args))
            })
            .collect();
        BestMember::Ambiguous(undominated)
    }
}
