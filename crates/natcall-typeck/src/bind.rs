//! Binding `&name` over a function group to a call handle.
//!
//! Only static members can have their address taken. With a target handle
//! type, the group is resolved like a call whose arguments have the target's
//! parameter types and modes, and the winner's full signature must then
//! convert to the target. Without a target, the group must have exactly one
//! static member.

use tracing::debug;

use crate::convention::ConventionTag;
use crate::convert::{convert_signatures, HandleConversion};
use crate::error::BindError;
use crate::oracle::{BestMember, ConventionStrategy, OverloadOracle, SyntheticArg, TypeRelations};
use crate::sig::{HandleType, Signature};

/// One function declaration in a group.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub signature: Signature,
    pub is_static: bool,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, signature: Signature, is_static: bool) -> Self {
        FunctionDecl {
            name: name.into(),
            signature,
            is_static,
        }
    }
}

/// The same-named functions visible at an address-of expression, in
/// declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateSet {
    pub name: String,
    pub members: Vec<FunctionDecl>,
}

impl CandidateSet {
    pub fn new(name: impl Into<String>, members: Vec<FunctionDecl>) -> Self {
        CandidateSet {
            name: name.into(),
            members,
        }
    }

    fn statics(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.members.iter().filter(|m| m.is_static)
    }
}

/// What the address-of expression is converted to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BindTarget<'a> {
    Handle(&'a HandleType),
    /// Assigned to `void*`.
    Untyped,
    /// No expected type, e.g. `var p = &f;`.
    Unconstrained,
}

/// A successfully bound address-of expression.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundHandle<'g> {
    /// The selected member of the group.
    pub candidate: &'g FunctionDecl,
    /// The handle type of `&candidate` itself, before any conversion.
    pub handle: HandleType,
    /// How `handle` converts to the target.
    pub conversion: HandleConversion,
}

/// Resolves address-of expressions over function groups.
pub struct CandidateBinder<'a, R: ?Sized, O: ?Sized> {
    relations: &'a R,
    overloads: &'a O,
    strategy: Option<&'a dyn ConventionStrategy>,
}

impl<'a, R, O> CandidateBinder<'a, R, O>
where
    R: TypeRelations + ?Sized,
    O: OverloadOracle + ?Sized,
{
    pub fn new(relations: &'a R, overloads: &'a O) -> Self {
        CandidateBinder {
            relations,
            overloads,
            strategy: None,
        }
    }

    /// Consult `strategy` for a member's convention before defaulting to
    /// `managed`.
    pub fn with_convention_strategy(mut self, strategy: &'a dyn ConventionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Bind `&group` against `target`.
    pub fn bind_address_of<'g>(
        &self,
        group: &'g CandidateSet,
        target: BindTarget<'_>,
    ) -> Result<BoundHandle<'g>, BindError> {
        match target {
            BindTarget::Handle(handle) => self.bind_to_handle(group, handle),
            BindTarget::Untyped => {
                let candidate = self.sole_static(group)?;
                Ok(BoundHandle {
                    candidate,
                    handle: self.natural_handle(candidate),
                    conversion: HandleConversion::HandleToUntyped,
                })
            }
            BindTarget::Unconstrained => {
                let candidate = self.sole_static(group)?;
                Ok(BoundHandle {
                    candidate,
                    handle: self.natural_handle(candidate),
                    conversion: HandleConversion::Identity,
                })
            }
        }
    }

    fn sole_static<'g>(&self, group: &'g CandidateSet) -> Result<&'g FunctionDecl, BindError> {
        let mut statics = group.statics();
        match (statics.next(), statics.next()) {
            (None, _) => Err(BindError::NoApplicableCandidate {
                name: group.name.clone(),
            }),
            (Some(only), None) => Ok(only),
            (Some(_), Some(_)) => Err(BindError::AmbiguousGroup {
                name: group.name.clone(),
                count: group.statics().count(),
            }),
        }
    }

    fn bind_to_handle<'g>(
        &self,
        group: &'g CandidateSet,
        target: &HandleType,
    ) -> Result<BoundHandle<'g>, BindError> {
        let args: Vec<SyntheticArg> = target
            .signature()
            .params()
            .iter()
            .map(SyntheticArg::from)
            .collect();

        let mut applicable = Vec::new();
        for member in &group.members {
            if !member.is_static {
                debug!(
                    group = %group.name,
                    candidate = %member.signature,
                    "skipping instance member"
                );
                continue;
            }
            if self.overloads.is_applicable_normal_form(member, &args) {
                applicable.push(member);
            } else {
                debug!(group = %group.name, candidate = %member.signature, "not applicable");
            }
        }

        let winner = match self.overloads.best_member(&applicable, &args) {
            BestMember::Unique(winner) => winner,
            BestMember::NoneApplicable => {
                return Err(BindError::NoApplicableCandidate {
                    name: group.name.clone(),
                })
            }
            BestMember::Ambiguous(members) => {
                return Err(BindError::Ambiguous {
                    name: group.name.clone(),
                    candidates: members.iter().map(|m| m.signature.clone()).collect(),
                })
            }
        };

        let handle = self.natural_handle(winner);
        let conversion = convert_signatures(self.relations, handle.signature(), target.signature())
            .map_err(|reason| BindError::SignatureMismatch {
                name: group.name.clone(),
                candidate: handle.signature().clone(),
                reason,
            })?;

        debug!(group = %group.name, bound = %handle, target = %target, "bound address-of");
        Ok(BoundHandle {
            candidate: winner,
            handle,
            conversion,
        })
    }

    /// The handle type `&candidate` has on its own.
    fn natural_handle(&self, candidate: &FunctionDecl) -> HandleType {
        let convention = self
            .strategy
            .and_then(|strategy| strategy.infer(candidate))
            .unwrap_or(ConventionTag::Managed);
        HandleType::new(candidate.signature.with_convention(convention))
    }
}
