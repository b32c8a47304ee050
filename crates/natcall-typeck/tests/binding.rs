//! Integration tests for address-of binding over function groups.
//!
//! These tests exercise:
//! - Overload selection driven by the target handle's parameters
//! - Groups without a target type (`var p = &f;` and `void*` contexts)
//! - Instance members never being selected
//! - Full-signature checks after overload selection
//! - The pluggable convention strategy

use natcall_typeck::bind::{BindTarget, CandidateBinder, CandidateSet, FunctionDecl};
use natcall_typeck::builtins::{NormalFormResolver, TypeHierarchy};
use natcall_typeck::convention::ConventionTag;
use natcall_typeck::convert::HandleConversion;
use natcall_typeck::error::{BindError, ConversionError};
use natcall_typeck::oracle::ConventionStrategy;
use natcall_typeck::sig::{HandleType, ParamDescriptor, ParamMode, ReturnDescriptor, Signature};
use natcall_typeck::ty::Ty;

// ── Helpers ────────────────────────────────────────────────────────────

fn sig(params: Vec<ParamDescriptor>, ret: Ty, cc: ConventionTag) -> Signature {
    Signature::from_descriptors(params, ReturnDescriptor::value(ret), cc).expect("valid signature")
}

fn static_fn(name: &str, params: Vec<Ty>, ret: Ty) -> FunctionDecl {
    let params = params.into_iter().map(ParamDescriptor::value).collect();
    FunctionDecl::new(name, sig(params, ret, ConventionTag::Managed), true)
}

fn instance_fn(name: &str, params: Vec<Ty>, ret: Ty) -> FunctionDecl {
    let params = params.into_iter().map(ParamDescriptor::value).collect();
    FunctionDecl::new(name, sig(params, ret, ConventionTag::Managed), false)
}

fn target(params: Vec<Ty>, ret: Ty, cc: ConventionTag) -> HandleType {
    HandleType::new(sig(params.into_iter().map(ParamDescriptor::value).collect(), ret, cc))
}

/// `f()`, `f(int)`, `f(string)`, all static and returning void.
fn three_overloads() -> CandidateSet {
    CandidateSet::new(
        "f",
        vec![
            static_fn("f", vec![], Ty::Void),
            static_fn("f", vec![Ty::int()], Ty::Void),
            static_fn("f", vec![Ty::string()], Ty::Void),
        ],
    )
}

// ── Overload selection ─────────────────────────────────────────────────

#[test]
fn test_target_parameters_select_the_overload() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let group = three_overloads();

    let no_args = target(vec![], Ty::Void, ConventionTag::Managed);
    let bound = binder
        .bind_address_of(&group, BindTarget::Handle(&no_args))
        .expect("f() should bind");
    assert!(std::ptr::eq(bound.candidate, &group.members[0]));
    assert_eq!(bound.conversion, HandleConversion::Identity);

    let int_arg = target(vec![Ty::int()], Ty::Void, ConventionTag::Managed);
    let bound = binder
        .bind_address_of(&group, BindTarget::Handle(&int_arg))
        .expect("f(int) should bind");
    assert!(std::ptr::eq(bound.candidate, &group.members[1]));

    let string_arg = target(vec![Ty::string()], Ty::Void, ConventionTag::Managed);
    let bound = binder
        .bind_address_of(&group, BindTarget::Handle(&string_arg))
        .expect("f(string) should bind");
    assert!(std::ptr::eq(bound.candidate, &group.members[2]));
}

#[test]
fn test_unconstrained_group_of_three_is_ambiguous() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    assert_eq!(
        binder.bind_address_of(&three_overloads(), BindTarget::Unconstrained),
        Err(BindError::AmbiguousGroup {
            name: "f".to_string(),
            count: 3
        })
    );
}

#[test]
fn test_unconstrained_single_static_binds_as_managed() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let group = CandidateSet::new("g", vec![static_fn("g", vec![Ty::long()], Ty::bool())]);

    let bound = binder
        .bind_address_of(&group, BindTarget::Unconstrained)
        .expect("single static member binds");
    assert_eq!(bound.handle.convention(), &ConventionTag::Managed);
    assert_eq!(bound.handle.to_string(), "delegate*<long, bool>");
}

#[test]
fn test_no_applicable_overload() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let two_ints = target(vec![Ty::int(), Ty::int()], Ty::Void, ConventionTag::Managed);
    assert_eq!(
        binder.bind_address_of(&three_overloads(), BindTarget::Handle(&two_ints)),
        Err(BindError::NoApplicableCandidate {
            name: "f".to_string()
        })
    );
}

#[test]
fn test_identity_wins_over_widening() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let group = CandidateSet::new(
        "h",
        vec![
            static_fn("h", vec![Ty::object()], Ty::Void),
            static_fn("h", vec![Ty::string()], Ty::Void),
        ],
    );
    let string_arg = target(vec![Ty::string()], Ty::Void, ConventionTag::Managed);
    let bound = binder
        .bind_address_of(&group, BindTarget::Handle(&string_arg))
        .expect("h(string) is the better overload");
    assert!(std::ptr::eq(bound.candidate, &group.members[1]));
}

#[test]
fn test_equally_good_overloads_are_ambiguous() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let group = CandidateSet::new(
        "k",
        vec![
            static_fn("k", vec![Ty::string(), Ty::object()], Ty::Void),
            static_fn("k", vec![Ty::object(), Ty::string()], Ty::Void),
        ],
    );
    let strings = target(vec![Ty::string(), Ty::string()], Ty::Void, ConventionTag::Managed);
    match binder.bind_address_of(&group, BindTarget::Handle(&strings)) {
        Err(BindError::Ambiguous { name, candidates }) => {
            assert_eq!(name, "k");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected ambiguity, got {:?}", other),
    }
}

#[test]
fn test_by_reference_targets_select_by_reference_overloads() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let by_ref = FunctionDecl::new(
        "r",
        sig(
            vec![ParamDescriptor::new(Ty::int(), ParamMode::Ref)],
            Ty::Void,
            ConventionTag::Managed,
        ),
        true,
    );
    let by_out = FunctionDecl::new(
        "r",
        sig(
            vec![ParamDescriptor::new(Ty::int(), ParamMode::Out)],
            Ty::Void,
            ConventionTag::Managed,
        ),
        true,
    );
    let group = CandidateSet::new("r", vec![by_ref, by_out]);

    let out_target = HandleType::new(sig(
        vec![ParamDescriptor::new(Ty::int(), ParamMode::Out)],
        Ty::Void,
        ConventionTag::Managed,
    ));
    let bound = binder
        .bind_address_of(&group, BindTarget::Handle(&out_target))
        .expect("out overload binds");
    assert!(std::ptr::eq(bound.candidate, &group.members[1]));

    let value_target = target(vec![Ty::int()], Ty::Void, ConventionTag::Managed);
    assert!(matches!(
        binder.bind_address_of(&group, BindTarget::Handle(&value_target)),
        Err(BindError::NoApplicableCandidate { .. })
    ));
}

// ── Instance members ───────────────────────────────────────────────────

#[test]
fn test_instance_members_are_never_selected() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let group = CandidateSet::new(
        "m",
        vec![
            instance_fn("m", vec![Ty::int()], Ty::Void),
            static_fn("m", vec![Ty::string()], Ty::Void),
        ],
    );

    let int_arg = target(vec![Ty::int()], Ty::Void, ConventionTag::Managed);
    assert_eq!(
        binder.bind_address_of(&group, BindTarget::Handle(&int_arg)),
        Err(BindError::NoApplicableCandidate {
            name: "m".to_string()
        })
    );

    let bound = binder
        .bind_address_of(&group, BindTarget::Unconstrained)
        .expect("the lone static member binds");
    assert!(std::ptr::eq(bound.candidate, &group.members[1]));
}

#[test]
fn test_group_of_only_instance_members_has_no_candidate() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let group = CandidateSet::new("m", vec![instance_fn("m", vec![], Ty::Void)]);
    assert!(matches!(
        binder.bind_address_of(&group, BindTarget::Untyped),
        Err(BindError::NoApplicableCandidate { .. })
    ));
}

// ── Full-signature check ───────────────────────────────────────────────

#[test]
fn test_return_type_is_checked_after_selection() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let group = CandidateSet::new("f", vec![static_fn("f", vec![Ty::int()], Ty::int())]);
    let returns_void = target(vec![Ty::int()], Ty::Void, ConventionTag::Managed);

    match binder.bind_address_of(&group, BindTarget::Handle(&returns_void)) {
        Err(BindError::SignatureMismatch { reason, .. }) => {
            assert!(matches!(reason, ConversionError::ReturnMismatch { .. }));
        }
        other => panic!("expected a signature mismatch, got {:?}", other),
    }
}

#[test]
fn test_address_of_never_yields_an_unmanaged_handle_by_default() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let group = CandidateSet::new("f", vec![static_fn("f", vec![Ty::int()], Ty::Void)]);
    let cdecl = target(vec![Ty::int()], Ty::Void, ConventionTag::Cdecl);

    assert_eq!(
        binder.bind_address_of(&group, BindTarget::Handle(&cdecl)),
        Err(BindError::SignatureMismatch {
            name: "f".to_string(),
            candidate: sig(
                vec![ParamDescriptor::value(Ty::int())],
                Ty::Void,
                ConventionTag::Managed
            ),
            reason: ConversionError::ConventionMismatch {
                source: ConventionTag::Managed,
                target: ConventionTag::Cdecl,
            },
        })
    );
}

#[test]
fn test_value_parameters_widen_from_candidate_to_target() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let group = CandidateSet::new("w", vec![static_fn("w", vec![Ty::object()], Ty::Void)]);
    let string_arg = target(vec![Ty::string()], Ty::Void, ConventionTag::Managed);

    // Applicable as a call, but the candidate's parameter does not widen to
    // the target's.
    assert!(matches!(
        binder.bind_address_of(&group, BindTarget::Handle(&string_arg)),
        Err(BindError::SignatureMismatch {
            reason: ConversionError::TypeMismatch { index: 0, .. },
            ..
        })
    ));
}

#[test]
fn test_group_is_left_untouched() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let binder = CandidateBinder::new(&relations, &resolver);
    let group = three_overloads();
    let before = group.clone();
    let int_arg = target(vec![Ty::int()], Ty::Void, ConventionTag::Managed);
    let _ = binder.bind_address_of(&group, BindTarget::Handle(&int_arg));
    let _ = binder.bind_address_of(&group, BindTarget::Unconstrained);
    assert_eq!(group, before);
}

// ── Convention strategy ────────────────────────────────────────────────

/// Treats functions whose name starts with `native_` as cdecl callbacks.
struct NativePrefix;

impl ConventionStrategy for NativePrefix {
    fn infer(&self, candidate: &FunctionDecl) -> Option<ConventionTag> {
        candidate
            .name
            .starts_with("native_")
            .then_some(ConventionTag::Cdecl)
    }
}

#[test]
fn test_strategy_supplies_the_convention() {
    let relations = TypeHierarchy::new();
    let resolver = NormalFormResolver::new(&relations);
    let strategy = NativePrefix;
    let binder = CandidateBinder::new(&relations, &resolver).with_convention_strategy(&strategy);

    let native = CandidateSet::new(
        "native_cb",
        vec![static_fn("native_cb", vec![Ty::int()], Ty::Void)],
    );
    let cdecl = target(vec![Ty::int()], Ty::Void, ConventionTag::Cdecl);
    let bound = binder
        .bind_address_of(&native, BindTarget::Handle(&cdecl))
        .expect("strategy makes the candidate cdecl");
    assert_eq!(bound.handle.convention(), &ConventionTag::Cdecl);
    assert_eq!(bound.conversion, HandleConversion::Identity);

    let plain = CandidateSet::new("cb", vec![static_fn("cb", vec![Ty::int()], Ty::Void)]);
    let bound = binder
        .bind_address_of(&plain, BindTarget::Unconstrained)
        .expect("plain function binds");
    assert_eq!(bound.handle.convention(), &ConventionTag::Managed);
}
