//! Persisted form of handle signatures.
//!
//! The metadata signature format records a type and whether it is passed by
//! reference, but has no field for `in`, `out`, or `ref readonly`. Those
//! modes ride along as custom modifiers on the by-reference descriptor:
//!
//! | mode                   | by_ref | required marker |
//! |------------------------|--------|-----------------|
//! | value                  | no     | none            |
//! | `ref`                  | yes    | none            |
//! | `in` parameter         | yes    | `ReadOnly`      |
//! | `out` parameter        | yes    | `Output`        |
//! | `ref readonly` return  | yes    | `ReadOnly`      |
//!
//! Only required modifiers carry meaning. Optional ones are dropped by the
//! decoder as if they were never there.

use serde::{Deserialize, Serialize};

use crate::convention::ConventionRegistry;
use crate::error::{EncodingError, HandleError};
use crate::sig::{
    DescriptorPosition, HandleType, ParamDescriptor, ParamMode, ReturnDescriptor, ReturnMode,
    Signature,
};
use crate::ty::Ty;

/// A well-known passing-mode marker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Read-only reference: `in` parameters, `ref readonly` returns.
    ReadOnly,
    /// Output reference: `out` parameters.
    Output,
}

/// A marker attached to a descriptor's reference qualifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomModifier {
    pub marker: Marker,
    /// `true` for the binding form; `false` for the optional form, which
    /// decoders ignore.
    pub required: bool,
}

impl CustomModifier {
    pub fn required(marker: Marker) -> Self {
        CustomModifier {
            marker,
            required: true,
        }
    }

    pub fn optional(marker: Marker) -> Self {
        CustomModifier {
            marker,
            required: false,
        }
    }
}

/// A persisted descriptor type. Handle types nest as full encoded
/// signatures, so their modes are markers and their convention a byte at
/// every depth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EncodedType {
    Named(String),
    Ptr(Box<EncodedType>),
    VoidPtr,
    FnPtr(Box<EncodedSignature>),
    Void,
}

impl From<&Ty> for EncodedType {
    fn from(ty: &Ty) -> Self {
        encode_ty(ty)
    }
}

/// One persisted (type, reference qualifier, markers) tuple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedDescriptor {
    pub ty: EncodedType,
    pub by_ref: bool,
    pub modifiers: Vec<CustomModifier>,
}

impl EncodedDescriptor {
    fn new(ty: &Ty, by_ref: bool, marker: Option<Marker>) -> Self {
        EncodedDescriptor {
            ty: encode_ty(ty),
            by_ref,
            modifiers: marker.map(CustomModifier::required).into_iter().collect(),
        }
    }

    fn has_required(&self, marker: Marker) -> bool {
        self.modifiers
            .iter()
            .any(|m| m.required && m.marker == marker)
    }
}

/// A persisted signature: the convention byte, then the parameters in
/// declaration order, then the return. Field order is the wire order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedSignature {
    pub convention: u8,
    pub params: Vec<EncodedDescriptor>,
    pub ret: EncodedDescriptor,
}

impl EncodedSignature {
    /// All descriptors in wire order, return last.
    pub fn descriptors(&self) -> impl Iterator<Item = &EncodedDescriptor> {
        self.params.iter().chain(std::iter::once(&self.ret))
    }
}

// ── Encoding ───────────────────────────────────────────────────────────

pub fn encode_ty(ty: &Ty) -> EncodedType {
    match ty {
        Ty::Con(con) => EncodedType::Named(con.name.clone()),
        Ty::Ptr(inner) => EncodedType::Ptr(Box::new(encode_ty(inner))),
        Ty::VoidPtr => EncodedType::VoidPtr,
        Ty::FnPtr(handle) => EncodedType::FnPtr(Box::new(encode(handle.signature()))),
        Ty::Void => EncodedType::Void,
    }
}

pub fn encode_param(param: &ParamDescriptor) -> EncodedDescriptor {
    let marker = match param.mode {
        ParamMode::Value | ParamMode::Ref => None,
        ParamMode::In => Some(Marker::ReadOnly),
        ParamMode::Out => Some(Marker::Output),
    };
    EncodedDescriptor::new(&param.ty, param.mode.is_by_ref(), marker)
}

pub fn encode_return(ret: &ReturnDescriptor) -> EncodedDescriptor {
    let marker = match ret.mode {
        ReturnMode::Value | ReturnMode::Ref => None,
        ReturnMode::RefReadonly => Some(Marker::ReadOnly),
    };
    EncodedDescriptor::new(&ret.ty, ret.mode.is_by_ref(), marker)
}

/// Encode a signature for the metadata emitter.
pub fn encode(sig: &Signature) -> EncodedSignature {
    EncodedSignature {
        convention: sig.convention().code(),
        params: sig.params().iter().map(encode_param).collect(),
        ret: encode_return(sig.ret()),
    }
}

// ── Decoding ───────────────────────────────────────────────────────────

/// The passing mode a parameter descriptor's markers spell.
pub fn param_mode(index: usize, desc: &EncodedDescriptor) -> Result<ParamMode, EncodingError> {
    let position = DescriptorPosition::Parameter(index);
    let read_only = desc.has_required(Marker::ReadOnly);
    let output = desc.has_required(Marker::Output);
    match (desc.by_ref, read_only, output) {
        (_, true, true) => Err(EncodingError::ConflictingMarkers { position }),
        (false, false, false) => Ok(ParamMode::Value),
        (false, _, _) => Err(EncodingError::MarkerWithoutReference { position }),
        (true, false, false) => Ok(ParamMode::Ref),
        (true, true, false) => Ok(ParamMode::In),
        (true, false, true) => Ok(ParamMode::Out),
    }
}

/// The passing mode the return descriptor's markers spell.
pub fn return_mode(desc: &EncodedDescriptor) -> Result<ReturnMode, EncodingError> {
    let position = DescriptorPosition::Return;
    let read_only = desc.has_required(Marker::ReadOnly);
    let output = desc.has_required(Marker::Output);
    match (desc.by_ref, read_only, output) {
        (_, true, true) => Err(EncodingError::ConflictingMarkers { position }),
        (_, _, true) => Err(EncodingError::InvalidOutOnReturn),
        (false, false, _) => Ok(ReturnMode::Value),
        (false, true, _) => Err(EncodingError::MarkerWithoutReference { position }),
        (true, false, _) => Ok(ReturnMode::Ref),
        (true, true, _) => Ok(ReturnMode::RefReadonly),
    }
}

pub fn decode_ty(ty: &EncodedType, registry: &ConventionRegistry) -> Result<Ty, HandleError> {
    Ok(match ty {
        EncodedType::Named(name) => Ty::con(name.clone()),
        EncodedType::Ptr(inner) => Ty::ptr(decode_ty(inner, registry)?),
        EncodedType::VoidPtr => Ty::VoidPtr,
        EncodedType::FnPtr(sig) => Ty::fn_ptr(HandleType::new(decode(sig, registry)?)),
        EncodedType::Void => Ty::Void,
    })
}

pub fn decode_param(
    index: usize,
    desc: &EncodedDescriptor,
    registry: &ConventionRegistry,
) -> Result<ParamDescriptor, HandleError> {
    let mode = param_mode(index, desc)?;
    Ok(ParamDescriptor::new(decode_ty(&desc.ty, registry)?, mode))
}

pub fn decode_return(
    desc: &EncodedDescriptor,
    registry: &ConventionRegistry,
) -> Result<ReturnDescriptor, HandleError> {
    let mode = return_mode(desc)?;
    Ok(ReturnDescriptor::new(decode_ty(&desc.ty, registry)?, mode))
}

/// Rebuild a signature from its persisted form.
///
/// Fails with an [`EncodingError`] for bad markers or an unknown convention
/// byte, and with a construction error if the decoded descriptors do not
/// form a valid signature (a `void` parameter, say). Nested handle types
/// are decoded the same way.
pub fn decode(
    encoded: &EncodedSignature,
    registry: &ConventionRegistry,
) -> Result<Signature, HandleError> {
    let convention = registry
        .from_code(encoded.convention)
        .ok_or(EncodingError::UnknownConvention {
            code: encoded.convention,
        })?;
    let params = encoded
        .params
        .iter()
        .enumerate()
        .map(|(index, desc)| decode_param(index, desc, registry))
        .collect::<Result<Vec<_>, _>>()?;
    let ret = decode_return(&encoded.ret, registry)?;
    Ok(Signature::from_descriptors(params, ret, convention)?)
}
