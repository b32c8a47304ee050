//! Signature model for call handles.
//!
//! A `Signature` is the shape of a callable: ordered parameter descriptors,
//! one return descriptor, and a calling convention. Signatures are plain
//! values. Two signatures are equal when every descriptor and the convention
//! match, which is exactly what the derived `PartialEq` compares.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::convention::ConventionTag;
use crate::error::ConstructionError;
use crate::ty::Ty;

/// How a parameter is passed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamMode {
    Value,
    Ref,
    Out,
    /// Read-only by reference (`in`, or `ref readonly` in source).
    In,
}

impl ParamMode {
    pub fn is_by_ref(self) -> bool {
        !matches!(self, ParamMode::Value)
    }

    /// Source keyword for this mode, `None` for by-value.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            ParamMode::Value => None,
            ParamMode::Ref => Some("ref"),
            ParamMode::Out => Some("out"),
            ParamMode::In => Some("in"),
        }
    }
}

impl fmt::Display for ParamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword().unwrap_or("value"))
    }
}

/// How a value is returned.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnMode {
    Value,
    Ref,
    RefReadonly,
}

impl ReturnMode {
    pub fn is_by_ref(self) -> bool {
        !matches!(self, ReturnMode::Value)
    }

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            ReturnMode::Value => None,
            ReturnMode::Ref => Some("ref"),
            ReturnMode::RefReadonly => Some("ref readonly"),
        }
    }
}

impl fmt::Display for ReturnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword().unwrap_or("value"))
    }
}

/// A modifier keyword as the parser saw it in front of a descriptor type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RefKeyword {
    Ref,
    Out,
    In,
    Readonly,
}

impl fmt::Display for RefKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RefKeyword::Ref => "ref",
            RefKeyword::Out => "out",
            RefKeyword::In => "in",
            RefKeyword::Readonly => "readonly",
        };
        write!(f, "{}", text)
    }
}

/// Where a descriptor sits in its signature. Parameter indices are
/// zero-based; `Display` prints them one-based for diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorPosition {
    Parameter(usize),
    Return,
}

impl fmt::Display for DescriptorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorPosition::Parameter(index) => write!(f, "parameter {}", index + 1),
            DescriptorPosition::Return => write!(f, "return type"),
        }
    }
}

/// A parameter: type plus passing mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub ty: Ty,
    pub mode: ParamMode,
}

impl ParamDescriptor {
    pub fn new(ty: Ty, mode: ParamMode) -> Self {
        ParamDescriptor { ty, mode }
    }

    pub fn value(ty: Ty) -> Self {
        ParamDescriptor::new(ty, ParamMode::Value)
    }
}

impl fmt::Display for ParamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode.keyword() {
            Some(kw) => write!(f, "{} {}", kw, self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// The return: type plus passing mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnDescriptor {
    pub ty: Ty,
    pub mode: ReturnMode,
}

impl ReturnDescriptor {
    pub fn new(ty: Ty, mode: ReturnMode) -> Self {
        ReturnDescriptor { ty, mode }
    }

    pub fn value(ty: Ty) -> Self {
        ReturnDescriptor::new(ty, ReturnMode::Value)
    }
}

impl fmt::Display for ReturnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode.keyword() {
            Some(kw) => write!(f, "{} {}", kw, self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// A parsed parameter before its modifier keywords are validated.
#[derive(Clone, Debug)]
pub struct RawParam {
    pub ty: Ty,
    pub modifiers: Vec<RefKeyword>,
}

impl RawParam {
    pub fn new(ty: Ty, modifiers: impl Into<Vec<RefKeyword>>) -> Self {
        RawParam {
            ty,
            modifiers: modifiers.into(),
        }
    }

    pub fn plain(ty: Ty) -> Self {
        RawParam::new(ty, Vec::new())
    }
}

/// A parsed return before its modifier keywords are validated.
#[derive(Clone, Debug)]
pub struct RawReturn {
    pub ty: Ty,
    pub modifiers: Vec<RefKeyword>,
}

impl RawReturn {
    pub fn new(ty: Ty, modifiers: impl Into<Vec<RefKeyword>>) -> Self {
        RawReturn {
            ty,
            modifiers: modifiers.into(),
        }
    }

    pub fn plain(ty: Ty) -> Self {
        RawReturn::new(ty, Vec::new())
    }
}

/// The shape of a callable.
///
/// Fields are private: a `Signature` only comes out of [`Signature::build`]
/// or [`Signature::from_descriptors`], both of which validate it, and it
/// never changes afterwards. Deserialization goes through
/// `from_descriptors` too.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSignature")]
pub struct Signature {
    params: Vec<ParamDescriptor>,
    ret: ReturnDescriptor,
    convention: ConventionTag,
}

#[derive(Deserialize)]
struct RawSignature {
    params: Vec<ParamDescriptor>,
    ret: ReturnDescriptor,
    convention: ConventionTag,
}

impl TryFrom<RawSignature> for Signature {
    type Error = ConstructionError;

    fn try_from(raw: RawSignature) -> Result<Self, Self::Error> {
        Signature::from_descriptors(raw.params, raw.ret, raw.convention)
    }
}

impl Signature {
    /// Build a signature from parsed descriptors, resolving each modifier
    /// keyword list to a passing mode.
    pub fn build(
        params: Vec<RawParam>,
        ret: RawReturn,
        convention: ConventionTag,
    ) -> Result<Signature, ConstructionError> {
        let params = params
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let mode = param_mode(index, &raw.modifiers)?;
                Ok(ParamDescriptor::new(raw.ty, mode))
            })
            .collect::<Result<Vec<_>, ConstructionError>>()?;
        let ret = ReturnDescriptor::new(ret.ty, return_mode(&ret.modifiers)?);
        Signature::from_descriptors(params, ret, convention)
    }

    /// Build a signature from already-resolved descriptors.
    ///
    /// `void` is only allowed as a by-value return type.
    pub fn from_descriptors(
        params: Vec<ParamDescriptor>,
        ret: ReturnDescriptor,
        convention: ConventionTag,
    ) -> Result<Signature, ConstructionError> {
        if let Some(index) = params.iter().position(|p| p.ty.is_void()) {
            return Err(ConstructionError::VoidParameter { index });
        }
        if ret.ty.is_void() && ret.mode.is_by_ref() {
            return Err(ConstructionError::ByRefVoidReturn);
        }
        Ok(Signature {
            params,
            ret,
            convention,
        })
    }

    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn ret(&self) -> &ReturnDescriptor {
        &self.ret
    }

    pub fn convention(&self) -> &ConventionTag {
        &self.convention
    }

    /// The same shape under a different convention.
    pub fn with_convention(&self, convention: ConventionTag) -> Signature {
        Signature {
            params: self.params.clone(),
            ret: self.ret.clone(),
            convention,
        }
    }

    /// Positional equality of every descriptor plus the convention.
    pub fn structural_equals(&self, other: &Signature) -> bool {
        structural_equals(self, other)
    }
}

/// True iff parameter counts, every parameter mode and type, the return
/// mode and type, and the convention all match.
pub fn structural_equals(a: &Signature, b: &Signature) -> bool {
    a.params.len() == b.params.len()
        && a.params.iter().zip(&b.params).all(|(x, y)| x == y)
        && a.ret == b.ret
        && a.convention == b.convention
}

fn param_mode(index: usize, modifiers: &[RefKeyword]) -> Result<ParamMode, ConstructionError> {
    match modifiers {
        [] => Ok(ParamMode::Value),
        [RefKeyword::Ref] => Ok(ParamMode::Ref),
        [RefKeyword::Out] => Ok(ParamMode::Out),
        [RefKeyword::In] => Ok(ParamMode::In),
        [RefKeyword::Ref, RefKeyword::Readonly] => Ok(ParamMode::In),
        _ => Err(ConstructionError::InvalidModifierCombination {
            position: DescriptorPosition::Parameter(index),
            modifiers: modifiers.to_vec(),
        }),
    }
}

fn return_mode(modifiers: &[RefKeyword]) -> Result<ReturnMode, ConstructionError> {
    if modifiers.contains(&RefKeyword::Out) {
        return Err(ConstructionError::InvalidOutOnReturn);
    }
    match modifiers {
        [] => Ok(ReturnMode::Value),
        [RefKeyword::Ref] => Ok(ReturnMode::Ref),
        [RefKeyword::Ref, RefKeyword::Readonly] => Ok(ReturnMode::RefReadonly),
        _ => Err(ConstructionError::InvalidModifierCombination {
            position: DescriptorPosition::Return,
            modifiers: modifiers.to_vec(),
        }),
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.convention {
            ConventionTag::Managed => write!(f, "delegate*<")?,
            ref other => write!(f, "delegate* {}<", other)?,
        }
        for param in &self.params {
            write!(f, "{}, ", param)?;
        }
        write!(f, "{}>", self.ret)
    }
}

/// A native call handle type.
///
/// A pointer-category type: it needs an unsafe context to be named, cannot
/// be a generic type argument, and never boxes to `object` (see
/// [`crate::usage`]). Handle types have no names; every use spells the
/// signature out.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleType {
    signature: Signature,
}

impl HandleType {
    pub fn new(signature: Signature) -> Self {
        HandleType { signature }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn param_count(&self) -> usize {
        self.signature.param_count()
    }

    pub fn convention(&self) -> &ConventionTag {
        self.signature.convention()
    }
}

impl fmt::Display for HandleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature)
    }
}
