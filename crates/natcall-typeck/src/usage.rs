//! Where handle types may appear.
//!
//! Handles are pointers: they can only be named in unsafe code, cannot be
//! generic type arguments, and have no conversion to `object`.

use crate::error::UsageError;
use crate::ty::Ty;

/// Whether the surrounding code allows pointer types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SafetyContext {
    Safe,
    Unsafe,
}

/// Naming `ty` in a declaration, cast, or expression.
pub fn check_named(ty: &Ty, context: SafetyContext) -> Result<(), UsageError> {
    if context == SafetyContext::Safe && ty.contains_handle() {
        return Err(UsageError::RequiresUnsafeContext { ty: ty.clone() });
    }
    Ok(())
}

/// Passing `ty` as a generic type argument (`List<T>`).
pub fn check_type_argument(ty: &Ty) -> Result<(), UsageError> {
    if ty.contains_handle() {
        return Err(UsageError::HandleAsTypeArgument { ty: ty.clone() });
    }
    Ok(())
}

/// Converting a value of type `ty` to `object`.
pub fn check_boxing(ty: &Ty) -> Result<(), UsageError> {
    if matches!(ty, Ty::FnPtr(_)) {
        return Err(UsageError::HandleBoxing { ty: ty.clone() });
    }
    Ok(())
}

/// All usage checks for one occurrence of `ty`: naming it in `context`,
/// plus the type-argument and boxing checks when the occurrence is one.
pub fn check_all(
    ty: &Ty,
    context: SafetyContext,
    as_type_argument: bool,
    converted_to_object: bool,
) -> Result<(), UsageError> {
    check_named(ty, context)?;
    if as_type_argument {
        check_type_argument(ty)?;
    }
    if converted_to_object {
        check_boxing(ty)?;
    }
    Ok(())
}
