use thiserror::Error;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("requires role '{required}', caller has '{actual}'")]
    InsufficientRole { required: Role, actual: Role },
}

/// The principal must hold `required` or a role that outranks it.
pub fn require_role(principal: &Principal, required: Role) -> Result<(), AuthzError> {
    if principal.role == required || principal.role.outranks(required) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required,
            actual: principal.role,
        })
    }
}
