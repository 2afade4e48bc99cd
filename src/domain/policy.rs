use uuid::Uuid;

use crate::identity::Principal;

// ============================================================================
// Access Policy
// ============================================================================
//
// Single entry point for every role/ownership decision. Callers state what
// they need and translate the denial into their own error type.
//
// ============================================================================

/// What an operation requires of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only the owning user. Denials hide the resource.
    Owner(Uuid),
    /// The owning user or any admin
    OwnerOrAdmin(Uuid),
    /// Admin role regardless of ownership
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// Report the resource as absent
    Hidden,
    /// Report the operation as not permitted
    Forbidden,
}

pub fn authorize(principal: &Principal, access: Access) -> Result<(), AccessDenied> {
    let is_admin = principal.is_admin();

    match access {
        Access::Owner(owner) if principal.user_id == owner => Ok(()),
        Access::Owner(_) => Err(AccessDenied::Hidden),
        Access::OwnerOrAdmin(owner) if principal.user_id == owner || is_admin => Ok(()),
        Access::OwnerOrAdmin(_) => Err(AccessDenied::Forbidden),
        Access::Admin if is_admin => Ok(()),
        Access::Admin => Err(AccessDenied::Forbidden),
    }
}

/// Boolean form used when a denial should just filter a lookup
pub fn is_allowed(principal: &Principal, access: Access) -> bool {
    authorize(principal, access).is_ok()
}
