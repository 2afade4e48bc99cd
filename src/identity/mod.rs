// ============================================================================
// Identity Context
// ============================================================================
//
// Resolves a bearer credential into a `Principal` (user id + role). Account
// storage and password handling live outside this service; all we need is a
// token that carries the subject and role, signed with the shared secret.
//
// ============================================================================

mod token;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use token::{bearer_token, AuthError, Claims, TokenService};

/// Closed set of roles. Authorization checks match on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn user(user_id: Uuid) -> Self {
        Self { user_id, role: Role::User }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self { user_id, role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
