//! Caller identity resolved from a session token, threaded explicitly into every
//! operation that needs to authorize.

use models::user::Role;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() { Ok(()) } else { Err(ServiceError::Forbidden("admin role required".into())) }
    }

    /// Own account, or any account for admins.
    pub fn require_self_or_admin(&self, target_user_id: i64) -> Result<(), ServiceError> {
        if self.is_admin() || self.user_id == target_user_id {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("not permitted for this user".into()))
        }
    }

    /// Entries without an owner are admin-mutable only.
    pub fn require_owner_or_admin(&self, owner_id: Option<i64>) -> Result<(), ServiceError> {
        if self.is_admin() || owner_id == Some(self.user_id) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("not the owner of this entry".into()))
        }
    }
}
