use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};

/// Sentinel identity embedded in checkout metadata when the caller supplies
/// no real user. Never a valid entitlement target - the webhook handler
/// acknowledges and skips it, and `create_user` refuses to persist it.
pub const GUEST_USER_ID: &str = "guest";

/// Display-name placeholder paired with the guest sentinel.
pub const ANONYMOUS_USERNAME: &str = "anonymous";

/// Entitlement record - one per real user identity.
///
/// Created by user registration (outside this workflow); the only field this
/// service ever mutates is `premium`, and only from `false` to `true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub premium: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub id: String,
    pub username: String,
}

impl CreateUser {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(AppError::BadRequest(msg::USER_ID_EMPTY.into()));
        }
        if self.id == GUEST_USER_ID {
            return Err(AppError::BadRequest(msg::USER_ID_RESERVED.into()));
        }
        if self.username.trim().is_empty() {
            return Err(AppError::BadRequest(msg::USERNAME_EMPTY.into()));
        }
        Ok(())
    }
}
