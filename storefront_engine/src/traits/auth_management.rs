use thiserror::Error;

use crate::db_types::User;

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// Read access to user identities and their roles.
///
/// Sign-in happens elsewhere. The storefront only needs to know who a user is, and whether they may administer
/// orders.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;

    /// Whether the user currently holds one of the [`Role::ELEVATED`](crate::db_types::Role::ELEVATED) roles.
    /// Unknown users are not elevated.
    async fn has_elevated_role(&self, user_id: i64) -> Result<bool, AuthApiError> {
        let user = self.fetch_user(user_id).await?;
        Ok(user.map(|u| u.role.is_elevated()).unwrap_or(false))
    }
}
