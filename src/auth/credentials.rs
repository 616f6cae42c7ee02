use thiserror::Error;

use super::password::verify_password;
use super::AuthError;
use crate::models::user::User;
use crate::store::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Checks an email/password pair against stored accounts.
pub struct CredentialValidator<'a, S: UserStore + ?Sized> {
    users: &'a S,
}

impl<'a, S: UserStore + ?Sized> CredentialValidator<'a, S> {
    pub fn new(users: &'a S) -> Self {
        Self { users }
    }

    pub async fn validate(&self, email: &str, password: &str) -> Result<User, CredentialError> {
        let Some(user) = self.users.find_user_by_email(email).await? else {
            tracing::warn!("Login rejected: no account for '{}'", email);
            return Err(AuthError::NotAuthenticated.into());
        };

        if !verify_password(password, &user.password_hash) {
            tracing::warn!("Login rejected: wrong password for user {}", user.id);
            return Err(AuthError::NotAuthenticated.into());
        }

        Ok(user)
    }
}
