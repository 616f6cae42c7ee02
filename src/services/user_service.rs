use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

use super::{required, ServiceError};
use crate::auth::password::hash_password;
use crate::auth::Role;
use crate::models::{NewUser, User};
use crate::store::Store;

/// Sign-up payload. Fields are optional so every missing one can be reported.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl SignUpRequest {
    fn validate(self, password_cost: u32) -> Result<NewUser, ServiceError> {
        let mut errors = HashMap::new();

        let first_name = required("firstName", self.first_name, &mut errors);
        let last_name = required("lastName", self.last_name, &mut errors);
        let email = required("email", self.email, &mut errors).map(|e| normalize_email(&e));
        if let Some(email) = &email {
            if !looks_like_email(email) {
                errors.insert("email".to_string(), "email must be a valid address".to_string());
            }
        }
        let password = match self.password {
            Some(p) if !p.is_empty() => Some(p),
            _ => {
                errors.insert("password".to_string(), "password is required".to_string());
                None
            }
        };

        match (first_name, last_name, email, password) {
            (Some(first_name), Some(last_name), Some(email), Some(password)) if errors.is_empty() => {
                Ok(NewUser {
                    first_name,
                    last_name,
                    email,
                    password_hash: hash_password(&password, password_cost)?,
                    role: Role::User,
                })
            }
            _ => Err(ServiceError::Invalid(errors)),
        }
    }
}

/// Emails are compared trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

pub struct UserService<'a> {
    store: &'a dyn Store,
    password_cost: u32,
}

impl<'a> UserService<'a> {
    pub fn new(store: &'a dyn Store, password_cost: u32) -> Self {
        Self {
            store,
            password_cost,
        }
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<User, ServiceError> {
        let user = self
            .store
            .insert_user(request.validate(self.password_cost)?)
            .await?;
        info!("Registered user {} <{}>", user.id, user.email);
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.store.list_users().await?)
    }

    /// Deletes the account together with its todos and tasks.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.store.delete_user(id).await? {
            return Err(ServiceError::not_found("user", id));
        }
        info!("Deleted user {}", id);
        Ok(())
    }

    /// Creates the bootstrap admin unless an account with that email exists.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = normalize_email(email);
        if let Some(existing) = self.store.find_user_by_email(&email).await? {
            return Ok(existing);
        }

        let admin = NewUser {
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            email,
            password_hash: hash_password(password, self.password_cost)?,
            role: Role::Admin,
        };

        let user = self.store.insert_user(admin).await?;
        info!("Created admin account {}", user.email);
        Ok(user)
    }
}
