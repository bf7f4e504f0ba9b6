//! User registration and account management.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use pd_core::constants::MAX_PHONE_LEN;
use pd_core::error::{PdError, PdResult};
use pd_models::{Database, Role, User};

use crate::auth::hash_password;
use crate::event_bus::{AppEvent, EventBus};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Registration payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl NewUser {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    /// Check the fields and resolve the role.
    fn validate(&self) -> PdResult<Role> {
        if self.username.trim().is_empty() {
            return Err(PdError::Validation("username must not be empty".into()));
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(PdError::Validation(format!("invalid email address: {}", self.email)));
        }
        if self.password.is_empty() {
            return Err(PdError::Validation("password must not be empty".into()));
        }
        if let Some(phone) = &self.phone_number {
            if phone.chars().count() > MAX_PHONE_LEN {
                return Err(PdError::Validation(format!(
                    "phone number longer than {MAX_PHONE_LEN} characters"
                )));
            }
        }
        match &self.role {
            Some(role) => Role::from_str(role),
            None => Ok(Role::default()),
        }
    }
}

pub struct UserService {
    database: Database,
    event_bus: EventBus,
}

impl UserService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self { database, event_bus }
    }

    /// Validate, hash the password and store a new account.
    pub fn register(&self, new: NewUser) -> PdResult<User> {
        let role = new.validate()?;
        let mut user = User::new(new.username.trim(), new.email.trim(), hash_password(&new.password)?);
        user.first_name = new.first_name;
        user.last_name = new.last_name;
        user.phone_number = new.phone_number.filter(|p| !p.is_empty());
        user.role = role;

        let conn = self.database.conn()?;
        user.insert(&conn)?;
        info!("registered user {} ({})", user.username, user.role);
        Ok(user)
    }

    pub fn get(&self, user_id: &Uuid) -> PdResult<User> {
        let conn = self.database.conn()?;
        User::find_by_id(&conn, user_id)?.ok_or_else(|| PdError::not_found("user", user_id))
    }

    pub fn find_by_username(&self, username: &str) -> PdResult<Option<User>> {
        let conn = self.database.conn()?;
        User::find_by_username(&conn, username)
    }

    pub fn list(&self) -> PdResult<Vec<User>> {
        let conn = self.database.conn()?;
        User::list(&conn)
    }

    /// Delete an account. Users may only delete themselves.
    pub fn delete(&self, actor: &User, target: &Uuid) -> PdResult<()> {
        if actor.user_id != *target {
            return Err(PdError::PermissionDenied("users can only delete their own account".into()));
        }
        let conn = self.database.conn()?;
        if !User::delete(&conn, target)? {
            return Err(PdError::not_found("user", target));
        }
        info!("deleted user {}", actor.username);
        self.event_bus.emit(AppEvent::UserDeleted { user_id: *target });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        let ok = NewUser::new("alice", "alice@example.com", "pw");
        assert_eq!(ok.validate().unwrap(), Role::Guest);

        let cases = [
            NewUser::new("  ", "alice@example.com", "pw"),
            NewUser::new("alice", "not-an-email", "pw"),
            NewUser::new("alice", "alice@example.com", ""),
            NewUser {
                phone_number: Some("1".repeat(MAX_PHONE_LEN + 1)),
                ..NewUser::new("alice", "alice@example.com", "pw")
            },
            NewUser {
                role: Some("superuser".into()),
                ..NewUser::new("alice", "alice@example.com", "pw")
            },
        ];
        for case in cases {
            assert!(matches!(case.validate(), Err(PdError::Validation(_))), "{case:?}");
        }
    }

    #[test]
    fn test_role_is_parsed() {
        let admin = NewUser {
            role: Some("Admin".into()),
            ..NewUser::new("root", "root@example.com", "pw")
        };
        assert_eq!(admin.validate().unwrap(), Role::Admin);
    }
}
