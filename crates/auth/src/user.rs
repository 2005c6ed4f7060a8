use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocky_core::{DomainError, Entity, UserId};

/// Account role used for coarse authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

/// User account document.
///
/// `password_hash` is stored, never serialized outward; response shaping is
/// the API layer's job and works from the explicit public fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted at registration time. The plaintext password is hashed by
/// the caller before `UserAccount::register`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if self.email.trim().is_empty() {
            return Err(DomainError::validation("email cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }
        Ok(())
    }
}

/// Partial account update. A password change arrives pre-hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserAccount {
    pub fn register(new: NewUser, password_hash: String, now: DateTime<Utc>) -> Result<Self, DomainError> {
        new.validate()?;
        Ok(Self {
            id: UserId::new(),
            username: new.username.trim().to_string(),
            email: new.email.trim().to_string(),
            password_hash,
            role: new.role.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: UserPatch, now: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(username) = patch.username {
            let username = username.trim().to_string();
            if username.is_empty() {
                return Err(DomainError::validation("username cannot be empty"));
            }
            self.username = username;
        }
        if let Some(email) = patch.email {
            let email = email.trim().to_string();
            if email.is_empty() {
                return Err(DomainError::validation("email cannot be empty"));
            }
            self.email = email;
        }
        if let Some(password_hash) = patch.password_hash {
            self.password_hash = password_hash;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for UserAccount {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "s3cret".to_string(),
            role: None,
        }
    }

    #[test]
    fn register_defaults_to_user_role() {
        let account = UserAccount::register(new_user(), "hash".to_string(), Utc::now()).unwrap();
        assert_eq!(account.role, Role::User);
    }

    #[test]
    fn register_rejects_missing_fields() {
        let mut incomplete = new_user();
        incomplete.password = String::new();
        let err = UserAccount::register(incomplete, String::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let account = UserAccount::register(new_user(), "hash".to_string(), Utc::now()).unwrap();
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
