use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("user name cannot be empty")]
    EmptyName,

    #[error("user needs an email or a phone number")]
    MissingContact,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

/// Access level of a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// Editable profile fields, validated before a `User` is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}

impl UserProfile {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            role,
        }
    }

    /// Trim and validate the profile.
    ///
    /// # Errors
    ///
    /// Returns `UserError` when the name is blank, both contact fields are
    /// blank, or the email lacks an `@`.
    pub fn validate(self) -> Result<Self, UserError> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let phone = self.phone.trim().to_string();

        if name.is_empty() {
            return Err(UserError::EmptyName);
        }
        if email.is_empty() && phone.is_empty() {
            return Err(UserError::MissingContact);
        }
        if !email.is_empty() && !email.contains('@') {
            return Err(UserError::InvalidEmail(email));
        }

        Ok(Self {
            name,
            email,
            phone,
            role: self.role,
        })
    }
}

/// A person who can sign in, either an admin or a learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    phone: String,
    role: Role,
    created_at: DateTime<Utc>,
}

impl User {
    /// Build a user from a profile.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the profile fails validation.
    pub fn new(
        id: UserId,
        profile: UserProfile,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let profile = profile.validate()?;
        Ok(Self {
            id,
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            role: profile.role,
            created_at,
        })
    }

    /// Replace the editable fields, keeping identity and creation time.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the profile fails validation.
    pub fn with_profile(&self, profile: UserProfile) -> Result<Self, UserError> {
        Self::new(self.id, profile, self.created_at)
    }

    /// Copy of this user under a different id, used when storage assigns ids.
    #[must_use]
    pub fn with_id(&self, id: UserId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn profile_is_trimmed() {
        let user = User::new(
            UserId::new(1),
            UserProfile::new("  Jane Smith ", " jane@example.com", "", Role::User),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(user.name(), "Jane Smith");
        assert_eq!(user.email(), "jane@example.com");
        assert!(!user.is_admin());
    }

    #[test]
    fn profile_requires_contact() {
        let err = UserProfile::new("Jane", " ", "", Role::User)
            .validate()
            .unwrap_err();
        assert_eq!(err, UserError::MissingContact);
    }

    #[test]
    fn phone_only_profile_is_accepted() {
        let profile = UserProfile::new("John", "", "+1234567890", Role::User)
            .validate()
            .unwrap();
        assert_eq!(profile.phone, "+1234567890");
    }

    #[test]
    fn rejects_malformed_email() {
        let err = UserProfile::new("John", "john.example.com", "", Role::User)
            .validate()
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidEmail(_)));
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("owner".parse::<Role>().is_err());
    }
}
