//! User identity model.
//!
//! Users are independent aggregates referenced by households (owner) and by
//! membership. The membership services are the only writers of the
//! `household_id` back-reference.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::household::HouseholdId;

/// Validation errors raised by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email is not a valid address")]
    InvalidEmail,
    #[error("full name must not be empty")]
    EmptyFullName,
    #[error("full name must be at most {max} characters")]
    FullNameTooLong { max: usize },
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Wrap an identifier that already exists in storage.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Deliberately permissive; deliverability is the mailer's problem.
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into();
        if email.trim().is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !email_regex().is_match(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }

    /// Wrap a value already validated at the boundary or loaded from storage.
    pub(crate) fn from_trusted(email: String) -> Self {
        Self(email)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum allowed length for a person's full name.
pub const FULL_NAME_MAX: usize = 100;

/// Validated full name shared by registered users and unregistered members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonName(String);

impl PersonName {
    /// Validate and construct a [`PersonName`].
    pub fn new(name: impl Into<String>) -> Result<Self, UserValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(UserValidationError::EmptyFullName);
        }
        if name.chars().count() > FULL_NAME_MAX {
            return Err(UserValidationError::FullNameTooLong { max: FULL_NAME_MAX });
        }
        Ok(Self(name))
    }

    /// Wrap a value already validated at the boundary or loaded from storage.
    pub(crate) fn from_trusted(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PersonName> for String {
    fn from(value: PersonName) -> Self {
        value.0
    }
}

impl TryFrom<String> for PersonName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Authorisation role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

impl Role {
    /// Storage representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered user account.
///
/// ## Invariants
/// - `household_id` is only mutated through the membership services, never
///   directly by adapters.
/// - The password hash never leaves the domain; read models project users
///   through [`MemberProfile`](super::household::MemberProfile).
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub full_name: PersonName,
    pub role: Role,
    pub confirmed: bool,
    pub confirmation_token: Option<String>,
    pub household_id: Option<HouseholdId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ada@example.org")]
    #[case("ada.lovelace+house@sub.example.org")]
    fn valid_emails_are_accepted(#[case] input: &str) {
        let email = EmailAddress::new(input).expect("valid email");
        assert_eq!(email.as_ref(), input);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("not-an-email")]
    #[case("two@@example.org")]
    #[case("spaces in@example.org")]
    fn invalid_emails_are_rejected(#[case] input: &str) {
        assert!(EmailAddress::new(input).is_err());
    }

    #[test]
    fn empty_full_names_are_rejected() {
        assert_eq!(
            PersonName::new("  "),
            Err(UserValidationError::EmptyFullName)
        );
    }

    #[test]
    fn overlong_full_names_are_rejected() {
        let name = "x".repeat(FULL_NAME_MAX + 1);
        assert_eq!(
            PersonName::new(name),
            Err(UserValidationError::FullNameTooLong { max: FULL_NAME_MAX })
        );
    }

    #[rstest]
    #[case(Role::User, "user")]
    #[case(Role::Admin, "admin")]
    #[case(Role::Superadmin, "superadmin")]
    fn roles_round_trip_through_storage_form(#[case] role: Role, #[case] text: &str) {
        assert_eq!(role.as_str(), text);
        assert_eq!(text.parse::<Role>(), Ok(role));
    }

    #[test]
    fn unknown_roles_fail_to_parse() {
        assert!("owner".parse::<Role>().is_err());
    }
}
