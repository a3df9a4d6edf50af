//! Validated email address.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why an email string was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email is {0} characters, limit is {max}", max = Email::MAX_LENGTH)]
    TooLong(usize),
    #[error("email must contain an @ sign")]
    NoAtSign,
    #[error("email is missing the part before the @")]
    MissingLocal,
    #[error("email is missing the domain after the @")]
    MissingDomain,
}

/// An email address that passed structural validation.
///
/// Validation is deliberately shallow: a non-empty local part and domain
/// around an @ sign, within the RFC 5321 length limit. Customer resolution
/// compares emails as exact strings, so no case folding or other
/// normalization happens here; callers trim whitespace before parsing.
///
/// ```
/// use mercadito_core::Email;
///
/// let email = Email::parse("ana@example.com").expect("valid");
/// assert_eq!(email.as_str(), "ana@example.com");
///
/// assert!(Email::parse("ana.example.com").is_err());
/// assert!(Email::parse("@example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 address length limit.
    pub const MAX_LENGTH: usize = 254;

    /// Validate a string as an email address.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] describing the first structural problem found.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong(s.len()));
        }

        match s.split_once('@') {
            None => Err(EmailError::NoAtSign),
            Some(("", _)) => Err(EmailError::MissingLocal),
            Some((_, "")) => Err(EmailError::MissingDomain),
            Some(_) => Ok(Self(s.to_owned())),
        }
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ordinary_addresses() {
        for candidate in ["ana@example.com", "ana.torres+orders@tienda.mx", "a@b.c"] {
            assert!(Email::parse(candidate).is_ok(), "rejected {candidate}");
        }
    }

    #[test]
    fn test_rejects_structural_problems() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at-sign"), Err(EmailError::NoAtSign));
        assert_eq!(Email::parse("@example.com"), Err(EmailError::MissingLocal));
        assert_eq!(Email::parse("ana@"), Err(EmailError::MissingDomain));
    }

    #[test]
    fn test_rejects_over_length_limit() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong(long.len())));
    }

    #[test]
    fn test_second_at_sign_lands_in_domain() {
        // split_once splits on the first @; the rest counts as domain text
        // under the shallow-validation contract.
        assert!(Email::parse("ana@b@c").is_ok());
    }

    #[test]
    fn test_serializes_as_bare_string() {
        let email = Email::parse("ana@example.com").expect("valid");
        let json = serde_json::to_string(&email).expect("serialize");
        assert_eq!(json, "\"ana@example.com\"");

        let back: Email = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, email);
    }

    #[test]
    fn test_display_and_as_ref() {
        let email: Email = "ana@example.com".parse().expect("valid");
        assert_eq!(email.to_string(), "ana@example.com");
        assert_eq!(email.as_ref(), "ana@example.com");
    }
}
