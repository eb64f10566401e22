//! Credential check
//!
//! A single email/password pair from configuration. There are no tokens
//! and no expiry; a successful check flips the session's logged-in flag.

use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// The configured login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: "admin@example.com".to_string(),
            password: "changeme".to_string(),
        }
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Email is compared case-insensitively, password exactly
    pub fn authenticate(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email_ok = self.email.trim().eq_ignore_ascii_case(email.trim());
        if email_ok && self.password == password {
            Ok(())
        } else {
            tracing::warn!(email = %email.trim(), "Rejected login");
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate() {
        let creds = Credentials::new("analyst@example.com", "s3cret");
        assert!(creds.authenticate("analyst@example.com", "s3cret").is_ok());
        assert!(creds.authenticate(" Analyst@Example.com ", "s3cret").is_ok());
        assert_eq!(
            creds.authenticate("analyst@example.com", "S3CRET"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            creds.authenticate("someone@example.com", "s3cret"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(creds.authenticate("", ""), Err(AuthError::InvalidCredentials));
    }
}
