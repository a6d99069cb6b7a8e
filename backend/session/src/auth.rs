//! Simulated authentication. Nothing is checked against a server: login
//! accepts any well-formed address, sign-up needs a confirmation step.

use std::sync::LazyLock;
use std::time::Duration;

use leadscan_core::Identity;
use regex::Regex;
use tracing::info;

use crate::error::AuthError;

pub const DEFAULT_DISPLAY_NAME: &str = "LeadScan User";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// A sign-up waiting for its (simulated) e-mail verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub email: String,
    pub full_name: String,
}

pub struct Authenticator {
    delay: Duration,
    default_display_name: String,
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(Duration::ZERO, DEFAULT_DISPLAY_NAME)
    }
}

impl Authenticator {
    pub fn new(delay: Duration, default_display_name: impl Into<String>) -> Self {
        Self {
            delay,
            default_display_name: default_display_name.into(),
        }
    }

    /// Sign in as `email`. The identity gets the default display name.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }
        self.simulate_latency().await;
        info!(email = %email, "Signed in");
        Ok(Identity::new(email, self.default_display_name.clone()))
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<PendingVerification, AuthError> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(AuthError::MissingName);
        }
        self.simulate_latency().await;
        info!(email = %email, "Verification sent");
        Ok(PendingVerification {
            email,
            full_name: full_name.to_string(),
        })
    }

    pub async fn verify(&self, pending: PendingVerification) -> Identity {
        self.simulate_latency().await;
        info!(email = %pending.email, "Account verified");
        Identity::new(pending.email, pending.full_name)
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

fn validate_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim();
    if EMAIL_RE.is_match(email) {
        Ok(email.to_string())
    } else {
        Err(AuthError::InvalidEmail(email.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_uses_default_display_name() {
        let auth = Authenticator::new(Duration::ZERO, "Field Sales");
        let identity = auth.login(" jane@acme.com ", "secret").await.unwrap();
        assert_eq!(identity.email, "jane@acme.com");
        assert_eq!(identity.full_name, "Field Sales");
        assert!(identity.is_verified);
    }

    #[tokio::test]
    async fn login_validates_input() {
        let auth = Authenticator::default();
        assert_eq!(
            auth.login("not-an-email", "secret").await.unwrap_err(),
            AuthError::InvalidEmail("not-an-email".into())
        );
        assert_eq!(
            auth.login("jane@acme.com", "").await.unwrap_err(),
            AuthError::MissingPassword
        );
    }

    #[tokio::test]
    async fn sign_up_then_verify() {
        let auth = Authenticator::default();
        let pending = auth.sign_up("x@acme.com", "pw", "  Xavier  ").await.unwrap();
        assert_eq!(pending.full_name, "Xavier");

        let identity = auth.verify(pending).await;
        assert_eq!(identity.email, "x@acme.com");
        assert_eq!(identity.full_name, "Xavier");
        assert!(identity.is_verified);
    }

    #[tokio::test]
    async fn sign_up_requires_a_name() {
        let auth = Authenticator::default();
        assert_eq!(
            auth.sign_up("x@acme.com", "pw", " ").await.unwrap_err(),
            AuthError::MissingName
        );
    }

    #[tokio::test]
    async fn each_login_gets_a_fresh_id() {
        let auth = Authenticator::default();
        let a = auth.login("a@b.co", "pw").await.unwrap();
        let b = auth.login("a@b.co", "pw").await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
