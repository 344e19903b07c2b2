/**
 * Google Sign-In
 *
 * The browser obtains an ID token from Google and posts it to
 * `/api/auth/google`. The token is checked against Google's `tokeninfo`
 * endpoint; the audience must be our OAuth client id.
 */

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// A verified external identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider-stable subject id
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Google sign-in is not configured")]
    NotConfigured,

    #[error("Invalid credential: {0}")]
    Invalid(String),

    #[error("Identity provider unreachable: {0}")]
    Provider(#[from] reqwest::Error),
}

/// Verifies an identity credential posted by a client
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    #[serde(default)]
    email: Option<String>,
    /// Google sends this as the string "true"/"false"
    #[serde(default)]
    email_verified: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Google ID-token verifier
#[derive(Debug, Clone)]
pub struct GoogleVerifier {
    client: Client,
    client_id: Option<String>,
    tokeninfo_url: String,
}

impl GoogleVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        Self {
            client: Client::new(),
            client_id,
            tokeninfo_url: GOOGLE_TOKENINFO_URL.to_string(),
        }
    }

    fn check(&self, info: TokenInfo) -> Result<VerifiedIdentity, IdentityError> {
        let client_id = self.client_id.as_deref().ok_or(IdentityError::NotConfigured)?;
        if info.aud != client_id {
            return Err(IdentityError::Invalid("audience mismatch".into()));
        }
        if info.email_verified.as_deref() == Some("false") {
            return Err(IdentityError::Invalid("email not verified".into()));
        }
        let email = info
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| IdentityError::Invalid("token carries no email".into()))?;

        Ok(VerifiedIdentity {
            subject: info.sub,
            email,
            name: info.name,
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, IdentityError> {
        if self.client_id.is_none() {
            return Err(IdentityError::NotConfigured);
        }
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", credential)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdentityError::Invalid(format!("tokeninfo returned {}", response.status())));
        }
        let info: TokenInfo = response.json().await?;
        self.check(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(aud: &str, verified: &str) -> TokenInfo {
        TokenInfo {
            aud: aud.into(),
            sub: "1234".into(),
            email: Some("hank@example.com".into()),
            email_verified: Some(verified.into()),
            name: Some("Hank".into()),
        }
    }

    #[test]
    fn test_check_accepts_matching_audience() {
        let verifier = GoogleVerifier::new(Some("client-1".into()));
        let identity = verifier.check(info("client-1", "true")).unwrap();
        assert_eq!(identity.subject, "1234");
        assert_eq!(identity.email, "hank@example.com");
    }

    #[test]
    fn test_check_rejects_other_audience_and_unverified() {
        let verifier = GoogleVerifier::new(Some("client-1".into()));
        assert!(matches!(verifier.check(info("client-2", "true")), Err(IdentityError::Invalid(_))));
        assert!(matches!(verifier.check(info("client-1", "false")), Err(IdentityError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_verifier() {
        let verifier = GoogleVerifier::new(None);
        assert!(matches!(verifier.verify("token").await, Err(IdentityError::NotConfigured)));
    }
}
