//! Email validation: RFC-shaped syntax check plus an optional provider
//! verification call.

use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

/// RFC-shaped syntax check. Cheap, offline, and the only check that can
/// mark a record `Invalid`.
pub fn is_valid_format(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// `email-verifier` response body (hunter.io shape).
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    data: VerifyData,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
}

/// Validates contact emails before dispatch.
///
/// Always applies the syntax regex. When a provider API key is configured,
/// a deliverability check runs on top; provider or network failures degrade
/// to the regex verdict so a connectivity blip never marks a record Invalid.
pub struct EmailVerifier {
    api_key: Option<SecretString>,
    base_url: String,
    client: reqwest::Client,
}

impl EmailVerifier {
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self::with_base_url(api_key, "https://api.hunter.io".to_string())
    }

    pub fn with_base_url(api_key: Option<SecretString>, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Build from `VERIFY_API_KEY`; without it, verification is regex-only.
    pub fn from_env() -> Self {
        Self::new(std::env::var("VERIFY_API_KEY").ok().map(SecretString::from))
    }

    pub async fn verify(&self, email: &str) -> bool {
        if !is_valid_format(email) {
            return false;
        }
        let Some(key) = &self.api_key else {
            return true;
        };
        match self.check_provider(email, key).await {
            Ok(valid) => valid,
            Err(reason) => {
                tracing::warn!(
                    email,
                    reason,
                    "Verification provider unavailable; accepting syntax verdict"
                );
                true
            }
        }
    }

    async fn check_provider(&self, email: &str, key: &SecretString) -> Result<bool, String> {
        let resp = self
            .client
            .get(format!("{}/v2/email-verifier", self.base_url))
            .query(&[("email", email), ("api_key", key.expose_secret())])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status().is_success() {
            return Err(format!("provider returned status {}", resp.status()));
        }

        let body: VerifyResponse = resp.json().await.map_err(|e| e.to_string())?;
        Ok(body.data.status == "valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_addresses() {
        assert!(is_valid_format("jordan@acme.example"));
        assert!(is_valid_format("first.last+tag@sub.domain.co"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_format(""));
        assert!(!is_valid_format("bad@@x"));
        assert!(!is_valid_format("no-at-sign.example"));
        assert!(!is_valid_format("name@host"));
        assert!(!is_valid_format("name@host.x"));
        assert!(!is_valid_format("spaced name@host.example"));
    }

    #[tokio::test]
    async fn without_api_key_verify_is_regex_only() {
        let verifier = EmailVerifier::new(None);
        assert!(verifier.verify("jordan@acme.example").await);
        assert!(!verifier.verify("bad@@x").await);
    }
}
