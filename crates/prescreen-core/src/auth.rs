//! Access token acquisition for the Salesforce org.
//!
//! Tokens are short-lived and fetched once per incoming request; no caching
//! is attempted. The [`TokenProvider`] trait is the seam that lets the
//! services run against a canned token in tests.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SalesforceConfig;
use crate::errors::{ProxyError, Result};

/// A bearer token for the org's REST APIs.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token value, used only when building Authorization headers.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token values must never end up in logs
        f.debug_tuple("AccessToken").field(&"<redacted>").finish()
    }
}

/// Source of per-request access tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken>;
}

/// Token provider performing the OAuth2 client-credentials exchange against
/// the org's token endpoint.
pub struct SalesforceTokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl SalesforceTokenProvider {
    pub fn new(config: &SalesforceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: config.token_endpoint(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }
}

#[async_trait]
impl TokenProvider for SalesforceTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProxyError::TokenAcquisition(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Token endpoint returned {}", status);
            return Err(ProxyError::TokenAcquisition(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProxyError::TokenAcquisition(format!("malformed token response: {}", e)))?;

        Ok(AccessToken::new(body.access_token))
    }
}
