//! Startup configuration for the proxy.
//!
//! All Salesforce connection settings are read once from the environment into
//! an explicit [`SalesforceConfig`] that is shared by reference with every
//! adapter, instead of scattering environment reads across call sites.

use serde::Serialize;

use crate::errors::{ProxyError, Result};

/// Default REST API version used for flow invocations.
pub const DEFAULT_API_VERSION: &str = "v64.0";

/// Connection settings for the Salesforce org backing the proxy.
#[derive(Debug, Clone)]
pub struct SalesforceConfig {
    /// Org domain, e.g. `https://example.my.salesforce.com`
    pub domain: String,
    /// Einstein agent API host
    pub api_host: String,
    /// Einstein agent identifier
    pub agent_id: String,
    /// Connected-app client id for the client-credentials token exchange
    pub client_id: String,
    /// Connected-app client secret
    pub client_secret: String,
    /// REST API version segment, e.g. `v64.0`
    pub api_version: String,
    /// Flow returning candidate, application, and posting details
    pub details_flow: String,
    /// Flow returning all listed job postings
    pub job_postings_flow: String,
    /// Flow creating a job application record
    pub create_application_flow: String,
    /// Embedded-messaging bootstrap settings served to the browser
    pub embed: EmbedConfig,
}

/// Fixed configuration object for the embedded chat widget bootstrap.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfig {
    pub org_id: String,
    pub deployment_name: String,
    pub site_url: String,
    pub scrt2_url: String,
    pub language: String,
}

impl SalesforceConfig {
    /// Load the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary key lookup.
    ///
    /// Keeps tests hermetic: fixture configs are built from a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ProxyError::config(format!("missing environment variable {}", key)))
        };
        let optional =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            domain: required("SF_DOMAIN")?,
            api_host: required("SF_API_HOST")?,
            agent_id: required("SF_AGENT_ID")?,
            client_id: required("SF_CLIENT_ID")?,
            client_secret: required("SF_CLIENT_SECRET")?,
            api_version: optional("SF_API_VERSION", DEFAULT_API_VERSION),
            details_flow: required("SF_GET_ALL_DETAILS_FLOW")?,
            job_postings_flow: required("SF_JOB_POSTINGS_FLOW")?,
            create_application_flow: required("SF_CREATE_APPLICATION_FLOW")?,
            embed: EmbedConfig {
                org_id: optional("SF_EMBED_ORG_ID", ""),
                deployment_name: optional("SF_EMBED_DEPLOYMENT_NAME", ""),
                site_url: optional("SF_EMBED_SITE_URL", ""),
                scrt2_url: optional("SF_EMBED_SCRT2_URL", ""),
                language: optional("SF_EMBED_LANGUAGE", "en_US"),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints after loading.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("SF_DOMAIN", &self.domain), ("SF_API_HOST", &self.api_host)] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ProxyError::config(format!(
                    "{} must be an absolute http(s) URL, got '{}'",
                    name, value
                )));
            }
            if value.ends_with('/') {
                return Err(ProxyError::config(format!(
                    "{} must not end with a trailing slash",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Base URL for invoking a named flow action.
    pub fn flow_endpoint(&self, flow_name: &str) -> String {
        format!(
            "{}/services/data/{}/actions/custom/flow/{}",
            self.domain, self.api_version, flow_name
        )
    }

    /// OAuth token endpoint of the org.
    pub fn token_endpoint(&self) -> String {
        format!("{}/services/oauth2/token", self.domain)
    }
}
