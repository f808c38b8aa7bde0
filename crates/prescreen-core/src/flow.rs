//! Invocation of named Salesforce flow actions.
//!
//! A flow is a remote procedure invoked with a single input record through
//! `POST /services/data/{version}/actions/custom/flow/{name}`. The response
//! is an array with one result per input; this proxy always sends exactly one
//! input and reads exactly one result.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::AccessToken;
use crate::config::SalesforceConfig;
use crate::errors::{ProxyError, Result};

/// One error entry reported by a failed flow run.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowError {
    #[serde(rename = "statusCode", default)]
    pub status_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Result of a single flow invocation. Transient, lives for one request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowInvocationResult {
    #[serde(default)]
    pub action_name: String,
    #[serde(default)]
    pub is_success: bool,
    #[serde(default)]
    pub output_values: Map<String, Value>,
    #[serde(default)]
    pub errors: Option<Vec<FlowError>>,
}

impl FlowInvocationResult {
    /// Deserialize one named output value, treating JSON null as absent.
    pub fn output<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.output_values
            .get(key)
            .filter(|value| !value.is_null())
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Flattened error list for diagnostics.
    pub fn error_summary(&self) -> String {
        match &self.errors {
            Some(errors) if !errors.is_empty() => errors
                .iter()
                .map(|e| format!("{}: {}", e.status_code, e.message))
                .collect::<Vec<_>>()
                .join("; "),
            _ => "flow reported failure without error detail".to_string(),
        }
    }
}

/// Seam for invoking flows, mockable in service tests.
#[async_trait]
pub trait FlowInvoker: Send + Sync {
    async fn invoke(
        &self,
        token: &AccessToken,
        flow_name: &str,
        input: Value,
    ) -> Result<FlowInvocationResult>;
}

/// Flow invoker backed by the org's REST action endpoint.
pub struct HttpFlowInvoker {
    http: reqwest::Client,
    config: SalesforceConfig,
}

impl HttpFlowInvoker {
    pub fn new(config: &SalesforceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
        }
    }
}

#[async_trait]
impl FlowInvoker for HttpFlowInvoker {
    async fn invoke(
        &self,
        token: &AccessToken,
        flow_name: &str,
        input: Value,
    ) -> Result<FlowInvocationResult> {
        let endpoint = self.config.flow_endpoint(flow_name);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(token.secret())
            .json(&json!({ "inputs": [input] }))
            .send()
            .await
            .map_err(|e| ProxyError::FlowExecution(format!("flow '{}': {}", flow_name, e)))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Flow '{}' returned {}", flow_name, status);
            return Err(ProxyError::FlowExecution(format!(
                "flow '{}' returned {}",
                flow_name, status
            )));
        }

        let mut results: Vec<FlowInvocationResult> = response.json().await.map_err(|e| {
            ProxyError::FlowExecution(format!("flow '{}' returned malformed body: {}", flow_name, e))
        })?;

        if results.is_empty() {
            return Err(ProxyError::FlowExecution(format!(
                "flow '{}' returned an empty result array",
                flow_name
            )));
        }
        Ok(results.remove(0))
    }
}
