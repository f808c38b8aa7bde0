//! Client for the Einstein AI Agent REST API.
//!
//! Three calls, all bearer-authenticated against the agent API host:
//! create a session, post a message into it, and end it. Inbound agent
//! messages are opaque JSON values and are passed through unmodified.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AccessToken;
use crate::config::SalesforceConfig;
use crate::errors::{ProxyError, Result};

/// A named text variable seeded into or passed along with a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

impl AgentVariable {
    /// Convenience constructor for the `Text`-typed variables this proxy uses.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "Text".to_string(),
            value: Value::String(value.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceConfig {
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingCapabilities {
    pub chunk_types: Vec<String>,
}

/// Payload for the session-create endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionPayload {
    pub external_session_key: String,
    pub instance_config: InstanceConfig,
    pub tz: String,
    pub variables: Vec<AgentVariable>,
    pub feature_support: String,
    pub streaming_capabilities: StreamingCapabilities,
    pub bypass_user: bool,
}

/// Successful session-create response: the new session id plus the agent's
/// greeting messages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<Value>,
}

/// One outbound user message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub sequence_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct MessagesEnvelope {
    #[serde(default)]
    messages: Vec<Value>,
}

/// Seam over the remote agent API, mockable in service tests.
#[async_trait]
pub trait AgentApi: Send + Sync {
    async fn create_session(
        &self,
        token: &AccessToken,
        payload: &CreateSessionPayload,
    ) -> Result<SessionCreated>;

    async fn send_message(
        &self,
        token: &AccessToken,
        session_id: &str,
        message: &OutboundMessage,
        variables: &[AgentVariable],
    ) -> Result<Vec<Value>>;

    async fn end_session(&self, token: &AccessToken, session_id: &str) -> Result<()>;
}

/// Reqwest-backed client for the Einstein agent API host.
pub struct EinsteinAgentClient {
    http: reqwest::Client,
    api_host: String,
    agent_id: String,
}

impl EinsteinAgentClient {
    pub fn new(config: &SalesforceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_host: config.api_host.clone(),
            agent_id: config.agent_id.clone(),
        }
    }
}

#[async_trait]
impl AgentApi for EinsteinAgentClient {
    async fn create_session(
        &self,
        token: &AccessToken,
        payload: &CreateSessionPayload,
    ) -> Result<SessionCreated> {
        let endpoint = format!(
            "{}/einstein/ai-agent/v1/agents/{}/sessions",
            self.api_host, self.agent_id
        );

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(token.secret())
            .json(payload)
            .send()
            .await
            .map_err(|e| ProxyError::SessionCreation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Agent session create returned {}", status);
            return Err(ProxyError::SessionCreation(format!(
                "session create returned {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProxyError::SessionCreation(format!("malformed create response: {}", e)))
    }

    async fn send_message(
        &self,
        token: &AccessToken,
        session_id: &str,
        message: &OutboundMessage,
        variables: &[AgentVariable],
    ) -> Result<Vec<Value>> {
        let endpoint = format!(
            "{}/einstein/ai-agent/v1/sessions/{}/messages",
            self.api_host, session_id
        );

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(token.secret())
            .header("Accept", "application/json")
            .json(&json!({ "message": message, "variables": variables }))
            .send()
            .await
            .map_err(|e| ProxyError::MessageSend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Agent message to session {} returned {}", session_id, status);
            return Err(ProxyError::MessageSend(format!(
                "message endpoint returned {}",
                status
            )));
        }

        let envelope: MessagesEnvelope = response
            .json()
            .await
            .map_err(|e| ProxyError::MessageSend(format!("malformed message response: {}", e)))?;
        Ok(envelope.messages)
    }

    async fn end_session(&self, token: &AccessToken, session_id: &str) -> Result<()> {
        let endpoint = format!(
            "{}/einstein/ai-agent/v1/sessions/{}",
            self.api_host, session_id
        );

        let response = self
            .http
            .delete(&endpoint)
            .bearer_auth(token.secret())
            .header("x-session-end-reason", "UserRequest")
            .send()
            .await
            .map_err(|e| ProxyError::SessionDeletion(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Agent session delete for {} returned {}", session_id, status);
            return Err(ProxyError::SessionDeletion(format!(
                "session delete returned {}",
                status
            )));
        }
        Ok(())
    }
}
