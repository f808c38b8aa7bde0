//! Core services for the pre-screening chat proxy.
//!
//! This crate holds everything between the HTTP surface and the Salesforce
//! org: startup configuration, the OAuth token provider, the flow invoker,
//! the Einstein agent API client, and the three services built on top of
//! them — the conversational session manager, the job board, and the
//! application submitter. The HTTP layer lives in `prescreen-server`.
//!
//! Collaborators are traits ([`TokenProvider`], [`FlowInvoker`], [`AgentApi`])
//! so every service can be exercised against doubles without a running org.

pub mod agent_api;
pub mod applications;
pub mod auth;
pub mod config;
pub mod errors;
pub mod flow;
pub mod jobs;
pub mod records;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent_api::{AgentApi, AgentVariable, EinsteinAgentClient};
pub use applications::{ApplicationForm, ApplicationReceipt, ApplicationSubmitter};
pub use auth::{AccessToken, SalesforceTokenProvider, TokenProvider};
pub use config::{EmbedConfig, SalesforceConfig};
pub use errors::ProxyError;
pub use flow::{FlowInvoker, HttpFlowInvoker};
pub use jobs::JobBoard;
pub use records::Job;
pub use session::{
    ConversationSession, CreateSessionRequest, EndSessionOutcome, MessageOutcome, SessionHandle,
    SessionManager, MAX_MESSAGE_CHARS,
};
