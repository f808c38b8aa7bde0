//! Error types for the pre-screening chat proxy.
//!
//! Every downstream failure is caught at the call site and mapped to a fixed
//! HTTP status and public message pair. The internal detail carried by a
//! variant is for logging only and never reaches a response body.

use thiserror::Error;

/// Result type alias for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Failure modes of the proxy, one per remote-call or validation branch.
#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    /// The OAuth token endpoint rejected or dropped the request
    #[error("Access token request failed: {0}")]
    TokenAcquisition(String),

    /// A flow invocation returned isSuccess=false or could not be parsed
    #[error("Flow execution failed: {0}")]
    FlowExecution(String),

    /// The details flow returned no candidate for the application number
    #[error("No candidate matches the given job application number")]
    InvalidJobApplicationNumber,

    /// The application already has pre-screening question responses
    #[error("Pre-screening has already been completed for this application")]
    PreScreeningCompleted,

    /// The remote agent session-create endpoint failed
    #[error("Agent session creation failed: {0}")]
    SessionCreation(String),

    /// The user message exceeds the 2000 character limit
    #[error("Message exceeds the 2000 character limit")]
    MessageTooLong,

    /// The remote agent message endpoint failed
    #[error("Message delivery failed: {0}")]
    MessageSend(String),

    /// The remote agent session-delete endpoint failed
    #[error("Agent session deletion failed: {0}")]
    SessionDeletion(String),

    /// The job postings flow returned an empty record list
    #[error("No job postings are currently listed")]
    NoJobsListed,

    /// The create-application flow failed or reported a fail status
    #[error("Job application creation failed: {0}")]
    ApplicationCreation(String),

    /// Invalid or incomplete startup configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProxyError {
    /// HTTP status code this error maps to at the API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::InvalidJobApplicationNumber | ProxyError::MessageTooLong => 400,
            ProxyError::PreScreeningCompleted => 403,
            ProxyError::NoJobsListed => 404,
            ProxyError::TokenAcquisition(_)
            | ProxyError::FlowExecution(_)
            | ProxyError::SessionCreation(_)
            | ProxyError::MessageSend(_)
            | ProxyError::SessionDeletion(_)
            | ProxyError::ApplicationCreation(_)
            | ProxyError::Config(_) => 500,
        }
    }

    /// Opaque message exposed to API callers. Internal detail stays in logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::TokenAcquisition(_) => "Failed to get access token",
            ProxyError::FlowExecution(_) => "Flow execution failed",
            ProxyError::InvalidJobApplicationNumber => "Invalid Job Application number",
            ProxyError::PreScreeningCompleted => "Candidate Pre Screening Already Done",
            ProxyError::SessionCreation(_) => "Session creation failed",
            ProxyError::MessageTooLong => "Message too long",
            ProxyError::MessageSend(_) => "Failed to send message",
            ProxyError::SessionDeletion(_) => "Failed to delete session",
            ProxyError::NoJobsListed => "No Job Listed Currently",
            ProxyError::ApplicationCreation(_) => "Failed to create job application",
            ProxyError::Config(_) => "Server configuration error",
        }
    }

    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
