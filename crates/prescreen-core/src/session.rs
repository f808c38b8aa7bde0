//! Session-scoped conversational proxy: create, relay, tear down.
//!
//! The server keeps no per-session state of its own. A created session is
//! handed back to the client as a JSON blob (set as a cookie at the HTTP
//! boundary) and comes back on later requests as a [`SessionHandle`]. Each
//! operation is a short linear pipeline of fallible steps with early exit on
//! the first failure.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::agent_api::{
    AgentApi, AgentVariable, CreateSessionPayload, InstanceConfig, OutboundMessage,
    StreamingCapabilities,
};
use crate::auth::TokenProvider;
use crate::config::SalesforceConfig;
use crate::errors::{ProxyError, Result};
use crate::flow::FlowInvoker;
use crate::records::{CandidateDetails, JobApplicationDetails, JobPostingDetails, QuestionResponse};

/// Upper bound on a relayed user message, enforced before any network call.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Fixed timezone declared on every created session.
pub const SESSION_TIMEZONE: &str = "America/Los_Angeles";

/// Request body for session creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub job_application_number: String,
    #[serde(default)]
    pub terms_and_condition_agreed: bool,
}

/// A created conversation session. Serialized verbatim into both the response
/// body and the session cookie, so the two always carry the same session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub status: String,
    pub messages: Vec<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// The client's proof of an existing session, decoded from the cookie at the
/// HTTP boundary and passed through request context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub session_id: String,
}

/// Outcome of a message relay. A missing session is a soft signal for the
/// client to restart, not an error.
#[derive(Debug)]
pub enum MessageOutcome {
    Delivered(Vec<Value>),
    SessionMissing,
}

/// Outcome of a session teardown.
#[derive(Debug, PartialEq, Eq)]
pub enum EndSessionOutcome {
    Ended,
    SessionMissing,
}

/// Orchestrates session creation, message relay, and teardown against the
/// token provider, flow invoker, and agent API collaborators.
pub struct SessionManager {
    tokens: Arc<dyn TokenProvider>,
    flows: Arc<dyn FlowInvoker>,
    agent: Arc<dyn AgentApi>,
    config: Arc<SalesforceConfig>,
}

impl SessionManager {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        flows: Arc<dyn FlowInvoker>,
        agent: Arc<dyn AgentApi>,
        config: Arc<SalesforceConfig>,
    ) -> Self {
        Self {
            tokens,
            flows,
            agent,
            config,
        }
    }

    /// Validate the job application, derive the conversation seed variables,
    /// and open a session on the remote agent.
    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<ConversationSession> {
        let token = self.tokens.access_token().await?;

        let outcome = self
            .flows
            .invoke(
                &token,
                &self.config.details_flow,
                json!({ "Job_Application_Number": request.job_application_number }),
            )
            .await?;
        if !outcome.is_success {
            return Err(ProxyError::FlowExecution(outcome.error_summary()));
        }

        let candidate: CandidateDetails = outcome
            .output::<CandidateDetails>("Candidate_Details")
            .filter(|c| c.id.is_some())
            .ok_or(ProxyError::InvalidJobApplicationNumber)?;

        // Hard business rule: a completed pre-screening blocks a new session.
        let responses: Vec<QuestionResponse> = outcome
            .output("Job_Application_Question_Response")
            .unwrap_or_default();
        if !responses.is_empty() {
            log::info!(
                "Rejecting session for {}: {} pre-screening responses already recorded",
                request.job_application_number,
                responses.len()
            );
            return Err(ProxyError::PreScreeningCompleted);
        }

        let application: Option<JobApplicationDetails> = outcome.output("Job_Application_Details");
        let posting: Option<JobPostingDetails> = outcome.output("Job_Posting_Details");

        let payload = CreateSessionPayload {
            external_session_key: Uuid::new_v4().to_string(),
            instance_config: InstanceConfig {
                endpoint: self.config.domain.clone(),
            },
            tz: SESSION_TIMEZONE.to_string(),
            variables: seed_variables(
                request,
                &candidate,
                application.as_ref(),
                posting.as_ref(),
                &responses,
            ),
            feature_support: "Streaming".to_string(),
            streaming_capabilities: StreamingCapabilities {
                chunk_types: vec!["Text".to_string()],
            },
            bypass_user: true,
        };

        let created = self.agent.create_session(&token, &payload).await?;
        log::info!(
            "Created agent session {} for application {}",
            created.session_id,
            request.job_application_number
        );

        Ok(ConversationSession {
            status: "success".to_string(),
            messages: created.messages,
            session_id: created.session_id,
        })
    }

    /// Relay one user message into an existing session and return the agent's
    /// replies unmodified.
    pub async fn send_message(
        &self,
        handle: Option<&SessionHandle>,
        text: &str,
        variables: Vec<AgentVariable>,
    ) -> Result<MessageOutcome> {
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ProxyError::MessageTooLong);
        }
        let Some(handle) = handle else {
            return Ok(MessageOutcome::SessionMissing);
        };

        let token = self.tokens.access_token().await?;

        let message = OutboundMessage {
            sequence_id: Utc::now().timestamp_millis().to_string(),
            kind: "Text".to_string(),
            // An empty message is deliberately relayed as "hi"; documented
            // behavior of this proxy, not an accident.
            text: if text.is_empty() {
                "hi".to_string()
            } else {
                text.to_string()
            },
        };

        let replies = self
            .agent
            .send_message(&token, &handle.session_id, &message, &variables)
            .await?;
        Ok(MessageOutcome::Delivered(replies))
    }

    /// End the remote session. Missing handle is a soft no-op.
    pub async fn end_session(&self, handle: Option<&SessionHandle>) -> Result<EndSessionOutcome> {
        let Some(handle) = handle else {
            return Ok(EndSessionOutcome::SessionMissing);
        };

        let token = self.tokens.access_token().await?;
        self.agent.end_session(&token, &handle.session_id).await?;
        log::info!("Ended agent session {}", handle.session_id);
        Ok(EndSessionOutcome::Ended)
    }
}

/// Build the fixed, ordered variable list seeding a new session. Missing
/// optional record fields become empty strings.
fn seed_variables(
    request: &CreateSessionRequest,
    candidate: &CandidateDetails,
    application: Option<&JobApplicationDetails>,
    posting: Option<&JobPostingDetails>,
    responses: &[QuestionResponse],
) -> Vec<AgentVariable> {
    let opt = |value: &Option<String>| value.clone().unwrap_or_default();
    let num = |value: &Option<f64>| value.map(|n| n.to_string()).unwrap_or_default();

    vec![
        AgentVariable::text("$Context.EndUserLanguage", "en_US"),
        AgentVariable::text("JobApplicationNumber", &request.job_application_number),
        AgentVariable::text(
            "Job_Application_ID",
            application.map(|a| opt(&a.id)).unwrap_or_default(),
        ),
        AgentVariable::text(
            "jobLocation",
            posting.map(|p| opt(&p.location)).unwrap_or_default(),
        ),
        AgentVariable::text("candidateId", opt(&candidate.id)),
        AgentVariable::text("candidateName", opt(&candidate.name)),
        AgentVariable::text("candidateEmail", opt(&candidate.email)),
        AgentVariable::text("candidatePhone", opt(&candidate.mobile)),
        AgentVariable::text("candidateCountry", opt(&candidate.country)),
        AgentVariable::text(
            "jobName",
            posting.map(|p| opt(&p.job_name)).unwrap_or_default(),
        ),
        AgentVariable::text(
            "jobCompanyName",
            posting.map(|p| opt(&p.company)).unwrap_or_default(),
        ),
        AgentVariable::text(
            "jobType",
            posting.map(|p| opt(&p.job_type)).unwrap_or_default(),
        ),
        AgentVariable::text(
            "jobWorkMode",
            posting.map(|p| opt(&p.work_mode)).unwrap_or_default(),
        ),
        AgentVariable::text(
            "jobExperience",
            posting.map(|p| num(&p.experience)).unwrap_or_default(),
        ),
        AgentVariable::text(
            "jobDescription",
            posting.map(|p| opt(&p.description)).unwrap_or_default(),
        ),
        AgentVariable::text(
            "jobSkillsRequired",
            posting.map(|p| opt(&p.skills)).unwrap_or_default(),
        ),
        AgentVariable::text(
            "T_C_Agreed",
            if request.terms_and_condition_agreed {
                "true"
            } else {
                "false"
            },
        ),
        AgentVariable::text(
            "allowUser",
            if responses.is_empty() { "true" } else { "false" },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        details_output, test_config, RecordingAgent, ScriptedFlows, StaticTokens,
    };

    fn manager(
        tokens: Arc<StaticTokens>,
        flows: Arc<ScriptedFlows>,
        agent: Arc<RecordingAgent>,
    ) -> SessionManager {
        SessionManager::new(
            tokens,
            flows,
            agent,
            Arc::new(test_config("https://org.my.salesforce.com")),
        )
    }

    fn create_request() -> CreateSessionRequest {
        CreateSessionRequest {
            job_application_number: "JAR-0002".into(),
            terms_and_condition_agreed: true,
        }
    }

    #[tokio::test]
    async fn creates_session_and_seeds_allow_user_true() {
        let tokens = StaticTokens::ok();
        let flows = ScriptedFlows::success(details_output(0));
        let agent = RecordingAgent::with_session("s-42");

        let session = manager(tokens, flows.clone(), agent.clone())
            .create_session(&create_request())
            .await
            .unwrap();

        assert_eq!(session.session_id, "s-42");
        assert_eq!(session.status, "success");

        let invocations = flows.invocations.lock().unwrap();
        assert_eq!(invocations[0].0, "Get_All_Details");
        assert_eq!(invocations[0].1["Job_Application_Number"], "JAR-0002");

        let created = agent.created.lock().unwrap();
        let variables = &created[0].variables;
        assert_eq!(variables[0], AgentVariable::text("$Context.EndUserLanguage", "en_US"));
        assert_eq!(variables[1], AgentVariable::text("JobApplicationNumber", "JAR-0002"));
        let allow_user = variables.iter().find(|v| v.name == "allowUser").unwrap();
        assert_eq!(allow_user.value, "true");
        let terms = variables.iter().find(|v| v.name == "T_C_Agreed").unwrap();
        assert_eq!(terms.value, "true");
        assert_eq!(created[0].tz, SESSION_TIMEZONE);
        assert!(created[0].bypass_user);
    }

    #[tokio::test]
    async fn completed_pre_screening_blocks_session_creation() {
        let tokens = StaticTokens::ok();
        let flows = ScriptedFlows::success(details_output(1));
        let agent = RecordingAgent::with_session("s-42");

        let err = manager(tokens, flows, agent.clone())
            .create_session(&create_request())
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::PreScreeningCompleted));
        assert_eq!(err.status_code(), 403);
        // The remote create endpoint must never be reached
        assert!(agent.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_candidate_id_is_an_invalid_application_number() {
        let tokens = StaticTokens::ok();
        let mut output = details_output(0);
        output["Candidate_Details"] = serde_json::Value::Null;
        let flows = ScriptedFlows::success(output);
        let agent = RecordingAgent::with_session("s-42");

        let err = manager(tokens, flows, agent.clone())
            .create_session(&create_request())
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::InvalidJobApplicationNumber));
        assert!(agent.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn flow_failure_aborts_session_creation() {
        let tokens = StaticTokens::ok();
        let flows = ScriptedFlows::failure();
        let agent = RecordingAgent::with_session("s-42");

        let err = manager(tokens, flows, agent.clone())
            .create_session(&create_request())
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::FlowExecution(_)));
        assert!(agent.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn token_failure_propagates_before_any_flow_call() {
        let tokens = StaticTokens::failing();
        let flows = ScriptedFlows::success(details_output(0));
        let agent = RecordingAgent::with_session("s-42");

        let err = manager(tokens, flows.clone(), agent)
            .create_session(&create_request())
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::TokenAcquisition(_)));
        assert!(flows.invocations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_message_is_rejected_without_network_calls() {
        let tokens = StaticTokens::ok();
        let flows = ScriptedFlows::success(details_output(0));
        let agent = RecordingAgent::with_session("s-42");
        let handle = SessionHandle {
            session_id: "s-42".into(),
        };

        let err = manager(tokens.clone(), flows, agent.clone())
            .send_message(Some(&handle), &"x".repeat(MAX_MESSAGE_CHARS + 1), vec![])
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::MessageTooLong));
        assert_eq!(*tokens.calls.lock().unwrap(), 0);
        assert!(agent.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn message_at_the_limit_is_relayed() {
        let tokens = StaticTokens::ok();
        let flows = ScriptedFlows::success(details_output(0));
        let agent = RecordingAgent::with_session("s-42");
        let handle = SessionHandle {
            session_id: "s-42".into(),
        };

        let outcome = manager(tokens, flows, agent.clone())
            .send_message(Some(&handle), &"x".repeat(MAX_MESSAGE_CHARS), vec![])
            .await
            .unwrap();

        assert!(matches!(outcome, MessageOutcome::Delivered(_)));
        assert_eq!(agent.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_handle_is_a_soft_restart_signal() {
        let tokens = StaticTokens::ok();
        let flows = ScriptedFlows::success(details_output(0));
        let agent = RecordingAgent::with_session("s-42");

        let outcome = manager(tokens.clone(), flows, agent.clone())
            .send_message(None, "hello", vec![])
            .await
            .unwrap();

        assert!(matches!(outcome, MessageOutcome::SessionMissing));
        assert_eq!(*tokens.calls.lock().unwrap(), 0);
        assert!(agent.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_message_defaults_to_hi() {
        let tokens = StaticTokens::ok();
        let flows = ScriptedFlows::success(details_output(0));
        let agent = RecordingAgent::with_session("s-42");
        let handle = SessionHandle {
            session_id: "s-42".into(),
        };

        manager(tokens, flows, agent.clone())
            .send_message(Some(&handle), "", vec![])
            .await
            .unwrap();

        let sent = agent.sent.lock().unwrap();
        assert_eq!(sent[0].1.text, "hi");
        assert_eq!(sent[0].1.kind, "Text");
    }

    #[tokio::test]
    async fn passthrough_variables_reach_the_agent() {
        let tokens = StaticTokens::ok();
        let flows = ScriptedFlows::success(details_output(0));
        let agent = RecordingAgent::with_session("s-42");
        let handle = SessionHandle {
            session_id: "s-42".into(),
        };
        let vars = vec![AgentVariable::text("candidateId", "a01")];

        manager(tokens, flows, agent.clone())
            .send_message(Some(&handle), "hello", vars.clone())
            .await
            .unwrap();

        let sent = agent.sent.lock().unwrap();
        assert_eq!(sent[0].0, "s-42");
        assert_eq!(sent[0].2, vars);
    }

    #[tokio::test]
    async fn end_session_without_handle_is_a_no_op() {
        let tokens = StaticTokens::ok();
        let flows = ScriptedFlows::success(details_output(0));
        let agent = RecordingAgent::with_session("s-42");

        let outcome = manager(tokens.clone(), flows, agent.clone())
            .end_session(None)
            .await
            .unwrap();

        assert_eq!(outcome, EndSessionOutcome::SessionMissing);
        assert_eq!(*tokens.calls.lock().unwrap(), 0);
        assert!(agent.ended.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_session_deletes_the_remote_session() {
        let tokens = StaticTokens::ok();
        let flows = ScriptedFlows::success(details_output(0));
        let agent = RecordingAgent::with_session("s-42");
        let handle = SessionHandle {
            session_id: "s-42".into(),
        };

        let outcome = manager(tokens, flows, agent.clone())
            .end_session(Some(&handle))
            .await
            .unwrap();

        assert_eq!(outcome, EndSessionOutcome::Ended);
        assert_eq!(agent.ended.lock().unwrap().as_slice(), ["s-42"]);
    }
}
