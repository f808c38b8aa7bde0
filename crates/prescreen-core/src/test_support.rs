//! Shared fixtures and trait doubles for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent_api::{
    AgentApi, AgentVariable, CreateSessionPayload, OutboundMessage, SessionCreated,
};
use crate::auth::{AccessToken, TokenProvider};
use crate::config::{EmbedConfig, SalesforceConfig};
use crate::errors::{ProxyError, Result};
use crate::flow::{FlowError, FlowInvocationResult, FlowInvoker};

pub(crate) fn test_config(domain: &str) -> SalesforceConfig {
    SalesforceConfig {
        domain: domain.trim_end_matches('/').to_string(),
        api_host: "https://api.salesforce.com".to_string(),
        agent_id: "agent-1".to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        api_version: "v64.0".to_string(),
        details_flow: "Get_All_Details".to_string(),
        job_postings_flow: "Get_All_Job_Postings".to_string(),
        create_application_flow: "Create_Job_Application".to_string(),
        embed: EmbedConfig {
            org_id: "00Dxx0000000001".to_string(),
            deployment_name: "Prescreen_Chat".to_string(),
            site_url: "https://example.my.site.com/ESW1".to_string(),
            scrt2_url: "https://example.my.salesforce-scrt.com".to_string(),
            language: "en_US".to_string(),
        },
    }
}

/// Canned output of the details flow. `prescreen_responses` controls how many
/// answered pre-screening questions the application carries.
pub(crate) fn details_output(prescreen_responses: usize) -> Value {
    let responses: Vec<Value> = (0..prescreen_responses)
        .map(|i| {
            json!({
                "Id": format!("qr{:02}", i),
                "Response__c": "Yes",
                "Job_Application__c": "ja01",
                "Pre_Screening_Question__c": format!("q{:02}", i),
            })
        })
        .collect();

    json!({
        "Candidate_Details": {
            "Id": "a01",
            "Name__c": "Ada Lovelace",
            "EmailsAddress__c": "ada@example.com",
            "Mobile_Number__c": "555-0100",
            "Country__c": "UK"
        },
        "Job_Application_Details": {
            "Id": "ja01",
            "Candidate__c": "a01",
            "Job_Posting__c": "j01",
            "Name": "JAR-0002"
        },
        "Job_Posting_Details": {
            "Id": "j01",
            "Job_Name__c": "Rust Engineer",
            "Company__c": "Acme",
            "location__c": "Remote",
            "Description__c": "Build proxies",
            "Experience__c": 3.0,
            "Type__c": "Full Time",
            "Work_Mode__c": "Remote",
            "Skills__c": "Rust, HTTP"
        },
        "Job_Application_Question_Response": responses,
        "Flow__InterviewStatus": "Finished"
    })
}

/// Token provider handing out a fixed token, with a call counter.
pub(crate) struct StaticTokens {
    pub calls: Mutex<u32>,
    fail: bool,
}

impl StaticTokens {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(0),
            fail: true,
        })
    }
}

#[async_trait]
impl TokenProvider for StaticTokens {
    async fn access_token(&self) -> Result<AccessToken> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            Err(ProxyError::TokenAcquisition("mock token failure".into()))
        } else {
            Ok(AccessToken::new("test-token"))
        }
    }
}

/// Flow invoker returning one scripted result and recording every invocation.
pub(crate) struct ScriptedFlows {
    result: FlowInvocationResult,
    pub invocations: Mutex<Vec<(String, Value)>>,
}

impl ScriptedFlows {
    pub fn success(output_values: Value) -> Arc<Self> {
        let Value::Object(output_values) = output_values else {
            panic!("output_values fixture must be a JSON object");
        };
        Arc::new(Self {
            result: FlowInvocationResult {
                action_name: "mock_flow".into(),
                is_success: true,
                output_values,
                errors: None,
            },
            invocations: Mutex::new(Vec::new()),
        })
    }

    pub fn failure() -> Arc<Self> {
        Arc::new(Self {
            result: FlowInvocationResult {
                action_name: "mock_flow".into(),
                is_success: false,
                output_values: Default::default(),
                errors: Some(vec![FlowError {
                    status_code: "UNKNOWN_EXCEPTION".into(),
                    message: "mock flow failure".into(),
                    fields: Vec::new(),
                }]),
            },
            invocations: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl FlowInvoker for ScriptedFlows {
    async fn invoke(
        &self,
        _token: &AccessToken,
        flow_name: &str,
        input: Value,
    ) -> Result<FlowInvocationResult> {
        self.invocations
            .lock()
            .unwrap()
            .push((flow_name.to_string(), input));
        Ok(self.result.clone())
    }
}

/// Agent API double that records calls and replies from a fixed session.
pub(crate) struct RecordingAgent {
    session: SessionCreated,
    pub created: Mutex<Vec<CreateSessionPayload>>,
    pub sent: Mutex<Vec<(String, OutboundMessage, Vec<AgentVariable>)>>,
    pub ended: Mutex<Vec<String>>,
}

impl RecordingAgent {
    pub fn with_session(session_id: &str) -> Arc<Self> {
        Arc::new(Self {
            session: SessionCreated {
                session_id: session_id.to_string(),
                messages: vec![json!({ "type": "Inform", "message": "Hello!" })],
            },
            created: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            ended: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AgentApi for RecordingAgent {
    async fn create_session(
        &self,
        _token: &AccessToken,
        payload: &CreateSessionPayload,
    ) -> Result<SessionCreated> {
        self.created.lock().unwrap().push(payload.clone());
        Ok(self.session.clone())
    }

    async fn send_message(
        &self,
        _token: &AccessToken,
        session_id: &str,
        message: &OutboundMessage,
        variables: &[AgentVariable],
    ) -> Result<Vec<Value>> {
        self.sent.lock().unwrap().push((
            session_id.to_string(),
            message.clone(),
            variables.to_vec(),
        ));
        Ok(vec![json!({ "type": "Inform", "message": "ack" })])
    }

    async fn end_session(&self, _token: &AccessToken, session_id: &str) -> Result<()> {
        self.ended.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}
