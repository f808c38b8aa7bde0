//! Read adapter listing the job postings of the org.

use std::sync::Arc;

use serde_json::json;

use crate::auth::TokenProvider;
use crate::config::SalesforceConfig;
use crate::errors::{ProxyError, Result};
use crate::flow::FlowInvoker;
use crate::records::{Job, JobPostingDetails};

/// Lists currently published job postings through the postings flow.
/// Independent of session state.
pub struct JobBoard {
    tokens: Arc<dyn TokenProvider>,
    flows: Arc<dyn FlowInvoker>,
    config: Arc<SalesforceConfig>,
}

impl JobBoard {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        flows: Arc<dyn FlowInvoker>,
        config: Arc<SalesforceConfig>,
    ) -> Self {
        Self {
            tokens,
            flows,
            config,
        }
    }

    /// Fetch all listed postings and map them into the public [`Job`] shape.
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let token = self.tokens.access_token().await?;

        let outcome = self
            .flows
            .invoke(
                &token,
                &self.config.job_postings_flow,
                json!({ "fetchData": true }),
            )
            .await?;
        if !outcome.is_success {
            return Err(ProxyError::FlowExecution(outcome.error_summary()));
        }

        let records: Vec<JobPostingDetails> =
            outcome.output("jobPostingsRecord").ok_or_else(|| {
                ProxyError::FlowExecution("job postings flow returned no record list".into())
            })?;
        if records.is_empty() {
            return Err(ProxyError::NoJobsListed);
        }

        Ok(records.into_iter().map(Job::from).collect())
    }
}
