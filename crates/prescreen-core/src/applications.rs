//! Write adapter submitting new job applications.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::TokenProvider;
use crate::config::SalesforceConfig;
use crate::errors::{ProxyError, Result};
use crate::flow::FlowInvoker;

/// Application form as posted by the front end.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state_province: String,
    #[serde(default)]
    pub country: String,
}

/// Successful submission result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationReceipt {
    pub message: String,
    pub job_application_number: String,
}

/// Submits applications through the create-application flow. Independent of
/// session state.
pub struct ApplicationSubmitter {
    tokens: Arc<dyn TokenProvider>,
    flows: Arc<dyn FlowInvoker>,
    config: Arc<SalesforceConfig>,
}

impl ApplicationSubmitter {
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

    pub async fn submit(&self, form: &ApplicationForm) -> Result<ApplicationReceipt> {
        let token = self.tokens.access_token().await?;

        // Unparseable postal codes are forwarded as null, matching the
        // flow's optional numeric input.
        let pin_code = form.postal_code.trim().parse::<f64>().ok();
        let input = json!({
            "jobId": form.job_id,
            "name": format!("{} {}", form.first_name.trim(), form.last_name.trim()),
            "mobile": form.mobile,
            "email": form.email,
            "pinCode": pin_code,
            "address": format!(
                "{}, {}, {}, {}",
                form.street.trim(),
                form.city.trim(),
                form.state_province.trim(),
                form.country.trim()
            ),
            "country": form.country,
        });

        let outcome = self
            .flows
            .invoke(&token, &self.config.create_application_flow, input)
            .await?;
        if !outcome.is_success {
            return Err(ProxyError::ApplicationCreation(outcome.error_summary()));
        }

        let number: Option<String> = outcome.output("jobApplicationNumber");
        let status: Option<String> = outcome.output("statusMessage");
        match (number, status) {
            (_, Some(status)) if status == "fail" => Err(ProxyError::ApplicationCreation(
                "flow reported a fail status".into(),
            )),
            (Some(number), Some(status)) => Ok(ApplicationReceipt {
                message: status,
                job_application_number: number,
            }),
            _ => Err(ProxyError::ApplicationCreation(
                "flow output missing jobApplicationNumber or statusMessage".into(),
            )),
        }
    }
}
