//! Read-only projections of the Salesforce records consumed by the proxy.
//!
//! Field names follow the org's custom-field API names (`__c` suffixes) and
//! are only renamed, never transformed, when crossing into the public API.

use serde::{Deserialize, Serialize};

/// Candidate record attached to a job application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateDetails {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Name__c", default)]
    pub name: Option<String>,
    #[serde(rename = "EmailsAddress__c", default)]
    pub email: Option<String>,
    #[serde(rename = "Mobile_Number__c", default)]
    pub mobile: Option<String>,
    #[serde(rename = "Country__c", default)]
    pub country: Option<String>,
    #[serde(rename = "Address__c", default)]
    pub address: Option<String>,
    #[serde(rename = "Pincode__c", default)]
    pub pincode: Option<f64>,
}

/// The job application record itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobApplicationDetails {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Candidate__c", default)]
    pub candidate_id: Option<String>,
    #[serde(rename = "Job_Posting__c", default)]
    pub job_posting_id: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

/// A job posting record, shared between the details flow and the listing flow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPostingDetails {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Job_Name__c", default)]
    pub job_name: Option<String>,
    #[serde(rename = "Company__c", default)]
    pub company: Option<String>,
    #[serde(rename = "location__c", default)]
    pub location: Option<String>,
    #[serde(rename = "Description__c", default)]
    pub description: Option<String>,
    #[serde(rename = "Experience__c", default)]
    pub experience: Option<f64>,
    #[serde(rename = "Type__c", default)]
    pub job_type: Option<String>,
    #[serde(rename = "Work_Mode__c", default)]
    pub work_mode: Option<String>,
    #[serde(rename = "Skills__c", default)]
    pub skills: Option<String>,
    #[serde(rename = "Position__c", default)]
    pub position: Option<String>,
    #[serde(rename = "Minimum_Salary__c", default)]
    pub minimum_salary: Option<f64>,
    #[serde(rename = "Maximum_Salary__c", default)]
    pub maximum_salary: Option<f64>,
    #[serde(rename = "openings__c", default)]
    pub openings: Option<f64>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "CreatedDate", default)]
    pub created_date: Option<String>,
}

/// One answered pre-screening question. A non-empty list of these gates
/// session creation.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionResponse {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Response__c", default)]
    pub response: Option<String>,
    #[serde(rename = "Job_Application__c", default)]
    pub job_application_id: Option<String>,
    #[serde(rename = "Pre_Screening_Question__c", default)]
    pub question_id: Option<String>,
}

/// Public job shape served by `GET /jobs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(rename = "postDate")]
    pub post_date: String,
    pub skills: String,
    pub experience: f64,
    #[serde(rename = "workMode")]
    pub work_mode: String,
    pub openings: f64,
    pub salary_min: f64,
    pub salary_max: f64,
}

impl From<JobPostingDetails> for Job {
    fn from(record: JobPostingDetails) -> Self {
        Self {
            id: record.id.unwrap_or_default(),
            title: record.job_name.unwrap_or_default(),
            company: record.company.unwrap_or_default(),
            location: record.location.unwrap_or_default(),
            description: record.description.unwrap_or_default(),
            job_type: record.job_type.unwrap_or_default(),
            post_date: record.created_date.unwrap_or_default(),
            skills: record.skills.unwrap_or_default(),
            experience: record.experience.unwrap_or_default(),
            work_mode: record.work_mode.unwrap_or_default(),
            openings: record.openings.unwrap_or_default(),
            salary_min: record.minimum_salary.unwrap_or_default(),
            salary_max: record.maximum_salary.unwrap_or_default(),
        }
    }
}
