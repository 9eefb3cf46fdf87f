use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{FinalRecord, NOT_AVAILABLE};

pub const DEFAULT_CANDIDATE_EMAIL: &str = "default@example.com";
const APPLICANT_SOURCE: &str = "Linkedin";

#[derive(Debug, Error)]
pub enum HiringError {
    #[error("no hiring API token configured (set PROMPTHIRE_TOKEN or hiring_token)")]
    MissingToken,
    #[error("hiring API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("hiring API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected hiring API response: {0}")]
    Decode(String),
}

/// Payload accepted by `POST /applicants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantSubmission {
    pub job_opening_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_phone: String,
    pub experience: Option<String>,
    pub skills: Vec<String>,
    pub current_company: String,
    pub linkedin_profile: Option<String>,
    pub current_location: String,
    pub notable_company: Vec<String>,
    pub source: String,
}

fn or_not_available(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ApplicantSubmission {
    pub fn from_final(record: &FinalRecord, job_opening_id: impl Into<String>) -> Self {
        Self {
            job_opening_id: job_opening_id.into(),
            candidate_name: or_not_available(&record.name),
            candidate_email: DEFAULT_CANDIDATE_EMAIL.to_string(),
            candidate_phone: NOT_AVAILABLE.to_string(),
            experience: non_empty(&record.total_experience),
            skills: record
                .skills
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            current_company: or_not_available(&record.current_company),
            linkedin_profile: non_empty(&record.profile_link),
            current_location: or_not_available(&record.location),
            notable_company: Vec::new(),
            source: APPLICANT_SOURCE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobOpening {
    pub id: String,
    pub title: String,
    pub department: Option<String>,
}

fn first_str(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

impl JobOpening {
    fn from_value(value: &Value) -> Option<Self> {
        let id = first_str(value, &["id", "_id", "job_id"])?;
        let title = first_str(
            value,
            &["jobopening_name", "role_name", "title", "job_title", "name", "position"],
        )
        .unwrap_or_else(|| "Untitled Job".to_string());
        Some(Self {
            id,
            title,
            department: first_str(value, &["department_name"]),
        })
    }
}

/// The openings endpoint has answered with a bare array as well as with
/// `items`, `jobs` or `data` wrappers.
pub fn parse_job_openings(body: &Value) -> Result<Vec<JobOpening>, HiringError> {
    let list = match body {
        Value::Array(items) => items,
        Value::Object(map) => ["items", "jobs", "data"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| HiringError::Decode("no job list in response".to_string()))?,
        _ => return Err(HiringError::Decode("expected an array or object".to_string())),
    };
    Ok(list.iter().filter_map(JobOpening::from_value).collect())
}

pub trait HiringTransport {
    fn fetch_job_openings(&self) -> Result<Vec<JobOpening>, HiringError>;
    fn send_applicant(&self, submission: &ApplicantSubmission) -> Result<Value, HiringError>;
}

pub struct PromptHireClient {
    base_url: String,
    token: String,
    client: reqwest::blocking::Client,
}

impl PromptHireClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, HiringError> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(HiringError::MissingToken)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::blocking::Client::new(),
        })
    }

    fn read_json(response: reqwest::blocking::Response) -> Result<Value, HiringError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(HiringError::Api {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .map_err(|e| HiringError::Decode(e.to_string()))
    }
}

impl HiringTransport for PromptHireClient {
    fn fetch_job_openings(&self) -> Result<Vec<JobOpening>, HiringError> {
        let url = format!("{}/jobopenings", self.base_url);
        tracing::debug!(%url, "fetching job openings");
        let response = self.client.get(&url).bearer_auth(&self.token).send()?;
        parse_job_openings(&Self::read_json(response)?)
    }

    fn send_applicant(&self, submission: &ApplicantSubmission) -> Result<Value, HiringError> {
        let url = format!("{}/applicants", self.base_url);
        tracing::info!(%url, job = %submission.job_opening_id, "sending applicant");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(submission)
            .send()?;
        Self::read_json(response)
    }
}
