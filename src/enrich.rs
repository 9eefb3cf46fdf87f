use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use thiserror::Error;

use crate::ai::AIProvider;
use crate::models::{EnrichedFields, ProfileRecord};

const MAX_TOKENS: u32 = 2048;

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("enrichment timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("enrichment request failed: {0:#}")]
    Transport(anyhow::Error),
    #[error("enrichment reply is not a usable overlay: {0}")]
    Parse(String),
}

impl EnrichmentError {
    pub fn kind(&self) -> &'static str {
        match self {
            EnrichmentError::Timeout(_) => "timeout",
            EnrichmentError::Transport(_) => "transport",
            EnrichmentError::Parse(_) => "parse",
        }
    }
}

pub fn build_prompt(record: &ProfileRecord) -> Result<String, EnrichmentError> {
    let profile = serde_json::to_string_pretty(record)
        .map_err(|e| EnrichmentError::Transport(anyhow!("failed to serialize profile: {e}")))?;

    Ok(format!(
        "You are a LinkedIn profile analyzer. Read the profile data below and extract the \
        candidate's key details.\n\n\
        PROFILE DATA:\n{profile}\n\n\
        EXTRACT:\n\
        1. name: the person's full name (basicInfo.name)\n\
        2. location: current location (basicInfo.location)\n\
        3. profileLink: the LinkedIn profile URL (basicInfo.profileUrl)\n\
        4. currentCompany: the organization of the ongoing role, the experience entry ending in \
        \"Present\". This is the employer, never the job title.\n\
        5. currentDesignation: the job title of that same entry, never the employer\n\
        6. skills: every real skill, deduplicated, without endorsement or UI text\n\
        7. totalExperience: total professional experience as decimal years like \"4.8 yrs\" \
        (basicInfo.totalExperience is already computed)\n\
        8. education_qualification: one object per education entry with school, degree, field, \
        duration and grade\n\n\
        Use null for anything the profile does not contain.\n\n\
        Reply with ONLY a JSON object using exactly these keys, no markdown:\n\
        {{\n  \"name\": \"Full Name or null\",\n  \"location\": \"City, Country or null\",\n  \
        \"profileLink\": \"https://linkedin.com/in/username or null\",\n  \
        \"currentCompany\": \"company name or null\",\n  \
        \"currentDesignation\": \"job title or null\",\n  \
        \"skills\": [\"skill1\", \"skill2\"],\n  \
        \"totalExperience\": \"4.8 yrs or null\",\n  \
        \"education_qualification\": [\n    {{\"school\": \"University Name\", \
        \"degree\": \"Degree Type\", \"field\": \"Field of Study\", \
        \"duration\": \"Duration Text\", \"grade\": \"Grade/GPA if available\"}}\n  ]\n}}"
    ))
}

/// Removes a surrounding ```` ```json ```` or bare ```` ``` ```` fence.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    let body = body.trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Strict parse of the model's reply. Anything but a JSON object whose fields
/// have the expected types is rejected whole.
pub fn parse_enriched(reply: &str) -> Result<EnrichedFields, EnrichmentError> {
    let cleaned = strip_code_fences(reply);
    let value: serde_json::Value =
        serde_json::from_str(cleaned).map_err(|e| EnrichmentError::Parse(e.to_string()))?;
    if !value.is_object() {
        return Err(EnrichmentError::Parse("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| EnrichmentError::Parse(e.to_string()))
}

#[derive(Clone)]
pub struct Enricher {
    provider: Arc<dyn AIProvider>,
}

impl Enricher {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self { provider }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Blocking call to the provider.
    pub fn enrich(&self, record: &ProfileRecord) -> Result<EnrichedFields, EnrichmentError> {
        let prompt = build_prompt(record)?;
        let reply = self
            .provider
            .complete(&prompt, MAX_TOKENS)
            .map_err(EnrichmentError::Transport)?;
        tracing::debug!(model = self.model_name(), bytes = reply.len(), "enrichment reply received");
        parse_enriched(&reply)
    }

    /// Races the provider call against `wait`. A call that loses the race is
    /// not cancelled; it finishes on its blocking thread and its result is
    /// dropped.
    pub async fn enrich_with_timeout(
        &self,
        record: &ProfileRecord,
        wait: Duration,
    ) -> Result<EnrichedFields, EnrichmentError> {
        let enricher = self.clone();
        let record = record.clone();
        let call = tokio::task::spawn_blocking(move || enricher.enrich(&record));

        match tokio::time::timeout(wait, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(EnrichmentError::Transport(anyhow!("enrichment task failed: {e}"))),
            Err(_) => Err(EnrichmentError::Timeout(wait)),
        }
    }
}
