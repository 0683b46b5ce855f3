use crate::domain::model::ClarificationSuggestion;
use crate::domain::ports::{ClarificationInput, Clarifier};
use crate::utils::error::{Result, VerifierError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You assist operators of a medical clinic call center. \
You suggest alternatives when an appointment request cannot be booked as asked. \
You never claim a slot is free; the schedule check has already decided that.";

#[derive(Debug, Clone)]
pub struct ClarifierSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

/// [`Clarifier`] backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClarifier {
    client: Client,
    settings: ClarifierSettings,
}

impl OpenAiClarifier {
    pub fn new(settings: ClarifierSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.settings.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": self.settings.temperature,
        });

        let url = format!("{}/chat/completions", self.settings.endpoint.trim_end_matches('/'));
        let mut request = self.client.post(url).json(&body);
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let json: serde_json::Value = response.json().await?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.trim().to_string())
            .ok_or_else(|| VerifierError::clarifier("response has no message content"))
    }
}

#[async_trait]
impl Clarifier for OpenAiClarifier {
    async fn clarify(&self, input: ClarificationInput<'_>) -> Result<ClarificationSuggestion> {
        let prompt = build_prompt(&input)?;
        tracing::debug!("Requesting clarification from model {}", self.settings.model);
        let content = self.complete(&prompt).await?;
        Ok(parse_suggestion(&content))
    }
}

pub fn build_prompt(input: &ClarificationInput<'_>) -> Result<String> {
    let request = serde_json::to_string_pretty(input.request)?;
    Ok(format!(
        "An appointment request could not be verified.\n\n\
REQUEST:\n{request}\n\n\
VERIFICATION RESULT:\n{failure}\n\n\
DIRECTORY:\n{context}\n\n\
Using only the doctors listed in DIRECTORY, suggest how the operator can proceed.\n\
Answer in the language of the request. Return ONLY JSON:\n\
{{\n\
  \"doctor_exists_alternative\": true or false,\n\
  \"suggested_specialty\": \"specialty or null\",\n\
  \"alternative_doctors\": [\"full names from DIRECTORY\"],\n\
  \"recommendation\": \"one or two sentences for the operator\"\n\
}}",
        failure = input.failure_message,
        context = input.directory_context,
    ))
}

/// Unparseable replies are kept verbatim as an advisory-only suggestion.
pub fn parse_suggestion(content: &str) -> ClarificationSuggestion {
    let parsed = extract_json_block(content)
        .and_then(|block| serde_json::from_str::<ClarificationSuggestion>(block).ok());

    match parsed {
        Some(mut suggestion) => {
            suggestion.raw_response = None;
            suggestion
        }
        None => ClarificationSuggestion::unparsed(content),
    }
}

/// JSON object inside a fenced block, or between the first `{` and the last `}`.
fn extract_json_block(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Some(after_fence[..end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    }
}
