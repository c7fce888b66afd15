use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{parse_scoring_response, render_prompt, ScoringOracle};
use crate::config::OracleConfig;
use crate::triage::domain::{PatientProfile, ScoringResult};
use crate::triage::error::OracleError;

/// Scoring oracle backed by an OpenAI-compatible chat completions endpoint.
pub struct HttpScoringOracle {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpScoringOracle {
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| OracleError::Unavailable(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ScoringOracle for HttpScoringOracle {
    async fn score(
        &self,
        profile: &PatientProfile,
        situation: &str,
    ) -> Result<ScoringResult, OracleError> {
        let prompt = render_prompt(profile, situation);
        debug!(prompt_chars = prompt.len(), model = %self.model, "requesting oracle scores");

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0,
            "response_format": { "type": "json_object" },
        });

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                warn!(error = %err, "scoring oracle request failed");
                OracleError::Unavailable(err.to_string())
            })?;

        let body = response.bytes().await.map_err(|err| {
            warn!(error = %err, "scoring oracle response interrupted");
            OracleError::Unavailable(err.to_string())
        })?;
        let payload: Value =
            serde_json::from_slice(&body).map_err(|err| OracleError::Format(err.to_string()))?;

        let content = extract_content(&payload)?;
        parse_scoring_response(content)
    }
}

fn extract_content(payload: &Value) -> Result<&str, OracleError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| OracleError::Format("response missing choices[0].message.content".into()))
}
