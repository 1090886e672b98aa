use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Config;

pub const EMPTY_NAME_MESSAGE: &str = "Please enter a medication name first.";
pub const MISSING_KEY_MESSAGE: &str =
    "API key is not configured. Please set the API_KEY environment variable.";
pub const LOOKUP_FAILED_MESSAGE: &str = "Sorry, I couldn't retrieve information for that medication at the moment. Please check the logs for errors.";

#[derive(Error, Debug)]
enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response had no text")]
    EmptyResponse,
}

pub struct MedicationInfoClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl MedicationInfoClient {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get_medication_info(&self, medication: &str) -> String {
        let medication = medication.trim();
        if medication.is_empty() {
            return EMPTY_NAME_MESSAGE.to_string();
        }

        let Some(api_key) = self.api_key.as_deref() else {
            return MISSING_KEY_MESSAGE.to_string();
        };

        match self.request(api_key, medication).await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, medication, "medication info lookup failed");
                LOOKUP_FAILED_MESSAGE.to_string()
            }
        }
    }

    async fn request(&self, api_key: &str, medication: &str) -> Result<String, LookupError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&json!({
                "contents": [{ "parts": [{ "text": build_prompt(medication) }] }]
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        extract_text(&response).ok_or(LookupError::EmptyResponse)
    }
}

pub fn build_prompt(medication: &str) -> String {
    format!(
        "Provide a brief, easy-to-understand summary for a healthcare professional about the \
         medication \"{medication}\". Include its common uses, primary mechanism of action, and \
         key side effects to watch for. Format the response as simple text, with clear headings \
         for each section."
    )
}

fn extract_text(response: &Value) -> Option<String> {
    let parts = response["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
