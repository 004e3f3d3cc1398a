//! Google Cloud Translation adapter.
//!
//! Uses the v2 REST `translate` endpoint with an API key. Only the first
//! translation of the response is returned.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use tbot_core::{errors::Error, ports::Translator, Result};

const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Clone, Debug)]
pub struct GoogleTranslator {
    api_key: String,
    project_id: Option<String>,
    endpoint: String,
    http: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new(
        api_key: impl Into<String>,
        project_id: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("google translate client build error: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            project_id,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            http,
        })
    }

    /// Point at a different endpoint (a proxy, or a local stub).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

fn request_body(text: &str, target: &str) -> Value {
    json!({
        "q": text,
        "target": target,
        "format": "text",
    })
}

/// Pull `data.translations[0].translatedText` out of a response.
fn parse_translation(v: &Value) -> Result<String> {
    v.pointer("/data/translations/0/translatedText")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::External("google translate returned no translations".to_string()))
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        debug!(target_lang = %target, chars = text.chars().count(), "translating");

        let mut req = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(text, target));
        if let Some(project) = &self.project_id {
            req = req.header("x-goog-user-project", project);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::External(format!("google translate request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "google translate failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("google translate json error: {e}")))?;

        parse_translation(&v)
    }
}
