//! Google Cloud Translation (v2 REST) client

use super::{TranslateError, TranslateResult, Translator};
use crate::config::TranslateConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslationList,
}

#[derive(Debug, Deserialize)]
struct TranslationList {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

/// Builds the HTTP client used for translation requests
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Translator backed by the Google Translation API
pub struct GoogleTranslator {
    client: Client,
    endpoint: Url,
    api_key: String,
    source: String,
    target: String,
}

impl GoogleTranslator {
    pub fn new(
        client: Client,
        config: &TranslateConfig,
        api_key: impl Into<String>,
    ) -> TranslateResult<Self> {
        let endpoint = Url::parse(&config.api_url)
            .map_err(|e| TranslateError::InvalidEndpoint(format!("{}: {}", config.api_url, e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            source: config.source.clone(),
            target: config.target.clone(),
        })
    }

    /// Creates a translator reading the API key from `api-key-env`
    pub fn from_env(config: &TranslateConfig) -> TranslateResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| TranslateError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(build_http_client()?, config, api_key)
    }
}

impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str) -> TranslateResult<String> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let response = self
            .client
            .post(url)
            .json(&TranslateRequest {
                q: text,
                source: &self.source,
                target: &self.target,
                format: "text",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranslateResponse = response.json().await?;
        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or(TranslateError::EmptyResponse)
    }
}
