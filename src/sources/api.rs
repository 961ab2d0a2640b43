use crate::config::ApiSourceSettings;
use crate::sources::{FetchError, ParseError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that prevent a source from being constructed
#[derive(Debug, Error)]
pub enum SourceSetupError {
    #[error("{0} environment variable is required")]
    MissingApiKey(&'static str),

    #[error("{0} contains characters that are not valid in a header")]
    InvalidApiKey(&'static str),

    #[error("Invalid selector {0}")]
    InvalidSelector(String),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Bearer-authenticated JSON client shared by the API-backed sources
pub struct ApiClient {
    client: Client,
    base_url: String,
    throttle: Duration,
}

impl ApiClient {
    /// Create a client for one API
    ///
    /// Fails immediately when no API key is configured; `key_var` names the
    /// environment variable the key is expected in.
    pub fn new(
        settings: &ApiSourceSettings,
        key_var: &'static str,
        default_base_url: &str,
    ) -> Result<Self, SourceSetupError> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SourceSetupError::MissingApiKey(key_var))?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| SourceSetupError::InvalidApiKey(key_var))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url.to_string()),
            throttle: Duration::from_millis(settings.throttle_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and return the raw records of the `events` array
    ///
    /// A body without an `events` key yields no records.
    pub async fn get_events(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);

        tracing::debug!("Fetching events from: {}", url);

        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status(),
                url,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(format!("Failed to decode body: {}", e)))?;

        let Value::Object(mut envelope) = json else {
            return Err(FetchError::InvalidResponse("Expected a JSON object".into()));
        };

        match envelope.remove("events") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(records)) => Ok(records),
            Some(_) => Err(FetchError::InvalidResponse("events is not an array".into())),
        }
    }

    /// Courtesy pause between record parses
    pub async fn throttle(&self) {
        if !self.throttle.is_zero() {
            tokio::time::sleep(self.throttle).await;
        }
    }
}

/// String at a JSON pointer, if present
pub(crate) fn str_at<'a>(record: &'a Value, pointer: &str) -> Option<&'a str> {
    record.pointer(pointer).and_then(Value::as_str)
}

/// String at a JSON pointer, or a `MissingField` error naming it
pub(crate) fn required_str<'a>(record: &'a Value, pointer: &str) -> Result<&'a str, ParseError> {
    str_at(record, pointer).ok_or_else(|| ParseError::MissingField(pointer.to_string()))
}

/// Record id, which APIs send either as a string or a number
pub(crate) fn record_id(record: &Value) -> Result<String, ParseError> {
    match record.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(ParseError::MissingField("/id".to_string())),
    }
}
