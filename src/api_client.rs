//! Client for the remote resolution service

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{Config, LlmConfig};
use crate::errors::{Error, Result};
use crate::types::{AuthSession, ElementId, PageSnapshot, Resolution, StorageState};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// What a resolution request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// A single interactable element
    Element,
    /// Every element matching the prompt
    Elements,
    /// A CSS selector matching the prompt
    Selector,
    /// Structured data extracted from the page
    Scrape,
    /// A free-form question about the page
    Ask,
}

impl QueryKind {
    /// Endpoint path relative to the API base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            QueryKind::Element => "get-interaction",
            QueryKind::Elements => "get-interactions",
            QueryKind::Selector => "get-interactions-selector",
            QueryKind::Scrape => "scrape-page",
            QueryKind::Ask => "ask-page",
        }
    }
}

/// Body of a resolution request
#[derive(Debug, Clone, Serialize)]
pub struct ResolveRequest {
    #[serde(skip)]
    pub kind: QueryKind,
    pub page_information: PageSnapshot,
    pub llm_config: LlmConfig,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_data_json_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_return_data: Option<String>,
}

impl ResolveRequest {
    pub fn new(
        kind: QueryKind,
        page_information: PageSnapshot,
        llm_config: LlmConfig,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            page_information,
            llm_config,
            prompt: prompt.into(),
            return_data_json_schema: None,
            expected_return_data: None,
        }
    }

    pub fn with_schema(mut self, schema: Option<Value>) -> Self {
        self.return_data_json_schema = schema;
        self
    }

    pub fn with_expected_return_data(mut self, expected: Option<String>) -> Self {
        self.expected_return_data = expected;
        self
    }
}

/// Answer to an `ask` query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskAnswer {
    pub return_data: Value,
    #[serde(default)]
    pub description: String,
}

/// The remote service that maps prompts and snapshots to results
///
/// `resolve` performs exactly one call: `Ok(None)` is a well-formed
/// "no match", `Err` a transport or protocol failure.
#[async_trait]
pub trait ResolutionService: Send + Sync {
    async fn resolve(&self, request: ResolveRequest) -> Result<Option<Resolution>>;

    /// Ask the backend for a session covering `domains`
    async fn authenticate(&self, domains: &[String]) -> Result<AuthSession>;

    /// Persist updated storage state for a session issued by `authenticate`
    async fn upload_auth_session(&self, session: &AuthSession, state: &StorageState)
    -> Result<()>;
}

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    domains: &'a [String],
}

#[derive(Serialize)]
struct UploadAuthSessionRequest<'a> {
    auth_data: &'a AuthSession,
    storage_state: &'a StorageState,
}

/// Turn a response body into a resolution, `None` meaning "no match"
///
/// The answer key must be present: an explicit `null`, empty id, empty list
/// or blank selector is "no match", while a reply without the key (an error
/// object, a different shape) is an error.
pub fn parse_resolution(kind: QueryKind, body: &str) -> Result<Option<Resolution>> {
    let body = body.trim();
    if body.is_empty() || body == "null" {
        return Ok(None);
    }
    let reply: Value = serde_json::from_str(body)?;

    let resolution = match kind {
        QueryKind::Element => {
            answer::<Option<ElementId>>(&reply, body, "element_id", &["dendrite_id"])?
                .map(Resolution::Element)
        }
        QueryKind::Elements => {
            answer::<Option<Vec<ElementId>>>(&reply, body, "element_ids", &["dendrite_ids"])?
                .map(Resolution::Elements)
        }
        QueryKind::Selector => {
            answer::<Option<String>>(&reply, body, "selector", &[])?.map(Resolution::Selector)
        }
        QueryKind::Scrape => Some(Resolution::Data(answer::<Value>(
            &reply,
            body,
            "json_data",
            &[],
        )?)),
        QueryKind::Ask => {
            // Validate the shape, hand the whole answer back
            let answer: AskAnswer = serde_json::from_value(reply.clone())
                .map_err(|e| error_reply(&reply, body).unwrap_or(Error::Json(e)))?;
            Some(Resolution::Data(serde_json::to_value(answer)?))
        }
    };

    Ok(resolution.filter(|r| !r.is_empty()))
}

/// The value under `key`, or under one of its older names
fn answer<T: DeserializeOwned>(
    reply: &Value,
    body: &str,
    key: &'static str,
    aliases: &[&str],
) -> Result<T> {
    let found = std::iter::once(key)
        .chain(aliases.iter().copied())
        .find_map(|k| reply.get(k));
    match found {
        Some(value) => Ok(T::deserialize(value)?),
        None => Err(error_reply(reply, body).unwrap_or_else(|| {
            Error::Json(<serde_json::Error as serde::de::Error>::missing_field(key))
        })),
    }
}

/// A success status carrying an `{"error": ...}` object
fn error_reply(reply: &Value, body: &str) -> Option<Error> {
    reply
        .get("error")
        .filter(|e| !e.is_null())
        .map(|_| Error::Api {
            status: StatusCode::OK.as_u16(),
            body: body.to_string(),
        })
}

/// HTTP implementation of [`ResolutionService`]
#[derive(Clone)]
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    browser_id: String,
}

impl HttpApiClient {
    pub fn new(config: &Config, browser_id: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            browser_id: browser_id.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String> {
        let url = self.endpoint(path);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Browser-Id", &self.browser_id)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NO_CONTENT {
            return Ok(String::new());
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl ResolutionService for HttpApiClient {
    async fn resolve(&self, request: ResolveRequest) -> Result<Option<Resolution>> {
        let body = self.post(request.kind.endpoint(), &request).await?;
        parse_resolution(request.kind, &body)
    }

    async fn authenticate(&self, domains: &[String]) -> Result<AuthSession> {
        info!("Requesting auth session for {}", domains.join(", "));
        let body = self
            .post("authenticate", &AuthenticateRequest { domains })
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn upload_auth_session(
        &self,
        session: &AuthSession,
        state: &StorageState,
    ) -> Result<()> {
        info!("Uploading storage state for {}", session.domains.join(", "));
        self.post(
            "upload-auth-session",
            &UploadAuthSessionRequest {
                auth_data: session,
                storage_state: state,
            },
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "api_client_test.rs"]
mod api_client_test;
