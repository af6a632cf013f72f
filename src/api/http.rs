//! HTTP client for the job board REST API

use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use job_board_types::{
    ApplicationDraft, ApplicationRequest, Credentials, JobId, JobPosting, JobPostingDraft,
    Registration, Token, TokenResponse,
};
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{ApiError, JobBoardApi, Result};
use crate::config::ClientConfig;

const JOBS_PATH: &str = "api/jobs/";
const SEARCH_PATH: &str = "api/jobs/search/";
const APPLICATIONS_PATH: &str = "api/applications/";
const LOGIN_PATH: &str = "api/login/";
const REGISTER_PATH: &str = "api/register/";

/// Longest slice of an error body carried into an [`ApiError`]
const MAX_ERROR_BODY: usize = 200;

/// reqwest-backed [`JobBoardApi`]
#[derive(Clone)]
pub struct HttpJobBoardApi {
    http: Client,
    base_url: Url,
}

impl HttpJobBoardApi {
    pub fn new(base_url: Url, timeout: Duration) -> AnyResult<Self> {
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "API base URL '{}' cannot carry paths",
            base_url
        );

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: with_trailing_slash(base_url),
        })
    }

    pub fn from_config(config: &ClientConfig) -> AnyResult<Self> {
        Self::new(config.api_base_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Network(format!("invalid endpoint {}: {}", path, e)))
    }

    /// Send a request and decode a JSON body from a 2xx response
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.dispatch(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Network(format!("malformed response: {}", e)))
    }

    /// Send a request and check the status, ignoring the body
    async fn dispatch(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        debug!(%status, url = %response.url(), "job board API response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(categorize(status, &body))
    }
}

#[async_trait]
impl JobBoardApi for HttpJobBoardApi {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>> {
        let url = self.endpoint(JOBS_PATH)?;
        self.send_json(self.http.get(url)).await
    }

    async fn search_jobs(&self, query: &str) -> Result<Vec<JobPosting>> {
        let mut url = self.endpoint(SEARCH_PATH)?;
        url.query_pairs_mut().append_pair("q", query);
        self.send_json(self.http.get(url)).await
    }

    async fn create_job(&self, draft: &JobPostingDraft, token: &Token) -> Result<JobPosting> {
        let url = self.endpoint(JOBS_PATH)?;
        let request = self
            .http
            .post(url)
            .header(AUTHORIZATION, token.authorization_header())
            .json(draft);
        self.send_json(request).await
    }

    async fn create_application(
        &self,
        draft: &ApplicationDraft,
        job_id: JobId,
        token: &Token,
    ) -> Result<()> {
        let url = self.endpoint(APPLICATIONS_PATH)?;
        let body = ApplicationRequest { draft, job: job_id };
        let request = self
            .http
            .post(url)
            .header(AUTHORIZATION, token.authorization_header())
            .json(&body);
        self.dispatch(request).await.map(|_| ())
    }

    async fn login(&self, credentials: &Credentials) -> Result<Token> {
        let url = self.endpoint(LOGIN_PATH)?;
        let response: TokenResponse = self.send_json(self.http.post(url).json(credentials)).await?;
        issued_token(response)
    }

    async fn register(&self, registration: &Registration) -> Result<Token> {
        let url = self.endpoint(REGISTER_PATH)?;
        let response: TokenResponse =
            self.send_json(self.http.post(url).json(registration)).await?;
        issued_token(response)
    }
}

fn issued_token(response: TokenResponse) -> Result<Token> {
    Token::new(response.token).ok_or_else(|| ApiError::Auth("server issued an empty token".into()))
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Map a non-success status to the client's failure categories
pub(crate) fn categorize(status: StatusCode, body: &str) -> ApiError {
    let message = error_message(body).unwrap_or_else(|| status.to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        _ => ApiError::Network(format!("HTTP {}: {}", status, message)),
    }
}

/// Pull a readable message out of an error body.
///
/// Understands `{"error": ..}` / `{"detail": ..}` and per-field error maps;
/// anything else is returned as truncated text.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail"] {
            if let Some(serde_json::Value::String(msg)) = map.get(key) {
                return Some(msg.clone());
            }
        }
        let fields: Vec<String> = map
            .iter()
            .map(|(field, errors)| match errors {
                serde_json::Value::Array(items) => {
                    let msgs: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
                    format!("{}: {}", field, msgs.join(" "))
                }
                other => format!("{}: {}", field, other),
            })
            .collect();
        if !fields.is_empty() {
            return Some(fields.join("; "));
        }
    }

    Some(body.chars().take(MAX_ERROR_BODY).collect())
}
