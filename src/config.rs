//! Client configuration
//!
//! Reads config from env vars (a `.env` file is honoured by the binary):
//!   JOB_BOARD_API_URL     : backend base URL (default: http://localhost:8000/)
//!   JOB_BOARD_TOKEN_FILE  : durable token slot (default: ~/.job-board/token)
//!   JOB_BOARD_TIMEOUT_SECS: per-request timeout (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const TOKEN_DIR: &str = ".job-board";
const TOKEN_FILE: &str = "token";
const FALLBACK_TOKEN_FILE: &str = ".job-board-token";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub token_path: PathBuf,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("JOB_BOARD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_base_url = Url::parse(raw_url.trim())
            .with_context(|| format!("JOB_BOARD_API_URL is not a valid URL: {}", raw_url))?;

        let token_path = lookup("JOB_BOARD_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_token_path);

        let request_timeout = match lookup("JOB_BOARD_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().with_context(|| {
                    format!("JOB_BOARD_TIMEOUT_SECS must be whole seconds: {}", raw)
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_base_url,
            token_path,
            request_timeout,
        })
    }
}

fn default_token_path() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(TOKEN_DIR).join(TOKEN_FILE))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_TOKEN_FILE))
}
