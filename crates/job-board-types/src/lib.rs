//! Shared API Types for the job board client
//!
//! This crate is the SINGLE SOURCE OF TRUTH for every type crossing the HTTP
//! boundary between the client core and the job board backend.
//!
//! ```text
//! ┌──────────────────┐         ┌──────────────────┐
//! │  Client core     │  JSON   │  Job board API   │
//! │  (session/view)  │ ◄─────► │  (/api/...)      │
//! └──────────────────┘         └──────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. Field names match the wire contract exactly (snake_case)
//! 2. Drafts are plain data; validation helpers never trim in place
//! 3. Tokens are opaque: never parsed, never printed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// JOB POSTINGS
// ============================================================================

/// Server-assigned identifier of a job posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(JobId)
    }
}

/// A single job listing as returned by `GET /api/jobs/`
///
/// Immutable once fetched. The client appends new postings or replaces the
/// whole collection, it never edits one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub posted_at: DateTime<Utc>,
    /// Id of the user who posted the job (absent on older payloads)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_by: Option<i64>,
}

/// Body of `POST /api/jobs/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPostingDraft {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
}

impl JobPostingDraft {
    /// Copy with surrounding whitespace removed from every field
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            company: self.company.trim().to_string(),
            location: self.location.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }

    /// Names of the required fields that are empty after trimming
    pub fn missing_fields(&self) -> Vec<&'static str> {
        blank_fields(&[
            ("title", &self.title),
            ("company", &self.company),
            ("location", &self.location),
            ("description", &self.description),
        ])
    }
}

// ============================================================================
// APPLICATIONS
// ============================================================================

/// Applicant-entered part of `POST /api/applications/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub applicant_name: String,
    pub applicant_email: String,
    /// Resume as plain text or a URL
    pub resume: String,
}

impl ApplicationDraft {
    pub fn trimmed(&self) -> Self {
        Self {
            applicant_name: self.applicant_name.trim().to_string(),
            applicant_email: self.applicant_email.trim().to_string(),
            resume: self.resume.trim().to_string(),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        blank_fields(&[
            ("applicant_name", &self.applicant_name),
            ("applicant_email", &self.applicant_email),
            ("resume", &self.resume),
        ])
    }
}

/// Full body of `POST /api/applications/`: the draft plus the target job
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationRequest<'a> {
    #[serde(flatten)]
    pub draft: &'a ApplicationDraft,
    pub job: JobId,
}

// ============================================================================
// AUTHENTICATION
// ============================================================================

/// Body of `POST /api/login/`
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        blank_fields(&[("username", &self.username), ("password", &self.password)])
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Body of `POST /api/register/`
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl Registration {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        blank_fields(&[
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ])
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Response of both `/api/login/` and `/api/register/`
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Opaque credential issued by the backend
///
/// Never empty. The client does not inspect it beyond presenting it in the
/// `Authorization` header, and `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token string, rejecting empty (or all-whitespace) values
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> String {
        format!("Token {}", self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

fn blank_fields(fields: &[(&'static str, &str)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect()
}
