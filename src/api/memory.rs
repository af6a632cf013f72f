//! In-process job board backend.
//!
//! Implements the same contract as the REST API (token auth, case-insensitive
//! title/company search, per-user tokens reused across logins) without a
//! network. Every request is recorded so callers can assert which requests
//! were, or were not, issued.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use job_board_types::{
    ApplicationDraft, Credentials, JobId, JobPosting, JobPostingDraft, Registration, Token,
};
use uuid::Uuid;

use super::{ApiError, JobBoardApi, Result};

/// One recorded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FetchJobs,
    SearchJobs(String),
    CreateJob,
    CreateApplication(JobId),
    Login(String),
    Register(String),
}

/// Application as stored by the in-memory backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredApplication {
    pub job: JobId,
    pub applicant: i64,
    pub draft: ApplicationDraft,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct User {
    id: i64,
    username: String,
    password: String,
    token: String,
}

#[derive(Default)]
struct Backend {
    jobs: Vec<JobPosting>,
    users: Vec<User>,
    applications: Vec<StoredApplication>,
    offline: bool,
    calls: Vec<ApiCall>,
}

impl Backend {
    fn next_job_id(&self) -> JobId {
        JobId(self.jobs.iter().map(|j| j.id.0).max().unwrap_or(0) + 1)
    }

    fn user_for_token(&self, token: &Token) -> Result<&User> {
        self.users
            .iter()
            .find(|u| u.token == token.as_str())
            .ok_or_else(|| ApiError::Auth("Invalid token.".into()))
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            Err(ApiError::Network("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

/// [`JobBoardApi`] served from memory
#[derive(Default)]
pub struct InMemoryJobBoardApi {
    backend: Mutex<Backend>,
}

impl InMemoryJobBoardApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the listing (kept in the given order)
    pub fn with_jobs(self, jobs: Vec<JobPosting>) -> Self {
        self.backend().jobs = jobs;
        self
    }

    /// Create an account directly and return its token
    pub fn add_user(&self, username: &str, password: &str) -> Result<Token> {
        create_account(&mut self.backend(), username, password)
    }

    /// Simulate a lost connection: every request fails with a network error
    pub fn set_offline(&self, offline: bool) {
        self.backend().offline = offline;
    }

    /// Requests received so far, in arrival order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.backend().calls.clone()
    }

    pub fn jobs(&self) -> Vec<JobPosting> {
        self.backend().jobs.clone()
    }

    pub fn applications(&self) -> Vec<StoredApplication> {
        self.backend().applications.clone()
    }

    fn backend(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, then fail if offline
    fn begin(&self, call: ApiCall) -> Result<MutexGuard<'_, Backend>> {
        let mut backend = self.backend();
        backend.calls.push(call);
        backend.check_online()?;
        Ok(backend)
    }
}

fn create_account(backend: &mut Backend, username: &str, password: &str) -> Result<Token> {
    let user = User {
        id: backend.users.len() as i64 + 1,
        username: username.to_string(),
        password: password.to_string(),
        token: Uuid::new_v4().simple().to_string(),
    };
    let token = issued(&user)?;
    backend.users.push(user);
    Ok(token)
}

fn issued(user: &User) -> Result<Token> {
    Token::new(user.token.clone())
        .ok_or_else(|| ApiError::Auth("server issued an empty token".into()))
}

fn matches_query(job: &JobPosting, query: &str) -> bool {
    let needle = query.to_lowercase();
    job.title.to_lowercase().contains(&needle) || job.company.to_lowercase().contains(&needle)
}

fn blank_error(fields: Vec<&'static str>) -> Result<()> {
    match fields.first() {
        Some(field) => Err(ApiError::Validation(format!(
            "{}: This field may not be blank.",
            field
        ))),
        None => Ok(()),
    }
}

#[async_trait]
impl JobBoardApi for InMemoryJobBoardApi {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>> {
        let backend = self.begin(ApiCall::FetchJobs)?;
        Ok(backend.jobs.clone())
    }

    async fn search_jobs(&self, query: &str) -> Result<Vec<JobPosting>> {
        let backend = self.begin(ApiCall::SearchJobs(query.to_string()))?;
        Ok(backend
            .jobs
            .iter()
            .filter(|job| matches_query(job, query))
            .cloned()
            .collect())
    }

    async fn create_job(&self, draft: &JobPostingDraft, token: &Token) -> Result<JobPosting> {
        let mut backend = self.begin(ApiCall::CreateJob)?;
        let author = backend.user_for_token(token)?.id;
        blank_error(draft.missing_fields())?;

        let posting = JobPosting {
            id: backend.next_job_id(),
            title: draft.title.clone(),
            company: draft.company.clone(),
            location: draft.location.clone(),
            description: draft.description.clone(),
            posted_at: Utc::now(),
            posted_by: Some(author),
        };
        backend.jobs.push(posting.clone());
        Ok(posting)
    }

    async fn create_application(
        &self,
        draft: &ApplicationDraft,
        job_id: JobId,
        token: &Token,
    ) -> Result<()> {
        let mut backend = self.begin(ApiCall::CreateApplication(job_id))?;
        let applicant = backend.user_for_token(token)?.id;
        if !backend.jobs.iter().any(|j| j.id == job_id) {
            return Err(ApiError::Validation(format!(
                "job: Invalid pk \"{}\" - object does not exist.",
                job_id
            )));
        }
        blank_error(draft.missing_fields())?;

        backend.applications.push(StoredApplication {
            job: job_id,
            applicant,
            draft: draft.clone(),
            applied_at: Utc::now(),
        });
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<Token> {
        let backend = self.begin(ApiCall::Login(credentials.username.clone()))?;
        let user = backend
            .users
            .iter()
            .find(|u| u.username == credentials.username && u.password == credentials.password)
            .ok_or_else(|| ApiError::Validation("Invalid credentials".into()))?;
        issued(user)
    }

    async fn register(&self, registration: &Registration) -> Result<Token> {
        let mut backend = self.begin(ApiCall::Register(registration.username.clone()))?;
        if !registration.missing_fields().is_empty() {
            return Err(ApiError::Validation("Invalid data".into()));
        }
        if backend
            .users
            .iter()
            .any(|u| u.username == registration.username)
        {
            return Err(ApiError::Validation(
                "A user with that username already exists.".into(),
            ));
        }

        create_account(&mut backend, &registration.username, &registration.password)
    }
}

impl std::fmt::Debug for InMemoryJobBoardApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = self.backend();
        f.debug_struct("InMemoryJobBoardApi")
            .field("jobs", &backend.jobs.len())
            .field("users", &backend.users.len())
            .field("applications", &backend.applications.len())
            .field("offline", &backend.offline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(id: i64, title: &str, company: &str) -> JobPosting {
        JobPosting {
            id: JobId(id),
            title: title.into(),
            company: company.into(),
            location: "Remote".into(),
            description: "desc".into(),
            posted_at: Utc::now(),
            posted_by: None,
        }
    }

    #[tokio::test]
    async fn test_search_matches_title_or_company_case_insensitive() {
        let api = InMemoryJobBoardApi::new().with_jobs(vec![
            posting(1, "Backend Engineer", "Acme"),
            posting(2, "Designer", "Engineering Co"),
            posting(3, "Accountant", "Ledger Ltd"),
        ]);

        let found = api.search_jobs("ENGINEER").await.unwrap();
        let ids: Vec<JobId> = found.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![JobId(1), JobId(2)]);
        assert_eq!(api.search_jobs("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_login_reuses_user_token() {
        let api = InMemoryJobBoardApi::new();
        let issued = api.add_user("ada", "pw").unwrap();

        let creds = Credentials {
            username: "ada".into(),
            password: "pw".into(),
        };
        assert_eq!(api.login(&creds).await.unwrap(), issued);

        let bad = Credentials {
            username: "ada".into(),
            password: "nope".into(),
        };
        assert_eq!(
            api.login(&bad).await.unwrap_err(),
            ApiError::Validation("Invalid credentials".into())
        );
    }

    #[tokio::test]
    async fn test_create_job_requires_known_token() {
        let api = InMemoryJobBoardApi::new();
        let stranger = Token::new("forged").unwrap();
        let draft = JobPostingDraft {
            title: "t".into(),
            company: "c".into(),
            location: "l".into(),
            description: "d".into(),
        };

        let err = api.create_job(&draft, &stranger).await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
        assert!(api.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_offline_records_call_and_fails() {
        let api = InMemoryJobBoardApi::new();
        api.set_offline(true);

        assert!(matches!(
            api.fetch_jobs().await.unwrap_err(),
            ApiError::Network(_)
        ));
        assert_eq!(api.calls(), vec![ApiCall::FetchJobs]);
    }

    #[tokio::test]
    async fn test_application_for_unknown_job_rejected() {
        let api = InMemoryJobBoardApi::new().with_jobs(vec![posting(1, "t", "c")]);
        let token = api.add_user("ada", "pw").unwrap();
        let draft = ApplicationDraft {
            applicant_name: "Ada".into(),
            applicant_email: "ada@example.com".into(),
            resume: "cv".into(),
        };

        let err = api
            .create_application(&draft, JobId(99), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        api.create_application(&draft, JobId(1), &token)
            .await
            .unwrap();
        assert_eq!(api.applications().len(), 1);
    }
}
