//! Shared fixtures for the integration tests
//!
//! `GatedApi` wraps the in-memory backend and lets a test hold individual
//! requests open until it releases them, so completion order can be chosen
//! independently of issue order.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::oneshot;

use job_board_client::api::memory::InMemoryJobBoardApi;
use job_board_client::api::{JobBoardApi, Result as ApiResult};
use job_board_client::session::{MemoryTokenStorage, TokenStorage};
use job_board_client::{
    ApiError, ApplicationDraft, Credentials, JobId, JobPosting, JobPostingDraft, Registration,
    Token, ViewController,
};

// =============================================================================
// FIXTURES
// =============================================================================

pub fn posting(id: i64, title: &str, company: &str) -> JobPosting {
    JobPosting {
        id: JobId(id),
        title: title.to_string(),
        company: company.to_string(),
        location: "Remote".to_string(),
        description: format!("{} at {}", title, company),
        posted_at: Utc.with_ymd_and_hms(2024, 3, id as u32 % 28 + 1, 9, 0, 0).unwrap(),
        posted_by: None,
    }
}

/// P1 designer, P2 engineer, P3 product manager
pub fn three_postings() -> Vec<JobPosting> {
    vec![
        posting(1, "Product Designer", "Acme"),
        posting(2, "Backend Engineer", "Initech"),
        posting(3, "Product Manager", "Globex"),
    ]
}

pub fn valid_job_draft() -> JobPostingDraft {
    JobPostingDraft {
        title: "Rust Engineer".into(),
        company: "Ferrous".into(),
        location: "Berlin".into(),
        description: "Async services".into(),
    }
}

pub fn view_over(api: Arc<dyn JobBoardApi>, storage: Arc<dyn TokenStorage>) -> ViewController {
    ViewController::connect(api, storage)
}

pub fn anonymous_view(api: Arc<dyn JobBoardApi>) -> ViewController {
    view_over(api, Arc::new(MemoryTokenStorage::new()))
}

pub fn logged_in_view(api: Arc<dyn JobBoardApi>, token: &Token) -> ViewController {
    view_over(api, Arc::new(MemoryTokenStorage::with_token(token.as_str())))
}

/// Yield to the runtime until `cond` holds
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

// =============================================================================
// GATED BACKEND
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `fetch_jobs` and `search_jobs`
    Listing,
    CreateJob,
    CreateApplication,
    Login,
    Register,
}

/// In-memory backend whose requests can be held open.
///
/// `hold(endpoint)` queues a gate; the next request to that endpoint waits
/// for it. Sending on the returned sender lets the request through to the
/// in-memory backend; dropping it fails the request with a network error.
/// Requests with no queued gate go straight through.
pub struct GatedApi {
    inner: InMemoryJobBoardApi,
    gates: Mutex<HashMap<Endpoint, VecDeque<oneshot::Receiver<()>>>>,
    started: AtomicUsize,
}

impl GatedApi {
    pub fn new(inner: InMemoryJobBoardApi) -> Arc<Self> {
        Arc::new(Self {
            inner,
            gates: Mutex::new(HashMap::new()),
            started: AtomicUsize::new(0),
        })
    }

    pub fn inner(&self) -> &InMemoryJobBoardApi {
        &self.inner
    }

    pub fn hold(&self, endpoint: Endpoint) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(endpoint)
            .or_default()
            .push_back(rx);
        tx
    }

    /// Requests that have reached the backend boundary, gated or not
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    async fn pass(&self, endpoint: Endpoint) -> ApiResult<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front);
        match gate {
            Some(rx) => rx
                .await
                .map_err(|_| ApiError::Network("connection reset".into())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JobBoardApi for GatedApi {
    async fn fetch_jobs(&self) -> ApiResult<Vec<JobPosting>> {
        self.pass(Endpoint::Listing).await?;
        self.inner.fetch_jobs().await
    }

    async fn search_jobs(&self, query: &str) -> ApiResult<Vec<JobPosting>> {
        self.pass(Endpoint::Listing).await?;
        self.inner.search_jobs(query).await
    }

    async fn create_job(&self, draft: &JobPostingDraft, token: &Token) -> ApiResult<JobPosting> {
        self.pass(Endpoint::CreateJob).await?;
        self.inner.create_job(draft, token).await
    }

    async fn create_application(
        &self,
        draft: &ApplicationDraft,
        job_id: JobId,
        token: &Token,
    ) -> ApiResult<()> {
        self.pass(Endpoint::CreateApplication).await?;
        self.inner.create_application(draft, job_id, token).await
    }

    async fn login(&self, credentials: &Credentials) -> ApiResult<Token> {
        self.pass(Endpoint::Login).await?;
        self.inner.login(credentials).await
    }

    async fn register(&self, registration: &Registration) -> ApiResult<Token> {
        self.pass(Endpoint::Register).await?;
        self.inner.register(registration).await
    }
}
