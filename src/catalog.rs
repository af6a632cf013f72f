//! Job catalog
//!
//! Owns the in-memory listing and the query that produced it.
//!
//! Listing replacement is last-resolved-wins: `load_all` and `search` swap
//! the whole collection in when *their* response arrives, so with several
//! requests in flight the one that completes last decides the listing,
//! whatever the issue order. `create` appends the server's posting without
//! a reload; a listing request still in flight when it resolves may later
//! replace the listing without it. That race is accepted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use job_board_types::{JobPosting, JobPostingDraft, Token};
use tracing::{debug, info, warn};

use crate::api::JobBoardApi;
use crate::error::{AuthError, CreateJobError, FetchError, ValidationError};

/// Snapshot of the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogState {
    /// Server order, never re-sorted locally
    pub postings: Vec<JobPosting>,
    /// Query of the last applied search; empty after a plain load
    pub query: String,
}

pub struct JobCatalog {
    api: Arc<dyn JobBoardApi>,
    state: Mutex<CatalogState>,
}

impl JobCatalog {
    pub fn new(api: Arc<dyn JobBoardApi>) -> Self {
        Self {
            api,
            state: Mutex::new(CatalogState::default()),
        }
    }

    /// Fetch the full listing; replaces postings and clears the query.
    pub async fn load_all(&self) -> Result<Vec<JobPosting>, FetchError> {
        debug!("loading all postings");
        let postings = self.api.fetch_jobs().await.map_err(|e| {
            warn!("Failed to load postings: {}", e);
            FetchError::from(e)
        })?;

        self.replace(postings.clone(), String::new());
        Ok(postings)
    }

    /// Server-side search; replaces postings and records `query`.
    ///
    /// An empty query is still sent as a search request.
    pub async fn search(&self, query: &str) -> Result<Vec<JobPosting>, FetchError> {
        debug!(query, "searching postings");
        let postings = self.api.search_jobs(query).await.map_err(|e| {
            warn!(query, "Failed to search postings: {}", e);
            FetchError::from(e)
        })?;

        self.replace(postings.clone(), query.to_string());
        Ok(postings)
    }

    /// Create a posting and append the server's copy to the listing.
    ///
    /// A missing token or a blank field fails before any request is issued.
    pub async fn create(
        &self,
        draft: &JobPostingDraft,
        token: Option<&Token>,
    ) -> Result<JobPosting, CreateJobError> {
        let token = token.ok_or(AuthError::MissingToken)?;

        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing).into());
        }

        let posting = self
            .api
            .create_job(&draft.trimmed(), token)
            .await
            .map_err(|e| {
                warn!("Failed to create posting: {}", e);
                CreateJobError::from(e)
            })?;

        let len = {
            let mut state = self.state();
            state.postings.push(posting.clone());
            state.postings.len()
        };
        info!(id = %posting.id, postings = len, "posting created and appended");
        Ok(posting)
    }

    pub fn postings(&self) -> Vec<JobPosting> {
        self.state().postings.clone()
    }

    pub fn query(&self) -> String {
        self.state().query.clone()
    }

    pub fn snapshot(&self) -> CatalogState {
        self.state().clone()
    }

    pub fn len(&self) -> usize {
        self.state().postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().postings.is_empty()
    }

    fn replace(&self, postings: Vec<JobPosting>, query: String) {
        let mut state = self.state();
        info!(
            postings = postings.len(),
            query = %query,
            "listing replaced"
        );
        state.postings = postings;
        state.query = query;
    }

    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
