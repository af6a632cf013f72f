//! JobBoardApi trait: the sole boundary between the client core and the
//! job board backend.
//!
//! The core depends on this trait, never on a transport. Two implementations
//! ship with the crate: [`http::HttpJobBoardApi`] for the real REST backend
//! and [`memory::InMemoryJobBoardApi`] for tests and offline use.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use job_board_types::{
    ApplicationDraft, Credentials, JobId, JobPosting, JobPostingDraft, Registration, Token,
};

pub use crate::error::ApiError;

pub type Result<T> = std::result::Result<T, ApiError>;

#[async_trait]
pub trait JobBoardApi: Send + Sync {
    /// Full, unfiltered listing in server order.
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>>;

    /// Listing filtered server-side by `query`. An empty query is sent as-is.
    async fn search_jobs(&self, query: &str) -> Result<Vec<JobPosting>>;

    async fn create_job(&self, draft: &JobPostingDraft, token: &Token) -> Result<JobPosting>;

    /// Submit an application. Success carries no data.
    async fn create_application(
        &self,
        draft: &ApplicationDraft,
        job_id: JobId,
        token: &Token,
    ) -> Result<()>;

    async fn login(&self, credentials: &Credentials) -> Result<Token>;

    async fn register(&self, registration: &Registration) -> Result<Token>;
}
