//! Job Board Client - session and navigation core
//!
//! Browse and search postings, register or log in, post a job and apply to
//! one, against a REST backend. This crate holds the client's state and the
//! rules for changing it; rendering is left to a front end (see the
//! `job_board` binary behind the `cli` feature).
//!
//! ## Components
//! User action -> ViewController (guards) -> SessionStore / JobCatalog
//! -> JobBoardApi -> ViewController transitions on success, surfaces the
//! error on failure.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use job_board_client::api::memory::InMemoryJobBoardApi;
//! use job_board_client::session::MemoryTokenStorage;
//! use job_board_client::view::{ViewController, ViewEvent};
//!
//! # async fn demo() {
//! let view = ViewController::connect(
//!     Arc::new(InMemoryJobBoardApi::new()),
//!     Arc::new(MemoryTokenStorage::new()),
//! );
//! view.mount().await.ok();
//! view.request_transition(ViewEvent::ClickLogin).unwrap();
//! # }
//! ```

// Core error handling
pub mod error;

// Backend boundary: trait, HTTP transport, in-process backend
pub mod api;

// Environment-driven configuration
pub mod config;

// Authentication token and its durable slot
pub mod session;

// Postings listing
pub mod catalog;

// Screen state machine and form drafts
pub mod view;

// Shared wire types
pub use job_board_types::{
    ApplicationDraft, Credentials, JobId, JobPosting, JobPostingDraft, Registration, Token,
};

pub use api::JobBoardApi;
pub use catalog::{CatalogState, JobCatalog};
pub use config::ClientConfig;
pub use error::{
    ApiError, AuthError, ClientError, CreateJobError, FetchError, GuardError, StorageError,
    ValidationError,
};
pub use session::SessionStore;
pub use view::{FormDraft, FormField, ScreenState, ViewController, ViewEvent};
