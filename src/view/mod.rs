//! Screen state machine
//!
//! Exactly one [`ScreenState`] is active. Every move between screens goes
//! through [`transition`], which holds the whole transition table and its
//! authentication guards. Anything not in the table is a [`GuardError`].

pub mod controller;
pub mod forms;

use std::fmt;

use job_board_types::JobId;

use crate::error::GuardError;

pub use controller::ViewController;
pub use forms::{FormDraft, FormField, LoginDraft, RegisterDraft, UnknownField};

/// The active screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenState {
    /// Listing with search box (initial screen)
    #[default]
    Jobs,
    /// "Post a job" form
    PostJob,
    /// Application form for one posting
    Apply(JobId),
    Login,
    Register,
}

impl fmt::Display for ScreenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jobs => f.write_str("jobs"),
            Self::PostJob => f.write_str("post job"),
            Self::Apply(id) => write!(f, "apply (job {})", id),
            Self::Login => f.write_str("login"),
            Self::Register => f.write_str("register"),
        }
    }
}

/// User- or completion-driven event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    ClickPost,
    ClickApply(JobId),
    ClickViewJobs,
    ClickLogin,
    ClickRegister,
    ClickLogout,
    /// A PostJob or Apply submission succeeded
    SubmitSuccess,
    /// A Login or Register submission succeeded
    AuthSuccess,
}

impl ViewEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClickPost => "post",
            Self::ClickApply(_) => "apply",
            Self::ClickViewJobs => "view jobs",
            Self::ClickLogin => "login",
            Self::ClickRegister => "register",
            Self::ClickLogout => "logout",
            Self::SubmitSuccess => "submit",
            Self::AuthSuccess => "authenticate",
        }
    }
}

/// Apply `event` to `from` under the given authentication state.
///
/// Pure: side effects of a transition (clearing the token on logout,
/// discarding drafts) belong to the caller.
pub fn transition(
    from: ScreenState,
    event: ViewEvent,
    authenticated: bool,
) -> Result<ScreenState, GuardError> {
    use ScreenState as S;
    use ViewEvent as E;

    let requires_login = || GuardError::RequiresLogin { event: event.name() };
    let requires_logout = || GuardError::RequiresLogout { event: event.name() };
    let invalid = || GuardError::InvalidFrom {
        event: event.name(),
        from,
    };

    match (from, event) {
        (S::Jobs, E::ClickPost) if authenticated => Ok(S::PostJob),
        (S::Jobs, E::ClickApply(id)) if authenticated => Ok(S::Apply(id)),
        (S::Jobs, E::ClickPost | E::ClickApply(_)) => Err(requires_login()),
        (_, E::ClickPost | E::ClickApply(_)) => Err(invalid()),

        (_, E::ClickViewJobs) => Ok(S::Jobs),

        (_, E::ClickLogin) if !authenticated => Ok(S::Login),
        (_, E::ClickRegister) if !authenticated => Ok(S::Register),
        (_, E::ClickLogin | E::ClickRegister) => Err(requires_logout()),

        (_, E::ClickLogout) if authenticated => Ok(S::Jobs),
        (_, E::ClickLogout) => Err(requires_login()),

        (S::PostJob | S::Apply(_), E::SubmitSuccess) => Ok(S::Jobs),
        (S::Login | S::Register, E::AuthSuccess) => Ok(S::Jobs),
        (_, E::SubmitSuccess | E::AuthSuccess) => Err(invalid()),
    }
}
