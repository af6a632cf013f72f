//! ViewController - owns the active screen and its form draft
//!
//! Every screen change goes through [`transition`]. Each change of screen
//! starts a new *visit*; async work remembers the visit it started in, and
//! when it resolves after that visit ended its result is kept away from the
//! view (no navigation, no draft changes, no error banner). Effects on
//! shared state (catalog append, session token) happen inside the
//! collaborators and are never rolled back.
//!
//! The state lock is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result as AnyResult;
use job_board_types::{JobId, JobPosting, Token};
use tracing::{debug, info, warn};

use super::forms::{FormDraft, FormField};
use super::{transition, ScreenState, ViewEvent};
use crate::api::http::HttpJobBoardApi;
use crate::api::JobBoardApi;
use crate::catalog::JobCatalog;
use crate::config::ClientConfig;
use crate::error::{AuthError, ClientError, GuardError};
use crate::session::{FileTokenStorage, SessionStore, TokenStorage};

/// Confirmation shown on the listing after an application goes through
pub const APPLICATION_SUBMITTED: &str = "Application submitted successfully!";

#[derive(Debug, Default)]
struct ViewState {
    screen: ScreenState,
    /// Bumped on every change of screen
    visit: u64,
    form: FormDraft,
    search_input: String,
    last_error: Option<ClientError>,
    notice: Option<String>,
    in_flight: usize,
}

impl ViewState {
    fn enter(&mut self, to: ScreenState) {
        self.last_error = None;
        self.notice = None;
        if to == self.screen {
            return;
        }
        debug!(from = %self.screen, to = %to, "screen changed");
        self.screen = to;
        self.visit += 1;
        self.form = FormDraft::for_screen(to);
    }
}

pub struct ViewController {
    session: Arc<SessionStore>,
    catalog: Arc<JobCatalog>,
    api: Arc<dyn JobBoardApi>,
    state: Mutex<ViewState>,
}

impl ViewController {
    pub fn new(
        session: Arc<SessionStore>,
        catalog: Arc<JobCatalog>,
        api: Arc<dyn JobBoardApi>,
    ) -> Self {
        Self {
            session,
            catalog,
            api,
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Wire a session and catalog over one gateway
    pub fn connect(api: Arc<dyn JobBoardApi>, storage: Arc<dyn TokenStorage>) -> Self {
        let session = Arc::new(SessionStore::open(api.clone(), storage));
        let catalog = Arc::new(JobCatalog::new(api.clone()));
        Self::new(session, catalog, api)
    }

    /// HTTP gateway and file-backed token slot, as configured
    pub fn from_config(config: &ClientConfig) -> AnyResult<Self> {
        let api: Arc<dyn JobBoardApi> = Arc::new(HttpJobBoardApi::from_config(config)?);
        let storage: Arc<dyn TokenStorage> =
            Arc::new(FileTokenStorage::new(config.token_path.clone()));
        Ok(Self::connect(api, storage))
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Apply one event. Rejected events leave the screen as it was.
    pub fn request_transition(&self, event: ViewEvent) -> Result<ScreenState, GuardError> {
        let authenticated = self.session.is_authenticated();
        let mut state = self.state();

        match transition(state.screen, event, authenticated) {
            Ok(to) => {
                if event == ViewEvent::ClickLogout {
                    self.session.logout();
                }
                state.enter(to);
                Ok(to)
            }
            Err(e) => {
                warn!(screen = %state.screen, "transition rejected: {}", e);
                state.last_error = Some(e.clone().into());
                Err(e)
            }
        }
    }

    pub fn logout(&self) -> Result<ScreenState, GuardError> {
        self.request_transition(ViewEvent::ClickLogout)
    }

    /// Initial load of the listing
    pub async fn mount(&self) -> Result<Vec<JobPosting>, ClientError> {
        let visit = self.visit();
        let outcome = self.catalog.load_all().await.map_err(ClientError::from);
        self.surface(visit, &outcome);
        outcome
    }

    /// Search from the listing screen; the typed text is kept as the search box
    pub async fn search(&self, query: &str) -> Result<Vec<JobPosting>, ClientError> {
        let visit = {
            let mut state = self.state();
            if state.screen != ScreenState::Jobs {
                let err = GuardError::InvalidFrom {
                    event: "search",
                    from: state.screen,
                };
                state.last_error = Some(err.clone().into());
                return Err(err.into());
            }
            state.search_input = query.to_string();
            state.visit
        };

        let outcome = self.catalog.search(query).await.map_err(ClientError::from);
        self.surface(visit, &outcome);
        outcome
    }

    // =========================================================================
    // FORMS
    // =========================================================================

    /// Edit a field of the active screen's draft
    pub fn update_field(&self, field: FormField, value: &str) -> Result<(), GuardError> {
        let mut state = self.state();
        if state.form.set(field, value) {
            Ok(())
        } else {
            Err(GuardError::InvalidFrom {
                event: field.name(),
                from: state.screen,
            })
        }
    }

    pub async fn submit_post_job(&self) -> Result<JobPosting, ClientError> {
        let (visit, draft) = self.take_draft("submit", |_, form| match form {
            FormDraft::PostJob(d) => Some(d.clone()),
            _ => None,
        })?;

        // The catalog checks the token and required fields before any request
        let token = self.session.current_token();
        self.begin();
        let outcome = self
            .catalog
            .create(&draft, token.as_ref())
            .await
            .map_err(ClientError::from);
        self.settle(visit, outcome, ViewEvent::SubmitSuccess, None)
    }

    pub async fn submit_application(&self) -> Result<(), ClientError> {
        let (visit, (job, draft)) =
            self.take_draft("submit", |screen, form| match (screen, form) {
                (ScreenState::Apply(job), FormDraft::Apply(d)) => Some((job, d.clone())),
                _ => None,
            })?;

        let token = self.require_token()?;
        self.begin();
        let outcome = self
            .api
            .create_application(&draft.trimmed(), job, &token)
            .await
            .map_err(ClientError::from);
        if outcome.is_ok() {
            info!(job = %job, "application submitted");
        }
        self.settle(
            visit,
            outcome,
            ViewEvent::SubmitSuccess,
            Some(APPLICATION_SUBMITTED),
        )
    }

    pub async fn submit_login(&self) -> Result<Token, ClientError> {
        let (visit, creds) = self.take_draft("submit", |_, form| match form {
            FormDraft::Login(d) => Some(d.clone()),
            _ => None,
        })?;

        self.begin();
        let outcome = self
            .session
            .login(creds.username.trim(), &creds.password)
            .await
            .map_err(ClientError::from);
        self.settle(visit, outcome, ViewEvent::AuthSuccess, None)
    }

    pub async fn submit_register(&self) -> Result<Token, ClientError> {
        let (visit, reg) = self.take_draft("submit", |_, form| match form {
            FormDraft::Register(d) => Some(d.clone()),
            _ => None,
        })?;

        self.begin();
        let outcome = self
            .session
            .register(reg.username.trim(), reg.email.trim(), &reg.password)
            .await
            .map_err(ClientError::from);
        self.settle(visit, outcome, ViewEvent::AuthSuccess, None)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn screen(&self) -> ScreenState {
        self.state().screen
    }

    /// Copy of the active draft
    pub fn form(&self) -> FormDraft {
        self.state().form.clone()
    }

    pub fn search_input(&self) -> String {
        self.state().search_input.clone()
    }

    pub fn last_error(&self) -> Option<ClientError> {
        self.state().last_error.clone()
    }

    pub fn notice(&self) -> Option<String> {
        self.state().notice.clone()
    }

    /// True while any submission is awaiting the backend
    pub fn is_busy(&self) -> bool {
        self.state().in_flight > 0
    }

    pub fn can_post(&self) -> bool {
        self.permits(ViewEvent::ClickPost)
    }

    pub fn can_apply(&self) -> bool {
        self.permits(ViewEvent::ClickApply(JobId(0)))
    }

    pub fn can_login(&self) -> bool {
        self.permits(ViewEvent::ClickLogin)
    }

    pub fn can_logout(&self) -> bool {
        self.permits(ViewEvent::ClickLogout)
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn catalog(&self) -> &Arc<JobCatalog> {
        &self.catalog
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn permits(&self, event: ViewEvent) -> bool {
        let authenticated = self.session.is_authenticated();
        transition(self.screen(), event, authenticated).is_ok()
    }

    fn visit(&self) -> u64 {
        self.state().visit
    }

    fn require_token(&self) -> Result<Token, ClientError> {
        self.session.current_token().ok_or_else(|| {
            let err = ClientError::from(AuthError::MissingToken);
            self.state().last_error = Some(err.clone());
            err
        })
    }

    /// Snapshot the active draft if `pick` accepts it, after local validation.
    /// Failures are surfaced immediately; nothing has been sent yet.
    ///
    /// Login and register forms only submit while anonymous: a login that
    /// resolved after its screen was left can leave a session behind.
    fn take_draft<T>(
        &self,
        event: &'static str,
        pick: impl FnOnce(ScreenState, &FormDraft) -> Option<T>,
    ) -> Result<(u64, T), ClientError> {
        let authenticated = self.session.is_authenticated();
        let mut state = self.state();

        let Some(draft) = pick(state.screen, &state.form) else {
            let err = GuardError::InvalidFrom {
                event,
                from: state.screen,
            };
            warn!("{}", err);
            state.last_error = Some(err.clone().into());
            return Err(err.into());
        };

        if authenticated && matches!(state.form, FormDraft::Login(_) | FormDraft::Register(_)) {
            let err = GuardError::RequiresLogout { event };
            warn!(screen = %state.screen, "{}", err);
            state.last_error = Some(err.clone().into());
            return Err(err.into());
        }

        if let Err(e) = state.form.validate() {
            debug!(screen = %state.screen, "draft rejected locally: {}", e);
            let err = ClientError::from(e);
            state.last_error = Some(err.clone());
            return Err(err);
        }

        Ok((state.visit, draft))
    }

    fn begin(&self) {
        self.state().in_flight += 1;
    }

    /// Finish a submission. Only a result from the current visit may move
    /// the view; a stale one is returned to the caller and nothing else.
    fn settle<T>(
        &self,
        visit: u64,
        outcome: Result<T, ClientError>,
        on_success: ViewEvent,
        notice: Option<&str>,
    ) -> Result<T, ClientError> {
        let authenticated = self.session.is_authenticated();
        let mut state = self.state();
        state.in_flight = state.in_flight.saturating_sub(1);

        if state.visit != visit {
            debug!(
                started = visit,
                current = state.visit,
                ok = outcome.is_ok(),
                "submission resolved after its screen was left"
            );
            return outcome;
        }

        match &outcome {
            Ok(_) => match transition(state.screen, on_success, authenticated) {
                Ok(to) => {
                    state.enter(to);
                    state.notice = notice.map(str::to_string);
                }
                Err(e) => warn!("completion could not navigate: {}", e),
            },
            Err(e) => {
                warn!(screen = %state.screen, "submission failed: {}", e);
                state.last_error = Some(e.clone());
            }
        }
        outcome
    }

    /// Record a listing failure if the view has not moved on
    fn surface<T>(&self, visit: u64, outcome: &Result<T, ClientError>) {
        let mut state = self.state();
        if state.visit != visit {
            return;
        }
        match outcome {
            Ok(_) => state.last_error = None,
            Err(e) => state.last_error = Some(e.clone()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ViewController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ViewController")
            .field("screen", &state.screen)
            .field("visit", &state.visit)
            .field("in_flight", &state.in_flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::{ApiCall, InMemoryJobBoardApi};
    use crate::error::ValidationError;
    use crate::session::MemoryTokenStorage;
    use chrono::Utc;

    fn posting(id: i64) -> JobPosting {
        JobPosting {
            id: JobId(id),
            title: "Rust Engineer".into(),
            company: "Ferrous".into(),
            location: "Remote".into(),
            description: "Systems work".into(),
            posted_at: Utc::now(),
            posted_by: None,
        }
    }

    fn controller(api: &Arc<InMemoryJobBoardApi>, token: Option<&Token>) -> ViewController {
        let storage = match token {
            Some(t) => MemoryTokenStorage::with_token(t.as_str()),
            None => MemoryTokenStorage::new(),
        };
        ViewController::connect(api.clone(), Arc::new(storage))
    }

    fn fill(view: &ViewController, pairs: &[(FormField, &str)]) {
        for (field, value) in pairs {
            view.update_field(*field, value).unwrap();
        }
    }

    #[test]
    fn test_anonymous_post_is_rejected_in_place() {
        let api = Arc::new(InMemoryJobBoardApi::new());
        let view = controller(&api, None);

        let err = view.request_transition(ViewEvent::ClickPost).unwrap_err();

        assert_eq!(err, GuardError::RequiresLogin { event: "post" });
        assert_eq!(view.screen(), ScreenState::Jobs);
        assert_eq!(view.last_error(), Some(ClientError::Guard(err)));
        assert!(!view.can_post());
        assert!(view.can_login());
    }

    #[test]
    fn test_same_screen_keeps_draft() {
        let api = Arc::new(InMemoryJobBoardApi::new());
        let view = controller(&api, None);
        view.request_transition(ViewEvent::ClickLogin).unwrap();
        view.update_field(FormField::Username, "ada").unwrap();

        view.request_transition(ViewEvent::ClickLogin).unwrap();
        assert_eq!(view.form().get(FormField::Username), Some("ada"));

        view.request_transition(ViewEvent::ClickRegister).unwrap();
        assert_eq!(view.form().get(FormField::Username), Some(""));
    }

    #[test]
    fn test_update_field_outside_form() {
        let api = Arc::new(InMemoryJobBoardApi::new());
        let view = controller(&api, None);

        assert_eq!(
            view.update_field(FormField::Title, "x"),
            Err(GuardError::InvalidFrom {
                event: "title",
                from: ScreenState::Jobs
            })
        );
    }

    #[tokio::test]
    async fn test_missing_fields_surface_without_request() {
        let api = Arc::new(InMemoryJobBoardApi::new());
        let token = api.add_user("poster", "pw").unwrap();
        let view = controller(&api, Some(&token));
        view.request_transition(ViewEvent::ClickPost).unwrap();
        fill(&view, &[(FormField::Title, "Rust Engineer")]);

        let err = view.submit_post_job().await.unwrap_err();

        assert_eq!(
            err,
            ClientError::Validation(ValidationError::MissingFields(vec![
                "company",
                "location",
                "description"
            ]))
        );
        assert_eq!(view.screen(), ScreenState::PostJob);
        assert_eq!(view.form().get(FormField::Title), Some("Rust Engineer"));
        assert!(api.calls().is_empty());
        assert!(!view.is_busy());
    }

    #[tokio::test]
    async fn test_application_flow_sets_notice() {
        let api = Arc::new(InMemoryJobBoardApi::new().with_jobs(vec![posting(7)]));
        let token = api.add_user("ada", "pw").unwrap();
        let view = controller(&api, Some(&token));
        view.request_transition(ViewEvent::ClickApply(JobId(7))).unwrap();
        fill(
            &view,
            &[
                (FormField::ApplicantName, "Ada"),
                (FormField::ApplicantEmail, "ada@example.com"),
                (FormField::Resume, "https://cv.example.com/ada"),
            ],
        );

        view.submit_application().await.unwrap();

        assert_eq!(view.screen(), ScreenState::Jobs);
        assert_eq!(view.notice().as_deref(), Some(APPLICATION_SUBMITTED));
        assert_eq!(api.calls(), vec![ApiCall::CreateApplication(JobId(7))]);
        assert_eq!(api.applications().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_email_blocks_application() {
        let api = Arc::new(InMemoryJobBoardApi::new());
        let token = api.add_user("ada", "pw").unwrap();
        let view = controller(&api, Some(&token));
        view.request_transition(ViewEvent::ClickApply(JobId(7))).unwrap();
        fill(
            &view,
            &[
                (FormField::ApplicantName, "Ada"),
                (FormField::ApplicantEmail, "ada"),
                (FormField::Resume, "plain text resume"),
            ],
        );

        let err = view.submit_application().await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::InvalidEmail(_))
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_network_loss_keeps_screen_and_draft() {
        let api = Arc::new(InMemoryJobBoardApi::new());
        api.add_user("ada", "pw").unwrap();
        let view = controller(&api, None);
        view.request_transition(ViewEvent::ClickLogin).unwrap();
        fill(
            &view,
            &[(FormField::Username, "ada"), (FormField::Password, "pw")],
        );

        api.set_offline(true);
        let err = view.submit_login().await.unwrap_err();

        assert!(err.is_network());
        assert_eq!(view.screen(), ScreenState::Login);
        assert_eq!(view.form().get(FormField::Password), Some("pw"));
        assert_eq!(view.last_error(), Some(err));

        api.set_offline(false);
        view.submit_login().await.unwrap();
        assert_eq!(view.screen(), ScreenState::Jobs);
        assert_eq!(view.last_error(), None);
        assert!(view.can_logout());
    }

    #[tokio::test]
    async fn test_failed_post_keeps_screen_and_draft() {
        let api = Arc::new(InMemoryJobBoardApi::new().with_jobs(vec![posting(1)]));
        let token = api.add_user("poster", "pw").unwrap();
        let view = controller(&api, Some(&token));
        let listed = view.mount().await.unwrap();
        view.request_transition(ViewEvent::ClickPost).unwrap();
        fill(
            &view,
            &[
                (FormField::Title, "Rust Engineer"),
                (FormField::Company, "Ferrous"),
                (FormField::Location, "Berlin"),
                (FormField::Description, "Async services"),
            ],
        );

        api.set_offline(true);
        let err = view.submit_post_job().await.unwrap_err();

        assert!(err.is_network());
        assert_eq!(view.screen(), ScreenState::PostJob);
        assert_eq!(view.form().get(FormField::Company), Some("Ferrous"));
        assert_eq!(view.last_error(), Some(err));
        assert_eq!(view.catalog().postings(), listed);
        assert!(!view.is_busy());
    }

    #[tokio::test]
    async fn test_failed_application_keeps_screen_and_draft() {
        let api = Arc::new(InMemoryJobBoardApi::new().with_jobs(vec![posting(7)]));
        let token = api.add_user("ada", "pw").unwrap();
        let view = controller(&api, Some(&token));
        view.request_transition(ViewEvent::ClickApply(JobId(7))).unwrap();
        fill(
            &view,
            &[
                (FormField::ApplicantName, "Ada"),
                (FormField::ApplicantEmail, "ada@example.com"),
                (FormField::Resume, "https://cv.example.com/ada"),
            ],
        );

        api.set_offline(true);
        let err = view.submit_application().await.unwrap_err();

        assert!(err.is_network());
        assert_eq!(view.screen(), ScreenState::Apply(JobId(7)));
        assert_eq!(view.form().get(FormField::ApplicantName), Some("Ada"));
        assert_eq!(view.last_error(), Some(err));
        assert_eq!(view.notice(), None);
        assert!(api.applications().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_register_keeps_screen_and_draft() {
        let api = Arc::new(InMemoryJobBoardApi::new());
        api.add_user("ada", "pw").unwrap();
        let view = controller(&api, None);
        view.request_transition(ViewEvent::ClickRegister).unwrap();
        fill(
            &view,
            &[
                (FormField::Username, "ada"),
                (FormField::Email, "ada@example.com"),
                (FormField::Password, "secret"),
            ],
        );

        let err = view.submit_register().await.unwrap_err();

        assert!(matches!(err, ClientError::Auth(AuthError::Rejected(_))));
        assert_eq!(view.screen(), ScreenState::Register);
        assert_eq!(view.form().get(FormField::Email), Some("ada@example.com"));
        assert_eq!(view.last_error(), Some(err));
        assert!(!view.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_notice_cleared_by_any_navigation() {
        let api = Arc::new(InMemoryJobBoardApi::new().with_jobs(vec![posting(7)]));
        let token = api.add_user("ada", "pw").unwrap();
        let view = controller(&api, Some(&token));
        view.request_transition(ViewEvent::ClickApply(JobId(7))).unwrap();
        fill(
            &view,
            &[
                (FormField::ApplicantName, "Ada"),
                (FormField::ApplicantEmail, "ada@example.com"),
                (FormField::Resume, "https://cv.example.com/ada"),
            ],
        );
        view.submit_application().await.unwrap();
        assert!(view.notice().is_some());

        // Already on the listing: no new visit, but the confirmation goes
        assert_eq!(
            view.request_transition(ViewEvent::ClickViewJobs),
            Ok(ScreenState::Jobs)
        );
        assert_eq!(view.notice(), None);
        assert_eq!(view.screen(), ScreenState::Jobs);
    }

    #[tokio::test]
    async fn test_search_only_from_listing() {
        let api = Arc::new(InMemoryJobBoardApi::new());
        let view = controller(&api, None);
        view.request_transition(ViewEvent::ClickRegister).unwrap();

        let err = view.search("rust").await.unwrap_err();

        assert!(matches!(err, ClientError::Guard(_)));
        assert!(api.calls().is_empty());
        assert_eq!(view.search_input(), "");
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let api = Arc::new(InMemoryJobBoardApi::new());
        let token = api.add_user("ada", "pw").unwrap();
        let view = controller(&api, Some(&token));
        view.request_transition(ViewEvent::ClickPost).unwrap();

        assert_eq!(view.logout(), Ok(ScreenState::Jobs));
        assert!(!view.session().is_authenticated());
        assert_eq!(
            view.logout(),
            Err(GuardError::RequiresLogin { event: "logout" })
        );
    }
}
