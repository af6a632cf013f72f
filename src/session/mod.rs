//! Session store
//!
//! Owns the authentication token. The durable slot is read exactly once, in
//! [`SessionStore::open`]; afterwards it is only written, on every change,
//! before the changing call returns.

pub mod storage;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use job_board_types::{Credentials, Registration, Token};
use tracing::{info, warn};

use crate::api::JobBoardApi;
use crate::error::AuthError;

pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};

pub struct SessionStore {
    api: Arc<dyn JobBoardApi>,
    storage: Arc<dyn TokenStorage>,
    token: Mutex<Option<Token>>,
}

impl SessionStore {
    /// Restore the session from durable storage.
    ///
    /// An unreadable slot starts the session anonymous rather than failing.
    pub fn open(api: Arc<dyn JobBoardApi>, storage: Arc<dyn TokenStorage>) -> Self {
        let token = match storage.load() {
            Ok(raw) => raw.and_then(Token::new),
            Err(e) => {
                warn!("Failed to read stored token, starting anonymous: {}", e);
                None
            }
        };
        info!(authenticated = token.is_some(), "session restored");

        Self {
            api,
            storage,
            token: Mutex::new(token),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Token, AuthError> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let token = self.api.login(&credentials).await.map_err(|e| {
            warn!(username, "login failed: {}", e);
            AuthError::from(e)
        })?;

        self.establish(token.clone())?;
        info!(username, "logged in");
        Ok(token)
    }

    /// Create an account. Success logs the new user in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Token, AuthError> {
        let registration = Registration {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        };
        let token = self.api.register(&registration).await.map_err(|e| {
            warn!(username, "registration failed: {}", e);
            AuthError::from(e)
        })?;

        self.establish(token.clone())?;
        info!(username, "registered and logged in");
        Ok(token)
    }

    /// Forget the token. Storage failures are logged, never returned.
    pub fn logout(&self) {
        if let Err(e) = self.storage.clear() {
            warn!("Failed to clear stored token: {}", e);
        }
        *self.token_slot() = None;
        info!("logged out");
    }

    pub fn current_token(&self) -> Option<Token> {
        self.token_slot().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token_slot().is_some()
    }

    /// Persist first, then publish in memory: a failed write leaves both
    /// the slot and the in-memory session as they were.
    fn establish(&self, token: Token) -> Result<(), AuthError> {
        self.storage
            .store(token.as_str())
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        *self.token_slot() = Some(token);
        Ok(())
    }

    fn token_slot(&self) -> MutexGuard<'_, Option<Token>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
