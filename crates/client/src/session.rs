//! Process-held session state
//!
//! One [`SessionState`] is owned by each client instance and passed
//! explicitly into the authenticator and invoker. It is never persisted:
//! tokens live only as long as the process.

/// The cached session credential and the attempt count of the most recent
/// login backoff sequence.
#[derive(Debug, Default)]
pub struct SessionState {
    token: Option<String>,
    login_attempts: u32,
}

impl SessionState {
    /// Create session state, optionally seeded with a legacy token.
    pub fn new(seed_token: Option<String>) -> Self {
        Self { token: seed_token.filter(|t| !t.is_empty()), login_attempts: 0 }
    }

    /// The cached session token, if one is held.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Cache a freshly issued token and reset the attempt counter.
    pub fn store_token(&mut self, token: String) {
        self.token = Some(token);
        self.login_attempts = 0;
    }

    /// Drop the cached token so the next call re-authenticates from scratch.
    pub fn invalidate(&mut self) {
        self.token = None;
    }

    /// Attempts consumed by the most recent login sequence.
    pub fn login_attempts(&self) -> u32 {
        self.login_attempts
    }

    /// Record how many retries the last (failed) login sequence consumed.
    pub fn record_login_attempts(&mut self, attempts: u32) {
        self.login_attempts = attempts;
    }
}
