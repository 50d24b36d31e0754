//! One-shot external sign-in sessions with at-most-one-active semantics.
//!
//! The external browser reports its outcome from any thread through an
//! [`AuthReporter`]. Completions run on the owner thread, from
//! [`AuthHandoff::drain_reports`] or synchronously inside `start`/`cancel`.

use std::sync::mpsc;

use shell_logging::{log_url, shell_debug, shell_info, shell_warn};
use url::Url;

pub type AuthSessionId = u64;

pub type AuthResult = Result<Url, AuthError>;

type AuthCompletion = Box<dyn FnOnce(AuthResult)>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Reported to a session that was replaced by a newer one.
    #[error("authentication session superseded by a newer session")]
    SessionAlreadyActive,
    #[error("failed to start authentication session: {0}")]
    SessionStartFailure(String),
    #[error("authentication cancelled by the app")]
    Cancelled,
    #[error("authentication failed: {0}")]
    Flow(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub session_id: AuthSessionId,
    pub url: Url,
    pub callback_scheme: String,
    pub prefers_ephemeral: bool,
}

/// Delivers the outcome of one session. Consumed on use.
#[derive(Debug)]
pub struct AuthReporter {
    session_id: AuthSessionId,
    tx: mpsc::Sender<(AuthSessionId, AuthResult)>,
}

impl AuthReporter {
    pub fn session_id(&self) -> AuthSessionId {
        self.session_id
    }

    pub fn report(self, result: AuthResult) {
        let _ = self.tx.send((self.session_id, result));
    }
}

/// The external, user-facing sign-in flow.
pub trait AuthBrowser {
    /// Presents the flow. Must eventually call `reporter.report` unless
    /// dismissed, and must return an error if the flow could not start.
    fn present(&mut self, request: &AuthRequest, reporter: AuthReporter) -> Result<(), AuthError>;

    /// Tears down a presented flow. Must tolerate unknown ids.
    fn dismiss(&mut self, session_id: AuthSessionId);
}

struct ActiveAuthSession {
    session_id: AuthSessionId,
    completion: AuthCompletion,
}

pub struct AuthHandoff {
    browser: Box<dyn AuthBrowser>,
    active: Option<ActiveAuthSession>,
    next_session_id: AuthSessionId,
    prefers_ephemeral: bool,
    report_tx: mpsc::Sender<(AuthSessionId, AuthResult)>,
    report_rx: mpsc::Receiver<(AuthSessionId, AuthResult)>,
}

impl AuthHandoff {
    pub fn new(browser: Box<dyn AuthBrowser>) -> Self {
        let (report_tx, report_rx) = mpsc::channel();
        Self {
            browser,
            active: None,
            next_session_id: 0,
            prefers_ephemeral: false,
            report_tx,
            report_rx,
        }
    }

    pub fn with_ephemeral_sessions(mut self, prefers_ephemeral: bool) -> Self {
        self.prefers_ephemeral = prefers_ephemeral;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_session(&self) -> Option<AuthSessionId> {
        self.active.as_ref().map(|active| active.session_id)
    }

    /// Starts a session. An active session is dismissed and its completion
    /// receives [`AuthError::SessionAlreadyActive`] before the new one is
    /// presented.
    pub fn start<F>(&mut self, url: Url, callback_scheme: &str, completion: F) -> AuthSessionId
    where
        F: FnOnce(AuthResult) + 'static,
    {
        if let Some(previous) = self.active.take() {
            shell_debug!("Superseding auth session {}", previous.session_id);
            self.browser.dismiss(previous.session_id);
            (previous.completion)(Err(AuthError::SessionAlreadyActive));
        }

        self.next_session_id += 1;
        let session_id = self.next_session_id;
        let request = AuthRequest {
            session_id,
            url,
            callback_scheme: callback_scheme.to_string(),
            prefers_ephemeral: self.prefers_ephemeral,
        };
        let reporter = AuthReporter {
            session_id,
            tx: self.report_tx.clone(),
        };

        match self.browser.present(&request, reporter) {
            Ok(()) => {
                shell_info!(
                    "Auth session {} started for {}",
                    session_id,
                    log_url(request.url.as_str())
                );
                self.active = Some(ActiveAuthSession {
                    session_id,
                    completion: Box::new(completion),
                });
            }
            Err(err) => {
                shell_warn!("Auth session {} failed to start: {}", session_id, err);
                let err = match err {
                    AuthError::SessionStartFailure(_) => err,
                    other => AuthError::SessionStartFailure(other.to_string()),
                };
                completion(Err(err));
            }
        }
        session_id
    }

    /// Cancels the active session, if any. Idempotent.
    pub fn cancel(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        shell_info!("Cancelling auth session {}", active.session_id);
        self.browser.dismiss(active.session_id);
        (active.completion)(Err(AuthError::Cancelled));
    }

    /// Runs completions for outcomes the browser has reported so far.
    /// Returns how many completions ran.
    pub fn drain_reports(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok((session_id, result)) = self.report_rx.try_recv() {
            match self.active.take() {
                Some(active) if active.session_id == session_id => {
                    (active.completion)(result);
                    delivered += 1;
                }
                other => {
                    self.active = other;
                    shell_debug!("Dropping report for finished auth session {}", session_id);
                }
            }
        }
        delivered
    }
}
