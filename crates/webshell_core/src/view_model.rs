use url::Url;

/// Observable snapshot of the session, read by the UI shell.
///
/// Readers must tolerate transitional combinations such as `is_loading`
/// with a stale `current_location`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub current_location: Option<Url>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub is_chrome_hidden: bool,
    /// Fraction in `[0, 1]`.
    pub download_progress: f64,
    pub download_active: bool,
    pub upload_pending: bool,
    /// User-facing message for the most recent failed hand-off.
    pub last_error: Option<String>,
    pub dirty: bool,
}
