use url::Url;

use crate::chrome::{ChromeSettings, ChromeVisibility, ScrollSample};
use crate::view_model::SessionState;
use crate::NavigationDecision;

pub type DownloadId = u64;
pub type UploadId = u64;

/// Transfer progress stops short of 1.0; the last step belongs to relocation.
pub const TRANSFER_PROGRESS_CEILING: f64 = 0.99;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDownload {
    pub download_id: DownloadId,
    pub url: Url,
    pub written: u64,
    pub expected: Option<u64>,
}

/// Owner-side state of the coordinator. Only `update` mutates it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShellState {
    current_location: Option<Url>,
    can_go_back: bool,
    can_go_forward: bool,
    is_loading: bool,
    is_refreshing: bool,
    download_progress: f64,
    last_error: Option<String>,
    chrome: ChromeVisibility,
    pending_upload: Option<UploadId>,
    active_download: Option<ActiveDownload>,
    next_download_id: DownloadId,
    handed_off_request: Option<NavigationDecision>,
    dirty: bool,
}

impl ShellState {
    pub fn new(chrome: ChromeSettings) -> Self {
        Self {
            chrome: ChromeVisibility::new(chrome),
            ..Self::default()
        }
    }

    pub fn view(&self) -> SessionState {
        SessionState {
            current_location: self.current_location.clone(),
            can_go_back: self.can_go_back,
            can_go_forward: self.can_go_forward,
            is_loading: self.is_loading,
            is_refreshing: self.is_refreshing,
            is_chrome_hidden: self.chrome.is_hidden(),
            download_progress: self.download_progress,
            download_active: self.active_download.is_some(),
            upload_pending: self.pending_upload.is_some(),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the view changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn current_location(&self) -> Option<&Url> {
        self.current_location.as_ref()
    }

    pub fn is_refreshing(&self) -> bool {
        self.is_refreshing
    }

    pub fn active_download(&self) -> Option<&ActiveDownload> {
        self.active_download.as_ref()
    }

    pub fn pending_upload(&self) -> Option<UploadId> {
        self.pending_upload
    }

    pub fn chrome(&self) -> &ChromeVisibility {
        &self.chrome
    }

    /// The hand-off already issued for `url` at the request stage, if any.
    pub fn prior_handoff(&self, url: &Url) -> Option<&NavigationDecision> {
        self.handed_off_request.as_ref().filter(|decision| {
            matches!(decision, NavigationDecision::Handoff { target, .. } if target == url)
        })
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn record_request_decision(&mut self, decision: &NavigationDecision) {
        self.handed_off_request = decision.is_handoff().then(|| decision.clone());
    }

    pub(crate) fn set_navigation(
        &mut self,
        location: Option<Url>,
        can_go_back: bool,
        can_go_forward: bool,
    ) {
        self.current_location = location;
        self.can_go_back = can_go_back;
        self.can_go_forward = can_go_forward;
        self.mark_dirty();
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.mark_dirty();
    }

    pub(crate) fn begin_refresh(&mut self) {
        self.is_refreshing = true;
        self.mark_dirty();
    }

    /// Returns true when a refresh was outstanding.
    pub(crate) fn end_refresh(&mut self) -> bool {
        let was_refreshing = std::mem::take(&mut self.is_refreshing);
        if was_refreshing {
            self.mark_dirty();
        }
        was_refreshing
    }

    pub(crate) fn set_last_error(&mut self, message: Option<String>) {
        if self.last_error != message {
            self.last_error = message;
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_download(&mut self, url: Url) -> DownloadId {
        self.next_download_id += 1;
        let download_id = self.next_download_id;
        self.active_download = Some(ActiveDownload {
            download_id,
            url,
            written: 0,
            expected: None,
        });
        self.download_progress = 0.0;
        self.mark_dirty();
        download_id
    }

    pub(crate) fn is_active_download(&self, download_id: DownloadId) -> bool {
        self.active_download
            .as_ref()
            .is_some_and(|active| active.download_id == download_id)
    }

    /// Advances progress monotonically. Unknown or zero totals keep the last
    /// advertised fraction.
    pub(crate) fn apply_download_progress(&mut self, written: u64, expected: Option<u64>) {
        let Some(active) = self.active_download.as_mut() else {
            return;
        };
        active.written = written;
        active.expected = expected;

        let Some(total) = expected.filter(|total| *total > 0) else {
            return;
        };
        let fraction = (written as f64 / total as f64).min(TRANSFER_PROGRESS_CEILING);
        if fraction > self.download_progress {
            self.download_progress = fraction;
            self.mark_dirty();
        }
    }

    pub(crate) fn finish_download(&mut self, saved: bool) -> Option<ActiveDownload> {
        let finished = self.active_download.take();
        self.download_progress = if saved { 1.0 } else { 0.0 };
        self.mark_dirty();
        finished
    }

    pub(crate) fn begin_upload(&mut self, request_id: UploadId) {
        self.pending_upload = Some(request_id);
        self.mark_dirty();
    }

    pub(crate) fn finish_upload(&mut self, request_id: UploadId) -> bool {
        if self.pending_upload != Some(request_id) {
            return false;
        }
        self.pending_upload = None;
        self.mark_dirty();
        true
    }

    pub(crate) fn observe_scroll(&mut self, sample: ScrollSample) {
        self.chrome.observe(sample);
    }

    pub(crate) fn tick_chrome(&mut self, now_ms: u64) {
        if self.chrome.tick(now_ms) {
            self.mark_dirty();
        }
    }
}
