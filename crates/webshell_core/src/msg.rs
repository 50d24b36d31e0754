use std::path::PathBuf;

use url::Url;

use crate::{NavigationDecision, NavigationStage, ScrollSample};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The classifier decided a navigation request or response.
    NavigationDecided {
        stage: NavigationStage,
        decision: NavigationDecision,
    },
    /// Rendering surface started a navigation.
    NavigationStarted {
        location: Option<Url>,
        can_go_back: bool,
        can_go_forward: bool,
    },
    /// Rendering surface finished a navigation.
    NavigationFinished {
        location: Option<Url>,
        can_go_back: bool,
        can_go_forward: bool,
    },
    /// Rendering surface failed a navigation.
    NavigationFailed { reason: String },
    /// User pulled to refresh.
    RefreshRequested,
    /// Explicit download outside of navigation classification.
    DownloadRequested { url: Url },
    /// Transfer progress for the active download.
    DownloadProgressed {
        download_id: crate::DownloadId,
        written: u64,
        expected: Option<u64>,
    },
    /// Transfer and relocation settled for a download.
    DownloadFinished {
        download_id: crate::DownloadId,
        outcome: DownloadOutcome,
    },
    /// The external authentication session settled.
    AuthFinished { outcome: AuthOutcome },
    /// Page content asked for files.
    UploadTriggered {
        request_id: crate::UploadId,
        accept: String,
        allow_multiple: bool,
    },
    /// The file-selection flow settled.
    FilesCollected {
        request_id: crate::UploadId,
        files: Option<Vec<PathBuf>>,
    },
    Scrolled(ScrollSample),
    /// Owner loop tick; applies due chrome transitions.
    Tick { now_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Redirect(Url),
    /// A newer session replaced this one.
    Superseded,
    /// The app cancelled the session.
    Cancelled,
    Failed { reason: String },
}
