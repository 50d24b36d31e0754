use std::fmt;
use std::path::PathBuf;

pub type DownloadId = u64;
pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub download_id: DownloadId,
    pub written: u64,
    /// `None` when the server did not declare a length.
    pub expected: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(DownloadProgress),
    DownloadCompleted {
        download_id: DownloadId,
        result: Result<PathBuf, DownloadError>,
    },
    FilesCollected {
        request_id: RequestId,
        files: Option<Vec<PathBuf>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DownloadError {
    pub kind: FailureKind,
    pub message: String,
}

impl DownloadError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    UnsupportedScheme(String),
    HttpStatus(u16),
    Timeout,
    Network,
    Io,
    /// The transfer succeeded but the result could not be moved into place.
    Relocation,
    EngineUnavailable,
}

impl FailureKind {
    pub fn is_relocation(&self) -> bool {
        matches!(self, FailureKind::Relocation)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::UnsupportedScheme(scheme) => write!(f, "unsupported scheme {scheme}"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Relocation => write!(f, "relocation failed"),
            FailureKind::EngineUnavailable => write!(f, "engine unavailable"),
        }
    }
}
