//! Webshell engine: asynchronous hand-off flows and their IO.
mod auth;
mod download;
mod engine;
mod filename;
mod persist;
mod selection;
mod types;

pub use auth::{
    AuthBrowser, AuthError, AuthHandoff, AuthReporter, AuthRequest, AuthResult, AuthSessionId,
};
pub use download::{
    ChannelProgressSink, DownloadSettings, Downloader, ProgressSink, ReqwestDownloader,
};
pub use engine::EngineHandle;
pub use filename::download_filename;
pub use persist::{
    ensure_output_dir, partial_file_in, relocate, stage_copy, write_unique, PersistError,
};
pub use selection::{
    encode_capture, CaptureEnvironment, CaptureSource, FileSelector, PickedMedia,
    ResolutionError, SelectionLimit,
};
pub use types::{
    DownloadError, DownloadId, DownloadProgress, EngineEvent, FailureKind, RequestId,
};
