use std::path::PathBuf;

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PresentPreview { target: Url },
    BeginAuth { url: Url, callback_scheme: String },
    Load { url: Url },
    Reload,
    StartDownload { download_id: crate::DownloadId, url: Url },
    PresentExport { path: PathBuf },
    CollectFiles { request_id: crate::UploadId, allow_multiple: bool },
    /// `None` means nothing was selected; an empty list is never delivered.
    CompleteUpload {
        request_id: crate::UploadId,
        files: Option<Vec<PathBuf>>,
    },
}
