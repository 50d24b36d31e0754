use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use shell_logging::{log_url, shell_debug, shell_info};

use crate::filename::download_filename;
use crate::persist::{partial_file_in, relocate, PersistError};
use crate::{DownloadError, DownloadId, DownloadProgress, EngineEvent, FailureKind};

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub connect_timeout: Duration,
    /// Bound on the whole transfer so a stalled server cannot pin the
    /// progress indicator forever.
    pub request_timeout: Duration,
    pub download_dir: PathBuf,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            download_dir: std::env::temp_dir().join("webshell-downloads"),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Transfers `url` and relocates the result; returns the final path.
    async fn download(
        &self,
        download_id: DownloadId,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestDownloader {
    settings: DownloadSettings,
}

impl ReqwestDownloader {
    pub fn new(settings: DownloadSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, DownloadError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| DownloadError::new(FailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Downloader for ReqwestDownloader {
    async fn download(
        &self,
        download_id: DownloadId,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, DownloadError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| DownloadError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::new(
                FailureKind::UnsupportedScheme(parsed.scheme().to_string()),
                "only http and https downloads are supported",
            ));
        }
        let client = self.build_client()?;

        shell_info!("Download {} starting: {}", download_id, log_url(url));
        let response = client.get(parsed).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let expected = response.content_length();
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let filename = download_filename(disposition.as_deref(), response.url());

        let mut partial = partial_file_in(&self.settings.download_dir).map_err(io_error)?;
        let mut written: u64 = 0;
        sink.emit(EngineEvent::Progress(DownloadProgress {
            download_id,
            written,
            expected,
        }));

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            partial
                .write_all(&chunk)
                .map_err(|err| DownloadError::new(FailureKind::Io, err.to_string()))?;
            written += chunk.len() as u64;
            sink.emit(EngineEvent::Progress(DownloadProgress {
                download_id,
                written,
                expected,
            }));
        }
        shell_debug!("Download {} transferred {} bytes", download_id, written);

        let path = relocate(partial, &self.settings.download_dir, &filename)
            .map_err(|err| DownloadError::new(FailureKind::Relocation, err.to_string()))?;
        shell_info!("Download {} relocated to {:?}", download_id, path);
        Ok(path)
    }
}

fn io_error(err: PersistError) -> DownloadError {
    DownloadError::new(FailureKind::Io, err.to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        return DownloadError::new(FailureKind::Timeout, err.to_string());
    }
    DownloadError::new(FailureKind::Network, err.to_string())
}
