use std::sync::{mpsc, Arc};
use std::thread;

use shell_logging::{shell_debug, shell_error};

use crate::download::{ChannelProgressSink, DownloadSettings, Downloader, ReqwestDownloader};
use crate::selection::FileSelector;
use crate::{DownloadError, DownloadId, EngineEvent, FailureKind, RequestId};

enum EngineCommand {
    Download { download_id: DownloadId, url: String },
    CollectFiles { request_id: RequestId, allow_multiple: bool },
}

/// Runs downloads and file selection on a background runtime.
///
/// Results never touch caller state directly: they queue up as
/// [`EngineEvent`]s until the owner thread drains them with `try_recv`.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: DownloadSettings, selector: FileSelector) -> Self {
        Self::with_downloader(Arc::new(ReqwestDownloader::new(settings)), selector)
    }

    pub fn with_downloader(downloader: Arc<dyn Downloader>, selector: FileSelector) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    shell_error!("Failed to start engine runtime: {}", err);
                    while let Ok(command) = cmd_rx.recv() {
                        reject_command(command, &event_tx);
                    }
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let downloader = downloader.clone();
                let selector = selector.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(downloader.as_ref(), &selector, command, event_tx).await;
                });
            }
            shell_debug!("Engine command channel closed");
        });

        Self { cmd_tx, event_rx }
    }

    /// Returns false when the engine thread is gone; no event will follow.
    pub fn download(&self, download_id: DownloadId, url: impl Into<String>) -> bool {
        self.submit(EngineCommand::Download {
            download_id,
            url: url.into(),
        })
    }

    /// Returns false when the engine thread is gone; no event will follow.
    pub fn collect_files(&self, request_id: RequestId, allow_multiple: bool) -> bool {
        self.submit(EngineCommand::CollectFiles {
            request_id,
            allow_multiple,
        })
    }

    fn submit(&self, command: EngineCommand) -> bool {
        match self.cmd_tx.send(command) {
            Ok(()) => true,
            Err(_) => {
                shell_error!("Engine thread is not running; command dropped");
                false
            }
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

async fn handle_command(
    downloader: &dyn Downloader,
    selector: &FileSelector,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Download { download_id, url } => {
            let sink = ChannelProgressSink::new(event_tx.clone());
            let result = downloader.download(download_id, &url, &sink).await;
            let _ = event_tx.send(EngineEvent::DownloadCompleted {
                download_id,
                result,
            });
        }
        EngineCommand::CollectFiles {
            request_id,
            allow_multiple,
        } => {
            let files = selector.collect(allow_multiple).await;
            let _ = event_tx.send(EngineEvent::FilesCollected { request_id, files });
        }
    }
}

/// Settles a command without running it so the owner never waits forever.
fn reject_command(command: EngineCommand, event_tx: &mpsc::Sender<EngineEvent>) {
    let event = match command {
        EngineCommand::Download { download_id, .. } => EngineEvent::DownloadCompleted {
            download_id,
            result: Err(DownloadError::new(
                FailureKind::EngineUnavailable,
                "background runtime is not running",
            )),
        },
        EngineCommand::CollectFiles { request_id, .. } => EngineEvent::FilesCollected {
            request_id,
            files: None,
        },
    };
    let _ = event_tx.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_to_a_stopped_engine_are_refused() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (_event_tx, event_rx) = mpsc::channel();
        drop(cmd_rx);
        let engine = EngineHandle { cmd_tx, event_rx };

        assert!(!engine.download(1, "https://example.com/a.zip"));
        assert!(!engine.collect_files(2, true));
        assert!(engine.try_recv().is_none());
    }
}
