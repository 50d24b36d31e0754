use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use tempfile::TempDir;
use webshell_engine::{
    CaptureEnvironment, CaptureSource, DownloadError, DownloadId, DownloadSettings, Downloader,
    EngineEvent, EngineHandle, FailureKind, FileSelector, PickedMedia, ProgressSink,
    SelectionLimit,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct DocumentsOnly(Option<Vec<PathBuf>>);

#[async_trait::async_trait]
impl CaptureEnvironment for DocumentsOnly {
    fn camera_available(&self) -> bool {
        false
    }

    async fn choose_source(&self, _offered: &[CaptureSource]) -> Option<CaptureSource> {
        self.0.as_ref().map(|_| CaptureSource::Files)
    }

    async fn capture_photo(&self) -> Option<DynamicImage> {
        None
    }

    async fn pick_media(&self, _limit: SelectionLimit) -> Vec<Box<dyn PickedMedia>> {
        Vec::new()
    }

    async fn pick_documents(&self, _allow_multiple: bool) -> Option<Vec<PathBuf>> {
        self.0.clone()
    }
}

fn selector(dir: &TempDir, documents: Option<Vec<PathBuf>>) -> FileSelector {
    FileSelector::new(Arc::new(DocumentsOnly(documents)), dir.path().join("staging"))
}

async fn next_events(engine: &EngineHandle, until: impl Fn(&EngineEvent) -> bool) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    for _ in 0..500 {
        while let Some(event) = engine.try_recv() {
            let done = until(&event);
            events.push(event);
            if done {
                return events;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("engine did not settle; saw {events:?}");
}

#[tokio::test]
async fn download_reports_progress_then_completion() {
    shell_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/report.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"a,b\n1,2\n".to_vec(), "text/csv"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let settings = DownloadSettings {
        download_dir: dir.path().join("downloads"),
        ..DownloadSettings::default()
    };
    let engine = EngineHandle::new(settings, selector(&dir, None));
    assert!(engine.download(7, format!("{}/files/report.csv", server.uri())));

    let events = next_events(&engine, |event| {
        matches!(event, EngineEvent::DownloadCompleted { .. })
    })
    .await;

    assert!(matches!(events.first(), Some(EngineEvent::Progress(p)) if p.download_id == 7));
    match events.last() {
        Some(EngineEvent::DownloadCompleted { download_id, result }) => {
            assert_eq!(*download_id, 7);
            let saved = result.as_ref().expect("download");
            assert_eq!(saved, &dir.path().join("downloads").join("report.csv"));
            assert_eq!(fs::read(saved).unwrap(), b"a,b\n1,2\n");
        }
        other => panic!("unexpected final event {other:?}"),
    }
}

struct Refusing;

#[async_trait::async_trait]
impl Downloader for Refusing {
    async fn download(
        &self,
        _download_id: DownloadId,
        _url: &str,
        _sink: &dyn ProgressSink,
    ) -> Result<PathBuf, DownloadError> {
        Err(DownloadError {
            kind: FailureKind::Network,
            message: "offline".to_string(),
        })
    }
}

#[tokio::test]
async fn failed_download_still_settles() {
    let dir = TempDir::new().unwrap();
    let engine = EngineHandle::with_downloader(Arc::new(Refusing), selector(&dir, None));
    assert!(engine.download(3, "https://example.com/a.zip"));

    let events = next_events(&engine, |_| true).await;
    assert_eq!(
        events,
        vec![EngineEvent::DownloadCompleted {
            download_id: 3,
            result: Err(DownloadError {
                kind: FailureKind::Network,
                message: "offline".to_string(),
            }),
        }]
    );
}

#[tokio::test]
async fn collected_files_come_back_with_their_request_id() {
    let dir = TempDir::new().unwrap();
    let docs = vec![PathBuf::from("/inbox/form.pdf")];
    let engine = EngineHandle::new(DownloadSettings::default(), selector(&dir, Some(docs.clone())));
    assert!(engine.collect_files(11, false));

    let events = next_events(&engine, |_| true).await;
    assert_eq!(
        events,
        vec![EngineEvent::FilesCollected {
            request_id: 11,
            files: Some(docs),
        }]
    );
}

#[tokio::test]
async fn cancelled_collection_reports_none() {
    let dir = TempDir::new().unwrap();
    let engine = EngineHandle::new(DownloadSettings::default(), selector(&dir, None));
    assert!(engine.collect_files(2, true));

    let events = next_events(&engine, |_| true).await;
    assert_eq!(
        events,
        vec![EngineEvent::FilesCollected {
            request_id: 2,
            files: None,
        }]
    );
}
