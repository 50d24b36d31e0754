use shell_logging::{log_url, shell_debug, shell_error, shell_info, shell_warn};
use url::Url;

use crate::{
    AuthOutcome, DownloadOutcome, Effect, HandoffKind, Msg, NavigationDecision, NavigationStage,
    ShellState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ShellState, msg: Msg) -> (ShellState, Vec<Effect>) {
    let effects = match msg {
        Msg::NavigationDecided { stage, decision } => {
            if stage == NavigationStage::Request {
                state.record_request_decision(&decision);
            }
            route_decision(&mut state, stage, decision)
        }
        Msg::NavigationStarted {
            location,
            can_go_back,
            can_go_forward,
        } => {
            state.set_loading(true);
            state.set_navigation(location, can_go_back, can_go_forward);
            state.set_last_error(None);
            Vec::new()
        }
        Msg::NavigationFinished {
            location,
            can_go_back,
            can_go_forward,
        } => {
            state.set_loading(false);
            state.set_navigation(location, can_go_back, can_go_forward);
            state.end_refresh();
            Vec::new()
        }
        Msg::NavigationFailed { reason } => {
            shell_warn!("Navigation failed: {}", reason);
            state.set_loading(false);
            state.end_refresh();
            Vec::new()
        }
        Msg::RefreshRequested => {
            if state.is_refreshing() {
                Vec::new()
            } else {
                state.begin_refresh();
                vec![Effect::Reload]
            }
        }
        Msg::DownloadRequested { url } => start_download(&mut state, url),
        Msg::DownloadProgressed {
            download_id,
            written,
            expected,
        } => {
            if state.is_active_download(download_id) {
                state.apply_download_progress(written, expected);
            }
            Vec::new()
        }
        Msg::DownloadFinished {
            download_id,
            outcome,
        } => {
            if !state.is_active_download(download_id) {
                shell_debug!("Ignoring result of stale download {}", download_id);
                return (state, Vec::new());
            }
            match outcome {
                DownloadOutcome::Saved(path) => {
                    state.finish_download(true);
                    shell_info!("Download {} saved to {:?}", download_id, path);
                    vec![Effect::PresentExport { path }]
                }
                DownloadOutcome::Failed { reason } => {
                    state.finish_download(false);
                    shell_error!("Download {} failed: {}", download_id, reason);
                    state.set_last_error(Some(format!("Download failed: {reason}")));
                    Vec::new()
                }
            }
        }
        Msg::AuthFinished { outcome } => match outcome {
            AuthOutcome::Redirect(url) => {
                shell_info!("Sign-in completed, loading {}", log_url(url.as_str()));
                vec![Effect::Load { url }]
            }
            AuthOutcome::Superseded => {
                shell_debug!("Sign-in session superseded by a newer one");
                Vec::new()
            }
            AuthOutcome::Cancelled => {
                shell_info!("Sign-in session cancelled");
                Vec::new()
            }
            AuthOutcome::Failed { reason } => {
                shell_warn!("Sign-in failed: {}", reason);
                state.set_last_error(Some(format!("Sign-in failed: {reason}")));
                Vec::new()
            }
        },
        Msg::UploadTriggered {
            request_id,
            accept,
            allow_multiple,
        } => {
            if let Some(pending) = state.pending_upload() {
                shell_warn!(
                    "Rejecting upload request {} (accept={:?}); request {} is still open",
                    request_id,
                    accept,
                    pending
                );
                vec![Effect::CompleteUpload {
                    request_id,
                    files: None,
                }]
            } else {
                state.begin_upload(request_id);
                vec![Effect::CollectFiles {
                    request_id,
                    allow_multiple,
                }]
            }
        }
        Msg::FilesCollected { request_id, files } => {
            if !state.finish_upload(request_id) {
                shell_warn!("Ignoring files for unknown upload request {}", request_id);
                return (state, Vec::new());
            }
            let files = files.filter(|files| !files.is_empty());
            vec![Effect::CompleteUpload { request_id, files }]
        }
        Msg::Scrolled(sample) => {
            state.observe_scroll(sample);
            Vec::new()
        }
        Msg::Tick { now_ms } => {
            state.tick_chrome(now_ms);
            Vec::new()
        }
    };

    (state, effects)
}

fn route_decision(
    state: &mut ShellState,
    stage: NavigationStage,
    decision: NavigationDecision,
) -> Vec<Effect> {
    let NavigationDecision::Handoff { kind, target } = decision else {
        return Vec::new();
    };
    shell_info!(
        "{:?} hand-off {:?} for {}",
        stage,
        kind,
        log_url(target.as_str())
    );
    match kind {
        HandoffKind::Preview => vec![Effect::PresentPreview { target }],
        HandoffKind::Auth { callback_scheme } => vec![Effect::BeginAuth {
            url: target,
            callback_scheme,
        }],
        HandoffKind::Download => start_download(state, target),
    }
}

fn start_download(state: &mut ShellState, url: Url) -> Vec<Effect> {
    if !matches!(url.scheme(), "http" | "https") {
        shell_warn!("Refusing to download non-network url {}", log_url(url.as_str()));
        return Vec::new();
    }
    if let Some(active) = state.active_download() {
        shell_warn!(
            "Download {} still running; ignoring {}",
            active.download_id,
            log_url(url.as_str())
        );
        return Vec::new();
    }
    let download_id = state.begin_download(url.clone());
    vec![Effect::StartDownload { download_id, url }]
}
