use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Instant;

use shell_logging::{log_url, shell_debug, shell_info, shell_warn};
use url::Url;
use webshell_core::{
    update, AuthOutcome, DownloadOutcome, Effect, Msg, NavigationClassifier, NavigationPolicy,
    NavigationStage, ScrollSample, SessionState, ShellState, UploadId,
};
use webshell_engine::{
    AuthError, AuthHandoff, AuthResult, CaptureEnvironment, EngineEvent, EngineHandle,
    FileSelector,
};

use crate::bridge::{parse_file_picker_message, selected_files_script, FILE_PICKER_HANDLER};
use crate::config::ShellConfig;
use crate::surface::{HostShell, RenderingSurface};

/// Milliseconds on a monotonic clock; drives the chrome debounce.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Receives the files picked for an upload input; `None` means nothing.
pub type UploadCompletion = Box<dyn FnOnce(Option<Vec<PathBuf>>)>;

enum PendingCompletion {
    Callback(UploadCompletion),
    /// The request came through the script bridge and is answered with a
    /// page event.
    ScriptBridge,
}

/// Owner-thread driver: feeds rendering-surface events through the policy
/// core and carries out the resulting effects.
///
/// Background work (transfers, file selection, sign-in) never touches the
/// state directly; its results queue up until the owner calls [`pump`].
///
/// [`pump`]: Coordinator::pump
pub struct Coordinator {
    state: ShellState,
    classifier: NavigationClassifier,
    surface: Box<dyn RenderingSurface>,
    host: Box<dyn HostShell>,
    auth: Option<AuthHandoff>,
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
    msg_rx: mpsc::Receiver<Msg>,
    uploads: HashMap<UploadId, PendingCompletion>,
    next_upload_id: UploadId,
    start_url: Option<Url>,
    clock: Clock,
}

impl Coordinator {
    pub fn new(
        config: &ShellConfig,
        surface: Box<dyn RenderingSurface>,
        host: Box<dyn HostShell>,
        auth: Option<AuthHandoff>,
        capture: Arc<dyn CaptureEnvironment>,
    ) -> Self {
        let selector = FileSelector::new(capture, config.staging_dir.clone());
        let engine = EngineHandle::new(config.download_settings(), selector);
        Self::with_engine(config, surface, host, auth, engine)
    }

    pub fn with_engine(
        config: &ShellConfig,
        surface: Box<dyn RenderingSurface>,
        host: Box<dyn HostShell>,
        auth: Option<AuthHandoff>,
        engine: EngineHandle,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        let epoch = Instant::now();
        Self {
            state: ShellState::new(config.chrome),
            classifier: config.classifier(),
            surface,
            host,
            auth: auth.map(|auth| auth.with_ephemeral_sessions(config.ephemeral_auth_sessions)),
            engine,
            msg_tx,
            msg_rx,
            uploads: HashMap::new(),
            next_upload_id: 0,
            start_url: config.start_url.clone(),
            clock: Arc::new(move || epoch.elapsed().as_millis() as u64),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn view(&self) -> SessionState {
        self.state.view()
    }

    /// Whether the view changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    /// Loads the configured start page, if any.
    pub fn load_start_page(&mut self) {
        if let Some(url) = self.start_url.clone() {
            self.surface.load(&url);
        }
    }

    pub fn on_navigation_request(&mut self, url: &Url) -> NavigationPolicy {
        let decision = self.classifier.classify_request(url);
        let policy = decision.policy();
        self.dispatch(Msg::NavigationDecided {
            stage: NavigationStage::Request,
            decision,
        });
        policy
    }

    /// A navigation already handed off at request time is never classified
    /// again.
    pub fn on_navigation_response(
        &mut self,
        url: &Url,
        content_type: Option<&str>,
        content_disposition: Option<&str>,
    ) -> NavigationPolicy {
        if self.state.prior_handoff(url).is_some() {
            shell_debug!("Response for handed-off {} cancelled", log_url(url.as_str()));
            return NavigationPolicy::Cancel;
        }
        let decision = self
            .classifier
            .classify_response(url, content_type, content_disposition);
        let policy = decision.policy();
        self.dispatch(Msg::NavigationDecided {
            stage: NavigationStage::Response,
            decision,
        });
        policy
    }

    pub fn on_start(&mut self) {
        let msg = Msg::NavigationStarted {
            location: self.surface.current_url(),
            can_go_back: self.surface.can_go_back(),
            can_go_forward: self.surface.can_go_forward(),
        };
        self.dispatch(msg);
    }

    pub fn on_finish(&mut self) {
        let msg = Msg::NavigationFinished {
            location: self.surface.current_url(),
            can_go_back: self.surface.can_go_back(),
            can_go_forward: self.surface.can_go_forward(),
        };
        self.dispatch(msg);
    }

    pub fn on_fail(&mut self, reason: impl Into<String>) {
        self.dispatch(Msg::NavigationFailed {
            reason: reason.into(),
        });
    }

    pub fn on_scroll(&mut self, offset_y: f64) {
        let at_ms = (self.clock)();
        self.dispatch(Msg::Scrolled(ScrollSample { offset_y, at_ms }));
    }

    /// A file input asked for files. `completion` runs exactly once, on the
    /// owner thread.
    pub fn on_upload_triggered<F>(&mut self, accept: &str, allow_multiple: bool, completion: F)
    where
        F: FnOnce(Option<Vec<PathBuf>>) + 'static,
    {
        self.trigger_upload(
            accept,
            allow_multiple,
            PendingCompletion::Callback(Box::new(completion)),
        );
    }

    /// Handles a message posted by injected page script. Returns whether the
    /// message was meant for this shell.
    pub fn on_script_message(&mut self, handler: &str, body: &str) -> bool {
        if handler != FILE_PICKER_HANDLER {
            return false;
        }
        match parse_file_picker_message(body) {
            Ok(message) => {
                self.trigger_upload(
                    &message.accept,
                    message.multiple,
                    PendingCompletion::ScriptBridge,
                );
            }
            Err(err) => shell_warn!("Ignoring malformed file picker message: {}", err),
        }
        true
    }

    /// Pull-to-refresh. Ignored while a refresh is outstanding.
    pub fn refresh(&mut self) {
        self.dispatch(Msg::RefreshRequested);
    }

    pub fn go_back(&mut self) {
        self.surface.go_back();
    }

    pub fn go_forward(&mut self) {
        self.surface.go_forward();
    }

    pub fn reload(&mut self) {
        self.surface.reload();
    }

    /// Downloads whatever the surface currently shows.
    pub fn download_current(&mut self) {
        match self.state.current_location().cloned() {
            Some(url) => self.dispatch(Msg::DownloadRequested { url }),
            None => shell_debug!("Nothing loaded to download"),
        }
    }

    pub fn cancel_auth(&mut self) {
        if let Some(auth) = self.auth.as_mut() {
            auth.cancel();
        }
        self.drain_messages();
    }

    /// Applies everything that completed in the background since the last
    /// call, then any chrome transition that has come due.
    pub fn pump(&mut self) {
        while let Some(event) = self.engine.try_recv() {
            self.dispatch(engine_msg(event));
        }
        if let Some(auth) = self.auth.as_mut() {
            auth.drain_reports();
        }
        self.drain_messages();
        let now_ms = (self.clock)();
        self.dispatch(Msg::Tick { now_ms });
    }

    fn trigger_upload(&mut self, accept: &str, allow_multiple: bool, completion: PendingCompletion) {
        self.next_upload_id += 1;
        let request_id = self.next_upload_id;
        self.uploads.insert(request_id, completion);
        self.dispatch(Msg::UploadTriggered {
            request_id,
            accept: accept.to_string(),
            allow_multiple,
        });
    }

    fn dispatch(&mut self, msg: Msg) {
        self.apply(msg);
        self.drain_messages();
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.apply(msg);
        }
    }

    fn apply(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::PresentPreview { target } => self.host.present_preview(&target),
            Effect::BeginAuth {
                url,
                callback_scheme,
            } => self.begin_auth(url, &callback_scheme),
            Effect::Load { url } => self.surface.load(&url),
            Effect::Reload => self.surface.reload(),
            Effect::StartDownload { download_id, url } => {
                if !self.engine.download(download_id, url.as_str()) {
                    let _ = self.msg_tx.send(Msg::DownloadFinished {
                        download_id,
                        outcome: DownloadOutcome::Failed {
                            reason: "background engine is not running".to_string(),
                        },
                    });
                }
            }
            Effect::PresentExport { path } => self.host.present_export(&path),
            Effect::CollectFiles {
                request_id,
                allow_multiple,
            } => {
                if !self.engine.collect_files(request_id, allow_multiple) {
                    let _ = self
                        .msg_tx
                        .send(Msg::FilesCollected {
                            request_id,
                            files: None,
                        });
                }
            }
            Effect::CompleteUpload { request_id, files } => self.complete_upload(request_id, files),
        }
    }

    fn begin_auth(&mut self, url: Url, callback_scheme: &str) {
        let Some(auth) = self.auth.as_mut() else {
            shell_info!("No sign-in browser; opening {} externally", log_url(url.as_str()));
            self.host.open_external(&url);
            return;
        };
        let msg_tx = self.msg_tx.clone();
        auth.start(url, callback_scheme, move |result| {
            let _ = msg_tx.send(Msg::AuthFinished {
                outcome: auth_outcome(result),
            });
        });
    }

    fn complete_upload(&mut self, request_id: UploadId, files: Option<Vec<PathBuf>>) {
        match self.uploads.remove(&request_id) {
            Some(PendingCompletion::Callback(completion)) => completion(files),
            Some(PendingCompletion::ScriptBridge) => {
                if let Some(files) = files {
                    self.surface.evaluate_script(&selected_files_script(&files));
                }
            }
            None => shell_warn!("No pending upload {}", request_id),
        }
    }
}

fn engine_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress(progress) => Msg::DownloadProgressed {
            download_id: progress.download_id,
            written: progress.written,
            expected: progress.expected,
        },
        EngineEvent::DownloadCompleted {
            download_id,
            result,
        } => Msg::DownloadFinished {
            download_id,
            outcome: match result {
                Ok(path) => DownloadOutcome::Saved(path),
                Err(err) => DownloadOutcome::Failed {
                    reason: err.to_string(),
                },
            },
        },
        EngineEvent::FilesCollected { request_id, files } => {
            Msg::FilesCollected { request_id, files }
        }
    }
}

fn auth_outcome(result: AuthResult) -> AuthOutcome {
    match result {
        Ok(url) => AuthOutcome::Redirect(url),
        Err(AuthError::SessionAlreadyActive) => AuthOutcome::Superseded,
        Err(AuthError::Cancelled) => AuthOutcome::Cancelled,
        Err(err) => AuthOutcome::Failed {
            reason: err.to_string(),
        },
    }
}
