//! Webshell core: pure navigation-policy state machine and view model.
mod chrome;
mod classify;
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use chrome::{ChromeMode, ChromeSettings, ChromeVisibility, ScrollSample};
pub use classify::{
    callback_scheme, HandoffKind, NavigationClassifier, NavigationDecision, NavigationPolicy,
    NavigationRules, NavigationStage, DEFAULT_CALLBACK_SCHEME,
};
pub use effect::Effect;
pub use msg::{AuthOutcome, DownloadOutcome, Msg};
pub use state::{ActiveDownload, DownloadId, ShellState, UploadId, TRANSFER_PROGRESS_CEILING};
pub use update::update;
pub use view_model::SessionState;
