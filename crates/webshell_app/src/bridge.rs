//! Page-side hooks for file inputs the rendering surface cannot serve itself.

use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

/// Name of the script message handler the bootstrap script posts to.
pub const FILE_PICKER_HANDLER: &str = "webshellFilePicker";

/// Event dispatched on `window` with the selected file URLs as `detail`.
pub const SELECTED_FILES_EVENT: &str = "webshell:selectedFiles";

/// User script to inject at document end, in every frame.
///
/// Pins the viewport and reroutes clicks on `input[type=file]`, including
/// inputs added later, to the [`FILE_PICKER_HANDLER`] message handler.
pub const BOOTSTRAP_SCRIPT: &str = r#"(function() {
    var meta = document.querySelector('meta[name=viewport]');
    if (!meta) {
        meta = document.createElement('meta');
        meta.setAttribute('name', 'viewport');
        document.getElementsByTagName('head')[0].appendChild(meta);
    }
    meta.setAttribute('content', 'width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no');

    function attachFileInterceptors() {
        document.querySelectorAll('input[type=file]').forEach(function(el) {
            if (el._webshellHooked) return;
            el._webshellHooked = true;
            el.addEventListener('click', function(e) {
                try {
                    var info = { accept: el.accept || '', multiple: el.multiple || false, capture: el.capture || '' };
                    window.webkit.messageHandlers.webshellFilePicker.postMessage(info);
                    e.preventDefault();
                    e.stopPropagation();
                } catch (err) {}
            }, true);
        });
    }

    attachFileInterceptors();
    new MutationObserver(attachFileInterceptors)
        .observe(document.documentElement || document.body, { childList: true, subtree: true });
})();"#;

/// Body posted by the bootstrap script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilePickerMessage {
    pub accept: String,
    pub multiple: bool,
    pub capture: String,
}

pub fn parse_file_picker_message(body: &str) -> Result<FilePickerMessage, serde_json::Error> {
    serde_json::from_str(body)
}

/// Script that hands `files` back to the page as file URLs.
///
/// Relative paths have no file URL and are skipped.
pub fn selected_files_script(files: &[PathBuf]) -> String {
    let urls: Vec<String> = files
        .iter()
        .filter_map(|path| Url::from_file_path(path).ok())
        .map(String::from)
        .collect();
    let detail = serde_json::to_string(&urls).unwrap_or_else(|_| "[]".to_string());
    format!("window.dispatchEvent(new CustomEvent('{SELECTED_FILES_EVENT}', {{detail: {detail}}}));")
}
