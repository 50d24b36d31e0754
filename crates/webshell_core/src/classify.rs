use serde::{Deserialize, Serialize};
use url::Url;

/// Callback scheme used when the embedding application has no identity.
pub const DEFAULT_CALLBACK_SCHEME: &str = "webshell-oauth";

/// Tables the classifier matches navigations against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationRules {
    /// Path extensions (without the dot) opened in the document previewer.
    pub preview_extensions: Vec<String>,
    /// Declared content type that maps to the previewer instead of a download.
    pub preview_mime: String,
    /// Declared content types that are intercepted instead of rendered.
    pub downloadable_mimes: Vec<String>,
    /// Identity-provider hosts; subdomains match as well.
    pub auth_hosts: Vec<String>,
    /// Path fragments that mark an OAuth flow.
    pub auth_path_markers: Vec<String>,
    /// Word groups that all have to appear in the lower-cased URL.
    pub auth_keyword_pairs: Vec<Vec<String>>,
}

impl Default for NavigationRules {
    fn default() -> Self {
        Self {
            preview_extensions: vec!["pdf".to_string()],
            preview_mime: "application/pdf".to_string(),
            downloadable_mimes: [
                "application/pdf",
                "application/zip",
                "application/octet-stream",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "application/vnd.ms-excel",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "image/png",
                "image/jpeg",
            ]
            .iter()
            .map(|mime| mime.to_string())
            .collect(),
            auth_hosts: vec!["accounts.google.com".to_string()],
            auth_path_markers: vec!["/oauth2/".to_string()],
            auth_keyword_pairs: vec![vec!["signin".to_string(), "google".to_string()]],
        }
    }
}

/// Derives the auth callback scheme from the embedding application's identity.
pub fn callback_scheme(app_identity: Option<&str>) -> String {
    match app_identity.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("{id}.oauth"),
        None => DEFAULT_CALLBACK_SCHEME.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffKind {
    Auth { callback_scheme: String },
    Preview,
    Download,
}

/// Outcome of classifying one navigation request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Handoff { kind: HandoffKind, target: Url },
}

impl NavigationDecision {
    fn handoff(kind: HandoffKind, target: &Url) -> Self {
        Self::Handoff {
            kind,
            target: target.clone(),
        }
    }

    pub fn policy(&self) -> NavigationPolicy {
        match self {
            Self::Allow => NavigationPolicy::Allow,
            Self::Handoff { .. } => NavigationPolicy::Cancel,
        }
    }

    pub fn is_handoff(&self) -> bool {
        matches!(self, Self::Handoff { .. })
    }
}

/// What the rendering surface is told to do with the navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPolicy {
    Allow,
    Cancel,
}

/// Which interception point a decision was made at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationStage {
    Request,
    Response,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationClassifier {
    rules: NavigationRules,
    callback_scheme: String,
}

impl Default for NavigationClassifier {
    fn default() -> Self {
        Self::new(NavigationRules::default(), DEFAULT_CALLBACK_SCHEME)
    }
}

impl NavigationClassifier {
    pub fn new(rules: NavigationRules, callback_scheme: impl Into<String>) -> Self {
        Self {
            rules,
            callback_scheme: callback_scheme.into(),
        }
    }

    pub fn rules(&self) -> &NavigationRules {
        &self.rules
    }

    /// Classifies a navigation before anything has been fetched.
    ///
    /// Preview detection runs first so that a later response can never turn
    /// a previewable document into something else.
    pub fn classify_request(&self, url: &Url) -> NavigationDecision {
        if self.is_preview_path(url) {
            return NavigationDecision::handoff(HandoffKind::Preview, url);
        }
        if self.is_auth_url(url) {
            return NavigationDecision::handoff(
                HandoffKind::Auth {
                    callback_scheme: self.callback_scheme.clone(),
                },
                url,
            );
        }
        NavigationDecision::Allow
    }

    /// Classifies a navigation once its response headers are known.
    pub fn classify_response(
        &self,
        url: &Url,
        content_type: Option<&str>,
        content_disposition: Option<&str>,
    ) -> NavigationDecision {
        if content_disposition.is_some_and(is_attachment) {
            return NavigationDecision::handoff(HandoffKind::Download, url);
        }
        if let Some(mime) = content_type.map(mime_essence) {
            let downloadable = self
                .rules
                .downloadable_mimes
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(&mime));
            if downloadable {
                let kind = if mime.eq_ignore_ascii_case(&self.rules.preview_mime) {
                    HandoffKind::Preview
                } else {
                    HandoffKind::Download
                };
                return NavigationDecision::handoff(kind, url);
            }
        }
        NavigationDecision::Allow
    }

    fn is_preview_path(&self, url: &Url) -> bool {
        path_extension(url).is_some_and(|ext| {
            self.rules
                .preview_extensions
                .iter()
                .any(|preview| preview.eq_ignore_ascii_case(&ext))
        })
    }

    fn is_auth_url(&self, url: &Url) -> bool {
        if let Some(host) = url.host_str() {
            let host = host.to_ascii_lowercase();
            let known_host = self.rules.auth_hosts.iter().any(|known| {
                let known = known.to_ascii_lowercase();
                host == known || host.ends_with(&format!(".{known}"))
            });
            if known_host {
                return true;
            }
        }

        let path = url.path().to_ascii_lowercase();
        if self
            .rules
            .auth_path_markers
            .iter()
            .any(|marker| path.contains(&marker.to_ascii_lowercase()))
        {
            return true;
        }

        let absolute = url.as_str().to_ascii_lowercase();
        self.rules.auth_keyword_pairs.iter().any(|words| {
            !words.is_empty()
                && words
                    .iter()
                    .all(|word| absolute.contains(&word.to_ascii_lowercase()))
        })
    }
}

/// Lower-cased extension of the last path segment, if it has one.
fn path_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// `text/html; charset=utf-8` -> `text/html`
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

fn is_attachment(content_disposition: &str) -> bool {
    content_disposition
        .split(';')
        .next()
        .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("attachment"))
}
