use webshell_core::{
    HandoffKind, NavigationClassifier, NavigationDecision, NavigationPolicy, NavigationRules,
};
use url::Url;

fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

fn classifier() -> NavigationClassifier {
    NavigationClassifier::new(NavigationRules::default(), "org.example.shell.oauth")
}

fn kind(decision: NavigationDecision) -> Option<HandoffKind> {
    match decision {
        NavigationDecision::Allow => None,
        NavigationDecision::Handoff { kind, .. } => Some(kind),
    }
}

#[test]
fn pdf_request_is_previewed() {
    let target = url("https://site.example/doc.pdf");
    let decision = classifier().classify_request(&target);

    assert_eq!(
        decision,
        NavigationDecision::Handoff {
            kind: HandoffKind::Preview,
            target: target.clone(),
        }
    );
    assert_eq!(decision.policy(), NavigationPolicy::Cancel);
}

#[test]
fn preview_extension_wins_over_auth_heuristics() {
    let decision = classifier().classify_request(&url("https://accounts.google.com/terms.PDF"));
    assert_eq!(kind(decision), Some(HandoffKind::Preview));
}

#[test]
fn identity_provider_host_hands_off_with_callback_scheme() {
    let decision =
        classifier().classify_request(&url("https://accounts.google.com/o/signin?x=1"));
    assert_eq!(
        kind(decision),
        Some(HandoffKind::Auth {
            callback_scheme: "org.example.shell.oauth".to_string()
        })
    );
}

#[test]
fn oauth_marker_and_keyword_pairs_are_auth() {
    let classifier = classifier();
    assert!(matches!(
        kind(classifier.classify_request(&url("https://idp.example/oauth2/authorize"))),
        Some(HandoffKind::Auth { .. })
    ));
    assert!(matches!(
        kind(classifier.classify_request(&url("https://portal.example/SignIn?provider=Google"))),
        Some(HandoffKind::Auth { .. })
    ));
    // One word of the pair is not enough.
    assert_eq!(
        classifier.classify_request(&url("https://portal.example/signin")),
        NavigationDecision::Allow
    );
}

#[test]
fn lookalike_host_is_not_auth() {
    let decision = classifier().classify_request(&url("https://accounts.google.com.evil.test/"));
    assert_eq!(decision, NavigationDecision::Allow);
}

#[test]
fn plain_request_is_allowed() {
    let decision = classifier().classify_request(&url("https://site.example/index.html"));
    assert_eq!(decision, NavigationDecision::Allow);
    assert_eq!(decision.policy(), NavigationPolicy::Allow);
}

#[test]
fn attachment_disposition_forces_download() {
    let decision = classifier().classify_response(
        &url("https://site.example/get"),
        Some("text/html"),
        Some("attachment; filename=\"x.zip\""),
    );
    assert_eq!(kind(decision), Some(HandoffKind::Download));

    let decision = classifier().classify_response(
        &url("https://site.example/get"),
        None,
        Some("Attachment"),
    );
    assert_eq!(kind(decision), Some(HandoffKind::Download));
}

#[test]
fn inline_disposition_does_not_force_download() {
    let decision = classifier().classify_response(
        &url("https://site.example/page"),
        Some("text/html; charset=utf-8"),
        Some("inline; filename=\"attachment.html\""),
    );
    assert_eq!(decision, NavigationDecision::Allow);
}

#[test]
fn downloadable_mime_is_downloaded_and_pdf_mime_is_previewed() {
    let classifier = classifier();
    let zip = classifier.classify_response(
        &url("https://site.example/a"),
        Some("application/zip"),
        None,
    );
    assert_eq!(kind(zip), Some(HandoffKind::Download));

    let pdf = classifier.classify_response(
        &url("https://site.example/b"),
        Some("Application/PDF; charset=binary"),
        None,
    );
    assert_eq!(kind(pdf), Some(HandoffKind::Preview));

    let html = classifier.classify_response(
        &url("https://site.example/c"),
        Some("text/html"),
        None,
    );
    assert_eq!(html, NavigationDecision::Allow);
}

#[test]
fn custom_rules_replace_defaults() {
    let rules = NavigationRules {
        preview_extensions: vec!["docx".to_string()],
        downloadable_mimes: vec!["text/csv".to_string()],
        auth_hosts: vec!["login.example".to_string()],
        auth_path_markers: Vec::new(),
        auth_keyword_pairs: Vec::new(),
        ..NavigationRules::default()
    };
    let classifier = NavigationClassifier::new(rules, "x.oauth");

    assert_eq!(
        kind(classifier.classify_request(&url("https://site.example/report.docx"))),
        Some(HandoffKind::Preview)
    );
    assert_eq!(
        classifier.classify_request(&url("https://site.example/report.pdf")),
        NavigationDecision::Allow
    );
    assert!(matches!(
        kind(classifier.classify_request(&url("https://eu.login.example/"))),
        Some(HandoffKind::Auth { .. })
    ));
    assert_eq!(
        kind(classifier.classify_response(&url("https://site.example/d"), Some("text/csv"), None)),
        Some(HandoffKind::Download)
    );
}
