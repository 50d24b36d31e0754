use webshell_core::{ChromeMode, ChromeSettings, ChromeVisibility, ScrollSample};

fn sample(offset_y: f64, at_ms: u64) -> ScrollSample {
    ScrollSample { offset_y, at_ms }
}

fn settings() -> ChromeSettings {
    ChromeSettings {
        threshold: 6.0,
        debounce_ms: 50,
    }
}

/// Controller whose baseline is the top of the page.
fn controller() -> ChromeVisibility {
    let mut chrome = ChromeVisibility::new(settings());
    chrome.observe(sample(0.0, 0));
    chrome
}

#[test]
fn first_sample_only_sets_the_baseline() {
    let mut chrome = ChromeVisibility::new(settings());
    chrome.observe(sample(800.0, 0));
    assert!(!chrome.has_pending());
    assert!(!chrome.tick(1_000));
    assert_eq!(chrome.mode(), ChromeMode::Visible);

    chrome.observe(sample(820.0, 1_000));
    assert!(chrome.tick(1_050));
    assert!(chrome.is_hidden());
}

#[test]
fn delta_equal_to_threshold_is_ignored() {
    let mut chrome = controller();
    chrome.observe(sample(6.0, 0));
    assert!(!chrome.has_pending());
    assert!(!chrome.tick(1_000));
    assert_eq!(chrome.mode(), ChromeMode::Visible);
}

#[test]
fn scrolling_down_hides_after_debounce() {
    let mut chrome = controller();
    chrome.observe(sample(6.5, 100));
    assert!(chrome.has_pending());

    assert!(!chrome.tick(149));
    assert!(!chrome.is_hidden());

    assert!(chrome.tick(150));
    assert!(chrome.is_hidden());
    assert!(!chrome.has_pending());
}

#[test]
fn reversal_within_debounce_window_replaces_pending_transition() {
    let mut chrome = controller();
    chrome.observe(sample(20.0, 0));
    chrome.observe(sample(10.0, 20));

    // The hide scheduled at t=0 would have been due at t=50.
    assert!(!chrome.tick(60));
    assert_eq!(chrome.mode(), ChromeMode::Visible);
    assert!(chrome.has_pending());

    assert!(!chrome.tick(70));
    assert_eq!(chrome.mode(), ChromeMode::Visible);
    assert!(!chrome.has_pending());
}

#[test]
fn scrolling_up_shows_hidden_chrome() {
    let mut chrome = controller();
    chrome.observe(sample(100.0, 0));
    chrome.tick(50);
    assert!(chrome.is_hidden());

    chrome.observe(sample(80.0, 200));
    assert!(chrome.tick(250));
    assert_eq!(chrome.mode(), ChromeMode::Visible);
}

#[test]
fn small_deltas_keep_pending_transition() {
    let mut chrome = controller();
    chrome.observe(sample(50.0, 0));
    chrome.observe(sample(52.0, 10));
    assert!(chrome.tick(50));
    assert!(chrome.is_hidden());
}

#[test]
fn offset_tracking_follows_every_sample() {
    let mut chrome = controller();
    // Each step is below the threshold, so nothing ever accumulates.
    for step in 1u32..=10 {
        chrome.observe(sample(f64::from(step) * 5.0, u64::from(step)));
    }
    assert!(!chrome.has_pending());
}
