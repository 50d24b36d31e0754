use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeSettings {
    /// Scroll deltas at or below this magnitude are treated as noise.
    pub threshold: f64,
    pub debounce_ms: u64,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            threshold: 6.0,
            debounce_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub offset_y: f64,
    pub at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChromeMode {
    #[default]
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTransition {
    target: ChromeMode,
    due_at_ms: u64,
}

/// Debounced show/hide state for the chrome around the rendering surface.
///
/// Only scroll samples drive it; load and refresh state never do.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChromeVisibility {
    settings: ChromeSettings,
    mode: ChromeMode,
    /// `None` until the first sample; a restored offset is not a scroll.
    last_offset_y: Option<f64>,
    pending: Option<PendingTransition>,
}

impl ChromeVisibility {
    pub fn new(settings: ChromeSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> ChromeMode {
        self.mode
    }

    pub fn is_hidden(&self) -> bool {
        self.mode == ChromeMode::Hidden
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feeds one scroll sample. A delta beyond the threshold replaces any
    /// pending transition with a new one due after the debounce delay.
    /// The first sample only sets the baseline.
    pub fn observe(&mut self, sample: ScrollSample) {
        let Some(previous) = self.last_offset_y.replace(sample.offset_y) else {
            return;
        };
        let dy = sample.offset_y - previous;

        let target = if dy > self.settings.threshold {
            ChromeMode::Hidden
        } else if dy < -self.settings.threshold {
            ChromeMode::Visible
        } else {
            return;
        };
        self.pending = Some(PendingTransition {
            target,
            due_at_ms: sample.at_ms.saturating_add(self.settings.debounce_ms),
        });
    }

    /// Applies the pending transition once it is due. Returns true when the
    /// visible mode changed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        match self.pending {
            Some(pending) if now_ms >= pending.due_at_ms => {
                self.pending = None;
                let changed = self.mode != pending.target;
                self.mode = pending.target;
                changed
            }
            _ => false,
        }
    }
}
