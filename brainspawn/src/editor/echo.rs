//! Drop watcher echoes of the editor's own saves.
//!
//! Saving rewrites the backing files, so the watcher reports the same change
//! again shortly afterwards. Pushing that echo to the editor would clobber
//! edits made in the meantime.

use std::time::{Duration, Instant};

use crate::store::ChangeReason;

pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct EchoSuppressor {
    window: Duration,
    last_save: Option<Instant>,
}

impl Default for EchoSuppressor {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_WINDOW)
    }
}

impl EchoSuppressor {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_save: None,
        }
    }

    /// Decide whether a reload with `reason` should reach the editor.
    pub fn should_forward(&mut self, reason: ChangeReason) -> bool {
        self.should_forward_at(reason, Instant::now())
    }

    pub fn should_forward_at(&mut self, reason: ChangeReason, now: Instant) -> bool {
        match reason {
            ChangeReason::Saved => {
                self.last_save = Some(now);
                true
            }
            ChangeReason::Initial => true,
            ChangeReason::ProjectFileChanged | ChangeReason::SettingsChanged => self
                .last_save
                .is_none_or(|saved| now.saturating_duration_since(saved) >= self.window),
        }
    }
}
