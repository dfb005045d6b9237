//! Unsaved-change detection
//!
//! Surface events only mark the tracker as pending. The host calls
//! [`ChangeTracker::recompute`] when it is ready (e.g. once per frame); the
//! surface is re-encoded and compared with the last snapshot, so any number of
//! edits between two recomputes results in at most one notification.

use crate::drawable::{EditableSurface, SurfaceEvent, SurfaceListener};
use crate::json::{self, JsonError};

type ChangeCallback = Box<dyn FnMut()>;

/// Tracks whether the drawables differ from the last saved snapshot
#[derive(Default)]
pub struct ChangeTracker {
    snapshot: String,
    pending: bool,
    changed: bool,
    on_change: Option<ChangeCallback>,
}

impl ChangeTracker {
    /// Start tracking from the current state of `surface`
    pub fn new(surface: &dyn EditableSurface) -> Result<Self, JsonError> {
        Ok(Self { snapshot: json::encode(&surface.drawables())?, ..Self::default() })
    }

    /// Register the callback fired when a recompute detects a change
    pub fn on_change(&mut self, callback: impl FnMut() + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Re-encode `surface` and compare it with the last snapshot
    ///
    /// Returns whether this recompute found a difference.
    pub fn recompute(&mut self, surface: &dyn EditableSurface) -> Result<bool, JsonError> {
        self.pending = false;
        let current = json::encode(&surface.drawables())?;
        if current == self.snapshot {
            return Ok(false);
        }

        self.snapshot = current;
        self.changed = true;
        if let Some(callback) = self.on_change.as_mut() {
            callback();
        }
        Ok(true)
    }

    /// Forget pending changes, taking `surface` as the new baseline
    pub fn mark_saved(&mut self, surface: &dyn EditableSurface) -> Result<(), JsonError> {
        self.snapshot = json::encode(&surface.drawables())?;
        self.pending = false;
        self.changed = false;
        Ok(())
    }
}

impl SurfaceListener for ChangeTracker {
    fn on_event(&mut self, event: &SurfaceEvent) {
        log::debug!("surface event {:?}, change check pending", event);
        self.pending = true;
    }
}
