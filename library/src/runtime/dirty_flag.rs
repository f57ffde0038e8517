//! Per-slot invalidation state.

use serde::{Deserialize, Serialize};

/// How a slot's cache reacts to time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DirtyFlagTrigger {
    /// Pure cache: dirty only through explicit or propagated invalidation
    #[default]
    None,
    /// Always recompute (declared by the operator or the user)
    Always,
    /// Always recompute because the value is driven by time (animation curves, clocks)
    Animated,
}

#[derive(Debug, Clone)]
pub struct DirtyFlag {
    dirty: bool,
    trigger: DirtyFlagTrigger,
    /// Frame id of the last successful recompute
    frame_stamp: Option<u64>,
    /// Last recompute read a time-varying source
    time_varying: bool,
    invalidation_count: u64,
}

impl Default for DirtyFlag {
    fn default() -> Self {
        Self::new(DirtyFlagTrigger::None)
    }
}

impl DirtyFlag {
    /// New flags start dirty.
    pub fn new(trigger: DirtyFlagTrigger) -> Self {
        Self {
            dirty: true,
            trigger,
            frame_stamp: None,
            time_varying: false,
            invalidation_count: 0,
        }
    }

    pub fn trigger(&self) -> DirtyFlagTrigger {
        self.trigger
    }

    pub fn set_trigger(&mut self, trigger: DirtyFlagTrigger) {
        self.trigger = trigger;
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
        self.invalidation_count += 1;
    }

    pub fn invalidation_count(&self) -> u64 {
        self.invalidation_count
    }

    /// Mark clean for `frame_id`. `time_varying` records whether the recompute read
    /// a source that changes with time.
    pub fn clear(&mut self, frame_id: u64, time_varying: bool) {
        self.dirty = false;
        self.frame_stamp = Some(frame_id);
        self.time_varying = time_varying;
    }

    /// Dirty regardless of frame. `Always` and `Animated` never report clean.
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.trigger != DirtyFlagTrigger::None
    }

    /// Whether a pull during `frame_id` has to recompute.
    pub fn needs_update(&self, frame_id: u64) -> bool {
        self.is_dirty() || (self.time_varying && self.frame_stamp != Some(frame_id))
    }

    /// Whether consumers of this slot must treat their own result as time-varying.
    pub fn is_time_varying(&self) -> bool {
        self.trigger != DirtyFlagTrigger::None || self.time_varying
    }

    pub fn frame_stamp(&self) -> Option<u64> {
        self.frame_stamp
    }
}
