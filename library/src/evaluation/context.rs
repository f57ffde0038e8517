//! Evaluation context: the ambient parameters of one evaluation pass.

use crate::config::EngineConfig;

/// Time and frame information threaded through every pull of one pass.
///
/// Created fresh for each pass. Nested time shifts derive a new context with
/// [`EvaluationContext::with_time_offset`]; the frame id stays the same, so
/// caching within the pass is unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    time: f64,
    frame_id: u64,
    time_offsets: Vec<f64>,
}

impl EvaluationContext {
    pub fn new(time: f64, frame_id: u64) -> Self {
        Self {
            time,
            frame_id,
            time_offsets: Vec::new(),
        }
    }

    /// Context for frame `frame` of a sequence running at `fps`.
    pub fn for_frame(frame: u64, fps: f64) -> Self {
        let time = if fps > 0.0 { frame as f64 / fps } else { 0.0 };
        Self::new(time, frame)
    }

    pub fn from_config(config: &EngineConfig, frame: u64) -> Self {
        let mut ctx = Self::for_frame(frame, config.fps);
        ctx.time += config.start_time;
        ctx
    }

    /// Global evaluation time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Time after applying every offset pushed by enclosing time shifts.
    pub fn local_time(&self) -> f64 {
        self.time + self.time_offsets.iter().sum::<f64>()
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn time_offsets(&self) -> &[f64] {
        &self.time_offsets
    }

    pub fn with_time_offset(&self, offset: f64) -> Self {
        let mut ctx = self.clone();
        ctx.time_offsets.push(offset);
        ctx
    }

    /// Context for the following frame, `dt` seconds later.
    pub fn next_frame(&self, dt: f64) -> Self {
        Self {
            time: self.time + dt,
            frame_id: self.frame_id + 1,
            time_offsets: self.time_offsets.clone(),
        }
    }
}
