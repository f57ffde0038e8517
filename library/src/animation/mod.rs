//! Keyframed float curves for animated inputs.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Shape of the segment leaving a keyframe.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EasingFunction {
    #[default]
    Linear,
    /// Keep the keyframe value until the next keyframe
    Hold,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInExpo,
    EaseOutExpo,
    EaseOutBounce,
}

impl EasingFunction {
    /// Map normalized segment progress `t` in [0, 1] to eased progress.
    pub fn apply(&self, t: f64) -> f64 {
        use std::f64::consts::PI;
        match self {
            EasingFunction::Linear => t,
            EasingFunction::Hold => 0.0,
            EasingFunction::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            EasingFunction::EaseOutSine => (t * PI / 2.0).sin(),
            EasingFunction::EaseInOutSine => -(PI * t).cos() / 2.0 + 0.5,
            EasingFunction::EaseInQuad => t * t,
            EasingFunction::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasingFunction::EaseInCubic => t * t * t,
            EasingFunction::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            EasingFunction::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            EasingFunction::EaseInExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f64.powf(10.0 * t - 10.0)
                }
            }
            EasingFunction::EaseOutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f64.powf(-10.0 * t)
                }
            }
            EasingFunction::EaseOutBounce => Self::bounce_out(t),
        }
    }

    fn bounce_out(t: f64) -> f64 {
        let n1 = 7.5625;
        let d1 = 2.75;

        if t < 1.0 / d1 {
            n1 * t * t
        } else if t < 2.0 / d1 {
            let t = t - 1.5 / d1;
            n1 * t * t + 0.75
        } else if t < 2.5 / d1 {
            let t = t - 2.25 / d1;
            n1 * t * t + 0.9375
        } else {
            let t = t - 2.625 / d1;
            n1 * t * t + 0.984375
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Keyframe {
    pub time: OrderedFloat<f64>,
    pub value: OrderedFloat<f64>,
    #[serde(default)]
    pub easing: EasingFunction,
}

impl Keyframe {
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time: OrderedFloat(time),
            value: OrderedFloat(value),
            easing: EasingFunction::Linear,
        }
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }
}

/// Float curve over time. Keyframes are kept sorted by time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Curve {
    keyframes: Vec<Keyframe>,
}

impl Curve {
    pub fn new(mut keyframes: Vec<Keyframe>) -> Self {
        keyframes.sort_by_key(|k| k.time);
        Self { keyframes }
    }

    /// Insert a keyframe, replacing one at the same time.
    pub fn add_keyframe(&mut self, keyframe: Keyframe) {
        match self.keyframes.binary_search_by_key(&keyframe.time, |k| k.time) {
            Ok(index) => self.keyframes[index] = keyframe,
            Err(index) => self.keyframes.insert(index, keyframe),
        }
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Value at `time`; constant before the first and after the last keyframe.
    pub fn sample(&self, time: f64) -> f64 {
        let (first, last) = match (self.keyframes.first(), self.keyframes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if time.is_nan() || time <= *first.time {
            return *first.value;
        }
        if time >= *last.time {
            return *last.value;
        }

        // time lies strictly inside, so both neighbours exist
        let next_index = self.keyframes.partition_point(|k| *k.time <= time);
        let current = &self.keyframes[next_index - 1];
        let next = &self.keyframes[next_index];

        let duration = *next.time - *current.time;
        let t = if duration <= 1e-9 {
            0.0
        } else {
            (time - *current.time) / duration
        };
        let eased = current.easing.apply(t);
        *current.value + (*next.value - *current.value) * eased
    }
}
