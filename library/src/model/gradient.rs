//! Color gradient value sampled by gradient operators.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::value::Vec4;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Keep the color of the previous step
    Hold,
    /// Smoothstep between neighbouring steps
    Smooth,
}

impl Interpolation {
    /// Map an integer input to an interpolation mode (out-of-range falls back to linear).
    pub fn from_index(index: i64) -> Self {
        match index {
            1 => Interpolation::Hold,
            2 => Interpolation::Smooth,
            _ => Interpolation::Linear,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GradientStep {
    pub position: OrderedFloat<f64>,
    pub color: Vec4,
}

impl GradientStep {
    pub fn new(position: f64, color: Vec4) -> Self {
        Self {
            position: OrderedFloat(position),
            color,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Gradient {
    pub steps: Vec<GradientStep>,
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl Default for Gradient {
    /// Black to white.
    fn default() -> Self {
        Self {
            steps: vec![
                GradientStep::new(0.0, Vec4::new(0.0, 0.0, 0.0, 1.0)),
                GradientStep::new(1.0, Vec4::new(1.0, 1.0, 1.0, 1.0)),
            ],
            interpolation: Interpolation::Linear,
        }
    }
}

impl Gradient {
    pub fn new(steps: Vec<GradientStep>) -> Self {
        Self {
            steps,
            interpolation: Interpolation::Linear,
        }
    }

    /// Sample the gradient at `t`. Positions outside the step range clamp to the end colors.
    pub fn sample(&self, t: f64) -> Vec4 {
        let mut sorted: Vec<&GradientStep> = self.steps.iter().collect();
        sorted.sort_by(|a, b| a.position.cmp(&b.position));

        let (first, last) = match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Vec4::new(1.0, 1.0, 1.0, 1.0),
        };

        if t.is_nan() || t <= first.position.0 {
            return first.color;
        }
        if t >= last.position.0 {
            return last.color;
        }

        for pair in sorted.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t >= a.position.0 && t < b.position.0 {
                let span = b.position.0 - a.position.0;
                if span <= f64::EPSILON {
                    return b.color;
                }
                let f = (t - a.position.0) / span;
                return match self.interpolation {
                    Interpolation::Linear => a.color.lerp(&b.color, f),
                    Interpolation::Hold => a.color,
                    Interpolation::Smooth => a.color.lerp(&b.color, f * f * (3.0 - 2.0 * f)),
                };
            }
        }
        last.color
    }
}
