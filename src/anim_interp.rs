/// Holds `start` for the whole segment and jumps to `end` once `t` reaches 1.
pub fn step(start: f64, end: f64, t: f64) -> f64 {
    if t < 1.0 { start } else { end }
}

pub fn linear(start: f64, end: f64, t: f64) -> f64 {
    start + t * (end - start)
}

/// Cubic ease-in/ease-out with zero slope at both ends.
pub fn smoothstep(start: f64, end: f64, t: f64) -> f64 {
    start + t * t * (3.0 - 2.0 * t) * (end - start)
}

/// Interpolation policy for the segment that ends at a keyframe.
///
/// `t` is never clamped: `Linear` and `Smooth` extrapolate outside `[0, 1]`,
/// `Step` saturates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interp {
    Step,
    Linear,
    #[default]
    Smooth,
}

impl Interp {
    pub fn apply(self, start: f64, end: f64, t: f64) -> f64 {
        match self {
            Self::Step => step(start, end, t),
            Self::Linear => linear(start, end, t),
            Self::Smooth => smoothstep(start, end, t),
        }
    }
}
