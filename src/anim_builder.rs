use crate::{
    anim::{Keyframe, Track},
    anim_interp::Interp,
};

/// Describes a track as a chronological script instead of raw timestamps.
///
/// The builder keeps a cursor (total scripted duration plus the last emitted
/// value). Every call appends at the cursor and moves it forward, so the
/// produced keys are always sorted.
///
/// ```
/// use scholarchart::KeyframeBuilder;
///
/// let track = KeyframeBuilder::new()
///     .lerp_to_value(5.0, 2.0)
///     .wait(3.0)
///     .lerp_to_value(8.0, 1.0)
///     .build();
/// let times: Vec<f64> = track.keys().iter().map(|k| k.time).collect();
/// assert_eq!(times, [2.0, 5.0, 6.0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct KeyframeBuilder {
    keys: Vec<Keyframe>,
    total_duration: f64,
    last_value: Option<f64>,
}

impl KeyframeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_to_value(&mut self, value: f64, duration: f64) -> &mut Self {
        self.push_after(value, duration, Interp::Step)
    }

    pub fn lerp_to_value(&mut self, value: f64, duration: f64) -> &mut Self {
        self.push_after(value, duration, Interp::Smooth)
    }

    /// Before the first key there is nothing to hold and only the cursor moves.
    pub fn wait(&mut self, duration: f64) -> &mut Self {
        self.total_duration += sanitize_duration(duration);
        if let Some(value) = self.last_value {
            self.keys.push(Keyframe::with_interp(
                self.total_duration,
                value,
                Interp::Step,
            ));
        }
        self
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn last_value(&self) -> Option<f64> {
        self.last_value
    }

    pub fn build(&self) -> Track {
        Track::new(self.keys.clone())
    }

    fn push_after(&mut self, value: f64, duration: f64, interp: Interp) -> &mut Self {
        self.total_duration += sanitize_duration(duration);
        self.keys
            .push(Keyframe::with_interp(self.total_duration, value, interp));
        self.last_value = Some(value);
        self
    }
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration >= 0.0 {
        duration
    } else {
        tracing::warn!(duration, "ignoring invalid keyframe duration");
        0.0
    }
}
