use std::fmt;

use crate::anim::Track;

/// Receives a curve's interpolated value, at most once per frame.
pub type Sink = Box<dyn FnMut(f64)>;

pub struct Curve {
    pub track: Track,
    pub sink: Sink,
}

impl Curve {
    pub fn new(track: Track, sink: impl FnMut(f64) + 'static) -> Self {
        Self {
            track,
            sink: Box::new(sink),
        }
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curve")
            .field("track", &self.track)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct Animation {
    pub curves: Vec<Curve>,
    pub looping: bool,
}

impl Animation {
    pub fn new(looping: bool) -> Self {
        Self {
            curves: Vec::new(),
            looping,
        }
    }

    pub fn curve(mut self, track: Track, sink: impl FnMut(f64) + 'static) -> Self {
        self.curves.push(Curve::new(track, sink));
        self
    }

    /// Latest final-key time over all non-empty tracks; `0` when there is none.
    pub fn duration(&self) -> f64 {
        self.curves
            .iter()
            .filter_map(|c| c.track.last_time())
            .fold(0.0, f64::max)
    }

    /// Maps raw elapsed seconds onto the animation's own timeline.
    ///
    /// Looping animations wrap modulo the duration (a zero duration pins time
    /// at `0`). Non-looping ones return `None` once `elapsed` reaches the
    /// duration, which is where playback ends.
    pub fn playback_time(&self, elapsed: f64) -> Option<f64> {
        wrap_elapsed(elapsed, self.duration(), self.looping)
    }
}

pub(crate) fn wrap_elapsed(elapsed: f64, duration: f64, looping: bool) -> Option<f64> {
    if looping {
        if duration > 0.0 {
            Some(elapsed.rem_euclid(duration))
        } else {
            Some(0.0)
        }
    } else if elapsed >= duration {
        None
    } else {
        Some(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::Keyframe;

    fn ending_at(time: f64) -> Track {
        Track::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(time, 1.0)])
    }

    #[test]
    fn duration_is_latest_last_key() {
        let anim = Animation::new(false)
            .curve(ending_at(4.0), |_| {})
            .curve(ending_at(7.0), |_| {})
            .curve(Track::default(), |_| {});
        assert_eq!(anim.duration(), 7.0);
    }

    #[test]
    fn empty_animation_has_zero_duration() {
        assert_eq!(Animation::new(true).duration(), 0.0);
        let only_empty = Animation::new(false).curve(Track::default(), |_| {});
        assert_eq!(only_empty.duration(), 0.0);
    }

    #[test]
    fn looping_wraps_elapsed() {
        let anim = Animation::new(true).curve(ending_at(5.0), |_| {});
        assert_eq!(anim.playback_time(12.0), Some(2.0));
        assert_eq!(anim.playback_time(5.0), Some(0.0));
        assert_eq!(anim.playback_time(-1.0), Some(4.0));
    }

    #[test]
    fn looping_zero_duration_pins_to_start() {
        let anim = Animation::new(true).curve(ending_at(0.0), |_| {});
        assert_eq!(anim.playback_time(3.5), Some(0.0));
    }

    #[test]
    fn non_looping_ends_at_duration() {
        let anim = Animation::new(false).curve(ending_at(5.0), |_| {});
        assert_eq!(anim.playback_time(4.999), Some(4.999));
        assert_eq!(anim.playback_time(5.0), None);
        assert_eq!(anim.playback_time(5.0001), None);
    }
}
