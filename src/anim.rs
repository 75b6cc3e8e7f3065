use crate::{
    anim_interp::Interp,
    error::{ScholarError, ScholarResult},
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub time: f64, // seconds from animation start
    pub value: f64,
    #[serde(default)]
    pub interp: Interp, // applied on the segment ending at this key
}

impl Keyframe {
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time,
            value,
            interp: Interp::Smooth,
        }
    }

    pub fn with_interp(time: f64, value: f64, interp: Interp) -> Self {
        Self {
            time,
            value,
            interp,
        }
    }
}

/// Result of looking a track up at some elapsed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub prev: Keyframe,
    pub prev_index: usize,
}

/// One animated scalar over time.
///
/// Keys are expected in ascending `time` order. Nothing here re-sorts them;
/// [`KeyframeBuilder`](crate::anim_builder::KeyframeBuilder) always produces a
/// monotonic sequence and [`Track::validate`] can check hand-written ones.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Track {
    keys: Vec<Keyframe>,
}

impl Track {
    pub fn new(keys: Vec<Keyframe>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Time of the final key, or `None` for an empty track.
    pub fn last_time(&self) -> Option<f64> {
        self.keys.last().map(|k| k.time)
    }

    pub fn validate(&self) -> ScholarResult<()> {
        if let Some((i, _)) = self
            .keys
            .iter()
            .enumerate()
            .find(|(_, k)| !k.time.is_finite() || !k.value.is_finite())
        {
            return Err(ScholarError::track(format!(
                "keyframe {i} has a non-finite time or value"
            )));
        }
        if self.keys.first().is_some_and(|k| k.time < 0.0) {
            return Err(ScholarError::track("keyframe times must be >= 0"));
        }
        if !self.keys.windows(2).all(|w| w[0].time <= w[1].time) {
            return Err(ScholarError::track(
                "keyframes must be sorted by time",
            ));
        }
        Ok(())
    }

    /// Index of the key with the greatest `time` not exceeding `elapsed`.
    ///
    /// `None` when the track is empty or `elapsed` precedes the first key.
    pub fn prev_key_index(&self, elapsed: f64) -> Option<usize> {
        let idx = self.keys.partition_point(|k| k.time <= elapsed);
        idx.checked_sub(1)
    }

    pub fn sample(&self, elapsed: f64) -> Option<Sample> {
        let prev_index = self.prev_key_index(elapsed)?;
        let prev = self.keys[prev_index];

        let Some(next) = self.keys.get(prev_index + 1) else {
            return Some(Sample {
                value: prev.value,
                prev,
                prev_index,
            });
        };

        let span = next.time - prev.time;
        let value = if span > 0.0 {
            let progress = (elapsed - prev.time) / span;
            next.interp.apply(prev.value, next.value, progress)
        } else {
            // coincident keys: jump straight to the later one
            next.value
        };

        Some(Sample {
            value,
            prev,
            prev_index,
        })
    }

    pub fn value_at(&self, elapsed: f64) -> Option<f64> {
        self.sample(elapsed).map(|s| s.value)
    }
}

impl From<Vec<Keyframe>> for Track {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}
