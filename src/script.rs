use std::{collections::BTreeSet, path::Path};

use anyhow::Context as _;

use crate::{
    anim::{Keyframe, Track},
    anim_builder::KeyframeBuilder,
    curve::{Animation, Curve, Sink, wrap_elapsed},
    driver::{DriverConfig, FramePolicy},
    error::{ScholarError, ScholarResult},
};

/// JSON description of an animation: named curves plus playback settings.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct AnimationScript {
    #[serde(default)]
    pub looping: bool,
    #[serde(default)]
    pub frame_policy: FramePolicy,
    pub curves: Vec<CurveScript>,
}

/// One curve, written either as builder ops or as raw keys.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct CurveScript {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ops: Vec<ScriptOp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<Keyframe>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptOp {
    StepTo { value: f64, duration: f64 },
    LerpTo { value: f64, duration: f64 },
    Wait { duration: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct NamedTrack {
    pub name: String,
    pub track: Track,
}

impl CurveScript {
    pub fn track(&self) -> Track {
        if !self.keys.is_empty() {
            return Track::new(self.keys.clone());
        }
        let mut builder = KeyframeBuilder::new();
        for op in &self.ops {
            match *op {
                ScriptOp::StepTo { value, duration } => builder.step_to_value(value, duration),
                ScriptOp::LerpTo { value, duration } => builder.lerp_to_value(value, duration),
                ScriptOp::Wait { duration } => builder.wait(duration),
            };
        }
        builder.build()
    }

    pub fn validate(&self) -> ScholarResult<()> {
        if self.name.trim().is_empty() {
            return Err(ScholarError::script("curve name must be non-empty"));
        }
        if !self.ops.is_empty() && !self.keys.is_empty() {
            return Err(ScholarError::curve(
                &self.name,
                "use either ops or keys, not both",
            ));
        }
        for op in &self.ops {
            let (value, duration) = match *op {
                ScriptOp::StepTo { value, duration } | ScriptOp::LerpTo { value, duration } => {
                    (value, duration)
                }
                ScriptOp::Wait { duration } => (0.0, duration),
            };
            if !value.is_finite() || !duration.is_finite() || duration < 0.0 {
                return Err(ScholarError::curve(
                    &self.name,
                    "op with a non-finite value or negative duration",
                ));
            }
        }
        self.track()
            .validate()
            .map_err(|e| e.in_curve(&self.name))
    }
}

impl AnimationScript {
    pub fn from_json_str(s: &str) -> ScholarResult<Self> {
        let script: Self = serde_json::from_str(s)?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> ScholarResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read animation script '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> ScholarResult<()> {
        let mut seen = BTreeSet::new();
        for curve in &self.curves {
            curve.validate()?;
            if !seen.insert(curve.name.as_str()) {
                return Err(ScholarError::script(format!(
                    "duplicate curve name '{}'",
                    curve.name
                )));
            }
        }
        Ok(())
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            frame_policy: self.frame_policy,
        }
    }

    /// Same value [`Animation::duration`] reports once the script is built.
    pub fn duration(&self) -> f64 {
        self.curves
            .iter()
            .filter_map(|c| c.track().last_time())
            .fold(0.0, f64::max)
    }

    /// Where playback sits `elapsed` seconds after the start; `None` once a
    /// one-shot script has ended.
    pub fn playback_time(&self, elapsed: f64) -> Option<f64> {
        wrap_elapsed(elapsed, self.duration(), self.looping)
    }

    pub fn tracks(&self) -> Vec<NamedTrack> {
        self.curves
            .iter()
            .map(|c| NamedTrack {
                name: c.name.clone(),
                track: c.track(),
            })
            .collect()
    }

    /// Builds a playable animation, asking `make_sink` for each curve's sink
    /// by curve name.
    pub fn into_animation<F>(self, mut make_sink: F) -> Animation
    where
        F: FnMut(&str) -> Sink,
    {
        let curves = self
            .curves
            .iter()
            .map(|c| Curve {
                track: c.track(),
                sink: make_sink(&c.name),
            })
            .collect();
        Animation {
            curves,
            looping: self.looping,
        }
    }
}
