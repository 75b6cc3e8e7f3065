#![forbid(unsafe_code)]
//! Keyframe animation engine behind ScholarChart's interactive diagrams.
//!
//! Tracks are built with [`KeyframeBuilder`], paired with sinks into an
//! [`Animation`], and played by an [`AnimationDriver`] fed from a
//! [`FrameHost`] via [`run_animation`].

pub mod anim;
pub mod anim_builder;
pub mod anim_interp;
pub mod curve;
pub mod driver;
pub mod error;
pub mod frame;
pub mod script;

pub use anim::{Keyframe, Sample, Track};
pub use anim_builder::KeyframeBuilder;
pub use anim_interp::{Interp, linear, smoothstep, step};
pub use curve::{Animation, Curve, Sink};
pub use driver::{
    AnimationDriver, CancelToken, DriverConfig, DriverState, FrameOutcome, FramePolicy,
};
pub use error::{ScholarError, ScholarResult};
pub use frame::{AnimationHandle, FrameCallback, FrameHost, ManualFrameHost, run_animation};
pub use script::{AnimationScript, CurveScript, NamedTrack, ScriptOp};
