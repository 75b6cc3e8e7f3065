use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::curve::{Animation, wrap_elapsed};

/// How a frame treats curves that have no value yet (elapsed time precedes
/// their first key).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePolicy {
    #[default]
    AllOrNothing,
    Independent,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub frame_policy: FramePolicy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl DriverState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Stop,
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The run state (`start_timestamp_ms`) lives on the driver value itself, so
/// any number of drivers can be interleaved on the same host.
#[derive(Debug)]
pub struct AnimationDriver {
    animation: Animation,
    config: DriverConfig,
    duration: f64,
    state: DriverState,
    start_timestamp_ms: Option<f64>,
    last_elapsed: Option<f64>,
    frames_rendered: u64,
    cancel: CancelToken,
    scratch: Vec<Option<f64>>,
}

impl AnimationDriver {
    pub fn new(animation: Animation, config: DriverConfig) -> Self {
        let duration = animation.duration();
        let scratch = Vec::with_capacity(animation.curves.len());
        Self {
            animation,
            config,
            duration,
            state: DriverState::Idle,
            start_timestamp_ms: None,
            last_elapsed: None,
            frames_rendered: 0,
            cancel: CancelToken::new(),
            scratch,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn config(&self) -> DriverConfig {
        self.config
    }

    pub fn last_elapsed(&self) -> Option<f64> {
        self.last_elapsed
    }

    /// Frames in which sinks were actually invoked.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[tracing::instrument(skip(self), fields(curves = self.animation.curves.len()))]
    pub fn start(&mut self) -> FrameOutcome {
        match self.state {
            DriverState::Idle => {}
            DriverState::Running => return FrameOutcome::Continue,
            DriverState::Completed | DriverState::Cancelled => return FrameOutcome::Stop,
        }

        if self.animation.curves.is_empty() {
            tracing::debug!("no curves, completing immediately");
            self.state = DriverState::Completed;
            return FrameOutcome::Stop;
        }

        tracing::debug!(
            duration = self.duration,
            looping = self.animation.looping,
            "animation started"
        );
        self.state = DriverState::Running;
        FrameOutcome::Continue
    }

    pub fn frame(&mut self, timestamp_ms: f64) -> FrameOutcome {
        if self.state == DriverState::Idle && self.start() == FrameOutcome::Stop {
            return FrameOutcome::Stop;
        }
        if self.state != DriverState::Running {
            return FrameOutcome::Stop;
        }
        if self.cancel.is_cancelled() {
            tracing::debug!("animation cancelled");
            self.state = DriverState::Cancelled;
            return FrameOutcome::Stop;
        }

        let start = *self.start_timestamp_ms.get_or_insert(timestamp_ms);
        let raw = (timestamp_ms - start) / 1000.0;

        let Some(elapsed) = wrap_elapsed(raw, self.duration, self.animation.looping) else {
            tracing::debug!(elapsed = raw, "animation completed");
            self.state = DriverState::Completed;
            return FrameOutcome::Stop;
        };
        self.last_elapsed = Some(elapsed);

        if self.push_values(elapsed) {
            self.frames_rendered += 1;
        } else {
            tracing::trace!(elapsed, "frame skipped, a curve has no value yet");
        }
        FrameOutcome::Continue
    }

    fn push_values(&mut self, elapsed: f64) -> bool {
        self.scratch.clear();
        self.scratch.extend(
            self.animation
                .curves
                .iter()
                .map(|c| c.track.value_at(elapsed)),
        );

        if self.config.frame_policy == FramePolicy::AllOrNothing
            && self.scratch.iter().any(Option::is_none)
        {
            return false;
        }

        let mut pushed = false;
        for (curve, value) in self.animation.curves.iter_mut().zip(&self.scratch) {
            if let Some(value) = *value {
                (curve.sink)(value);
                pushed = true;
            }
        }
        pushed
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::anim::{Keyframe, Track};

    type Log = Rc<RefCell<Vec<f64>>>;

    fn recorder() -> (Log, impl FnMut(f64) + 'static) {
        let log: Log = Rc::default();
        let sink_log = Rc::clone(&log);
        (log, move |v| sink_log.borrow_mut().push(v))
    }

    fn ramp(points: &[(f64, f64)]) -> Track {
        Track::new(points.iter().map(|&(t, v)| Keyframe::new(t, v)).collect())
    }

    #[test]
    fn empty_animation_completes_on_start() {
        let mut driver = AnimationDriver::new(Animation::new(true), DriverConfig::default());
        assert_eq!(driver.start(), FrameOutcome::Stop);
        assert_eq!(driver.state(), DriverState::Completed);
        assert_eq!(driver.frame(16.0), FrameOutcome::Stop);
    }

    #[test]
    fn first_frame_starts_idle_driver() {
        let (log, sink) = recorder();
        let anim = Animation::new(false).curve(ramp(&[(0.0, 1.0), (1.0, 2.0)]), sink);
        let mut driver = AnimationDriver::new(anim, DriverConfig::default());
        assert_eq!(driver.state(), DriverState::Idle);

        assert_eq!(driver.frame(1000.0), FrameOutcome::Continue);
        assert_eq!(driver.state(), DriverState::Running);
        assert_eq!(*log.borrow(), [1.0]);
        assert_eq!(driver.last_elapsed(), Some(0.0));
    }

    #[test]
    fn elapsed_is_relative_to_first_timestamp() {
        let (log, sink) = recorder();
        let anim = Animation::new(false).curve(ramp(&[(0.0, 0.0), (4.0, 40.0)]), sink);
        let mut driver = AnimationDriver::new(anim, DriverConfig::default());

        driver.frame(5000.0);
        driver.frame(7000.0);
        assert_eq!(driver.last_elapsed(), Some(2.0));
        assert_eq!(*log.borrow(), [0.0, 20.0]);
    }

    #[test]
    fn looping_wraps_by_duration() {
        let (log, sink) = recorder();
        let anim = Animation::new(true).curve(ramp(&[(0.0, 0.0), (5.0, 50.0)]), sink);
        let mut driver = AnimationDriver::new(anim, DriverConfig::default());

        driver.frame(0.0);
        assert_eq!(driver.frame(12_000.0), FrameOutcome::Continue);
        assert_eq!(driver.last_elapsed(), Some(2.0));
        assert_eq!(driver.state(), DriverState::Running);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn looping_zero_duration_holds_first_key() {
        let (log, sink) = recorder();
        let anim = Animation::new(true).curve(ramp(&[(0.0, 3.0)]), sink);
        let mut driver = AnimationDriver::new(anim, DriverConfig::default());

        for ts in [0.0, 16.0, 5000.0] {
            assert_eq!(driver.frame(ts), FrameOutcome::Continue);
        }
        assert_eq!(*log.borrow(), [3.0, 3.0, 3.0]);
    }

    #[test]
    fn non_looping_stops_past_duration() {
        let (log, sink) = recorder();
        let anim = Animation::new(false).curve(ramp(&[(0.0, 0.0), (5.0, 50.0)]), sink);
        let mut driver = AnimationDriver::new(anim, DriverConfig::default());

        assert_eq!(driver.frame(0.0), FrameOutcome::Continue);
        assert_eq!(driver.frame(4999.9), FrameOutcome::Continue);
        assert_eq!(driver.frame(5000.1), FrameOutcome::Stop);
        assert_eq!(driver.state(), DriverState::Completed);
        assert_eq!(driver.frame(6000.0), FrameOutcome::Stop);

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert!((log[1] - 50.0).abs() < 1e-3, "last value {}", log[1]);
    }

    #[test]
    fn all_or_nothing_blocks_whole_frame() {
        let (early, early_sink) = recorder();
        let (late, late_sink) = recorder();
        let anim = Animation::new(false)
            .curve(ramp(&[(0.0, 1.0), (4.0, 1.0)]), early_sink)
            .curve(ramp(&[(2.0, 7.0), (4.0, 7.0)]), late_sink);
        let mut driver = AnimationDriver::new(anim, DriverConfig::default());

        driver.frame(0.0);
        driver.frame(1000.0);
        assert!(early.borrow().is_empty());
        assert_eq!(driver.frames_rendered(), 0);

        driver.frame(3000.0);
        assert_eq!(*early.borrow(), [1.0]);
        assert_eq!(*late.borrow(), [7.0]);
        assert_eq!(driver.frames_rendered(), 1);
    }

    #[test]
    fn independent_policy_pushes_available_curves() {
        let (early, early_sink) = recorder();
        let (late, late_sink) = recorder();
        let anim = Animation::new(false)
            .curve(ramp(&[(0.0, 1.0), (4.0, 1.0)]), early_sink)
            .curve(ramp(&[(2.0, 7.0), (4.0, 7.0)]), late_sink);
        let config = DriverConfig {
            frame_policy: FramePolicy::Independent,
        };
        let mut driver = AnimationDriver::new(anim, config);

        driver.frame(0.0);
        driver.frame(1000.0);
        assert_eq!(*early.borrow(), [1.0, 1.0]);
        assert!(late.borrow().is_empty());

        driver.frame(3000.0);
        assert_eq!(*late.borrow(), [7.0]);
    }

    #[test]
    fn sinks_run_in_curve_order() {
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let (a, b) = (Rc::clone(&order), Rc::clone(&order));
        let anim = Animation::new(false)
            .curve(ramp(&[(0.0, 0.0), (1.0, 0.0)]), move |_| a.borrow_mut().push("a"))
            .curve(ramp(&[(0.0, 0.0), (1.0, 0.0)]), move |_| b.borrow_mut().push("b"));
        let mut driver = AnimationDriver::new(anim, DriverConfig::default());
        driver.frame(0.0);
        driver.frame(100.0);
        assert_eq!(*order.borrow(), ["a", "b", "a", "b"]);
    }

    #[test]
    fn cancel_stops_before_sinks() {
        let (log, sink) = recorder();
        let anim = Animation::new(true).curve(ramp(&[(0.0, 0.0), (1.0, 1.0)]), sink);
        let mut driver = AnimationDriver::new(anim, DriverConfig::default());
        let token = driver.cancel_token();

        driver.frame(0.0);
        token.cancel();
        assert_eq!(driver.frame(16.0), FrameOutcome::Stop);
        assert_eq!(driver.state(), DriverState::Cancelled);
        assert!(driver.state().is_finished());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: DriverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.frame_policy, FramePolicy::AllOrNothing);
        let config: DriverConfig =
            serde_json::from_str(r#"{"frame_policy":"independent"}"#).unwrap();
        assert_eq!(config.frame_policy, FramePolicy::Independent);
    }
}
