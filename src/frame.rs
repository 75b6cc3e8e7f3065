use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    curve::Animation,
    driver::{AnimationDriver, CancelToken, DriverConfig, DriverState, FrameOutcome},
};

pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// `request_frame` must invoke the callback exactly once, after returning and
/// before the next repaint, with a monotonically increasing timestamp in
/// milliseconds.
pub trait FrameHost {
    fn request_frame(&self, callback: FrameCallback);
}

#[derive(Clone, Debug)]
pub struct AnimationHandle {
    driver: Rc<RefCell<AnimationDriver>>,
    rendered: Rc<Cell<u64>>,
    cancel: CancelToken,
}

impl AnimationHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The driver is only borrowed while a frame runs, so a sink asking about
    /// its own animation sees `Running`.
    pub fn state(&self) -> DriverState {
        self.driver
            .try_borrow()
            .map_or(DriverState::Running, |d| d.state())
    }

    /// Frames completed so far; a sink sees the count before its own frame.
    pub fn frames_rendered(&self) -> u64 {
        self.rendered.get()
    }
}

/// Starts `animation` on `host`, keeping exactly one frame request in flight
/// until the driver completes or is cancelled.
#[tracing::instrument(skip(host, animation), fields(curves = animation.curves.len()))]
pub fn run_animation<H>(host: Rc<H>, animation: Animation, config: DriverConfig) -> AnimationHandle
where
    H: FrameHost + ?Sized + 'static,
{
    let mut driver = AnimationDriver::new(animation, config);
    let cancel = driver.cancel_token();
    let outcome = driver.start();
    let driver = Rc::new(RefCell::new(driver));
    let rendered = Rc::new(Cell::new(0));

    if outcome == FrameOutcome::Continue {
        schedule(host, Rc::clone(&driver), Rc::clone(&rendered));
    }

    AnimationHandle {
        driver,
        rendered,
        cancel,
    }
}

fn schedule<H>(host: Rc<H>, driver: Rc<RefCell<AnimationDriver>>, rendered: Rc<Cell<u64>>)
where
    H: FrameHost + ?Sized + 'static,
{
    let next_host = Rc::clone(&host);
    host.request_frame(Box::new(move |timestamp_ms| {
        let (outcome, frames) = {
            let mut d = driver.borrow_mut();
            (d.frame(timestamp_ms), d.frames_rendered())
        };
        rendered.set(frames);
        if outcome == FrameOutcome::Continue {
            schedule(next_host, driver, rendered);
        }
    }));
}

/// Queue-backed host driven by explicit timestamps, standing in for a display.
#[derive(Default)]
pub struct ManualFrameHost {
    pending: RefCell<Vec<FrameCallback>>,
    now_ms: Cell<Option<f64>>,
}

impl ManualFrameHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn now_ms(&self) -> Option<f64> {
        self.now_ms.get()
    }

    /// Runs the callbacks queued before this call. Requests made while they
    /// run wait for the next `fire`.
    pub fn fire(&self, timestamp_ms: f64) -> usize {
        self.now_ms.set(Some(timestamp_ms));
        let batch = std::mem::take(&mut *self.pending.borrow_mut());
        let count = batch.len();
        for callback in batch {
            callback(timestamp_ms);
        }
        count
    }

    pub fn advance(&self, interval_ms: f64) -> usize {
        let next = self.now_ms.get().map_or(0.0, |now| now + interval_ms);
        self.fire(next)
    }

    /// Advances at a steady `fps` until nothing is pending or `max_frames`
    /// frames have been fired. The clock carries over between calls.
    pub fn run_at_fps(&self, fps: f64, max_frames: u64) -> u64 {
        let interval_ms = if fps > 0.0 { 1000.0 / fps } else { 0.0 };
        let mut fired = 0;
        while fired < max_frames && self.pending() > 0 {
            self.advance(interval_ms);
            fired += 1;
        }
        tracing::debug!(fired, pending = self.pending(), "simulated display stopped");
        fired
    }
}

impl FrameHost for ManualFrameHost {
    fn request_frame(&self, callback: FrameCallback) {
        self.pending.borrow_mut().push(callback);
    }
}
