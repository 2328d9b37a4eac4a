//! Video source contract

use crate::{Clock, Frame};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A live video source
///
/// The detection loop treats "not ready" as "skip this cycle".
pub trait VideoSource: Send {
    /// Current frame dimensions (width, height)
    fn dimensions(&self) -> (u32, u32);

    /// Whether a frame can be grabbed right now
    fn is_ready(&self) -> bool;

    /// Grab the current frame, if one is available
    fn grab(&mut self) -> Option<Frame>;
}

/// Shared readiness flag, e.g. flipped by a capture device's frame-ready signal
#[derive(Debug, Clone)]
pub struct ReadyToggle(Arc<AtomicBool>);

impl ReadyToggle {
    pub fn new(ready: bool) -> Self {
        Self(Arc::new(AtomicBool::new(ready)))
    }

    pub fn set(&self, ready: bool) {
        self.0.store(ready, Ordering::SeqCst);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Synthetic source producing a moving gradient pattern
pub struct TestPatternSource {
    width: u32,
    height: u32,
    sequence: u64,
    last_captured_ms: Option<u64>,
    ready: ReadyToggle,
    clock: Arc<dyn Clock>,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32, clock: Arc<dyn Clock>) -> Self {
        debug!("Creating test pattern source {}x{}", width, height);
        Self {
            width,
            height,
            sequence: 0,
            last_captured_ms: None,
            ready: ReadyToggle::new(true),
            clock,
        }
    }

    /// Handle for toggling readiness from outside the loop
    pub fn ready_toggle(&self) -> ReadyToggle {
        self.ready.clone()
    }

    fn next_timestamp(&mut self) -> u64 {
        let now = self.clock.now_ms();
        let ts = match self.last_captured_ms {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last_captured_ms = Some(ts);
        ts
    }
}

impl VideoSource for TestPatternSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_ready(&self) -> bool {
        self.ready.get() && self.width > 0 && self.height > 0
    }

    fn grab(&mut self) -> Option<Frame> {
        if !self.is_ready() {
            return None;
        }

        let shift = (self.sequence % 256) as u32;
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                data.push(((x + shift) % 256) as u8);
                data.push((y % 256) as u8);
                data.push(((x + y) % 256) as u8);
            }
        }

        let captured_at_ms = self.next_timestamp();
        let sequence = self.sequence;
        self.sequence += 1;

        Frame::new(data, self.width, self.height, captured_at_ms, sequence).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    #[test]
    fn test_grab_respects_readiness() {
        let mut source = TestPatternSource::new(4, 3, Arc::new(ManualClock::new(0)));
        let toggle = source.ready_toggle();

        toggle.set(false);
        assert!(!source.is_ready());
        assert!(source.grab().is_none());

        toggle.set(true);
        let frame = source.grab().unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
        assert!(frame.is_well_formed());
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let clock = ManualClock::new(1000);
        let mut source = TestPatternSource::new(2, 2, Arc::new(clock.clone()));

        let a = source.grab().unwrap();
        let b = source.grab().unwrap();
        clock.advance(40);
        let c = source.grab().unwrap();

        assert!(a.captured_at_ms < b.captured_at_ms);
        assert_eq!(c.captured_at_ms, 1040);
        assert_eq!(c.sequence, 2);
    }
}
