//! Rolling detection rate

/// Counts completed cycles per observed wall-clock window of at least 1000ms
#[derive(Debug, Clone)]
pub struct FpsMeter {
    window_start_ms: Option<u64>,
    count: u32,
    fps: u32,
}

const WINDOW_MS: u64 = 1000;

impl FpsMeter {
    pub fn new() -> Self {
        Self {
            window_start_ms: None,
            count: 0,
            fps: 0,
        }
    }

    /// Record a completed cycle; returns the updated estimate when a window closes.
    /// Without a prior [`restart`](Self::restart) the first call only opens the window.
    pub fn record(&mut self, now_ms: u64) -> Option<u32> {
        let Some(start) = self.window_start_ms else {
            self.window_start_ms = Some(now_ms);
            return None;
        };
        self.count += 1;
        if now_ms.saturating_sub(start) >= WINDOW_MS {
            self.fps = self.count;
            self.count = 0;
            self.window_start_ms = Some(now_ms);
            return Some(self.fps);
        }
        None
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Open a new window at `now_ms`; the last estimate is kept
    pub fn restart(&mut self, now_ms: u64) {
        self.window_start_ms = Some(now_ms);
        self.count = 0;
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new()
    }
}
