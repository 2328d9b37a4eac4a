//! Cooldown windows keyed by channel and class

use std::collections::HashMap;

/// Last-fired timestamps per alert key (e.g. "person-tone", "car-speech")
///
/// Calls inside a key's window are dropped outright; only a call that fires
/// starts a new window. Keys are never evicted, the key space is bounded by
/// the class vocabulary times the channel count.
#[derive(Debug, Default)]
pub struct Throttle {
    last_fired: HashMap<String, u64>,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and records `now_ms` if `key` is outside its cooldown
    pub fn try_fire(&mut self, key: &str, cooldown_ms: u64, now_ms: u64) -> bool {
        if let Some(&last) = self.last_fired.get(key) {
            if now_ms.saturating_sub(last) < cooldown_ms {
                return false;
            }
        }
        self.last_fired.insert(key.to_string(), now_ms);
        true
    }

    pub fn last_fired(&self, key: &str) -> Option<u64> {
        self.last_fired.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.last_fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_fired.is_empty()
    }

    pub fn clear(&mut self) {
        self.last_fired.clear();
    }
}
