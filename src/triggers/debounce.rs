use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::triggers::TriggerId;

/// Drops repeat edges on the same line inside the bounce window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_accepted: HashMap<TriggerId, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: HashMap::new(),
        }
    }

    pub fn accept(&mut self, trigger: TriggerId, now: Instant) -> bool {
        if let Some(&last) = self.last_accepted.get(&trigger) {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted.insert(trigger, now);
        true
    }
}
