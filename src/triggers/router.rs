use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{ConfigurationError, UnknownTriggerError};

/// Physical input line, numbered the way the board labels it (BCM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerId(pub u8);

impl TriggerId {
    /// TR1..TR8, in the order they are handed out to segments.
    pub const DEFAULT_LINES: [TriggerId; 8] = [
        TriggerId(17),
        TriggerId(27),
        TriggerId(22),
        TriggerId(10),
        TriggerId(6),
        TriggerId(13),
        TriggerId(19),
        TriggerId(26),
    ];
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerBinding {
    pub trigger: TriggerId,
    pub segment: usize,
}

/// Static trigger line -> segment mapping. Segment 0 never has a line.
#[derive(Debug, Clone)]
pub struct TriggerRouter {
    bindings: Vec<TriggerBinding>,
}

impl TriggerRouter {
    /// Binds the first `segment_count - 1` lines of `available` to segments
    /// `1..segment_count`, in order. Lines past that stay unbound.
    pub fn build(available: &[TriggerId], segment_count: usize) -> Result<Self, ConfigurationError> {
        if segment_count == 0 {
            return Err(ConfigurationError::EmptyDurations);
        }
        let needed = segment_count - 1;
        if needed > available.len() {
            return Err(ConfigurationError::TooManySegments {
                segments: segment_count,
                needed,
                available: available.len(),
            });
        }

        let mut bindings: Vec<TriggerBinding> = Vec::with_capacity(needed);
        for (i, &trigger) in available.iter().take(needed).enumerate() {
            if bindings.iter().any(|b| b.trigger == trigger) {
                return Err(ConfigurationError::DuplicateTrigger(trigger));
            }
            bindings.push(TriggerBinding {
                trigger,
                segment: i + 1,
            });
        }

        for unused in &available[needed..] {
            log::debug!("Trigger line {} left unconfigured", unused);
        }

        Ok(Self { bindings })
    }

    pub fn resolve(&self, trigger: TriggerId) -> Result<usize, UnknownTriggerError> {
        self.bindings
            .iter()
            .find(|b| b.trigger == trigger)
            .map(|b| b.segment)
            .ok_or(UnknownTriggerError(trigger))
    }

    pub fn bindings(&self) -> &[TriggerBinding] {
        &self.bindings
    }

    pub fn is_bound(&self, trigger: TriggerId) -> bool {
        self.resolve(trigger).is_ok()
    }
}
