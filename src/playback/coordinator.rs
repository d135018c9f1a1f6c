// =============================================================================
// SWITCH COORDINATOR
// =============================================================================
//
// Trigger edges and deadline expiries both end up in `switch_to`. One mutex
// serializes them; whoever holds it seeks the player and re-arms the single
// fallback deadline.
//
// - The next fallback always targets the idle segment.
// - Its delay is the duration of the segment just entered, minus the
//   over-time margin, clamped at zero.
// - Every deadline has an id. A fallback only switches if its id is the one
//   currently armed, so a fire that lost the race against a trigger (or
//   against an earlier fire of the same deadline) does nothing.
//
// =============================================================================

use chrono::{DateTime, Local};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::core::{SegmentTable, SwitchError, IDLE_SEGMENT};
use crate::playback::{DeadlineTimer, PlaybackPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeadlineId(u64);

impl fmt::Display for DeadlineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchCause {
    ExplicitTrigger,
    /// Expiry of the deadline with this id.
    DeadlineFallback(DeadlineId),
}

impl fmt::Display for SwitchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchCause::ExplicitTrigger => write!(f, "trigger"),
            SwitchCause::DeadlineFallback(id) => write!(f, "deadline {}", id),
        }
    }
}

/// The one outstanding fallback deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedDeadline {
    pub id: DeadlineId,
    pub scheduled_at: Instant,
    /// Segment whose duration set the delay.
    pub for_segment: usize,
    /// Segment switched to on expiry.
    pub target_segment: usize,
    pub delay: Duration,
    /// `None` when the deadline lies past anything the clock can represent.
    pub fires_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwitchOutcome {
    Switched { segment: usize, next: ArmedDeadline },
    /// A fallback for a deadline that was cancelled, replaced or already used.
    StaleDeadline(DeadlineId),
    /// The coordinator has been shut down.
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwitchStats {
    pub explicit_switches: u64,
    pub fallback_switches: u64,
    pub stale_deadlines: u64,
    pub seek_failures: u64,
    pub current_segment: usize,
    pub last_switch_at: Option<DateTime<Local>>,
}

struct SwitchState<P, T> {
    port: P,
    timer: T,
    armed: Option<ArmedDeadline>,
    next_deadline: u64,
    stopped: bool,
    stats: SwitchStats,
}

struct Shared<P, T> {
    segments: SegmentTable,
    over_time_margin: f64,
    state: Mutex<SwitchState<P, T>>,
}

/// Owns the player handle and the fallback deadline. Cheap to clone; clones
/// share the same state.
pub struct SwitchCoordinator<P, T> {
    shared: Arc<Shared<P, T>>,
}

impl<P, T> Clone for SwitchCoordinator<P, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P, T> SwitchCoordinator<P, T>
where
    P: PlaybackPort + 'static,
    T: DeadlineTimer + 'static,
{
    /// Starts in the idle state with the first deadline armed for the idle
    /// segment. No seek is issued; the player is expected to start at the top
    /// of the file.
    pub fn start(segments: SegmentTable, over_time_margin: f64, port: P, timer: T) -> Self {
        let coordinator = Self {
            shared: Arc::new(Shared {
                segments,
                over_time_margin,
                state: Mutex::new(SwitchState {
                    port,
                    timer,
                    armed: None,
                    next_deadline: 0,
                    stopped: false,
                    stats: SwitchStats::default(),
                }),
            }),
        };

        {
            let mut state = coordinator.lock_state();
            let deadline = coordinator.arm_fallback(&mut state, IDLE_SEGMENT);
            log::info!(
                "Looper started on segment {}, fallback {} in {:.2}s",
                IDLE_SEGMENT,
                deadline.id,
                deadline.delay.as_secs_f64()
            );
        }

        coordinator
    }

    pub fn switch_to(&self, segment: usize, cause: SwitchCause) -> Result<SwitchOutcome, SwitchError> {
        let mut state = self.lock_state();

        if state.stopped {
            log::debug!("Ignoring switch to segment {} ({}): coordinator stopped", segment, cause);
            return Ok(SwitchOutcome::Stopped);
        }

        let offset = self.shared.segments.offset(segment).ok_or(SwitchError::UnknownSegment {
            index: segment,
            count: self.shared.segments.len(),
        })?;

        match cause {
            SwitchCause::ExplicitTrigger => {
                state.timer.cancel();
                state.armed = None;
                state.stats.explicit_switches += 1;
            }
            SwitchCause::DeadlineFallback(id) => {
                if state.armed.map(|armed| armed.id) != Some(id) {
                    state.stats.stale_deadlines += 1;
                    log::debug!("Deadline {} is no longer armed, ignoring", id);
                    return Ok(SwitchOutcome::StaleDeadline(id));
                }
                state.armed = None;
                state.stats.fallback_switches += 1;
            }
        }

        // The watchdog is re-armed before seeking so a failed seek cannot
        // leave the display stuck.
        let next = self.arm_fallback(&mut state, segment);
        state.stats.current_segment = segment;
        state.stats.last_switch_at = Some(Local::now());

        if let Err(e) = state.port.seek(offset) {
            state.stats.seek_failures += 1;
            log::error!("Seek to segment {} at {:.3}s failed ({}): {}", segment, offset, cause, e);
            return Err(e.into());
        }

        log::info!(
            "Switched to segment {} at {:.3}s ({}), fallback {} in {:.2}s",
            segment,
            offset,
            cause,
            next.id,
            next.delay.as_secs_f64()
        );
        Ok(SwitchOutcome::Switched { segment, next })
    }

    /// Cancels the pending deadline; every later switch is ignored.
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        if state.stopped {
            return;
        }
        state.stopped = true;
        state.timer.cancel();
        state.armed = None;
        log::info!("Switch coordinator stopped");
    }

    /// Watchdog delay after entering `segment`.
    pub fn fallback_delay(&self, segment: usize) -> Duration {
        let duration = self.shared.segments.duration(segment).unwrap_or(0.0);
        // Footage longer than a Duration can hold just never times out
        Duration::try_from_secs_f64((duration - self.shared.over_time_margin).max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn armed(&self) -> Option<ArmedDeadline> {
        self.lock_state().armed
    }

    pub fn stats(&self) -> SwitchStats {
        self.lock_state().stats.clone()
    }

    fn arm_fallback(&self, state: &mut SwitchState<P, T>, segment: usize) -> ArmedDeadline {
        let id = DeadlineId(state.next_deadline);
        state.next_deadline += 1;

        let delay = self.fallback_delay(segment);
        let scheduled_at = Instant::now();
        let deadline = ArmedDeadline {
            id,
            scheduled_at,
            for_segment: segment,
            target_segment: IDLE_SEGMENT,
            delay,
            fires_at: scheduled_at.checked_add(delay),
        };

        let shared = Arc::downgrade(&self.shared);
        state.timer.arm(
            delay,
            Box::new(move || {
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                let coordinator = SwitchCoordinator { shared };
                if let Err(e) = coordinator.switch_to(IDLE_SEGMENT, SwitchCause::DeadlineFallback(id)) {
                    log::error!("Fallback to idle segment failed: {}", e);
                }
            }),
        );
        state.armed = Some(deadline);
        deadline
    }

    fn lock_state(&self) -> MutexGuard<'_, SwitchState<P, T>> {
        // A panic elsewhere must not take the watchdog down with it
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
