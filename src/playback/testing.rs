//! Test doubles for the playback seams: a hand-cranked deadline timer and a
//! player that records seeks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::PlaybackError;
use crate::playback::{DeadlineTimer, FireCallback, PlaybackPort};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerEvent {
    Armed(Duration),
    Cancelled,
    Fired,
}

#[derive(Default)]
struct ManualTimerState {
    pending: Option<(Duration, FireCallback)>,
    history: Vec<TimerEvent>,
}

/// Never fires on its own; tests call [`ManualTimer::fire`].
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualTimerState>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the pending callback, if any. The callback runs outside the
    /// timer's own lock because it usually re-arms this timer.
    pub fn fire(&self) -> bool {
        match self.take_pending() {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Removes the pending callback as if the deadline had just been
    /// dispatched, without running it yet.
    pub fn take_pending(&self) -> Option<FireCallback> {
        let mut state = self.state.lock().unwrap();
        let (_, callback) = state.pending.take()?;
        state.history.push(TimerEvent::Fired);
        Some(callback)
    }

    pub fn pending_delay(&self) -> Option<Duration> {
        self.state.lock().unwrap().pending.as_ref().map(|(delay, _)| *delay)
    }

    pub fn history(&self) -> Vec<TimerEvent> {
        self.state.lock().unwrap().history.clone()
    }

    pub fn armed_delays(&self) -> Vec<Duration> {
        self.history()
            .into_iter()
            .filter_map(|event| match event {
                TimerEvent::Armed(delay) => Some(delay),
                _ => None,
            })
            .collect()
    }

    /// Highest number of deadlines outstanding at once, replayed from the
    /// history.
    pub fn max_outstanding(&self) -> usize {
        let mut outstanding: isize = 0;
        let mut max = 0;
        for event in self.history() {
            match event {
                TimerEvent::Armed(_) => outstanding += 1,
                TimerEvent::Cancelled | TimerEvent::Fired => outstanding -= 1,
            }
            max = max.max(outstanding);
        }
        max as usize
    }
}

impl DeadlineTimer for ManualTimer {
    fn arm(&mut self, delay: Duration, on_fire: FireCallback) {
        let mut state = self.state.lock().unwrap();
        if state.pending.take().is_some() {
            state.history.push(TimerEvent::Cancelled);
        }
        state.pending = Some((delay, on_fire));
        state.history.push(TimerEvent::Armed(delay));
    }

    fn cancel(&mut self) {
        let mut state = self.state.lock().unwrap();
        if state.pending.take().is_some() {
            state.history.push(TimerEvent::Cancelled);
        }
    }

    fn is_pending(&self) -> bool {
        self.state.lock().unwrap().pending.is_some()
    }
}

/// Records every seek. Can be told to fail, or to block inside `seek` until
/// released so a test can hold the coordinator's lock.
#[derive(Clone, Default)]
pub struct RecordingPort {
    seeks: Arc<Mutex<Vec<f64>>>,
    failures_left: Arc<AtomicUsize>,
    gate: Arc<Mutex<Option<SeekGate>>>,
}

struct SeekGate {
    entered: mpsc::Sender<f64>,
    release: mpsc::Receiver<()>,
}

impl RecordingPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// The next seek reports its offset on the first channel, then waits for
    /// a message on the second.
    pub fn hold_next_seek(&self) -> (mpsc::Receiver<f64>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(SeekGate {
            entered: entered_tx,
            release: release_rx,
        });
        (entered_rx, release_tx)
    }
}

impl PlaybackPort for RecordingPort {
    fn seek(&mut self, offset_secs: f64) -> Result<(), PlaybackError> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.entered.send(offset_secs);
            let _ = gate.release.recv();
        }

        let failures = self.failures_left.load(Ordering::SeqCst);
        if failures > 0 {
            self.failures_left.store(failures - 1, Ordering::SeqCst);
            return Err(PlaybackError::Rejected("injected failure".to_string()));
        }

        self.seeks.lock().unwrap().push(offset_secs);
        Ok(())
    }
}
