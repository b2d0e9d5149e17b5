//! State of the wallpaper rotation.
//!
//! Every time-dependent operation takes `now` explicitly, the caller decides what the clock says.

use std::collections::{BTreeSet, VecDeque};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::utils::CommandError;

/// Delay used when none is configured, in seconds.
pub const DEFAULT_DELAY: u64 = 180;
/// History capacity used when none is configured.
pub const DEFAULT_MAX_HISTORY: NonZeroUsize = NonZeroUsize::new(500).unwrap();

/// What the loop should do next.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Deadline {
    /// The rotation is due now.
    Overdue,
    /// Time left until the rotation is due.
    In(Duration),
}

pub struct RotationState {
    /// Start of the current pause.
    paused: Option<Instant>,
    /// When the wallpaper last changed. [`None`] forces a rotation at the next check.
    last_change: Option<Instant>,
    delay: u64,
    history: VecDeque<PathBuf>,
    max_history: NonZeroUsize,
    errors: BTreeSet<PathBuf>,
    running: bool,
}

impl Default for RotationState {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY, DEFAULT_MAX_HISTORY)
    }
}

impl RotationState {
    /// A fresh state, due for a rotation straight away.
    ///
    /// A `delay` of zero is raised to one second.
    pub fn new(delay: u64, max_history: NonZeroUsize) -> Self {
        Self {
            paused: None,
            last_change: None,
            delay: delay.max(1),
            history: VecDeque::new(),
            max_history,
            errors: BTreeSet::new(),
            running: true,
        }
    }

    /// Time until the next rotation.
    ///
    /// A paused state always reports the full delay so nothing fires until it is resumed.
    pub fn deadline(&self, now: Instant) -> Deadline {
        if self.paused.is_some() {
            return Deadline::In(self.delay());
        }
        let Some(last_change) = self.last_change else {
            return Deadline::Overdue;
        };
        // A delay past the end of the clock never fires.
        let Some(due) = last_change.checked_add(self.delay()) else {
            return Deadline::In(self.delay());
        };
        match due.checked_duration_since(now) {
            Some(remaining) if !remaining.is_zero() => Deadline::In(remaining),
            _ => Deadline::Overdue,
        }
    }

    /// Makes the next deadline check overdue.
    pub fn force_next(&mut self) {
        self.last_change = None;
    }

    /// Records a successfully applied image.
    pub fn record_success(&mut self, image: PathBuf, now: Instant) {
        self.history.push_back(image);
        while self.history.len() > self.max_history.get() {
            self.history.pop_front();
        }
        self.last_change = Some(now);
    }

    /// Records a rotation that found nothing to apply, so the next attempt waits a full delay.
    /// History is left alone.
    pub fn record_skip(&mut self, now: Instant) {
        self.last_change = Some(now);
    }

    /// Records an image the backend failed to apply.
    pub fn record_failure(&mut self, image: PathBuf) {
        self.errors.insert(image);
    }

    /// Starts a pause. Returns `false` if already paused, the original start is kept then.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.paused.is_some() {
            return false;
        }
        self.paused = Some(now);
        true
    }

    /// Ends a pause, pushing the last change forward by the time spent paused.
    /// Returns `false` if not paused.
    pub fn play(&mut self, now: Instant) -> bool {
        let Some(start) = self.paused.take() else {
            return false;
        };
        let paused_for = now.saturating_duration_since(start);
        self.last_change = self
            .last_change
            .map(|last| last.checked_add(paused_for).unwrap_or(last));
        true
    }

    pub fn is_paused(&self) -> bool {
        self.paused.is_some()
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    pub fn delay_secs(&self) -> u64 {
        self.delay
    }

    /// Sets the delay, in seconds.
    ///
    /// # Errors
    /// Zero is rejected and the current delay is kept.
    pub fn set_delay(&mut self, seconds: u64) -> Result<(), CommandError> {
        if seconds == 0 {
            return Err(CommandError::NonPositiveDelay(0));
        }
        self.delay = seconds;
        Ok(())
    }

    pub fn history(&self) -> &VecDeque<PathBuf> {
        &self.history
    }

    /// Looks up a history entry, negative indices count back from the most recent one.
    ///
    /// # Errors
    /// [`CommandError::IndexOutOfRange`] if there is no such entry.
    pub fn history_entry(&self, index: i64) -> Result<&Path, CommandError> {
        resolve_index(index, self.history.len())
            .and_then(|actual| self.history.get(actual))
            .map(PathBuf::as_path)
            .ok_or(CommandError::IndexOutOfRange {
                index,
                len: self.history.len(),
            })
    }

    pub fn errors(&self) -> &BTreeSet<PathBuf> {
        &self.errors
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }
}

/// Maps a possibly negative index onto `0..len`.
pub fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let actual = if index >= 0 { index } else { len + index };
    if (0..len).contains(&actual) {
        usize::try_from(actual).ok()
    } else {
        None
    }
}
