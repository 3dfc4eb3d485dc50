use std::time::Duration;

/// Upper bound on ticks released by a single `advance`, so a long stall (debugger, window
/// drag) does not replay seconds of simulation at once.
pub const MAX_CATCH_UP_TICKS: u32 = 5;

/// Identifies one scheduled repeating task. A new `schedule` call invalidates older ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// A cancellable repeating task driven by elapsed time.
///
/// The host feeds frame deltas into `advance`, which reports how many ticks came due. A
/// cancelled (or never scheduled) task reports none; "stopping the loop" is simply not
/// re-arming it.
#[derive(Debug, Clone, Default)]
pub struct TickScheduler {
    interval: Option<Duration>,
    accumulated: Duration,
    next_id: u64,
    current: Option<TaskId>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a fresh task, cancelling whatever was scheduled before.
    pub fn schedule(&mut self, interval: Duration) -> TaskId {
        self.cancel();
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.interval = Some(interval.max(Duration::from_millis(1)));
        self.accumulated = Duration::ZERO;
        self.current = Some(id);
        id
    }

    pub fn cancel(&mut self) {
        self.interval = None;
        self.accumulated = Duration::ZERO;
        self.current = None;
    }

    pub fn current_task(&self) -> Option<TaskId> {
        self.current
    }

    pub fn is_armed(&self) -> bool {
        self.current.is_some()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Changes the interval of the armed task. Does nothing when cancelled.
    pub fn set_interval(&mut self, interval: Duration) {
        if self.interval.is_some() {
            self.interval = Some(interval.max(Duration::from_millis(1)));
        }
    }

    pub fn advance(&mut self, dt: Duration) -> u32 {
        let Some(interval) = self.interval else {
            return 0;
        };

        self.accumulated = self.accumulated.saturating_add(dt);
        let mut due = 0u32;
        while self.accumulated >= interval && due < MAX_CATCH_UP_TICKS {
            self.accumulated -= interval;
            due += 1;
        }
        if due == MAX_CATCH_UP_TICKS && self.accumulated >= interval {
            // Drop the backlog instead of carrying it into the next frame.
            self.accumulated = Duration::ZERO;
        }
        due
    }
}
