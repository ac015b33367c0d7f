//! Interval timers driven by physics time

use crate::event::EventSink;

/// Handle to a registered timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u32);

#[derive(Clone, Debug)]
struct Timer {
    id: TimerId,
    interval_ms: u64,
    next_fire_ms: u64,
}

/// Collection of repeating timers
///
/// Timers are checked once per sub-step, so their resolution is one sub-step.
#[derive(Clone, Debug, Default)]
pub struct Timers {
    timers: Vec<Timer>,
    next_id: u32,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a timer firing every `interval_ms`, first at `now_ms + interval_ms`
    pub fn add(&mut self, interval_ms: u64, now_ms: u64) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let interval_ms = interval_ms.max(1);
        self.timers.push(Timer {
            id,
            interval_ms,
            next_fire_ms: now_ms + interval_ms,
        });
        id
    }

    /// Remove a timer; returns false if it was not registered
    pub fn remove(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Fire every timer that is due at `now_ms`
    ///
    /// A timer fires at most once per call; its next deadline is measured
    /// from `now_ms` so a late timer does not burst to catch up.
    pub fn fire_due(&mut self, now_ms: u64, sink: &mut dyn EventSink) -> usize {
        let mut fired = 0;
        for timer in &mut self.timers {
            if timer.next_fire_ms <= now_ms {
                timer.next_fire_ms = now_ms + timer.interval_ms;
                sink.on_timer(timer.id);
                fired += 1;
            }
        }
        fired
    }
}
