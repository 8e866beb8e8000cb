//! Single-threaded timer queue driving every delayed callback of the widget.
//!
//! Time is a plain millisecond counter owned by the queue, so hosts decide
//! whether it follows the wall clock or is stepped by hand in tests. Timers
//! behave like `setTimeout`/`setInterval`: one-shot or repeating, cancellable
//! by id, and fired strictly in deadline order with ties resolved in the
//! order they were scheduled.

/// Opaque identifier returned when a timer is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct TimerEntry<E> {
    id: TimerId,
    fire_at: u64,
    /// Issuance order, used to break deadline ties.
    seq: u64,
    interval: Option<u64>,
    event: E,
}

/// Millisecond timer queue. `E` is the payload handed back when a timer
/// fires.
#[derive(Debug)]
pub struct TimerQueue<E> {
    now: u64,
    timers: Vec<TimerEntry<E>>,
    next_id: u64,
    next_seq: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now: 0,
            timers: Vec::new(),
            next_id: 1,
            next_seq: 0,
        }
    }

    /// Current time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Fires `event` once, `delay_ms` from now.
    pub fn schedule_once(&mut self, delay_ms: u64, event: E) -> TimerId {
        self.push(delay_ms, None, event)
    }

    /// Fires `event` every `interval_ms`, first after one full interval.
    pub fn schedule_repeating(&mut self, interval_ms: u64, event: E) -> TimerId {
        let interval = interval_ms.max(1);
        self.push(interval, Some(interval), event)
    }

    /// Removes a timer. Returns `false` if it had already fired or was never
    /// scheduled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Earliest deadline among active timers.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.iter().map(|timer| timer.fire_at).min()
    }

    /// Moves the clock forward without firing anything. The clock never runs
    /// backwards.
    pub fn advance_to(&mut self, time: u64) {
        self.now = self.now.max(time);
    }

    /// Drops every timer.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    fn push(&mut self, delay_ms: u64, interval: Option<u64>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(TimerEntry {
            id,
            fire_at: self.now.saturating_add(delay_ms),
            seq,
            interval,
            event,
        });
        id
    }

    fn earliest_due(&self, until: u64) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.fire_at <= until)
            .min_by_key(|(_, timer)| (timer.fire_at, timer.seq))
            .map(|(index, _)| index)
    }
}

impl<E: Clone> TimerQueue<E> {
    /// Pops the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Repeating timers are re-armed one interval later and
    /// keep their id, unless that would run past the end of the clock.
    ///
    /// Only one timer is returned per call so the caller can schedule or
    /// cancel timers in response before the next one is considered.
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerId, E)> {
        let index = self.earliest_due(until)?;
        let entry = self.timers.swap_remove(index);
        self.now = self.now.max(entry.fire_at);

        let fired = (entry.id, entry.event.clone());
        if let Some(interval) = entry.interval {
            match entry.fire_at.checked_add(interval) {
                Some(fire_at) => {
                    let seq = self.next_seq;
                    self.next_seq += 1;
                    self.timers.push(TimerEntry {
                        fire_at,
                        seq,
                        ..entry
                    });
                }
                None => tracing::debug!(id = entry.id.0, "repeating timer ran out of clock"),
            }
        }
        Some(fired)
    }
}
