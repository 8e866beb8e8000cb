use crate::timeline::{TimerId, TimerQueue};

/// Payload of the auto-cycle's repeating timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoCycleTick;

/// Repeating timer that asks for a full randomization every interval.
///
/// Owns at most one timer. Starting while running and stopping while stopped
/// leave everything untouched.
#[derive(Debug)]
pub struct AutoCycle {
    interval_ms: u64,
    timer: Option<TimerId>,
}

impl AutoCycle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            timer: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Returns `true` if the timer was started by this call.
    pub fn start<E>(&mut self, timers: &mut TimerQueue<E>) -> bool
    where
        E: From<AutoCycleTick>,
    {
        if self.timer.is_some() {
            return false;
        }
        self.timer = Some(timers.schedule_repeating(self.interval_ms, AutoCycleTick.into()));
        tracing::info!(interval_ms = self.interval_ms, "auto-cycle started");
        true
    }

    /// Returns `true` if a running timer was stopped by this call.
    pub fn stop<E>(&mut self, timers: &mut TimerQueue<E>) -> bool {
        match self.timer.take() {
            Some(id) => {
                timers.cancel(id);
                tracing::info!("auto-cycle stopped");
                true
            }
            None => false,
        }
    }

    /// Flips between running and stopped; returns the new running state.
    pub fn toggle<E>(&mut self, timers: &mut TimerQueue<E>) -> bool
    where
        E: From<AutoCycleTick>,
    {
        if self.is_running() {
            self.stop(timers);
        } else {
            self.start(timers);
        }
        self.is_running()
    }
}
