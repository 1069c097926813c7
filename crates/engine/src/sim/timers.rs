use std::rc::{Rc, Weak};

use tracing::debug;

/// Owned by a session. Timers scheduled against it hold only a weak token.
#[derive(Debug, Default)]
pub struct Liveness {
    alive: Rc<()>,
}

impl Liveness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> LivenessToken {
        LivenessToken {
            alive: Rc::downgrade(&self.alive),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LivenessToken {
    alive: Weak<()>,
}

impl LivenessToken {
    pub fn is_alive(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct PendingTimer<T> {
    id: TimerId,
    due_tick: u64,
    token: LivenessToken,
    payload: T,
}

/// Tick-driven delayed callbacks. A timer whose owner has been dropped fires as
/// a no-op.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now_tick: u64,
    next_id: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            now_tick: 0,
            next_id: 1,
            pending: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay_ticks: u64, token: LivenessToken, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.pending.push(PendingTimer {
            id,
            due_tick: self.now_tick.saturating_add(delay_ticks.max(1)),
            token,
            payload,
        });
        id
    }

    /// Drops every pending timer, e.g. when the owning session is torn down.
    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            debug!(pending = self.pending.len(), "timers_cancelled");
        }
        self.pending.clear();
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Advances one tick and returns the payloads that came due, in schedule order.
    pub fn advance(&mut self) -> Vec<T> {
        self.now_tick = self.now_tick.saturating_add(1);
        let now = self.now_tick;
        let mut fired = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due_tick > now {
                index += 1;
                continue;
            }
            let timer = self.pending.remove(index);
            if timer.token.is_alive() {
                fired.push(timer.payload);
            } else {
                debug!(timer = timer.id.0, "timer_owner_dropped");
            }
        }
        fired
    }
}

pub fn millis_to_ticks(millis: u64, tps: u32) -> u64 {
    (millis * tps as u64).div_ceil(1000)
}
