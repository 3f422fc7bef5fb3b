//! Cancellable deadlines polled from the runtime tick.
//!
//! Nothing here sleeps. Owners call `poll*` with the tick's `Instant`; a
//! cancelled or superseded deadline simply never fires.

use core_book::TurnTarget;
use std::time::{Duration, Instant};

/// Per-target deadlines clearing the cosmetic "turning" flag.
#[derive(Debug, Default, Clone)]
pub struct SettleTimers {
    deadlines: Vec<(TurnTarget, Instant)>,
}

impl SettleTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the deadline for `target`. A second schedule for the
    /// same target replaces the first.
    pub fn schedule(&mut self, target: TurnTarget, at: Instant) {
        if let Some(slot) = self.deadlines.iter_mut().find(|(t, _)| *t == target) {
            slot.1 = at;
        } else {
            self.deadlines.push((target, at));
        }
    }

    pub fn cancel(&mut self, target: TurnTarget) -> bool {
        let before = self.deadlines.len();
        self.deadlines.retain(|(t, _)| *t != target);
        before != self.deadlines.len()
    }

    pub fn is_pending(&self, target: TurnTarget) -> bool {
        self.deadlines.iter().any(|(t, _)| *t == target)
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Remove and return every target whose deadline is at or before `now`,
    /// earliest first.
    pub fn poll_expired(&mut self, now: Instant) -> Vec<TurnTarget> {
        let mut expired: Vec<(TurnTarget, Instant)> = Vec::new();
        self.deadlines.retain(|&(target, at)| {
            if at <= now {
                expired.push((target, at));
                false
            } else {
                true
            }
        });
        expired.sort_by_key(|&(_, at)| at);
        expired.into_iter().map(|(target, _)| target).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.iter().map(|&(_, at)| at).min()
    }
}

/// Trailing-edge debounce: only the last `arm` within `delay` fires.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True exactly once, on the first poll at or after the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn expired_targets_fire_once_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = SettleTimers::new();
        timers.schedule(TurnTarget::Leaf(2), t0 + 30 * MS);
        timers.schedule(TurnTarget::Cover, t0 + 10 * MS);
        timers.schedule(TurnTarget::Leaf(0), t0 + 500 * MS);

        assert!(timers.poll_expired(t0).is_empty());
        assert_eq!(
            timers.poll_expired(t0 + 40 * MS),
            vec![TurnTarget::Cover, TurnTarget::Leaf(2)]
        );
        assert!(timers.poll_expired(t0 + 40 * MS).is_empty());
        assert_eq!(timers.next_deadline(), Some(t0 + 500 * MS));
    }

    #[test]
    fn reschedule_replaces_deadline() {
        let t0 = Instant::now();
        let mut timers = SettleTimers::new();
        timers.schedule(TurnTarget::Leaf(1), t0 + 10 * MS);
        timers.schedule(TurnTarget::Leaf(1), t0 + 100 * MS);
        assert_eq!(timers.len(), 1);
        assert!(timers.poll_expired(t0 + 50 * MS).is_empty());
        assert_eq!(timers.poll_expired(t0 + 100 * MS), vec![TurnTarget::Leaf(1)]);
    }

    #[test]
    fn cancelled_deadline_never_fires() {
        let t0 = Instant::now();
        let mut timers = SettleTimers::new();
        timers.schedule(TurnTarget::Cover, t0);
        assert!(timers.cancel(TurnTarget::Cover));
        assert!(!timers.cancel(TurnTarget::Cover));
        assert!(timers.poll_expired(t0 + MS).is_empty());
        assert!(timers.is_empty());
    }

    #[test]
    fn debounce_fires_on_trailing_edge_only() {
        let t0 = Instant::now();
        let mut d = Debounce::new(120 * MS);
        d.arm(t0);
        d.arm(t0 + 100 * MS);
        assert!(!d.poll(t0 + 150 * MS), "re-arm pushed the deadline out");
        assert!(d.poll(t0 + 220 * MS));
        assert!(!d.poll(t0 + 400 * MS));
        assert_eq!(d.deadline(), None);
    }
}
