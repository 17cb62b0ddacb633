//! Deferred callback queue owned by the world.

use std::time::Duration;

use firebot_core::Timer;

/// Timer captured together with the run epoch and state visit it was
/// scheduled in.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PendingTimer {
    /// Simulated time at which the timer comes due.
    pub(crate) due: Duration,
    /// Run epoch observed when the timer was scheduled.
    pub(crate) epoch: u64,
    /// State entry counter observed when the timer was scheduled.
    pub(crate) visit: u64,
    /// Callback kind and its validity snapshot.
    pub(crate) timer: Timer,
    sequence: u64,
}

/// Queue of timers ordered by due time, then by scheduling order.
///
/// Timers are never cancelled physically. Stale entries stay queued until
/// they come due and the world discards them after re-validating.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    pending: Vec<PendingTimer>,
    next_sequence: u64,
}

impl Scheduler {
    pub(crate) fn schedule(&mut self, due: Duration, epoch: u64, visit: u64, timer: Timer) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.pending.push(PendingTimer {
            due,
            epoch,
            visit,
            timer,
            sequence,
        });
    }

    /// Removes every timer due at or before `now`, in firing order.
    pub(crate) fn drain_due(&mut self, now: Duration) -> Vec<PendingTimer> {
        let mut due: Vec<PendingTimer> = Vec::new();
        self.pending.retain(|pending| {
            if pending.due <= now {
                due.push(*pending);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|pending| (pending.due, pending.sequence));
        due
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firebot_core::{ControllerState, FireId};

    #[test]
    fn drains_in_due_order_then_schedule_order() {
        let mut scheduler = Scheduler::default();
        let late = Timer::FireTimeout {
            fire: FireId::new(1),
        };
        let first = Timer::Dwell {
            state: ControllerState::Idle,
        };
        let second = Timer::Dwell {
            state: ControllerState::Aim,
        };

        scheduler.schedule(Duration::from_millis(900), 1, 0, late);
        scheduler.schedule(Duration::from_millis(500), 1, 0, first);
        scheduler.schedule(Duration::from_millis(500), 1, 1, second);

        let drained: Vec<Timer> = scheduler
            .drain_due(Duration::from_millis(600))
            .into_iter()
            .map(|pending| pending.timer)
            .collect();

        assert_eq!(drained, vec![first, second]);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn timers_not_yet_due_stay_queued() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(
            Duration::from_secs(5),
            3,
            4,
            Timer::FireTimeout {
                fire: FireId::new(9),
            },
        );

        assert!(scheduler.drain_due(Duration::from_secs(4)).is_empty());
        let drained = scheduler.drain_due(Duration::from_secs(5));
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].epoch, 3);
        assert_eq!(drained[0].visit, 4);
    }
}
