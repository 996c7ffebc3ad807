//! Debounced refresh scheduling.
//!
//! Bursts of triggers collapse into one refresh: each trigger pushes the
//! pending deadline out to at least `now + delay`, never pulls it in. The
//! scheduler holds no timers; callers poll [`RefreshScheduler::take_due`]
//! against a [`crate::clock::Clock`].

use std::time::Duration;

use cartmirror_core::RefreshDelays;

use crate::detect::Trigger;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    deadline_ms: u64,
    open_drawer: bool,
    triggers: Vec<Trigger>,
}

/// A refresh whose deadline has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueRefresh {
    /// Schedule generation at the time the refresh became due.
    pub generation: u64,
    /// Whether any coalesced trigger asked to open the drawer.
    pub open_drawer: bool,
    /// Every trigger folded into this refresh, in arrival order.
    pub triggers: Vec<Trigger>,
}

/// Coalesces refresh requests into at most one pending refresh.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    delays: RefreshDelays,
    pending: Option<Pending>,
    generation: u64,
}

impl RefreshScheduler {
    #[must_use]
    pub fn new(delays: RefreshDelays) -> Self {
        Self {
            delays,
            pending: None,
            generation: 0,
        }
    }

    #[must_use]
    pub fn delays(&self) -> &RefreshDelays {
        &self.delays
    }

    /// Schedules a refresh for `trigger` with its configured delay. Returns
    /// the new generation.
    pub fn schedule(&mut self, trigger: Trigger, now_ms: u64) -> u64 {
        let delay = trigger.delay(&self.delays);
        self.schedule_after(trigger, delay, trigger.opens_drawer(), now_ms)
    }

    /// Schedules a refresh `delay` from `now_ms`.
    pub fn schedule_after(
        &mut self,
        trigger: Trigger,
        delay: Duration,
        open_drawer: bool,
        now_ms: u64,
    ) -> u64 {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        let deadline_ms = now_ms.saturating_add(delay_ms);
        self.generation += 1;

        match &mut self.pending {
            Some(pending) => {
                pending.deadline_ms = pending.deadline_ms.max(deadline_ms);
                pending.open_drawer |= open_drawer;
                pending.triggers.push(trigger);
            }
            None => {
                self.pending = Some(Pending {
                    deadline_ms,
                    open_drawer,
                    triggers: vec![trigger],
                });
            }
        }
        tracing::trace!(
            %trigger,
            generation = self.generation,
            deadline_ms = self.next_deadline_ms(),
            "refresh scheduled"
        );
        self.generation
    }

    /// Deadline of the pending refresh, if any.
    #[must_use]
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.deadline_ms)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of schedule calls so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Takes the pending refresh if its deadline has passed.
    pub fn take_due(&mut self, now_ms: u64) -> Option<DueRefresh> {
        if self.pending.as_ref()?.deadline_ms > now_ms {
            return None;
        }
        let pending = self.pending.take()?;
        Some(DueRefresh {
            generation: self.generation,
            open_drawer: pending.open_drawer,
            triggers: pending.triggers,
        })
    }

    /// Drops any pending refresh.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Identifies one refresh pass for the stale-result guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassTicket {
    pub generation: u64,
}

/// Hands out pass tickets and rejects commits that arrive after a newer
/// pass already rendered.
#[derive(Debug, Clone, Default)]
pub struct PassGuard {
    issued: u64,
    rendered: u64,
}

impl PassGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new pass.
    pub fn issue(&mut self) -> PassTicket {
        self.issued += 1;
        PassTicket {
            generation: self.issued,
        }
    }

    /// Records a commit. Returns `false` when `ticket` is older than the
    /// last rendered pass, in which case its result must be discarded.
    pub fn accept(&mut self, ticket: PassTicket) -> bool {
        if ticket.generation < self.rendered {
            return false;
        }
        self.rendered = ticket.generation;
        true
    }

    /// Generation of the last accepted pass (0 before the first).
    #[must_use]
    pub fn last_rendered(&self) -> u64 {
        self.rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> RefreshScheduler {
        RefreshScheduler::new(RefreshDelays::default())
    }

    #[test]
    fn single_trigger_fires_after_its_delay() {
        let mut s = scheduler();
        s.schedule(Trigger::StructuralMutation, 1_000);
        assert_eq!(s.next_deadline_ms(), Some(1_300));
        assert!(s.take_due(1_299).is_none());
        let due = s.take_due(1_300).expect("due at deadline");
        assert_eq!(due.triggers, vec![Trigger::StructuralMutation]);
        assert!(!s.is_pending());
        assert!(s.take_due(5_000).is_none());
    }

    #[test]
    fn burst_collapses_into_one_refresh_at_last_deadline() {
        let mut s = scheduler();
        for t in 0..10 {
            s.schedule(Trigger::QuantityChanged, t * 50);
        }
        // Last trigger at 450ms with a 300ms delay.
        assert_eq!(s.next_deadline_ms(), Some(750));
        assert!(s.take_due(749).is_none());
        let due = s.take_due(750).expect("one refresh");
        assert_eq!(due.triggers.len(), 10);
        assert_eq!(due.generation, 10);
        assert!(s.take_due(10_000).is_none());
    }

    #[test]
    fn shorter_delay_never_pulls_deadline_in() {
        let mut s = scheduler();
        s.schedule(Trigger::AddToCartClicked, 0);
        s.schedule(Trigger::AnalyticsPush, 10);
        assert_eq!(s.next_deadline_ms(), Some(1_000));
    }

    #[test]
    fn drawer_flag_is_sticky_across_coalesced_triggers() {
        let mut s = scheduler();
        s.schedule(Trigger::ProductAdded, 0);
        s.schedule(Trigger::CartUpdated, 100);
        let due = s.take_due(600).expect("due");
        assert!(due.open_drawer);

        s.schedule(Trigger::CartUpdated, 1_000);
        assert!(!s.take_due(2_000).expect("due").open_drawer);
    }

    #[test]
    fn generation_bumps_on_every_schedule() {
        let mut s = scheduler();
        assert_eq!(s.schedule(Trigger::AnalyticsPush, 0), 1);
        assert_eq!(s.schedule(Trigger::AnalyticsPush, 0), 2);
        assert_eq!(s.generation(), 2);
    }

    #[test]
    fn cancel_drops_pending() {
        let mut s = scheduler();
        s.schedule(Trigger::CartUpdated, 0);
        s.cancel();
        assert!(s.take_due(10_000).is_none());
    }

    #[test]
    fn pass_guard_discards_stale_commits() {
        let mut guard = PassGuard::new();
        let first = guard.issue();
        let second = guard.issue();
        assert!(guard.accept(second));
        assert!(!guard.accept(first));
        assert_eq!(guard.last_rendered(), second.generation);
        let third = guard.issue();
        assert!(guard.accept(third));
    }
}
