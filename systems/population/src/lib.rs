#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Population bookkeeping for a single encounter.
//!
//! The tracker counts the live enemies registered for the active encounter and
//! the cumulative kill total. It only reacts to spawn confirmations and death
//! notifications addressed to its own listener, so several encounters may
//! share one world without observing each other's enemies.

use std::collections::BTreeSet;

use tracing::trace;
use wave_siege_core::{EnemyId, Event, ListenerId, PopulationView};

/// Tracks live and killed enemies for one encounter.
#[derive(Debug)]
pub struct PopulationTracker {
    listener: ListenerId,
    alive: BTreeSet<EnemyId>,
    total_kills: u32,
}

impl PopulationTracker {
    /// Creates an empty tracker that listens on the provided listener.
    #[must_use]
    pub fn new(listener: ListenerId) -> Self {
        Self {
            listener,
            alive: BTreeSet::new(),
            total_kills: 0,
        }
    }

    /// Listener whose notifications the tracker consumes.
    #[must_use]
    pub const fn listener(&self) -> ListenerId {
        self.listener
    }

    /// Registers a freshly spawned enemy as alive.
    ///
    /// Returns `false` when the enemy was already registered.
    pub fn register_spawn(&mut self, enemy: EnemyId) -> bool {
        self.alive.insert(enemy)
    }

    /// Records the death of a registered enemy.
    ///
    /// Deaths of enemies that were never registered, or were already counted,
    /// leave every counter untouched and return `false`.
    pub fn on_death(&mut self, enemy: EnemyId) -> bool {
        if !self.alive.remove(&enemy) {
            trace!(enemy = enemy.get(), "ignoring death of untracked enemy");
            return false;
        }
        self.total_kills = self.total_kills.saturating_add(1);
        true
    }

    /// Reports whether no registered enemy remains alive.
    #[must_use]
    pub fn is_wave_cleared(&self) -> bool {
        self.alive.is_empty()
    }

    /// Number of registered enemies that are still alive.
    #[must_use]
    pub fn alive_count(&self) -> u32 {
        u32::try_from(self.alive.len()).unwrap_or(u32::MAX)
    }

    /// Kills counted since the tracker was created.
    #[must_use]
    pub const fn total_kills(&self) -> u32 {
        self.total_kills
    }

    /// Captures the counters for systems and adapters.
    #[must_use]
    pub fn view(&self) -> PopulationView {
        PopulationView::new(self.alive_count(), self.total_kills)
    }

    /// Forgets every registered enemy. Used when the encounter is torn down.
    pub fn release(&mut self) {
        self.alive.clear();
    }

    /// Consumes world events and emits [`Event::KillCountChanged`] once per counted death.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Event>) {
        for event in events {
            match event {
                Event::EnemySpawned {
                    enemy,
                    listener: Some(listener),
                    ..
                } if *listener == self.listener => {
                    let _ = self.register_spawn(*enemy);
                }
                Event::DeathNotified { enemy, listener } if *listener == self.listener => {
                    if self.on_death(*enemy) {
                        out.push(Event::KillCountChanged {
                            total_kills: self.total_kills,
                        });
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_registrations_and_deaths() {
        let mut tracker = PopulationTracker::new(ListenerId::new(0));
        for id in 0..5 {
            assert!(tracker.register_spawn(EnemyId::new(id)));
        }
        for id in 0..3 {
            assert!(tracker.on_death(EnemyId::new(id)));
        }

        assert_eq!(tracker.view(), PopulationView::new(2, 3));
        assert!(!tracker.is_wave_cleared());
    }

    #[test]
    fn unregistered_and_duplicate_deaths_are_ignored() {
        let mut tracker = PopulationTracker::new(ListenerId::new(0));
        assert!(!tracker.on_death(EnemyId::new(9)));
        assert_eq!(tracker.alive_count(), 0);
        assert_eq!(tracker.total_kills(), 0);

        assert!(tracker.register_spawn(EnemyId::new(1)));
        assert!(!tracker.register_spawn(EnemyId::new(1)));
        assert!(tracker.on_death(EnemyId::new(1)));
        assert!(!tracker.on_death(EnemyId::new(1)));

        assert_eq!(tracker.view(), PopulationView::new(0, 1));
    }

    #[test]
    fn an_empty_tracker_is_cleared() {
        let tracker = PopulationTracker::new(ListenerId::new(0));
        assert!(tracker.is_wave_cleared());
    }

    #[test]
    fn release_forgets_live_enemies_but_keeps_kills() {
        let mut tracker = PopulationTracker::new(ListenerId::new(0));
        let _ = tracker.register_spawn(EnemyId::new(1));
        let _ = tracker.register_spawn(EnemyId::new(2));
        let _ = tracker.on_death(EnemyId::new(2));

        tracker.release();

        assert_eq!(tracker.view(), PopulationView::new(0, 1));
        assert!(!tracker.on_death(EnemyId::new(1)));
    }
}
