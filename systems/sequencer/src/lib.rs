#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave sequencer driving warning, spawn, combat, and
//! intermission phases.
//!
//! The sequencer is a pure system. It suspends between calls to
//! [`Sequencer::handle`]: timed phases advance by the `Event::TimeAdvanced`
//! deltas it observes, and the combat phase resumes once every spawn outcome
//! of the wave has been reported and the supplied [`PopulationView`] shows no
//! live enemy. Spawn requests leave through the command buffer; phase
//! boundaries are announced through the derived event buffer.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use wave_siege_core::{
    Command, Event, HaltReason, ListenerId, Phase, PopulationView, SpawnRejection, Wave, WaveIndex,
};
use wave_siege_system_escalation::EscalationPolicy;
use wave_siege_system_spawning::{Placement, RadialPlacement};

/// Errors raised when constructing a sequencer [`Config`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The opening wave would contain no enemies.
    #[error("the first wave must contain at least one enemy")]
    EmptyFirstWave,
    /// The encounter would contain no waves.
    #[error("the wave cap must be at least one")]
    NoWaves,
    /// The per-wave spawn cap would forbid every spawn.
    #[error("the spawn cap must be at least one")]
    ZeroSpawnCap,
}

/// Spawn attempts issued per batch while a wave bursts in.
///
/// A wave is issued in batches within the same tick; once the world reports
/// that it cannot host more enemies the rest of the burst is skipped.
pub const SPAWN_BATCH: u32 = 64;

/// Fixed delays between phase transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    /// Delay before the first warning is shown.
    pub settle_delay: Duration,
    /// How long each wave warning is displayed before spawning.
    pub warning_duration: Duration,
    /// Rest between a cleared wave and the next warning.
    pub time_between_waves: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            warning_duration: Duration::from_secs(2),
            time_between_waves: Duration::from_secs(3),
        }
    }
}

/// Configuration parameters required to construct the sequencer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    first_wave_count: u32,
    escalation: EscalationPolicy,
    max_waves: u32,
    timings: Timings,
    spawn_cap: Option<u32>,
}

impl Config {
    /// Creates a configuration for an encounter of at most `max_waves` waves.
    pub fn new(
        first_wave_count: u32,
        escalation: EscalationPolicy,
        max_waves: u32,
        timings: Timings,
    ) -> Result<Self, ConfigError> {
        if first_wave_count == 0 {
            return Err(ConfigError::EmptyFirstWave);
        }
        if max_waves == 0 {
            return Err(ConfigError::NoWaves);
        }
        Ok(Self {
            first_wave_count,
            escalation,
            max_waves,
            timings,
            spawn_cap: None,
        })
    }

    /// Limits the number of spawn attempts issued for any single wave.
    ///
    /// The escalation policy itself stays unbounded; waves whose computed
    /// count exceeds the cap are logged and truncated when spawning.
    pub fn with_spawn_cap(mut self, cap: u32) -> Result<Self, ConfigError> {
        if cap == 0 {
            return Err(ConfigError::ZeroSpawnCap);
        }
        self.spawn_cap = Some(cap);
        Ok(self)
    }

    /// Maximum number of waves in the encounter.
    #[must_use]
    pub const fn max_waves(&self) -> u32 {
        self.max_waves
    }

    /// Phase timings.
    #[must_use]
    pub const fn timings(&self) -> Timings {
        self.timings
    }
}

/// Pure wave sequencer that emits spawn commands and phase events.
#[derive(Debug)]
pub struct Sequencer<P = RadialPlacement> {
    config: Config,
    listener: ListenerId,
    placement: P,
    phase: Phase,
    elapsed: Duration,
    wave: Wave,
    outcomes: SpawnOutcomes,
}

impl<P: Placement> Sequencer<P> {
    /// Creates a sequencer in [`Phase::Idle`] that spawns on behalf of `listener`.
    #[must_use]
    pub fn new(config: Config, listener: ListenerId, placement: P) -> Self {
        Self {
            config,
            listener,
            placement,
            phase: Phase::Idle,
            elapsed: Duration::ZERO,
            wave: Wave::new(WaveIndex::FIRST, config.first_wave_count),
            outcomes: SpawnOutcomes::default(),
        }
    }

    /// Currently active phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Wave that is announced, in combat, or just cleared.
    #[must_use]
    pub const fn wave(&self) -> Wave {
        self.wave
    }

    /// Listener the spawned enemies are subscribed to.
    #[must_use]
    pub const fn listener(&self) -> ListenerId {
        self.listener
    }

    /// Number of spawn attempts of the current wave whose outcome is still unknown.
    #[must_use]
    pub const fn pending_spawns(&self) -> u32 {
        self.outcomes.pending()
    }

    /// Consumes world events and advances the phase machine.
    ///
    /// `population` must reflect the events in `events`. `template_ready`
    /// reports whether the spawn service can currently create enemies.
    pub fn handle(
        &mut self,
        events: &[Event],
        population: PopulationView,
        template_ready: bool,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        if self.phase.is_terminal() {
            return;
        }

        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    self.elapsed = self.elapsed.saturating_add(*dt);
                }
                Event::EnemySpawned { wave, listener, .. } if self.owns(*wave, *listener) => {
                    self.outcomes.spawned = self.outcomes.spawned.saturating_add(1);
                }
                Event::SpawnRejected {
                    wave,
                    listener,
                    reason,
                    ..
                } if self.owns(*wave, *listener) => {
                    self.outcomes.reject(*reason);
                }
                _ => {}
            }
        }

        loop {
            let advanced = match self.phase {
                Phase::Idle => self.after(self.config.timings.settle_delay, |sequencer| {
                    sequencer.announce_wave(out_events);
                }),
                Phase::Warning => self.after(self.config.timings.warning_duration, |sequencer| {
                    if template_ready {
                        sequencer.spawn_wave(out_commands, out_events);
                    } else {
                        sequencer.halt(HaltReason::MissingTemplate, out_events);
                    }
                }),
                Phase::Spawning => {
                    self.transition(Phase::AwaitingClear, out_events);
                    true
                }
                Phase::AwaitingClear => self.await_clear(population, out_commands, out_events),
                Phase::Intermission => {
                    self.after(self.config.timings.time_between_waves, |sequencer| {
                        sequencer.next_wave(out_events);
                    })
                }
                Phase::Complete | Phase::Halted => false,
            };

            if !advanced {
                break;
            }
        }
    }

    fn owns(&self, wave: WaveIndex, listener: Option<ListenerId>) -> bool {
        self.phase == Phase::AwaitingClear
            && wave == self.wave.index()
            && listener == Some(self.listener)
    }

    fn after<F>(&mut self, delay: Duration, on_elapsed: F) -> bool
    where
        F: FnOnce(&mut Self),
    {
        if self.elapsed < delay {
            return false;
        }
        self.elapsed -= delay;
        on_elapsed(self);
        true
    }

    fn announce_wave(&mut self, out_events: &mut Vec<Event>) {
        self.transition(Phase::Warning, out_events);
        info!(
            wave = self.wave.index().get(),
            enemies = self.wave.enemy_count(),
            "wave announced"
        );
        out_events.push(Event::WaveAnnounced {
            wave: self.wave.index(),
        });
    }

    fn spawn_wave(&mut self, out_commands: &mut Vec<Command>, out_events: &mut Vec<Event>) {
        self.transition(Phase::Spawning, out_events);

        let mut requested = self.wave.enemy_count();
        if let Some(cap) = self.config.spawn_cap {
            if requested > cap {
                warn!(
                    wave = self.wave.index().get(),
                    requested, cap, "wave exceeds the spawn cap; truncating"
                );
                requested = cap;
            }
        }

        self.outcomes = SpawnOutcomes {
            requested,
            ..SpawnOutcomes::default()
        };
        self.issue_batch(out_commands);
        self.elapsed = Duration::ZERO;
        out_events.push(Event::WaveStarted {
            wave: self.wave.index(),
            requested,
        });
    }

    fn issue_batch(&mut self, out_commands: &mut Vec<Command>) {
        let batch = self.outcomes.unissued().min(SPAWN_BATCH);
        for _ in 0..batch {
            out_commands.push(Command::SpawnEnemy {
                wave: self.wave.index(),
                position: self.placement.next_point(),
                listener: Some(self.listener),
            });
        }
        self.outcomes.issued += batch;
    }

    fn await_clear(
        &mut self,
        population: PopulationView,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) -> bool {
        if self.outcomes.in_flight() > 0 {
            return false;
        }

        if self.outcomes.unissued() > 0 {
            if !self.outcomes.world_full {
                self.issue_batch(out_commands);
                return false;
            }
            self.outcomes.skip_unissued();
        }

        self.report_failures();
        if self.outcomes.spawned > 0 && !population.is_wave_cleared() {
            return false;
        }

        info!(
            wave = self.wave.index().get(),
            total_kills = population.total_kills(),
            "wave cleared"
        );
        out_events.push(Event::WaveCompleted {
            wave: self.wave.index(),
        });
        self.elapsed = Duration::ZERO;
        self.transition(Phase::Intermission, out_events);
        true
    }

    fn report_failures(&mut self) {
        let outcomes = &mut self.outcomes;
        if outcomes.reported || outcomes.rejected + outcomes.skipped == 0 {
            return;
        }
        outcomes.reported = true;
        warn!(
            wave = self.wave.index().get(),
            requested = outcomes.requested,
            spawned = outcomes.spawned,
            rejected = outcomes.rejected,
            skipped = outcomes.skipped,
            "spawn attempts of the wave failed"
        );
    }

    fn next_wave(&mut self, out_events: &mut Vec<Event>) {
        if self.wave.index().get() >= self.config.max_waves {
            info!(waves = self.config.max_waves, "wave cap reached");
            self.transition(Phase::Complete, out_events);
            out_events.push(Event::EncounterCompleted);
            return;
        }

        self.wave = self.config.escalation.next_wave(self.wave);
        self.announce_wave(out_events);
    }

    fn halt(&mut self, reason: HaltReason, out_events: &mut Vec<Event>) {
        error!(wave = self.wave.index().get(), %reason, "encounter halted");
        self.transition(Phase::Halted, out_events);
        out_events.push(Event::EncounterHalted { reason });
    }

    fn transition(&mut self, to: Phase, out_events: &mut Vec<Event>) {
        let from = self.phase;
        debug!(?from, ?to, wave = self.wave.index().get(), "phase transition");
        self.phase = to;
        out_events.push(Event::PhaseChanged { from, to });
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct SpawnOutcomes {
    requested: u32,
    issued: u32,
    spawned: u32,
    rejected: u32,
    skipped: u32,
    world_full: bool,
    reported: bool,
}

impl SpawnOutcomes {
    /// Attempts whose outcome is unknown, issued or not.
    const fn pending(&self) -> u32 {
        self.requested
            .saturating_sub(self.spawned)
            .saturating_sub(self.rejected)
            .saturating_sub(self.skipped)
    }

    const fn in_flight(&self) -> u32 {
        self.issued
            .saturating_sub(self.spawned)
            .saturating_sub(self.rejected)
    }

    const fn unissued(&self) -> u32 {
        self.requested.saturating_sub(self.issued)
    }

    fn reject(&mut self, reason: SpawnRejection) {
        self.rejected = self.rejected.saturating_add(1);
        if matches!(
            reason,
            SpawnRejection::CapacityExhausted | SpawnRejection::MissingTemplate
        ) {
            self.world_full = true;
        }
    }

    fn skip_unissued(&mut self) {
        self.skipped = self.unissued();
        self.issued = self.requested;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_siege_system_spawning::FixedPlacement;

    fn sequencer(max_waves: u32) -> Sequencer<FixedPlacement> {
        let config = Config::new(
            3,
            EscalationPolicy::new(1.2).expect("valid factor"),
            max_waves,
            Timings::default(),
        )
        .expect("valid config");
        Sequencer::new(config, ListenerId::new(0), FixedPlacement::default())
    }

    fn tick(secs: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_secs(secs),
        }
    }

    #[test]
    fn config_rejects_empty_encounters() {
        let policy = EscalationPolicy::new(1.2).expect("valid factor");
        assert_eq!(
            Config::new(0, policy, 3, Timings::default()),
            Err(ConfigError::EmptyFirstWave)
        );
        assert_eq!(
            Config::new(3, policy, 0, Timings::default()),
            Err(ConfigError::NoWaves)
        );
    
        let config = Config::new(3, policy, 3, Timings::default()).expect("valid config");
        assert_eq!(config.with_spawn_cap(0), Err(ConfigError::ZeroSpawnCap));
    }

    #[test]
    fn settle_delay_precedes_first_warning() {
        let mut sequencer = sequencer(3);
        let mut commands = Vec::new();
        let mut events = Vec::new();

        sequencer.handle(&[], PopulationView::default(), true, &mut commands, &mut events);
        assert_eq!(sequencer.phase(), Phase::Idle);
        assert!(events.is_empty());

        sequencer.handle(
            &[tick(1)],
            PopulationView::default(),
            true,
            &mut commands,
            &mut events,
        );
        assert_eq!(sequencer.phase(), Phase::Warning);
        assert_eq!(
            events,
            vec![
                Event::PhaseChanged {
                    from: Phase::Idle,
                    to: Phase::Warning
                },
                Event::WaveAnnounced {
                    wave: WaveIndex::FIRST
                },
            ]
        );
        assert!(commands.is_empty());
    }

    #[test]
    fn warning_elapses_into_spawn_burst() {
        let mut sequencer = sequencer(3);
        let mut commands = Vec::new();
        let mut events = Vec::new();

        sequencer.handle(
            &[tick(3)],
            PopulationView::default(),
            true,
            &mut commands,
            &mut events,
        );

        assert_eq!(sequencer.phase(), Phase::AwaitingClear);
        assert_eq!(commands.len(), 3);
        assert_eq!(sequencer.pending_spawns(), 3);
        assert!(commands.iter().all(|command| matches!(
            command,
            Command::SpawnEnemy {
                wave,
                listener: Some(listener),
                ..
            } if *wave == WaveIndex::FIRST && *listener == ListenerId::new(0)
        )));
        assert!(events.contains(&Event::WaveStarted {
            wave: WaveIndex::FIRST,
            requested: 3
        }));
    }

    #[test]
    fn missing_template_halts_instead_of_clearing() {
        let mut sequencer = sequencer(3);
        let mut commands = Vec::new();
        let mut events = Vec::new();

        sequencer.handle(
            &[tick(3)],
            PopulationView::default(),
            false,
            &mut commands,
            &mut events,
        );

        assert_eq!(sequencer.phase(), Phase::Halted);
        assert!(commands.is_empty());
        assert!(events.contains(&Event::EncounterHalted {
            reason: HaltReason::MissingTemplate
        }));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::WaveCompleted { .. })));

        events.clear();
        sequencer.handle(
            &[tick(60)],
            PopulationView::default(),
            true,
            &mut commands,
            &mut events,
        );
        assert!(commands.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn spawn_cap_truncates_burst() {
        let config = Config::new(
            10,
            EscalationPolicy::new(1.5).expect("valid factor"),
            2,
            Timings::default(),
        )
        .expect("valid config")
        .with_spawn_cap(4)
        .expect("non-zero cap");
        let mut sequencer = Sequencer::new(config, ListenerId::new(2), FixedPlacement::default());
        let mut commands = Vec::new();
        let mut events = Vec::new();

        sequencer.handle(
            &[tick(3)],
            PopulationView::default(),
            true,
            &mut commands,
            &mut events,
        );

        assert_eq!(commands.len(), 4);
        assert_eq!(sequencer.wave().enemy_count(), 10);
    }

    #[test]
    fn large_waves_burst_in_batches_until_the_world_is_full() {
        let config = Config::new(
            200,
            EscalationPolicy::new(1.2).expect("valid factor"),
            2,
            Timings::default(),
        )
        .expect("valid config");
        let listener = ListenerId::new(4);
        let mut sequencer = Sequencer::new(config, listener, FixedPlacement::default());
        let mut commands = Vec::new();
        let mut events = Vec::new();

        sequencer.handle(
            &[tick(3)],
            PopulationView::default(),
            true,
            &mut commands,
            &mut events,
        );
        assert_eq!(commands.len(), SPAWN_BATCH as usize);
        assert_eq!(sequencer.pending_spawns(), 200);

        let spawned: Vec<Event> = (0..SPAWN_BATCH)
            .map(|id| Event::EnemySpawned {
                enemy: wave_siege_core::EnemyId::new(id),
                wave: WaveIndex::FIRST,
                position: Default::default(),
                listener: Some(listener),
            })
            .collect();
        commands.clear();
        let alive = PopulationView::new(SPAWN_BATCH, 0);
        sequencer.handle(&spawned, alive, true, &mut commands, &mut events);
        assert_eq!(commands.len(), SPAWN_BATCH as usize);
        assert_eq!(sequencer.pending_spawns(), 200 - SPAWN_BATCH);

        let rejected: Vec<Event> = (0..SPAWN_BATCH)
            .map(|_| Event::SpawnRejected {
                wave: WaveIndex::FIRST,
                position: Default::default(),
                listener: Some(listener),
                reason: SpawnRejection::CapacityExhausted,
            })
            .collect();
        commands.clear();
        sequencer.handle(&rejected, alive, true, &mut commands, &mut events);
        assert!(commands.is_empty());
        assert_eq!(sequencer.pending_spawns(), 0);
        assert_eq!(sequencer.phase(), Phase::AwaitingClear);

        sequencer.handle(
            &[],
            PopulationView::new(0, SPAWN_BATCH),
            true,
            &mut commands,
            &mut events,
        );
        assert_eq!(sequencer.phase(), Phase::Intermission);
        assert!(commands.is_empty());
    }
}
