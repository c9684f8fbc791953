#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave encounter orchestration on top of a shared [`World`].
//!
//! An [`Encounter`] owns one population tracker, one sequencer, and one
//! presenter. It holds no reference to the world between calls: every
//! operation borrows the world, pumps the resulting events through the
//! systems, and applies the commands they emit until nothing is left to do.
//!
//! Several encounters may share a world. In that case drive the world
//! directly and hand each batch of world events to every encounter through
//! [`Encounter::process`]; [`Encounter::advance`] and [`Encounter::damage`]
//! only forward events to the encounter they are called on.

mod config;

pub use config::{ConfigError, EncounterConfig};

use thiserror::Error;
use tracing::{debug, info};
use wave_siege_core::{Command, EnemyId, Event, ListenerId, Phase, PopulationView, Wave};
use wave_siege_presentation::Presenter;
use wave_siege_system_population::PopulationTracker;
use wave_siege_system_sequencer::Sequencer;
use wave_siege_system_spawning::{Placement, RadialPlacement};
use wave_siege_world::{self as world, query, World};

/// Errors raised while starting an encounter.
#[derive(Debug, Error)]
pub enum EncounterError {
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The world did not open a death listener.
    #[error("the world did not open a death listener for the encounter")]
    ListenerUnavailable,
}

/// A running wave encounter.
#[derive(Debug)]
pub struct Encounter<Pr, Pl = RadialPlacement> {
    tracker: PopulationTracker,
    sequencer: Sequencer<Pl>,
    presenter: Pr,
}

impl<Pr: Presenter> Encounter<Pr> {
    /// Starts an encounter that scatters enemies with the configured radial placement.
    pub fn new(
        world: &mut World,
        config: &EncounterConfig,
        presenter: Pr,
    ) -> Result<Self, EncounterError> {
        let placement = RadialPlacement::new(config.placement_config()?);
        Self::with_placement(world, config, presenter, placement)
    }
}

impl<Pr: Presenter, Pl: Placement> Encounter<Pr, Pl> {
    /// Starts an encounter that positions enemies with `placement`.
    ///
    /// Opens a death listener on `world`; the encounter is idle until time
    /// advances past the settle delay.
    pub fn with_placement(
        world: &mut World,
        config: &EncounterConfig,
        presenter: Pr,
        placement: Pl,
    ) -> Result<Self, EncounterError> {
        let sequencer_config = config.sequencer_config()?;

        let mut events = Vec::new();
        world::apply(world, Command::OpenListener, &mut events);
        let listener = events
            .iter()
            .find_map(|event| match event {
                Event::ListenerOpened { listener } => Some(*listener),
                _ => None,
            })
            .ok_or(EncounterError::ListenerUnavailable)?;

        info!(
            listener = listener.get(),
            first_wave = config.enemies_per_wave,
            max_waves = config.max_waves,
            "encounter started"
        );

        Ok(Self {
            tracker: PopulationTracker::new(listener),
            sequencer: Sequencer::new(sequencer_config, listener, placement),
            presenter,
        })
    }

    /// Feeds world events through the encounter until it has nothing left to do.
    ///
    /// Commands emitted by the sequencer are applied to `world` and their
    /// events are processed in turn. Returns every derived event in emission
    /// order after dispatching it to the presenter.
    pub fn process(&mut self, world: &mut World, events: Vec<Event>) -> Vec<Event> {
        let mut emitted = Vec::new();
        let mut events = events;
        wave_siege_presentation::dispatch(&events, &mut self.presenter);

        while !events.is_empty() {
            let mut derived = Vec::new();
            self.tracker.handle(&events, &mut derived);

            let template_ready = query::enemy_template(world).is_some();
            let mut commands = Vec::new();
            self.sequencer.handle(
                &events,
                self.tracker.view(),
                template_ready,
                &mut commands,
                &mut derived,
            );

            wave_siege_presentation::dispatch(&derived, &mut self.presenter);
            emitted.extend(derived);

            events.clear();
            for command in commands {
                world::apply(world, command, &mut events);
            }
        }

        emitted
    }

    /// Advances the world clock by `dt` and processes the resulting events.
    pub fn advance(&mut self, world: &mut World, dt: std::time::Duration) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(world, Command::Tick { dt }, &mut events);
        self.process(world, events)
    }

    /// Damages `enemy` and processes the resulting events.
    pub fn damage(&mut self, world: &mut World, enemy: EnemyId, amount: f32) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(world, Command::DamageEnemy { enemy, amount }, &mut events);
        self.process(world, events)
    }

    /// Stops the encounter and closes its death listener.
    ///
    /// Enemies that are still alive stay in the world but no longer report
    /// their deaths. Returns the presenter.
    pub fn teardown(mut self, world: &mut World) -> Pr {
        let listener = self.tracker.listener();
        let mut events = Vec::new();
        world::apply(world, Command::ReleaseListener { listener }, &mut events);
        self.tracker.release();
        debug!(listener = listener.get(), "encounter torn down");
        self.presenter
    }

    /// Currently active phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.sequencer.phase()
    }

    /// Wave that is announced, in combat, or just cleared.
    #[must_use]
    pub fn wave(&self) -> Wave {
        self.sequencer.wave()
    }

    /// Deaths counted since the encounter started.
    #[must_use]
    pub fn total_kills(&self) -> u32 {
        self.tracker.total_kills()
    }

    /// Live and killed enemy counts of the encounter.
    #[must_use]
    pub fn population(&self) -> PopulationView {
        self.tracker.view()
    }

    /// Death listener the encounter's enemies report to.
    #[must_use]
    pub fn listener(&self) -> ListenerId {
        self.tracker.listener()
    }

    /// Presenter receiving the encounter's call-ins.
    #[must_use]
    pub fn presenter(&self) -> &Pr {
        &self.presenter
    }

    /// Mutable access to the presenter.
    pub fn presenter_mut(&mut self) -> &mut Pr {
        &mut self.presenter
    }
}
