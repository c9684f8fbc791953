#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wave Siege engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches or derived
//! events that adapters forward to the presentation layer.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Health assigned to enemies created from the default template.
pub const DEFAULT_MAX_HEALTH: f32 = 100.0;

/// Delay between an enemy's death and its removal from the world.
pub const DEFAULT_DESPAWN_DELAY: Duration = Duration::from_millis(300);

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Assigns or clears the template used to create enemies.
    ConfigureEnemyTemplate {
        /// Template to install, or `None` to leave the world without one.
        template: Option<EnemyTemplate>,
    },
    /// Bounds the number of enemies that may be live at the same time.
    ConfigureArena {
        /// Maximum number of live enemies accepted by the spawn service.
        capacity: u32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Allocates a new death-notification listener.
    OpenListener,
    /// Detaches a listener from every enemy so no further notifications address it.
    ReleaseListener {
        /// Listener being torn down.
        listener: ListenerId,
    },
    /// Requests creation of a single enemy.
    SpawnEnemy {
        /// Wave on whose behalf the enemy is requested.
        wave: WaveIndex,
        /// Placement chosen for the enemy.
        position: SpawnPoint,
        /// Listener subscribed to the enemy's death at creation time, if any.
        listener: Option<ListenerId>,
    },
    /// Subscribes an additional listener to an enemy's death notification.
    SubscribeDeath {
        /// Enemy whose death should be observed.
        enemy: EnemyId,
        /// Listener receiving the notification.
        listener: ListenerId,
    },
    /// Reduces an enemy's health by the provided amount.
    DamageEnemy {
        /// Enemy receiving the damage.
        enemy: EnemyId,
        /// Health removed from the enemy. Must be positive to take effect.
        amount: f32,
    },
}

/// Events broadcast by the world and the pure systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms allocation of a death-notification listener.
    ListenerOpened {
        /// Identifier assigned to the listener.
        listener: ListenerId,
    },
    /// Confirms that a listener was detached from every enemy.
    ListenerReleased {
        /// Identifier of the released listener.
        listener: ListenerId,
    },
    /// Confirms that an enemy was created by the spawn service.
    EnemySpawned {
        /// Identifier assigned to the new enemy.
        enemy: EnemyId,
        /// Wave on whose behalf the enemy was requested.
        wave: WaveIndex,
        /// Location the enemy occupies after spawning.
        position: SpawnPoint,
        /// Listener subscribed at creation, if any.
        listener: Option<ListenerId>,
    },
    /// Reports that a spawn request was refused by the spawn service.
    SpawnRejected {
        /// Wave on whose behalf the enemy was requested.
        wave: WaveIndex,
        /// Placement provided in the request.
        position: SpawnPoint,
        /// Listener named in the request, if any.
        listener: Option<ListenerId>,
        /// Specific reason the spawn failed.
        reason: SpawnRejection,
    },
    /// Reports that an enemy survived a damage application.
    EnemyDamaged {
        /// Enemy that received damage.
        enemy: EnemyId,
        /// Health remaining after the damage was applied.
        remaining: f32,
    },
    /// Announces that an enemy transitioned to its terminal dead state.
    EnemyDied {
        /// Enemy that died.
        enemy: EnemyId,
    },
    /// Death notification addressed to a single subscribed listener.
    DeathNotified {
        /// Enemy that died.
        enemy: EnemyId,
        /// Listener the notification is addressed to.
        listener: ListenerId,
    },
    /// Confirms that a dead enemy was removed from the world.
    EnemyDespawned {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
    /// Reports a transition of the wave sequencer.
    PhaseChanged {
        /// Phase that was active before the transition.
        from: Phase,
        /// Phase that is active after the transition.
        to: Phase,
    },
    /// Announces the upcoming wave while its warning is displayed.
    WaveAnnounced {
        /// Wave that is about to start.
        wave: WaveIndex,
    },
    /// Announces that the spawn burst of a wave was issued.
    WaveStarted {
        /// Wave that started.
        wave: WaveIndex,
        /// Number of spawn attempts issued for the wave.
        requested: u32,
    },
    /// Announces that every enemy of a wave has died.
    WaveCompleted {
        /// Wave that was cleared.
        wave: WaveIndex,
    },
    /// Reports the cumulative kill total after a counted death.
    KillCountChanged {
        /// Kills accumulated since the encounter started.
        total_kills: u32,
    },
    /// Announces that the wave cap was reached and no further waves will spawn.
    EncounterCompleted,
    /// Announces that the encounter stopped because of a configuration error.
    EncounterHalted {
        /// Error that stopped the encounter.
        reason: HaltReason,
    },
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Non-owning handle naming a subscriber to enemy death notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(u32);

impl ListenerId {
    /// Creates a new listener identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based index of a wave within an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveIndex(u32);

impl WaveIndex {
    /// Index of the opening wave.
    pub const FIRST: Self = Self(1);

    /// Creates a new wave index wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for WaveIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Immutable description of a single wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wave {
    index: WaveIndex,
    enemy_count: u32,
}

impl Wave {
    /// Creates a wave with the provided index and target enemy count.
    #[must_use]
    pub const fn new(index: WaveIndex, enemy_count: u32) -> Self {
        Self { index, enemy_count }
    }

    /// Position of the wave within the encounter.
    #[must_use]
    pub const fn index(&self) -> WaveIndex {
        self.index
    }

    /// Number of spawn attempts the wave performs.
    #[must_use]
    pub const fn enemy_count(&self) -> u32 {
        self.enemy_count
    }
}

/// Location in world units where an enemy is placed.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SpawnPoint {
    x: f32,
    y: f32,
    z: f32,
}

impl SpawnPoint {
    /// Creates a new spawn point.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Horizontal coordinate along the x axis.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Horizontal coordinate along the z axis.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Reports whether every coordinate is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Blueprint used by the spawn service to create enemies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    max_health: f32,
    despawn_delay: Duration,
}

impl EnemyTemplate {
    /// Creates a template with explicit health and despawn delay.
    #[must_use]
    pub const fn new(max_health: f32, despawn_delay: Duration) -> Self {
        Self {
            max_health,
            despawn_delay,
        }
    }

    /// Health assigned to freshly spawned enemies.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Time dead enemies linger for death effects before removal.
    #[must_use]
    pub const fn despawn_delay(&self) -> Duration {
        self.despawn_delay
    }

    /// Reports whether spawned enemies could ever die: health must be finite and positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.max_health.is_finite() && self.max_health > 0.0
    }
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HEALTH, DEFAULT_DESPAWN_DELAY)
    }
}

/// States of the wave sequencer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Settling before the first wave.
    Idle,
    /// Announcing the upcoming wave.
    Warning,
    /// Issuing the spawn burst of the current wave.
    Spawning,
    /// Waiting for every enemy of the current wave to die.
    AwaitingClear,
    /// Resting between two waves.
    Intermission,
    /// Wave cap reached; no further work is scheduled.
    Complete,
    /// Stopped because of a configuration error; no further work is scheduled.
    Halted,
}

impl Phase {
    /// Reports whether the phase ends the encounter.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Halted)
    }
}

/// Configuration errors that stop an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum HaltReason {
    /// The world has no enemy template, so spawning cannot produce enemies.
    #[error("no enemy template is configured")]
    MissingTemplate,
}

/// Reasons a spawn request may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SpawnRejection {
    /// No enemy template is configured.
    #[error("no enemy template is configured")]
    MissingTemplate,
    /// The arena already holds its maximum number of live enemies.
    #[error("arena capacity exhausted")]
    CapacityExhausted,
    /// The requested position contains non-finite coordinates.
    #[error("spawn position is not finite")]
    InvalidPosition,
}

/// Read-only counters describing the population of an encounter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PopulationView {
    alive: u32,
    total_kills: u32,
}

impl PopulationView {
    /// Captures a population snapshot.
    #[must_use]
    pub const fn new(alive: u32, total_kills: u32) -> Self {
        Self { alive, total_kills }
    }

    /// Number of registered enemies that are still alive.
    #[must_use]
    pub const fn alive(&self) -> u32 {
        self.alive
    }

    /// Kills counted since the encounter started.
    #[must_use]
    pub const fn total_kills(&self) -> u32 {
        self.total_kills
    }

    /// Reports whether no registered enemy remains alive.
    #[must_use]
    pub const fn is_wave_cleared(&self) -> bool {
        self.alive == 0
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Wave on whose behalf the enemy was spawned.
    pub wave: WaveIndex,
    /// Location the enemy was spawned at.
    pub position: SpawnPoint,
    /// Remaining health.
    pub health: f32,
    /// Whether the enemy reached its terminal state.
    pub is_dead: bool,
}

/// Read-only snapshot describing all enemies present in the world.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}
