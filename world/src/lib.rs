#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Wave Siege.
//!
//! The world owns every enemy, its health, and the registry of listeners
//! subscribed to enemy deaths. Listeners are plain identifiers, so the world
//! never holds a reference back into the systems observing it.

use std::{collections::BTreeSet, time::Duration};

use tracing::{debug, warn};
use wave_siege_core::{
    Command, EnemyId, EnemyTemplate, Event, ListenerId, SpawnPoint, SpawnRejection, WaveIndex,
};

/// Default number of enemies that may be live at the same time.
pub const DEFAULT_ARENA_CAPACITY: u32 = 512;

/// Result of applying damage to a [`Health`] value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DamageOutcome {
    /// The damage had no effect because the target is dead or the amount was not positive.
    Ignored,
    /// The target absorbed the damage and is still alive.
    Survived {
        /// Health remaining after the damage.
        remaining: f32,
    },
    /// The damage crossed the death threshold. Reported at most once per value.
    Died,
}

/// Mutable health of a single enemy with a write-once terminal state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Health {
    current: f32,
    is_dead: bool,
}

impl Health {
    /// Creates a living health value.
    #[must_use]
    pub const fn new(max_health: f32) -> Self {
        Self {
            current: max_health,
            is_dead: false,
        }
    }

    /// Remaining health.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Whether the terminal state was reached.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.is_dead
    }

    /// Subtracts `amount` from the health and reports whether it crossed zero.
    ///
    /// Non-positive and non-finite amounts are ignored so health only ever
    /// decreases. Once dead, every later call returns [`DamageOutcome::Ignored`].
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.is_dead || !amount.is_finite() || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }

        self.current -= amount;
        if self.current <= 0.0 {
            self.is_dead = true;
            return DamageOutcome::Died;
        }

        DamageOutcome::Survived {
            remaining: self.current,
        }
    }
}

/// Represents the authoritative Wave Siege world state.
#[derive(Debug)]
pub struct World {
    template: Option<EnemyTemplate>,
    capacity: u32,
    enemies: Vec<Enemy>,
    listeners: BTreeSet<ListenerId>,
    next_enemy: u32,
    next_listener: u32,
    tick_index: u64,
}

impl World {
    /// Creates a world with the default enemy template and arena capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            template: Some(EnemyTemplate::default()),
            capacity: DEFAULT_ARENA_CAPACITY,
            enemies: Vec::new(),
            listeners: BTreeSet::new(),
            next_enemy: 0,
            next_listener: 0,
            tick_index: 0,
        }
    }

    fn enemy_mut(&mut self, enemy: EnemyId) -> Option<&mut Enemy> {
        self.enemies
            .binary_search_by_key(&enemy, |candidate| candidate.id)
            .ok()
            .map(|index| &mut self.enemies[index])
    }

    fn enemy(&self, enemy: EnemyId) -> Option<&Enemy> {
        self.enemies
            .binary_search_by_key(&enemy, |candidate| candidate.id)
            .ok()
            .map(|index| &self.enemies[index])
    }

    fn live_count(&self) -> u32 {
        let live = self
            .enemies
            .iter()
            .filter(|enemy| !enemy.health.is_dead())
            .count();
        u32::try_from(live).unwrap_or(u32::MAX)
    }

    fn spawn(
        &mut self,
        wave: WaveIndex,
        position: SpawnPoint,
        listener: Option<ListenerId>,
    ) -> Result<EnemyId, SpawnRejection> {
        let template = self.template.ok_or(SpawnRejection::MissingTemplate)?;
        if !position.is_finite() {
            return Err(SpawnRejection::InvalidPosition);
        }
        if self.live_count() >= self.capacity {
            return Err(SpawnRejection::CapacityExhausted);
        }

        let id = EnemyId::new(self.next_enemy);
        self.next_enemy = self.next_enemy.wrapping_add(1);

        let subscribers = listener.into_iter().collect();
        self.enemies.push(Enemy {
            id,
            wave,
            position,
            health: Health::new(template.max_health()),
            despawn_delay: template.despawn_delay(),
            despawn_in: None,
            subscribers,
        });
        Ok(id)
    }

    fn advance_despawns(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut despawned = Vec::new();
        for enemy in &mut self.enemies {
            if let Some(remaining) = enemy.despawn_in.as_mut() {
                *remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    despawned.push(enemy.id);
                }
            }
        }

        if despawned.is_empty() {
            return;
        }

        self.enemies.retain(|enemy| !despawned.contains(&enemy.id));
        for enemy in despawned {
            out_events.push(Event::EnemyDespawned { enemy });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureEnemyTemplate { template } => {
            if let Some(rejected) = template.filter(|template| !template.is_valid()) {
                warn!(
                    max_health = rejected.max_health(),
                    "enemy template rejected; keeping the current one"
                );
                return;
            }
            world.template = template;
        }
        Command::ConfigureArena { capacity } => {
            world.capacity = capacity;
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_despawns(dt, out_events);
        }
        Command::OpenListener => {
            let listener = ListenerId::new(world.next_listener);
            world.next_listener = world.next_listener.wrapping_add(1);
            let _ = world.listeners.insert(listener);
            out_events.push(Event::ListenerOpened { listener });
        }
        Command::ReleaseListener { listener } => {
            if !world.listeners.remove(&listener) {
                return;
            }
            for enemy in &mut world.enemies {
                enemy.subscribers.retain(|subscriber| *subscriber != listener);
            }
            out_events.push(Event::ListenerReleased { listener });
        }
        Command::SpawnEnemy {
            wave,
            position,
            listener,
        } => {
            let listener = listener.filter(|listener| world.listeners.contains(listener));
            match world.spawn(wave, position, listener) {
                Ok(enemy) => out_events.push(Event::EnemySpawned {
                    enemy,
                    wave,
                    position,
                    listener,
                }),
                Err(reason) => {
                    debug!(wave = wave.get(), %reason, "spawn request rejected");
                    out_events.push(Event::SpawnRejected {
                        wave,
                        position,
                        listener,
                        reason,
                    });
                }
            }
        }
        Command::SubscribeDeath { enemy, listener } => {
            if !world.listeners.contains(&listener) {
                return;
            }
            if let Some(enemy) = world.enemy_mut(enemy) {
                if !enemy.health.is_dead() && !enemy.subscribers.contains(&listener) {
                    enemy.subscribers.push(listener);
                }
            }
        }
        Command::DamageEnemy { enemy, amount } => {
            let Some(target) = world.enemy_mut(enemy) else {
                return;
            };

            match target.health.apply_damage(amount) {
                DamageOutcome::Ignored => {}
                DamageOutcome::Survived { remaining } => {
                    out_events.push(Event::EnemyDamaged { enemy, remaining });
                }
                DamageOutcome::Died => {
                    target.despawn_in = Some(target.despawn_delay);
                    out_events.push(Event::EnemyDied { enemy });
                    for listener in target.subscribers.drain(..) {
                        out_events.push(Event::DeathNotified { enemy, listener });
                    }
                }
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use wave_siege_core::{EnemyId, EnemySnapshot, EnemyTemplate, EnemyView, ListenerId};

    /// Captures the state of a single enemy, if it is still present.
    #[must_use]
    pub fn enemy(world: &World, enemy: EnemyId) -> Option<EnemySnapshot> {
        world.enemy(enemy).map(super::Enemy::snapshot)
    }

    /// Captures a read-only view of every enemy present in the world.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(super::Enemy::snapshot).collect())
    }

    /// Number of enemies that are present and not dead.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> u32 {
        world.live_count()
    }

    /// Template used by the spawn service, if one is configured.
    #[must_use]
    pub fn enemy_template(world: &World) -> Option<EnemyTemplate> {
        world.template
    }

    /// Maximum number of live enemies accepted by the spawn service.
    #[must_use]
    pub fn arena_capacity(world: &World) -> u32 {
        world.capacity
    }

    /// Listeners currently subscribed to the enemy's death notification.
    #[must_use]
    pub fn death_subscribers(world: &World, enemy: EnemyId) -> &[ListenerId] {
        world
            .enemy(enemy)
            .map_or(&[], |enemy| enemy.subscribers.as_slice())
    }

    /// Reports whether the listener is open and may still receive notifications.
    #[must_use]
    pub fn is_listener_open(world: &World, listener: ListenerId) -> bool {
        world.listeners.contains(&listener)
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    wave: WaveIndex,
    position: SpawnPoint,
    health: Health,
    despawn_delay: Duration,
    despawn_in: Option<Duration>,
    subscribers: Vec<ListenerId>,
}

impl Enemy {
    fn snapshot(&self) -> wave_siege_core::EnemySnapshot {
        wave_siege_core::EnemySnapshot {
            id: self.id,
            wave: self.wave,
            position: self.position,
            health: self.health.current(),
            is_dead: self.health.is_dead(),
        }
    }
}
