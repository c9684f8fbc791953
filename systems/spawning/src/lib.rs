#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement strategies that choose where spawned enemies appear.

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitBall};
use wave_siege_core::SpawnPoint;

/// Chooses a position for each spawn attempt.
pub trait Placement {
    /// Produces the position of the next spawn attempt.
    fn next_point(&mut self) -> SpawnPoint;
}

impl<P: Placement + ?Sized> Placement for Box<P> {
    fn next_point(&mut self) -> SpawnPoint {
        (**self).next_point()
    }
}

impl<P: Placement + ?Sized> Placement for &mut P {
    fn next_point(&mut self) -> SpawnPoint {
        (**self).next_point()
    }
}

/// Configuration parameters required to construct a [`RadialPlacement`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    origin: SpawnPoint,
    radius: f32,
    height: f32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration around `origin`.
    #[must_use]
    pub const fn new(origin: SpawnPoint, radius: f32, height: f32, rng_seed: u64) -> Self {
        Self {
            origin,
            radius,
            height,
            rng_seed,
        }
    }
}

/// Seeded placement that scatters enemies inside a sphere around the origin
/// and pins them to a constant height.
#[derive(Clone, Debug)]
pub struct RadialPlacement {
    origin: Vec3,
    radius: f32,
    height: f32,
    rng: ChaCha8Rng,
}

impl RadialPlacement {
    /// Creates a placement strategy from the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let origin = config.origin;
        Self {
            origin: Vec3::new(origin.x(), origin.y(), origin.z()),
            radius: config.radius.max(0.0),
            height: config.height,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }
}

impl Placement for RadialPlacement {
    fn next_point(&mut self) -> SpawnPoint {
        let offset: [f32; 3] = UnitBall.sample(&mut self.rng);
        let point = self.origin + Vec3::from_array(offset) * self.radius;
        SpawnPoint::new(point.x, self.height, point.z)
    }
}

/// Deterministic placement cycling through a fixed list of points.
#[derive(Clone, Debug, Default)]
pub struct FixedPlacement {
    points: Vec<SpawnPoint>,
    cursor: usize,
}

impl FixedPlacement {
    /// Creates a placement that repeats `points` in order.
    ///
    /// An empty list places every enemy at the world origin.
    #[must_use]
    pub fn new(points: Vec<SpawnPoint>) -> Self {
        Self { points, cursor: 0 }
    }
}

impl Placement for FixedPlacement {
    fn next_point(&mut self) -> SpawnPoint {
        if self.points.is_empty() {
            return SpawnPoint::default();
        }
        let point = self.points[self.cursor % self.points.len()];
        self.cursor = (self.cursor + 1) % self.points.len();
        point
    }
}
