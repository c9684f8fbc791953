#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless wave encounter.
//!
//! A scripted damage source hits the oldest live enemy once per tick, so the
//! encounter progresses without any player input. Heads-up display text is
//! reported through the log.

mod presenter;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wave_siege_core::{EnemyId, Phase};
use wave_siege_encounter::{Encounter, EncounterConfig};
use wave_siege_world::{query, World};

use crate::presenter::LogPresenter;

/// Runs a headless wave encounter.
#[derive(Debug, Parser)]
#[command(name = "wave-siege", version, about)]
struct CliArgs {
    /// TOML file with encounter tuning.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Overrides the number of waves in the encounter.
    #[arg(long, value_name = "N")]
    max_waves: Option<u32>,
    /// Overrides the placement seed.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
    /// Simulated milliseconds per tick.
    #[arg(long, value_name = "N", default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,
    /// Damage dealt to the oldest live enemy each tick.
    #[arg(long, value_name = "F", default_value_t = 50.0)]
    damage_per_tick: f32,
    /// Number of ticks after which the run gives up.
    #[arg(long, value_name = "N", default_value_t = 100_000)]
    max_ticks: u64,
}

/// Summary of a finished run.
#[derive(Debug, PartialEq, Eq)]
struct RunSummary {
    phase: Phase,
    ticks: u64,
    waves_cleared: u32,
    total_kills: u32,
}

/// Entry point for the wave siege command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();
    let config = load_config(&args)?;

    let summary = run(&config, &args)?;
    println!(
        "{:?} after {} ticks: {} waves cleared, {} kills",
        summary.phase, summary.ticks, summary.waves_cleared, summary.total_kills
    );

    if summary.phase == Phase::Halted {
        bail!("encounter halted before completing");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(args: &CliArgs) -> Result<EncounterConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            EncounterConfig::from_toml_str(&text)
                .with_context(|| format!("invalid encounter configuration in {}", path.display()))?
        }
        None => EncounterConfig::default(),
    };

    if let Some(max_waves) = args.max_waves {
        config.max_waves = max_waves;
    }
    if let Some(seed) = args.seed {
        config.placement_seed = seed;
    }
    config
        .validate()
        .context("invalid encounter configuration")?;
    Ok(config)
}

fn run(config: &EncounterConfig, args: &CliArgs) -> Result<RunSummary> {
    ensure!(
        args.damage_per_tick.is_finite() && args.damage_per_tick > 0.0,
        "damage per tick must be a positive number, got {}",
        args.damage_per_tick
    );

    let mut world = World::new();
    let mut encounter = Encounter::new(&mut world, config, LogPresenter::default())
        .context("failed to start the encounter")?;
    let dt = Duration::from_millis(args.tick_ms);

    let mut ticks = 0;
    while ticks < args.max_ticks && !encounter.phase().is_terminal() {
        ticks += 1;
        let _ = encounter.advance(&mut world, dt);
        if let Some(target) = oldest_live_enemy(&world) {
            let _ = encounter.damage(&mut world, target, args.damage_per_tick);
        }
    }

    if encounter.phase().is_terminal() {
        info!(ticks, phase = ?encounter.phase(), "encounter finished");
    } else {
        warn!(ticks, phase = ?encounter.phase(), "tick budget exhausted");
    }

    let presenter = encounter.presenter();
    Ok(RunSummary {
        phase: encounter.phase(),
        ticks,
        waves_cleared: presenter.waves_cleared(),
        total_kills: presenter.total_kills(),
    })
}

fn oldest_live_enemy(world: &World) -> Option<EnemyId> {
    query::enemy_view(world)
        .iter()
        .find(|snapshot| !snapshot.is_dead)
        .map(|snapshot| snapshot.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let argv = std::iter::once("wave-siege").chain(extra.iter().copied());
        CliArgs::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn scripted_damage_completes_a_short_encounter() {
        let args = args(&["--max-waves", "3", "--tick-ms", "250", "--damage-per-tick", "500"]);
        let config = load_config(&args).expect("valid config");

        let summary = run(&config, &args).expect("run succeeds");

        assert_eq!(summary.phase, Phase::Complete);
        assert_eq!(summary.waves_cleared, 3);
        assert_eq!(summary.total_kills, 3 + 4 + 5);
    }

    #[test]
    fn tick_budget_bounds_the_run() {
        let args = args(&["--max-ticks", "5", "--damage-per-tick", "1"]);
        let config = load_config(&args).expect("valid config");

        let summary = run(&config, &args).expect("run succeeds");

        assert_eq!(summary.ticks, 5);
        assert!(!summary.phase.is_terminal());
    }

    #[test]
    fn overrides_are_validated() {
        assert!(load_config(&args(&["--max-waves", "0"])).is_err());
        assert!(CliArgs::try_parse_from(["wave-siege", "--tick-ms", "0"]).is_err());

        let args = args(&["--damage-per-tick=-3"]);
        let config = load_config(&args).expect("valid config");
        assert!(run(&config, &args).is_err());
    }

    #[test]
    fn damage_targets_the_oldest_live_enemy() {
        let mut world = World::new();
        assert_eq!(oldest_live_enemy(&world), None);

        let config = EncounterConfig {
            enemies_per_wave: 2,
            ..EncounterConfig::default()
        };
        let mut encounter = Encounter::new(&mut world, &config, LogPresenter::default())
            .expect("valid encounter");
        let _ = encounter.advance(&mut world, Duration::from_secs(3));

        let first = oldest_live_enemy(&world).expect("enemies spawned");
        let _ = encounter.damage(&mut world, first, 1_000.0);
        let second = oldest_live_enemy(&world).expect("one enemy left");
        assert!(second > first);
    }
}
