//! Asteroid Agent entry point
//!
//! Runs headless episodes with the built-in auto-aim policy at the fixed
//! simulation timestep and reports the returns.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;

use asteroid_agent::agent::{HeuristicPolicy, Policy};
use asteroid_agent::consts::SIM_DT;
use asteroid_agent::sim::{Episode, EpisodeSummary, RewardBreakdown, tick};
use asteroid_agent::{BoundaryPolicy, ReturnBoard, Settings};

#[derive(Parser, Debug)]
#[command(name = "asteroid-agent")]
#[command(about = "Headless Asteroids episodes for policy evaluation")]
struct Args {
    /// Number of episodes to run
    #[arg(long, default_value = "10")]
    episodes: u64,

    /// RNG seed
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Settings JSON file (defaults when omitted)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Override the boundary policy ("clamp" or "terminate")
    #[arg(long)]
    boundary: Option<String>,

    /// Override the per-episode tick limit (0 = unlimited)
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Disable auto-aim (the ship then idles)
    #[arg(long)]
    no_auto_aim: bool,

    /// Load and update a return board at this path
    #[arg(long)]
    board: Option<PathBuf>,

    /// Check registry/physics invariants every tick
    #[arg(long)]
    check_invariants: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    policy: &'static str,
    seed: u64,
    episodes: u64,
    total_ticks: u64,
    mean_return: f32,
    best_return: Option<f32>,
    asteroids_destroyed: u32,
    breakdown: RewardBreakdown,
    results: Vec<EpisodeSummary>,
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(name) = &args.boundary {
        settings.boundary = BoundaryPolicy::from_str(name)
            .ok_or_else(|| anyhow!("unknown boundary policy '{name}'"))?;
    }
    if let Some(limit) = args.max_ticks {
        settings.max_episode_ticks = limit;
    }
    Ok(settings)
}

/// Summaries kept in memory up front; longer runs grow the vector as needed
const PREALLOCATED_SUMMARIES: u64 = 1024;

fn summary_capacity(episodes: u64) -> usize {
    episodes.min(PREALLOCATED_SUMMARIES) as usize
}

fn run(args: &Args) -> Result<RunSummary> {
    if args.episodes == 0 {
        return Err(anyhow!("episodes must be > 0"));
    }

    let settings = load_settings(args)?;
    if settings.max_episode_ticks == 0 {
        log::warn!("No tick limit: episodes only end on collision or leaving the level");
    }

    let mut board = match &args.board {
        Some(path) => ReturnBoard::load(path)
            .with_context(|| format!("failed to load return board {}", path.display()))?,
        None => ReturnBoard::new(),
    };

    let mut policy = if args.no_auto_aim {
        HeuristicPolicy::manual()
    } else {
        HeuristicPolicy::auto_aim()
    };
    let mut episode = Episode::try_new(settings, args.seed).context("invalid settings")?;
    policy.on_episode_begin(episode.episode_index);

    let mut results = Vec::with_capacity(summary_capacity(args.episodes));
    while (results.len() as u64) < args.episodes {
        let outcome = tick(&mut episode, &mut policy, SIM_DT);
        if args.check_invariants {
            episode.check_invariants().map_err(|violation| {
                anyhow!("invariant failure at tick {}: {violation}", episode.total_ticks)
            })?;
        }
        if let Some(summary) = outcome.finished {
            if let Some(rank) = board.add(&summary) {
                log::info!("Episode {} placed #{} on the board", summary.episode, rank);
            }
            results.push(summary);
        }
    }

    if let Some(path) = &args.board {
        board
            .save(path)
            .with_context(|| format!("failed to save return board {}", path.display()))?;
    }

    let mut breakdown = RewardBreakdown::default();
    for r in &results {
        breakdown.position += r.breakdown.position;
        breakdown.movement += r.breakdown.movement;
        breakdown.turning += r.breakdown.turning;
        breakdown.shooting += r.breakdown.shooting;
        breakdown.destruction += r.breakdown.destruction;
    }
    let total_return: f32 = results.iter().map(|r| r.episode_return).sum();

    Ok(RunSummary {
        policy: policy.id(),
        seed: args.seed,
        episodes: args.episodes,
        total_ticks: episode.total_ticks,
        mean_return: total_return / results.len() as f32,
        best_return: board.best().map(|e| e.episode_return),
        asteroids_destroyed: results.iter().map(|r| r.stats.asteroids_destroyed).sum(),
        breakdown,
        results,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    log::info!("Asteroid Agent starting ({} episodes, seed {})", args.episodes, args.seed);

    let summary = run(&args)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_episode_count_does_not_preallocate() {
        let args = Args::parse_from(["asteroid-agent", "--episodes", "18446744073709551615"]);
        assert_eq!(args.episodes, u64::MAX);
        assert_eq!(summary_capacity(args.episodes), 1024);
        assert_eq!(summary_capacity(3), 3);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = Args::parse_from(["asteroid-agent", "--boundary", "bounce"]);
        assert!(load_settings(&args).is_err());
    }

    #[test]
    fn test_short_run_summarizes_every_episode() {
        let args = Args::parse_from(["asteroid-agent", "--episodes", "2", "--max-ticks", "20", "--check-invariants"]);
        let summary = run(&args).unwrap();
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.total_ticks, 40);
        assert_eq!(summary.policy, "heuristic-auto-aim");
    }
}
