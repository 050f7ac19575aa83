//! Sky Climber headless runner
//!
//! Plays seeded runs with the autopilot at a fixed frame rate and logs what
//! happens. Useful for balance checks and for reproducing a seed.

use std::path::PathBuf;

use clap::Parser;

use sky_climber::sim::{Autopilot, DeathReason, GameEvent, GameState, frame};
use sky_climber::{HighScores, Tuning};

#[derive(Debug, Parser)]
#[command(name = "sky-climber", about = "Headless autopilot runs of the platformer core")]
struct Args {
    /// Run seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of runs to play
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Give up on a run after this many simulated seconds
    #[arg(long, default_value_t = 120.0)]
    max_seconds: f32,

    /// Frames per simulated second
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Balance file (JSON); defaults are used when absent
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Leaderboard file
    #[arg(long, default_value = "highscores.json")]
    highscores: PathBuf,

    /// Name entered for qualifying scores
    #[arg(long, default_value = "BOT")]
    name: String,
}

struct RunSummary {
    reason: Option<DeathReason>,
    score: u32,
    jumps: u32,
    boosts: u32,
    pickups: u32,
}

fn play_run(state: &mut GameState, args: &Args) -> RunSummary {
    let frame_dt = 1.0 / args.fps.max(1.0);
    let max_frames = (args.max_seconds / frame_dt).ceil() as u64;
    let mut pilot = Autopilot::new();
    let mut summary = RunSummary {
        reason: None,
        score: 0,
        jumps: 0,
        boosts: 0,
        pickups: 0,
    };

    for _ in 0..max_frames {
        let input = pilot.drive(state);
        frame(state, &input, frame_dt);

        for event in state.drain_events() {
            match event {
                GameEvent::Jumped { .. } | GameEvent::WallJumped { .. } => summary.jumps += 1,
                GameEvent::JetpackBoost { .. } => summary.boosts += 1,
                GameEvent::PickupCollected { .. } => summary.pickups += 1,
                GameEvent::PlayerDied { reason, score } => {
                    summary.reason = Some(reason);
                    summary.score = score;
                }
                _ => {}
            }
        }

        if summary.reason.is_some() {
            break;
        }
    }

    if summary.reason.is_none() {
        summary.score = state.session.displayed_score();
    }
    summary
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("Sky Climber (headless) starting, seed {}", args.seed);

    let tuning = match &args.tuning {
        Some(path) => Tuning::load_or_default(path),
        None => Tuning::default(),
    };
    let high_scores = HighScores::load_or_reset(&args.highscores);

    let mut state = GameState::new(args.seed, tuning, high_scores);

    for run in 0..args.runs {
        if run > 0 {
            state.reset_run();
        }
        let summary = play_run(&mut state, &args);

        let reason = summary.reason.map_or("Survived", DeathReason::as_str);
        println!(
            "run {:>3}: score {:>6}  ({}; {} jumps, {} boosts, {} pickups)",
            run + 1,
            summary.score,
            reason,
            summary.jumps,
            summary.boosts,
            summary.pickups
        );

        if let Some(rank) = state.submit_high_score(&args.name) {
            println!("         new high score, rank {}", rank);
            if let Err(err) = state.high_scores.save(&args.highscores) {
                log::warn!("Could not save high scores: {}", err);
            }
        }
    }

    println!("\nHigh scores:");
    for (i, entry) in state.high_scores.entries.iter().enumerate() {
        println!("{:>2}. {} {:>6}", i + 1, entry.name, entry.score);
    }
}
