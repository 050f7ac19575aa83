//! Run session: score, death and the game-over handoff
//!
//! Score is survival time in seconds while playing. The displayed score is
//! `floor(score * 10)`, which is also what the leaderboard stores.

use serde::{Deserialize, Serialize};

use super::events::DeathReason;
use crate::highscores::HighScores;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Player dies this far below the camera's bottom edge
    pub offscreen_death_margin: f32,
    /// Length of the death sequence before game over (s)
    pub death_sequence_seconds: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            offscreen_death_margin: 0.5,
            death_sequence_seconds: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    /// Death sequence running; input and scoring frozen
    Dying { timer: f32 },
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub config: SessionConfig,
    phase: SessionPhase,
    /// Seconds survived this run
    score: f32,
    final_score: u32,
    death_reason: Option<DeathReason>,
    /// Best stored score when the run started
    saved_top_score: u32,
    pending_high_score: bool,
    pending_new_best: bool,
}

/// Displayed integer score for a raw score
pub fn display_score(score: f32) -> u32 {
    (score.max(0.0) * 10.0).floor() as u32
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: SessionPhase::Playing,
            score: 0.0,
            final_score: 0,
            death_reason: None,
            saved_top_score: 0,
            pending_high_score: false,
            pending_new_best: false,
        }
    }

    /// Begin a new run against the current leaderboard
    pub fn start_run(&mut self, high_scores: &HighScores) {
        self.phase = SessionPhase::Playing;
        self.score = 0.0;
        self.final_score = 0;
        self.death_reason = None;
        self.saved_top_score = high_scores.top_score().unwrap_or(0);
        self.pending_high_score = false;
        self.pending_new_best = false;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn displayed_score(&self) -> u32 {
        display_score(self.score)
    }

    /// Live best: stored top score or the current run, whichever is higher
    pub fn runtime_high_score(&self) -> u32 {
        self.saved_top_score.max(self.displayed_score())
    }

    pub fn final_score(&self) -> u32 {
        self.final_score
    }

    pub fn death_reason(&self) -> Option<DeathReason> {
        self.death_reason
    }

    pub fn pending_high_score(&self) -> bool {
        self.pending_high_score
    }

    pub fn pending_new_best(&self) -> bool {
        self.pending_new_best
    }

    /// Accumulate survival time and run the death countdown
    pub fn step(&mut self, dt: f32) {
        match self.phase {
            SessionPhase::Playing => self.score += dt,
            SessionPhase::Dying { timer } => {
                let timer = timer - dt;
                self.phase = if timer <= 0.0 {
                    log::info!("Game over: final score {}", self.final_score);
                    SessionPhase::GameOver
                } else {
                    SessionPhase::Dying { timer }
                };
            }
            SessionPhase::GameOver => {}
        }
    }

    /// Whether the player is below the camera's bottom edge by the margin
    pub fn is_offscreen(&self, player_y: f32, camera_bottom: f32) -> bool {
        player_y < camera_bottom - self.config.offscreen_death_margin
    }

    /// End the run. Only the first call per run has an effect.
    pub fn kill_player(&mut self, reason: DeathReason, high_scores: &HighScores) -> bool {
        if !self.is_playing() {
            return false;
        }

        self.final_score = self.displayed_score();
        self.death_reason = Some(reason);
        self.pending_high_score = high_scores.qualifies(self.final_score);
        self.pending_new_best = self.final_score > self.saved_top_score;
        self.phase = SessionPhase::Dying {
            timer: self.config.death_sequence_seconds,
        };

        log::info!(
            "Player died ({}): score {}, high score {}, new best {}",
            reason,
            self.final_score,
            self.pending_high_score,
            self.pending_new_best
        );
        true
    }

    /// Record the final score under `name`. Inserts at most once per run.
    pub fn submit_high_score(&mut self, name: &str, high_scores: &mut HighScores) -> Option<usize> {
        if !self.pending_high_score {
            return None;
        }
        self.pending_high_score = false;
        let rank = high_scores.add_score(name, self.final_score);
        if let Some(top) = high_scores.top_score() {
            self.saved_top_score = self.saved_top_score.max(top);
        }
        rank
    }
}
