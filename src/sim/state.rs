//! Game state
//!
//! The simulation context: every component of a run lives here and is passed
//! explicitly to the step functions. Nothing is global.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::camera::Camera;
use super::death_wall::DeathWall;
use super::difficulty::DifficultyCurve;
use super::events::{DeathReason, GameEvent};
use super::generator::{GeneratorView, StreamingGenerator};
use super::health::Health;
use super::input::InputLatch;
use super::jetpack::JetpackAbility;
use super::movement::PlayerMovement;
use super::physics::Body;
use super::session::Session;
use crate::highscores::HighScores;
use crate::tuning::Tuning;

/// Complete run state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Every random draw of the run comes from here
    pub rng: Pcg32,
    /// Fixed steps since the state was created
    pub time_ticks: u64,
    /// Unsimulated frame time (s)
    pub accumulator: f32,

    // === Player ===
    pub body: Body,
    pub movement: PlayerMovement,
    pub jetpack: JetpackAbility,
    pub health: Health,
    /// Feet position the player respawns at
    pub spawn_point: Vec2,

    // === World ===
    pub generator: StreamingGenerator,
    pub death_wall: DeathWall,
    pub camera: Camera,

    // === Session ===
    pub session: Session,
    pub high_scores: HighScores,
    pub input: InputLatch,
    /// Pending notifications, drained by the embedder
    pub events: Vec<GameEvent>,
}

/// Generator view over the current collaborators
pub fn generator_view<'a>(
    body: &Body,
    camera: &'a Camera,
    death_wall: &DeathWall,
    session: &Session,
) -> GeneratorView<'a> {
    GeneratorView {
        player: Some(body.aabb()),
        camera: Some(camera),
        death_wall_y: Some(death_wall.y),
        score: session.score(),
    }
}

impl GameState {
    /// Create a new game and start the first run
    pub fn new(seed: u64, tuning: Tuning, high_scores: HighScores) -> Self {
        let Tuning {
            difficulty,
            generator,
            death_wall,
            movement,
            jetpack,
            camera,
            health,
            session,
        } = tuning;

        let body = Body::new(Vec2::ZERO, movement.size, movement.mass);
        let mut generator = StreamingGenerator::new(generator, DifficultyCurve::new(difficulty));
        generator.init();

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            accumulator: 0.0,
            body,
            movement: PlayerMovement::new(movement),
            jetpack: JetpackAbility::new(jetpack),
            health: Health::new(health),
            spawn_point: Vec2::ZERO,
            generator,
            death_wall: DeathWall::new(death_wall),
            camera: Camera::new(camera),
            session: Session::new(session),
            high_scores,
            input: InputLatch::default(),
            events: Vec::new(),
        };

        state.reset_run();
        state
    }

    /// Tear down the current run and start a fresh one at the spawn point
    ///
    /// Safe to call at any time and any number of times: the player ends up
    /// standing on a new safety platform with the screen filled above it.
    pub fn reset_run(&mut self) {
        let half_height = self.body.half_extents.y;
        self.body.pos = self.spawn_point + Vec2::new(0.0, half_height);
        self.body.vel = Vec2::ZERO;

        self.movement.reset();
        self.jetpack.reset();
        self.health.reset();
        self.input.clear();
        self.accumulator = 0.0;

        self.camera.reset(self.body.pos);
        self.death_wall.reset(self.body.pos.y);
        self.session.start_run(&self.high_scores);

        let view = generator_view(&self.body, &self.camera, &self.death_wall, &self.session);
        if !self.generator.reset_run(&view, &mut self.rng) {
            log::warn!("Run reset without level: generator could not bind");
        }

        self.events.push(GameEvent::RunReset { seed: self.seed });
        self.events.push(GameEvent::FuelChanged {
            charges: self.jetpack.charges(),
            max_charges: self.jetpack.config.max_charges,
        });

        log::info!(
            "Run started: seed {}, {} spans, wall at {:.2}",
            self.seed,
            self.generator.span_count(),
            self.death_wall.y
        );
    }

    /// End the run once; repeated calls are ignored
    pub fn kill_player(&mut self, reason: DeathReason) {
        if !self.session.kill_player(reason, &self.high_scores) {
            return;
        }
        self.body.vel = Vec2::ZERO;
        self.events.push(GameEvent::PlayerDied {
            reason,
            score: self.session.final_score(),
        });
    }

    /// Enter the finished run on the leaderboard (at most once per run)
    pub fn submit_high_score(&mut self, name: &str) -> Option<usize> {
        self.session.submit_high_score(name, &mut self.high_scores)
    }

    /// Take every queued event
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::session::SessionPhase;

    fn new_state(seed: u64) -> GameState {
        GameState::new(seed, Tuning::default(), HighScores::new())
    }

    #[test]
    fn test_new_state_stands_on_safety_platform() {
        let state = new_state(7);
        let grid = state.generator.grid().unwrap();
        let feet = state.body.feet();

        let under = state.generator.spans().next().unwrap();
        assert_eq!(grid.row_top_y(under.row), feet.y);
        let platform = grid.range_aabb(under.row, under.cells);
        assert!(platform.min.x <= feet.x && feet.x <= platform.max.x);

        assert!(state.generator.frontier_y().unwrap() >= state.camera.top());
        assert_eq!(state.session.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_reset_run_is_idempotent() {
        let mut state = new_state(11);
        for _ in 0..3 {
            state.body.pos = Vec2::new(2.0, 40.0);
            state.reset_run();

            let grid = state.generator.grid().unwrap();
            let under = state.generator.spans().next().unwrap();
            assert_eq!(grid.row_top_y(under.row), state.body.feet().y);
            assert!(state.generator.frontier_y().unwrap() >= state.camera.top());
            assert_eq!(state.body.vel, Vec2::ZERO);
        }
    }

    #[test]
    fn test_kill_player_once() {
        let mut state = new_state(3);
        state.drain_events();
        state.kill_player(DeathReason::DeathWall);
        state.kill_player(DeathReason::Hazard);

        let deaths = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PlayerDied { .. }))
            .count();
        assert_eq!(deaths, 1);
    }
}
