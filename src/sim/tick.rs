//! Simulation steps
//!
//! Two independently clocked steps drive a run:
//! - `tick`: one fixed physics step (`SIM_DT`): movement, jetpack, collision,
//!   hazards and pickups
//! - `frame`: one variable-rate frame: input sampling, the fixed-step
//!   accumulator, then camera, death wall, level streaming and scoring

use super::events::{DeathReason, GameEvent};
use super::health::DamageOutcome;
use super::hazards::SpawnedObject;
use super::input::FrameInput;
use super::movement::JumpKind;
use super::physics::{ContactSide, SolidOwner, SolidSet, move_and_collide};
use super::state::{GameState, generator_view};
use crate::consts::*;

/// Longest frame the accumulator accepts (s)
const MAX_FRAME_DT: f32 = 0.1;

/// Damage dealt by spikes and lasers
const HAZARD_DAMAGE: u32 = 1;

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, dt: f32) {
    // Frozen while dying or on the game over screen
    if !state.session.is_playing() {
        state.input.consume_edges();
        return;
    }

    state.time_ticks += 1;
    let step = state.time_ticks;
    let input = state.input.step_input();

    let mut solids = SolidSet::new();
    state.generator.collect_solids(&mut solids);

    // Movement FSM writes the velocity for this step
    match state
        .movement
        .step(&mut state.body, &input, &solids, step, dt)
    {
        Some(JumpKind::Ground) => state.events.push(GameEvent::Jumped {
            pos: state.body.feet(),
        }),
        Some(JumpKind::Wall { wall_direction }) => state.events.push(GameEvent::WallJumped {
            pos: state.body.pos,
            wall_direction,
        }),
        None => {}
    }

    // Jetpack shares the jump press; it refuses a step the controller jumped on
    state.jetpack.update(&input, dt);
    if input.jump_pressed {
        let pos = state.body.pos;
        let boosted = state.jetpack.try_boost(
            &mut state.body.vel,
            pos,
            state.movement.status(),
            step,
            &mut state.events,
        );
        if boosted.is_ok() {
            state.movement.consume_jump_buffer();
        }
    }

    // Integrate and resolve
    let contacts = move_and_collide(&mut state.body, &solids, dt);
    for contact in contacts {
        if let (SolidOwner::Falling(id), ContactSide::Top) = (contact.owner, contact.side) {
            if state.generator.trigger_falling(id) {
                state.events.push(GameEvent::PlatformTriggered { id });
            }
        }
    }

    for id in state.generator.step_objects(dt) {
        log::trace!("Falling platform {:?} released", id);
    }

    state.health.step(dt);
    apply_hazards(state);
    collect_pickups(state);

    state.input.consume_edges();
}

/// Spikes and lasers overlapping the player deal damage
fn apply_hazards(state: &mut GameState) {
    let player = state.body.aabb();
    let mut hit = state
        .generator
        .spike_boxes()
        .iter()
        .any(|spikes| spikes.overlaps(&player));

    let laser = state.generator.config.laser.clone();
    for object in state.generator.objects_mut().values_mut() {
        if let SpawnedObject::Laser(beam) = object {
            if beam.aabb.overlaps(&player) && beam.try_hit(&laser) {
                hit = true;
            }
        }
    }

    if !hit {
        return;
    }
    match state.health.take_damage(HAZARD_DAMAGE) {
        DamageOutcome::Ignored => {}
        DamageOutcome::Hurt { hp } => state.events.push(GameEvent::PlayerDamaged { hp }),
        DamageOutcome::Killed => {
            state.events.push(GameEvent::PlayerDamaged { hp: 0 });
            state.kill_player(DeathReason::Hazard);
        }
    }
}

/// Pickups overlapping the player grant charges and disappear
fn collect_pickups(state: &mut GameState) {
    let player = state.body.aabb();
    let touched: Vec<_> = state
        .generator
        .objects()
        .iter()
        .filter_map(|(id, object)| match object {
            SpawnedObject::Pickup(pickup) if pickup.aabb.overlaps(&player) => Some(*id),
            _ => None,
        })
        .collect();

    for id in touched {
        if let Some(SpawnedObject::Pickup(pickup)) = state.generator.remove_object(id) {
            state
                .jetpack
                .add_charges(pickup.charges as i32, &mut state.events);
            state.events.push(GameEvent::PickupCollected {
                id,
                charges: pickup.charges,
            });
        }
    }
}

/// Advance one rendered frame
///
/// Returns the number of fixed steps that ran.
pub fn frame(state: &mut GameState, input: &FrameInput, frame_dt: f32) -> u32 {
    state.input.sample(input);

    // Confirm only means something on the game over screen
    let confirm = state.input.take_confirm();
    if state.session.is_game_over() {
        if confirm {
            state.reset_run();
        }
        return 0;
    }

    let dt = if frame_dt.is_finite() {
        frame_dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };
    state.accumulator += dt;

    let mut substeps = 0;
    while state.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
        tick(state, SIM_DT);
        state.accumulator -= SIM_DT;
        substeps += 1;
    }
    // Time past the substep cap is dropped, not owed to later frames
    if substeps == MAX_SUBSTEPS {
        state.accumulator = state.accumulator.min(SIM_DT);
    }

    // Score and wall share the physics clock
    let elapsed = substeps as f32 * SIM_DT;
    state.session.step(elapsed);
    if !state.session.is_playing() {
        return substeps;
    }

    state.camera.follow(state.body.pos);

    state.death_wall.step(state.body.pos.y, elapsed);
    if state.death_wall.is_lethal_contact(&state.body.aabb()) {
        state.kill_player(DeathReason::DeathWall);
    }

    let view = generator_view(&state.body, &state.camera, &state.death_wall, &state.session);
    let report = state.generator.step(&view, &mut state.rng);
    if report.spans_despawned > 0 {
        log::trace!(
            "Streamed {} rows, despawned {} spans",
            report.rows_spawned,
            report.spans_despawned
        );
    }

    if state.session.is_offscreen(state.body.pos.y, state.camera.bottom()) {
        state.kill_player(DeathReason::Offscreen);
    }

    substeps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScores;
    use crate::sim::grid::CellRange;
    use crate::sim::hazards::{EntityId, FallingPlatform, JetpackPickup, LaserBeam};
    use crate::sim::input::Autopilot;
    use crate::sim::placer::HazardKind;
    use crate::sim::session::SessionPhase;
    use crate::tuning::Tuning;
    use glam::Vec2;

    const TEST_ID: EntityId = EntityId(u32::MAX);

    fn new_state(seed: u64) -> GameState {
        GameState::new(seed, Tuning::default(), HighScores::new())
    }

    fn idle_frames(state: &mut GameState, frames: usize) {
        for _ in 0..frames {
            frame(state, &FrameInput::default(), SIM_DT);
        }
    }

    /// Player resting on the safety platform with no pending events
    fn settled(seed: u64) -> GameState {
        let mut state = new_state(seed);
        idle_frames(&mut state, 30);
        state.drain_events();
        state
    }

    /// Put a spike run around the player's column on the platform they stand on
    fn spike_under_player(state: &mut GameState) {
        let grid = state.generator.grid().unwrap();
        let column = grid.column_of(state.body.pos.x);
        let span = state.generator.spans_mut().next().unwrap();
        span.hazard = HazardKind::Spikes;
        span.spikes = Some(CellRange::new(column - 1, column + 1));
    }

    #[test]
    fn test_one_fixed_step_per_matching_frame() {
        let mut state = new_state(1);
        assert_eq!(frame(&mut state, &FrameInput::default(), SIM_DT), 1);
        assert_eq!(frame(&mut state, &FrameInput::default(), 0.0), 0);
        // Long hitches are capped
        assert!(frame(&mut state, &FrameInput::default(), 5.0) <= MAX_SUBSTEPS);
    }

    #[test]
    fn test_player_rests_on_safety_platform() {
        let mut state = new_state(2);
        idle_frames(&mut state, 60);
        assert!(state.movement.is_grounded());
        assert!((state.body.feet().y - 0.0).abs() < 1e-4);
    }

    #[test]
    fn test_grounded_press_jumps_without_boosting() {
        let mut state = new_state(4);
        idle_frames(&mut state, 10);
        state.drain_events();
        assert_eq!(state.jetpack.charges(), 1);

        let press = FrameInput {
            jump_pressed: true,
            jump_held: true,
            ..Default::default()
        };
        frame(&mut state, &press, SIM_DT);

        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::Jumped { .. })));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::JetpackBoost { .. })));
        assert_eq!(state.jetpack.charges(), 1);
        assert!(state.body.vel.y > 0.0);
    }

    #[test]
    fn test_air_press_boosts_once() {
        let mut state = new_state(5);
        idle_frames(&mut state, 10);

        // Tap jump, then release
        let press = FrameInput {
            jump_pressed: true,
            jump_held: true,
            ..Default::default()
        };
        let release = FrameInput {
            jump_released: true,
            ..Default::default()
        };
        frame(&mut state, &press, SIM_DT);
        frame(&mut state, &release, SIM_DT);
        idle_frames(&mut state, 8);
        state.drain_events();

        // Airborne second press uses the jetpack
        frame(&mut state, &press, SIM_DT);
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::JetpackBoost { .. })));
        assert_eq!(state.jetpack.charges(), 0);
        assert!(state.body.vel.y > 0.0);
        assert_eq!(state.movement.jump_buffer_timer(), 0.0);
    }

    #[test]
    fn test_falling_below_camera_kills() {
        let mut state = new_state(6);
        state.body.pos = Vec2::new(0.0, state.camera.bottom() - 5.0);
        frame(&mut state, &FrameInput::default(), SIM_DT);
        assert_eq!(state.session.death_reason(), Some(DeathReason::Offscreen));
    }

    #[test]
    fn test_idle_player_caught_by_death_wall() {
        let mut state = new_state(8);
        // Wall waits 1 s, closes to its gap, then creeps up at min speed
        idle_frames(&mut state, 120 * 16);
        assert_eq!(state.session.death_reason(), Some(DeathReason::DeathWall));
        assert!(matches!(
            state.session.phase(),
            SessionPhase::Dying { .. } | SessionPhase::GameOver
        ));
    }

    #[test]
    fn test_confirm_restarts_after_game_over() {
        let mut state = new_state(9);
        state.kill_player(DeathReason::Hazard);
        idle_frames(&mut state, 240);
        assert!(state.session.is_game_over());

        let confirm = FrameInput {
            confirm: true,
            ..Default::default()
        };
        frame(&mut state, &confirm, SIM_DT);
        assert!(state.session.is_playing());
        assert_eq!(state.session.score(), 0.0);
    }

    #[test]
    fn test_long_frames_keep_score_on_physics_clock() {
        let mut state = new_state(10);
        for _ in 0..100 {
            assert_eq!(frame(&mut state, &FrameInput::default(), 0.1), MAX_SUBSTEPS);
            assert!(state.accumulator <= SIM_DT);
        }

        let simulated = state.time_ticks as f32 * SIM_DT;
        assert!(state.session.is_playing());
        assert!((state.session.score() - simulated).abs() < 1e-3);
    }

    #[test]
    fn test_spikes_hurt_once_per_invulnerability_window() {
        let mut state = settled(12);
        spike_under_player(&mut state);

        frame(&mut state, &FrameInput::default(), SIM_DT);
        assert_eq!(state.health.hp(), 2);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PlayerDamaged { hp: 2 }));

        // Invulnerable for 0.6 s
        idle_frames(&mut state, 10);
        assert_eq!(state.health.hp(), 2);

        idle_frames(&mut state, 80);
        assert_eq!(state.health.hp(), 1);
        assert!(state.session.is_playing());
    }

    #[test]
    fn test_spikes_kill_with_hazard_reason() {
        let mut state = settled(13);
        spike_under_player(&mut state);

        let mut events = Vec::new();
        for _ in 0..240 {
            frame(&mut state, &FrameInput::default(), SIM_DT);
            events.extend(state.drain_events());
        }

        assert_eq!(state.session.death_reason(), Some(DeathReason::Hazard));
        assert!(events.contains(&GameEvent::PlayerDamaged { hp: 0 }));
        let deaths = events
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerDied { reason: DeathReason::Hazard, .. }))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn test_laser_and_spikes_share_one_hit() {
        let mut state = settled(14);
        spike_under_player(&mut state);
        let beam = LaserBeam::new(state.body.pos, 3.0, 0.3);
        state
            .generator
            .objects_mut()
            .insert(TEST_ID, SpawnedObject::Laser(beam));

        frame(&mut state, &FrameInput::default(), SIM_DT);
        assert_eq!(state.health.hp(), 2);
        let hits = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PlayerDamaged { .. }))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_laser_alone_hurts() {
        let mut state = settled(15);
        let beam = LaserBeam::new(state.body.pos, 3.0, 0.3);
        state
            .generator
            .objects_mut()
            .insert(TEST_ID, SpawnedObject::Laser(beam));

        frame(&mut state, &FrameInput::default(), SIM_DT);
        assert_eq!(state.health.hp(), 2);
        assert!(state.drain_events().contains(&GameEvent::PlayerDamaged { hp: 2 }));
    }

    #[test]
    fn test_pickup_refuels_and_disappears() {
        let mut state = settled(16);
        state.jetpack.add_charges(-1, &mut state.events);
        assert_eq!(state.jetpack.charges(), 0);
        state.drain_events();

        let pickup = JetpackPickup::new(state.body.pos, 0.8, 1);
        state
            .generator
            .objects_mut()
            .insert(TEST_ID, SpawnedObject::Pickup(pickup));

        frame(&mut state, &FrameInput::default(), SIM_DT);
        assert_eq!(state.jetpack.charges(), 1);
        assert!(!state.generator.objects().contains_key(&TEST_ID));

        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PickupCollected {
            id: TEST_ID,
            charges: 1
        }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::FuelChanged { charges: 1, .. })));
    }

    #[test]
    fn test_standing_on_falling_platform_triggers_once() {
        let mut state = settled(17);
        let grid = state.generator.grid().unwrap();
        let span = state.generator.spans_mut().next().unwrap();
        span.hazard = HazardKind::Falling;
        let aabb = grid.range_aabb(span.row, span.cells);
        state
            .generator
            .objects_mut()
            .insert(TEST_ID, SpawnedObject::Falling(FallingPlatform::new(aabb)));

        let mut triggers = 0;
        for _ in 0..60 {
            frame(&mut state, &FrameInput::default(), SIM_DT);
            triggers += state
                .drain_events()
                .iter()
                .filter(|e| **e == GameEvent::PlatformTriggered { id: TEST_ID })
                .count();
        }
        assert_eq!(triggers, 1);

        // Released after the 0.35 s delay
        match state.generator.objects().get(&TEST_ID) {
            Some(SpawnedObject::Falling(platform)) => assert!(platform.is_falling()),
            other => panic!("falling platform missing: {:?}", other),
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed: u64| {
            let mut state = new_state(seed);
            let mut pilot = Autopilot::new();
            let mut log = Vec::new();
            for _ in 0..1200 {
                let input = pilot.drive(&state);
                frame(&mut state, &input, 1.0 / 60.0);
                log.extend(state.drain_events());
            }
            (state.body.pos, state.session.score(), state.generator.span_count(), log)
        };

        assert_eq!(run(42), run(42));
    }
}
