//! Streaming platform generator
//!
//! Owns the sliding window of spawned spans. Rows are spawned ahead of the
//! camera top and despawned once they sink below the death wall's kill line.
//!
//! State machine over the row cursor:
//! - `Idle`: nothing spawned yet (or collaborators never bound)
//! - `Priming`: inside `reset_run`, filling the initial screen
//! - `Streaming`: steady state, driven by `step`

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::difficulty::{DifficultyCurve, DifficultySnapshot};
use super::grid::Grid;
use super::hazards::{EntityId, FallingConfig, LaserConfig, SpawnedObject};
use super::physics::{Aabb, SolidOwner, SolidSet};
use super::placer::{IdAllocator, PathState, PlacedRow, RowPlacer, Span};
use crate::random_between;

/// Upper bound on rows spawned in a single step
const MAX_ROWS_PER_STEP: usize = 256;

/// Generator tuning (world units unless noted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    // === Grid ===
    pub cell_size: f32,
    pub origin: Vec2,

    // === Streaming window ===
    /// Rows are spawned until the frontier is this far above the camera top
    pub spawn_ahead: f32,
    /// Spans this far below the death wall are destroyed
    pub despawn_below_death_wall: f32,

    // === Platform size ===
    pub min_width: f32,
    pub max_width: f32,
    pub edge_padding: f32,

    // === Path walk ===
    pub min_step_x: f32,
    pub max_step_x: f32,
    pub alternate_direction: bool,
    pub direction_flip_chance: f32,

    // === Extras ===
    pub extras_per_row: u32,
    pub extra_attempts: u32,
    pub extra_min_separation_x: f32,

    // === Spawn safety ===
    pub under_player_min_width: f32,

    // === Spikes ===
    /// Cells kept clear at both span ends
    pub spike_edge_margin: u32,
    /// Max fraction of the span covered by spikes
    pub spike_max_coverage: f32,
    pub spike_min_length: u32,
    /// Spike height as a fraction of a cell
    pub spike_height: f32,

    // === Lasers ===
    pub laser_min_length: f32,
    pub laser_max_length: f32,
    pub laser: LaserConfig,

    // === Falling platforms ===
    pub falling: FallingConfig,

    // === Pickups ===
    pub pickup_size: f32,
    pub pickup_charges: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            origin: Vec2::ZERO,

            spawn_ahead: 14.0,
            despawn_below_death_wall: 6.0,

            min_width: 2.5,
            max_width: 7.0,
            edge_padding: 0.8,

            min_step_x: 1.8,
            max_step_x: 5.5,
            alternate_direction: true,
            direction_flip_chance: 0.55,

            extras_per_row: 2,
            extra_attempts: 6,
            extra_min_separation_x: 3.5,

            under_player_min_width: 6.0,

            spike_edge_margin: 1,
            spike_max_coverage: 0.5,
            spike_min_length: 1,
            spike_height: 0.5,

            laser_min_length: 2.0,
            laser_max_length: 5.0,
            laser: LaserConfig::default(),

            falling: FallingConfig::default(),

            pickup_size: 0.6,
            pickup_charges: 1,
        }
    }
}

impl GeneratorConfig {
    pub fn grid(&self) -> Grid {
        Grid::new(self.origin, self.cell_size)
    }
}

/// Generator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorPhase {
    Idle,
    Priming,
    Streaming,
}

/// Frontier of generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationCursor {
    /// Next row to spawn
    pub next_row: i32,
    pub path: PathState,
}

impl Default for GenerationCursor {
    fn default() -> Self {
        Self {
            next_row: 0,
            path: PathState::default(),
        }
    }
}

/// Collaborator state the generator reads each step; `None` means unbound
#[derive(Debug, Clone, Copy)]
pub struct GeneratorView<'a> {
    pub player: Option<Aabb>,
    pub camera: Option<&'a Camera>,
    pub death_wall_y: Option<f32>,
    pub score: f32,
}

/// Bound collaborators, available only when every reference resolved
struct Bound<'a> {
    player: Aabb,
    camera: &'a Camera,
    death_wall_y: f32,
}

impl<'a> GeneratorView<'a> {
    fn bound(&self) -> Option<Bound<'a>> {
        Some(Bound {
            player: self.player?,
            camera: self.camera?,
            death_wall_y: self.death_wall_y?,
        })
    }
}

/// What a streaming step did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamReport {
    pub rows_spawned: usize,
    pub spans_despawned: usize,
}

#[derive(Debug, Clone)]
pub struct StreamingGenerator {
    pub config: GeneratorConfig,
    pub curve: DifficultyCurve,
    phase: GeneratorPhase,
    grid: Option<Grid>,
    cursor: GenerationCursor,
    /// Ascending by row
    spans: VecDeque<Span>,
    objects: BTreeMap<EntityId, SpawnedObject>,
    ids: IdAllocator,
}

impl StreamingGenerator {
    pub fn new(config: GeneratorConfig, curve: DifficultyCurve) -> Self {
        Self {
            config,
            curve,
            phase: GeneratorPhase::Idle,
            grid: None,
            cursor: GenerationCursor::default(),
            spans: VecDeque::new(),
            objects: BTreeMap::new(),
            ids: IdAllocator::default(),
        }
    }

    /// Resolve the grid. Spawns nothing.
    pub fn init(&mut self) {
        self.grid = Some(self.config.grid());
    }

    pub fn phase(&self) -> GeneratorPhase {
        self.phase
    }

    pub fn grid(&self) -> Option<Grid> {
        self.grid
    }

    pub fn cursor(&self) -> &GenerationCursor {
        &self.cursor
    }

    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    pub fn objects(&self) -> &BTreeMap<EntityId, SpawnedObject> {
        &self.objects
    }

    #[cfg(test)]
    pub(crate) fn spans_mut(&mut self) -> impl Iterator<Item = &mut Span> {
        self.spans.iter_mut()
    }

    pub fn objects_mut(&mut self) -> &mut BTreeMap<EntityId, SpawnedObject> {
        &mut self.objects
    }

    /// World y of the next row to spawn
    pub fn frontier_y(&self) -> Option<f32> {
        self.grid.map(|g| g.row_center_y(self.cursor.next_row))
    }

    /// Destroy every span and object and forget the frontier
    pub fn clear(&mut self) {
        self.spans.clear();
        self.objects.clear();
        self.cursor = GenerationCursor::default();
    }

    /// Tear down and restart generation under the player
    ///
    /// Returns false (and stays as it was) when a collaborator is unbound.
    pub fn reset_run<R: Rng + ?Sized>(&mut self, view: &GeneratorView, rng: &mut R) -> bool {
        let Some(bound) = view.bound() else {
            log::debug!("Generator reset skipped: collaborators unbound");
            return false;
        };
        let grid = *self.grid.get_or_insert_with(|| self.config.grid());

        self.clear();
        self.phase = GeneratorPhase::Priming;

        let window = bound.camera.window(self.config.edge_padding);
        let snapshot = self.curve.snapshot(view.score);

        // Safety platform directly under the player's feet
        let under_row = grid.row_of(bound.player.min.y) - 1;
        let width = random_between(rng, self.config.min_width, self.config.max_width)
            .max(self.config.under_player_min_width);
        let x = window.clamp(bound.player.center().x);
        let x = window.clamp_inside(x, width);
        let cells = grid.range_centered(x, width);

        let mut placed = PlacedRow::default();
        RowPlacer::new(&self.config, grid).place_span(
            under_row,
            cells,
            &DifficultySnapshot::calm(),
            &mut self.ids,
            rng,
            &mut placed,
        );
        self.absorb(placed);

        self.cursor.path = PathState {
            last_path_x: x,
            direction: 1.0,
        };
        let gap = random_between(rng, snapshot.gap_min, snapshot.gap_max);
        self.cursor.next_row = under_row + grid.rows_for_gap(gap);

        let rows = self.fill_ahead(grid, bound.camera, view.score, rng);
        self.phase = GeneratorPhase::Streaming;
        log::info!(
            "Generator primed: safety row {}, {} rows, frontier row {}",
            under_row,
            rows + 1,
            self.cursor.next_row
        );
        true
    }

    /// One streaming step: spawn ahead of the camera, despawn below the kill line
    pub fn step<R: Rng + ?Sized>(&mut self, view: &GeneratorView, rng: &mut R) -> StreamReport {
        let Some(bound) = view.bound() else {
            // Re-resolved once everything is bound again
            self.grid = None;
            log::trace!("Generator step skipped: collaborators unbound");
            return StreamReport::default();
        };
        let grid = *self.grid.get_or_insert_with(|| self.config.grid());

        if self.phase != GeneratorPhase::Streaming {
            return StreamReport::default();
        }

        let rows_spawned = self.fill_ahead(grid, bound.camera, view.score, rng);
        let kill_line = bound.death_wall_y - self.config.despawn_below_death_wall;
        let spans_despawned = self.despawn_below(kill_line);

        StreamReport {
            rows_spawned,
            spans_despawned,
        }
    }

    /// Spawn rows until the frontier clears the camera top plus margin
    fn fill_ahead<R: Rng + ?Sized>(
        &mut self,
        grid: Grid,
        camera: &Camera,
        score: f32,
        rng: &mut R,
    ) -> usize {
        let target = camera.top() + self.config.spawn_ahead;
        let window = camera.window(self.config.edge_padding);
        let mut rows = 0;

        while grid.row_center_y(self.cursor.next_row) < target {
            if rows >= MAX_ROWS_PER_STEP {
                log::warn!("Row spawn budget exhausted at row {}", self.cursor.next_row);
                break;
            }

            let snapshot = self.curve.snapshot(score);
            let placed = RowPlacer::new(&self.config, grid).place_row(
                self.cursor.next_row,
                &window,
                &snapshot,
                &mut self.cursor.path,
                &mut self.ids,
                rng,
            );
            self.absorb(placed);

            let gap = random_between(rng, snapshot.gap_min, snapshot.gap_max);
            self.cursor.next_row += grid.rows_for_gap(gap);
            rows += 1;
        }

        rows
    }

    /// Drop spans (oldest first) whose world y is below `kill_line`
    pub fn despawn_below(&mut self, kill_line: f32) -> usize {
        let mut removed = 0;
        while self.spans.front().is_some_and(|s| s.world_y < kill_line) {
            if let Some(span) = self.spans.pop_front() {
                for id in &span.owned {
                    self.objects.remove(id);
                }
                removed += 1;
            }
        }
        removed
    }

    fn absorb(&mut self, placed: PlacedRow) {
        for span in placed.spans {
            debug_assert!(
                self.spans.back().is_none_or(|last| last.row <= span.row),
                "spans must stay in ascending row order"
            );
            self.spans.push_back(span);
        }
        self.objects.extend(placed.objects);
    }

    /// Colliders for this fixed step: static tiles plus collidable falling platforms
    pub fn collect_solids(&self, out: &mut SolidSet) {
        let Some(grid) = self.grid else {
            return;
        };
        for span in self.spans.iter().filter(|s| s.has_static_tiles()) {
            out.push(grid.range_aabb(span.row, span.cells), SolidOwner::Tiles);
        }
        for (id, object) in &self.objects {
            if let SpawnedObject::Falling(platform) = object {
                if platform.collides_with_player() {
                    out.push(platform.aabb, SolidOwner::Falling(*id));
                }
            }
        }
    }

    /// Boxes of every spike run
    pub fn spike_boxes(&self) -> Vec<Aabb> {
        let Some(grid) = self.grid else {
            return Vec::new();
        };
        let height = grid.cell_size * self.config.spike_height;
        self.spans
            .iter()
            .filter_map(|span| {
                let run = span.spikes?;
                let base = grid.range_aabb(span.row + 1, run);
                Some(Aabb::new(base.min, Vec2::new(base.max.x, base.min.y + height)))
            })
            .collect()
    }

    /// Start a falling platform's countdown. True on first contact.
    pub fn trigger_falling(&mut self, id: EntityId) -> bool {
        match self.objects.get_mut(&id) {
            Some(SpawnedObject::Falling(platform)) => platform.on_player_contact(&self.config.falling),
            _ => false,
        }
    }

    /// Advance object timers; returns the falling platforms released this step
    pub fn step_objects(&mut self, dt: f32) -> Vec<EntityId> {
        let mut released = Vec::new();
        for (id, object) in self.objects.iter_mut() {
            match object {
                SpawnedObject::Falling(platform) => {
                    if platform.step(&self.config.falling, dt) {
                        released.push(*id);
                    }
                }
                SpawnedObject::Laser(beam) => beam.step(dt),
                SpawnedObject::Pickup(_) => {}
            }
        }
        released
    }

    /// Remove a single object (e.g. a collected pickup)
    pub fn remove_object(&mut self, id: EntityId) -> Option<SpawnedObject> {
        let removed = self.objects.remove(&id);
        if removed.is_some() {
            for span in self.spans.iter_mut() {
                span.owned.retain(|owned| *owned != id);
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::camera::CameraConfig;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn player_at(x: f32, feet_y: f32) -> Aabb {
        Aabb::new(Vec2::new(x - 0.4, feet_y), Vec2::new(x + 0.4, feet_y + 1.0))
    }

    fn camera_over(player: &Aabb) -> Camera {
        let mut cam = Camera::new(CameraConfig::default());
        cam.reset(player.center());
        cam
    }

    fn generator() -> StreamingGenerator {
        let mut g = StreamingGenerator::new(GeneratorConfig::default(), DifficultyCurve::default());
        g.init();
        g
    }

    #[test]
    fn test_starts_idle_and_init_spawns_nothing() {
        let g = generator();
        assert_eq!(g.phase(), GeneratorPhase::Idle);
        assert_eq!(g.span_count(), 0);
    }

    #[test]
    fn test_reset_places_platform_under_player() {
        let mut g = generator();
        let mut rng = Pcg32::seed_from_u64(1);
        let player = player_at(1.3, 0.0);
        let cam = camera_over(&player);
        let view = GeneratorView {
            player: Some(player),
            camera: Some(&cam),
            death_wall_y: Some(-8.0),
            score: 0.0,
        };

        // Repeated resets always leave the same guarantees
        for _ in 0..5 {
            assert!(g.reset_run(&view, &mut rng));
            assert_eq!(g.phase(), GeneratorPhase::Streaming);

            let grid = g.grid().expect("grid resolved");
            let first = g.spans().next().expect("safety platform");
            assert_eq!(grid.row_top_y(first.row), 0.0);
            assert!(first.cells.contains(grid.column_of(1.3)));
            assert!(first.cells.len() as f32 >= g.config.under_player_min_width);
            assert!(g.frontier_y().expect("frontier") >= cam.top());
        }
    }

    #[test]
    fn test_reset_without_bindings_is_noop() {
        let mut g = generator();
        let mut rng = Pcg32::seed_from_u64(1);
        let view = GeneratorView {
            player: None,
            camera: None,
            death_wall_y: Some(0.0),
            score: 0.0,
        };
        assert!(!g.reset_run(&view, &mut rng));
        assert_eq!(g.phase(), GeneratorPhase::Idle);
        assert_eq!(g.span_count(), 0);
    }

    #[test]
    fn test_unbound_step_drops_grid_then_recovers() {
        let mut g = generator();
        let mut rng = Pcg32::seed_from_u64(2);
        let player = player_at(0.0, 0.0);
        let cam = camera_over(&player);
        let bound = GeneratorView {
            player: Some(player),
            camera: Some(&cam),
            death_wall_y: Some(-8.0),
            score: 0.0,
        };
        assert!(g.reset_run(&bound, &mut rng));
        let spans = g.span_count();

        let unbound = GeneratorView {
            camera: None,
            ..bound
        };
        assert_eq!(g.step(&unbound, &mut rng), StreamReport::default());
        assert!(g.grid().is_none());
        assert_eq!(g.span_count(), spans);

        g.step(&bound, &mut rng);
        assert!(g.grid().is_some());
    }

    #[test]
    fn test_streaming_spawns_as_camera_rises() {
        let mut g = generator();
        let mut rng = Pcg32::seed_from_u64(3);
        let player = player_at(0.0, 0.0);
        let mut cam = camera_over(&player);
        let view = GeneratorView {
            player: Some(player),
            camera: Some(&cam),
            death_wall_y: Some(-8.0),
            score: 0.0,
        };
        assert!(g.reset_run(&view, &mut rng));
        let (player, death_wall_y, score) = (view.player, view.death_wall_y, view.score);

        cam.follow(Vec2::new(0.0, 40.0));
        let view = GeneratorView {
            player,
            camera: Some(&cam),
            death_wall_y,
            score,
        };
        let report = g.step(&view, &mut rng);
        assert!(report.rows_spawned > 0);
        assert!(g.frontier_y().expect("frontier") >= cam.top() + g.config.spawn_ahead);

        // Spans stay in ascending row order
        let rows: Vec<i32> = g.spans().map(|s| s.row).collect();
        assert!(rows.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_despawn_exactly_below_kill_line() {
        let mut g = generator();
        let mut rng = Pcg32::seed_from_u64(4);
        let player = player_at(0.0, 0.0);
        let cam = camera_over(&player);
        let view = GeneratorView {
            player: Some(player),
            camera: Some(&cam),
            death_wall_y: Some(-8.0),
            score: 0.0,
        };
        assert!(g.reset_run(&view, &mut rng));

        let kill_line = 6.0;
        let expected_kept: Vec<f32> = g
            .spans()
            .map(|s| s.world_y)
            .filter(|y| *y >= kill_line)
            .collect();
        let expected_removed = g.span_count() - expected_kept.len();

        let removed = g.despawn_below(kill_line);
        assert_eq!(removed, expected_removed);
        let kept: Vec<f32> = g.spans().map(|s| s.world_y).collect();
        assert_eq!(kept, expected_kept);

        // Owned objects of removed spans are gone too
        let live: Vec<EntityId> = g.spans().flat_map(|s| s.owned.iter().copied()).collect();
        assert!(g.objects().keys().all(|id| live.contains(id)));
    }

    #[test]
    fn test_step_despawns_behind_raised_wall() {
        let mut g = generator();
        let mut rng = Pcg32::seed_from_u64(6);
        let player = player_at(0.0, 0.0);
        let cam = camera_over(&player);
        let view = GeneratorView {
            player: Some(player),
            camera: Some(&cam),
            death_wall_y: Some(-8.0),
            score: 0.0,
        };
        assert!(g.reset_run(&view, &mut rng));

        // Wall far below: nothing goes
        assert_eq!(g.step(&view, &mut rng).spans_despawned, 0);

        let wall_y = 14.0;
        let kill_line = wall_y - g.config.despawn_below_death_wall;
        let below = g.spans().filter(|s| s.world_y < kill_line).count();
        let before = g.span_count();
        assert!(below > 0 && below < before);

        let raised = GeneratorView {
            death_wall_y: Some(wall_y),
            ..view
        };
        let report = g.step(&raised, &mut rng);
        assert_eq!(report.rows_spawned, 0);
        assert_eq!(report.spans_despawned, below);
        assert_eq!(g.span_count(), before - below);
        assert!(g.spans().all(|s| s.world_y >= kill_line));
    }

    #[test]
    fn test_clear_tears_down_everything() {
        let mut g = generator();
        let mut rng = Pcg32::seed_from_u64(5);
        let player = player_at(0.0, 0.0);
        let cam = camera_over(&player);
        let view = GeneratorView {
            player: Some(player),
            camera: Some(&cam),
            death_wall_y: Some(-8.0),
            score: 500.0,
        };
        assert!(g.reset_run(&view, &mut rng));
        g.clear();
        assert_eq!(g.span_count(), 0);
        assert!(g.objects().is_empty());
    }
}
