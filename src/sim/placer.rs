//! Spatial row placer
//!
//! Places the spans of one row: the path platform that forms the climbable
//! route, then a few best-effort extras, then rolls hazards and pickups for
//! every span that made it in. Within a row no two spans share a cell.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultySnapshot;
use super::generator::GeneratorConfig;
use super::grid::{CellRange, Grid};
use super::hazards::{EntityId, FallingPlatform, JetpackPickup, LaserBeam, SpawnedObject};
use crate::random_between;

/// Hazard carried by a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HazardKind {
    #[default]
    None,
    /// Tiles replaced by a falling platform object
    Falling,
    /// Spike run one row above the span
    Spikes,
    /// Laser beam object one row above the span
    Laser,
}

/// One placed platform segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub row: i32,
    pub cells: CellRange,
    pub world_y: f32,
    pub hazard: HazardKind,
    /// Spike cells (on `row + 1`) when `hazard == Spikes`
    pub spikes: Option<CellRange>,
    /// Objects destroyed together with this span
    pub owned: Vec<EntityId>,
}

impl Span {
    pub fn new(row: i32, cells: CellRange, grid: &Grid) -> Self {
        Self {
            row,
            cells,
            world_y: grid.row_center_y(row),
            hazard: HazardKind::None,
            spikes: None,
            owned: Vec::new(),
        }
    }

    /// Whether the span's tiles are solid ground (falling spans use their object)
    pub fn has_static_tiles(&self) -> bool {
        self.hazard != HazardKind::Falling
    }
}

/// Usable horizontal world range for placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizontalWindow {
    pub min_x: f32,
    pub max_x: f32,
}

impl HorizontalWindow {
    /// Camera view width minus edge padding on both sides
    pub fn from_camera(center_x: f32, half_height: f32, aspect: f32, edge_padding: f32) -> Self {
        let half_width = half_height * aspect;
        let min_x = center_x - half_width + edge_padding;
        let max_x = center_x + half_width - edge_padding;
        if min_x > max_x {
            // Padding wider than the view: collapse onto the center
            return Self {
                min_x: center_x,
                max_x: center_x,
            };
        }
        Self { min_x, max_x }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn clamp(&self, x: f32) -> f32 {
        x.clamp(self.min_x, self.max_x)
    }

    /// Clamp a center so a run of `width` stays inside the window
    pub fn clamp_inside(&self, x: f32, width: f32) -> f32 {
        let half = width * 0.5;
        let lo = self.min_x + half;
        let hi = self.max_x - half;
        if lo > hi {
            return (self.min_x + self.max_x) * 0.5;
        }
        x.clamp(lo, hi)
    }
}

/// Path-walk frontier carried from row to row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathState {
    pub last_path_x: f32,
    /// +1 or -1
    pub direction: f32,
}

impl Default for PathState {
    fn default() -> Self {
        Self {
            last_path_x: 0.0,
            direction: 1.0,
        }
    }
}

/// Occupied horizontal ranges of the row being placed
#[derive(Debug, Clone, Default)]
pub struct RowOccupancy {
    ranges: Vec<CellRange>,
}

impl RowOccupancy {
    pub fn is_free(&self, range: &CellRange) -> bool {
        !self.ranges.iter().any(|r| r.overlaps(range))
    }

    /// Claim `range` if it overlaps nothing already placed
    pub fn try_claim(&mut self, range: CellRange) -> bool {
        if !self.is_free(&range) {
            return false;
        }
        self.ranges.push(range);
        true
    }
}

/// Monotonic id source for spawned objects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Spans and objects produced for one row
#[derive(Debug, Clone, Default)]
pub struct PlacedRow {
    pub spans: Vec<Span>,
    pub objects: Vec<(EntityId, SpawnedObject)>,
}

/// Places rows using generator tuning and a grid
pub struct RowPlacer<'a> {
    pub config: &'a GeneratorConfig,
    pub grid: Grid,
}

impl<'a> RowPlacer<'a> {
    pub fn new(config: &'a GeneratorConfig, grid: Grid) -> Self {
        Self { config, grid }
    }

    /// Place the path platform and extras for `row`
    pub fn place_row<R: Rng + ?Sized>(
        &self,
        row: i32,
        window: &HorizontalWindow,
        difficulty: &DifficultySnapshot,
        path: &mut PathState,
        ids: &mut IdAllocator,
        rng: &mut R,
    ) -> PlacedRow {
        let cfg = self.config;
        let mut placed = PlacedRow::default();
        let mut occupancy = RowOccupancy::default();

        // Path platform: walk sideways from the previous anchor
        let delta = random_between(rng, cfg.min_step_x, cfg.max_step_x) * path.direction;
        if cfg.alternate_direction && rng.random::<f32>() < cfg.direction_flip_chance {
            path.direction = -path.direction;
        }

        let path_width = random_between(rng, cfg.min_width, cfg.max_width);
        let path_x = window.clamp(path.last_path_x + delta);
        let path_x = window.clamp_inside(path_x, path_width);
        let path_cells = self.grid.range_centered(path_x, path_width);

        if occupancy.try_claim(path_cells) {
            self.place_span(row, path_cells, difficulty, ids, rng, &mut placed);
            path.last_path_x = path_x;
        }

        // Extras: best effort, silently skipped when no slot is free
        for _ in 0..cfg.extras_per_row {
            let width = random_between(rng, cfg.min_width, cfg.max_width);
            let mut claimed = None;

            for _ in 0..cfg.extra_attempts {
                let x = random_between(rng, window.min_x, window.max_x);
                if (x - path_x).abs() < cfg.extra_min_separation_x {
                    continue;
                }
                let x = window.clamp_inside(x, width);
                let cells = self.grid.range_centered(x, width);
                if occupancy.try_claim(cells) {
                    claimed = Some(cells);
                    break;
                }
            }

            match claimed {
                Some(cells) => self.place_span(row, cells, difficulty, ids, rng, &mut placed),
                None => log::trace!("Row {}: no free slot for extra span", row),
            }
        }

        placed
    }

    /// Add one span at a claimed range, rolling its hazard and pickup
    pub fn place_span<R: Rng + ?Sized>(
        &self,
        row: i32,
        cells: CellRange,
        difficulty: &DifficultySnapshot,
        ids: &mut IdAllocator,
        rng: &mut R,
        out: &mut PlacedRow,
    ) {
        let cfg = self.config;
        let grid = &self.grid;
        let mut span = Span::new(row, cells, grid);
        let mut laser_box = None;

        if rng.random::<f32>() < difficulty.falling {
            span.hazard = HazardKind::Falling;
            let id = ids.next_id();
            let platform = FallingPlatform::new(grid.range_aabb(row, cells));
            out.objects.push((id, SpawnedObject::Falling(platform)));
            span.owned.push(id);
        } else if rng.random::<f32>() < difficulty.spikes {
            // No valid run leaves the span open for a laser
            if let Some(run) = self.spike_run(cells, rng) {
                span.hazard = HazardKind::Spikes;
                span.spikes = Some(run);
            } else {
                log::trace!("Row {}: no room for spikes in {:?}", row, cells);
            }
        }

        if span.hazard == HazardKind::None && rng.random::<f32>() < difficulty.laser {
            let span_width = cells.len() as f32 * grid.cell_size;
            let length = random_between(rng, cfg.laser_min_length, cfg.laser_max_length).min(span_width);
            let center = Vec2::new(grid.range_center_x(cells), grid.row_center_y(row + 1));
            let beam = LaserBeam::new(center, length, cfg.laser.thickness);
            laser_box = Some(beam.aabb);

            let id = ids.next_id();
            out.objects.push((id, SpawnedObject::Laser(beam)));
            span.hazard = HazardKind::Laser;
            span.owned.push(id);
        }

        if rng.random::<f32>() < difficulty.jetpack {
            let cell = rng.random_range(cells.min..=cells.max);
            let pos = Vec2::new(
                grid.column_left_x(cell) + grid.cell_size * 0.5,
                grid.row_center_y(row + 1),
            );
            let on_spikes = span.spikes.is_some_and(|s| s.contains(cell));
            let in_beam = laser_box.is_some_and(|b| b.contains_point(pos));

            if on_spikes || in_beam {
                log::trace!("Row {}: pickup skipped, cell {} is hazardous", row, cell);
            } else {
                let id = ids.next_id();
                let pickup = JetpackPickup::new(pos, cfg.pickup_size, cfg.pickup_charges);
                out.objects.push((id, SpawnedObject::Pickup(pickup)));
                span.owned.push(id);
            }
        }

        out.spans.push(span);
    }

    /// Contiguous spike cells strictly inside the edge margin, capped by coverage
    pub fn spike_run<R: Rng + ?Sized>(&self, cells: CellRange, rng: &mut R) -> Option<CellRange> {
        let cfg = self.config;
        let margin = cfg.spike_edge_margin as i32;
        let lo = cells.min + margin;
        let hi = cells.max - margin;
        if hi < lo {
            return None;
        }

        let interior = hi - lo + 1;
        let cap = (cells.len() as f32 * cfg.spike_max_coverage).floor() as i32;
        let max_len = cap.min(interior);
        let min_len = cfg.spike_min_length.max(1) as i32;
        if max_len < min_len {
            return None;
        }

        let len = rng.random_range(min_len..=max_len);
        let start = rng.random_range(lo..=hi - len + 1);
        Some(CellRange::new(start, start + len - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn window() -> HorizontalWindow {
        HorizontalWindow::from_camera(0.0, 9.0, 0.75, 0.8)
    }

    fn busy() -> DifficultySnapshot {
        DifficultySnapshot {
            score: 200.0,
            falling: 0.3,
            spikes: 0.5,
            laser: 0.5,
            jetpack: 0.5,
            gap_min: 4.0,
            gap_max: 7.0,
        }
    }

    #[test]
    fn test_window_from_camera() {
        let w = window();
        assert!((w.min_x - (-5.95)).abs() < 1e-5);
        assert!((w.max_x - 5.95).abs() < 1e-5);
        assert_eq!(w.clamp_inside(100.0, 4.0), w.max_x - 2.0);
        // Wider than window: centered
        assert_eq!(w.clamp_inside(3.0, 50.0), 0.0);
    }

    #[test]
    fn test_rows_never_overlap() {
        let config = GeneratorConfig {
            extras_per_row: 4,
            ..Default::default()
        };
        let placer = RowPlacer::new(&config, Grid::default());
        let mut rng = Pcg32::seed_from_u64(42);
        let mut path = PathState::default();
        let mut ids = IdAllocator::default();

        for row in 0..300 {
            let placed = placer.place_row(row, &window(), &busy(), &mut path, &mut ids, &mut rng);
            assert!(!placed.spans.is_empty(), "path span always placed");
            for (i, a) in placed.spans.iter().enumerate() {
                assert_eq!(a.row, row);
                for b in placed.spans.iter().skip(i + 1) {
                    assert!(!a.cells.overlaps(&b.cells), "row {row}: {a:?} vs {b:?}");
                }
            }
        }
    }

    #[test]
    fn test_path_stays_in_window() {
        let config = GeneratorConfig::default();
        let placer = RowPlacer::new(&config, Grid::default());
        let mut rng = Pcg32::seed_from_u64(3);
        let mut path = PathState::default();
        let mut ids = IdAllocator::default();
        let w = window();

        for row in 0..200 {
            placer.place_row(row, &w, &DifficultySnapshot::calm(), &mut path, &mut ids, &mut rng);
            assert!(path.last_path_x >= w.min_x && path.last_path_x <= w.max_x);
            assert!(path.direction == 1.0 || path.direction == -1.0);
        }
    }

    #[test]
    fn test_spike_run_inside_margin_and_capped() {
        let config = GeneratorConfig::default();
        let placer = RowPlacer::new(&config, Grid::default());
        let mut rng = Pcg32::seed_from_u64(9);
        let cells = CellRange::new(0, 7);

        for _ in 0..200 {
            let run = placer.spike_run(cells, &mut rng).expect("8-cell span fits spikes");
            assert!(run.min >= cells.min + config.spike_edge_margin as i32);
            assert!(run.max <= cells.max - config.spike_edge_margin as i32);
            let cap = (cells.len() as f32 * config.spike_max_coverage).floor() as i32;
            assert!(run.len() <= cap);
        }
    }

    #[test]
    fn test_spike_run_skipped_on_tiny_span() {
        let config = GeneratorConfig::default();
        let placer = RowPlacer::new(&config, Grid::default());
        let mut rng = Pcg32::seed_from_u64(9);
        assert_eq!(placer.spike_run(CellRange::new(0, 1), &mut rng), None);
    }

    #[test]
    fn test_hazards_follow_snapshot() {
        let config = GeneratorConfig::default();
        let placer = RowPlacer::new(&config, Grid::default());
        let mut rng = Pcg32::seed_from_u64(11);
        let mut ids = IdAllocator::default();

        // Calm snapshot never produces hazards or pickups
        for row in 0..100 {
            let mut out = PlacedRow::default();
            placer.place_span(row, CellRange::new(-3, 3), &DifficultySnapshot::calm(), &mut ids, &mut rng, &mut out);
            assert_eq!(out.spans[0].hazard, HazardKind::None);
            assert!(out.objects.is_empty());
        }

        // Certain falling: every span becomes a falling platform it owns
        let always_falling = DifficultySnapshot {
            falling: 1.0,
            ..DifficultySnapshot::calm()
        };
        let mut out = PlacedRow::default();
        placer.place_span(5, CellRange::new(0, 4), &always_falling, &mut ids, &mut rng, &mut out);
        assert_eq!(out.spans[0].hazard, HazardKind::Falling);
        assert_eq!(out.spans[0].owned.len(), 1);
        assert!(matches!(out.objects[0].1, SpawnedObject::Falling(_)));
        assert!(!out.spans[0].has_static_tiles());
    }

    #[test]
    fn test_laser_rolled_when_spikes_do_not_fit() {
        let config = GeneratorConfig::default();
        let placer = RowPlacer::new(&config, Grid::default());
        let mut rng = Pcg32::seed_from_u64(13);
        let mut ids = IdAllocator::default();
        let snapshot = DifficultySnapshot {
            spikes: 1.0,
            laser: 1.0,
            ..DifficultySnapshot::calm()
        };

        // Two cells leave no interior for a spike run
        let mut out = PlacedRow::default();
        placer.place_span(2, CellRange::new(0, 1), &snapshot, &mut ids, &mut rng, &mut out);
        assert_eq!(out.spans[0].hazard, HazardKind::Laser);
        assert_eq!(out.spans[0].spikes, None);
        assert!(matches!(out.objects[0].1, SpawnedObject::Laser(_)));

        // Room for spikes: no laser on top of them
        let mut out = PlacedRow::default();
        placer.place_span(3, CellRange::new(0, 7), &snapshot, &mut ids, &mut rng, &mut out);
        assert_eq!(out.spans[0].hazard, HazardKind::Spikes);
        assert!(out.objects.is_empty());
    }

    #[test]
    fn test_pickup_avoids_spike_cells() {
        let config = GeneratorConfig::default();
        let placer = RowPlacer::new(&config, Grid::default());
        let mut rng = Pcg32::seed_from_u64(5);
        let mut ids = IdAllocator::default();
        let grid = Grid::default();
        let snapshot = DifficultySnapshot {
            spikes: 1.0,
            jetpack: 1.0,
            ..DifficultySnapshot::calm()
        };

        for row in 0..200 {
            let mut out = PlacedRow::default();
            placer.place_span(row, CellRange::new(0, 7), &snapshot, &mut ids, &mut rng, &mut out);
            let spikes = out.spans[0].spikes.expect("spikes always fit an 8-cell span");
            for (_, obj) in &out.objects {
                if let SpawnedObject::Pickup(p) = obj {
                    assert!(!spikes.contains(grid.column_of(p.pos.x)));
                }
            }
        }
    }
}
