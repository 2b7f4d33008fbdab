//! Uniform spatial grid over the viewport.
//!
//! Obstacles are bucketed by the cells their rectangle overlaps. Ray queries
//! walk cell coordinates (not pixels) with a Bresenham line, so their cost is
//! bounded by the grid resolution regardless of on-screen distance.

use glam::Vec2;

use crate::api::types::Rect;
use crate::core::geometry::GeometrySnapshot;

/// Integer cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub col: i32,
    pub row: i32,
}

impl CellCoord {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

pub struct SpatialIndex {
    resolution: u32,
    cell_size: Vec2,
    /// Flat array of cells, indexed by `row * resolution + col`.
    /// Each cell holds indices into `GeometrySnapshot::obstacles`.
    cells: Vec<Vec<usize>>,
    /// Generation of the snapshot the buckets were built from.
    generation: Option<u64>,
}

impl SpatialIndex {
    pub fn new(resolution: u32) -> Self {
        let resolution = resolution.max(1);
        Self {
            resolution,
            cell_size: Vec2::ONE,
            cells: vec![Vec::new(); (resolution * resolution) as usize],
            generation: None,
        }
    }

    /// Rebuild every bucket from `snapshot`. No incremental update.
    pub fn rebuild(&mut self, snapshot: &GeometrySnapshot) {
        let res = self.resolution as f32;
        // Guard against a zero-sized viewport (minimised window).
        self.cell_size = Vec2::new(
            (snapshot.viewport.width / res).max(1.0),
            (snapshot.viewport.height / res).max(1.0),
        );
        for cell in &mut self.cells {
            cell.clear();
        }

        let mut indices = Vec::new();
        for (i, obstacle) in snapshot.obstacles.iter().enumerate() {
            indices.clear();
            self.cells_for_rect(&obstacle.rect, &mut indices);
            for &idx in &indices {
                self.cells[idx].push(i);
            }
        }

        self.generation = Some(snapshot.generation);
        log::debug!(
            "spatial index rebuilt: {}x{} cells of {:.1}x{:.1}px",
            self.resolution,
            self.resolution,
            self.cell_size.x,
            self.cell_size.y
        );
    }

    /// Whether the buckets reflect exactly this snapshot.
    pub fn is_current(&self, snapshot: &GeometrySnapshot) -> bool {
        self.generation == Some(snapshot.generation)
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    /// Cell containing a point. May lie outside the grid.
    pub fn cell_of(&self, p: Vec2) -> CellCoord {
        CellCoord::new(
            (p.x / self.cell_size.x).floor() as i32,
            (p.y / self.cell_size.y).floor() as i32,
        )
    }

    /// Flat indices of every in-grid cell a rectangle overlaps.
    pub fn cells_for_rect(&self, rect: &Rect, out: &mut Vec<usize>) {
        let max = self.resolution as i32 - 1;
        let c0 = (rect.left / self.cell_size.x).floor() as i32;
        let r0 = (rect.top / self.cell_size.y).floor() as i32;
        // The far edge is exclusive: a rect ending exactly on a cell
        // boundary does not spill into the next cell.
        let c1 = ((rect.right() - 1.0) / self.cell_size.x).floor() as i32;
        let r1 = ((rect.bottom() - 1.0) / self.cell_size.y).floor() as i32;
        let (c1, r1) = (c1.max(c0), r1.max(r0));

        for row in r0.max(0)..=r1.min(max) {
            for col in c0.max(0)..=c1.min(max) {
                out.push((row * self.resolution as i32 + col) as usize);
            }
        }
    }

    /// Ordered cells traversed by the segment `from`..`to`.
    ///
    /// The segment is clipped to the grid first, so only the on-screen part
    /// is walked and the walk never exceeds `2 * resolution` steps. A segment
    /// that misses the grid entirely traverses no cells.
    pub fn cells_along_ray(&self, from: Vec2, to: Vec2) -> Vec<CellCoord> {
        let Some((from, to)) = self.clip(from, to) else {
            return Vec::new();
        };
        // Clipped points may sit exactly on the far boundary.
        let start = self.clamp(self.cell_of(from));
        let end = self.clamp(self.cell_of(to));

        let dx = (end.col - start.col).abs();
        let dy = (end.row - start.row).abs();
        let sx = if start.col < end.col { 1 } else { -1 };
        let sy = if start.row < end.row { 1 } else { -1 };
        let mut err = dx - dy;
        let (mut cx, mut cy) = (start.col, start.row);

        let mut out = Vec::with_capacity((dx + dy + 1) as usize);
        loop {
            out.push(CellCoord::new(cx, cy));
            if cx == end.col && cy == end.row {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                cx += sx;
            }
            if e2 < dx {
                err += dx;
                cy += sy;
            }
        }
        out
    }

    /// Liang-Barsky clip of `from`..`to` against the grid's extent.
    fn clip(&self, from: Vec2, to: Vec2) -> Option<(Vec2, Vec2)> {
        let extent = self.cell_size * self.resolution as f32;
        let d = to - from;
        let (mut t0, mut t1) = (0.0f32, 1.0f32);
        let bounds = [
            (-d.x, from.x),
            (d.x, extent.x - from.x),
            (-d.y, from.y),
            (d.y, extent.y - from.y),
        ];
        for (p, q) in bounds {
            if p == 0.0 {
                // Parallel to this boundary: entirely outside or never crossing.
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                if t > t1 {
                    return None;
                }
                t0 = t0.max(t);
            } else {
                if t < t0 {
                    return None;
                }
                t1 = t1.min(t);
            }
        }
        Some((from + d * t0, from + d * t1))
    }

    /// Obstacle indices bucketed in `cell`. Empty outside the grid.
    pub fn cell(&self, cell: CellCoord) -> &[usize] {
        let res = self.resolution as i32;
        if cell.col < 0 || cell.row < 0 || cell.col >= res || cell.row >= res {
            return &[];
        }
        &self.cells[(cell.row * res + cell.col) as usize]
    }

    /// De-duplicated obstacle indices from every cell along the ray.
    pub fn obstacles_along_ray(&self, from: Vec2, to: Vec2, out: &mut Vec<usize>) {
        out.clear();
        for cell in self.cells_along_ray(from, to) {
            out.extend_from_slice(self.cell(cell));
        }
        out.sort_unstable();
        out.dedup();
    }

    fn clamp(&self, c: CellCoord) -> CellCoord {
        let max = self.resolution as i32 - 1;
        CellCoord::new(c.col.clamp(0, max), c.row.clamp(0, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::scene::StaticScene;
    use crate::api::types::{ObstacleCategory, Viewport};
    use crate::core::geometry::GeometryCache;

    fn index_for(scene: &StaticScene) -> (GeometryCache, SpatialIndex) {
        let mut cache = GeometryCache::new();
        cache.refresh(scene);
        let mut index = SpatialIndex::new(8);
        index.rebuild(cache.get());
        (cache, index)
    }

    #[test]
    fn cell_size_from_viewport() {
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0));
        let (_, index) = index_for(&scene);
        assert_eq!(index.cell_size(), Vec2::new(125.0, 100.0));
        assert_eq!(index.cell_of(Vec2::new(500.0, 400.0)), CellCoord::new(4, 4));
    }

    #[test]
    fn rect_spanning_cells() {
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0));
        let (_, index) = index_for(&scene);
        let mut out = Vec::new();
        index.cells_for_rect(&Rect::from_edges(490.0, 150.0, 510.0, 170.0), &mut out);
        // cols 3..=4, row 1
        assert_eq!(out, vec![8 + 3, 8 + 4]);

        out.clear();
        // ends exactly on a boundary: stays in col 0
        index.cells_for_rect(&Rect::from_edges(0.0, 0.0, 125.0, 100.0), &mut out);
        assert_eq!(out, vec![0]);

        out.clear();
        index.cells_for_rect(&Rect::from_edges(-500.0, -500.0, -10.0, -10.0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn vertical_ray_walks_one_column() {
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0));
        let (_, index) = index_for(&scene);
        let cells = index.cells_along_ray(Vec2::new(500.0, 0.0), Vec2::new(500.0, 400.0));
        let expected: Vec<_> = (0..=4).map(|row| CellCoord::new(4, row)).collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn diagonal_ray_is_bounded_by_resolution() {
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0));
        let (_, index) = index_for(&scene);
        // y = x leaves the 1000x800 grid through the bottom edge at (800, 800)
        let cells = index.cells_along_ray(Vec2::new(-1e6, -1e6), Vec2::new(1e6, 1e6));
        assert_eq!(cells.first(), Some(&CellCoord::new(0, 0)));
        assert_eq!(cells.last(), Some(&CellCoord::new(6, 7)));
        assert!(cells.len() <= 16);
    }

    #[test]
    fn off_screen_end_follows_the_ray() {
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0));
        let (_, index) = index_for(&scene);
        // Tile centre far below the fold; the ray leaves the grid at x ≈ 333.
        let cells = index.cells_along_ray(Vec2::new(100.0, 100.0), Vec2::new(900.0, 2500.0));
        assert_eq!(cells.first(), Some(&CellCoord::new(0, 1)));
        assert_eq!(cells.last(), Some(&CellCoord::new(2, 7)));
        assert!(cells.contains(&CellCoord::new(1, 4)));
        assert!(cells.iter().all(|c| c.col <= 2));
    }

    #[test]
    fn ray_missing_the_grid_walks_nothing() {
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0));
        let (_, index) = index_for(&scene);
        assert!(index
            .cells_along_ray(Vec2::new(-50.0, 900.0), Vec2::new(2000.0, 1200.0))
            .is_empty());
        // parallel to and outside the left edge
        assert!(index
            .cells_along_ray(Vec2::new(-10.0, 0.0), Vec2::new(-10.0, 800.0))
            .is_empty());
    }

    #[test]
    fn ray_collects_deduplicated_obstacles() {
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0))
            // spans rows 1..=2 of column 4
            .with_obstacle(1, Rect::from_edges(480.0, 150.0, 520.0, 250.0), ObstacleCategory::Tile)
            .with_obstacle(
                2,
                Rect::from_edges(10.0, 700.0, 30.0, 720.0),
                ObstacleCategory::TextIcon,
            );
        let (_, index) = index_for(&scene);
        let mut out = Vec::new();
        index.obstacles_along_ray(Vec2::new(500.0, 0.0), Vec2::new(500.0, 400.0), &mut out);
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn tracks_snapshot_generation() {
        let mut scene = StaticScene::new(Viewport::new(1000.0, 800.0));
        let (mut cache, index) = index_for(&scene);
        assert!(index.is_current(cache.get()));
        scene.scroll_by(0.0, 10.0);
        cache.refresh(&scene);
        assert!(!index.is_current(cache.get()));
    }
}
