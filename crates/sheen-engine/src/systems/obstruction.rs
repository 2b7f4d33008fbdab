//! Ray-obstruction resolver.
//!
//! For a tile and a light point, finds the nearest point where the segment
//! light → tile centre crosses an obstacle edge, tracked separately per
//! obstacle category. Only obstacles bucketed in cells the ray traverses
//! are considered.

use glam::Vec2;

use crate::api::config::EngineConfig;
use crate::api::types::ObstacleCategory;
use crate::core::geometry::{GeometrySnapshot, TileGeometry};
use crate::core::grid::SpatialIndex;

/// Nearest intersection distance per category. `f32::INFINITY` means the
/// ray is unobstructed in that category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstructionDistances {
    pub tile: f32,
    pub decorative: f32,
    pub text_icon: f32,
}

impl ObstructionDistances {
    pub const CLEAR: Self = Self {
        tile: f32::INFINITY,
        decorative: f32::INFINITY,
        text_icon: f32::INFINITY,
    };

    pub fn get(&self, category: ObstacleCategory) -> f32 {
        match category {
            ObstacleCategory::Tile => self.tile,
            ObstacleCategory::Decorative => self.decorative,
            ObstacleCategory::TextIcon => self.text_icon,
        }
    }

    fn slot_mut(&mut self, category: ObstacleCategory) -> &mut f32 {
        match category {
            ObstacleCategory::Tile => &mut self.tile,
            ObstacleCategory::Decorative => &mut self.decorative,
            ObstacleCategory::TextIcon => &mut self.text_icon,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.nearest().is_none()
    }

    /// The category with the smallest finite distance. Ties go to the more
    /// opaque category (tile, then decorative, then text/icon).
    pub fn nearest(&self) -> Option<(ObstacleCategory, f32)> {
        ObstacleCategory::ALL
            .iter()
            .map(|&c| (c, self.get(c)))
            .filter(|(_, d)| d.is_finite())
            .fold(None, |best, (c, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((c, d)),
            })
    }
}

impl Default for ObstructionDistances {
    fn default() -> Self {
        Self::CLEAR
    }
}

/// Intersection point of segments `a0`..`a1` and `b0`..`b1`, if any.
///
/// Solves the two parametric line equations and accepts the solution only
/// if it lies within both segments' extents, widened by `tolerance` pixels.
/// Parallel (and degenerate) segments never intersect.
pub fn segment_intersection(
    a0: Vec2,
    a1: Vec2,
    b0: Vec2,
    b1: Vec2,
    tolerance: f32,
) -> Option<Vec2> {
    let da = a0 - a1;
    let db = b0 - b1;
    let denom = da.x * db.y - da.y * db.x;
    if denom == 0.0 {
        return None;
    }
    let ca = a0.x * a1.y - a0.y * a1.x;
    let cb = b0.x * b1.y - b0.y * b1.x;
    let p = Vec2::new(
        (ca * db.x - da.x * cb) / denom,
        (ca * db.y - da.y * cb) / denom,
    );

    let within = |s0: Vec2, s1: Vec2| {
        let lo = s0.min(s1) - Vec2::splat(tolerance);
        let hi = s0.max(s1) + Vec2::splat(tolerance);
        p.cmpge(lo).all() && p.cmple(hi).all()
    };
    if within(a0, a1) && within(b0, b1) {
        Some(p)
    } else {
        None
    }
}

pub struct ObstructionResolver {
    near_cutoff: f32,
    edge_tolerance: f32,
    candidates: Vec<usize>,
}

impl ObstructionResolver {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            near_cutoff: config.near_cutoff,
            edge_tolerance: config.edge_tolerance,
            candidates: Vec::with_capacity(32),
        }
    }

    /// Nearest obstruction per category between `light` and the tile centre.
    pub fn obstruction_distances(
        &mut self,
        index: &SpatialIndex,
        snapshot: &GeometrySnapshot,
        tile: &TileGeometry,
        light: Vec2,
    ) -> ObstructionDistances {
        self.obstruction_distances_with(index, snapshot, tile, light, segment_intersection)
    }

    /// Same as [`obstruction_distances`](Self::obstruction_distances) with a
    /// caller-supplied segment intersection routine.
    pub fn obstruction_distances_with<F>(
        &mut self,
        index: &SpatialIndex,
        snapshot: &GeometrySnapshot,
        tile: &TileGeometry,
        light: Vec2,
        mut intersect: F,
    ) -> ObstructionDistances
    where
        F: FnMut(Vec2, Vec2, Vec2, Vec2, f32) -> Option<Vec2>,
    {
        debug_assert!(index.is_current(snapshot), "spatial index queried against a newer snapshot");

        let mut out = ObstructionDistances::CLEAR;
        let center = tile.rect.center();
        index.obstacles_along_ray(light, center, &mut self.candidates);
        if self.candidates.is_empty() {
            return out;
        }

        let ray_min = light.min(center);
        let ray_max = light.max(center);

        for &i in &self.candidates {
            let Some(obstacle) = snapshot.obstacles.get(i) else {
                continue;
            };
            if obstacle.id == tile.id || obstacle.rect.is_outside(ray_min, ray_max) {
                continue;
            }
            let slot = out.slot_mut(obstacle.category);
            // Already about as blocked as it gets in this category.
            if *slot < self.near_cutoff {
                continue;
            }
            for (e0, e1) in obstacle.rect.edges() {
                if let Some(p) = intersect(light, center, e0, e1, self.edge_tolerance) {
                    let dist = p.distance(light);
                    if dist < *slot {
                        *slot = dist;
                        if dist < self.near_cutoff {
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::scene::StaticScene;
    use crate::api::types::{ElementId, Rect, TileGroup, Viewport};
    use crate::core::geometry::GeometryCache;

    const TEXT: ObstacleCategory = ObstacleCategory::TextIcon;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn crossing_segments() {
        let p = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 0.0),
            0.5,
        )
        .unwrap();
        assert!(approx(p.x, 5.0) && approx(p.y, 5.0));
    }

    #[test]
    fn parallel_segments_never_meet() {
        assert!(segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(10.0, 1.0),
            0.5,
        )
        .is_none());
    }

    #[test]
    fn tolerance_absorbs_edge_cases() {
        // Lines meet at x = 10.3, just past the end of the first segment.
        let a0 = Vec2::new(0.0, 0.0);
        let a1 = Vec2::new(10.0, 0.0);
        let b0 = Vec2::new(10.3, -5.0);
        let b1 = Vec2::new(10.3, 5.0);
        assert!(segment_intersection(a0, a1, b0, b1, 0.5).is_some());
        assert!(segment_intersection(a0, a1, b0, b1, 0.0).is_none());
    }

    #[test]
    fn nearest_prefers_smallest_finite() {
        let d = ObstructionDistances { tile: 300.0, decorative: f32::INFINITY, text_icon: 40.0 };
        assert_eq!(d.nearest(), Some((ObstacleCategory::TextIcon, 40.0)));
        assert!(ObstructionDistances::CLEAR.is_clear());
        let tie = ObstructionDistances { tile: 40.0, decorative: 40.0, text_icon: 40.0 };
        assert_eq!(tie.nearest(), Some((ObstacleCategory::Tile, 40.0)));
    }

    fn setup(scene: &StaticScene) -> (GeometryCache, SpatialIndex, ObstructionResolver) {
        let mut cache = GeometryCache::new();
        cache.refresh(scene);
        let mut index = SpatialIndex::new(8);
        index.rebuild(cache.get());
        (cache, index, ObstructionResolver::new(&EngineConfig::default()))
    }

    #[test]
    fn tile_blocker_between_light_and_tile() {
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0))
            .with_tile(1, Rect::from_edges(450.0, 375.0, 550.0, 425.0), TileGroup::Card)
            .with_tile(2, Rect::from_edges(490.0, 150.0, 510.0, 170.0), TileGroup::Stat);
        let (cache, index, mut resolver) = setup(&scene);
        let tile = *cache.get().tile(ElementId(1)).unwrap();

        let d = resolver.obstruction_distances(&index, cache.get(), &tile, Vec2::new(500.0, 0.0));
        // enters through the top edge
        assert!(approx(d.tile, 150.0), "tile distance {}", d.tile);
        assert!(d.decorative.is_infinite());
        assert!(d.text_icon.is_infinite());
    }

    #[test]
    fn label_on_ray_to_tile_below_the_fold() {
        // Tile centre (900, 2500) is far off-screen; the ray crosses the
        // label's top edge at (200, 400) before leaving the viewport.
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0))
            .with_tile(1, Rect::from_edges(850.0, 2450.0, 950.0, 2550.0), TileGroup::Card)
            .with_obstacle(2, Rect::from_edges(190.0, 400.0, 230.0, 440.0), TEXT);
        let (cache, index, mut resolver) = setup(&scene);
        let tile = cache.get().tiles[0];

        let d = resolver.obstruction_distances(&index, cache.get(), &tile, Vec2::new(100.0, 100.0));
        let expected = Vec2::new(100.0, 100.0).distance(Vec2::new(200.0, 400.0));
        assert!((d.text_icon - expected).abs() < 0.01, "text distance {}", d.text_icon);
        assert!(d.tile.is_infinite());
    }

    #[test]
    fn tile_never_blocks_itself() {
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0))
            .with_tile(1, Rect::from_edges(450.0, 375.0, 550.0, 425.0), TileGroup::Card);
        let (cache, index, mut resolver) = setup(&scene);
        let tile = cache.get().tiles[0];
        let d = resolver.obstruction_distances(&index, cache.get(), &tile, Vec2::new(10.0, 10.0));
        assert!(d.is_clear());
    }

    #[test]
    fn obstacle_off_the_ray_box_is_not_tested() {
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0))
            .with_tile(1, Rect::from_edges(450.0, 375.0, 550.0, 425.0), TileGroup::Card)
            // same grid column, but below the tile centre
            .with_obstacle(2, Rect::from_edges(490.0, 410.0, 510.0, 420.0), TEXT);
        let (cache, index, mut resolver) = setup(&scene);
        let tile = cache.get().tiles[0];
        let mut calls = 0;
        let d = resolver.obstruction_distances_with(
            &index,
            cache.get(),
            &tile,
            Vec2::new(500.0, 0.0),
            |a0, a1, b0, b1, tol| {
                calls += 1;
                segment_intersection(a0, a1, b0, b1, tol)
            },
        );
        assert!(d.is_clear());
        assert_eq!(calls, 0);
    }

    #[test]
    fn near_cutoff_stops_category_scan() {
        // Light sits just above a text label; two more labels further down.
        let scene = StaticScene::new(Viewport::new(1000.0, 800.0))
            .with_tile(1, Rect::from_edges(450.0, 375.0, 550.0, 425.0), TileGroup::Card)
            .with_obstacle(2, Rect::from_edges(490.0, 52.0, 510.0, 60.0), TEXT)
            .with_obstacle(3, Rect::from_edges(490.0, 120.0, 510.0, 130.0), TEXT)
            .with_obstacle(4, Rect::from_edges(490.0, 220.0, 510.0, 230.0), TEXT);
        let (cache, index, mut resolver) = setup(&scene);
        let tile = cache.get().tiles[0];
        let mut calls = 0;
        let d = resolver.obstruction_distances_with(
            &index,
            cache.get(),
            &tile,
            Vec2::new(500.0, 50.0),
            |a0, a1, b0, b1, tol| {
                calls += 1;
                segment_intersection(a0, a1, b0, b1, tol)
            },
        );
        assert!(approx(d.text_icon, 2.0));
        // only the top edge of the first label was tested
        assert_eq!(calls, 1);
    }
}
