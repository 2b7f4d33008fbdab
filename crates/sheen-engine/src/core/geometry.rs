//! Geometry cache: a snapshot of every tile and obstacle rectangle.
//!
//! The snapshot is only refreshed on layout-affecting events (resize,
//! scroll), never on pointer moves. Each refresh bumps a generation counter
//! so dependents (the spatial index) can tell when they are out of date.

use std::collections::HashSet;

use crate::api::scene::{ElementRole, SceneElement, SceneProvider};
use crate::api::types::{ElementId, ObstacleCategory, Rect, TileGroup, Viewport};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGeometry {
    pub id: ElementId,
    pub rect: Rect,
    pub group: TileGroup,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleGeometry {
    pub id: ElementId,
    pub rect: Rect,
    pub category: ObstacleCategory,
}

/// One consistent read of the page layout.
#[derive(Debug, Clone, Default)]
pub struct GeometrySnapshot {
    pub viewport: Viewport,
    pub tiles: Vec<TileGeometry>,
    /// Every ray blocker, tiles included.
    pub obstacles: Vec<ObstacleGeometry>,
    pub wood: Vec<ElementId>,
    pub overlays: Vec<ElementId>,
    pub generation: u64,
}

impl GeometrySnapshot {
    pub fn tile(&self, id: ElementId) -> Option<&TileGeometry> {
        self.tiles.iter().find(|t| t.id == id)
    }
}

pub struct GeometryCache {
    snapshot: GeometrySnapshot,
    scratch: Vec<SceneElement>,
    seen: HashSet<ElementId>,
    stale: bool,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self {
            snapshot: GeometrySnapshot::default(),
            scratch: Vec::with_capacity(64),
            seen: HashSet::new(),
            stale: true,
        }
    }

    /// Re-query the scene and record every element's rectangle.
    /// Returns the new snapshot generation.
    pub fn refresh<S: SceneProvider + ?Sized>(&mut self, scene: &S) -> u64 {
        self.scratch.clear();
        self.seen.clear();
        scene.collect(&mut self.scratch);

        let snap = &mut self.snapshot;
        snap.viewport = scene.viewport();
        snap.tiles.clear();
        snap.obstacles.clear();
        snap.wood.clear();
        snap.overlays.clear();

        for el in &self.scratch {
            // First role reported for an element wins.
            if !self.seen.insert(el.id) {
                continue;
            }
            let blocker = match el.role {
                ElementRole::Tile(group) => {
                    snap.tiles.push(TileGeometry { id: el.id, rect: el.rect, group });
                    Some(ObstacleCategory::Tile)
                }
                ElementRole::Obstacle(category) => Some(category),
                ElementRole::Wood => {
                    snap.wood.push(el.id);
                    Some(ObstacleCategory::Decorative)
                }
                ElementRole::Overlay => {
                    snap.overlays.push(el.id);
                    None
                }
            };
            if let Some(category) = blocker {
                // Collapsed (hidden) elements cannot block anything.
                if el.rect.width > 0.0 && el.rect.height > 0.0 {
                    snap.obstacles.push(ObstacleGeometry { id: el.id, rect: el.rect, category });
                }
            }
        }

        snap.generation += 1;
        self.stale = false;
        log::debug!(
            "geometry refresh #{}: {} tiles, {} obstacles",
            snap.generation,
            snap.tiles.len(),
            snap.obstacles.len()
        );
        snap.generation
    }

    /// Last snapshot, without re-querying.
    pub fn get(&self) -> &GeometrySnapshot {
        &self.snapshot
    }

    /// Mark the snapshot out of date; the next frame refreshes it.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new()
    }
}
