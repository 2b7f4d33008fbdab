//! Scene providers: the engine's only view of the page.
//!
//! A provider reports the viewport size and a flat list of `{id, rect, role}`
//! tuples. The DOM-backed provider lives in the web bridge; `StaticScene`
//! serves tests and headless callers.

use crate::api::types::{ElementId, ObstacleCategory, Rect, TileGroup, Viewport};

/// What an element is to the reflection engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRole {
    /// Receives a highlight and blocks rays to other tiles.
    Tile(TileGroup),
    /// Blocks rays only.
    Obstacle(ObstacleCategory),
    /// Wood-textured image: a secondary surface that also blocks rays as a
    /// decorative obstacle.
    Wood,
    /// Full-bleed gloss layer. Never blocks anything.
    Overlay,
}

/// One element as seen by a scene query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneElement {
    pub id: ElementId,
    pub rect: Rect,
    pub role: ElementRole,
}

/// Source of element geometry.
pub trait SceneProvider {
    /// Current viewport size.
    fn viewport(&self) -> Viewport;

    /// Append every element currently on the page to `out`.
    /// Elements that no longer exist are simply not reported.
    fn collect(&self, out: &mut Vec<SceneElement>);
}

/// In-memory scene with hand-placed elements.
#[derive(Debug, Clone, Default)]
pub struct StaticScene {
    viewport: Viewport,
    elements: Vec<SceneElement>,
}

impl StaticScene {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, id: u32, rect: Rect, role: ElementRole) -> Self {
        self.insert(id, rect, role);
        self
    }

    pub fn with_tile(self, id: u32, rect: Rect, group: TileGroup) -> Self {
        self.with_element(id, rect, ElementRole::Tile(group))
    }

    pub fn with_obstacle(self, id: u32, rect: Rect, category: ObstacleCategory) -> Self {
        self.with_element(id, rect, ElementRole::Obstacle(category))
    }

    /// Add or replace an element.
    pub fn insert(&mut self, id: u32, rect: Rect, role: ElementRole) {
        let id = ElementId(id);
        self.remove(id);
        self.elements.push(SceneElement { id, rect, role });
    }

    /// Remove an element. Returns it if it was present.
    pub fn remove(&mut self, id: ElementId) -> Option<SceneElement> {
        let idx = self.elements.iter().position(|e| e.id == id)?;
        Some(self.elements.remove(idx))
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Shift every element, as a page scroll would.
    pub fn scroll_by(&mut self, dx: f32, dy: f32) {
        for e in &mut self.elements {
            e.rect.left -= dx;
            e.rect.top -= dy;
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl SceneProvider for StaticScene {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn collect(&self, out: &mut Vec<SceneElement>) {
        out.extend_from_slice(&self.elements);
    }
}
