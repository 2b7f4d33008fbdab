use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable identity of a page element across geometry refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

/// Axis-aligned rectangle in viewport coordinates (Y-down, pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    /// Build a rectangle from its four edges.
    pub fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// The four edges as segments, clockwise from the top edge.
    pub fn edges(&self) -> [(Vec2, Vec2); 4] {
        let tl = Vec2::new(self.left, self.top);
        let tr = Vec2::new(self.right(), self.top);
        let br = Vec2::new(self.right(), self.bottom());
        let bl = Vec2::new(self.left, self.bottom());
        [(tl, tr), (tr, br), (br, bl), (bl, tl)]
    }

    /// True when this rectangle does not overlap the box spanned by `min`..`max`.
    /// Touching edges count as overlap.
    pub fn is_outside(&self, min: Vec2, max: Vec2) -> bool {
        self.right() < min.x || self.left > max.x || self.bottom() < min.y || self.top > max.y
    }
}

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Semantic group a tile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileGroup {
    Card,
    Stat,
}

impl TileGroup {
    pub fn as_f32(self) -> f32 {
        match self {
            TileGroup::Card => 0.0,
            TileGroup::Stat => 1.0,
        }
    }
}

/// What kind of surface blocks a ray. Selects the attenuation curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleCategory {
    /// Another tile: fully opaque.
    Tile,
    /// Wood-textured or similar decorative surface.
    Decorative,
    /// Text, icons, labels.
    TextIcon,
}

impl ObstacleCategory {
    pub const ALL: [ObstacleCategory; 3] = [
        ObstacleCategory::Tile,
        ObstacleCategory::Decorative,
        ObstacleCategory::TextIcon,
    ];

    pub fn index(self) -> usize {
        match self {
            ObstacleCategory::Tile => 0,
            ObstacleCategory::Decorative => 1,
            ObstacleCategory::TextIcon => 2,
        }
    }
}
