use serde::{Deserialize, Serialize};

use crate::api::types::{ObstacleCategory, TileGroup};

/// Engine configuration. Every tunable has a default, so a partial JSON
/// object (or `{}`) is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Spatial index resolution: the viewport is split into N×N cells.
    pub grid_resolution: u32,
    /// How far the light point is pulled toward the viewport centre (0 = none, 1 = all the way).
    pub light_blend: f32,
    /// Full width of the angle jitter window in degrees (5.0 gives ±2.5°).
    pub jitter_span_degrees: f32,
    /// Once a category has an intersection closer than this, stop scanning it.
    pub near_cutoff: f32,
    /// Slack (px) when checking that an intersection lies on both segments.
    pub edge_tolerance: f32,
    pub attenuation: Attenuation,
    pub orientation: OrientationTuning,
    /// Fixed brightness of the overlay gloss layer.
    pub overlay_brightness: f32,
    /// Fixed brightness of wood-textured images.
    pub wood_brightness: f32,
    /// Seed for the jitter generator.
    pub seed: u64,
    /// Classes added to page sections while the effect is on.
    pub section_effects: Vec<SectionEffect>,
    pub selectors: Selectors,
}

/// A clamped linear map `distance / divisor` into `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttenuationCurve {
    pub divisor: f32,
    pub min: f32,
    pub max: f32,
}

impl AttenuationCurve {
    pub const fn new(divisor: f32, min: f32, max: f32) -> Self {
        Self { divisor, min, max }
    }

    pub fn apply(&self, distance: f32) -> f32 {
        (distance / self.divisor).clamp(self.min, self.max)
    }
}

/// Per-category attenuation curves for pointer mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attenuation {
    pub tile: AttenuationCurve,
    pub decorative: AttenuationCurve,
    pub text_icon: AttenuationCurve,
}

impl Attenuation {
    pub fn curve(&self, category: ObstacleCategory) -> &AttenuationCurve {
        match category {
            ObstacleCategory::Tile => &self.tile,
            ObstacleCategory::Decorative => &self.decorative,
            ObstacleCategory::TextIcon => &self.text_icon,
        }
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            tile: AttenuationCurve::new(200.0, 0.1, 0.7),
            decorative: AttenuationCurve::new(200.0, 0.18, 0.6),
            text_icon: AttenuationCurve::new(200.0, 0.3, 0.85),
        }
    }
}

/// Constants for orientation-driven highlights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationTuning {
    pub base_angle: f32,
    pub portrait_divisor: f32,
    pub landscape_divisor: f32,
    pub min_brightness: f32,
    pub max_brightness: f32,
}

impl Default for OrientationTuning {
    fn default() -> Self {
        Self {
            base_angle: 90.0,
            portrait_divisor: 120.0,
            landscape_divisor: 90.0,
            min_brightness: 0.15,
            max_brightness: 1.0,
        }
    }
}

/// A class toggled on one page section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionEffect {
    pub selector: String,
    pub class: String,
}

impl SectionEffect {
    pub fn new(selector: &str, class: &str) -> Self {
        Self {
            selector: selector.to_string(),
            class: class.to_string(),
        }
    }
}

/// A tile selector and the group its matches belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSelector {
    pub selector: String,
    pub group: TileGroup,
}

/// Document selectors used by a DOM-backed scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub tiles: Vec<TileSelector>,
    pub text_icons: Vec<String>,
    pub wood: String,
    pub overlay: String,
    pub toggle: String,
    pub permission_button: String,
    pub telemetry: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            tiles: vec![
                TileSelector { selector: ".service__card".into(), group: TileGroup::Card },
                TileSelector { selector: ".stat".into(), group: TileGroup::Stat },
            ],
            text_icons: [
                ".service__icon",
                "h3",
                "p",
                ".section__title",
                ".image-marker-label",
                ".image-marker-dot",
                ".image-marker-desc",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            wood: ".wood-reflection".into(),
            overlay: ".overlay-glass".into(),
            toggle: "#reflection-toggle".into(),
            permission_button: "#get-orientation".into(),
            telemetry: "#gyro-info".into(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_resolution: 8,
            light_blend: 0.5,
            jitter_span_degrees: 5.0,
            near_cutoff: 5.0,
            edge_tolerance: 0.5,
            attenuation: Attenuation::default(),
            orientation: OrientationTuning::default(),
            overlay_brightness: 0.45,
            wood_brightness: 0.22,
            seed: 42,
            section_effects: vec![
                SectionEffect::new(".hero", "matte-hero"),
                SectionEffect::new(".about", "metallic-about"),
                SectionEffect::new(".services", "water-service"),
            ],
            selectors: Selectors::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Disable angle jitter (deterministic output).
    pub fn without_jitter(mut self) -> Self {
        self.jitter_span_degrees = 0.0;
        self
    }

    /// Grid resolution, never below one cell.
    pub fn grid(&self) -> u32 {
        self.grid_resolution.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.grid_resolution, 8);
        assert_eq!(config.attenuation.tile, AttenuationCurve::new(200.0, 0.1, 0.7));
    }

    #[test]
    fn partial_override() {
        let json = r#"{
            "grid_resolution": 16,
            "attenuation": { "text_icon": { "divisor": 100, "min": 0.2, "max": 0.9 } },
            "selectors": { "tiles": [ { "selector": ".tile", "group": "stat" } ] }
        }"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.grid_resolution, 16);
        assert_eq!(config.attenuation.text_icon.divisor, 100.0);
        // untouched curves keep their defaults
        assert_eq!(config.attenuation.tile.max, 0.7);
        assert_eq!(config.selectors.tiles.len(), 1);
        assert_eq!(config.selectors.tiles[0].group, TileGroup::Stat);
        assert_eq!(config.selectors.wood, ".wood-reflection");
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(EngineConfig::from_json("{ grid_resolution: }").is_err());
    }

    #[test]
    fn curve_clamps() {
        let curve = AttenuationCurve::new(200.0, 0.1, 0.7);
        assert_eq!(curve.apply(0.0), 0.1);
        assert_eq!(curve.apply(100.0), 0.5);
        assert_eq!(curve.apply(170.0), 0.7);
        assert_eq!(curve.apply(f32::MAX), 0.7);
    }

    #[test]
    fn zero_grid_is_one_cell() {
        let mut config = EngineConfig::default();
        config.grid_resolution = 0;
        assert_eq!(config.grid(), 1);
    }
}
