pub mod api;
pub mod core;
pub mod systems;
pub mod bridge;
pub mod input;
pub mod lifecycle;

// Re-export key types at crate root for convenience
pub use api::config::{
    Attenuation, AttenuationCurve, EngineConfig, OrientationTuning, SectionEffect, Selectors,
    TileSelector,
};
pub use api::engine::{FrameReport, ReflectionEngine};
pub use api::scene::{ElementRole, SceneElement, SceneProvider, StaticScene};
pub use api::types::{ElementId, ObstacleCategory, Rect, TileGroup, Viewport};
pub use bridge::style::{ReflectionRecord, StyleBuffer, StyleCommand, StyleTarget, Surface};
pub use crate::core::geometry::{GeometryCache, GeometrySnapshot, ObstacleGeometry, TileGeometry};
pub use crate::core::grid::{CellCoord, SpatialIndex};
pub use crate::core::scheduler::FrameScheduler;
pub use input::samples::{LightSample, OrientationSample, PendingSamples, Posture};
pub use lifecycle::{
    EffectState, HostAction, InputModality, LifecycleController, OrientationSupport, Permission,
    Platform,
};
pub use systems::cache::ReflectionCache;
pub use systems::jitter::{Jitter, Rng};
pub use systems::obstruction::{segment_intersection, ObstructionDistances, ObstructionResolver};
pub use systems::reflection::{normalize_degrees, ReflectionCalculator, ReflectionParams};
