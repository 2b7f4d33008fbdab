use std::collections::{BTreeSet, HashSet};

use glam::Vec2;

use crate::api::config::EngineConfig;
use crate::api::scene::SceneProvider;
use crate::api::types::ElementId;
use crate::bridge::style::{
    ReflectionRecord, StyleBuffer, StyleCommand, StyleTarget, Surface, BODY_CLASS, TILE_CLASS,
};
use crate::core::geometry::{GeometryCache, GeometrySnapshot};
use crate::core::grid::SpatialIndex;
use crate::core::scheduler::FrameScheduler;
use crate::input::samples::{LightSample, OrientationSample, PendingSamples};
use crate::lifecycle::{HostAction, InputModality, LifecycleController, Platform};
use crate::systems::cache::ReflectionCache;
use crate::systems::jitter::Jitter;
use crate::systems::obstruction::{ObstructionDistances, ObstructionResolver};
use crate::systems::reflection::{ReflectionCalculator, ReflectionParams};

/// What one frame callback did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// The geometry snapshot was re-read this frame.
    pub geometry_refreshed: bool,
    /// Pointer sample consumed by this frame, if any.
    pub pointer: Option<Vec2>,
    /// Orientation sample consumed by this frame, if any.
    pub orientation: Option<OrientationSample>,
    pub tiles_written: usize,
    /// Tiles whose value matched the cache and were not rewritten.
    pub tiles_skipped: usize,
    /// Angle jitter shared by every surface this frame.
    pub jitter: f32,
}

impl FrameReport {
    /// Number of full tile-set recomputations performed.
    pub fn passes(&self) -> usize {
        self.pointer.is_some() as usize + self.orientation.is_some() as usize
    }
}

/// The reflection engine: one instance owns all effect state.
///
/// Input handlers only stash samples and ask for a frame; the host runs
/// [`run_frame`](Self::run_frame) once per display refresh and applies the
/// style commands it produced.
pub struct ReflectionEngine {
    config: EngineConfig,
    lifecycle: LifecycleController,
    geometry: GeometryCache,
    index: SpatialIndex,
    resolver: ObstructionResolver,
    calculator: ReflectionCalculator,
    jitter: Jitter,
    cache: ReflectionCache,
    pending: PendingSamples,
    frame: FrameScheduler,
    hidden: bool,
    last_orientation: Option<OrientationSample>,
    styles: StyleBuffer,
    records: Vec<ReflectionRecord>,
    /// Elements carrying engine-written styles, stripped on disable.
    decorated: BTreeSet<(ElementId, Surface)>,
}

impl ReflectionEngine {
    pub fn new(config: EngineConfig, platform: Platform) -> Self {
        Self {
            lifecycle: LifecycleController::new(platform),
            geometry: GeometryCache::new(),
            index: SpatialIndex::new(config.grid()),
            resolver: ObstructionResolver::new(&config),
            calculator: ReflectionCalculator::new(&config),
            jitter: Jitter::new(config.seed, config.jitter_span_degrees),
            cache: ReflectionCache::new(),
            pending: PendingSamples::new(),
            frame: FrameScheduler::new(),
            hidden: false,
            last_orientation: None,
            styles: StyleBuffer::new(),
            records: Vec::new(),
            decorated: BTreeSet::new(),
            config,
        }
    }

    // ---- Lifecycle ----

    /// Turn the effect on. No-op (empty action list) if already on.
    pub fn enable<S: SceneProvider + ?Sized>(&mut self, scene: &S) -> Vec<HostAction> {
        let actions = self.lifecycle.enable();
        if actions.is_empty() {
            return actions;
        }
        self.hidden = false;
        self.cache.clear();
        self.pending.clear();
        self.refresh_geometry(scene);

        self.styles.add_class(StyleTarget::Body, BODY_CLASS);
        for effect in &self.config.section_effects {
            self.styles
                .add_class(StyleTarget::Selector(effect.selector.clone()), &effect.class);
        }

        let snap = self.geometry.get();
        if self.lifecycle.platform().modality == InputModality::Pointer {
            for tile in &snap.tiles {
                self.styles.add_class(StyleTarget::Element(tile.id), TILE_CLASS);
                self.decorated.insert((tile.id, Surface::Tile));
            }
        }

        // Wood starts lit from straight above until the first sample arrives.
        let angle = self
            .calculator
            .backdrop_angle(None, snap.viewport, self.jitter.sample());
        let params = self.calculator.wood(angle);
        for &id in &snap.wood {
            write_surface(
                &mut self.cache,
                &mut self.styles,
                &mut self.decorated,
                id,
                Surface::Wood,
                &params,
            );
        }
        actions
    }

    /// Turn the effect off, strip every engine-written style and forget all
    /// cached values. No-op if already off.
    pub fn disable(&mut self) -> Vec<HostAction> {
        let actions = self.lifecycle.disable();
        if actions.is_empty() {
            return actions;
        }

        let snap = self.geometry.get();
        let mut targets = std::mem::take(&mut self.decorated);
        targets.extend(snap.tiles.iter().map(|t| (t.id, Surface::Tile)));
        targets.extend(snap.wood.iter().map(|&id| (id, Surface::Wood)));
        targets.extend(snap.overlays.iter().map(|&id| (id, Surface::Overlay)));
        for (id, surface) in targets {
            self.styles.clear(id, surface);
        }

        self.styles.remove_class(StyleTarget::Body, BODY_CLASS);
        for effect in &self.config.section_effects {
            self.styles
                .remove_class(StyleTarget::Selector(effect.selector.clone()), &effect.class);
        }

        self.cache.clear();
        self.pending.clear();
        self.records.clear();
        actions
    }

    /// Outcome of the orientation permission prompt.
    pub fn resolve_permission(&mut self, granted: bool) -> Vec<HostAction> {
        self.lifecycle.resolve_permission(granted)
    }

    pub fn is_enabled(&self) -> bool {
        self.lifecycle.is_enabled()
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    // ---- Input ----
    //
    // Each returns `true` when the host must queue a frame callback.

    pub fn on_pointer_move(&mut self, x: f32, y: f32) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.pending.push(LightSample::Pointer(Vec2::new(x, y)));
        self.frame.request()
    }

    pub fn on_orientation(&mut self, alpha: f32, beta: f32, gamma: f32) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let sample = OrientationSample::new(alpha, beta, gamma);
        self.last_orientation = Some(sample);
        self.pending.push(LightSample::Orientation(sample));
        self.frame.request()
    }

    /// Viewport resized or something scrolled.
    pub fn on_layout_change(&mut self) -> bool {
        self.geometry.invalidate();
        if !self.accepts_input() {
            return false;
        }
        self.frame.request()
    }

    /// Page visibility changed. While hidden, frames do nothing and samples
    /// are dropped.
    pub fn on_visibility_change(&mut self, hidden: bool) {
        self.hidden = hidden;
        if hidden {
            self.pending.clear();
        } else {
            // Layout may have changed while we were away.
            self.geometry.invalidate();
        }
    }

    fn accepts_input(&self) -> bool {
        self.lifecycle.is_enabled() && !self.hidden
    }

    // ---- Frame ----

    /// The per-frame callback. Drains pending samples and recomputes every
    /// tile once per modality present, pointer first.
    pub fn run_frame<S: SceneProvider + ?Sized>(&mut self, scene: &S) -> FrameReport {
        let mut report = FrameReport::default();
        self.frame.begin();
        // Disabled (or hidden) after the callback was queued.
        if !self.accepts_input() {
            self.pending.clear();
            return report;
        }

        if self.geometry.is_stale() {
            self.refresh_geometry(scene);
            report.geometry_refreshed = true;
        }
        if !self.index.is_current(self.geometry.get()) {
            self.rebuild_index();
        }

        let (pointer, orientation) = self.pending.drain();
        if pointer.is_none() && orientation.is_none() {
            return report;
        }

        report.jitter = self.jitter.sample();
        self.records.clear();
        if let Some(light) = pointer {
            report.pointer = Some(light);
            self.pointer_pass(light, &mut report);
        }
        if let Some(sample) = orientation {
            report.orientation = Some(sample);
            self.orientation_pass(&sample, &mut report);
        }
        log::trace!(
            "frame: {} written, {} skipped, jitter {:.2}",
            report.tiles_written,
            report.tiles_skipped,
            report.jitter
        );
        report
    }

    /// Whether a frame callback is currently queued.
    pub fn frame_pending(&self) -> bool {
        self.frame.is_pending()
    }

    fn pointer_pass(&mut self, light: Vec2, report: &mut FrameReport) {
        let Self {
            geometry,
            index,
            resolver,
            calculator,
            cache,
            styles,
            records,
            decorated,
            ..
        } = self;
        let snap = geometry.get();

        for tile in &snap.tiles {
            let distances = resolver.obstruction_distances(index, snap, tile, light);
            let params =
                calculator.pointer(&tile.rect, light, snap.viewport, &distances, report.jitter);
            records.push(ReflectionRecord::new(tile.id, tile.group, &params));
            if write_surface(cache, styles, decorated, tile.id, Surface::Tile, &params) {
                report.tiles_written += 1;
            } else {
                report.tiles_skipped += 1;
            }
        }

        let angle = calculator.backdrop_angle(Some(light), snap.viewport, report.jitter);
        write_backdrops(snap, calculator, cache, styles, decorated, angle);
    }

    fn orientation_pass(&mut self, sample: &OrientationSample, report: &mut FrameReport) {
        let Self {
            geometry,
            calculator,
            cache,
            styles,
            records,
            decorated,
            ..
        } = self;
        let snap = geometry.get();
        let params = calculator.orientation(sample, report.jitter);

        for tile in &snap.tiles {
            records.push(ReflectionRecord::new(tile.id, tile.group, &params));
            if write_surface(cache, styles, decorated, tile.id, Surface::Tile, &params) {
                report.tiles_written += 1;
            } else {
                report.tiles_skipped += 1;
            }
        }

        write_backdrops(snap, calculator, cache, styles, decorated, params.angle);
    }

    // ---- Direct entry points ----

    /// Re-read the scene and rebuild the spatial index from it.
    /// Returns the new snapshot generation.
    pub fn refresh_geometry<S: SceneProvider + ?Sized>(&mut self, scene: &S) -> u64 {
        let generation = self.geometry.refresh(scene);
        let snap = self.geometry.get();
        let live: HashSet<ElementId> = snap
            .tiles
            .iter()
            .map(|t| t.id)
            .chain(snap.wood.iter().copied())
            .chain(snap.overlays.iter().copied())
            .collect();
        self.cache.retain(|id| live.contains(&id));
        self.index.rebuild(snap);
        generation
    }

    pub fn rebuild_index(&mut self) {
        self.index.rebuild(self.geometry.get());
    }

    /// Obstruction distances for one tile, or `None` if it is not in the
    /// current snapshot.
    pub fn obstruction_distances(
        &mut self,
        tile: ElementId,
        light: Vec2,
    ) -> Option<ObstructionDistances> {
        if !self.index.is_current(self.geometry.get()) {
            self.rebuild_index();
        }
        let snap = self.geometry.get();
        let tile = snap.tile(tile)?;
        Some(self.resolver.obstruction_distances(&self.index, snap, tile, light))
    }

    /// Pointer-mode highlight for one tile, without writing anything.
    pub fn compute_reflection(&mut self, tile: ElementId, light: Vec2) -> Option<ReflectionParams> {
        let distances = self.obstruction_distances(tile, light)?;
        let snap = self.geometry.get();
        let rect = snap.tile(tile)?.rect;
        let jitter = self.jitter.sample();
        Some(self.calculator.pointer(&rect, light, snap.viewport, &distances, jitter))
    }

    /// Orientation-mode highlight, without writing anything.
    pub fn compute_orientation_reflection(
        &mut self,
        sample: &OrientationSample,
    ) -> ReflectionParams {
        let jitter = self.jitter.sample();
        self.calculator.orientation(sample, jitter)
    }

    // ---- Outputs ----

    /// Take the style commands queued since the last call.
    pub fn take_styles(&mut self) -> Vec<StyleCommand> {
        self.styles.drain()
    }

    /// Tile results from the last frame that computed any.
    pub fn records(&self) -> &[ReflectionRecord] {
        &self.records
    }

    pub fn records_ptr(&self) -> *const f32 {
        self.records.as_ptr() as *const f32
    }

    pub fn last_orientation(&self) -> Option<OrientationSample> {
        self.last_orientation
    }

    pub fn geometry(&self) -> &GeometrySnapshot {
        self.geometry.get()
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn cache(&self) -> &ReflectionCache {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Write `params` unless the cache says it is already applied.
fn write_surface(
    cache: &mut ReflectionCache,
    styles: &mut StyleBuffer,
    decorated: &mut BTreeSet<(ElementId, Surface)>,
    id: ElementId,
    surface: Surface,
    params: &ReflectionParams,
) -> bool {
    if !cache.update(id, *params) {
        return false;
    }
    styles.write(id, surface, params);
    decorated.insert((id, surface));
    true
}

/// Overlay gloss and wood images share one angle at fixed brightness.
fn write_backdrops(
    snap: &GeometrySnapshot,
    calculator: &ReflectionCalculator,
    cache: &mut ReflectionCache,
    styles: &mut StyleBuffer,
    decorated: &mut BTreeSet<(ElementId, Surface)>,
    angle: f32,
) {
    let overlay = calculator.overlay(angle);
    for &id in &snap.overlays {
        write_surface(cache, styles, decorated, id, Surface::Overlay, &overlay);
    }
    let wood = calculator.wood(angle);
    for &id in &snap.wood {
        write_surface(cache, styles, decorated, id, Surface::Wood, &wood);
    }
}
