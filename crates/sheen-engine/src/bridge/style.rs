//! Style writes produced by the engine and applied by the host.
//!
//! The engine never touches the document. Each operation appends commands
//! here; the host drains and applies them in order after the call returns.
//!
//! The reflection record buffer mirrors the last frame's tile results as
//! flat `f32`s (4 per tile) for host-side inspection:
//! ```text
//! [id, angle, brightness, group]
//! ```

use bytemuck::{Pod, Zeroable};

use crate::api::types::{ElementId, TileGroup};
use crate::systems::reflection::ReflectionParams;

pub const TILE_ANGLE: &str = "--reflection-angle";
pub const TILE_BRIGHTNESS: &str = "--reflection-brightness";
pub const OVERLAY_ANGLE: &str = "--overlay-reflection-angle";
pub const OVERLAY_BRIGHTNESS: &str = "--overlay-reflection-brightness";
pub const WOOD_ANGLE: &str = "--wood-reflection-angle";
pub const WOOD_BRIGHTNESS: &str = "--wood-reflection-brightness";

pub const TILE_CLASS: &str = "with-reflection";
pub const WOOD_CLASS: &str = "with-wood-reflection";
pub const BODY_CLASS: &str = "with-overlay-glass";

/// Kind of surface a highlight is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Surface {
    Tile,
    Overlay,
    Wood,
}

impl Surface {
    /// (angle property, brightness property)
    pub fn properties(self) -> (&'static str, &'static str) {
        match self {
            Surface::Tile => (TILE_ANGLE, TILE_BRIGHTNESS),
            Surface::Overlay => (OVERLAY_ANGLE, OVERLAY_BRIGHTNESS),
            Surface::Wood => (WOOD_ANGLE, WOOD_BRIGHTNESS),
        }
    }

    /// Presence class, if this surface has one.
    pub fn class(self) -> Option<&'static str> {
        match self {
            Surface::Tile => Some(TILE_CLASS),
            Surface::Overlay => None,
            Surface::Wood => Some(WOOD_CLASS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleTarget {
    Element(ElementId),
    Body,
    /// First element matching a selector (page sections).
    Selector(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleCommand {
    SetProperty { target: StyleTarget, name: &'static str, value: String },
    RemoveProperty { target: StyleTarget, name: &'static str },
    AddClass { target: StyleTarget, class: String },
    RemoveClass { target: StyleTarget, class: String },
}

#[derive(Debug, Default)]
pub struct StyleBuffer {
    commands: Vec<StyleCommand>,
}

impl StyleBuffer {
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(64),
        }
    }

    pub fn set_property(&mut self, target: StyleTarget, name: &'static str, value: String) {
        self.commands.push(StyleCommand::SetProperty { target, name, value });
    }

    pub fn remove_property(&mut self, target: StyleTarget, name: &'static str) {
        self.commands.push(StyleCommand::RemoveProperty { target, name });
    }

    pub fn add_class(&mut self, target: StyleTarget, class: &str) {
        self.commands.push(StyleCommand::AddClass { target, class: class.to_string() });
    }

    pub fn remove_class(&mut self, target: StyleTarget, class: &str) {
        self.commands.push(StyleCommand::RemoveClass { target, class: class.to_string() });
    }

    /// Write a highlight (both properties plus the presence class).
    pub fn write(&mut self, id: ElementId, surface: Surface, params: &ReflectionParams) {
        let (angle, brightness) = surface.properties();
        self.set_property(StyleTarget::Element(id), angle, params.angle_css());
        self.set_property(StyleTarget::Element(id), brightness, params.brightness_css());
        if let Some(class) = surface.class() {
            self.add_class(StyleTarget::Element(id), class);
        }
    }

    /// Strip a highlight: presence class and inline properties.
    pub fn clear(&mut self, id: ElementId, surface: Surface) {
        if let Some(class) = surface.class() {
            self.remove_class(StyleTarget::Element(id), class);
        }
        let (angle, brightness) = surface.properties();
        self.remove_property(StyleTarget::Element(id), angle);
        self.remove_property(StyleTarget::Element(id), brightness);
    }

    /// Take all queued commands.
    pub fn drain(&mut self) -> Vec<StyleCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Per-tile result of the last frame, in wire format.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ReflectionRecord {
    pub id: f32,
    pub angle: f32,
    pub brightness: f32,
    pub group: f32,
}

impl ReflectionRecord {
    pub const FLOATS: usize = 4;

    pub fn new(id: ElementId, group: TileGroup, params: &ReflectionParams) -> Self {
        Self {
            id: id.0 as f32,
            angle: params.angle,
            brightness: params.brightness,
            group: group.as_f32(),
        }
    }
}
