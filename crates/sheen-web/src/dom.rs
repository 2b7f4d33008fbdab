//! Document-backed scene provider and style applier.
//!
//! Elements are discovered with `querySelectorAll` on every geometry refresh
//! and stamped with a `data-sheen-id` attribute the first time they are seen,
//! so the engine's per-element cache survives re-queries.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use sheen_engine::{
    ElementId, ElementRole, ObstacleCategory, Rect, SceneElement, SceneProvider, Selectors,
    StyleCommand, StyleTarget, Viewport,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Window};

pub const ID_ATTR: &str = "data-sheen-id";

pub struct DomScene {
    window: Window,
    document: Document,
    selectors: Selectors,
    next_id: Cell<u32>,
    /// Elements reported by the last `collect`, for style writes.
    elements: RefCell<HashMap<ElementId, Element>>,
}

impl DomScene {
    pub fn new(window: Window, document: Document, selectors: Selectors) -> Self {
        Self {
            window,
            document,
            selectors,
            next_id: Cell::new(1),
            elements: RefCell::new(HashMap::new()),
        }
    }

    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    fn identify(&self, el: &Element) -> ElementId {
        if let Some(id) = el.get_attribute(ID_ATTR).and_then(|v| v.parse::<u32>().ok()) {
            // Keep fresh ids clear of ones stamped by an earlier instance.
            if id >= self.next_id.get() {
                self.next_id.set(id + 1);
            }
            return ElementId(id);
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        if let Err(e) = el.set_attribute(ID_ATTR, &id.to_string()) {
            log::warn!("could not stamp element id {id}: {e:?}");
        }
        ElementId(id)
    }

    fn query(&self, selector: &str, role: ElementRole, out: &mut Vec<SceneElement>) {
        let list = match self.document.query_selector_all(selector) {
            Ok(list) => list,
            Err(e) => {
                log::warn!("selector {selector:?} rejected: {e:?}");
                return;
            }
        };
        let mut elements = self.elements.borrow_mut();
        for i in 0..list.length() {
            let Some(el) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let id = self.identify(&el);
            let r = el.get_bounding_client_rect();
            out.push(SceneElement {
                id,
                rect: Rect::new(
                    r.left() as f32,
                    r.top() as f32,
                    r.width() as f32,
                    r.height() as f32,
                ),
                role,
            });
            elements.entry(id).or_insert(el);
        }
    }

    /// Apply queued style commands. Commands whose target is gone are
    /// skipped; DOM failures are logged and do not stop the batch.
    pub fn apply_styles(&self, commands: Vec<StyleCommand>) {
        for command in &commands {
            if let Err(e) = self.apply(command) {
                log::warn!("style write failed: {command:?}: {e:?}");
            }
        }
    }

    fn apply(&self, command: &StyleCommand) -> Result<(), JsValue> {
        match command {
            StyleCommand::SetProperty { target, name, value } => {
                if let Some(el) = self.html_target(target) {
                    el.style().set_property(name, value)?;
                }
            }
            StyleCommand::RemoveProperty { target, name } => {
                if let Some(el) = self.html_target(target) {
                    el.style().remove_property(name)?;
                }
            }
            StyleCommand::AddClass { target, class } => {
                if let Some(el) = self.target(target) {
                    el.class_list().add_1(class)?;
                }
            }
            StyleCommand::RemoveClass { target, class } => {
                if let Some(el) = self.target(target) {
                    el.class_list().remove_1(class)?;
                }
            }
        }
        Ok(())
    }

    fn target(&self, target: &StyleTarget) -> Option<Element> {
        match target {
            StyleTarget::Element(id) => self.elements.borrow().get(id).cloned(),
            StyleTarget::Body => self.document.body().map(Into::into),
            StyleTarget::Selector(selector) => {
                self.document.query_selector(selector).ok().flatten()
            }
        }
    }

    fn html_target(&self, target: &StyleTarget) -> Option<HtmlElement> {
        self.target(target).and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }
}

impl SceneProvider for DomScene {
    fn viewport(&self) -> Viewport {
        let dim = |v: Result<JsValue, JsValue>| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
        };
        Viewport::new(dim(self.window.inner_width()), dim(self.window.inner_height()))
    }

    fn collect(&self, out: &mut Vec<SceneElement>) {
        self.elements.borrow_mut().clear();
        let selectors = &self.selectors;
        // Tiles go first: an element matching several selectors is a tile.
        for tile in &selectors.tiles {
            self.query(&tile.selector, ElementRole::Tile(tile.group), out);
        }
        self.query(&selectors.wood, ElementRole::Wood, out);
        self.query(&selectors.overlay, ElementRole::Overlay, out);
        for selector in &selectors.text_icons {
            self.query(selector, ElementRole::Obstacle(ObstacleCategory::TextIcon), out);
        }
    }
}

/// Show or hide the first element matching `selector` via inline `display`.
pub fn set_shown(document: &Document, selector: &str, shown: bool) -> Result<(), JsValue> {
    let Some(el) = document
        .query_selector(selector)?
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    else {
        return Ok(());
    };
    if shown {
        el.style().remove_property("display")?;
    } else {
        el.style().set_property("display", "none")?;
    }
    Ok(())
}
