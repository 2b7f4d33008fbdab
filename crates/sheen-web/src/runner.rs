use js_sys::{Function, Promise, Reflect};
use sheen_engine::{
    EngineConfig, HostAction, OrientationSupport, Platform, ReflectionEngine, ReflectionRecord,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, DeviceOrientationEvent, Document, Event, EventTarget,
    HtmlInputElement, MouseEvent, VisibilityState, Window,
};

use crate::dom::{set_shown, DomScene};
use crate::with_runner;

/// Telemetry fields inside the telemetry panel, by element id.
const TELEMETRY_FIELDS: [&str; 4] = ["alpha", "beta", "gamma", "orientation"];

type EventClosure<E> = Closure<dyn FnMut(E)>;

/// Listener closures. Created once and kept alive for the runner's lifetime
/// so they can be detached again by identity.
struct Listeners {
    pointer: EventClosure<MouseEvent>,
    orientation: EventClosure<DeviceOrientationEvent>,
    visibility: EventClosure<Event>,
    layout: EventClosure<Event>,
    toggle: EventClosure<Event>,
    permission: EventClosure<Event>,
    frame: Closure<dyn FnMut(f64)>,
}

impl Listeners {
    fn new() -> Self {
        Self {
            pointer: Closure::wrap(Box::new(|e: MouseEvent| {
                with_runner(|r| r.on_pointer_move(e.client_x() as f32, e.client_y() as f32));
            }) as Box<dyn FnMut(MouseEvent)>),
            orientation: Closure::wrap(Box::new(|e: DeviceOrientationEvent| {
                let read = |v: Option<f64>| v.unwrap_or(0.0) as f32;
                with_runner(|r| r.on_orientation(read(e.alpha()), read(e.beta()), read(e.gamma())));
            }) as Box<dyn FnMut(DeviceOrientationEvent)>),
            visibility: Closure::wrap(Box::new(|_: Event| {
                with_runner(|r| r.on_visibility_change());
            }) as Box<dyn FnMut(Event)>),
            layout: Closure::wrap(Box::new(|_: Event| {
                with_runner(|r| r.on_layout_change());
            }) as Box<dyn FnMut(Event)>),
            toggle: Closure::wrap(Box::new(|e: Event| {
                let checked = e
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                    .map(|input| input.checked());
                match checked {
                    Some(true) => with_runner(|r| r.enable()),
                    Some(false) => with_runner(|r| r.disable()),
                    None => None,
                };
            }) as Box<dyn FnMut(Event)>),
            permission: Closure::wrap(Box::new(|_: Event| {
                with_runner(|r| r.request_orientation_permission());
            }) as Box<dyn FnMut(Event)>),
            frame: Closure::wrap(Box::new(|_: f64| {
                with_runner(|r| r.frame());
            }) as Box<dyn FnMut(f64)>),
        }
    }
}

/// Binds a `ReflectionEngine` to the live document: event listeners in,
/// style writes out, one animation frame per burst of input.
pub struct EffectRunner {
    engine: ReflectionEngine,
    scene: DomScene,
    window: Window,
    document: Document,
    listeners: Listeners,
    wired: bool,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let platform = detect_platform(&window);
        log::info!("sheen: platform {:?}", platform);

        let scene = DomScene::new(window.clone(), document.clone(), config.selectors.clone());
        Ok(Self {
            engine: ReflectionEngine::new(config, platform),
            scene,
            window,
            document,
            listeners: Listeners::new(),
            wired: false,
        })
    }

    /// Hook up the page controls and start enabled if the toggle is already on.
    pub fn start(&mut self) {
        if let Err(e) = self.wire_controls() {
            log::warn!("sheen: page controls not wired: {e:?}");
        }
        let button = &self.scene.selectors().permission_button;
        if let Err(e) = set_shown(&self.document, button, false) {
            log::warn!("sheen: {e:?}");
        }
        if self.toggle().is_some_and(|t| t.checked()) {
            self.enable();
        }
    }

    /// Disable and detach everything, including the page controls.
    pub fn shutdown(&mut self) {
        self.disable();
        if let Err(e) = self.unwire_controls() {
            log::warn!("sheen: page controls not unwired: {e:?}");
        }
    }

    pub fn enable(&mut self) {
        let actions = self.engine.enable(&self.scene);
        self.perform(actions);
        self.flush();
        self.sync_toggle(true);
    }

    pub fn disable(&mut self) {
        let actions = self.engine.disable();
        self.perform(actions);
        self.flush();
        self.sync_toggle(false);
    }

    pub fn is_enabled(&self) -> bool {
        self.engine.is_enabled()
    }

    pub fn engine(&self) -> &ReflectionEngine {
        &self.engine
    }

    // ---- Input ----

    fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.engine.on_pointer_move(x, y) {
            self.schedule_frame();
        }
    }

    fn on_orientation(&mut self, alpha: f32, beta: f32, gamma: f32) {
        if self.engine.on_orientation(alpha, beta, gamma) {
            self.schedule_frame();
        }
    }

    fn on_layout_change(&mut self) {
        if self.engine.on_layout_change() {
            self.schedule_frame();
        }
    }

    fn on_visibility_change(&mut self) {
        let hidden = self.document.visibility_state() == VisibilityState::Hidden;
        self.engine.on_visibility_change(hidden);
    }

    // ---- Frame ----

    fn schedule_frame(&mut self) {
        let callback = self.listeners.frame.as_ref().unchecked_ref();
        if let Err(e) = self.window.request_animation_frame(callback) {
            // Without a frame callback the scheduler would stay pending.
            log::warn!("sheen: requestAnimationFrame failed, running inline: {e:?}");
            self.frame();
        }
    }

    fn frame(&mut self) {
        let report = self.engine.run_frame(&self.scene);
        self.flush();
        if report.orientation.is_some() {
            self.show_telemetry();
        }
    }

    fn flush(&mut self) {
        let commands = self.engine.take_styles();
        if !commands.is_empty() {
            self.scene.apply_styles(commands);
        }
    }

    // ---- Permission ----

    /// Ask for device orientation access. Without a permission API the
    /// grant is implicit; the engine ignores it unless it is actually
    /// waiting on a prompt.
    pub fn request_orientation_permission(&mut self) {
        let Some(request) = permission_request(&self.window) else {
            self.resolve_permission(true);
            return;
        };
        let promise = match request.call() {
            Ok(promise) => promise,
            Err(e) => {
                log::warn!("sheen: permission request threw: {e:?}");
                self.resolve_permission(false);
                return;
            }
        };
        let on_result = Closure::once(|state: JsValue| {
            let granted = state.as_string().as_deref() == Some("granted");
            with_runner(|r| r.resolve_permission(granted));
        });
        let on_error = Closure::once(|e: JsValue| {
            log::warn!("sheen: permission request rejected: {e:?}");
            with_runner(|r| r.resolve_permission(false));
        });
        let _ = promise.then2(&on_result, &on_error);
        // Settled by the promise; exactly one of the two ever runs.
        on_result.forget();
        on_error.forget();
    }

    fn resolve_permission(&mut self, granted: bool) {
        let actions = self.engine.resolve_permission(granted);
        self.perform(actions);
    }

    // ---- Host actions ----

    fn perform(&mut self, actions: Vec<HostAction>) {
        for action in actions {
            if let Err(e) = self.perform_one(action) {
                log::warn!("sheen: {action:?} failed: {e:?}");
            }
        }
    }

    fn perform_one(&self, action: HostAction) -> Result<(), JsValue> {
        let window: &EventTarget = self.window.as_ref();
        let document: &EventTarget = self.document.as_ref();
        let l = &self.listeners;
        let pointer = l.pointer.as_ref().unchecked_ref();
        let orientation = l.orientation.as_ref().unchecked_ref();
        let visibility = l.visibility.as_ref().unchecked_ref();
        let layout = l.layout.as_ref().unchecked_ref();
        let selectors = self.scene.selectors();

        match action {
            HostAction::AttachPointer => {
                window.add_event_listener_with_callback("mousemove", pointer)?;
            }
            HostAction::DetachPointer => {
                window.remove_event_listener_with_callback("mousemove", pointer)?;
            }
            HostAction::AttachOrientation => {
                window.add_event_listener_with_callback("deviceorientation", orientation)?;
                set_shown(&self.document, &selectors.telemetry, true)?;
            }
            HostAction::DetachOrientation => {
                window.remove_event_listener_with_callback("deviceorientation", orientation)?;
                set_shown(&self.document, &selectors.telemetry, false)?;
            }
            HostAction::AttachVisibility => {
                document.add_event_listener_with_callback("visibilitychange", visibility)?;
                window.add_event_listener_with_callback("resize", layout)?;
                // Capture so scrolls of nested containers count too.
                let options = AddEventListenerOptions::new();
                options.set_capture(true);
                options.set_passive(true);
                window.add_event_listener_with_callback_and_add_event_listener_options(
                    "scroll",
                    layout,
                    &options,
                )?;
            }
            HostAction::DetachVisibility => {
                document.remove_event_listener_with_callback("visibilitychange", visibility)?;
                window.remove_event_listener_with_callback("resize", layout)?;
                window.remove_event_listener_with_callback_and_bool("scroll", layout, true)?;
            }
            HostAction::ShowPermissionPrompt => {
                set_shown(&self.document, &selectors.permission_button, true)?;
            }
            HostAction::HidePermissionPrompt => {
                set_shown(&self.document, &selectors.permission_button, false)?;
            }
        }
        Ok(())
    }

    // ---- Page controls ----

    fn toggle(&self) -> Option<HtmlInputElement> {
        self.document
            .query_selector(&self.scene.selectors().toggle)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    }

    fn sync_toggle(&self, checked: bool) {
        if let Some(toggle) = self.toggle() {
            toggle.set_checked(checked);
        }
    }

    fn wire_controls(&mut self) -> Result<(), JsValue> {
        if self.wired {
            return Ok(());
        }
        let selectors = self.scene.selectors();
        let on_toggle = self.listeners.toggle.as_ref().unchecked_ref();
        let on_click = self.listeners.permission.as_ref().unchecked_ref();
        match self.toggle() {
            Some(toggle) => toggle.add_event_listener_with_callback("change", on_toggle)?,
            None => log::warn!("sheen: no toggle at {:?}", selectors.toggle),
        }
        if let Some(button) = self.document.query_selector(&selectors.permission_button)? {
            button.add_event_listener_with_callback("click", on_click)?;
        }
        self.wired = true;
        Ok(())
    }

    fn unwire_controls(&mut self) -> Result<(), JsValue> {
        if !self.wired {
            return Ok(());
        }
        self.wired = false;
        let on_toggle = self.listeners.toggle.as_ref().unchecked_ref();
        let on_click = self.listeners.permission.as_ref().unchecked_ref();
        if let Some(toggle) = self.toggle() {
            toggle.remove_event_listener_with_callback("change", on_toggle)?;
        }
        let selectors = self.scene.selectors();
        if let Some(button) = self.document.query_selector(&selectors.permission_button)? {
            button.remove_event_listener_with_callback("click", on_click)?;
        }
        Ok(())
    }

    fn show_telemetry(&self) {
        let Some(sample) = self.engine.last_orientation() else {
            return;
        };
        let values = [
            format!("{:.1}°", sample.alpha),
            format!("{:.1}°", sample.beta),
            format!("{:.1}°", sample.gamma),
            sample.posture().label().to_string(),
        ];
        for (id, value) in TELEMETRY_FIELDS.iter().zip(values) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(&value));
            }
        }
    }

    // ---- Record buffer accessors ----

    pub fn records_ptr(&self) -> *const f32 {
        self.engine.records_ptr()
    }

    pub fn record_count(&self) -> u32 {
        self.engine.records().len() as u32
    }

    pub fn record_floats(&self) -> u32 {
        ReflectionRecord::FLOATS as u32
    }
}

/// A bound `DeviceOrientationEvent.requestPermission`, if the platform has one.
struct PermissionRequest {
    ctor: JsValue,
    func: Function,
}

impl PermissionRequest {
    fn call(&self) -> Result<Promise, JsValue> {
        self.func.call0(&self.ctor)?.dyn_into::<Promise>()
    }
}

fn permission_request(window: &Window) -> Option<PermissionRequest> {
    let ctor = Reflect::get(window, &JsValue::from_str("DeviceOrientationEvent")).ok()?;
    if ctor.is_undefined() {
        return None;
    }
    let func = Reflect::get(&ctor, &JsValue::from_str("requestPermission"))
        .ok()?
        .dyn_into::<Function>()
        .ok()?;
    Some(PermissionRequest { ctor, func })
}

fn detect_platform(window: &Window) -> Platform {
    let agent = window.navigator().user_agent().unwrap_or_default().to_ascii_lowercase();
    if !(agent.contains("mobi") || agent.contains("android")) {
        return Platform::desktop();
    }
    let has_api = Reflect::get(window, &JsValue::from_str("DeviceOrientationEvent"))
        .map(|ctor| !ctor.is_undefined())
        .unwrap_or(false);
    let support = if !has_api {
        OrientationSupport::Unsupported
    } else if permission_request(window).is_some() {
        OrientationSupport::RequiresPermission
    } else {
        OrientationSupport::Available
    };
    Platform::mobile(support)
}
