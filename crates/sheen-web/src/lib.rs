pub mod dom;
pub mod runner;

pub use dom::DomScene;
pub use runner::EffectRunner;

use std::cell::RefCell;

use sheen_engine::EngineConfig;
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<EffectRunner>> = const { RefCell::new(None) };
}

/// Run `f` against the live runner. `None` before `sheen_init`, or when a
/// listener fires while the runner is already borrowed.
pub(crate) fn with_runner<R>(f: impl FnOnce(&mut EffectRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| {
        let Ok(mut borrow) = cell.try_borrow_mut() else {
            log::warn!("sheen: re-entrant call dropped");
            return None;
        };
        borrow.as_mut().map(f)
    })
}

fn parse_config(json: Option<String>) -> EngineConfig {
    let Some(json) = json else {
        return EngineConfig::default();
    };
    EngineConfig::from_json(&json).unwrap_or_else(|e| {
        log::warn!("sheen: bad config ({e}), using defaults");
        EngineConfig::default()
    })
}

/// Install the effect on the current page. Safe to call again; the previous
/// instance is torn down first.
#[wasm_bindgen]
pub fn sheen_init(config_json: Option<String>) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let previous = RUNNER.with(|cell| cell.borrow_mut().take());
    if let Some(mut previous) = previous {
        previous.shutdown();
    }

    let runner = match EffectRunner::new(parse_config(config_json)) {
        Ok(runner) => runner,
        Err(e) => {
            log::warn!("sheen: not started: {e:?}");
            return;
        }
    };
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });

    with_runner(|r| r.start());
    log::info!("sheen: initialized");
}

// ---- Collaborator entry points ----

#[wasm_bindgen]
pub fn sheen_enable() {
    with_runner(|r| r.enable());
}

#[wasm_bindgen]
pub fn sheen_disable() {
    with_runner(|r| r.disable());
}

#[wasm_bindgen]
pub fn sheen_is_enabled() -> bool {
    with_runner(|r| r.is_enabled()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn sheen_request_orientation_permission() {
    with_runner(|r| r.request_orientation_permission());
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn sheen_reflections_ptr() -> *const f32 {
    with_runner(|r| r.records_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn sheen_reflection_count() -> u32 {
    with_runner(|r| r.record_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn sheen_reflection_floats() -> u32 {
    with_runner(|r| r.record_floats()).unwrap_or(0)
}
