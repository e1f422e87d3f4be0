#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod geom;
pub mod illumination;
pub mod loader;
pub mod parse;
pub mod scene;
pub mod simulator;
pub mod warning;

use std::fmt;

use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

pub use config::{SimulatorConfig, TriangulatorKind};
pub use illumination::{FrameBuffer, IlluminationPhase, IlluminationState, TickReport};
pub use loader::{LoadError, LoadOutcome, LoadReport, LoadTicket};
pub use parse::SignDescriptor;
pub use scene::{SceneGraph, SceneTree};
pub use simulator::SignSimulator;
pub use warning::SimWarning;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start rayon thread pool: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Entry point for the JS page: one sign preview.
#[wasm_bindgen]
pub struct Simulator {
    inner: SignSimulator,
}

#[wasm_bindgen]
impl Simulator {
    /// Create a simulator. `config` may be `undefined` or a partial
    /// [`SimulatorConfig`] object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<Simulator, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            SimulatorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js_error)?
        };
        let inner = SignSimulator::new(config).map_err(to_js_error)?;
        Ok(Simulator { inner })
    }

    /// Drop the current sign and return to the neutral frame.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.inner.reset().map_err(to_js_error)
    }

    /// Start a load before fetching its descriptor. Pass the returned ticket to
    /// `complete_load`.
    #[wasm_bindgen]
    pub fn begin_load(&mut self) -> u32 {
        self.inner.begin_load().generation()
    }

    /// Finish a load. Returns `false` when a newer load or a reset superseded
    /// this one.
    #[wasm_bindgen]
    pub fn complete_load(&mut self, ticket: u32, descriptor: JsValue) -> Result<bool, JsValue> {
        let ticket = LoadTicket::from_generation(ticket);
        if !self.inner.is_current(ticket) {
            return Ok(false);
        }
        let descriptor = parse::descriptor::from_js_value(descriptor).map_err(to_js_error)?;
        let outcome = self
            .inner
            .complete_load(ticket, &descriptor)
            .map_err(to_js_error)?;
        Ok(outcome.is_applied())
    }

    /// Load a descriptor object right away and return the load report.
    #[wasm_bindgen]
    pub fn load_sign(&mut self, descriptor: JsValue) -> Result<JsValue, JsValue> {
        let descriptor = parse::descriptor::from_js_value(descriptor).map_err(to_js_error)?;
        let report = self.inner.load_sign(&descriptor).map_err(to_js_error)?;
        to_js_value(&report)
    }

    /// Load a descriptor from JSON text.
    #[wasm_bindgen]
    pub fn load_sign_json(&mut self, json: &str) -> Result<JsValue, JsValue> {
        let report = self.inner.load_sign_str(json).map_err(to_js_error)?;
        to_js_value(&report)
    }

    /// Replace the active frame. Requires exactly 512 values.
    #[wasm_bindgen]
    pub fn push_frame(&mut self, values: &[f64]) -> Result<(), JsValue> {
        self.inner.push_frame(values).map_err(to_js_error)
    }

    /// Resolve bulb colors for this render tick.
    #[wasm_bindgen]
    pub fn tick(&mut self) -> Result<JsValue, JsValue> {
        let report = self.inner.tick();
        to_js_value(&report)
    }

    /// Export the full scene tree for the renderer.
    #[wasm_bindgen]
    pub fn scene(&self) -> Result<JsValue, JsValue> {
        to_js_value(self.inner.scene())
    }

    /// Report of the last applied load, `null` before the first one.
    #[wasm_bindgen]
    pub fn diagnostics(&self) -> Result<JsValue, JsValue> {
        match self.inner.diagnostics() {
            Some(report) => to_js_value(report),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen]
    pub fn bulb_count(&self) -> usize {
        self.inner.illumination().bulb_count()
    }

    /// `"empty"`, `"loaded"` or `"animated"`.
    #[wasm_bindgen]
    pub fn phase(&self) -> String {
        match self.inner.phase() {
            IlluminationPhase::Empty => "empty",
            IlluminationPhase::Loaded => "loaded",
            IlluminationPhase::Animated => "animated",
        }
        .to_owned()
    }
}

fn to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(to_js_error)
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
