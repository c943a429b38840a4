//! WASM bindings for browser hosts.
//!
//! The page owns the animation loop and the drawing; it hands each frame's
//! elapsed time to [`WasmSimulation::tick`] and reads JSON snapshots back.
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { WasmSimulation } from 'physlab';
//!
//! await init();
//! const sim = new WasmSimulation("demo:\n  kind: pendulum\n");
//! sim.start();
//! let last = performance.now();
//! function frame(now) {
//!     sim.tick((now - last) / 1000);
//!     last = now;
//!     draw(JSON.parse(sim.snapshot_json()));
//!     requestAnimationFrame(frame);
//! }
//! requestAnimationFrame(frame);
//! ```

// WASM-bindgen exports don't need #[must_use] - values returned to JS
#![allow(clippy::must_use_candidate)]

use wasm_bindgen::prelude::*;

use crate::config::{DemoConfig, SimConfig};
use crate::engine::{SimEngine, Tick};
use crate::error::SimError;

fn to_js(e: &SimError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-exported simulation handle.
#[wasm_bindgen]
pub struct WasmSimulation {
    engine: SimEngine,
}

#[wasm_bindgen]
impl WasmSimulation {
    /// Create a simulation from scenario YAML.
    ///
    /// # Errors
    ///
    /// Returns the configuration error message.
    #[wasm_bindgen(constructor)]
    pub fn new(yaml: &str) -> Result<WasmSimulation, JsValue> {
        let config = SimConfig::from_yaml(yaml).map_err(|e| to_js(&e))?;
        let engine = SimEngine::new(config).map_err(|e| to_js(&e))?;
        Ok(Self { engine })
    }

    /// Advance by one frame; returns the number of substeps executed.
    ///
    /// # Errors
    ///
    /// Returns the error message if the state became non-finite.
    #[wasm_bindgen]
    pub fn tick(&mut self, elapsed_seconds: f64) -> Result<u32, JsValue> {
        let report = self.engine.tick(elapsed_seconds).map_err(|e| to_js(&e))?;
        Ok(u32::try_from(report.substeps).unwrap_or(u32::MAX))
    }

    /// Advance one substep of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns the error message if the state became non-finite.
    #[wasm_bindgen]
    pub fn step(&mut self, dt: f64) -> Result<(), JsValue> {
        self.engine.step(dt).map_err(|e| to_js(&e))
    }

    /// Start ticking.
    #[wasm_bindgen]
    pub fn start(&mut self) {
        self.engine.start();
    }

    /// Pause ticking.
    #[wasm_bindgen]
    pub fn pause(&mut self) {
        self.engine.pause();
    }

    /// Whether ticks advance the simulation.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    /// Restart with the current parameters.
    #[wasm_bindgen]
    pub fn restart(&mut self) {
        self.engine.restart();
    }

    /// Reset to a new demo given as YAML (`kind`, `params`, `initial`).
    ///
    /// # Errors
    ///
    /// Returns the configuration error message; the running demo is kept.
    #[wasm_bindgen]
    pub fn reset(&mut self, demo_yaml: &str) -> Result<(), JsValue> {
        let demo: DemoConfig =
            serde_yaml::from_str(demo_yaml).map_err(|e| to_js(&SimError::from(e)))?;
        self.engine.reset(demo).map_err(|e| to_js(&e))
    }

    /// Simulated time (s).
    #[wasm_bindgen]
    pub fn time(&self) -> f64 {
        self.engine.time()
    }

    /// Terminal condition as text, if reached.
    #[wasm_bindgen]
    pub fn terminal(&self) -> Option<String> {
        self.engine.terminal().map(|t| t.to_string())
    }

    /// Current snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns the serialization error message.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.snapshot())
            .map_err(|e| to_js(&SimError::serialization(e.to_string())))
    }

    /// History (field names and rows) as JSON.
    ///
    /// # Errors
    ///
    /// Returns the serialization error message.
    #[wasm_bindgen]
    pub fn history_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.history())
            .map_err(|e| to_js(&SimError::serialization(e.to_string())))
    }
}
