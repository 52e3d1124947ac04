//! vp-predictor: gateway to the external viscous predictor.
//!
//! The predictor (a neural surrogate for 2D viscous analysis) runs in a
//! separate interpreter runtime. This crate owns that boundary:
//!
//! - `protocol`: batched request/response schema for point queries and
//!   alpha sweeps
//! - `ViscousPredictor` / `RuntimeLauncher`: the trait seam every caller
//!   depends on
//! - `RuntimeBridge`: one-way `Uninitialized -> Ready` lifecycle, lazy
//!   startup under a lock, and a second lock serialising every call
//! - `process`: the production runtime, a long-lived child interpreter
//!   spoken to with line-delimited JSON
//! - `config`: YAML/env configuration and search-path resolution
//!
//! # Example
//!
//! ```no_run
//! use vp_predictor::bridge;
//!
//! let bridge = bridge::global();
//! bridge.ensure_ready().expect("predictor runtime should start");
//! let name = bridge.with_runtime(|rt| Ok(rt.name().to_string())).unwrap();
//! println!("predictor: {name}");
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod model_size;
pub mod predictor;
pub mod process;
pub mod protocol;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bridge::RuntimeBridge;
pub use config::{AnalysisDefaults, ConfigError, MeshDefaults, PredictorConfig, RuntimeConfig, RuntimeEnv};
pub use error::{PredictorError, PredictorResult};
pub use model_size::ModelSize;
pub use predictor::{RuntimeLauncher, ViscousPredictor};
pub use process::ProcessLauncher;
pub use protocol::{
    ClBatchRequest, ClBatchResponse, ReynoldsSweep, SweepRequest, SweepResponse,
};
