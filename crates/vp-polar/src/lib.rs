//! vp-polar: viscous point queries and the Reynolds-number polar mesh cache.
//!
//! Two consumers of the predictor bridge live here:
//!
//! - [`ViscousPointTask`] resolves one foil's (cl, re) target list with a
//!   single batched predictor call and writes results back into the list.
//! - [`PolarMeshCache`] builds polar curves over a log-spaced Reynolds
//!   ladder with one batched sweep call, then answers (re, cl) lookups by
//!   bracketing on Reynolds number and blending, with no further runtime
//!   calls.
//!
//! Both take the bridge by reference; pass [`vp_predictor::bridge::global`]
//! in production.

pub mod interpolate;
pub mod mesh_cache;
pub mod point_task;

pub use interpolate::{Bracket, PlrPoint};
pub use mesh_cache::{
    DEFAULT_ALPHA_STEP_DEG, DEFAULT_RE_POINTS, MeshOutcome, MeshRequest, MeshSettings,
    PolarMeshCache, generate_re_values,
};
pub use point_task::ViscousPointTask;
