//! vp-core: shared foundation for viscpolar.
//!
//! Contains:
//! - error (shared error types)
//! - numeric (Real + float helpers)
//! - sweeps (linear/logarithmic ladders and stepped analysis ranges)
//! - timing (accumulating timers for predictor calls)
//! - units (uom angle types + constructors)

pub mod error;
pub mod numeric;
pub mod sweeps;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{VpError, VpResult};
pub use numeric::*;
pub use sweeps::{AnalysisRange, SweepDefinition};
pub use units::*;
