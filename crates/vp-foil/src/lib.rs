//! vp-foil: airfoil geometry, polar curves and viscous target lists.
//!
//! Provides:
//! - `FoilGeometry` trait and the `Foil` coordinate container (Selig `.dat` loading)
//! - `FoilFingerprint`, a cheap geometry identity used for cache invalidation
//! - `PolarCurve`, a fixed-Reynolds sweep with lookup by lift coefficient
//! - `TargetList` trait and `ViscousTargets`, the (cl, re) work lists filled by point queries
//!
//! These are the data objects the predictor bridge and polar cache consume;
//! they carry no knowledge of how viscous results are produced.

pub mod error;
pub mod fingerprint;
pub mod geometry;
pub mod polar;
pub mod targets;

pub use error::{FoilError, FoilResult};
pub use fingerprint::{FingerprintMode, FoilFingerprint};
pub use geometry::{Foil, FoilGeometry};
pub use polar::{ClLookup, PolarChannel, PolarCurve};
pub use targets::{TargetList, TargetPoint, ViscousQueryPoint, ViscousQueryResult, ViscousTargets};
