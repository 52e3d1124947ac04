//! Reynolds-number polar mesh: build once per geometry, look up many times.
//!
//! A mesh is a set of polar curves, one per Reynolds number on a log-spaced
//! ladder, all swept over one angle-of-attack range. The cache remembers
//! which geometry and ranges it was built for and answers repeated builds
//! for the same (or a contained) request without touching the runtime.

use rayon::prelude::*;
use tracing::{debug, info, warn};
use vp_core::timing::{ScopedTimer, predictor_timing};
use vp_core::{Angle, AnalysisRange, SweepDefinition, VpError, VpResult, to_deg};
use vp_foil::{FingerprintMode, FoilFingerprint, FoilGeometry, PolarCurve};
use vp_predictor::{
    AnalysisDefaults, MeshDefaults, ModelSize, PredictorError, PredictorResult, ReynoldsSweep,
    RuntimeBridge, SweepRequest,
};

use crate::interpolate::{self, PlrPoint};

pub const DEFAULT_RE_POINTS: usize = 16;
pub const DEFAULT_ALPHA_STEP_DEG: f64 = 0.25;

/// Log-spaced Reynolds ladder from `re_min` to `re_max`, both endpoints exact.
pub fn generate_re_values(re_min: f64, re_max: f64, n: usize) -> VpResult<Vec<f64>> {
    if !(re_min < re_max) {
        return Err(VpError::InvalidArg {
            what: "Reynolds ladder needs re_min < re_max",
        });
    }
    Ok(SweepDefinition::new(re_min, re_max, n)?.generate_points())
}

/// What to build a mesh over, and with which predictor settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRequest {
    pub re_min: f64,
    pub re_max: f64,
    pub alpha_min: Angle,
    pub alpha_max: Angle,
    pub n_crit: f64,
    pub xtr_top: f64,
    pub xtr_bot: f64,
    pub model_size: ModelSize,
}

impl MeshRequest {
    pub fn new(re_min: f64, re_max: f64, alpha_min: Angle, alpha_max: Angle) -> Self {
        Self::with_defaults(re_min, re_max, alpha_min, alpha_max, &AnalysisDefaults::default())
    }

    pub fn with_defaults(
        re_min: f64,
        re_max: f64,
        alpha_min: Angle,
        alpha_max: Angle,
        defaults: &AnalysisDefaults,
    ) -> Self {
        Self {
            re_min,
            re_max,
            alpha_min,
            alpha_max,
            n_crit: defaults.n_crit,
            xtr_top: defaults.xtr_top,
            xtr_bot: defaults.xtr_bot,
            model_size: defaults.model_size,
        }
    }

    pub fn with_transition(mut self, n_crit: f64, xtr_top: f64, xtr_bot: f64) -> Self {
        self.n_crit = n_crit;
        self.xtr_top = xtr_top;
        self.xtr_bot = xtr_bot;
        self
    }

    pub fn with_model_size(mut self, model_size: ModelSize) -> Self {
        self.model_size = model_size;
        self
    }

    fn alpha_deg(&self) -> (f64, f64) {
        (to_deg(self.alpha_min), to_deg(self.alpha_max))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshOutcome {
    /// Existing mesh already covered the request.
    Hit,
    /// Mesh was rebuilt with one sweep call.
    Rebuilt,
}

/// Mesh resolution and geometry identity policy.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSettings {
    pub re_points: usize,
    pub alpha_step_deg: f64,
    pub fingerprint_mode: FingerprintMode,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            re_points: DEFAULT_RE_POINTS,
            alpha_step_deg: DEFAULT_ALPHA_STEP_DEG,
            fingerprint_mode: FingerprintMode::Sampled,
        }
    }
}

impl From<&MeshDefaults> for MeshSettings {
    fn from(defaults: &MeshDefaults) -> Self {
        Self {
            re_points: defaults.reynolds_points,
            alpha_step_deg: defaults.alpha_step_deg,
            fingerprint_mode: if defaults.full_fingerprint {
                FingerprintMode::Full
            } else {
                FingerprintMode::Sampled
            },
        }
    }
}

/// Ranges and geometry the current curves were built for.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MeshKey {
    fingerprint: FoilFingerprint,
    re_min: f64,
    re_max: f64,
    alpha_min: f64,
    alpha_max: f64,
}

impl MeshKey {
    fn covers(&self, other: &MeshKey) -> bool {
        self.fingerprint == other.fingerprint
            && self.re_min <= other.re_min
            && other.re_max <= self.re_max
            && self.alpha_min <= other.alpha_min
            && other.alpha_max <= self.alpha_max
    }
}

/// Polar curves for one geometry, sorted ascending by Reynolds number.
///
/// Either fully built (curves plus the key they were built for) or empty.
/// A failed build always leaves the cache empty.
#[derive(Debug, Default)]
pub struct PolarMeshCache {
    settings: MeshSettings,
    curves: Vec<PolarCurve>,
    re_values: Vec<f64>,
    key: Option<MeshKey>,
}

impl PolarMeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: MeshSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &MeshSettings {
        &self.settings
    }

    pub fn clear(&mut self) {
        self.curves.clear();
        self.re_values.clear();
        self.key = None;
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn curves(&self) -> &[PolarCurve] {
        &self.curves
    }

    /// The Reynolds ladder requested for the current mesh.
    pub fn re_values(&self) -> &[f64] {
        &self.re_values
    }

    pub fn fingerprint(&self) -> Option<FoilFingerprint> {
        self.key.map(|k| k.fingerprint)
    }

    pub fn re_range(&self) -> Option<(f64, f64)> {
        self.key.map(|k| (k.re_min, k.re_max))
    }

    /// Stored angle-of-attack range [deg].
    pub fn alpha_range_deg(&self) -> Option<(f64, f64)> {
        self.key.map(|k| (k.alpha_min, k.alpha_max))
    }

    /// Whether a build for `foil` and `request` would be a cache hit.
    pub fn covers(&self, foil: &dyn FoilGeometry, request: &MeshRequest) -> bool {
        let wanted = self.key_for(foil, request);
        self.is_current(&wanted)
    }

    fn key_for(&self, foil: &dyn FoilGeometry, request: &MeshRequest) -> MeshKey {
        let (alpha_min, alpha_max) = request.alpha_deg();
        MeshKey {
            fingerprint: FoilFingerprint::with_mode(foil, self.settings.fingerprint_mode),
            re_min: request.re_min,
            re_max: request.re_max,
            alpha_min,
            alpha_max,
        }
    }

    fn is_current(&self, wanted: &MeshKey) -> bool {
        !self.curves.is_empty() && self.key.is_some_and(|k| k.covers(wanted))
    }

    /// Make sure the mesh covers `request` for `foil`, rebuilding if needed.
    ///
    /// The ranges and geometry identity decide validity. Transition settings
    /// and model size are not part of the key; call [`clear`](Self::clear)
    /// after changing them.
    pub fn generate_polar_mesh(
        &mut self,
        bridge: &RuntimeBridge,
        foil: &dyn FoilGeometry,
        request: &MeshRequest,
    ) -> PredictorResult<MeshOutcome> {
        let wanted = self.key_for(foil, request);
        if self.is_current(&wanted) {
            debug!(curves = self.curves.len(), "polar mesh cache hit");
            return Ok(MeshOutcome::Hit);
        }

        self.clear();
        match self.rebuild(bridge, foil, request, wanted) {
            Ok(()) => {
                info!(
                    curves = self.curves.len(),
                    re_min = request.re_min,
                    re_max = request.re_max,
                    "polar mesh rebuilt"
                );
                Ok(MeshOutcome::Rebuilt)
            }
            Err(e) => {
                self.clear();
                warn!(error = %e, "polar mesh build failed");
                Err(e)
            }
        }
    }

    fn rebuild(
        &mut self,
        bridge: &RuntimeBridge,
        foil: &dyn FoilGeometry,
        request: &MeshRequest,
        key: MeshKey,
    ) -> PredictorResult<()> {
        if !(request.re_min > 0.0) {
            return Err(PredictorError::InvalidRequest {
                what: format!("re_min must be positive, got {}", request.re_min),
            });
        }
        if !key.alpha_min.is_finite() || !key.alpha_max.is_finite() || key.alpha_min > key.alpha_max
        {
            return Err(PredictorError::InvalidRequest {
                what: format!(
                    "invalid alpha range [{}, {}] deg",
                    key.alpha_min, key.alpha_max
                ),
            });
        }

        bridge.ensure_ready()?;

        let re_values = generate_re_values(request.re_min, request.re_max, self.settings.re_points)?;
        let (x, y) = foil.coordinates();
        let sweep = SweepRequest {
            x,
            y,
            reynolds: re_values.clone(),
            alpha: AnalysisRange::new(key.alpha_min, key.alpha_max, self.settings.alpha_step_deg),
            n_crit: request.n_crit,
            xtr_top: request.xtr_top,
            xtr_bot: request.xtr_bot,
            mach: 0.0,
            model_size: request.model_size,
        };

        let sweeps = {
            let _timer = ScopedTimer::start(&predictor_timing::SWEEP_BATCH_CALLS);
            bridge
                .with_runtime(|rt| rt.sweep_alphas(&sweep))?
                .into_sweeps()?
        };

        let mut curves = sweeps
            .into_iter()
            .map(ReynoldsSweep::into_curve)
            .collect::<PredictorResult<Vec<_>>>()?;
        if curves.is_empty() {
            return Err(PredictorError::PredictorFailure {
                message: "predictor returned no sweeps".to_string(),
            });
        }
        curves.sort_by(|a, b| a.reynolds().total_cmp(&b.reynolds()));
        curves.dedup_by(|a, b| a.reynolds() == b.reynolds());

        self.curves = curves;
        self.re_values = re_values;
        self.key = Some(key);
        Ok(())
    }

    /// Viscous values at (re, cl) from the stored curves.
    ///
    /// Brackets `re` between neighbouring curves and blends linearly; below
    /// or above the ladder the nearest curve answers alone. Fails with
    /// [`PredictorError::OutOfDomain`] when `cl` lies outside any curve
    /// consulted.
    pub fn plr_point_from_cl(&self, re: f64, cl: f64) -> PredictorResult<PlrPoint> {
        if self.curves.is_empty() {
            warn!(re, cl, "polar mesh lookup on empty cache");
            return Err(PredictorError::TargetMissing {
                what: "polar mesh is empty; generate it first",
            });
        }

        let _timer = ScopedTimer::start(&predictor_timing::MESH_LOOKUPS);
        let point = interpolate::interpolate(&self.curves, re, cl);
        if let Err(e) = &point {
            debug!(error = %e, "polar mesh lookup failed");
        }
        point
    }

    /// Parallel form of [`plr_point_from_cl`](Self::plr_point_from_cl) over
    /// `(re, cl)` pairs; results keep the input order.
    pub fn plr_points_from_cl(&self, queries: &[(f64, f64)]) -> Vec<PredictorResult<PlrPoint>> {
        queries
            .par_iter()
            .map(|&(re, cl)| self.plr_point_from_cl(re, cl))
            .collect()
    }
}
