//! Batched viscous point queries for one foil.

use tracing::{debug, warn};
use vp_core::timing::{ScopedTimer, predictor_timing};
use vp_foil::{FoilGeometry, TargetList};
use vp_predictor::{
    AnalysisDefaults, ClBatchRequest, ModelSize, PredictorError, PredictorResult, RuntimeBridge,
};

/// Resolves every (cl, re) entry of a target list with one predictor call.
///
/// The task borrows the target list between [`initialize`](Self::initialize)
/// and the end of its own lifetime; results are written back into that list
/// in the order they were requested.
pub struct ViscousPointTask<'t> {
    targets: Option<&'t mut dyn TargetList>,
    x: Vec<f64>,
    y: Vec<f64>,
    n_crit: f64,
    xtr_top: f64,
    xtr_bot: f64,
    model_size: ModelSize,
}

impl<'t> ViscousPointTask<'t> {
    pub fn new() -> Self {
        let defaults = AnalysisDefaults::default();
        Self {
            targets: None,
            x: Vec::new(),
            y: Vec::new(),
            n_crit: defaults.n_crit,
            xtr_top: defaults.xtr_top,
            xtr_bot: defaults.xtr_bot,
            model_size: defaults.model_size,
        }
    }

    pub fn with_model_size(mut self, model_size: ModelSize) -> Self {
        self.model_size = model_size;
        self
    }

    pub fn model_size(&self) -> ModelSize {
        self.model_size
    }

    pub fn is_initialized(&self) -> bool {
        self.targets.is_some()
    }

    /// Bind geometry and target list.
    ///
    /// Snapshots the foil coordinates and the list's transition parameters.
    /// A missing target list leaves the task unbound.
    pub fn initialize(
        &mut self,
        foil: &dyn FoilGeometry,
        targets: Option<&'t mut dyn TargetList>,
    ) -> PredictorResult<()> {
        let Some(targets) = targets else {
            self.targets = None;
            warn!("viscous point task initialized without a target list");
            return Err(PredictorError::TargetMissing {
                what: "viscous target list",
            });
        };

        (self.x, self.y) = foil.coordinates();
        self.n_crit = targets.n_crit();
        self.xtr_top = targets.xtr_top();
        self.xtr_bot = targets.xtr_bot();
        debug!(
            nodes = self.x.len(),
            points = targets.len(),
            n_crit = self.n_crit,
            "viscous point task initialized"
        );
        self.targets = Some(targets);
        Ok(())
    }

    /// Read-only view of the bound target list.
    pub fn targets(&self) -> Option<&dyn TargetList> {
        self.targets.as_deref()
    }

    /// Query the predictor for every target and write the results back.
    ///
    /// Returns how many targets were filled. If the predictor returns fewer
    /// results than targets, only that prefix is written. Nothing is written
    /// unless the predictor reports success.
    pub fn run(&mut self, bridge: &RuntimeBridge) -> PredictorResult<usize> {
        let outcome = self.run_batch(bridge);
        match &outcome {
            Ok(written) => debug!(written, "viscous point batch complete"),
            Err(e) => warn!(error = %e, "viscous point batch failed"),
        }
        outcome
    }

    fn run_batch(&mut self, bridge: &RuntimeBridge) -> PredictorResult<usize> {
        bridge.ensure_ready()?;

        let targets = self
            .targets
            .as_deref_mut()
            .ok_or(PredictorError::TargetMissing {
                what: "task has no target list; call initialize first",
            })?;

        let n = targets.len();
        let request = ClBatchRequest {
            x: self.x.clone(),
            y: self.y.clone(),
            cl: (0..n).map(|i| targets.cl(i)).collect(),
            re: (0..n).map(|i| targets.reynolds(i)).collect(),
            n_crit: self.n_crit,
            xtr_top: self.xtr_top,
            xtr_bot: self.xtr_bot,
            mach: 0.0,
            model_size: self.model_size,
        };

        let results = {
            let _timer = ScopedTimer::start(&predictor_timing::POINT_BATCH_CALLS);
            bridge
                .with_runtime(|rt| rt.analyze_at_cls(&request))?
                .into_results()?
        };

        if results.len() < n {
            warn!(
                requested = n,
                returned = results.len(),
                "predictor returned fewer points than requested"
            );
        }

        let written = n.min(results.len());
        for (i, result) in results.into_iter().take(written).enumerate() {
            targets.record(i, result);
        }
        Ok(written)
    }
}

impl Default for ViscousPointTask<'_> {
    fn default() -> Self {
        Self::new()
    }
}
