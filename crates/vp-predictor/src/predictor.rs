//! The predictor trait seam.

use crate::error::PredictorResult;
use crate::protocol::{ClBatchRequest, ClBatchResponse, SweepRequest, SweepResponse};

/// A started predictor runtime.
///
/// Both calls are batched: one call per request, however many points it
/// carries. `Err` means the call itself failed (transport); a response with
/// `success == false` means the predictor ran and declined.
pub trait ViscousPredictor: Send {
    /// Runtime name (for logging).
    fn name(&self) -> &str;

    /// Resolve (cl, re) pairs to drag and transition.
    fn analyze_at_cls(&mut self, request: &ClBatchRequest) -> PredictorResult<ClBatchResponse>;

    /// Full alpha sweep at every requested Reynolds number.
    fn sweep_alphas(&mut self, request: &SweepRequest) -> PredictorResult<SweepResponse>;
}

/// Starts a predictor runtime. Called by `RuntimeBridge` until one launch succeeds.
pub trait RuntimeLauncher: Send + Sync {
    fn describe(&self) -> String;

    fn launch(&self) -> PredictorResult<Box<dyn ViscousPredictor>>;
}
