//! Request/response schema for the predictor runtime.
//!
//! The same types travel over the JSON-lines pipe to the child runtime and
//! through in-process predictors, so every response is validated the same
//! way before callers see it.

use crate::error::{PredictorError, PredictorResult};
use crate::model_size::ModelSize;
use serde::{Deserialize, Serialize};
use vp_core::AnalysisRange;
use vp_foil::{PolarCurve, ViscousQueryResult};

/// Batched point query: one (cl, re) pair per index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClBatchRequest {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub cl: Vec<f64>,
    pub re: Vec<f64>,
    pub n_crit: f64,
    pub xtr_top: f64,
    pub xtr_bot: f64,
    pub mach: f64,
    pub model_size: ModelSize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClBatchResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub cd: Vec<f64>,
    #[serde(default)]
    pub cl: Vec<f64>,
    #[serde(default)]
    pub xtr_top: Vec<f64>,
    #[serde(default)]
    pub xtr_bot: Vec<f64>,
}

impl ClBatchResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            cd: Vec::new(),
            cl: Vec::new(),
            xtr_top: Vec::new(),
            xtr_bot: Vec::new(),
        }
    }

    /// Check the success flag and array shapes, then zip into per-point results.
    pub fn into_results(self) -> PredictorResult<Vec<ViscousQueryResult>> {
        if !self.success {
            return Err(PredictorError::PredictorFailure {
                message: self.error.unwrap_or_else(|| "no message".to_string()),
            });
        }

        let n = self.cd.len();
        if self.cl.len() != n || self.xtr_top.len() != n || self.xtr_bot.len() != n {
            return Err(PredictorError::transport(format!(
                "point response arrays differ in length (cd={}, cl={}, xtr_top={}, xtr_bot={})",
                n,
                self.cl.len(),
                self.xtr_top.len(),
                self.xtr_bot.len()
            )));
        }

        Ok((0..n)
            .map(|i| ViscousQueryResult {
                cd: self.cd[i],
                achieved_cl: self.cl[i],
                xtr_top: self.xtr_top[i],
                xtr_bot: self.xtr_bot[i],
                converged: true,
            })
            .collect())
    }
}

/// Batched mesh sweep: every Reynolds number swept over one alpha range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRequest {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub reynolds: Vec<f64>,
    /// Angle of attack range in degrees.
    pub alpha: AnalysisRange,
    pub n_crit: f64,
    pub xtr_top: f64,
    pub xtr_bot: f64,
    pub mach: f64,
    pub model_size: ModelSize,
}

/// Sweep result bundle for one Reynolds number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReynoldsSweep {
    pub reynolds: f64,
    pub alpha: Vec<f64>,
    pub cl: Vec<f64>,
    pub cd: Vec<f64>,
    pub xtr_top: Vec<f64>,
    pub xtr_bot: Vec<f64>,
}

impl ReynoldsSweep {
    pub fn into_curve(self) -> PredictorResult<PolarCurve> {
        let re = self.reynolds;
        PolarCurve::new(
            self.reynolds,
            self.alpha,
            self.cl,
            self.cd,
            self.xtr_top,
            self.xtr_bot,
        )
        .map_err(|e| PredictorError::transport(format!("sweep at Re={re}: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Keyed by Reynolds number; order is not guaranteed.
    #[serde(default)]
    pub sweeps: Vec<ReynoldsSweep>,
}

impl SweepResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            sweeps: Vec::new(),
        }
    }

    pub fn into_sweeps(self) -> PredictorResult<Vec<ReynoldsSweep>> {
        if !self.success {
            return Err(PredictorError::PredictorFailure {
                message: self.error.unwrap_or_else(|| "no message".to_string()),
            });
        }
        Ok(self.sweeps)
    }
}

/// Operation written to the child runtime.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeRequest<'a> {
    Ping,
    AnalyzeAtCls(&'a ClBatchRequest),
    SweepAlphas(&'a SweepRequest),
}

/// One line to the runtime: a call id plus the operation.
///
/// The runtime echoes `id` on its reply; replies with any other id, and
/// lines that are not protocol objects, belong to no pending call.
#[derive(Debug, Serialize)]
pub struct RequestLine<'a> {
    pub id: u64,
    #[serde(flatten)]
    pub request: BridgeRequest<'a>,
}

/// The id part of a reply line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReplyId {
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PingResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}
