//! In-process synthetic predictor.
//!
//! Produces smooth, deterministic aerodynamics so cache and task logic can be
//! exercised without an interpreter. Behaviour is scripted through a shared
//! [`Script`] and every launch/call is counted in a shared [`PredictorLog`].

use crate::error::{PredictorError, PredictorResult};
use crate::model_size::ModelSize;
use crate::predictor::{RuntimeLauncher, ViscousPredictor};
use crate::protocol::{ClBatchRequest, ClBatchResponse, ReynoldsSweep, SweepRequest, SweepResponse};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Lift slope 0.1/deg with cl=0.25 at zero incidence.
pub fn synthetic_cl(alpha_deg: f64) -> f64 {
    0.25 + 0.1 * alpha_deg
}

/// Drag bucket around cl=0.2, falling with Reynolds number.
pub fn synthetic_cd(cl: f64, re: f64) -> f64 {
    (0.006 + 0.01 * (cl - 0.2).powi(2)) * (1e6 / re).powf(0.2)
}

pub fn synthetic_xtr_top(cl: f64, re: f64) -> f64 {
    ((0.6 - 0.3 * cl) * (1e6 / re).powf(0.1)).clamp(0.02, 1.0)
}

pub fn synthetic_xtr_bot(cl: f64) -> f64 {
    (0.7 + 0.2 * cl).clamp(0.0, 1.0)
}

/// Scripted behaviour for synthetic runtimes.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Every launch fails with `RuntimeUnavailable`.
    pub fail_launch: bool,
    pub launch_delay: Duration,
    pub call_delay: Duration,
    /// Respond with `success = false` and this message.
    pub report_failure: Option<String>,
    /// Fail the call itself with `Transport`.
    pub transport_error: Option<String>,
    /// Panic inside the call.
    pub panic_message: Option<String>,
    /// Return sweeps in descending Reynolds order.
    pub reverse_sweeps: bool,
    /// Return at most this many point results.
    pub truncate_points: Option<usize>,
}

/// Counters shared between a launcher and the runtimes it starts.
#[derive(Debug, Default)]
pub struct PredictorLog {
    launches: AtomicUsize,
    point_batches: AtomicUsize,
    sweep_batches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_point_request: Mutex<Option<ClBatchRequest>>,
    last_sweep_request: Mutex<Option<SweepRequest>>,
}

impl PredictorLog {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn point_batches(&self) -> usize {
        self.point_batches.load(Ordering::SeqCst)
    }

    pub fn sweep_batches(&self) -> usize {
        self.sweep_batches.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_point_request(&self) -> Option<ClBatchRequest> {
        self.last_point_request.lock().ok()?.clone()
    }

    pub fn last_sweep_request(&self) -> Option<SweepRequest> {
        self.last_sweep_request.lock().ok()?.clone()
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct SyntheticLauncher {
    script: Arc<Mutex<Script>>,
    log: Arc<PredictorLog>,
}

impl SyntheticLauncher {
    pub fn new() -> Self {
        Self::with_script(Script::default())
    }

    pub fn with_script(script: Script) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            log: Arc::new(PredictorLog::default()),
        }
    }

    /// Handle for changing behaviour after the launcher moved into a bridge.
    pub fn script(&self) -> Arc<Mutex<Script>> {
        Arc::clone(&self.script)
    }

    pub fn log(&self) -> Arc<PredictorLog> {
        Arc::clone(&self.log)
    }
}

impl Default for SyntheticLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeLauncher for SyntheticLauncher {
    fn describe(&self) -> String {
        "synthetic".to_string()
    }

    fn launch(&self) -> PredictorResult<Box<dyn ViscousPredictor>> {
        let script = current(&self.script);
        self.log.launches.fetch_add(1, Ordering::SeqCst);
        thread::sleep(script.launch_delay);
        if script.fail_launch {
            return Err(PredictorError::RuntimeUnavailable {
                message: "synthetic launch failure".to_string(),
            });
        }
        Ok(Box::new(SyntheticPredictor {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
        }))
    }
}

pub struct SyntheticPredictor {
    script: Arc<Mutex<Script>>,
    log: Arc<PredictorLog>,
}

impl SyntheticPredictor {
    fn begin(&self) -> PredictorResult<Script> {
        let script = current(&self.script);
        thread::sleep(script.call_delay);
        if let Some(msg) = &script.panic_message {
            panic!("{msg}");
        }
        if let Some(msg) = &script.transport_error {
            return Err(PredictorError::Transport {
                message: msg.clone(),
            });
        }
        Ok(script)
    }
}

impl ViscousPredictor for SyntheticPredictor {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn analyze_at_cls(&mut self, request: &ClBatchRequest) -> PredictorResult<ClBatchResponse> {
        self.log.enter();
        self.log.point_batches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.log.last_point_request.lock() {
            *last = Some(request.clone());
        }
        let outcome = self.begin();
        self.log.leave();
        let script = outcome?;

        if let Some(msg) = script.report_failure {
            return Ok(ClBatchResponse::failure(msg));
        }

        let n = script
            .truncate_points
            .map_or(request.cl.len(), |t| t.min(request.cl.len()));
        let pairs = request.cl.iter().zip(&request.re).take(n);
        Ok(ClBatchResponse {
            success: true,
            error: None,
            cd: pairs.clone().map(|(&cl, &re)| synthetic_cd(cl, re)).collect(),
            cl: pairs.clone().map(|(&cl, _)| cl).collect(),
            xtr_top: pairs.clone().map(|(&cl, &re)| synthetic_xtr_top(cl, re)).collect(),
            xtr_bot: pairs.map(|(&cl, _)| synthetic_xtr_bot(cl)).collect(),
        })
    }

    fn sweep_alphas(&mut self, request: &SweepRequest) -> PredictorResult<SweepResponse> {
        self.log.enter();
        self.log.sweep_batches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.log.last_sweep_request.lock() {
            *last = Some(request.clone());
        }
        let outcome = self.begin();
        self.log.leave();
        let script = outcome?;

        if let Some(msg) = script.report_failure {
            return Ok(SweepResponse::failure(msg));
        }

        let alpha = request.alpha.values();
        let mut sweeps: Vec<ReynoldsSweep> = request
            .reynolds
            .iter()
            .map(|&re| {
                let cl: Vec<f64> = alpha.iter().map(|&a| synthetic_cl(a)).collect();
                ReynoldsSweep {
                    reynolds: re,
                    alpha: alpha.clone(),
                    cd: cl.iter().map(|&c| synthetic_cd(c, re)).collect(),
                    xtr_top: cl.iter().map(|&c| synthetic_xtr_top(c, re)).collect(),
                    xtr_bot: cl.iter().map(|&c| synthetic_xtr_bot(c)).collect(),
                    cl,
                }
            })
            .collect();
        if script.reverse_sweeps {
            sweeps.reverse();
        }

        Ok(SweepResponse {
            success: true,
            error: None,
            sweeps,
        })
    }
}

/// A point request over a small diamond section.
pub fn sample_point_request(pairs: &[(f64, f64)]) -> ClBatchRequest {
    ClBatchRequest {
        x: vec![1.0, 0.5, 0.0, 0.5],
        y: vec![0.0, 0.06, 0.0, -0.06],
        cl: pairs.iter().map(|p| p.0).collect(),
        re: pairs.iter().map(|p| p.1).collect(),
        n_crit: 9.0,
        xtr_top: 1.0,
        xtr_bot: 1.0,
        mach: 0.0,
        model_size: ModelSize::Xlarge,
    }
}

fn current(script: &Mutex<Script>) -> Script {
    script.lock().map(|s| s.clone()).unwrap_or_default()
}
