//! Subprocess predictor runtime.
//!
//! Runs the bridge adapter module in a child interpreter and exchanges one
//! JSON object per line over its stdin/stdout. Every request carries a call
//! id that the reply echoes; output that does not answer the pending call is
//! discarded, so stray prints never shift later replies. The child is started once and
//! is never killed by this side; if it exits, later calls fail with
//! `Transport` and the caller may retry.

use crate::config::{RuntimeConfig, RuntimeEnv};
use crate::error::{PredictorError, PredictorResult};
use crate::predictor::{RuntimeLauncher, ViscousPredictor};
use crate::protocol::{
    BridgeRequest, ClBatchRequest, ClBatchResponse, PingResponse, ReplyId, RequestLine,
    SweepRequest, SweepResponse,
};
use serde::de::DeserializeOwned;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, info, warn};

/// Launches the predictor in a child interpreter.
pub struct ProcessLauncher {
    config: RuntimeConfig,
}

impl ProcessLauncher {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }
}

impl RuntimeLauncher for ProcessLauncher {
    fn describe(&self) -> String {
        format!("{} -m {}", self.config.venv, self.config.module)
    }

    fn launch(&self) -> PredictorResult<Box<dyn ViscousPredictor>> {
        let env = RuntimeEnv::resolve(&self.config);
        info!(
            python = %env.python.display(),
            python_path = %env.python_path().to_string_lossy(),
            "launching predictor runtime"
        );

        let mut child = Command::new(&env.python)
            .arg("-u")
            .arg("-m")
            .arg(&env.module)
            .env("PYTHONPATH", env.python_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| PredictorError::RuntimeUnavailable {
                message: format!("cannot spawn {}: {e}", env.python.display()),
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(PredictorError::RuntimeUnavailable {
                message: "child runtime has no stdio pipes".to_string(),
            });
        };

        let mut runtime = ProcessPredictor {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 0,
        };

        // A half-started child is not a Ready runtime; reap it.
        match runtime.handshake() {
            Ok(version) => {
                info!(version = version.as_deref().unwrap_or("unknown"), "runtime handshake ok");
                Ok(Box::new(runtime))
            }
            Err(e) => {
                let _ = runtime.child.kill();
                let _ = runtime.child.wait();
                Err(PredictorError::RuntimeUnavailable {
                    message: format!("runtime handshake failed: {e}"),
                })
            }
        }
    }
}

/// A running child runtime.
pub struct ProcessPredictor {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
}

impl ProcessPredictor {
    fn handshake(&mut self) -> PredictorResult<Option<String>> {
        let pong: PingResponse = self.round_trip(BridgeRequest::Ping)?;
        if !pong.success {
            return Err(PredictorError::PredictorFailure {
                message: pong.error.unwrap_or_else(|| "ping rejected".to_string()),
            });
        }
        Ok(pong.version)
    }

    fn round_trip<R: DeserializeOwned>(&mut self, request: BridgeRequest<'_>) -> PredictorResult<R> {
        self.next_id += 1;
        let id = self.next_id;
        let mut line = serde_json::to_string(&RequestLine { id, request })?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()?;

        loop {
            let mut reply = String::new();
            if self.stdout.read_line(&mut reply)? == 0 {
                let status = self
                    .child
                    .try_wait()
                    .ok()
                    .flatten()
                    .map_or_else(|| "still running".to_string(), |s| s.to_string());
                return Err(PredictorError::Transport {
                    message: format!("runtime closed its output ({status})"),
                });
            }

            match serde_json::from_str::<ReplyId>(&reply) {
                Ok(ReplyId { id: Some(got) }) if got == id => {
                    debug!(id, bytes = reply.len(), "runtime reply");
                    return Ok(serde_json::from_str(&reply)?);
                }
                Ok(ReplyId { id: Some(got) }) => {
                    warn!(expected = id, got, "discarding reply to another call");
                }
                _ => warn!(line = reply.trim_end(), "discarding non-protocol runtime output"),
            }
        }
    }
}

impl ViscousPredictor for ProcessPredictor {
    fn name(&self) -> &str {
        "subprocess"
    }

    fn analyze_at_cls(&mut self, request: &ClBatchRequest) -> PredictorResult<ClBatchResponse> {
        self.round_trip(BridgeRequest::AnalyzeAtCls(request))
    }

    fn sweep_alphas(&mut self, request: &SweepRequest) -> PredictorResult<SweepResponse> {
        self.round_trip(BridgeRequest::SweepAlphas(request))
    }
}
