//! Lifecycle and mutual exclusion for the predictor runtime.
//!
//! The runtime is a single stateful resource shared by the whole process.
//! Its lifecycle is one-way, `Uninitialized -> Ready`: it is started lazily
//! on first use and never shut down, because the interpreter it hosts cannot
//! be safely torn down and re-initialised within one process.
//!
//! Two locks are involved:
//! - the state lock, guarding the lifecycle; concurrent first callers wait
//!   on a condition variable for the single startup attempt in progress and
//!   observe its outcome;
//! - the call token, held for exactly one batched call inside
//!   [`RuntimeBridge::with_runtime`] and released on every exit path.

use crate::config::PredictorConfig;
use crate::error::{PredictorError, PredictorResult};
use crate::predictor::{RuntimeLauncher, ViscousPredictor};
use crate::process::ProcessLauncher;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, info, warn};
use vp_core::timing::{ScopedTimer, predictor_timing};

type SharedRuntime = Arc<Mutex<Box<dyn ViscousPredictor>>>;

enum Phase {
    Uninitialized,
    Starting,
    Ready(SharedRuntime),
}

struct BridgeState {
    phase: Phase,
    /// Number of startup attempts begun so far.
    attempt: u64,
    /// Outcome of the most recent failed attempt, keyed by attempt number.
    last_failure: Option<(u64, PredictorError)>,
}

pub struct RuntimeBridge {
    launcher: Box<dyn RuntimeLauncher>,
    state: Mutex<BridgeState>,
    startup_done: Condvar,
}

impl RuntimeBridge {
    pub fn new(launcher: impl RuntimeLauncher + 'static) -> Self {
        Self {
            launcher: Box::new(launcher),
            state: Mutex::new(BridgeState {
                phase: Phase::Uninitialized,
                attempt: 0,
                last_failure: None,
            }),
            startup_done: Condvar::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.lock_state().phase, Phase::Ready(_))
    }

    /// Start the runtime if it is not running yet.
    ///
    /// Idempotent. Exactly one caller performs a startup attempt; callers
    /// arriving while it runs wait and return its outcome. A failed attempt
    /// leaves the bridge `Uninitialized`, so a later call starts a new one.
    pub fn ensure_ready(&self) -> PredictorResult<()> {
        let mut state = self.lock_state();
        let in_progress = match state.phase {
            Phase::Ready(_) => return Ok(()),
            Phase::Starting => true,
            Phase::Uninitialized => false,
        };
        if in_progress {
            return self.await_startup(state);
        }

        state.phase = Phase::Starting;
        state.attempt += 1;
        let attempt = state.attempt;
        drop(state);

        info!(launcher = %self.launcher.describe(), attempt, "starting predictor runtime");
        let launched = {
            let _timer = ScopedTimer::start(&predictor_timing::RUNTIME_STARTUP);
            panic::catch_unwind(AssertUnwindSafe(|| self.launcher.launch())).unwrap_or_else(
                |payload| {
                    Err(PredictorError::RuntimeUnavailable {
                        message: panic_message(payload.as_ref()),
                    })
                },
            )
        };

        let mut state = self.lock_state();
        let outcome = match launched {
            Ok(runtime) => {
                info!(runtime = runtime.name(), "predictor runtime ready");
                state.phase = Phase::Ready(Arc::new(Mutex::new(runtime)));
                state.last_failure = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, attempt, "predictor runtime failed to start");
                let err = match e {
                    PredictorError::RuntimeUnavailable { .. } => e,
                    other => PredictorError::RuntimeUnavailable {
                        message: other.to_string(),
                    },
                };
                state.phase = Phase::Uninitialized;
                state.last_failure = Some((attempt, err.clone()));
                Err(err)
            }
        };
        drop(state);
        self.startup_done.notify_all();
        outcome
    }

    /// Block until the attempt in progress finishes and report its outcome.
    fn await_startup(&self, state: MutexGuard<'_, BridgeState>) -> PredictorResult<()> {
        let awaited = state.attempt;
        debug!(attempt = awaited, "waiting for predictor runtime startup");
        let state = self
            .startup_done
            .wait_while(state, |s| {
                matches!(s.phase, Phase::Starting) && s.attempt == awaited
            })
            .unwrap_or_else(PoisonError::into_inner);

        if let Phase::Ready(_) = state.phase {
            return Ok(());
        }
        match &state.last_failure {
            Some((attempt, err)) if *attempt == awaited => Err(err.clone()),
            _ => Err(PredictorError::RuntimeUnavailable {
                message: "runtime startup did not complete".to_string(),
            }),
        }
    }

    /// Run `work` with exclusive access to the runtime.
    ///
    /// The runtime must already be started. No two scopes run concurrently.
    /// A panic inside `work` is returned as `PredictorError::Unknown`.
    pub fn with_runtime<T>(
        &self,
        work: impl FnOnce(&mut dyn ViscousPredictor) -> PredictorResult<T>,
    ) -> PredictorResult<T> {
        let runtime = match &self.lock_state().phase {
            Phase::Ready(rt) => Arc::clone(rt),
            Phase::Uninitialized | Phase::Starting => {
                return Err(PredictorError::RuntimeUnavailable {
                    message: "runtime has not been started".to_string(),
                });
            }
        };

        let mut token = runtime.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("runtime token acquired");
        match panic::catch_unwind(AssertUnwindSafe(|| work(&mut **token))) {
            Ok(result) => result,
            Err(payload) => Err(PredictorError::Unknown {
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic inside runtime call".to_string()
    }
}

static GLOBAL_BRIDGE: OnceLock<RuntimeBridge> = OnceLock::new();

/// The process-wide bridge.
///
/// Unless [`install_global`] ran first, this is a subprocess bridge built
/// from [`PredictorConfig::load_default`].
pub fn global() -> &'static RuntimeBridge {
    GLOBAL_BRIDGE.get_or_init(|| {
        let config = PredictorConfig::load_default().unwrap_or_else(|e| {
            warn!(error = %e, "predictor config unreadable, using defaults");
            PredictorConfig::default()
        });
        RuntimeBridge::new(ProcessLauncher::new(config.runtime))
    })
}

/// Install the process-wide bridge. Fails (returning it) if one exists already.
pub fn install_global(bridge: RuntimeBridge) -> Result<(), RuntimeBridge> {
    GLOBAL_BRIDGE.set(bridge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Script, SyntheticLauncher, sample_point_request};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn ensure_ready_is_idempotent() {
        let launcher = SyntheticLauncher::new();
        let log = launcher.log();
        let bridge = RuntimeBridge::new(launcher);

        assert!(!bridge.is_ready());
        bridge.ensure_ready().unwrap();
        bridge.ensure_ready().unwrap();
        assert!(bridge.is_ready());
        assert_eq!(log.launches(), 1);
    }

    #[test]
    fn concurrent_first_callers_share_one_startup() {
        let launcher = SyntheticLauncher::with_script(Script {
            launch_delay: Duration::from_millis(30),
            ..Script::default()
        });
        let log = launcher.log();
        let bridge = Arc::new(RuntimeBridge::new(launcher));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                thread::spawn(move || bridge.ensure_ready())
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }
        assert_eq!(log.launches(), 1);
    }

    #[test]
    fn concurrent_callers_share_one_failed_startup() {
        let launcher = SyntheticLauncher::with_script(Script {
            fail_launch: true,
            launch_delay: Duration::from_millis(50),
            ..Script::default()
        });
        let log = launcher.log();
        let bridge = Arc::new(RuntimeBridge::new(launcher));
        let gate = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                let gate = Arc::clone(&gate);
                thread::spawn(move || {
                    gate.wait();
                    bridge.ensure_ready()
                })
            })
            .collect();
        for h in handles {
            let err = h.join().unwrap().unwrap_err();
            assert!(matches!(err, PredictorError::RuntimeUnavailable { .. }));
        }
        assert_eq!(log.launches(), 1);
        assert!(!bridge.is_ready());

        // A call made after the failure starts a fresh attempt.
        assert!(bridge.ensure_ready().is_err());
        assert_eq!(log.launches(), 2);
    }

    #[test]
    fn panicking_launcher_reports_unavailable() {
        struct Exploding;
        impl RuntimeLauncher for Exploding {
            fn describe(&self) -> String {
                "exploding".to_string()
            }
            fn launch(&self) -> PredictorResult<Box<dyn ViscousPredictor>> {
                panic!("no interpreter")
            }
        }

        let bridge = RuntimeBridge::new(Exploding);
        let err = bridge.ensure_ready().unwrap_err();
        assert_eq!(
            err,
            PredictorError::RuntimeUnavailable {
                message: "no interpreter".into()
            }
        );
        // Not stuck in the starting phase.
        assert!(bridge.ensure_ready().is_err());
    }

    #[test]
    fn failed_start_is_not_permanent() {
        let launcher = SyntheticLauncher::with_script(Script {
            fail_launch: true,
            ..Script::default()
        });
        let script = launcher.script();
        let log = launcher.log();
        let bridge = RuntimeBridge::new(launcher);

        let err = bridge.ensure_ready().unwrap_err();
        assert!(matches!(err, PredictorError::RuntimeUnavailable { .. }));
        assert!(err.is_retryable());
        assert!(!bridge.is_ready());

        script.lock().unwrap().fail_launch = false;
        bridge.ensure_ready().unwrap();
        assert!(bridge.is_ready());
        assert_eq!(log.launches(), 2);
    }

    #[test]
    fn with_runtime_requires_ready() {
        let bridge = RuntimeBridge::new(SyntheticLauncher::new());
        let err = bridge.with_runtime(|_| Ok(())).unwrap_err();
        assert!(matches!(err, PredictorError::RuntimeUnavailable { .. }));
    }

    #[test]
    fn calls_are_serialised() {
        let launcher = SyntheticLauncher::with_script(Script {
            call_delay: Duration::from_millis(5),
            ..Script::default()
        });
        let log = launcher.log();
        let bridge = Arc::new(RuntimeBridge::new(launcher));
        bridge.ensure_ready().unwrap();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                thread::spawn(move || {
                    let req = sample_point_request(&[(0.5, 1e6)]);
                    bridge.with_runtime(|rt| rt.analyze_at_cls(&req)).map(|_| ())
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }
        assert_eq!(log.point_batches(), 6);
        assert_eq!(log.max_in_flight(), 1);
    }

    #[test]
    fn token_released_after_error() {
        let bridge = RuntimeBridge::new(SyntheticLauncher::new());
        bridge.ensure_ready().unwrap();

        let err = bridge
            .with_runtime(|_| -> PredictorResult<()> {
                Err(PredictorError::Transport {
                    message: "pipe closed".into(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, PredictorError::Transport { .. }));

        // Would deadlock if the token leaked.
        assert_eq!(bridge.with_runtime(|_| Ok(7)).unwrap(), 7);
    }

    #[test]
    fn panic_inside_scope_becomes_unknown() {
        let bridge = RuntimeBridge::new(SyntheticLauncher::new());
        bridge.ensure_ready().unwrap();

        let err = bridge
            .with_runtime(|_| -> PredictorResult<()> { panic!("interpreter exploded") })
            .unwrap_err();
        assert_eq!(
            err,
            PredictorError::Unknown {
                message: "interpreter exploded".into()
            }
        );
        assert!(bridge.with_runtime(|rt| Ok(rt.name().to_string())).is_ok());
    }
}
