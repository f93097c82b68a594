//! Process-level handling of failures that escaped the request pipeline
//!
//! Untrusted failures start a graceful shutdown and arm a watchdog that
//! aborts the process if the shutdown does not finish in time. Failures of
//! background tasks are only logged.

#![allow(clippy::must_use_candidate)]

mod terminator;

use std::future::Future;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use faultline_config::SupervisorConfig;
use faultline_core::{ErrorHandler, Failure};

pub use terminator::{ProcessTerminator, Terminator};

/// Shutdown progress of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Serving normally
    Running,
    /// A fatal failure asked the process to exit
    GracefulShutdown,
    /// The process finished its shutdown
    Exited,
    /// The watchdog fired before the shutdown finished
    ForcedAbort,
}

/// Fatal-path supervisor
///
/// Cheap to clone; all clones share the same shutdown state.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

struct Inner {
    handler: ErrorHandler,
    terminator: Box<dyn Terminator>,
    abort_delay: Duration,
    exit_code: u8,
    state: Mutex<State>,
}

struct State {
    phase: Phase,
    watchdog: Option<Watchdog>,
}

/// Armed forced-abort timer
struct Watchdog {
    cancel: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

impl Supervisor {
    pub fn new(handler: ErrorHandler, terminator: impl Terminator, abort_delay: Duration, exit_code: u8) -> Self {
        Self {
            inner: Arc::new(Inner {
                handler,
                terminator: Box::new(terminator),
                abort_delay,
                exit_code,
                state: Mutex::new(State {
                    phase: Phase::Running,
                    watchdog: None,
                }),
            }),
        }
    }

    /// Build a supervisor from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured abort delay is invalid
    pub fn from_config(
        config: &SupervisorConfig,
        handler: ErrorHandler,
        terminator: impl Terminator,
    ) -> anyhow::Result<Self> {
        Ok(Self::new(handler, terminator, config.abort_delay()?, config.exit_code))
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    /// Handle a failure nothing else could handle
    ///
    /// Trusted failures are considered handled once logged. Anything else
    /// starts the shutdown; only the first such failure does, later ones
    /// are logged only.
    pub fn uncaught(&self, failure: &Failure) {
        tracing::error!(
            source = "uncaught",
            name = failure.name(),
            stack = %failure.stack(),
            "uncaught failure: {failure}"
        );

        self.inner.handler.handle_error(failure, None);

        if self.inner.handler.is_trusted_error(failure) {
            return;
        }

        self.begin_shutdown();
    }

    /// Log a failed background operation
    ///
    /// Its origin may be unrelated to any live request, so this never
    /// terminates the process.
    pub fn unhandled_rejection(&self, reason: &anyhow::Error, origin: &str) {
        tracing::error!(
            source = "unhandled_rejection",
            origin,
            "Unhandled rejection at: {origin}, reason: {reason:#}"
        );
    }

    /// Spawn a background task whose error is reported as an unhandled rejection
    pub fn spawn_supervised<F>(&self, origin: impl Into<String>, future: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let supervisor = self.clone();
        let origin = origin.into();

        tokio::spawn(async move {
            if let Err(reason) = future.await {
                supervisor.unhandled_rejection(&reason, &origin);
            }
        })
    }

    /// Route panics to [`Supervisor::uncaught`]
    ///
    /// Replaces the current panic hook; call once during startup.
    pub fn install_panic_hook(&self) {
        let supervisor = self.clone();

        std::panic::set_hook(Box::new(move |info| {
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "Box<dyn Any>".to_owned());
            let location = info
                .location()
                .map_or_else(|| "unknown location".to_owned(), ToString::to_string);

            supervisor.uncaught(&Failure::internal(anyhow::anyhow!("panicked at {location}: {message}")));
        }));
    }

    /// Record that the process finished shutting down
    ///
    /// Disarms the watchdog. Call right before returning from `main`.
    pub fn mark_exited(&self) {
        let watchdog = {
            let mut state = self.inner.lock();
            if matches!(state.phase, Phase::Running | Phase::GracefulShutdown) {
                state.phase = Phase::Exited;
            }
            state.watchdog.take()
        };

        if let Some(watchdog) = watchdog {
            // The thread also stops when the sender is dropped
            let _ = watchdog.cancel.send(());
            if watchdog.thread.join().is_err() {
                tracing::warn!("abort watchdog thread panicked");
            }
        }
    }

    /// Run the last teardown step of the process
    ///
    /// After a fatal failure the watchdog stays armed during and after
    /// `teardown`; only the end of the process disarms it. Otherwise the
    /// supervisor is marked exited once `teardown` returns.
    pub fn finish<T>(&self, teardown: impl FnOnce() -> T) -> T {
        let result = teardown();

        if self.phase() == Phase::Running {
            self.mark_exited();
        }

        result
    }

    fn begin_shutdown(&self) {
        {
            let mut state = self.inner.lock();
            if state.phase != Phase::Running {
                tracing::warn!(phase = ?state.phase, "fatal failure while already shutting down");
                return;
            }

            state.phase = Phase::GracefulShutdown;
            state.watchdog = self.arm_watchdog();
        }

        tracing::error!(
            exit_code = self.inner.exit_code,
            abort_delay_ms = u64::try_from(self.inner.abort_delay.as_millis()).unwrap_or(u64::MAX),
            "untrusted failure, shutting down"
        );

        self.inner.terminator.exit(self.inner.exit_code);
    }

    fn arm_watchdog(&self) -> Option<Watchdog> {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let inner = Arc::clone(&self.inner);

        let spawned = std::thread::Builder::new()
            .name("faultline-abort".to_owned())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(inner.abort_delay) {
                    inner.force_abort();
                }
            });

        match spawned {
            Ok(thread) => Some(Watchdog { cancel, thread }),
            Err(e) => {
                tracing::error!("failed to arm abort watchdog: {e}");
                None
            }
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn force_abort(&self) {
        {
            let mut state = self.lock();
            if state.phase != Phase::GracefulShutdown {
                return;
            }
            state.phase = Phase::ForcedAbort;
        }

        tracing::error!("graceful shutdown did not finish in time, aborting");
        self.terminator.abort();
    }
}
