use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio_util::sync::CancellationToken;

/// How the supervisor ends the process
pub trait Terminator: Send + Sync + 'static {
    /// Start a graceful exit that should finish with `code`
    fn exit(&self, code: u8);

    /// End the process immediately, skipping any cleanup
    fn abort(&self);
}

/// Terminator for the real process
///
/// A graceful exit records the exit code and cancels the server's shutdown
/// token; `main` is expected to return that code once serving stops. An
/// abort calls [`std::process::abort`].
#[derive(Debug, Clone)]
pub struct ProcessTerminator {
    shutdown: CancellationToken,
    exit_code: Arc<AtomicU8>,
}

impl ProcessTerminator {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            exit_code: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Exit code requested so far, `0` if no fatal exit was requested
    pub fn exit_code(&self) -> u8 {
        self.exit_code.load(Ordering::SeqCst)
    }
}

impl Terminator for ProcessTerminator {
    fn exit(&self, code: u8) {
        self.exit_code.store(code, Ordering::SeqCst);
        self.shutdown.cancel();
    }

    fn abort(&self) {
        std::process::abort();
    }
}
