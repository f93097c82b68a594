//! Test server wrapper that starts Faultline on a random port

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use axum::Router;
use faultline_config::Config;
use faultline_core::ErrorHandler;
use faultline_server::Server;
use faultline_supervisor::{Phase, Supervisor, Terminator};
use tokio_util::sync::CancellationToken;

/// Terminator that stops the test server instead of the test process
#[derive(Clone)]
struct TestTerminator {
    shutdown: CancellationToken,
    exit_code: Arc<AtomicU8>,
    aborts: Arc<AtomicUsize>,
}

impl Terminator for TestTerminator {
    fn exit(&self, code: u8) {
        self.exit_code.store(code, Ordering::SeqCst);
        self.shutdown.cancel();
    }

    fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
    supervisor: Supervisor,
    terminator: TestTerminator,
    stopped: tokio::sync::oneshot::Receiver<()>,
}

impl TestServer {
    /// Start a test server with the given configuration and routes
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: Config, routes: Router) -> anyhow::Result<Self> {
        let shutdown = CancellationToken::new();
        let terminator = TestTerminator {
            shutdown: shutdown.clone(),
            exit_code: Arc::new(AtomicU8::new(0)),
            aborts: Arc::new(AtomicUsize::new(0)),
        };

        let handler = ErrorHandler::new();
        let supervisor = Supervisor::from_config(&config.supervisor, handler, terminator.clone())?;
        let server = Server::new(&config.server, handler, supervisor.clone())?.merge(routes);

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (stopped_tx, stopped) = tokio::sync::oneshot::channel();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
            stopped_tx.send(()).ok();
        });

        let client = reqwest::Client::new();

        Ok(Self {
            addr,
            shutdown,
            client,
            supervisor,
            terminator,
            stopped,
        })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn phase(&self) -> Phase {
        self.supervisor.phase()
    }

    /// Exit code requested by the supervisor, `0` if none
    pub fn exit_code(&self) -> u8 {
        self.terminator.exit_code.load(Ordering::SeqCst)
    }

    pub fn aborts(&self) -> usize {
        self.terminator.aborts.load(Ordering::SeqCst)
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Wait until the server has stopped serving
    pub async fn stopped(&mut self) {
        (&mut self.stopped).await.ok();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.supervisor.mark_exited();
    }
}
