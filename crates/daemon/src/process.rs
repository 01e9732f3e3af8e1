use std::net::SocketAddr;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::http_server::{self, HttpServerError};
use crate::{ServiceConfig, ServiceState};

/// Install the global subscriber: `RUST_LOG` wins, `level` otherwise.
///
/// Keep the returned guard alive for as long as logs should be flushed.
/// Returns `None` when a subscriber is already installed.
pub fn init_tracing(level: tracing::Level) -> Option<WorkerGuard> {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_target(true))
        .try_init()
        .ok()
        .map(|()| guard)
}

/// Handle to a service running in the background
#[derive(Debug)]
pub struct ShutdownHandle {
    sender: watch::Sender<()>,
    task: JoinHandle<Result<(), HttpServerError>>,
    local_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Address the API server actually bound, useful with port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for the server to drain
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.sender.send(());
        self.task.await??;
        Ok(())
    }
}

/// Build state, bind the API port and serve in a background task
pub async fn spawn_service(config: &ServiceConfig) -> anyhow::Result<ShutdownHandle> {
    let state = ServiceState::from_config(config).await?;
    let listener = http_server::bind(config).await?;
    let local_addr = listener.local_addr()?;

    let (sender, receiver) = watch::channel(());
    let task = tokio::spawn(http_server::run(listener, state, receiver));

    Ok(ShutdownHandle {
        sender,
        task,
        local_addr,
    })
}

/// Run the service in the foreground until ctrl-c
pub async fn start_service(config: &ServiceConfig) -> anyhow::Result<()> {
    let handle = spawn_service(config).await?;
    tracing::info!(
        addr = %handle.local_addr(),
        workspace = %config.workspace_root.display(),
        "codepad daemon started"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    handle.shutdown().await
}
