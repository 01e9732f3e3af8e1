// Service modules
pub(crate) mod database;
pub mod http_server;
pub mod process;
pub mod project;
pub mod service_config;
pub mod service_state;
pub mod terminal;
pub mod workspace;

// App state (configuration, paths)
pub mod state;

pub use database::{Database, DatabaseSetupError};
pub use process::{init_tracing, spawn_service, start_service, ShutdownHandle};
pub use service_config::Config as ServiceConfig;
pub use service_state::State as ServiceState;
pub use state::{AppConfig, AppState, StateError};

/// Name and version this daemon was built as
pub fn build_info() -> http_server::health::version::BuildInfo {
    http_server::health::version::BuildInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
