use axum::routing::get;
use axum::Router;

use crate::ServiceState;

pub mod liveness;
pub mod readiness;
pub mod version;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/livez", get(liveness::handler))
        .route("/readyz", get(readiness::handler))
        .route("/version", get(version::handler))
        .with_state(state)
}
