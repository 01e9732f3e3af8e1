use axum::Router;

use crate::ServiceState;

pub mod entries;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    entries::router(state)
}
