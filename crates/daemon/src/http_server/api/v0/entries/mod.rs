//! Project entry API endpoints
//!
//! Entries are addressed by id or by path. Paths may contain `/`, so the
//! identifier is captured with a wildcard:
//! - `GET /entries` list, `POST /entries` create
//! - `GET|PUT|PATCH|DELETE /entries/*ident` read, update, delete
//! - `POST /sync/*ident` rewrite one file into the workspace
//! - `GET /tree` nested view of every entry

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::project::ProjectError;
use crate::ServiceState;

mod create;
mod delete;
mod get;
mod list;
mod sync;
mod tree;
mod update;

// Re-export request/response types for use by CLI and other clients
pub use create::{CreateEntryRequest, CreateEntryResponse};
pub use delete::{DeleteEntryRequest, DeleteEntryResponse};
pub use get::{GetEntryRequest, GetEntryResponse};
pub use list::{ListEntriesRequest, ListEntriesResponse};
pub use sync::{SyncEntryRequest, SyncEntryResponse};
pub use tree::{TreeRequest, TreeResponse};
pub use update::{UpdateEntryBody, UpdateEntryRequest, UpdateEntryResponse};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/entries", post(create::handler).get(list::handler))
        .route(
            "/entries/*ident",
            get(get::handler)
                .put(update::handler)
                .patch(update::handler)
                .delete(delete::handler),
        )
        .route("/sync/*ident", post(sync::handler))
        .route("/tree", get(tree::handler))
        .with_state(state)
}

/// JSON body of every failed entry request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

pub(crate) fn error_response(status: StatusCode, kind: &str, message: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message,
            kind: kind.to_string(),
        }),
    )
        .into_response()
}

pub(crate) fn project_error_response(err: ProjectError) -> Response {
    let status = match &err {
        ProjectError::Invalid(_) => StatusCode::BAD_REQUEST,
        ProjectError::NotFound(_) => StatusCode::NOT_FOUND,
        ProjectError::Conflict(_) | ProjectError::CascadeConflict { .. } => StatusCode::CONFLICT,
        ProjectError::Store(_) | ProjectError::Workspace(_) => {
            tracing::error!(error = %err, "entry request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, err.kind(), err.to_string())
}
