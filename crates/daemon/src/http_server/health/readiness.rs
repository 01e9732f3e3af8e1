use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{api_url, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyzRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyzResponse {
    pub status: String,
    pub database: bool,
    pub workspace: bool,
    pub active_terminals: usize,
}

impl ApiRequest for ReadyzRequest {
    type Response = ReadyzResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(api_url(base_url, ["_status", "readyz"]))
    }
}

/// Ready when the database answers and the workspace root exists
#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    let database = match state.database().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "database not ready");
            false
        }
    };
    let workspace = tokio::fs::metadata(state.project().workspace().root())
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);

    let ready = database && workspace;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyzResponse {
            status: if ready { "ok" } else { "unavailable" }.to_string(),
            database,
            workspace,
            active_terminals: state.terminal().active_sessions(),
        }),
    )
        .into_response()
}
