use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{api_url, ApiRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivezRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivezResponse {
    pub status: String,
}

impl ApiRequest for LivezRequest {
    type Response = LivezResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(api_url(base_url, ["_status", "livez"]))
    }
}

/// Always OK while the process can answer HTTP at all. Dependency checks
/// belong in [`super::readiness::handler`].
#[tracing::instrument]
pub async fn handler() -> Response {
    (StatusCode::OK, Json(LivezResponse { status: "ok".into() })).into_response()
}
