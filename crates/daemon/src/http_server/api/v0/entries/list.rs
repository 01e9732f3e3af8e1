use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::EntrySummary;

use super::project_error_response;
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::project::ProjectError;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListEntriesRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEntriesResponse {
    pub entries: Vec<EntrySummary>,
}

#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Result<impl IntoResponse, ListEntriesError> {
    let entries = state.project().list().await?;
    Ok((http::StatusCode::OK, Json(ListEntriesResponse { entries })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ListEntriesError {
    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl IntoResponse for ListEntriesError {
    fn into_response(self) -> Response {
        match self {
            ListEntriesError::Project(e) => project_error_response(e),
        }
    }
}

impl ApiRequest for ListEntriesRequest {
    type Response = ListEntriesResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(api_url(base_url, ["api", "v0", "entries"]))
    }
}
