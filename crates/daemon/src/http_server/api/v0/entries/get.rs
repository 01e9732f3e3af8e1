use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::Entry;

use super::project_error_response;
use crate::http_server::api::client::{entry_url, ApiRequest};
use crate::project::{EntryRef, ProjectError};
use crate::ServiceState;

/// Fetch one entry, including its content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetEntryRequest {
    /// Entry id or path
    pub ident: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetEntryResponse {
    pub entry: Entry,
}

#[tracing::instrument(skip(state))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(ident): Path<String>,
) -> Result<impl IntoResponse, GetEntryError> {
    let reference = EntryRef::parse(&ident).map_err(ProjectError::from)?;
    let entry = state.project().get(&reference).await?;
    Ok((http::StatusCode::OK, Json(GetEntryResponse { entry })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum GetEntryError {
    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl IntoResponse for GetEntryError {
    fn into_response(self) -> Response {
        match self {
            GetEntryError::Project(e) => project_error_response(e),
        }
    }
}

impl ApiRequest for GetEntryRequest {
    type Response = GetEntryResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(entry_url(base_url, "entries", &self.ident))
    }
}
