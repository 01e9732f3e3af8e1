use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::EntryPath;

use super::project_error_response;
use crate::http_server::api::client::{entry_url, ApiRequest};
use crate::project::{EntryRef, ProjectError};
use crate::ServiceState;

/// Delete an entry; folders go with everything beneath them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEntryRequest {
    pub ident: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEntryResponse {
    pub removed: Vec<EntryPath>,
}

#[tracing::instrument(skip(state))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(ident): Path<String>,
) -> Result<impl IntoResponse, DeleteEntryError> {
    let reference = EntryRef::parse(&ident).map_err(ProjectError::from)?;
    let removed = state.project().delete(&reference).await?;
    Ok((http::StatusCode::OK, Json(DeleteEntryResponse { removed })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteEntryError {
    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl IntoResponse for DeleteEntryError {
    fn into_response(self) -> Response {
        match self {
            DeleteEntryError::Project(e) => project_error_response(e),
        }
    }
}

impl ApiRequest for DeleteEntryRequest {
    type Response = DeleteEntryResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.delete(entry_url(base_url, "entries", &self.ident))
    }
}
