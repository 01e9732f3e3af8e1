use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::{Entry, EntryPath};

use super::{error_response, project_error_response};
use crate::http_server::api::client::{entry_url, ApiRequest};
use crate::project::{EntryRef, ProjectError};
use crate::ServiceState;

/// Request body for updating an entry (used by handler)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEntryBody {
    /// New path; moves the whole subtree for folders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// New content; files only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Full request for updating an entry (used by client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEntryRequest {
    pub ident: String,
    #[serde(flatten)]
    pub body: UpdateEntryBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEntryResponse {
    pub entry: Entry,
}

#[tracing::instrument(skip(state, payload))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(ident): Path<String>,
    payload: Result<Json<UpdateEntryBody>, JsonRejection>,
) -> Result<impl IntoResponse, UpdateEntryError> {
    let Json(body) = payload.map_err(|e| UpdateEntryError::Invalid(e.body_text()))?;
    let reference = EntryRef::parse(&ident).map_err(ProjectError::from)?;
    let path = body
        .path
        .as_deref()
        .map(EntryPath::parse)
        .transpose()
        .map_err(|e| UpdateEntryError::Invalid(e.to_string()))?;

    let entry = state
        .project()
        .update(&reference, path, body.content)
        .await?;

    Ok((StatusCode::OK, Json(UpdateEntryResponse { entry })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateEntryError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl IntoResponse for UpdateEntryError {
    fn into_response(self) -> Response {
        match self {
            UpdateEntryError::Invalid(msg) => {
                error_response(StatusCode::BAD_REQUEST, "invalid", format!("invalid request: {msg}"))
            }
            UpdateEntryError::Project(e) => project_error_response(e),
        }
    }
}

impl ApiRequest for UpdateEntryRequest {
    type Response = UpdateEntryResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client
            .put(entry_url(base_url, "entries", &self.ident))
            .json(&self.body)
    }
}
