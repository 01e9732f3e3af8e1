use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::{Entry, EntryKind, EntryPath};

use super::{error_response, project_error_response};
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::project::ProjectError;
use crate::ServiceState;

/// Create a file or folder.
///
/// Every field is optional on the wire so that a missing `path` or `kind`
/// is reported as an invalid request rather than a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `file` or `folder`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryResponse {
    pub entry: Entry,
}

#[tracing::instrument(skip(state, payload))]
pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CreateEntryError> {
    let Json(req) = payload.map_err(|e| CreateEntryError::Invalid(e.body_text()))?;

    let raw_path = req
        .path
        .ok_or_else(|| CreateEntryError::Invalid("missing path".into()))?;
    let path = EntryPath::parse(&raw_path).map_err(|e| CreateEntryError::Invalid(e.to_string()))?;
    let kind: EntryKind = req
        .kind
        .ok_or_else(|| CreateEntryError::Invalid("missing kind".into()))?
        .parse()
        .map_err(|e: common::entry::UnknownEntryKind| CreateEntryError::Invalid(e.to_string()))?;

    let entry = state
        .project()
        .create(path, kind, req.content, req.language)
        .await?;

    Ok((StatusCode::CREATED, Json(CreateEntryResponse { entry })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum CreateEntryError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl IntoResponse for CreateEntryError {
    fn into_response(self) -> Response {
        match self {
            CreateEntryError::Invalid(msg) => {
                error_response(StatusCode::BAD_REQUEST, "invalid", format!("invalid request: {msg}"))
            }
            CreateEntryError::Project(e) => project_error_response(e),
        }
    }
}

impl ApiRequest for CreateEntryRequest {
    type Response = CreateEntryResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client
            .post(api_url(base_url, ["api", "v0", "entries"]))
            .json(&self)
    }
}
