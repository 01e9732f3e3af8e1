use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::EntrySummary;

use super::project_error_response;
use crate::http_server::api::client::{entry_url, ApiRequest};
use crate::project::{EntryRef, ProjectError};
use crate::ServiceState;

/// Write an entry's stored content into the workspace mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEntryRequest {
    pub ident: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEntryResponse {
    pub entry: EntrySummary,
    /// Absolute path written on the daemon host; absent for folders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub written: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(ident): Path<String>,
) -> Result<impl IntoResponse, SyncEntryError> {
    let reference = EntryRef::parse(&ident).map_err(ProjectError::from)?;
    let outcome = state.project().sync(&reference).await?;

    Ok((
        http::StatusCode::OK,
        Json(SyncEntryResponse {
            entry: outcome.entry.into(),
            written: outcome.written.map(|p| p.display().to_string()),
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum SyncEntryError {
    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl IntoResponse for SyncEntryError {
    fn into_response(self) -> Response {
        match self {
            SyncEntryError::Project(e) => project_error_response(e),
        }
    }
}

impl ApiRequest for SyncEntryRequest {
    type Response = SyncEntryResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(entry_url(base_url, "sync", &self.ident))
    }
}
