use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::tree::FileTree;

use super::project_error_response;
use crate::http_server::api::client::{api_url, ApiRequest};
use crate::project::ProjectError;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeRequest {}

/// Folders first, then files, each level sorted by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeResponse {
    pub tree: FileTree,
}

#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Result<impl IntoResponse, TreeError> {
    let tree = state.project().tree().await?;
    Ok((http::StatusCode::OK, Json(TreeResponse { tree })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl IntoResponse for TreeError {
    fn into_response(self) -> Response {
        match self {
            TreeError::Project(e) => project_error_response(e),
        }
    }
}

impl ApiRequest for TreeRequest {
    type Response = TreeResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(api_url(base_url, ["api", "v0", "tree"]))
    }
}
