use clap::Args;

use codepad_daemon::http_server::api::client::ApiError;
use codepad_daemon::http_server::api::v0::entries::GetEntryRequest;

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// Entry path or id
    pub entry: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("{0} is a folder")]
    IsFolder(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Cat {
    type Error = CatError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response = client
            .call(GetEntryRequest {
                ident: self.entry.clone(),
            })
            .await?;

        let entry = response.entry;
        if entry.is_folder() {
            return Err(CatError::IsFolder(entry.path.to_string()));
        }
        Ok(entry.content.unwrap_or_default())
    }
}
