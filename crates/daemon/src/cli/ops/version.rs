use clap::Args;

use codepad_daemon::build_info;
use codepad_daemon::http_server::health::version::VersionRequest;

#[derive(Args, Debug, Clone)]
pub struct Version {
    /// Also ask the running daemon for its version
    #[arg(long)]
    pub daemon: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("could not reach daemon: {0}")]
    Api(#[from] codepad_daemon::http_server::api::client::ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Version {
    type Error = VersionError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let local = build_info().to_string();
        if !self.daemon {
            return Ok(local);
        }

        let mut client = ctx.client.clone();
        let remote = client.call(VersionRequest {}).await?;
        Ok(format!("cli:    {local}\ndaemon: {remote}"))
    }
}
