use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use super::protocol::{ClientMessage, Dimensions, ServerMessage};
use super::pty::{ProcessEvent, ShellProcess, SpawnRequest};
use super::TerminalManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for `init`
    Idle,
    Initializing,
    Active,
    /// The shell is gone and will not come back on this connection
    Closed,
}

/// What the connection should do after handling a client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Nothing,
    Send(ServerMessage),
    /// Send the frame, then close the socket
    SendAndClose(ServerMessage),
}

/// One terminal connection and the single shell it owns
pub struct Session {
    manager: TerminalManager,
    state: SessionState,
    process: Option<Box<dyn ShellProcess>>,
    events: Option<flume::Receiver<ProcessEvent>>,
    cwd: Option<PathBuf>,
}

impl Session {
    pub(super) fn new(manager: TerminalManager) -> Self {
        manager.live.fetch_add(1, Ordering::SeqCst);
        Self {
            manager,
            state: SessionState::Idle,
            process: None,
            events: None,
            cwd: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Working directory of the shell, once started
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub async fn handle(&mut self, message: ClientMessage) -> Reply {
        match message {
            ClientMessage::Init {
                file_ref,
                cols,
                rows,
            } => self.init(file_ref, Dimensions::new(cols, rows)).await,
            ClientMessage::Command { data } => {
                if let (SessionState::Active, Some(process)) = (self.state, self.process.as_mut()) {
                    if let Err(e) = process.write(data.as_bytes()) {
                        tracing::warn!(error = %e, "failed to write to shell");
                    }
                }
                Reply::Nothing
            }
            ClientMessage::Resize { cols, rows } => {
                if let (SessionState::Active, Some(process)) = (self.state, self.process.as_ref()) {
                    if let Err(e) = process.resize(Dimensions::new(Some(cols), Some(rows))) {
                        tracing::warn!(error = %e, "failed to resize shell");
                    }
                }
                Reply::Nothing
            }
            ClientMessage::Close => {
                self.shutdown();
                Reply::Nothing
            }
        }
    }

    async fn init(&mut self, file_ref: Option<String>, dims: Dimensions) -> Reply {
        if self.state != SessionState::Idle {
            tracing::debug!(state = ?self.state, "ignoring repeated init");
            return Reply::Nothing;
        }
        self.state = SessionState::Initializing;

        let cwd = self
            .manager
            .resolver
            .working_dir_for(file_ref.as_deref())
            .await;
        let request = SpawnRequest {
            shell: self.manager.shell.clone(),
            cwd: cwd.clone(),
            dims,
        };

        let (tx, rx) = flume::unbounded();
        let spawner = self.manager.spawner.clone();
        let spawned = tokio::task::spawn_blocking(move || spawner.spawn(request, tx)).await;

        let failure = match spawned {
            Ok(Ok(process)) => {
                self.process = Some(process);
                self.events = Some(rx);
                self.cwd = Some(cwd);
                self.state = SessionState::Active;
                return Reply::Nothing;
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };

        tracing::error!(error = %failure, cwd = %cwd.display(), "could not start terminal");
        self.state = SessionState::Closed;
        Reply::SendAndClose(ServerMessage::spawn_failed(&failure))
    }

    /// Wait for the next event from the shell.
    ///
    /// Never resolves while no shell is running.
    pub async fn next_event(&mut self) -> ProcessEvent {
        loop {
            let Some(events) = self.events.clone() else {
                return std::future::pending().await;
            };
            match events.recv_async().await {
                Ok(event) => return event,
                Err(_) => self.events = None,
            }
        }
    }

    /// Translate a shell event into a frame for the client
    pub fn on_event(&mut self, event: ProcessEvent) -> Option<ServerMessage> {
        if self.state != SessionState::Active {
            return None;
        }
        match event {
            ProcessEvent::Output(data) => Some(ServerMessage::Data { data }),
            ProcessEvent::Exited { code } => {
                tracing::info!(code, "shell exited");
                self.process = None;
                self.state = SessionState::Closed;
                Some(ServerMessage::exited(code))
            }
        }
    }

    /// Kill the shell now, if there is one
    pub fn shutdown(&mut self) {
        if let Some(mut process) = self.process.take() {
            process.kill();
        }
        self.state = SessionState::Closed;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
        self.manager.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("cwd", &self.cwd)
            .field("has_process", &self.process.is_some())
            .finish()
    }
}
