//! Interactive shells attached to browser connections.
//!
//! Each WebSocket connection gets one [`Session`], which owns at most one
//! shell process for its whole life. Nothing survives a disconnect.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use common::store::PathStore;

use crate::project::Project;

pub mod protocol;
pub mod pty;
pub mod session;

pub use protocol::{ClientMessage, Dimensions, ServerMessage};
pub use pty::{default_shell, ProcessEvent, PtySpawner, ShellProcess, ShellSpawner, SpawnRequest};
pub use session::{Reply, Session, SessionState};

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("{0}")]
    Spawn(String),
    #[error("failed to resize terminal: {0}")]
    Resize(String),
    #[error("terminal io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decides where a new shell starts
#[async_trait]
pub trait WorkingDirResolver: Send + Sync + 'static {
    async fn working_dir_for(&self, file_ref: Option<&str>) -> PathBuf;
}

#[async_trait]
impl<S: PathStore> WorkingDirResolver for Project<S> {
    async fn working_dir_for(&self, file_ref: Option<&str>) -> PathBuf {
        Project::working_dir_for(self, file_ref).await
    }
}

/// Shared configuration for every terminal session
#[derive(Clone)]
pub struct TerminalManager {
    shell: String,
    spawner: Arc<dyn ShellSpawner>,
    resolver: Arc<dyn WorkingDirResolver>,
    live: Arc<AtomicUsize>,
}

impl TerminalManager {
    pub fn new(
        shell: impl Into<String>,
        spawner: Arc<dyn ShellSpawner>,
        resolver: Arc<dyn WorkingDirResolver>,
    ) -> Self {
        Self {
            shell: shell.into(),
            spawner,
            resolver,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn open_session(&self) -> Session {
        Session::new(self.clone())
    }

    /// Sessions currently connected
    pub fn active_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for TerminalManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalManager")
            .field("shell", &self.shell)
            .field("active_sessions", &self.active_sessions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    struct FixedDir(PathBuf);

    #[async_trait]
    impl WorkingDirResolver for FixedDir {
        async fn working_dir_for(&self, _file_ref: Option<&str>) -> PathBuf {
            self.0.clone()
        }
    }

    /// Records input and lets the test drive process events by hand
    #[derive(Default, Clone)]
    struct FakeSpawner {
        fail: bool,
        written: Arc<Mutex<Vec<String>>>,
        events: Arc<Mutex<Option<flume::Sender<ProcessEvent>>>>,
        spawned: Arc<AtomicUsize>,
        killed: Arc<AtomicUsize>,
    }

    struct FakeProcess {
        written: Arc<Mutex<Vec<String>>>,
        killed: Arc<AtomicUsize>,
    }

    impl ShellProcess for FakeProcess {
        fn write(&mut self, data: &[u8]) -> Result<(), TerminalError> {
            self.written
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(data).into_owned());
            Ok(())
        }

        fn resize(&self, _dims: Dimensions) -> Result<(), TerminalError> {
            Ok(())
        }

        fn kill(&mut self) {
            self.killed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ShellSpawner for FakeSpawner {
        fn spawn(
            &self,
            _request: SpawnRequest,
            events: flume::Sender<ProcessEvent>,
        ) -> Result<Box<dyn ShellProcess>, TerminalError> {
            if self.fail {
                return Err(TerminalError::Spawn("no such shell".into()));
            }
            self.spawned.fetch_add(1, Ordering::SeqCst);
            *self.events.lock().unwrap() = Some(events);
            Ok(Box::new(FakeProcess {
                written: self.written.clone(),
                killed: self.killed.clone(),
            }))
        }
    }

    fn manager(spawner: FakeSpawner) -> TerminalManager {
        TerminalManager::new(
            "sh",
            Arc::new(spawner),
            Arc::new(FixedDir(std::env::temp_dir())),
        )
    }

    fn init() -> ClientMessage {
        ClientMessage::Init {
            file_ref: None,
            cols: None,
            rows: None,
        }
    }

    #[tokio::test]
    async fn test_lifecycle_and_exit_notice() {
        let spawner = FakeSpawner::default();
        let manager = manager(spawner.clone());
        let mut session = manager.open_session();
        assert_eq!(manager.active_sessions(), 1);

        // Input before init goes nowhere.
        session
            .handle(ClientMessage::Command { data: "early".into() })
            .await;
        assert_eq!(session.handle(init()).await, Reply::Nothing);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.cwd(), Some(std::env::temp_dir().as_path()));

        // A second init must not spawn another shell.
        session.handle(init()).await;
        assert_eq!(spawner.spawned.load(Ordering::SeqCst), 1);

        session
            .handle(ClientMessage::Command { data: "ls\r".into() })
            .await;
        assert_eq!(*spawner.written.lock().unwrap(), vec!["ls\r".to_string()]);

        let events = spawner.events.lock().unwrap().clone().unwrap();
        events.send(ProcessEvent::Output("file.txt\r\n".into())).unwrap();
        events.send(ProcessEvent::Exited { code: 3 }).unwrap();

        let first = session.next_event().await;
        assert_eq!(
            session.on_event(first),
            Some(ServerMessage::Data {
                data: "file.txt\r\n".into()
            })
        );
        let second = session.next_event().await;
        assert_eq!(session.on_event(second), Some(ServerMessage::exited(3)));
        assert_eq!(session.state(), SessionState::Closed);
        // The exited process was released without another kill.
        assert_eq!(spawner.killed.load(Ordering::SeqCst), 0);

        drop(session);
        assert_eq!(manager.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_spawn_failure_closes_connection() {
        let spawner = FakeSpawner {
            fail: true,
            ..Default::default()
        };
        let mut session = manager(spawner).open_session();
        match session.handle(init()).await {
            Reply::SendAndClose(ServerMessage::Error { data }) => {
                assert!(data.contains("Could not start terminal. no such shell"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_idle_session_has_no_events() {
        let mut session = manager(FakeSpawner::default()).open_session();
        let waited = tokio::time::timeout(Duration::from_millis(50), session.next_event()).await;
        assert!(waited.is_err());
    }
}
