//! Terminal sessions against a real shell on a pseudo-terminal

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures::channel::mpsc;
use futures::StreamExt;
use serde_json::json;
use tempfile::TempDir;

use codepad_daemon::http_server::terminal;
use codepad_daemon::project::Project;
use codepad_daemon::terminal::{
    ClientMessage, ProcessEvent, PtySpawner, Reply, ServerMessage, Session, SessionState,
    TerminalManager,
};
use codepad_daemon::workspace::Workspace;
use codepad_daemon::Database;
use common::{EntryKind, EntryPath};

const WAIT: Duration = Duration::from_secs(15);

async fn setup() -> (TerminalManager, Project<Database>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());
    let db = Database::connect(&url::Url::parse(&db_url).unwrap())
        .await
        .unwrap();
    let workspace = Workspace::open(temp_dir.path().join("workspace"))
        .await
        .unwrap();
    let project = Project::new(db, workspace);

    let manager = TerminalManager::new("sh", Arc::new(PtySpawner), Arc::new(project.clone()));
    (manager, project, temp_dir)
}

fn init(file_ref: Option<&str>) -> ClientMessage {
    ClientMessage::Init {
        file_ref: file_ref.map(str::to_string),
        cols: Some(100),
        rows: Some(40),
    }
}

/// Collect frames until the frames so far satisfy `done`
async fn read_until(
    session: &mut Session,
    done: impl Fn(&[ServerMessage]) -> bool,
) -> Vec<ServerMessage> {
    let mut frames = Vec::new();
    tokio::time::timeout(WAIT, async {
        loop {
            let event = session.next_event().await;
            if let Some(frame) = session.on_event(event) {
                frames.push(frame);
                if done(&frames) {
                    break;
                }
            }
        }
    })
    .await
    .expect("shell did not respond in time");
    frames
}

fn output_text(frames: &[ServerMessage]) -> String {
    frames
        .iter()
        .filter_map(|frame| match frame {
            ServerMessage::Data { data } => Some(data.as_str()),
            ServerMessage::Error { .. } => None,
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shell_starts_next_to_file_and_reports_exit() {
    let (manager, project, dir) = setup().await;
    project
        .create(
            EntryPath::parse("proj/main.js").unwrap(),
            EntryKind::File,
            Some("console.log('hi')".into()),
            None,
        )
        .await
        .unwrap();
    let expected_cwd = dir.path().join("workspace").join("proj");

    let mut session = manager.open_session();
    assert_eq!(manager.active_sessions(), 1);
    assert!(matches!(session.handle(init(Some("proj/main.js"))).await, Reply::Nothing));
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(session.cwd(), Some(expected_cwd.as_path()));
    assert!(expected_cwd.join("main.js").is_file());

    session
        .handle(ClientMessage::Command {
            data: "ls; echo done-$((1 + 1))\n".into(),
        })
        .await;
    let frames = read_until(&mut session, |frames| output_text(frames).contains("done-2")).await;
    assert!(output_text(&frames).contains("main.js"));

    session
        .handle(ClientMessage::Command {
            data: "exit 3\n".into(),
        })
        .await;
    let frames = read_until(&mut session, |frames| {
        matches!(frames.last(), Some(ServerMessage::Error { .. }))
    })
    .await;
    match frames.last() {
        Some(ServerMessage::Error { data }) => {
            assert!(data.contains("[Terminal exited with code 3]"), "{data:?}")
        }
        other => panic!("expected exit notice, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Closed);

    drop(session);
    assert_eq!(manager.active_sessions(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_kills_shell() {
    let (manager, project, _dir) = setup().await;

    let mut session = manager.open_session();
    session.handle(init(None)).await;
    assert_eq!(session.cwd(), Some(project.workspace().root()));

    // A second init must not start another shell
    assert!(matches!(session.handle(init(None)).await, Reply::Nothing));

    session.shutdown();
    assert_eq!(session.state(), SessionState::Closed);

    let exited = tokio::time::timeout(WAIT, async {
        loop {
            if let ProcessEvent::Exited { .. } = session.next_event().await {
                return true;
            }
        }
    })
    .await
    .unwrap_or(false);
    assert!(exited, "killed shell never reported exit");
}

/// Collect socket output until it contains `needle`
async fn read_socket_until(rx: &mut mpsc::UnboundedReceiver<Message>, needle: &str) -> String {
    let mut text = String::new();
    tokio::time::timeout(WAIT, async {
        while let Some(message) = rx.next().await {
            let Message::Text(raw) = message else {
                continue;
            };
            if let ServerMessage::Data { data } = serde_json::from_str(&raw).unwrap() {
                text.push_str(&data);
                if text.contains(needle) {
                    break;
                }
            }
        }
    })
    .await
    .expect("socket did not produce the expected output in time");
    text
}

fn frame(value: serde_json::Value) -> Result<Message, axum::Error> {
    Ok(Message::Text(value.to_string()))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_socket_loop_serves_a_shell_until_close() {
    let (manager, project, _dir) = setup().await;
    let entry = project
        .create(
            EntryPath::parse("app/run.sh").unwrap(),
            EntryKind::File,
            Some("echo hi".into()),
            None,
        )
        .await
        .unwrap();

    let (client, incoming) = mpsc::unbounded();
    let (outgoing, mut replies) = mpsc::unbounded();
    let task = tokio::spawn(terminal::serve(outgoing, incoming, manager.clone()));

    // Garbage is skipped without dropping the connection
    client
        .unbounded_send(Ok(Message::Text("not json".into())))
        .unwrap();
    client
        .unbounded_send(frame(json!({ "type": "init", "fileRef": entry.id.to_string() })))
        .unwrap();
    client
        .unbounded_send(frame(json!({ "type": "resize", "cols": 120, "rows": 50 })))
        .unwrap();
    client
        .unbounded_send(frame(json!({ "type": "command", "data": "ls; echo done-$((1 + 1))\n" })))
        .unwrap();

    let output = read_socket_until(&mut replies, "done-2").await;
    assert!(output.contains("run.sh"), "{output:?}");
    assert_eq!(manager.active_sessions(), 1);

    client.unbounded_send(Ok(Message::Close(None))).unwrap();
    tokio::time::timeout(WAIT, task)
        .await
        .expect("socket loop did not stop after close")
        .unwrap();
    assert_eq!(manager.active_sessions(), 0);
}
