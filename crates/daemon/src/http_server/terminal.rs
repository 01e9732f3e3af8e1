//! `GET /terminal`: one shell per WebSocket connection.

use std::fmt::Display;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::BoxError;
use futures::{Sink, SinkExt, Stream, StreamExt};

use crate::terminal::{ClientMessage, Reply, ServerMessage, TerminalManager};
use crate::ServiceState;

#[tracing::instrument(skip_all)]
pub async fn handler(ws: WebSocketUpgrade, State(state): State<ServiceState>) -> Response {
    let manager = state.terminal().clone();
    ws.on_upgrade(move |socket| {
        let (sink, stream) = socket.split();
        serve(sink, stream, manager)
    })
}

async fn send<Tx>(sink: &mut Tx, frame: &ServerMessage) -> Result<(), axum::Error>
where
    Tx: Sink<Message> + Unpin,
    Tx::Error: Into<BoxError>,
{
    let text = serde_json::to_string(frame).map_err(axum::Error::new)?;
    sink.send(Message::Text(text)).await.map_err(axum::Error::new)
}

fn decode(message: &Message) -> Option<Result<ClientMessage, serde_json::Error>> {
    match message {
        Message::Text(text) => Some(serde_json::from_str(text)),
        Message::Binary(bytes) => Some(serde_json::from_slice(bytes)),
        _ => None,
    }
}

/// Pump one connection until the client leaves or the socket fails.
///
/// Takes the two halves of a split socket so any message transport can
/// carry a session.
pub async fn serve<Tx, Rx, E>(mut sink: Tx, mut stream: Rx, manager: TerminalManager)
where
    Tx: Sink<Message> + Unpin,
    Tx::Error: Into<BoxError>,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut session = manager.open_session();
    tracing::debug!(active = manager.active_sessions(), "terminal connected");

    loop {
        tokio::select! {
            incoming = stream.next() => {
                let message = match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "terminal socket error");
                        break;
                    }
                };
                let parsed = match decode(&message) {
                    Some(Ok(parsed)) => parsed,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "ignoring malformed terminal frame");
                        continue;
                    }
                    None => continue,
                };

                match session.handle(parsed).await {
                    Reply::Nothing => {}
                    Reply::Send(frame) => {
                        if send(&mut sink, &frame).await.is_err() {
                            break;
                        }
                    }
                    Reply::SendAndClose(frame) => {
                        let _ = send(&mut sink, &frame).await;
                        let _ = sink.close().await;
                        break;
                    }
                }
            }
            event = session.next_event() => {
                if let Some(frame) = session.on_event(event) {
                    if send(&mut sink, &frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    session.shutdown();
    tracing::debug!("terminal disconnected");
}
