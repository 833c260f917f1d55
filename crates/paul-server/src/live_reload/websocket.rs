//! Live reload endpoints: the client script and the WebSocket it opens.

use std::ops::ControlFlow;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::sync::broadcast::{self, error::RecvError};

use super::manager::ReloadEvent;
use crate::state::AppState;

/// Browser side of live reload, injected into every served page.
const CLIENT_SCRIPT: &str = include_str!("client.js");

/// `GET /__paul/live-reload.js`
pub(crate) async fn client_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        CLIENT_SCRIPT,
    )
}

/// `GET /__paul/live-reload`: upgrade and stream reload events.
///
/// The receiver is created before the upgrade completes so that a change
/// landing during the handshake still reaches the client.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(live_reload) = &state.live_reload else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let receiver = live_reload.subscribe();
    ws.on_upgrade(|socket| stream_events(socket, receiver))
}

async fn stream_events(mut socket: WebSocket, mut receiver: broadcast::Receiver<ReloadEvent>) {
    loop {
        let flow = tokio::select! {
            received = receiver.recv() => forward(&mut socket, received).await,
            // Anything from the client only keeps the connection open
            incoming = socket.recv() => match incoming {
                Some(Ok(_)) => ControlFlow::Continue(()),
                _ => ControlFlow::Break(()),
            },
        };
        if flow.is_break() {
            break;
        }
    }
    tracing::debug!("Live reload client disconnected");
}

async fn forward(
    socket: &mut WebSocket,
    received: Result<ReloadEvent, RecvError>,
) -> ControlFlow<()> {
    let event = match received {
        Ok(event) => event,
        // Missed events still mean the page is stale
        Err(RecvError::Lagged(_)) => ReloadEvent::new(String::new()),
        Err(RecvError::Closed) => return ControlFlow::Break(()),
    };
    let text = match serde_json::to_string(&event) {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(%error, "Failed to encode reload event");
            return ControlFlow::Continue(());
        }
    };
    if socket.send(Message::Text(text.into())).await.is_err() {
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_client_script_targets_socket_path() {
        assert!(CLIENT_SCRIPT.contains("/__paul/live-reload"));
        assert!(CLIENT_SCRIPT.contains("window.location.reload()"));
    }

    #[test]
    fn test_lagged_event_is_a_plain_reload() {
        let json = serde_json::to_string(&ReloadEvent::new(String::new())).unwrap();

        assert_eq!(json, r#"{"type":"reload","path":""}"#);
    }
}
