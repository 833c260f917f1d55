//! Live reload: filesystem watcher, debouncer and WebSocket fan-out.

mod debouncer;
mod manager;
mod websocket;

pub(crate) use manager::{LiveReloadManager, ReloadEvent};
pub(crate) use websocket::{client_script, ws_handler};
