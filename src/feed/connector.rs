use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::endpoint::ws_url;
use super::events::FeedEvent;
use crate::logging::{self, obj, v_str, Domain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Opens the live event stream. One call, one connection attempt.
pub struct FeedConnector;

impl FeedConnector {
    /// Connect to the `/ws` stream under `api_base` and forward every decoded
    /// frame to `sender`, in arrival order.
    ///
    /// Returns immediately; the connection runs on a spawned task, so this must
    /// be called from inside a tokio runtime. A bad base URL is logged and
    /// yields a handle that is already closed.
    pub fn open(api_base: &str, sender: mpsc::Sender<FeedEvent>) -> ConnectionHandle {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let state = Arc::new(state);

        let url = match ws_url(api_base) {
            Ok(url) => url,
            Err(err) => {
                logging::warn(
                    Domain::Feed,
                    "bad_endpoint",
                    obj(&[("msg", v_str(&err.to_string())), ("api_base", v_str(api_base))]),
                );
                state.send_replace(ConnectionState::Closed);
                return ConnectionHandle { task: None, state, url: None };
            }
        };

        let task = tokio::spawn(run_connection(url.clone(), sender, state.clone()));
        ConnectionHandle {
            task: Some(task),
            state,
            url: Some(url),
        }
    }
}

/// Owner of one live connection. Dropping it closes the connection.
#[derive(Debug)]
pub struct ConnectionHandle {
    task: Option<JoinHandle<()>>,
    state: Arc<watch::Sender<ConnectionState>>,
    url: Option<String>,
}

impl ConnectionHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Wait until the connection leaves `Connecting`, returning the new state.
    pub async fn established(&self) -> ConnectionState {
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(|s| *s != ConnectionState::Connecting).await {
            Ok(state) => *state,
            Err(_) => ConnectionState::Closed,
        };
        state
    }

    /// Drop the connection without draining in-flight frames. Safe to call
    /// any number of times, including on a handle that never opened.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            logging::info(
                Domain::Feed,
                "closed",
                obj(&[("url", v_str(self.url.as_deref().unwrap_or("")))]),
            );
        }
        self.state.send_replace(ConnectionState::Closed);
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_connection(
    url: String,
    sender: mpsc::Sender<FeedEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
) {
    let mut ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(err) => {
            logging::warn(
                Domain::Feed,
                "connect_failed",
                obj(&[("msg", v_str(&err.to_string())), ("url", v_str(&url))]),
            );
            state.send_replace(ConnectionState::Closed);
            return;
        }
    };
    state.send_replace(ConnectionState::Open);
    logging::info(Domain::Feed, "connected", obj(&[("url", v_str(&url))]));

    while let Some(msg) = ws.next().await {
        match msg {
            Ok(msg) => {
                if let Some(event) = decode_message(msg) {
                    if sender.send(event).await.is_err() {
                        // Listener is gone.
                        break;
                    }
                }
            }
            Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => break,
            Err(err @ (WsError::Io(_) | WsError::Protocol(_) | WsError::Tls(_))) => {
                logging::warn(
                    Domain::Feed,
                    "transport_error",
                    obj(&[("msg", v_str(&err.to_string())), ("url", v_str(&url))]),
                );
                break;
            }
            // Per-message failures; the socket itself is still usable.
            Err(err) => {
                logging::warn(
                    Domain::Feed,
                    "transport_error",
                    obj(&[("msg", v_str(&err.to_string())), ("url", v_str(&url))]),
                );
            }
        }
    }

    state.send_replace(ConnectionState::Closed);
    logging::info(Domain::Feed, "disconnected", obj(&[("url", v_str(&url))]));
}

/// Data frames become events; control frames are dropped.
fn decode_message(msg: Message) -> Option<FeedEvent> {
    match msg {
        Message::Text(text) => Some(FeedEvent::decode(&text)),
        Message::Binary(bytes) => Some(FeedEvent::decode(&String::from_utf8_lossy(&bytes))),
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_frame_decodes() {
        assert_eq!(
            decode_message(Message::Text(r#"{"type":"ping"}"#.into())),
            Some(FeedEvent::Json(json!({"type": "ping"})))
        );
    }

    #[test]
    fn test_binary_frame_decodes_as_text() {
        assert_eq!(
            decode_message(Message::Binary(b"plain".to_vec())),
            Some(FeedEvent::Raw("plain".to_string()))
        );
    }

    #[test]
    fn test_control_frames_are_skipped() {
        assert_eq!(decode_message(Message::Ping(vec![1])), None);
        assert_eq!(decode_message(Message::Pong(vec![])), None);
        assert_eq!(decode_message(Message::Close(None)), None);
    }

    #[tokio::test]
    async fn test_bad_endpoint_yields_closed_handle() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut handle = FeedConnector::open("ftp://nowhere", tx);
        assert!(handle.is_closed());
        assert!(handle.url().is_none());
        handle.close();
        handle.close();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_established_returns_final_state() {
        let (tx, _rx) = mpsc::channel(4);
        let handle = FeedConnector::open("ftp://nowhere", tx);
        assert_eq!(handle.established().await, ConnectionState::Closed);
    }
}
