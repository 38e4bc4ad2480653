use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

use super::buffer::EventBuffer;
use super::connector::{ConnectionHandle, ConnectionState, FeedConnector};
use super::events::FeedEvent;
use super::normalize::{normalize, DisplayEntry};
use crate::config::Config;
use crate::logging::{self, obj, v_str, Domain};

/// Lifecycle of one feed view. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Unmounted,
    Connecting,
    Streaming,
    Closed,
}

/// The "Live Events" panel: one connector, one buffer, one consumer.
pub struct FeedView {
    api_base: String,
    channel_capacity: usize,
    phase: ViewState,
    buffer: EventBuffer,
    handle: Option<ConnectionHandle>,
    events: Option<mpsc::Receiver<FeedEvent>>,
}

impl FeedView {
    pub fn new(api_base: impl Into<String>, channel_capacity: usize) -> Self {
        Self {
            api_base: api_base.into(),
            channel_capacity: channel_capacity.max(1),
            phase: ViewState::Unmounted,
            buffer: EventBuffer::new(),
            handle: None,
            events: None,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.api_base.clone(), cfg.feed_channel_capacity)
    }

    /// Reset the buffer and open the connection. A view mounts once.
    pub fn mount(&mut self) -> Result<()> {
        if self.phase != ViewState::Unmounted {
            return Err(anyhow!("feed view cannot be mounted from {:?}", self.phase));
        }
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        self.buffer = EventBuffer::new();
        self.handle = Some(FeedConnector::open(&self.api_base, tx));
        self.events = Some(rx);
        self.phase = ViewState::Connecting;
        logging::debug(Domain::Feed, "view_mounted", obj(&[("api_base", v_str(&self.api_base))]));
        Ok(())
    }

    /// Close the connection and stop consuming. Idempotent.
    pub fn unmount(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.close();
        }
        self.events = None;
        if self.phase != ViewState::Closed {
            self.phase = ViewState::Closed;
            logging::debug(
                Domain::Feed,
                "view_unmounted",
                obj(&[("entries", serde_json::json!(self.buffer.len()))]),
            );
        }
    }

    pub fn state(&self) -> ViewState {
        match (self.phase, self.connection()) {
            (ViewState::Connecting, Some(ConnectionState::Open)) => ViewState::Streaming,
            // Never opened: bad endpoint or refused connection.
            (ViewState::Connecting, Some(ConnectionState::Closed)) => ViewState::Closed,
            (phase, _) => phase,
        }
    }

    pub fn connection(&self) -> Option<ConnectionState> {
        self.handle.as_ref().map(|h| h.state())
    }

    pub fn handle(&self) -> Option<&ConnectionHandle> {
        self.handle.as_ref()
    }

    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    /// Normalize one event into the buffer. A closed view no longer
    /// changes; the entry is returned but not kept.
    pub fn apply(&mut self, event: &FeedEvent) -> DisplayEntry {
        let entry = normalize(event);
        if self.phase == ViewState::Closed {
            return entry;
        }
        if self.phase == ViewState::Connecting {
            self.phase = ViewState::Streaming;
        }
        self.buffer.push(entry.clone());
        entry
    }

    /// Wait for the next event and fold it into the buffer. `None` once the
    /// stream has ended or the view is not mounted.
    pub async fn next_update(&mut self) -> Option<&EventBuffer> {
        let event = self.events.as_mut()?.recv().await?;
        self.apply(&event);
        Some(&self.buffer)
    }

    /// Re-render after every new entry until the stream ends.
    pub async fn run<F>(&mut self, mut render: F)
    where
        F: FnMut(&EventBuffer),
    {
        while let Some(buffer) = self.next_update().await {
            render(buffer);
        }
    }
}

impl Drop for FeedView {
    fn drop(&mut self) {
        self.unmount();
    }
}
