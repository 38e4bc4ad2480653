use std::time::Duration;

use anyhow::Result;
use tokio::time::{interval, MissedTickBehavior};

use crate::api::logs::{LevelFilter, LogEntry, LogsApi};
use crate::config::Config;
use crate::logging::{self, obj, v_num, v_str, Domain};

/// Backend log viewer. Polls on a fixed period; a failed poll leaves the
/// last good page on screen.
pub struct LogsPanel<A: LogsApi> {
    api: A,
    limit: u32,
    filter: LevelFilter,
    poll_every: Duration,
    entries: Vec<LogEntry>,
    last_error: Option<String>,
}

impl<A: LogsApi> LogsPanel<A> {
    pub fn new(api: A, limit: u32, poll_every: Duration) -> Self {
        Self {
            api,
            limit,
            filter: LevelFilter::All,
            poll_every,
            entries: Vec::new(),
            last_error: None,
        }
    }

    pub fn from_config(api: A, cfg: &Config) -> Self {
        Self::new(api, cfg.logs_limit, Duration::from_secs(cfg.logs_poll_secs.max(1)))
    }

    pub fn with_filter(mut self, filter: LevelFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn filter(&self) -> LevelFilter {
        self.filter
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Changing the filter refetches right away.
    pub async fn set_filter(&mut self, filter: LevelFilter) -> Result<()> {
        self.filter = filter;
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        match self.api.fetch_logs(self.limit, self.filter).await {
            Ok(entries) => {
                logging::debug(
                    Domain::Panel,
                    "logs_refreshed",
                    obj(&[
                        ("count", v_num(entries.len() as f64)),
                        ("level", v_str(self.filter.as_query())),
                    ]),
                );
                self.entries = entries;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                logging::warn(Domain::Panel, "logs_refresh_failed", obj(&[("error", v_str(&e.to_string()))]));
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Poll forever, calling `render` after each attempt. The first poll
    /// happens immediately.
    pub async fn run<F>(&mut self, mut render: F)
    where
        F: FnMut(&Self),
    {
        let mut ticker = interval(self.poll_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let _ = self.refresh().await;
            render(self);
        }
    }
}
