use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, TimeZone};
use serde::Deserialize;
use serde_json::Value;

use super::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Anything that is not `ERROR` or `WARN` is shown as info.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "ERROR" => LogLevel::Error,
            "WARN" => LogLevel::Warn,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// `level` query parameter of `/api/logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Only(LogLevel),
}

impl LevelFilter {
    pub fn as_query(&self) -> &'static str {
        match self {
            LevelFilter::All => "ALL",
            LevelFilter::Only(level) => level.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "ALL" | "" => LevelFilter::All,
            other => LevelFilter::Only(LogLevel::parse(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "_id")]
    pub id: String,
    /// Epoch seconds.
    pub timestamp: f64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub details: Value,
}

impl LogEntry {
    pub fn level(&self) -> LogLevel {
        LogLevel::parse(&self.level)
    }

    /// Local wall-clock time of the entry.
    pub fn local_time(&self) -> String {
        let millis = (self.timestamp * 1000.0) as i64;
        Local
            .timestamp_millis_opt(millis)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.timestamp.to_string())
    }

    /// Details worth showing: a non-empty object or any other non-null value.
    pub fn details_text(&self) -> Option<String> {
        match &self.details {
            Value::Null => None,
            Value::Object(map) if map.is_empty() => None,
            other => serde_json::to_string_pretty(other).ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LogsResponse {
    #[serde(default)]
    logs: Option<Vec<LogEntry>>,
}

pub fn logs_path(limit: u32, filter: LevelFilter) -> String {
    format!("/api/logs?limit={}&level={}", limit, filter.as_query())
}

#[async_trait]
pub trait LogsApi {
    /// Newest first, at most `limit` entries.
    async fn fetch_logs(&self, limit: u32, filter: LevelFilter) -> Result<Vec<LogEntry>>;
}

#[async_trait]
impl LogsApi for ApiClient {
    async fn fetch_logs(&self, limit: u32, filter: LevelFilter) -> Result<Vec<LogEntry>> {
        let resp: LogsResponse = self.get_json(&logs_path(limit, filter)).await?;
        Ok(resp.logs.unwrap_or_default())
    }
}
