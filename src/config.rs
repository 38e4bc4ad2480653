/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub discord_client_id: Option<String>,
    pub discord_client_secret: Option<String>,
    pub discord_redirect_uri: Option<String>,
    pub oauth_state_secret: Option<String>,
    pub bot_client_id: String,
    pub feed_channel_capacity: usize,
    pub logs_limit: u32,
    pub logs_poll_secs: u64,
    pub http_timeout_secs: u64,
}

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            discord_client_id: None,
            discord_client_secret: None,
            discord_redirect_uri: None,
            oauth_state_secret: None,
            bot_client_id: "YOUR_BOT_ID".to_string(),
            feed_channel_capacity: 256,
            logs_limit: 50,
            logs_poll_secs: 10,
            http_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            api_base: env_any(&["API_BASE_URL", "VITE_API_BASE_URL"]).unwrap_or(d.api_base),
            discord_client_id: env_any(&["DISCORD_CLIENT_ID", "VITE_DISCORD_CLIENT_ID"]),
            discord_client_secret: env_any(&["DISCORD_CLIENT_SECRET", "VITE_DISCORD_CLIENT_SECRET"]),
            discord_redirect_uri: env_any(&["DISCORD_REDIRECT_URI", "VITE_DISCORD_REDIRECT_URI"]),
            oauth_state_secret: std::env::var("OAUTH_STATE_SECRET").ok(),
            bot_client_id: std::env::var("BOT_CLIENT_ID").unwrap_or(d.bot_client_id),
            feed_channel_capacity: std::env::var("FEED_CHANNEL_CAP").ok().and_then(|v| v.parse().ok()).unwrap_or(d.feed_channel_capacity),
            logs_limit: std::env::var("LOGS_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(d.logs_limit),
            logs_poll_secs: std::env::var("LOGS_POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.logs_poll_secs),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.http_timeout_secs),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }
}

/// First non-empty value among `keys`.
fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.trim().is_empty())
}
