use anyhow::{anyhow, Result};
use url::Url;

/// Path of the live event stream relative to the API origin.
pub const FEED_PATH: &str = "/ws";

/// Derive the WebSocket URL of the event stream from an HTTP(S) API base.
///
/// `http` maps to `ws` and `https` to `wss`; trailing slashes are stripped
/// before [`FEED_PATH`] is appended. Any path already on the base is kept.
pub fn ws_url(api_base: &str) -> Result<String> {
    let base = api_base.trim();
    let parsed = Url::parse(base).map_err(|e| anyhow!("invalid api base {:?}: {}", base, e))?;
    let scheme = match parsed.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(anyhow!("unsupported api base scheme: {}", other)),
    };
    let rest = base
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(|| anyhow!("api base has no authority: {}", base))?;
    Ok(format!("{}://{}{}", scheme, rest.trim_end_matches('/'), FEED_PATH))
}
