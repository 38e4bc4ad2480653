//! Discord OAuth login for the dashboard.
//!
//! Flow: [`authorize_url`] sends the operator to Discord with a signed
//! `state`; Discord redirects back with `?code=..&state=..`;
//! [`DiscordAuth::complete_login`] checks the state, trades the code for a
//! token and loads the Discord profile.

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use rand::RngCore;
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use url::Url;

use crate::api::{join_url, read_json};
use crate::config::Config;
use crate::logging::{self, obj, v_str, Domain};

type HmacSha256 = Hmac<Sha256>;

pub const DISCORD_AUTHORIZE_URL: &str = "https://discord.com/api/oauth2/authorize";
pub const DISCORD_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
pub const DISCORD_USER_URL: &str = "https://discord.com/api/users/@me";
pub const OAUTH_SCOPE: &str = "identify email";
pub const DEFAULT_AVATAR: &str =
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=400&h=400&fit=crop";

#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

impl OAuthSettings {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client_id = cfg
            .discord_client_id
            .clone()
            .ok_or_else(|| anyhow!("Discord client ID is not configured (DISCORD_CLIENT_ID)"))?;
        let redirect_uri = cfg
            .discord_redirect_uri
            .clone()
            .ok_or_else(|| anyhow!("Discord redirect URI is not configured (DISCORD_REDIRECT_URI)"))?;
        Ok(Self {
            client_id,
            client_secret: cfg.discord_client_secret.clone(),
            redirect_uri,
        })
    }
}

// =============================================================================
// CSRF state
// =============================================================================

/// Issues and checks `state` values of the form `<nonce>.<hmac>` (hex).
pub struct StateSigner {
    key: Vec<u8>,
}

impl StateSigner {
    /// Keyed by `secret`, or by a random per-process key when none is set.
    pub fn new(secret: Option<&str>) -> Self {
        let key = match secret {
            Some(s) if !s.is_empty() => s.as_bytes().to_vec(),
            _ => {
                let mut key = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut key);
                key
            }
        };
        Self { key }
    }

    pub fn issue(&self) -> Result<String> {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        let nonce = hex::encode(nonce);
        let tag = hex::encode(self.mac(&nonce)?.finalize().into_bytes());
        Ok(format!("{}.{}", nonce, tag))
    }

    /// Constant-time check of a returned `state`.
    pub fn verify(&self, state: &str) -> bool {
        let Some((nonce, tag)) = state.split_once('.') else {
            return false;
        };
        let Ok(tag) = hex::decode(tag) else {
            return false;
        };
        match self.mac(nonce) {
            Ok(mac) => mac.verify_slice(&tag).is_ok(),
            Err(_) => false,
        }
    }

    fn mac(&self, nonce: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| anyhow!("HMAC error: {}", e))?;
        mac.update(nonce.as_bytes());
        Ok(mac)
    }
}

// =============================================================================
// Redirects
// =============================================================================

/// Discord consent page URL.
pub fn authorize_url(settings: &OAuthSettings, state: &str) -> Result<String> {
    let mut url = Url::parse(DISCORD_AUTHORIZE_URL)?;
    url.query_pairs_mut()
        .append_pair("client_id", &settings.client_id)
        .append_pair("redirect_uri", &settings.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", OAUTH_SCOPE)
        .append_pair("state", state);
    Ok(url.into())
}

/// Bot invite link for the "Invite Bella" action.
pub fn invite_url(bot_client_id: &str) -> String {
    format!(
        "https://discord.com/api/oauth2/authorize?client_id={}&permissions=8&scope=bot",
        bot_client_id
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code { code: String, state: Option<String> },
    /// Discord reported an error (usually the operator cancelled).
    Denied(String),
    MissingCode,
}

/// Read the query of the redirect back from Discord.
pub fn parse_callback(callback: &str) -> Result<CallbackOutcome> {
    let url = Url::parse(callback).map_err(|e| anyhow!("invalid callback url: {}", e))?;
    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match &*key {
            "error" => return Ok(CallbackOutcome::Denied(value.into_owned())),
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok(match code {
        Some(code) => CallbackOutcome::Code { code, state },
        None => CallbackOutcome::MissingCode,
    })
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Who is signed in, as the header shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardUser {
    pub username: String,
    pub avatar: String,
}

impl DashboardUser {
    pub fn from_discord(user: &DiscordUser) -> Self {
        let tag = match user.discriminator.as_deref() {
            Some(d) if d != "0" && !d.is_empty() => d,
            _ => user.username.as_str(),
        };
        let avatar = match &user.avatar {
            Some(hash) => format!("https://cdn.discordapp.com/avatars/{}/{}.png", user.id, hash),
            None => DEFAULT_AVATAR.to_string(),
        };
        Self {
            username: format!("{}#{}", user.username, tag),
            avatar,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<DashboardUser>,
}

impl Session {
    pub fn login(&mut self, user: DashboardUser) {
        logging::info(Domain::Auth, "login", obj(&[("user", v_str(&user.username))]));
        self.user = Some(user);
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            logging::info(Domain::Auth, "logout", obj(&[("user", v_str(&user.username))]));
        }
    }

    pub fn user(&self) -> Option<&DashboardUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

// =============================================================================
// Token exchange
// =============================================================================

pub struct DiscordAuth {
    http: Client,
    settings: OAuthSettings,
    api_base: String,
    token_url: String,
    user_url: String,
}

impl DiscordAuth {
    pub fn new(http: Client, settings: OAuthSettings, api_base: &str) -> Self {
        Self {
            http,
            settings,
            api_base: api_base.to_string(),
            token_url: DISCORD_TOKEN_URL.to_string(),
            user_url: DISCORD_USER_URL.to_string(),
        }
    }

    pub fn settings(&self) -> &OAuthSettings {
        &self.settings
    }

    /// Trade an authorization code for a token. With a client secret the
    /// exchange goes straight to Discord; otherwise through the backend's
    /// `/auth/discord/token`, which holds the secret. Codes are single-use,
    /// so this is never retried.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let (url, resp) = match &self.settings.client_secret {
            Some(secret) => {
                let form = [
                    ("client_id", self.settings.client_id.as_str()),
                    ("client_secret", secret.as_str()),
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", self.settings.redirect_uri.as_str()),
                ];
                let resp = self.http.post(&self.token_url).form(&form).send().await?;
                (self.token_url.clone(), resp)
            }
            None => {
                let url = join_url(&self.api_base, "/auth/discord/token");
                let resp = self.http.post(&url).form(&[("code", code)]).send().await?;
                (url, resp)
            }
        };
        let token: TokenResponse = read_json(&url, resp)
            .await
            .map_err(|e| anyhow!("Failed to exchange code for token: {}", e))?;
        logging::info(
            Domain::Auth,
            "token_exchange",
            obj(&[("url", v_str(&url)), ("scope", v_str(token.scope.as_deref().unwrap_or("")))]),
        );
        Ok(token)
    }

    pub async fn fetch_user(&self, access_token: &str) -> Result<DiscordUser> {
        let resp = self
            .http
            .get(&self.user_url)
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(&self.user_url, resp)
            .await
            .map_err(|e| anyhow!("Failed to fetch user data: {}", e))
    }

    /// Finish the redirect: verify `state`, exchange the code, load the user.
    pub async fn complete_login(&self, callback: &str, signer: &StateSigner) -> Result<DashboardUser> {
        let (code, state) = match parse_callback(callback)? {
            CallbackOutcome::Code { code, state } => (code, state),
            CallbackOutcome::Denied(reason) => {
                logging::warn(Domain::Auth, "denied", obj(&[("msg", v_str(&reason))]));
                return Err(anyhow!("Authentication cancelled or failed"));
            }
            CallbackOutcome::MissingCode => return Err(anyhow!("No authorization code received")),
        };
        if !state.as_deref().map(|s| signer.verify(s)).unwrap_or(false) {
            logging::warn(Domain::Auth, "state_mismatch", obj(&[]));
            return Err(anyhow!("OAuth state did not verify"));
        }
        let token = self.exchange_code(&code).await?;
        let user = self.fetch_user(&token.access_token).await?;
        Ok(DashboardUser::from_discord(&user))
    }
}
