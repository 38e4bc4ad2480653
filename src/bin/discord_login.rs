//! Discord sign-in from the terminal.
//!
//! Usage:
//!   discord_login url                 - Print the consent URL with a signed state
//!   discord_login callback <url>      - Finish sign-in from the redirect URL
//!   discord_login invite              - Print the bot invite link
//!
//! `url` and `callback` run in separate processes, so OAUTH_STATE_SECRET
//! must be set for the state issued by one to verify in the other.

use std::time::Duration;

use anyhow::{anyhow, Result};
use bella_console::auth::{authorize_url, invite_url, DiscordAuth, OAuthSettings, Session, StateSigner};
use bella_console::config::Config;
use reqwest::Client;

fn print_usage() {
    eprintln!("Usage: discord_login <url|callback <redirect-url>|invite>");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cfg = Config::from_env();
    if args[1] == "invite" {
        println!("{}", invite_url(&cfg.bot_client_id));
        return Ok(());
    }

    let settings = OAuthSettings::from_config(&cfg)?;
    if cfg.oauth_state_secret.is_none() {
        eprintln!("warning: OAUTH_STATE_SECRET is not set; states will not verify across runs");
    }
    let signer = StateSigner::new(cfg.oauth_state_secret.as_deref());

    match args[1].as_str() {
        "url" => {
            let state = signer.issue()?;
            println!("{}", authorize_url(&settings, &state)?);
        }
        "callback" => {
            let callback = args.get(2).ok_or_else(|| anyhow!("missing <redirect-url>"))?;
            let http = Client::builder()
                .timeout(Duration::from_secs(cfg.http_timeout_secs))
                .build()?;
            let auth = DiscordAuth::new(http, settings, &cfg.api_base);
            let user = auth.complete_login(callback, &signer).await?;

            let mut session = Session::default();
            session.login(user);
            if let Some(user) = session.user() {
                println!("Signed in as {}", user.username);
                println!("Avatar: {}", user.avatar);
            }
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }
    Ok(())
}
