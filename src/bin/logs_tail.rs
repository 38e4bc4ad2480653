//! Follow the backend's activity log.
//!
//! Usage:
//!   logs_tail [--level=<ALL|INFO|WARN|ERROR>] [--limit=<n>] [--once]
//!
//! Polls `/api/logs` every LOGS_POLL_SECS seconds and prints the newest
//! entries. `--once` prints a single page and exits.

use anyhow::Result;
use bella_console::api::logs::{LevelFilter, LogEntry};
use bella_console::api::{ApiClient, LogsApi};
use bella_console::config::Config;
use bella_console::panels::LogsPanel;

fn print_entry(entry: &LogEntry) {
    println!(
        "{} [{:<5}] {:<12} {}",
        entry.local_time(),
        entry.level().as_str(),
        entry.kind,
        entry.message
    );
    if let Some(details) = entry.details_text() {
        for line in details.lines() {
            println!("    {}", line);
        }
    }
}

fn print_page<A: LogsApi>(panel: &LogsPanel<A>) {
    if let Some(err) = panel.last_error() {
        eprintln!("Failed to fetch logs: {}", err);
    }
    if panel.entries().is_empty() {
        println!("No logs found.");
        return;
    }
    println!("--- {} entries ({}) ---", panel.entries().len(), panel.filter().as_query());
    for entry in panel.entries() {
        print_entry(entry);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut cfg = Config::from_env();
    let mut filter = LevelFilter::All;
    let mut once = false;

    for arg in &args[1..] {
        if let Some(v) = arg.strip_prefix("--level=") {
            filter = LevelFilter::parse(v);
        } else if let Some(v) = arg.strip_prefix("--limit=") {
            cfg.logs_limit = v.parse().unwrap_or(cfg.logs_limit);
        } else if arg == "--once" {
            once = true;
        } else {
            eprintln!("Usage: logs_tail [--level=ALL|INFO|WARN|ERROR] [--limit=N] [--once]");
            std::process::exit(1);
        }
    }

    let mut panel = LogsPanel::from_config(ApiClient::new(&cfg)?, &cfg).with_filter(filter);
    if once {
        let result = panel.refresh().await;
        print_page(&panel);
        return result;
    }

    tokio::select! {
        _ = panel.run(|p| print_page(p)) => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    Ok(())
}
