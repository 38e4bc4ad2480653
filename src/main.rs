//! Live console view of the Bella backend: streams `/ws` into the rolling
//! event feed and redraws on every entry until Ctrl-C.

use anyhow::Result;
use bella_console::config::Config;
use bella_console::feed::{EventBuffer, FeedView};
use bella_console::logging::{self, obj, ts_epoch_ms, v_num, v_str, Domain};
use bella_console::stats::{format_uptime, UptimeTracker};

fn render(buffer: &EventBuffer, uptime: &UptimeTracker) {
    println!();
    println!(
        "== Live Event Feed == [{}] uptime {} ({:.1}%)",
        uptime.status_label(),
        format_uptime(uptime.uptime_ms()),
        uptime.percentage()
    );
    for line in buffer.lines() {
        println!("  {}", line);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    logging::info(
        Domain::System,
        "startup",
        obj(&[
            ("url", v_str(&cfg.api_base)),
            ("channel_capacity", v_num(cfg.feed_channel_capacity as f64)),
        ]),
    );

    let mut view = FeedView::from_config(&cfg);
    view.mount()?;
    if let Some(url) = view.handle().and_then(|h| h.url()) {
        println!("Connecting to {}", url);
    }

    let mut uptime = UptimeTracker::new(ts_epoch_ms());
    loop {
        tokio::select! {
            update = view.next_update() => {
                let Some(buffer) = update else {
                    logging::warn(Domain::Feed, "stream_ended", obj(&[]));
                    break;
                };
                uptime.tick(ts_epoch_ms());
                render(buffer, &uptime);
            }
            _ = tokio::signal::ctrl_c() => {
                logging::info(Domain::System, "shutdown", obj(&[("msg", v_str("ctrl-c"))]));
                break;
            }
        }
    }

    view.unmount();
    uptime.tick(ts_epoch_ms());
    logging::info(
        Domain::System,
        "stopped",
        obj(&[
            ("entries", v_num(view.buffer().len() as f64)),
            ("uptime", v_str(&format_uptime(uptime.uptime_ms()))),
        ]),
    );
    Ok(())
}
