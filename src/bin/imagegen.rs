//! Image generation through the backend.
//!
//! Usage:
//!   imagegen models                         - Available models and the current one
//!   imagegen use <model>                    - Switch the backend's model
//!   imagegen gen <prompt...> [--size=<preset>] [--enhance]
//!
//! Size presets: 512x512, 1024x1024 (default), 16:9, 9:16.

use anyhow::{anyhow, Result};
use bella_console::api::images::{preset, PRESETS};
use bella_console::api::ApiClient;
use bella_console::config::Config;
use bella_console::panels::ImagePanel;

fn print_usage() {
    eprintln!("Usage: imagegen <models|use <model>|gen <prompt> [--size=<preset>] [--enhance]>");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cfg = Config::from_env();
    let mut panel = ImagePanel::new(ApiClient::new(&cfg)?);
    if let Err(e) = panel.load_models().await {
        eprintln!("Could not load models, using defaults: {}", e);
    }

    match args[1].as_str() {
        "models" => {
            for model in panel.models() {
                let marker = if model == panel.selected_model() { "*" } else { " " };
                println!(" {} {}", marker, model);
            }
        }
        "use" => {
            let model = args.get(2).ok_or_else(|| anyhow!("missing <model>"))?;
            panel.select_model(model).await?;
            println!("Model set to {}", model);
        }
        "gen" => {
            let mut words = Vec::new();
            for a in &args[2..] {
                if let Some(v) = a.strip_prefix("--size=") {
                    let res = preset(v).ok_or_else(|| {
                        let labels: Vec<&str> = PRESETS.iter().map(|p| p.label).collect();
                        anyhow!("unknown size '{}', expected one of {}", v, labels.join(", "))
                    })?;
                    panel.set_resolution(res);
                } else if a == "--enhance" {
                    panel.set_enhance(true);
                } else {
                    words.push(a.as_str());
                }
            }
            let res = panel.resolution();
            println!(
                "Generating with {} at {}x{}...",
                panel.selected_model(),
                res.width,
                res.height
            );
            let image = panel.generate(&words.join(" ")).await?;
            println!("{}", image.image_url);
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }
    Ok(())
}
