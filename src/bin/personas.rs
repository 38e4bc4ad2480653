//! Manage bot personas from the terminal.
//!
//! Usage:
//!   personas <command> [args]
//!
//! Commands:
//!   list                                 - Personas, assignments and default
//!   show <user_id> [role...]             - Persona and instruction a user would get
//!   create <name>                        - New persona with an empty prompt
//!   edit <id> <name> <prompt>            - Replace a persona's name and prompt
//!   delete <id>                          - Remove a persona
//!   assign <user|role> <target> <id>     - Assign a persona
//!   unassign <user|role> <target>        - Remove an assignment
//!   default <id>                         - Set the default persona
//!   guidelines <text>                    - Replace the global guidelines

use anyhow::{anyhow, Result};
use bella_console::api::behaviors::{AssignTarget, Persona};
use bella_console::api::{ApiClient, BehaviorApi};
use bella_console::config::Config;
use bella_console::panels::BehaviorPanel;

fn print_usage() {
    eprintln!("Usage: personas <list|show|create|edit|delete|assign|unassign|default|guidelines> [args]");
}

fn print_config<A: BehaviorApi>(panel: &BehaviorPanel<A>) {
    let cfg = panel.config();
    println!("Personas:");
    for id in cfg.personas.keys() {
        let marker = if cfg.default_persona.as_deref() == Some(id.as_str()) { "*" } else { " " };
        println!(" {} {:<16} {}", marker, id, panel.persona_label(id));
    }
    if !cfg.assignments.users.is_empty() {
        println!("User assignments:");
        for (user, pid) in &cfg.assignments.users {
            println!("   {:<20} -> {}", user, panel.persona_label(pid));
        }
    }
    if !cfg.assignments.roles.is_empty() {
        println!("Role assignments:");
        for (role, pid) in &cfg.assignments.roles {
            println!("   {:<20} -> {}", role, panel.persona_label(pid));
        }
    }
    if !cfg.global_guidelines.is_empty() {
        println!("Global guidelines:\n{}", cfg.global_guidelines);
    }
}

fn target_kind(raw: &str) -> Result<AssignTarget> {
    AssignTarget::parse(raw).ok_or_else(|| anyhow!("expected 'user' or 'role', got '{}'", raw))
}

fn arg(args: &[String], idx: usize, name: &str) -> Result<String> {
    args.get(idx).cloned().ok_or_else(|| anyhow!("missing <{}>", name))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cfg = Config::from_env();
    let mut panel = BehaviorPanel::new(ApiClient::new(&cfg)?);
    panel.load().await?;

    match args[1].as_str() {
        "list" => {}
        "show" => {
            let user = arg(&args, 2, "user_id")?;
            let roles: Vec<&str> = args[3..].iter().map(String::as_str).collect();
            let persona = panel.config().resolve_persona(&user, &roles);
            println!("Persona: {}", persona.map(|p| panel.persona_label(p)).unwrap_or("(none)"));
            println!("{}", panel.config().resolve_instruction(&user, &roles));
            return Ok(());
        }
        "create" => {
            let name = args[2..].join(" ");
            match panel.create_persona(&name).await? {
                Some(id) => println!("Created {}", id),
                None => {
                    eprintln!("Persona name is empty");
                    std::process::exit(1);
                }
            }
        }
        "edit" => {
            let id = arg(&args, 2, "id")?;
            let persona = Persona {
                name: arg(&args, 3, "name")?,
                prompt: args[4..].join(" "),
            };
            panel.save_persona(&id, persona).await?;
        }
        "delete" => panel.delete_persona(&arg(&args, 2, "id")?).await?,
        "assign" => {
            let kind = target_kind(&arg(&args, 2, "user|role")?)?;
            panel
                .assign(kind, &arg(&args, 3, "target")?, &arg(&args, 4, "id")?)
                .await?;
        }
        "unassign" => {
            let kind = target_kind(&arg(&args, 2, "user|role")?)?;
            panel.unassign(kind, &arg(&args, 3, "target")?).await?;
        }
        "default" => panel.set_default(&arg(&args, 2, "id")?).await?,
        "guidelines" => panel.save_guidelines(&args[2..].join(" ")).await?,
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }

    print_config(&panel);
    Ok(())
}
