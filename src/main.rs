//! AI Duel - Entry Point
//!
//! Interactive terminal front end. Loads configuration, picks a backend,
//! seeds the duel and then reads one action per round until the duel ends.

use ai_duel::core::config::DuelConfig;
use ai_duel::core::error::{DuelError, Result};
use ai_duel::duel::display::{
    closing_screen, resolve_action, skill_menu, status_panel, used_skills_menu,
};
use ai_duel::duel::engine::BattleEngine;
use ai_duel::llm::backend::LiveBackend;
use ai_duel::llm::client::LlmClient;

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Turn-based duel narrated by a language model
#[derive(Parser, Debug)]
#[command(name = "ai-duel")]
#[command(about = "Fight a duel narrated by a language model, or offline")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Never contact the live backend
    #[arg(long)]
    offline: bool,

    /// Player character name
    #[arg(long, default_value = "Wandering Samurai")]
    player: String,

    /// Enemy character name
    #[arg(long, default_value = "Mechanical Octopus")]
    enemy: String,

    /// Only test the connection to the live backend and exit
    #[arg(long)]
    probe: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ai_duel=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if args.probe {
        return run_probe(&config);
    }

    let mut engine = BattleEngine::from_config(&config);
    if let Some(reason) = engine.backend_diagnostic() {
        println!("Live backend unavailable ({}); playing offline.", reason);
    }

    println!("\n=== AI DUEL ({} mode) ===", engine.mode());
    let seed = engine.initialize(&args.player, &args.enemy)?;
    println!();
    println!("{} vs {}", seed.player.name(), seed.enemy.name());
    println!("Why they fight: {}", seed.reason);
    println!("{}", seed.opening);
    println!();
    print_help();

    while !engine.is_game_over() {
        let snapshot = engine.status()?;
        println!();
        print!("{}", status_panel(&snapshot));
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "quit" | "exit" | "q" => break,
            "status" | "stats" | "s" => {
                print!("{}", status_panel(&snapshot));
                println!("Summary: {}", engine.summary().unwrap_or_default());
                continue;
            }
            "skills" | "skill" | "sk" => {
                print!("{}", skill_menu("Your skills", snapshot.player.skills()));
                continue;
            }
            "enemy_skills" | "enemy" | "es" => {
                print!("{}", skill_menu("Enemy skills", snapshot.enemy.skills()));
                continue;
            }
            "enemy_used" | "eu" => {
                print!("{}", used_skills_menu(&snapshot));
                continue;
            }
            "help" | "h" => {
                print_help();
                continue;
            }
            _ => {}
        }

        let action = match resolve_action(input, &snapshot.player) {
            Ok(action) => action,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let record = engine.play_round(&action)?;
        println!();
        println!("{}", record.narrative);
        if !record.dialogue.is_empty() {
            println!("\"{}\"", record.dialogue);
        }
        if !record.damage_dealt.is_empty() {
            println!("{}", record.damage_dealt);
        }
        if !record.enemy_skill_used.is_empty() {
            println!("Enemy used: {}", record.enemy_skill_used);
        }
    }

    let snapshot = engine.status()?;
    println!();
    print!("{}", closing_screen(&snapshot, engine.summary().unwrap_or_default()));
    Ok(())
}

/// Config file (if any), the --offline flag, then environment credentials
fn load_config(args: &Args) -> Result<DuelConfig> {
    let mut config = match &args.config {
        Some(path) => DuelConfig::load(path)?,
        None => DuelConfig::new(),
    };
    config.apply_env();
    if args.offline {
        config.backend.force_offline = true;
    }
    config.validate()?;
    Ok(config)
}

/// Single probe call against the configured endpoint
fn run_probe(config: &DuelConfig) -> Result<()> {
    let key = config
        .backend
        .api_key
        .as_deref()
        .ok_or_else(|| DuelError::BackendUnavailable("LLM_API_KEY not set".into()))?;
    let client = LlmClient::new(key, &config.backend)?;
    LiveBackend::new(client, &config.backend).probe()?;
    println!(
        "Connection OK: {} ({})",
        config.backend.api_url, config.backend.model
    );
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  <text>              - Describe your action");
    println!("  <number>            - Use that skill from your menu");
    println!("  skills / sk         - Show your skills");
    println!("  enemy_skills / es   - Show the enemy's skills");
    println!("  enemy_used / eu     - Show skills the enemy has used");
    println!("  status / s          - Show status and battle summary");
    println!("  help / h            - Show this help");
    println!("  quit / q            - Leave the duel");
}
