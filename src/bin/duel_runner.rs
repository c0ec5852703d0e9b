//! Headless Duel Runner
//!
//! Plays a whole duel with a fixed list of actions and prints a JSON report.

use ai_duel::core::config::DuelConfig;
use ai_duel::core::error::Result;
use ai_duel::duel::display::{resolve_action, Outcome};
use ai_duel::duel::engine::BattleEngine;
use ai_duel::duel::records::RoundRecord;
use ai_duel::duel::state::StatusSnapshot;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Headless Duel Runner - scripted duels for testing prompts and configs
#[derive(Parser, Debug)]
#[command(name = "duel_runner")]
#[command(about = "Run a scripted duel and output a JSON report")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the live backend if configured (default is offline)
    #[arg(long)]
    live: bool,

    #[arg(long, default_value = "Wandering Samurai")]
    player: String,

    #[arg(long, default_value = "Mechanical Octopus")]
    enemy: String,

    /// Actions played in order, cycling until the duel ends
    #[arg(long, value_delimiter = ',', default_value = "attack")]
    actions: Vec<String>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct DuelReport {
    outcome: String,
    rounds: u32,
    fallback_rounds: usize,
    backend_diagnostic: Option<String>,
    summary: String,
    final_status: StatusSnapshot,
    log: Vec<RoundRecord>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ai_duel=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args).and_then(|report| render_report(&report, &args.format)) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<DuelReport> {
    let mut config = match &args.config {
        Some(path) => DuelConfig::load(path)?,
        None => DuelConfig::new(),
    };
    config.apply_env();
    config.backend.force_offline = !args.live;
    config.validate()?;

    let mut engine = BattleEngine::from_config(&config);
    engine.initialize(&args.player, &args.enemy)?;

    let mut log = Vec::new();
    let mut script = args.actions.iter().cycle();
    while !engine.is_game_over() {
        let Some(raw) = script.next() else { break };
        let snapshot = engine.status()?;
        let action = resolve_action(raw, &snapshot.player)?;
        log.push(engine.play_round(&action)?);
    }

    let final_status = engine.status()?;
    Ok(DuelReport {
        outcome: format!("{:?}", Outcome::from_snapshot(&final_status)),
        rounds: final_status.round,
        fallback_rounds: log.iter().filter(|r| r.is_fallback()).count(),
        backend_diagnostic: engine.backend_diagnostic().map(str::to_string),
        summary: engine.summary().unwrap_or_default().to_string(),
        final_status,
        log,
    })
}

fn render_report(report: &DuelReport, format: &str) -> Result<String> {
    match format {
        "text" => Ok(format!(
            "Duel Result\n\
             ===========\n\
             Outcome: {}\n\
             Rounds: {}\n\
             Fallback rounds: {}\n\
             {}: {} HP / {}: {} HP\n\
             Summary: {}",
            report.outcome,
            report.rounds,
            report.fallback_rounds,
            report.final_status.player.name(),
            report.final_status.player.hp(),
            report.final_status.enemy.name(),
            report.final_status.enemy.hp(),
            report.summary
        )),
        other => {
            if other != "json" {
                eprintln!("Unknown format '{}', defaulting to json", other);
            }
            Ok(serde_json::to_string_pretty(report)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_args(format: &str) -> Args {
        Args::parse_from(["duel_runner", "--format", format])
    }

    #[test]
    fn test_json_report() {
        let args = offline_args("json");
        let report = run(&args).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&render_report(&report, &args.format).unwrap()).unwrap();
        assert_eq!(json["outcome"], "Draw");
        assert_eq!(json["rounds"], 9);
        assert_eq!(json["log"].as_array().map(Vec::len), Some(9));
    }

    #[test]
    fn test_text_report() {
        let args = offline_args("text");
        let report = run(&args).unwrap();
        let text = render_report(&report, &args.format).unwrap();
        assert!(text.starts_with("Duel Result\n===========\n"));
        assert!(text.contains("Rounds: 9"));
    }
}
