//! Engine integration tests
//!
//! Drive whole duels through the public API with offline and scripted
//! backends, checking the state contract after every round.

use ai_duel::core::config::{DuelConfig, EngineConfig};
use ai_duel::core::error::DuelError;
use ai_duel::core::types::{Mode, Phase};
use ai_duel::duel::display::{resolve_action, Outcome};
use ai_duel::duel::engine::BattleEngine;
use ai_duel::duel::history::HistoryEntry;
use ai_duel::duel::records::RecordSource;
use ai_duel::llm::backend::ContentBackend;
use ai_duel::llm::context::{Prompt, PromptKind};
use ai_duel::llm::offline::OfflineBackend;
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Backend answering from fixed queues
struct ScriptedBackend {
    init: Mutex<Option<String>>,
    rounds: Mutex<VecDeque<String>>,
    summary: String,
}

impl ScriptedBackend {
    fn new(init: Option<String>, rounds: Vec<String>) -> Self {
        Self {
            init: Mutex::new(init),
            rounds: Mutex::new(rounds.into()),
            summary: "The fighters circle each other, both bloodied.".into(),
        }
    }
}

impl ContentBackend for ScriptedBackend {
    fn generate(&self, prompt: &Prompt, temperature: f32) -> String {
        match &prompt.kind {
            PromptKind::Init(_) => self
                .init
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| OfflineBackend::new().generate(prompt, temperature)),
            PromptKind::Round(_) => self.rounds.lock().unwrap().pop_front().unwrap_or_default(),
            PromptKind::Summary(_) => self.summary.clone(),
            PromptKind::Probe => "connected".into(),
        }
    }

    fn mode(&self) -> Mode {
        Mode::Live
    }
}

/// Backend that reports the same even exchange every round
struct SteadyBackend;

impl ContentBackend for SteadyBackend {
    fn generate(&self, prompt: &Prompt, temperature: f32) -> String {
        match &prompt.kind {
            PromptKind::Round(_) => {
                r#"{"status":{"player_hp":1000,"enemy_hp":1000},"phase":"battle"}"#.into()
            }
            _ => OfflineBackend::new().generate(prompt, temperature),
        }
    }

    fn mode(&self) -> Mode {
        Mode::Live
    }
}

fn scripted(init: Option<&str>, rounds: &[&str]) -> BattleEngine {
    let backend = ScriptedBackend::new(
        init.map(str::to_string),
        rounds.iter().map(|s| s.to_string()).collect(),
    );
    BattleEngine::new(Box::new(backend), EngineConfig::default())
}

#[test]
fn test_offline_duel_opening() {
    let mut engine = BattleEngine::from_config(&DuelConfig::offline());
    engine.initialize("A", "B").unwrap();

    let status = engine.status().unwrap();
    assert_eq!(status.player.name(), "A");
    assert_eq!(status.player.hp(), 1200);
    assert_eq!(status.player.max_hp(), 1200);
    assert_eq!(status.phase, Phase::Battle);
    assert_eq!(status.round, 0);
    assert_eq!(status.history_count, 1);
    assert!(!status.game_over);
    assert!(engine.opening().unwrap().contains("wasteland"));
}

#[test]
fn test_offline_three_rounds() {
    let mut engine = BattleEngine::from_config(&DuelConfig::offline());
    engine.initialize("A", "B").unwrap();

    engine.play_round("attack").unwrap();
    assert!(engine
        .status()
        .unwrap()
        .enemy_skills_used
        .contains(&"Tentacle Lash".to_string()));

    engine.play_round("attack").unwrap();
    engine.play_round("attack").unwrap();

    let status = engine.status().unwrap();
    assert_eq!(status.round, 3);
    assert_eq!(status.history_count, 4);
    assert_eq!(status.enemy_skills_used, vec!["Tentacle Lash".to_string()]);
}

#[test]
fn test_offline_duel_runs_to_a_result() {
    let mut engine = BattleEngine::from_config(&DuelConfig::offline());
    engine.initialize("A", "B").unwrap();
    while !engine.is_game_over() {
        let snapshot = engine.status().unwrap();
        let action = resolve_action("1", &snapshot.player).unwrap();
        engine.play_round(&action).unwrap();
    }

    let status = engine.status().unwrap();
    // both sides hit 0 in round 9 of the scripted offline duel
    assert_eq!(status.round, 9);
    assert_eq!(status.phase, Phase::Ending);
    assert_eq!(Outcome::from_snapshot(&status), Outcome::Draw);
    assert_eq!(
        status.enemy_skills_used,
        vec!["Tentacle Lash", "Oil Spray", "EMP Pulse"]
    );

    match engine.history().last().unwrap() {
        HistoryEntry::Round { action, .. } => assert!(action.starts_with("Use skill Iaido Slash")),
        other => panic!("expected a round entry, got {:?}", other),
    }
}

#[test]
fn test_crafted_knockout_ends_game() {
    let mut engine = scripted(
        None,
        &[r#"Sure! {"narrative": "A collapses.", "status": {"player_hp": 0, "enemy_hp": 900,
            "player_conc": 0, "enemy_conc": 40}, "phase": "battle"}"#],
    );
    engine.initialize("A", "B").unwrap();
    engine.play_round("attack").unwrap();

    let status = engine.status().unwrap();
    assert!(status.game_over);
    assert_eq!(status.phase, Phase::Ending);
    assert_eq!(Outcome::from_snapshot(&status), Outcome::EnemyWon);
}

#[test]
fn test_backend_init_is_validated() {
    let init = r#"{"player": {"name": "Rin", "hp": 5000, "skills": [{"name": "Cut"}]},
                   "enemy": {"max_hp": 900.4, "hp": 950, "conc": "70"},
                   "reason": "honor"}"#;
    let mut engine = scripted(Some(init), &[]);
    let record = engine.initialize("A", "B").unwrap();

    assert_eq!(record.source, RecordSource::Backend);
    assert_eq!(record.player.name(), "Rin");
    assert_eq!(record.player.max_hp(), 2000);
    assert_eq!(record.player.hp(), 2000);
    assert_eq!(record.player.skills()[0].effect, "Unknown effect");
    assert_eq!(record.enemy.name(), "B");
    assert_eq!(record.enemy.max_hp(), 900);
    assert_eq!(record.enemy.hp(), 900);
    assert_eq!(record.enemy.conc(), 70);
    assert_eq!(record.reason, "honor");
    assert_eq!(record.opening, "The battle begins!");
}

#[test]
fn test_init_with_downed_fighters_uses_side_defaults() {
    let init = r#"{"player": {"hp": 0, "max_hp": 1000}, "enemy": {"hp": -50}}"#;
    let mut engine = scripted(Some(init), &[]);
    let record = engine.initialize("A", "B").unwrap();

    assert_eq!(record.source, RecordSource::Backend);
    assert_eq!(record.player.hp(), 1000);
    assert_eq!(record.player.max_hp(), 1000);
    assert_eq!(record.enemy.hp(), 1200);
    assert_eq!(record.enemy.max_hp(), 1200);

    let status = engine.status().unwrap();
    assert_eq!(status.phase, Phase::Battle);
    assert!(!status.game_over);
    assert!(!engine.is_game_over());
}

#[test]
fn test_init_missing_enemy_uses_offline_seed() {
    let mut engine = scripted(Some(r#"{"player": {"name": "Rin"}}"#), &[]);
    let record = engine.initialize("A", "B").unwrap();
    assert_eq!(record.source, RecordSource::Fallback);
    assert_eq!(record.player.name(), "A");
    assert_eq!(record.enemy.max_hp(), 1500);
}

#[test]
fn test_phase_candidate_and_absorbing_ending() {
    let mut engine = scripted(
        None,
        &[
            r#"{"status": {"player_hp": 1000, "enemy_hp": 1000}, "phase": "CLIMAX"}"#,
            r#"{"status": {"player_hp": 1000, "enemy_hp": 1000}, "phase": "init"}"#,
            r#"{"status": {"player_hp": 1000, "enemy_hp": 1000}, "phase": "ending"}"#,
        ],
    );
    engine.initialize("A", "B").unwrap();

    assert_eq!(engine.play_round("a").unwrap().phase, Phase::Climax);
    assert_eq!(engine.play_round("b").unwrap().phase, Phase::Battle);
    assert_eq!(engine.play_round("c").unwrap().phase, Phase::Ending);
    assert!(engine.is_game_over());
}

#[test]
fn test_summary_refreshed_every_third_round() {
    let round = r#"{"status": {"player_hp": 1000, "enemy_hp": 1000}}"#;
    let mut engine = scripted(None, &[round; 6]);
    engine.initialize("A", "B").unwrap();

    engine.play_round("a").unwrap();
    engine.play_round("b").unwrap();
    assert_eq!(engine.summary(), Some("The battle begins..."));
    engine.play_round("c").unwrap();
    assert_eq!(
        engine.summary(),
        Some("The fighters circle each other, both bloodied.")
    );
}

#[test]
fn test_even_exchanges_stop_at_round_cap() {
    let mut engine = BattleEngine::new(Box::new(SteadyBackend), EngineConfig::default());
    engine.initialize("A", "B").unwrap();
    while !engine.is_game_over() {
        engine.play_round("attack").unwrap();
    }

    let status = engine.status().unwrap();
    assert_eq!(status.round, 20);
    assert!(status.game_over);
    assert_eq!(status.phase, Phase::Battle);
    assert_eq!(status.history_count, 21);
    assert_eq!(Outcome::from_snapshot(&status), Outcome::Draw);
}

#[test]
fn test_contract_errors_are_reported() {
    let mut engine = BattleEngine::from_config(&DuelConfig::offline());
    let err = engine.play_round("attack").unwrap_err();
    assert!(err.is_contract_violation());

    engine.initialize("A", "B").unwrap();
    let err = engine.initialize("A", "B").unwrap_err();
    assert!(matches!(err, DuelError::AlreadyInitialized));
    assert_eq!(engine.history().len(), 1);
}

// =========================================================================
//  PROPERTIES
// =========================================================================

fn number() -> impl Strategy<Value = String> {
    prop_oneof![
        (-5000i64..5000).prop_map(|n| n.to_string()),
        (-5000.0f64..5000.0).prop_map(|f| format!("{:.2}", f)),
        (0i64..3000).prop_map(|n| format!("\"{}\"", n)),
        Just("null".to_string()),
        Just("\"lots\"".to_string()),
    ]
}

fn phase() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("\"battle\"".to_string()),
        Just("\"Climax\"".to_string()),
        Just("\"ending\"".to_string()),
        Just("\"init\"".to_string()),
        Just("\"finale\"".to_string()),
        Just("7".to_string()),
    ]
}

fn round_record() -> impl Strategy<Value = String> {
    (number(), number(), number(), number(), phase(), "[a-zA-Z ]{0,12}").prop_map(
        |(php, ehp, pc, ec, phase, skill)| {
            format!(
                r#"{{"narrative": "n", "status": {{"player_hp": {}, "enemy_hp": {},
                    "player_conc": {}, "enemy_conc": {}}}, "phase": {}, "enemy_skill_used": "{}"}}"#,
                php, ehp, pc, ec, phase, skill
            )
        },
    )
}

/// Round replies ranging from well-formed to junk
fn round_reply() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => round_record(),
        2 => round_record().prop_map(|r| format!("Here you go:\n```json\n{}\n```", r)),
        1 => Just(r#"{"narrative": "no status"}"#.to_string()),
        1 => "\\PC{0,40}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_state_contract_holds(replies in prop::collection::vec(round_reply(), 1..25)) {
        let backend = ScriptedBackend::new(None, replies);
        let mut engine = BattleEngine::new(Box::new(backend), EngineConfig::default());

        engine.initialize("A", "B").unwrap();
        let mut expected_round = 0;
        while !engine.is_game_over() {
            let before = engine.status().unwrap();
            engine.play_round("attack").unwrap();
            expected_round += 1;

            let status = engine.status().unwrap();
            prop_assert_eq!(status.round, expected_round);
            prop_assert_eq!(status.history_count, before.history_count + 1);
            prop_assert_eq!(status.player.max_hp(), before.player.max_hp());
            for c in [&status.player, &status.enemy] {
                prop_assert!(c.hp() <= c.max_hp());
                prop_assert!(c.conc() <= 100);
            }
            if status.player.hp() == 0 || status.enemy.hp() == 0 {
                prop_assert!(status.game_over);
                prop_assert_eq!(status.phase, Phase::Ending);
            }
            prop_assert!(status.enemy_skills_used.iter().all(|s| !s.trim().is_empty()));
        }
        prop_assert!(engine.status().unwrap().round <= 20);
    }
}
