//! Text projections of a battle for terminal front ends
//!
//! Everything here reads a snapshot or a combatant and returns a string;
//! nothing touches engine state.

use crate::core::error::{DuelError, Result};
use crate::duel::combatant::{Combatant, Skill};
use crate::duel::state::StatusSnapshot;
use std::fmt;

/// Final result of a duel, as seen from a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    PlayerWon,
    EnemyWon,
    /// Both down, or the round cap hit with nobody down
    Draw,
    /// Still running
    Undecided,
}

impl Outcome {
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        match (snapshot.player.is_down(), snapshot.enemy.is_down()) {
            (true, true) => Outcome::Draw,
            (false, true) => Outcome::PlayerWon,
            (true, false) => Outcome::EnemyWon,
            (false, false) if snapshot.game_over => Outcome::Draw,
            (false, false) => Outcome::Undecided,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Outcome::PlayerWon => "Victory! The enemy has fallen.",
            Outcome::EnemyWon => "Defeat... you have fallen.",
            Outcome::Draw => "The duel ends in a draw.",
            Outcome::Undecided => "The duel continues.",
        };
        f.write_str(text)
    }
}

/// Numbered skill list, 1-based
pub fn skill_menu(title: &str, skills: &[Skill]) -> String {
    if skills.is_empty() {
        return format!("{}: no skills known\n", title);
    }

    let mut s = format!("{}:\n", title);
    for (i, skill) in skills.iter().enumerate() {
        s.push_str(&format!(
            "  {}. {} - {} (cost: {} CONC)\n",
            i + 1,
            skill.name,
            skill.effect,
            skill.cost
        ));
    }
    s
}

/// Enemy skills seen so far, in first-use order
pub fn used_skills_menu(snapshot: &StatusSnapshot) -> String {
    if snapshot.enemy_skills_used.is_empty() {
        return "The enemy has not used any skills yet\n".to_string();
    }

    let mut s = String::from("Enemy skills used:\n");
    for (i, name) in snapshot.enemy_skills_used.iter().enumerate() {
        s.push_str(&format!("  {}. {}\n", i + 1, name));
    }
    s
}

/// Multi-line status block
pub fn status_panel(snapshot: &StatusSnapshot) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "=== Round {} | phase: {} | mode: {} ===\n",
        snapshot.round, snapshot.phase, snapshot.mode
    ));
    s.push_str(&fighter_line("Player", &snapshot.player));
    s.push_str(&fighter_line("Enemy ", &snapshot.enemy));
    s.push_str(&format!("History entries: {}\n", snapshot.history_count));
    if snapshot.game_over {
        s.push_str(&format!("{}\n", Outcome::from_snapshot(snapshot)));
    }
    s
}

/// Closing screen: final status, enemy skills seen and the last summary
pub fn closing_screen(snapshot: &StatusSnapshot, summary: &str) -> String {
    let mut s = status_panel(snapshot);
    s.push_str(&used_skills_menu(snapshot));
    s.push_str(&format!("Summary: {}\n", summary));
    s.push_str(&format!("Goodbye! The duel lasted {} rounds.\n", snapshot.round));
    s
}

fn fighter_line(label: &str, c: &Combatant) -> String {
    let mut line = format!(
        "{}: {} HP {}/{} CONC {}",
        label,
        c.name(),
        c.hp(),
        c.max_hp(),
        c.conc()
    );
    if let (Some(atk), Some(spd)) = (c.atk(), c.spd()) {
        line.push_str(&format!(" ATK {} SPD {}", atk, spd));
    }
    line.push('\n');
    line
}

/// Turn player input into the action text sent to the engine
///
/// A bare number picks a skill from the player's menu; anything else is
/// passed through trimmed.
pub fn resolve_action(input: &str, player: &Combatant) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DuelError::InvalidAction("empty action".into()));
    }

    match input.parse::<usize>() {
        Ok(number) => player
            .skill_by_number(number)
            .map(|skill| format!("Use skill {}: {}", skill.name, skill.effect))
            .ok_or_else(|| {
                DuelError::InvalidAction(format!(
                    "no skill number {} (choose 1-{})",
                    number,
                    player.skills().len()
                ))
            }),
        Err(_) => Ok(input.to_string()),
    }
}
