//! Battle history entries
//!
//! The history is the audit trail summaries are built from. Entries are
//! never changed once appended.

use crate::core::types::Round;
use crate::duel::records::{InitRecord, RoundRecord};
use serde::Serialize;

/// One entry in the battle log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HistoryEntry {
    /// Seed data and opening narrative
    Init {
        seed: InitRecord,
        narrative: String,
        timestamp: String,
    },
    /// A completed round
    Round {
        round: Round,
        action: String,
        player_skill: String,
        enemy_skill: String,
        payload: RoundRecord,
        timestamp: String,
    },
}

impl HistoryEntry {
    pub fn init(seed: InitRecord) -> Self {
        Self::Init {
            narrative: seed.opening.clone(),
            seed,
            timestamp: timestamp(),
        }
    }

    pub fn round(round: Round, action: &str, payload: RoundRecord) -> Self {
        Self::Round {
            round,
            action: action.to_string(),
            player_skill: payload.player_skill_used.clone(),
            enemy_skill: payload.enemy_skill_used.clone(),
            payload,
            timestamp: timestamp(),
        }
    }

    /// Round number, 0 for the init entry
    pub fn round_number(&self) -> Round {
        match self {
            HistoryEntry::Init { .. } => 0,
            HistoryEntry::Round { round, .. } => *round,
        }
    }

    /// The narrative text of this entry
    pub fn narrative(&self) -> &str {
        match self {
            HistoryEntry::Init { narrative, .. } => narrative,
            HistoryEntry::Round { payload, .. } => &payload.narrative,
        }
    }

    /// Compact single-line JSON, used when feeding entries back into prompts
    pub fn to_prompt_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.narrative().to_string())
    }
}

/// Wall-clock time of day, HH:MM:SS
fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Phase;
    use crate::duel::combatant::Combatant;
    use crate::duel::records::{RecordSource, RoundStatus};

    fn sample_round() -> RoundRecord {
        RoundRecord {
            narrative: "Steel meets steel.".into(),
            status: RoundStatus {
                player_hp: 900,
                enemy_hp: 800,
                player_conc: 80,
                enemy_conc: 75,
            },
            phase: Phase::Battle,
            dialogue: String::new(),
            damage_dealt: String::new(),
            player_skill_used: "Iaido Slash".into(),
            enemy_skill_used: "Tentacle Lash".into(),
            source: RecordSource::Backend,
        }
    }

    #[test]
    fn test_round_entry_copies_skills() {
        let entry = HistoryEntry::round(2, "attack", sample_round());
        assert_eq!(entry.round_number(), 2);
        assert_eq!(entry.narrative(), "Steel meets steel.");
        match entry {
            HistoryEntry::Round {
                player_skill,
                enemy_skill,
                action,
                timestamp,
                ..
            } => {
                assert_eq!(player_skill, "Iaido Slash");
                assert_eq!(enemy_skill, "Tentacle Lash");
                assert_eq!(action, "attack");
                assert_eq!(timestamp.len(), 8);
            }
            _ => panic!("expected round entry"),
        }
    }

    #[test]
    fn test_init_entry_uses_opening() {
        let seed = InitRecord {
            player: Combatant::new("A", 1000, vec![]),
            enemy: Combatant::new("B", 1000, vec![]),
            reason: "a grudge".into(),
            opening: "Dawn breaks.".into(),
            source: RecordSource::Backend,
        };
        let entry = HistoryEntry::init(seed);
        assert_eq!(entry.round_number(), 0);
        assert_eq!(entry.narrative(), "Dawn breaks.");
    }

    #[test]
    fn test_prompt_line_is_tagged_json() {
        let line = HistoryEntry::round(1, "attack", sample_round()).to_prompt_line();
        assert!(line.contains("\"type\":\"round\""));
        assert!(!line.contains('\n'));
    }
}
