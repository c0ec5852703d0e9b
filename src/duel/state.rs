//! Battle state and the store that guards it
//!
//! `BattleStateStore` is the only writer of `BattleState`. Every hp/conc
//! write is clamped, history only grows through `append_history`, the
//! round only moves through `advance_round`, and the phase only moves
//! through `set_phase`.

use crate::core::types::{Mode, Phase, Round, Side, CONC_MAX};
use crate::duel::combatant::Combatant;
use crate::duel::history::HistoryEntry;
use crate::duel::records::InitRecord;
use indexmap::IndexSet;
use serde::Serialize;

/// Summary text before the first refresh
pub const INITIAL_SUMMARY: &str = "The battle begins...";

/// The aggregate root of one duel
#[derive(Debug, Clone)]
pub struct BattleState {
    player: Combatant,
    enemy: Combatant,
    battle_reason: String,
    opening: String,
    phase: Phase,
    round: Round,
    summary: String,
    enemy_skills_used: IndexSet<String>,
    history: Vec<HistoryEntry>,
    mode: Mode,
}

impl BattleState {
    pub fn player(&self) -> &Combatant {
        &self.player
    }

    pub fn enemy(&self) -> &Combatant {
        &self.enemy
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    pub fn battle_reason(&self) -> &str {
        &self.battle_reason
    }

    pub fn opening(&self) -> &str {
        &self.opening
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn enemy_skills_used(&self) -> impl Iterator<Item = &str> {
        self.enemy_skills_used.iter().map(String::as_str)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Terminal condition: someone is down, the phase ended, or the round cap hit
    pub fn is_game_over(&self, max_rounds: Round) -> bool {
        self.player.is_down()
            || self.enemy.is_down()
            || self.phase == Phase::Ending
            || self.round >= max_rounds
    }
}

/// Read-only copy of the state for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub round: Round,
    pub phase: Phase,
    pub player: Combatant,
    pub enemy: Combatant,
    pub game_over: bool,
    pub history_count: usize,
    pub mode: Mode,
    pub enemy_skills_used: Vec<String>,
}

/// Owner and sole writer of a `BattleState`
#[derive(Debug, Clone)]
pub struct BattleStateStore {
    state: BattleState,
    climax_threshold: u32,
}

impl BattleStateStore {
    /// Seed a new battle: phase battle, round 0, the init entry in history
    ///
    /// Both sides start with at least 1 hp.
    pub fn new(seed: InitRecord, mode: Mode, climax_threshold: u32) -> Self {
        let mut player = seed.player.clone();
        let mut enemy = seed.enemy.clone();
        for c in [&mut player, &mut enemy] {
            c.max_hp = c.max_hp.max(1);
            c.hp = c.hp.clamp(1, c.max_hp);
            c.conc = c.conc.min(CONC_MAX);
        }

        let state = BattleState {
            player,
            enemy,
            battle_reason: seed.reason.clone(),
            opening: seed.opening.clone(),
            phase: Phase::Battle,
            round: 0,
            summary: INITIAL_SUMMARY.to_string(),
            enemy_skills_used: IndexSet::new(),
            history: vec![HistoryEntry::init(seed)],
            mode,
        };

        Self {
            state,
            climax_threshold,
        }
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    fn combatant_mut(&mut self, side: Side) -> &mut Combatant {
        match side {
            Side::Player => &mut self.state.player,
            Side::Enemy => &mut self.state.enemy,
        }
    }

    /// Write hp, clamped into `0..=max_hp`. Returns the stored value.
    pub fn set_hp(&mut self, side: Side, value: i64) -> u32 {
        let c = self.combatant_mut(side);
        c.hp = value.clamp(0, c.max_hp as i64) as u32;
        c.hp
    }

    /// Write conc, clamped into `0..=100`. Returns the stored value.
    pub fn set_conc(&mut self, side: Side, value: i64) -> u32 {
        let c = self.combatant_mut(side);
        c.conc = value.clamp(0, CONC_MAX as i64) as u32;
        c.conc
    }

    /// Start the next round. Returns the new round number.
    pub fn advance_round(&mut self) -> Round {
        self.state.round += 1;
        self.state.round
    }

    /// Apply the phase policy and return the resulting phase
    ///
    /// - `ending` is absorbing.
    /// - A recognized candidate (`battle`, `climax`, `ending`) is used as-is;
    ///   an absent or unrecognized one (including `init`) is replaced by the
    ///   phase derived from hp.
    /// - If anyone is at 0 hp the phase is `ending` whatever the candidate.
    pub fn set_phase(&mut self, candidate: Option<&str>) -> Phase {
        let derived = Phase::from_hp(
            self.state.player.hp,
            self.state.enemy.hp,
            self.climax_threshold,
        );

        let next = if self.state.phase == Phase::Ending || derived == Phase::Ending {
            Phase::Ending
        } else {
            candidate
                .and_then(Phase::parse)
                .filter(|p| *p != Phase::Init)
                .unwrap_or(derived)
        };

        if next != self.state.phase {
            tracing::debug!("Phase {} -> {}", self.state.phase, next);
        }
        self.state.phase = next;
        next
    }

    /// Append to the history; the only way it grows
    pub fn append_history(&mut self, entry: HistoryEntry) {
        self.state.history.push(entry);
    }

    /// Record an enemy skill name. Blank names and repeats are ignored.
    ///
    /// Returns true when the name was new.
    pub fn record_enemy_skill(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.state.enemy_skills_used.insert(name.to_string())
    }

    /// Replace the rolling summary
    pub fn replace_summary(&mut self, summary: String) {
        self.state.summary = summary;
    }

    /// Deep copy of everything a presentation layer may show
    pub fn snapshot(&self, max_rounds: Round) -> StatusSnapshot {
        StatusSnapshot {
            round: self.state.round,
            phase: self.state.phase,
            player: self.state.player.clone(),
            enemy: self.state.enemy.clone(),
            game_over: self.state.is_game_over(max_rounds),
            history_count: self.state.history.len(),
            mode: self.state.mode,
            enemy_skills_used: self.state.enemy_skills_used.iter().cloned().collect(),
        }
    }
}
