//! The battle engine
//!
//! Drives one duel: prompts the backend, repairs and validates what comes
//! back, writes it through the state store and keeps the summary fresh.
//! Backend, parse and validation problems are absorbed here by substituting
//! offline content; only out-of-order calls surface as errors.

use crate::core::config::{DuelConfig, EngineConfig};
use crate::core::error::{DuelError, Result};
use crate::core::types::{Mode, Phase, Round, Side};
use crate::duel::history::HistoryEntry;
use crate::duel::records::{InitDefaults, InitDraft, InitRecord, RoundDraft, RoundRecord};
use crate::duel::state::{BattleState, BattleStateStore, StatusSnapshot};
use crate::llm::backend::{select_backend, ContentBackend};
use crate::llm::context::{FighterView, InitContext, Prompt, RoundContext, SummaryContext};
use crate::llm::offline::OfflineBackend;
use crate::llm::repair;

/// Orchestrates a single duel
///
/// Every operation blocks until the backend answers. A live backend drives
/// its requests on a private tokio runtime, so async callers must move the
/// engine onto a blocking thread with `tokio::task::spawn_blocking`.
pub struct BattleEngine {
    backend: Box<dyn ContentBackend>,
    fallback: OfflineBackend,
    config: EngineConfig,
    store: Option<BattleStateStore>,
    diagnostic: Option<String>,
}

impl BattleEngine {
    /// Engine over an already chosen backend
    pub fn new(backend: Box<dyn ContentBackend>, config: EngineConfig) -> Self {
        Self {
            backend,
            fallback: OfflineBackend::new(),
            config,
            store: None,
            diagnostic: None,
        }
    }

    /// Select the backend from `config` and build the engine
    ///
    /// A failed live setup is not an error: the engine runs offline and the
    /// reason is kept in `backend_diagnostic`.
    pub fn from_config(config: &DuelConfig) -> Self {
        let (backend, diagnostic) = select_backend(&config.backend);
        let mut engine = Self::new(backend, config.engine.clone());
        engine.diagnostic = diagnostic.map(|e| e.to_string());
        engine
    }

    // =========================================================================
    //  OPERATIONS
    // =========================================================================

    /// Seed the duel between `player_name` and `enemy_name`
    pub fn initialize(&mut self, player_name: &str, enemy_name: &str) -> Result<InitRecord> {
        if self.store.is_some() {
            return Err(DuelError::AlreadyInitialized);
        }

        let ctx = InitContext {
            player_name: player_name.to_string(),
            enemy_name: enemy_name.to_string(),
        };
        let prompt = Prompt::init(ctx.clone());
        let reply = self
            .backend
            .generate(&prompt, self.config.init_temperature);

        let defaults = InitDefaults {
            player_name,
            enemy_name,
            player_hp: self.config.default_player_hp,
            enemy_hp: self.config.default_enemy_hp,
            hp_ceiling: self.config.hp_ceiling,
        };
        let parsed = repair::parse_as::<InitDraft>(&reply).and_then(|d| d.validate(defaults));
        let record = match parsed {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Unusable init response ({}), using offline seed", e);
                self.fallback.seed(&ctx)
            }
        };

        let mode = self.backend.mode();
        self.store = Some(BattleStateStore::new(
            record.clone(),
            mode,
            self.config.climax_hp_threshold,
        ));

        tracing::info!(
            "Duel initialized ({}): {} ({} HP) vs {} ({} HP)",
            mode,
            record.player.name(),
            record.player.hp(),
            record.enemy.name(),
            record.enemy.hp()
        );

        Ok(record)
    }

    /// Play one round with the player's `action`
    pub fn play_round(&mut self, action: &str) -> Result<RoundRecord> {
        let store = self.store.as_mut().ok_or(DuelError::NotInitialized)?;

        let round = store.advance_round();
        let ctx = round_context(
            store.state(),
            round,
            action,
            self.config.climax_hp_threshold,
        );
        let prompt = Prompt::round(ctx.clone());
        let reply = self
            .backend
            .generate(&prompt, self.config.round_temperature);

        let (mut record, candidate) =
            match parse_round(&reply, self.config.hp_ceiling, store.state().phase()) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(
                        "Unusable response for round {} ({}), using offline round",
                        round,
                        e
                    );
                    let record = self.fallback.round(&ctx);
                    let candidate = Some(record.phase.name().to_string());
                    (record, candidate)
                }
            };

        let status = record.status;
        record.status.player_hp = store.set_hp(Side::Player, status.player_hp as i64);
        record.status.enemy_hp = store.set_hp(Side::Enemy, status.enemy_hp as i64);
        record.status.player_conc = store.set_conc(Side::Player, status.player_conc as i64);
        record.status.enemy_conc = store.set_conc(Side::Enemy, status.enemy_conc as i64);
        record.phase = store.set_phase(candidate.as_deref());

        store.record_enemy_skill(&record.enemy_skill_used);
        store.append_history(HistoryEntry::round(round, action, record.clone()));

        tracing::debug!(
            "Round {} done: {}/{} HP, phase {}",
            round,
            record.status.player_hp,
            record.status.enemy_hp,
            record.phase
        );

        self.summarize();
        Ok(record)
    }

    /// Refresh the rolling summary every `summary_interval` rounds
    fn summarize(&mut self) {
        let store = match self.store.as_mut() {
            Some(store) => store,
            None => return,
        };
        let state = store.state();
        let history = state.history();
        // an interval of 0 refreshes every round
        let interval = self.config.summary_interval.max(1);
        if state.round() % interval != 0 || history.len() < 2 {
            return;
        }

        let window = history.len().saturating_sub(self.config.summary_window);
        let ctx = SummaryContext {
            round: state.round(),
            player: fighter_view(state, Side::Player),
            enemy: fighter_view(state, Side::Enemy),
            recent: history[window..].iter().map(HistoryEntry::to_prompt_line).collect(),
        };

        let reply = self
            .backend
            .generate(&Prompt::summary(ctx), self.config.summary_temperature);
        let text = reply.trim();
        if text.chars().count() > self.config.summary_min_chars {
            tracing::debug!("Summary refreshed ({} chars)", text.len());
            store.replace_summary(text.to_string());
        } else {
            tracing::debug!("Summary reply too short, keeping the previous one");
        }
    }

    /// Snapshot of the current state
    pub fn status(&self) -> Result<StatusSnapshot> {
        self.store
            .as_ref()
            .map(|store| store.snapshot(self.config.max_rounds))
            .ok_or(DuelError::NotInitialized)
    }

    // =========================================================================
    //  ACCESSORS
    // =========================================================================

    /// True once the duel has a result or hit the round cap
    pub fn is_game_over(&self) -> bool {
        self.store
            .as_ref()
            .is_some_and(|store| store.state().is_game_over(self.config.max_rounds))
    }

    pub fn state(&self) -> Option<&BattleState> {
        self.store.as_ref().map(BattleStateStore::state)
    }

    pub fn summary(&self) -> Option<&str> {
        self.state().map(BattleState::summary)
    }

    pub fn battle_reason(&self) -> Option<&str> {
        self.state().map(BattleState::battle_reason)
    }

    pub fn opening(&self) -> Option<&str> {
        self.state().map(BattleState::opening)
    }

    pub fn phase(&self) -> Option<Phase> {
        self.state().map(BattleState::phase)
    }

    pub fn round(&self) -> Round {
        self.state().map_or(0, BattleState::round)
    }

    /// Copy of the battle log
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.state()
            .map(|state| state.history().to_vec())
            .unwrap_or_default()
    }

    pub fn mode(&self) -> Mode {
        self.backend.mode()
    }

    /// Why the live backend was not used, if it was requested and failed
    pub fn backend_diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Repair and validate a round reply, keeping the raw phase candidate
fn parse_round(
    reply: &str,
    hp_ceiling: u32,
    provisional: Phase,
) -> Result<(RoundRecord, Option<String>)> {
    let draft = repair::parse_as::<RoundDraft>(reply)?;
    let candidate = draft.phase.clone();
    let record = draft.validate(hp_ceiling, provisional)?;
    Ok((record, candidate))
}

fn fighter_view(state: &BattleState, side: Side) -> FighterView {
    let c = state.combatant(side);
    FighterView {
        name: c.name().to_string(),
        hp: c.hp(),
        conc: c.conc(),
    }
}

fn round_context(state: &BattleState, round: Round, action: &str, threshold: u32) -> RoundContext {
    RoundContext {
        round,
        phase: state.phase(),
        summary: state.summary().to_string(),
        player: fighter_view(state, Side::Player),
        enemy: fighter_view(state, Side::Enemy),
        enemy_skills: state.enemy().skills().to_vec(),
        action: action.to_string(),
        climax_threshold: threshold,
    }
}
