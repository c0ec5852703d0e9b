//! Deterministic offline content
//!
//! Used when no live endpoint is configured, when the endpoint is
//! unreachable, and as the substitute for any response the engine cannot
//! use. Output depends only on the prompt kind and its context.

use crate::core::types::{Mode, Phase, Round, CONC_MAX};
use crate::duel::combatant::{Combatant, Skill};
use crate::duel::records::{InitRecord, RecordSource, RoundRecord, RoundStatus};
use crate::llm::backend::ContentBackend;
use crate::llm::context::{InitContext, Prompt, PromptKind, RoundContext, SummaryContext};
use serde_json::json;

/// Seed hp of the offline player
pub const OFFLINE_PLAYER_HP: u32 = 1200;
/// Seed hp of the offline enemy
pub const OFFLINE_ENEMY_HP: u32 = 1500;

const PLAYER_CONC_DRAIN: u32 = 20;
const ENEMY_CONC_DRAIN: u32 = 25;

/// Reply to a probe prompt
pub const PROBE_REPLY: &str = "connected";

/// Stage of a scripted offline battle, by round number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Rounds 1-3
    Skirmish,
    /// Rounds 4-6
    Escalation,
    /// Rounds 7-9
    Climax,
    /// Round 10 onwards
    Denouement,
}

impl Stage {
    pub fn for_round(round: Round) -> Self {
        match round {
            0..=3 => Stage::Skirmish,
            4..=6 => Stage::Escalation,
            7..=9 => Stage::Climax,
            _ => Stage::Denouement,
        }
    }

    /// Enemy skill used during this stage
    pub fn enemy_skill(&self) -> &'static str {
        match self {
            Stage::Skirmish | Stage::Denouement => "Tentacle Lash",
            Stage::Escalation => "Oil Spray",
            Stage::Climax => "EMP Pulse",
        }
    }

    /// (damage dealt by the player, damage dealt by the enemy)
    pub fn damage(&self) -> (u32, u32) {
        match self {
            Stage::Skirmish => (120, 100),
            Stage::Escalation => (180, 150),
            Stage::Climax => (250, 200),
            Stage::Denouement => (100, 80),
        }
    }
}

/// The offline content generator
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

impl OfflineBackend {
    pub fn new() -> Self {
        Self
    }

    /// Fixed seed scenario using the requested names
    pub fn seed(&self, ctx: &InitContext) -> InitRecord {
        let player = Combatant::new(
            ctx.player_name.clone(),
            OFFLINE_PLAYER_HP,
            vec![
                Skill::new("Iaido Slash", 20, "Deals 200-300 damage"),
                Skill::new("Mind's Eye", 15, "Next attack is guaranteed to hit"),
                Skill::new("Sword Aura Guard", 25, "Gains a 200-point shield"),
                Skill::new("Meditation", 0, "Restores 50 CONC"),
            ],
        )
        .with_stats(3, 7);

        let enemy = Combatant::new(
            ctx.enemy_name.clone(),
            OFFLINE_ENEMY_HP,
            vec![
                Skill::new("Tentacle Lash", 20, "Deals 180-280 damage"),
                Skill::new("Oil Spray", 25, "Lowers target SPD by 3"),
                Skill::new("EMP Pulse", 30, "Silences target for 1 round"),
                Skill::new("Energy Recycle", 0, "Restores 40 CONC"),
            ],
        )
        .with_stats(4, 5);

        InitRecord {
            player,
            enemy,
            reason: "Both sides want the last antimatter battery to keep their people alive"
                .to_string(),
            opening: "Smoke hangs over the wasteland as the blade and the steel tentacles \
                      face each other..."
                .to_string(),
            source: RecordSource::Fallback,
        }
    }

    /// Scripted outcome of one round
    pub fn round(&self, ctx: &RoundContext) -> RoundRecord {
        let stage = Stage::for_round(ctx.round);
        let (player_damage, enemy_damage) = stage.damage();
        let enemy_skill = stage.enemy_skill();
        let player = &ctx.player.name;
        let enemy = &ctx.enemy.name;

        let (narrative, dialogue) = match stage {
            Stage::Skirmish => (
                format!(
                    "Round {}: {} attacks and {} strikes back at once!",
                    ctx.round, player, enemy
                ),
                format!("{}: Taste this! {}!", enemy, enemy_skill),
            ),
            Stage::Escalation => (
                format!(
                    "Round {}: The fight heats up! Both sides unleash powerful skills!",
                    ctx.round
                ),
                format!("{}: Threat level rising, deploying {}!", enemy, enemy_skill),
            ),
            Stage::Climax => (
                format!(
                    "Round {}: The decisive moment! Both sides bring out their trump cards!",
                    ctx.round
                ),
                format!("{}: {} released, you cannot move!", enemy, enemy_skill),
            ),
            Stage::Denouement => (
                format!(
                    "Round {}: The battle nears its end and both sides are exhausted...",
                    ctx.round
                ),
                "Both fighters pant, searching for the chance at a final blow...".to_string(),
            ),
        };

        let status = RoundStatus {
            player_hp: ctx.player.hp.saturating_sub(enemy_damage),
            enemy_hp: ctx.enemy.hp.saturating_sub(player_damage),
            player_conc: ctx.player.conc.min(CONC_MAX).saturating_sub(PLAYER_CONC_DRAIN),
            enemy_conc: ctx.enemy.conc.min(CONC_MAX).saturating_sub(ENEMY_CONC_DRAIN),
        };

        RoundRecord {
            narrative,
            phase: Phase::from_hp(status.player_hp, status.enemy_hp, ctx.climax_threshold),
            status,
            dialogue,
            damage_dealt: format!(
                "The player dealt {} damage, the enemy dealt {} damage",
                player_damage, enemy_damage
            ),
            player_skill_used: "Improvised Strike".to_string(),
            enemy_skill_used: enemy_skill.to_string(),
            source: RecordSource::Fallback,
        }
    }

    /// Canned summary of the current situation
    pub fn summary(&self, ctx: &SummaryContext) -> String {
        format!(
            "After {} rounds {} ({} HP) and {} ({} HP) are still locked in combat, \
             trading blows with neither side willing to yield.",
            ctx.round, ctx.player.name, ctx.player.hp, ctx.enemy.name, ctx.enemy.hp
        )
    }

    fn render(&self, prompt: &Prompt) -> String {
        let value = match &prompt.kind {
            PromptKind::Init(ctx) => init_json(&self.seed(ctx)),
            PromptKind::Round(ctx) => round_json(&self.round(ctx)),
            PromptKind::Summary(ctx) => return self.summary(ctx),
            PromptKind::Probe => return PROBE_REPLY.to_string(),
        };
        serde_json::to_string_pretty(&value).unwrap_or_default()
    }
}

impl ContentBackend for OfflineBackend {
    fn generate(&self, prompt: &Prompt, _temperature: f32) -> String {
        self.render(prompt)
    }

    fn mode(&self) -> Mode {
        Mode::Offline
    }
}

// Wire shapes, matching what a live model is asked to produce

fn init_json(record: &InitRecord) -> serde_json::Value {
    json!({
        "player": &record.player,
        "enemy": &record.enemy,
        "reason": &record.reason,
        "opening": &record.opening,
    })
}

fn round_json(record: &RoundRecord) -> serde_json::Value {
    json!({
        "narrative": &record.narrative,
        "status": &record.status,
        "phase": record.phase,
        "dialogue": &record.dialogue,
        "damage_dealt": &record.damage_dealt,
        "player_skill_used": &record.player_skill_used,
        "enemy_skill_used": &record.enemy_skill_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::context::FighterView;
    use crate::llm::repair;

    fn round_ctx(round: Round, player_hp: u32, enemy_hp: u32) -> RoundContext {
        RoundContext {
            round,
            phase: Phase::Battle,
            summary: String::new(),
            player: FighterView {
                name: "A".into(),
                hp: player_hp,
                conc: 100,
            },
            enemy: FighterView {
                name: "B".into(),
                hp: enemy_hp,
                conc: 10,
            },
            enemy_skills: vec![],
            action: "attack".into(),
            climax_threshold: 300,
        }
    }

    #[test]
    fn test_stage_buckets() {
        assert_eq!(Stage::for_round(1), Stage::Skirmish);
        assert_eq!(Stage::for_round(3), Stage::Skirmish);
        assert_eq!(Stage::for_round(4), Stage::Escalation);
        assert_eq!(Stage::for_round(9), Stage::Climax);
        assert_eq!(Stage::for_round(10), Stage::Denouement);
        assert_eq!(Stage::for_round(42), Stage::Denouement);
        assert_eq!(Stage::Climax.enemy_skill(), "EMP Pulse");
        assert_eq!(Stage::Escalation.damage(), (180, 150));
    }

    #[test]
    fn test_seed_uses_requested_names() {
        let seed = OfflineBackend.seed(&InitContext {
            player_name: "A".into(),
            enemy_name: "B".into(),
        });
        assert_eq!(seed.player.name(), "A");
        assert_eq!(seed.player.hp(), 1200);
        assert_eq!(seed.player.max_hp(), 1200);
        assert_eq!(seed.enemy.name(), "B");
        assert_eq!(seed.enemy.max_hp(), 1500);
        assert_eq!(seed.player.skills().len(), 4);
        assert!(seed.enemy.skills().iter().any(|s| s.effect.contains("CONC")));
    }

    #[test]
    fn test_round_damage_and_conc() {
        let record = OfflineBackend.round(&round_ctx(1, 1200, 1500));
        assert_eq!(record.status.player_hp, 1100);
        assert_eq!(record.status.enemy_hp, 1380);
        assert_eq!(record.status.player_conc, 80);
        assert_eq!(record.status.enemy_conc, 0);
        assert_eq!(record.enemy_skill_used, "Tentacle Lash");
        assert_eq!(record.phase, Phase::Battle);
    }

    #[test]
    fn test_round_floors_hp_and_ends() {
        let record = OfflineBackend.round(&round_ctx(7, 150, 900));
        assert_eq!(record.status.player_hp, 0);
        assert_eq!(record.phase, Phase::Ending);

        let record = OfflineBackend.round(&round_ctx(2, 350, 900));
        assert_eq!(record.phase, Phase::Climax);
    }

    #[test]
    fn test_generated_text_is_repairable() {
        let backend = OfflineBackend::new();
        let text = backend.generate(&Prompt::round(round_ctx(5, 1000, 1000)), 0.7);
        let record = repair::parse(&text).unwrap();
        assert_eq!(record["enemy_skill_used"], "Oil Spray");
        assert_eq!(record["status"]["player_hp"], 850);
        assert_eq!(record["phase"], "battle");

        let text = backend.generate(
            &Prompt::init(InitContext {
                player_name: "A".into(),
                enemy_name: "B".into(),
            }),
            0.8,
        );
        let record = repair::parse(&text).unwrap();
        assert_eq!(record["player"]["max_hp"], 1200);
        assert_eq!(record["enemy"]["skills"][0]["name"], "Tentacle Lash");
    }

    #[test]
    fn test_probe_and_mode() {
        assert_eq!(OfflineBackend.generate(&Prompt::probe(), 0.0), PROBE_REPLY);
        assert_eq!(OfflineBackend.mode(), Mode::Offline);
    }
}
