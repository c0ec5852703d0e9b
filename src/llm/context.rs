//! Prompt construction for the content backend
//!
//! A `Prompt` is the rendered text sent to a live model plus a typed
//! `PromptKind` describing what is being asked. The offline generator reads
//! the kind instead of pattern-matching the text.

use crate::core::types::{Phase, Round};
use crate::duel::combatant::Skill;

/// A request for content
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
}

/// What a prompt asks for, with the context needed to answer it offline
#[derive(Debug, Clone, PartialEq)]
pub enum PromptKind {
    /// Seed two combatants
    Init(InitContext),
    /// Narrate one round
    Round(RoundContext),
    /// Condense recent history
    Summary(SummaryContext),
    /// Connectivity check
    Probe,
}

/// Names requested by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitContext {
    pub player_name: String,
    pub enemy_name: String,
}

/// Name and vitals of one side, as shown to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FighterView {
    pub name: String,
    pub hp: u32,
    pub conc: u32,
}

/// Battle situation at the start of a round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundContext {
    /// The round being played (already incremented)
    pub round: Round,
    pub phase: Phase,
    pub summary: String,
    pub player: FighterView,
    pub enemy: FighterView,
    pub enemy_skills: Vec<Skill>,
    /// The player's action, verbatim
    pub action: String,
    /// hp at or below which a fighter is in climax territory
    pub climax_threshold: u32,
}

/// Input for a summary refresh
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryContext {
    pub round: Round,
    pub player: FighterView,
    pub enemy: FighterView,
    /// Recent history entries, one JSON line each
    pub recent: Vec<String>,
}

impl Prompt {
    /// Ask for the opening setup of a duel
    pub fn init(ctx: InitContext) -> Self {
        let text = INIT_PROMPT_TEMPLATE
            .replace("{player}", &ctx.player_name)
            .replace("{enemy}", &ctx.enemy_name);
        Self {
            kind: PromptKind::Init(ctx),
            text,
        }
    }

    /// Ask for the outcome of one round
    pub fn round(ctx: RoundContext) -> Self {
        let mut s = String::new();

        s.push_str("Generate this round of the battle from the context below.\n");
        s.push_str(&format!("Battle summary: {}\n", ctx.summary));
        s.push_str(&format!("Current round: {}\n", ctx.round));
        s.push_str(&format!("Current phase: {}\n", ctx.phase));
        s.push_str(&format!(
            "Player: {} (HP: {}, CONC: {})\n",
            ctx.player.name, ctx.player.hp, ctx.player.conc
        ));
        s.push_str(&format!(
            "Enemy: {} (HP: {}, CONC: {})\n",
            ctx.enemy.name, ctx.enemy.hp, ctx.enemy.conc
        ));
        s.push_str(&format!("Player action: {}\n", ctx.action));

        s.push_str("\nEnemy skills:\n");
        if ctx.enemy_skills.is_empty() {
            s.push_str("  (none known)\n");
        }
        for skill in &ctx.enemy_skills {
            s.push_str(&format!("  - {}: {}\n", skill.name, skill.effect));
        }

        s.push_str(ROUND_RULES);

        Self {
            kind: PromptKind::Round(ctx),
            text: s,
        }
    }

    /// Ask for a short summary of recent history
    pub fn summary(ctx: SummaryContext) -> Self {
        let text = format!(
            "Summarize the following battle history in under 100 words:\n{}",
            ctx.recent.join("\n")
        );
        Self {
            kind: PromptKind::Summary(ctx),
            text,
        }
    }

    /// Minimal request used to check the endpoint answers at all
    pub fn probe() -> Self {
        Self {
            kind: PromptKind::Probe,
            text: "Connection test. Reply with 'connected'.".to_string(),
        }
    }

    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self.kind {
            PromptKind::Init(_) => "init",
            PromptKind::Round(_) => "round",
            PromptKind::Summary(_) => "summary",
            PromptKind::Probe => "probe",
        }
    }
}

/// Init prompt; `{player}` and `{enemy}` are substituted
const INIT_PROMPT_TEMPLATE: &str = r#"Create the opening setup of a battle between {player} and {enemy}, including:
1. Stats for both sides (HP 800-2000, CONC 100, ATK 1-5 stars, SPD 1-10)
2. Four skills each (one of them must restore CONC)
3. A creative reason for the fight
4. A short opening scene

Use exactly this JSON format. No extra text, no markdown:
{
    "player": {
        "name": "character name",
        "hp": number,
        "max_hp": number,
        "conc": number,
        "atk": number,
        "spd": number,
        "skills": [
            {"name": "skill 1", "cost": cost, "effect": "effect description"},
            {"name": "skill 2", "cost": cost, "effect": "effect description"},
            {"name": "skill 3", "cost": cost, "effect": "effect description"},
            {"name": "skill 4", "cost": cost, "effect": "effect description"}
        ]
    },
    "enemy": {
        "name": "character name",
        "hp": number,
        "max_hp": number,
        "conc": number,
        "atk": number,
        "spd": number,
        "skills": [
            {"name": "skill 1", "cost": cost, "effect": "effect description"},
            {"name": "skill 2", "cost": cost, "effect": "effect description"},
            {"name": "skill 3", "cost": cost, "effect": "effect description"},
            {"name": "skill 4", "cost": cost, "effect": "effect description"}
        ]
    },
    "reason": "why they fight",
    "opening": "opening scene"
}
"#;

/// Rules and output schema appended to every round prompt
const ROUND_RULES: &str = r#"
Requirements:
1. The enemy MUST counter-attack or use a skill. Never describe a one-sided exchange.
2. The narrative must show both sides acting and how the enemy responds.
3. Compute damage and status changes sensibly from both actions.
4. The enemy picks a skill that fits the current situation.

Reply with this JSON only. No extra text, no markdown:
{
    "narrative": "vivid description including the player's action and the enemy's counter",
    "status": {
        "player_hp": player HP after the round (integer 0-2000),
        "enemy_hp": enemy HP after the round (integer 0-2000),
        "player_conc": player CONC after the round (integer 0-100),
        "enemy_conc": enemy CONC after the round (integer 0-100)
    },
    "phase": "battle/climax/ending",
    "dialogue": "the key line spoken this round",
    "damage_dealt": "damage dealt by both sides",
    "player_skill_used": "name of the player's skill",
    "enemy_skill_used": "name of the enemy's skill"
}
"#;
