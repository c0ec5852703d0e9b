//! Combatants and their skills
//!
//! A combatant is built once from a (possibly incomplete) backend draft and
//! afterwards only changes hp and conc through the state store, which
//! clamps every write.

use crate::core::types::CONC_MAX;
use crate::duel::records::{CombatantDraft, SkillDraft};
use serde::Serialize;

const UNKNOWN_SKILL: &str = "Unknown Skill";
const UNKNOWN_EFFECT: &str = "Unknown effect";

/// A named technique with a conc cost and a free-text effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub name: String,
    pub cost: u32,
    pub effect: String,
}

impl Skill {
    pub fn new(name: impl Into<String>, cost: u32, effect: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cost,
            effect: effect.into(),
        }
    }

    /// Fill in placeholders for whatever the backend left out
    pub fn from_draft(draft: SkillDraft) -> Self {
        Self {
            name: non_blank(draft.name).unwrap_or_else(|| UNKNOWN_SKILL.to_string()),
            cost: draft.cost.map(|c| c.clamp(0, u32::MAX as i64) as u32).unwrap_or(0),
            effect: non_blank(draft.effect).unwrap_or_else(|| UNKNOWN_EFFECT.to_string()),
        }
    }
}

/// One side of the duel
///
/// Fields are crate-visible so the state store can write them; everyone
/// else goes through the getters. `max_hp` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Combatant {
    pub(crate) name: String,
    pub(crate) hp: u32,
    pub(crate) max_hp: u32,
    pub(crate) conc: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) atk: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) spd: Option<u32>,
    pub(crate) skills: Vec<Skill>,
}

impl Combatant {
    /// Create a combatant at full health and concentration
    pub fn new(name: impl Into<String>, max_hp: u32, skills: Vec<Skill>) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            name: name.into(),
            hp: max_hp,
            max_hp,
            conc: CONC_MAX,
            atk: None,
            spd: None,
            skills,
        }
    }

    /// Attach offensive/speed stats
    pub fn with_stats(mut self, atk: u32, spd: u32) -> Self {
        self.atk = Some(atk);
        self.spd = Some(spd);
        self
    }

    /// Validate a backend draft
    ///
    /// Missing name falls back to `fallback_name`. Missing max_hp falls back
    /// to hp, then to `default_hp`; the result is clamped into
    /// `1..=hp_ceiling`. hp defaults to max_hp and is clamped into
    /// `1..=max_hp`, conc defaults to 100. Non-positive hp or max_hp count
    /// as missing.
    pub fn from_draft(
        draft: CombatantDraft,
        fallback_name: &str,
        default_hp: u32,
        hp_ceiling: u32,
    ) -> Self {
        let ceiling = hp_ceiling.max(1) as i64;
        // a fighter cannot start the duel already down
        let positive = |v: Option<i64>| v.filter(|&v| v > 0);
        let max_hp = positive(draft.max_hp)
            .or(positive(draft.hp))
            .unwrap_or(default_hp as i64)
            .clamp(1, ceiling) as u32;
        let hp = positive(draft.hp)
            .unwrap_or(max_hp as i64)
            .clamp(1, max_hp as i64) as u32;
        let conc = draft
            .conc
            .unwrap_or(CONC_MAX as i64)
            .clamp(0, CONC_MAX as i64) as u32;

        Self {
            name: non_blank(draft.name).unwrap_or_else(|| fallback_name.to_string()),
            hp,
            max_hp,
            conc,
            atk: draft.atk.map(|v| v.clamp(0, u32::MAX as i64) as u32),
            spd: draft.spd.map(|v| v.clamp(0, u32::MAX as i64) as u32),
            skills: draft
                .skills
                .unwrap_or_default()
                .into_iter()
                .map(Skill::from_draft)
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn conc(&self) -> u32 {
        self.conc
    }

    pub fn atk(&self) -> Option<u32> {
        self.atk
    }

    pub fn spd(&self) -> Option<u32> {
        self.spd
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    /// Out of hit points
    pub fn is_down(&self) -> bool {
        self.hp == 0
    }

    /// Look up a skill by 1-based menu number
    pub fn skill_by_number(&self, number: usize) -> Option<&Skill> {
        number.checked_sub(1).and_then(|i| self.skills.get(i))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
