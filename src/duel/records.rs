//! Structured records exchanged with the content backend
//!
//! Two layers per schema:
//! - **Drafts** mirror the wire schema with every field optional and
//!   lenient about types (a number may arrive as a float or a string).
//!   Deserializing a draft from any JSON object never fails.
//! - **Records** are the validated, clamped values the engine works with.
//!   Validation happens exactly once, in `validate`.

use crate::core::error::{DuelError, Result};
use crate::core::types::{Phase, CONC_MAX};
use crate::duel::combatant::Combatant;
use serde::{Deserialize, Serialize};

// =========================================================================
//  DRAFTS (backend -> engine, untrusted)
// =========================================================================

/// Skill as reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SkillDraft {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub cost: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub effect: Option<String>,
}

/// Combatant as reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CombatantDraft {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub hp: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub max_hp: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub conc: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub atk: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub spd: Option<i64>,
    #[serde(default, deserialize_with = "lenient::skills")]
    pub skills: Option<Vec<SkillDraft>>,
}

/// Init response: `{player, enemy, reason, opening}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InitDraft {
    #[serde(default, deserialize_with = "lenient::object")]
    pub player: Option<CombatantDraft>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub enemy: Option<CombatantDraft>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub opening: Option<String>,
}

/// Status block of a round response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusDraft {
    #[serde(default, deserialize_with = "lenient::int")]
    pub player_hp: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub enemy_hp: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub player_conc: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub enemy_conc: Option<i64>,
}

/// Round response: `{narrative, status, phase, dialogue, damage_dealt, player_skill_used, enemy_skill_used}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RoundDraft {
    #[serde(default, deserialize_with = "lenient::text")]
    pub narrative: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub status: Option<StatusDraft>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phase: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub dialogue: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub damage_dealt: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub player_skill_used: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub enemy_skill_used: Option<String>,
}

// =========================================================================
//  RECORDS (validated)
// =========================================================================

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Produced by the active backend and validated
    Backend,
    /// Substituted from the offline generator after a bad response
    Fallback,
}

/// Validated seed data for a new battle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitRecord {
    pub player: Combatant,
    pub enemy: Combatant,
    pub reason: String,
    pub opening: String,
    pub source: RecordSource,
}

/// hp/conc of both sides after a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundStatus {
    pub player_hp: u32,
    pub enemy_hp: u32,
    pub player_conc: u32,
    pub enemy_conc: u32,
}

/// Validated outcome of one round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    pub narrative: String,
    pub status: RoundStatus,
    pub phase: Phase,
    pub dialogue: String,
    pub damage_dealt: String,
    pub player_skill_used: String,
    pub enemy_skill_used: String,
    pub source: RecordSource,
}

impl RoundRecord {
    /// True when this round was substituted from offline content
    pub fn is_fallback(&self) -> bool {
        self.source == RecordSource::Fallback
    }
}

/// Defaults for init validation
#[derive(Debug, Clone, Copy)]
pub struct InitDefaults<'a> {
    pub player_name: &'a str,
    pub enemy_name: &'a str,
    pub player_hp: u32,
    pub enemy_hp: u32,
    pub hp_ceiling: u32,
}

const DEFAULT_REASON: &str = "Unknown cause";
const DEFAULT_OPENING: &str = "The battle begins!";

impl InitDraft {
    /// Validate into an init record
    ///
    /// Both combatants must be present; anything else is defaulted.
    pub fn validate(self, defaults: InitDefaults<'_>) -> Result<InitRecord> {
        let (player, enemy) = match (self.player, self.enemy) {
            (Some(player), Some(enemy)) => (player, enemy),
            (None, _) => {
                return Err(DuelError::IncompleteRecord(
                    "init response has no player".into(),
                ))
            }
            (_, None) => {
                return Err(DuelError::IncompleteRecord(
                    "init response has no enemy".into(),
                ))
            }
        };

        Ok(InitRecord {
            player: Combatant::from_draft(
                player,
                defaults.player_name,
                defaults.player_hp,
                defaults.hp_ceiling,
            ),
            enemy: Combatant::from_draft(
                enemy,
                defaults.enemy_name,
                defaults.enemy_hp,
                defaults.hp_ceiling,
            ),
            reason: self.reason.unwrap_or_else(|| DEFAULT_REASON.to_string()),
            opening: self.opening.unwrap_or_else(|| DEFAULT_OPENING.to_string()),
            source: RecordSource::Backend,
        })
    }
}

impl RoundDraft {
    /// Validate into a round record
    ///
    /// The status object is required; its individual fields default to 0.
    /// hp is clamped into `0..=hp_ceiling` and conc into `0..=100`. The
    /// phase is left provisional (`provisional`) for the engine to settle.
    pub fn validate(self, hp_ceiling: u32, provisional: Phase) -> Result<RoundRecord> {
        let status = self.status.ok_or_else(|| {
            DuelError::IncompleteRecord("round response has no status object".into())
        })?;

        let hp = |v: Option<i64>| v.unwrap_or(0).clamp(0, hp_ceiling as i64) as u32;
        let conc = |v: Option<i64>| v.unwrap_or(0).clamp(0, CONC_MAX as i64) as u32;

        Ok(RoundRecord {
            narrative: self.narrative.unwrap_or_default(),
            status: RoundStatus {
                player_hp: hp(status.player_hp),
                enemy_hp: hp(status.enemy_hp),
                player_conc: conc(status.player_conc),
                enemy_conc: conc(status.enemy_conc),
            },
            phase: provisional,
            dialogue: self.dialogue.unwrap_or_default(),
            damage_dealt: self.damage_dealt.unwrap_or_default(),
            player_skill_used: self.player_skill_used.unwrap_or_default(),
            enemy_skill_used: self.enemy_skill_used.unwrap_or_default(),
            source: RecordSource::Backend,
        })
    }
}

/// Type-tolerant field deserializers
///
/// Each reads the raw JSON value and maps anything unusable to `None`
/// instead of failing the whole record.
mod lenient {
    use super::SkillDraft;
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn as_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| float_to_int(n.as_f64()?)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| float_to_int(s.parse::<f64>().ok()?))
            }
            _ => None,
        }
    }

    fn float_to_int(f: f64) -> Option<i64> {
        // `as` saturates at the i64 bounds
        f.is_finite().then(|| f.round() as i64)
    }

    pub fn int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(as_int))
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(v @ Value::Object(_)) => serde_json::from_value(v).ok(),
            _ => None,
        })
    }

    pub fn skills<'de, D>(deserializer: D) -> Result<Option<Vec<SkillDraft>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .filter(Value::is_object)
                    .filter_map(|item| serde_json::from_value(item).ok())
                    .collect(),
            ),
            _ => None,
        })
    }
}
