//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Round counter (one per completed turn)
pub type Round = u32;

/// Upper bound of the concentration resource
pub const CONC_MAX: u32 = 100;

/// Macro-state of a battle
///
/// Ordered by how far the battle has progressed, so `Ending > Climax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Init,
    Battle,
    Climax,
    Ending,
}

impl Phase {
    /// Lowercase wire name
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Battle => "battle",
            Phase::Climax => "climax",
            Phase::Ending => "ending",
        }
    }

    /// Parse a phase name reported by a backend (case-insensitive)
    pub fn parse(raw: &str) -> Option<Phase> {
        match raw.trim().to_lowercase().as_str() {
            "init" => Some(Phase::Init),
            "battle" => Some(Phase::Battle),
            "climax" => Some(Phase::Climax),
            "ending" => Some(Phase::Ending),
            _ => None,
        }
    }

    /// Phase implied by hit points alone
    ///
    /// Anyone at 0 ends the battle; anyone at or below the threshold puts
    /// it in climax.
    pub fn from_hp(player_hp: u32, enemy_hp: u32, climax_threshold: u32) -> Phase {
        if player_hp == 0 || enemy_hp == 0 {
            Phase::Ending
        } else if player_hp <= climax_threshold || enemy_hp <= climax_threshold {
            Phase::Climax
        } else {
            Phase::Battle
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which backend variant is producing content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Offline,
    Live,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Offline => "offline",
            Mode::Live => "live",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the two combatants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Enemy,
}
