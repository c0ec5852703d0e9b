//! The duel itself: combatants, records, state and the engine driving them

pub mod combatant;
pub mod display;
pub mod engine;
pub mod history;
pub mod records;
pub mod state;

pub use combatant::{Combatant, Skill};
pub use display::{resolve_action, skill_menu, status_panel, used_skills_menu, Outcome};
pub use engine::BattleEngine;
pub use history::HistoryEntry;
pub use records::{InitRecord, RecordSource, RoundRecord, RoundStatus};
pub use state::{BattleState, BattleStateStore, StatusSnapshot};
