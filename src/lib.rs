//! AI Duel - Turn-based duels narrated by a language model

pub mod core;
pub mod duel;
pub mod llm;
