pub mod config;
pub mod error;
pub mod types;

pub use config::{BackendConfig, DuelConfig, EngineConfig};
pub use error::{DuelError, Result};
pub use types::{Mode, Phase, Side};
