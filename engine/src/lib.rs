pub mod types;
pub mod config;
pub mod effects;
pub mod environment;
pub mod cards;
pub mod error;
pub mod command;
pub mod combat;
pub mod phase;
pub mod setup;
pub mod engine;
pub mod visibility;

#[cfg(test)]
mod tests;

pub use types::*;
pub use config::EngineConfig;
pub use effects::{EffectResult, EffectType};
pub use error::{ActionError, IllegalReason};
pub use engine::{apply_action, apply_action_with, apply_submission, Action, ActionOutcome, Submission};
pub use setup::{create_battle, BattleSetup, SideSetup};
pub use visibility::{player_view, LegalPlay, PlayerView};
