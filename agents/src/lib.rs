pub mod agent;
pub mod bot;
pub mod pacing;


pub use agent::{Agent, Decision};
pub use bot::{BotAgent, BotConfig, Difficulty};
pub use pacing::{BotTurn, DeferredDecision};
