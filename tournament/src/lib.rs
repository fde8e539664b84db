pub mod database;
pub mod runner;

pub use database::{Database, WinRate};
pub use runner::{random_environment, run_batch, run_battle, BatchPlan, BattleResult, SideResult};
