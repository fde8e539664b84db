// ═══════════════════════════════════════════════════════════════════════
// Battle Runner — runs complete headless battles with agents
// ═══════════════════════════════════════════════════════════════════════

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use warband_agents::{Agent, BotAgent, BotConfig, Difficulty};
use warband_engine::engine::{self, Action};
use warband_engine::setup::{create_battle, BattleSetup};
use warband_engine::types::*;
use warband_engine::visibility::player_view;
use warband_engine::EngineConfig;

/// Result of a completed battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub seed: u64,
    pub outcome: Outcome,
    pub rounds_played: u32,
    pub decisions: usize,
    pub environment: Environment,
    pub sides: [SideResult; 2],
    /// Tail of the battle log, bounded by `log_capacity`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideResult {
    pub side: Side,
    pub agent_name: String,
    pub culture: Culture,
    pub final_hp: i32,
    pub cards_played: usize,
}

impl BattleResult {
    pub fn winner(&self) -> Option<Side> {
        self.outcome.winner()
    }

    pub fn side(&self, side: Side) -> &SideResult {
        &self.sides[side.index()]
    }
}

/// Which side the runner asks next. Both sides bid before anyone advances
/// out of pre-combat; afterwards the active side drives the battle.
fn next_actor(state: &BattleState) -> Side {
    if state.phase == Phase::PreCombat {
        if let Some(side) = Side::ALL.into_iter().find(|s| state.side(*s).bid.is_none()) {
            return side;
        }
    }
    state.active_side
}

/// Run a complete battle. `agents` is indexed by `Side::index()`.
pub fn run_battle(
    agents: &mut [Box<dyn Agent>; 2],
    setup: &BattleSetup,
    config: &EngineConfig,
    max_decisions: usize, // safety limit to prevent infinite loops
) -> Result<BattleResult, String> {
    let mut state = create_battle(setup, config.clone());
    let mut decisions = 0;

    while !state.is_finished() {
        let side = next_actor(&state);
        let agent = &mut agents[side.index()];
        let view = player_view(&state, side);
        let action = agent.decide(&view);
        decisions += 1;

        if let Err(err) = engine::apply_action(&mut state, side, action.clone()) {
            warn!(agent = agent.name(), %side, ?action, %err, "agent action rejected");
            let fallback = if state.phase == Phase::Actions && !state.side(side).passed {
                Action::Pass
            } else {
                Action::AdvancePhase
            };
            engine::apply_action(&mut state, side, fallback)
                .map_err(|e| format!("Battle stuck: phase={}, round={}: {}", state.phase, state.round, e))?;
        }

        if decisions > max_decisions {
            return Err(format!(
                "Battle exceeded {} decisions without finishing (round {})",
                max_decisions, state.round
            ));
        }
    }

    let outcome = state.outcome.ok_or_else(|| "Battle finished without an outcome".to_string())?;
    debug!(seed = setup.seed, ?outcome, rounds = state.round, decisions, "battle complete");
    Ok(build_result(&state, agents, decisions, outcome))
}

fn build_result(state: &BattleState, agents: &[Box<dyn Agent>; 2], decisions: usize, outcome: Outcome) -> BattleResult {
    let side_result = |side: Side| {
        let c = state.side(side);
        SideResult {
            side,
            agent_name: agents[side.index()].name().to_string(),
            culture: c.culture,
            final_hp: c.hp,
            cards_played: c.discard.len() + c.in_play.len(),
        }
    };
    BattleResult {
        seed: state.seed,
        outcome,
        rounds_played: state.round,
        decisions,
        environment: state.environment.clone(),
        sides: [side_result(Side::Attacker), side_result(Side::Defender)],
        log: state.log.iter().cloned().collect(),
    }
}

// ── Batches ────────────────────────────────────────────────────────────

/// One bot line-up played over many seeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPlan {
    pub attacker: (Culture, Difficulty),
    pub defender: (Culture, Difficulty),
    /// Fixed battlefield; `None` rolls one per seed.
    pub environment: Option<Environment>,
    pub engine: EngineConfig,
    pub bot: BotConfig,
    pub first_seed: u64,
    pub battles: u64,
    pub max_decisions: usize,
}

/// Battlefield for a seed when the batch does not fix one.
pub fn random_environment(seed: u64) -> Environment {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5EED_F1E1D);
    let secondary = if rng.gen_bool(0.5) { SecondaryTerrain::ALL.choose(&mut rng).copied() } else { None };
    Environment {
        terrain: *Terrain::ALL.choose(&mut rng).unwrap_or(&Terrain::Plains),
        secondary_terrain: secondary.into_iter().collect(),
        climate: *Climate::ALL.choose(&mut rng).unwrap_or(&Climate::Temperate),
        season: *Season::ALL.choose(&mut rng).unwrap_or(&Season::Summer),
    }
}

/// Run every seed of the batch in parallel. Each battle owns its state,
/// its agents and its seed, so results do not depend on scheduling.
pub fn run_batch(plan: &BatchPlan) -> Vec<Result<BattleResult, String>> {
    info!(battles = plan.battles, first_seed = plan.first_seed, "running batch");
    (0..plan.battles)
        .into_par_iter()
        .map(|i| plan.first_seed.wrapping_add(i))
        .map(|seed| {
            let environment = plan.environment.clone().unwrap_or_else(|| random_environment(seed));
            let setup = BattleSetup::new(plan.attacker.0, plan.defender.0, seed).with_environment(environment);
            let mut agents: [Box<dyn Agent>; 2] = [
                Box::new(BotAgent::with_config(Side::Attacker, plan.attacker.1, plan.bot.clone(), seed)),
                Box::new(BotAgent::with_config(Side::Defender, plan.defender.1, plan.bot.clone(), seed.wrapping_add(1))),
            ];
            run_battle(&mut agents, &setup, &plan.engine, plan.max_decisions)
        })
        .collect()
}
