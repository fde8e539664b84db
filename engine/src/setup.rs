// ═══════════════════════════════════════════════════════════════════════
// Battle setup — builds the initial BattleState for two cultures
// ═══════════════════════════════════════════════════════════════════════

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::cards;
use crate::config::EngineConfig;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideSetup {
    pub culture: Culture,
}

/// Everything the surrounding app decides before a battle starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSetup {
    pub attacker: SideSetup,
    pub defender: SideSetup,
    #[serde(default)]
    pub environment: Environment,
    pub seed: u64,
}

impl BattleSetup {
    pub fn new(attacker: Culture, defender: Culture, seed: u64) -> Self {
        BattleSetup {
            attacker: SideSetup { culture: attacker },
            defender: SideSetup { culture: defender },
            environment: Environment::default(),
            seed,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn culture(&self, side: Side) -> Culture {
        match side {
            Side::Attacker => self.attacker.culture,
            Side::Defender => self.defender.culture,
        }
    }
}

/// Card ids are `side * 100 + n`, commander ids `side * 10 + n`, so both
/// are unique across the battle.
fn build_combatant(side: Side, culture: Culture, config: &EngineConfig, rng: &mut ChaCha8Rng) -> Combatant {
    let base = side.index();
    let mut deck: Vec<Card> = cards::culture_cards(culture)
        .iter()
        .enumerate()
        .map(|(i, def)| def.instantiate(CardId((base * 100 + i + 1) as u16)))
        .collect();
    deck.shuffle(rng);

    let commanders = cards::culture_roster(culture)
        .iter()
        .enumerate()
        .map(|(i, def)| def.instantiate(CommanderId((base * 10 + i + 1) as u8)))
        .collect();

    Combatant {
        side,
        culture,
        hand: Vec::new(),
        deck,
        in_play: Vec::new(),
        discard: Vec::new(),
        commanders,
        hp: config.starting_hp,
        passed: false,
        damage_dealt_this_round: 0,
        mobility_this_round: 0,
        bid: None,
    }
}

/// Create the battle in `PreCombat`. Hands are dealt on entering deployment;
/// the seed controls deck order and every later roll.
pub fn create_battle(setup: &BattleSetup, config: EngineConfig) -> BattleState {
    let config = config.sanitized();
    let mut rng = ChaCha8Rng::seed_from_u64(setup.seed);

    let attacker = build_combatant(Side::Attacker, setup.attacker.culture, &config, &mut rng);
    let defender = build_combatant(Side::Defender, setup.defender.culture, &config, &mut rng);

    let mut state = BattleState {
        round: 1,
        phase: Phase::PreCombat,
        active_side: Side::Attacker,
        initiative: Side::Attacker,
        sides: [attacker, defender],
        environment: setup.environment.clone(),
        config,
        log: VecDeque::new(),
        action_seq: 0,
        final_round: false,
        seed: setup.seed,
        rng_counter: 0,
        outcome: None,
    };
    let summary = format!(
        "{} attack {} on {}",
        setup.attacker.culture,
        setup.defender.culture,
        setup.environment.terrain.external_name()
    );
    state.push_log(None, summary);
    state
}
