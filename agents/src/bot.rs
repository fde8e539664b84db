// ═══════════════════════════════════════════════════════════════════════
// Bot — difficulty-tiered decision engine
//
// Every choice is made from the PlayerView alone. Randomness comes from
// the caller's RNG; all probabilities and weights live in `BotConfig`.
// ═══════════════════════════════════════════════════════════════════════

use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::agent::{Agent, Decision};
use crate::pacing::DeferredDecision;
use warband_engine::cards;
use warband_engine::types::*;
use warband_engine::visibility::{LegalPlay, PlayerView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn from_name(name: &str) -> Option<Difficulty> {
        match name.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// Tunable bot behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub easy_pass_probability: f64,
    pub medium_pass_probability: f64,
    /// Medium weighs a play by `max(1, attack_bonus + offset)`.
    pub medium_weight_offset: i32,
    /// Hard scores a play as preview damage plus this times its defense.
    pub hard_defense_weight: f64,
    pub hard_bid_fraction: f64,
    pub easy_latency_ms: u64,
    pub medium_latency_ms: u64,
    pub hard_latency_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            easy_pass_probability: 0.35,
            medium_pass_probability: 0.10,
            medium_weight_offset: 2,
            hard_defense_weight: 0.5,
            hard_bid_fraction: 0.6,
            easy_latency_ms: 600,
            medium_latency_ms: 900,
            hard_latency_ms: 1300,
        }
    }
}

impl BotConfig {
    pub fn latency(&self, difficulty: Difficulty) -> Duration {
        let ms = match difficulty {
            Difficulty::Easy => self.easy_latency_ms,
            Difficulty::Medium => self.medium_latency_ms,
            Difficulty::Hard => self.hard_latency_ms,
        };
        Duration::from_millis(ms)
    }
}

// ── Card plays ─────────────────────────────────────────────────────────

/// Hard's score for a play: expected damage plus weighted defense.
pub fn score_play(view: &PlayerView, play: &LegalPlay, config: &BotConfig) -> f64 {
    let Some(strike) = view.preview(play.card_id, play.commander_id) else {
        return f64::NEG_INFINITY;
    };
    let defense = view.my_hand.get(play.card_index).map_or(0, |c| c.defense_bonus)
        + strike.card_effect.defense_modifier
        + strike.card_effect.damage_reduction;
    f64::from(strike.damage) + config.hard_defense_weight * f64::from(defense)
}

/// Best play by score; ties go to the cheaper card, then the earlier one.
fn best_play(view: &PlayerView, plays: &[LegalPlay], config: &BotConfig) -> Option<LegalPlay> {
    let cost = |p: &LegalPlay| view.my_hand.get(p.card_index).map_or(u8::MAX, |c| c.command_required);
    plays.iter()
        .map(|p| (score_play(view, p, config), p))
        .max_by(|(sa, a), (sb, b)| {
            sa.total_cmp(sb)
                .then_with(|| cost(b).cmp(&cost(a)))
                .then_with(|| b.card_index.cmp(&a.card_index))
                .then_with(|| b.commander_id.cmp(&a.commander_id))
        })
        .map(|(_, p)| *p)
}

fn weighted_play<R: Rng>(view: &PlayerView, plays: &[LegalPlay], config: &BotConfig, rng: &mut R) -> Option<LegalPlay> {
    plays.choose_weighted(rng, |p| {
        let attack = view.my_hand.get(p.card_index).map_or(0, |c| c.attack_bonus);
        (attack + config.medium_weight_offset).max(1)
    })
    .ok()
    .copied()
}

/// Pick a play or pass. With no legal play the answer is always `Pass`.
pub fn decide<R: Rng>(view: &PlayerView, difficulty: Difficulty, config: &BotConfig, rng: &mut R) -> Decision {
    let plays = view.legal_plays();
    if plays.is_empty() {
        return Decision::Pass;
    }
    let chosen = match difficulty {
        Difficulty::Easy => {
            if rng.gen_bool(config.easy_pass_probability.clamp(0.0, 1.0)) {
                None
            } else {
                plays.choose(rng).copied()
            }
        }
        Difficulty::Medium => {
            if rng.gen_bool(config.medium_pass_probability.clamp(0.0, 1.0)) {
                None
            } else {
                weighted_play(view, &plays, config, rng)
            }
        }
        Difficulty::Hard => best_play(view, &plays, config),
    };
    let decision = match chosen {
        Some(p) => Decision::PlayCard { card_index: p.card_index, commander_id: p.commander_id },
        None => Decision::Pass,
    };
    debug!(side = %view.viewer, %difficulty, options = plays.len(), ?decision, "bot decided");
    decision
}

// ── Auxiliary choices ──────────────────────────────────────────────────

pub fn choose_culture<R: Rng>(cultures: &[Culture], difficulty: Difficulty, rng: &mut R) -> Culture {
    let fallback = Culture::Imperial;
    match difficulty {
        Difficulty::Easy => cultures.choose(rng).copied().unwrap_or(fallback),
        Difficulty::Medium => cultures
            .choose_weighted(rng, |c| cards::catalog_strength(*c).max(1))
            .ok()
            .copied()
            .unwrap_or(fallback),
        Difficulty::Hard => cultures.iter()
            .copied()
            .rev()
            .max_by_key(|c| cards::catalog_strength(*c))
            .unwrap_or(fallback),
    }
}

pub fn choose_bid<R: Rng>(budget: u8, difficulty: Difficulty, config: &BotConfig, rng: &mut R) -> u8 {
    match difficulty {
        Difficulty::Easy => rng.gen_range(0..=budget),
        Difficulty::Medium => {
            let half = i32::from(budget / 2) + rng.gen_range(-1..=1);
            half.clamp(0, i32::from(budget)) as u8
        }
        Difficulty::Hard => {
            let bid = (f64::from(budget) * config.hard_bid_fraction.clamp(0.0, 1.0)).round();
            (bid as u8).min(budget)
        }
    }
}

// ── Agent ──────────────────────────────────────────────────────────────

pub struct BotAgent {
    side: Side,
    difficulty: Difficulty,
    config: BotConfig,
    name: String,
    rng: ChaCha8Rng,
}

impl BotAgent {
    pub fn new(side: Side, difficulty: Difficulty, seed: u64) -> Self {
        BotAgent::with_config(side, difficulty, BotConfig::default(), seed)
    }

    pub fn with_config(side: Side, difficulty: Difficulty, config: BotConfig, seed: u64) -> Self {
        BotAgent {
            side,
            difficulty,
            config,
            name: format!("Bot ({})", difficulty),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Decide now, deliver after the difficulty's thinking time.
    pub fn think(&mut self, view: &PlayerView) -> DeferredDecision {
        let decision = decide(view, self.difficulty, &self.config, &mut self.rng);
        DeferredDecision { decision, ready_after: self.config.latency(self.difficulty) }
    }
}

impl Agent for BotAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn side(&self) -> Side {
        self.side
    }

    fn choose_play(&mut self, view: &PlayerView) -> Decision {
        decide(view, self.difficulty, &self.config, &mut self.rng)
    }

    fn choose_bid(&mut self, view: &PlayerView) -> u8 {
        choose_bid(view.config.max_bid, self.difficulty, &self.config, &mut self.rng)
    }

    fn choose_culture(&mut self, cultures: &[Culture]) -> Culture {
        choose_culture(cultures, self.difficulty, &mut self.rng)
    }
}
