// ═══════════════════════════════════════════════════════════════════════
// Engine configuration — tunable numbers treated as data, not rules
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

/// Hit points are always clamped to this ceiling.
pub const MAX_HP: i32 = 100;

/// Commander command pools never exceed this base.
pub const MAX_COMMAND_BASE: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub starting_hp: i32,
    /// Opening hand size dealt on entering deployment.
    pub hand_size: usize,
    /// Command regained by every commander on each round change.
    pub command_restore: u8,
    /// Damage roll bounds (inclusive). `roll_min == roll_max == 0` disables the roll.
    pub roll_min: i32,
    pub roll_max: i32,
    /// The battle ends by hit points after this round.
    pub max_rounds: u32,
    /// Upper bound for a pre-combat initiative bid.
    pub max_bid: u8,
    /// Rolling battle log length.
    pub log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            starting_hp: MAX_HP,
            hand_size: 7,
            command_restore: 1,
            roll_min: 1,
            roll_max: 5,
            max_rounds: 12,
            max_bid: 10,
            log_capacity: 200,
        }
    }
}

impl EngineConfig {
    /// Clamp out-of-range values into something the rules can run with.
    pub fn sanitized(mut self) -> Self {
        self.starting_hp = self.starting_hp.clamp(1, MAX_HP);
        if self.roll_max < self.roll_min {
            std::mem::swap(&mut self.roll_min, &mut self.roll_max);
        }
        self.max_rounds = self.max_rounds.max(1);
        self.log_capacity = self.log_capacity.max(1);
        self
    }

    /// Expected value of one damage roll, rounded down.
    pub fn mean_roll(&self) -> i32 {
        (self.roll_min + self.roll_max) / 2
    }
}
