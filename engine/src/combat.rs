// ═══════════════════════════════════════════════════════════════════════
// Combat resolver — damage arithmetic and the injectable roll source
//
// Everything here is pure except `RollSource`. The orchestrator gathers
// the windows, rolls, calls `strike()` and then mutates the state.
// ═══════════════════════════════════════════════════════════════════════

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::EngineConfig;
use crate::effects::{self, EffectResult};
use crate::environment::{self, Penalty};
use crate::types::*;

// ── Randomness ─────────────────────────────────────────────────────────

/// Source of damage rolls. Inject a `FixedRoll` to make resolution fully
/// predictable.
pub trait RollSource {
    /// Uniform integer in `min..=max`.
    fn roll(&mut self, min: i32, max: i32) -> i32;
}

/// Any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngRolls<R>(pub R);

impl<R: Rng> RollSource for RngRolls<R> {
    fn roll(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            min
        } else {
            self.0.gen_range(min..=max)
        }
    }
}

/// Always rolls the same value (clamped to the requested range).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRoll(pub i32);

impl RollSource for FixedRoll {
    fn roll(&mut self, min: i32, max: i32) -> i32 {
        self.0.clamp(min, max.max(min))
    }
}

/// Rolls derived from the battle's seed and action counter, so replaying
/// the same action on the same state rolls the same numbers.
pub fn state_rolls(state: &BattleState) -> RngRolls<ChaCha8Rng> {
    let stream = state.seed ^ state.rng_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    RngRolls(ChaCha8Rng::seed_from_u64(stream))
}

/// One damage roll, taking the lower of two when at disadvantage.
pub fn roll_damage(roller: &mut dyn RollSource, config: &EngineConfig, disadvantage: bool) -> i32 {
    let first = roller.roll(config.roll_min, config.roll_max);
    if disadvantage {
        first.min(roller.roll(config.roll_min, config.roll_max))
    } else {
        first
    }
}

// ── Strike ─────────────────────────────────────────────────────────────

/// Everything needed to resolve one card play against the opposing side.
#[derive(Debug, Clone)]
pub struct StrikeInputs<'a> {
    pub card: &'a Card,
    pub commander: &'a Commander,
    /// Non-cancelled cards the striking side already has in play this round.
    pub own_window: Vec<&'a Card>,
    /// Non-cancelled cards the target side has in play this round.
    pub enemy_window: Vec<&'a Card>,
    pub own_ctx: GameContext,
    pub enemy_ctx: GameContext,
    pub enemy_guard: i32,
    pub enemy_hp: i32,
}

impl<'a> StrikeInputs<'a> {
    /// Gather the inputs for `side` playing `card` with `commander`.
    pub fn gather(state: &'a BattleState, side: Side, card: &'a Card, commander: &'a Commander) -> Self {
        let own = state.side(side);
        let enemy = state.side(side.opponent());
        StrikeInputs {
            card,
            commander,
            own_window: own.active_window().map(|p| &p.card).collect(),
            enemy_window: enemy.active_window().map(|p| &p.card).collect(),
            own_ctx: state.context_for(side),
            enemy_ctx: state.context_for(side.opponent()),
            enemy_guard: enemy.standing_guard(),
            enemy_hp: enemy.hp,
        }
    }

    /// Net result of the striking side's window including the new card.
    pub fn own_net(&self) -> EffectResult {
        effects::combine(
            self.own_window.iter()
                .copied()
                .chain(std::iter::once(self.card))
                .map(|c| effects::resolve(c, &self.own_ctx)),
        )
    }

    pub fn enemy_net(&self) -> EffectResult {
        effects::combine(self.enemy_window.iter().map(|c| effects::resolve(c, &self.enemy_ctx)))
    }

    /// Whether the target side's window puts this strike at disadvantage.
    pub fn at_disadvantage(&self) -> bool {
        self.enemy_net().force_enemy_disadvantage
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strike {
    pub roll: i32,
    pub attack: i32,
    pub defense: i32,
    pub reduction: i32,
    /// Damage to apply, finishing bonus included.
    pub damage: i32,
    pub finishing: bool,
    pub penalty: Penalty,
    /// Mobility this play adds to its own side.
    pub mobility: i32,
    /// Mobility this play takes from the enemy (usually negative).
    pub enemy_mobility: i32,
    /// This card's own resolution, for one-shot effects.
    pub card_effect: EffectResult,
    /// The striking side's window after the play.
    pub own_net: EffectResult,
}

/// Resolve a play with a given roll. Pure.
pub fn strike(inputs: &StrikeInputs<'_>, roll: i32) -> Strike {
    let own = inputs.own_net();
    let enemy = inputs.enemy_net();
    let card_effect = effects::resolve(inputs.card, &inputs.own_ctx);
    let penalty = environment::penalty_for(inputs.card.unit_type, &inputs.own_ctx, &own, &enemy);

    let attack = inputs.card.attack_bonus
        + inputs.commander.strategy
        + roll
        + own.attack_modifier
        + enemy.enemy_attack_modifier
        + penalty.attack;

    let enemy_cards_defense: i32 = inputs.enemy_window.iter().map(|c| c.defense_bonus).sum();
    let defense = (enemy_cards_defense
        + enemy.defense_modifier
        + own.enemy_defense_modifier
        + inputs.enemy_guard)
        .max(0);

    let reduction = enemy.damage_reduction.max(0);
    let mut damage = (attack - defense - reduction).max(0);
    let finishing = damage > 0 && inputs.enemy_hp - damage <= 0;
    if finishing {
        damage += own.extra_damage_on_win.max(0);
    }

    Strike {
        roll,
        attack,
        defense,
        reduction,
        damage,
        finishing,
        penalty,
        mobility: inputs.card.mobility_bonus + card_effect.mobility_modifier + penalty.mobility,
        enemy_mobility: card_effect.enemy_mobility_modifier,
        card_effect,
        own_net: own,
    }
}

/// Expected outcome of a play at the mean roll, without touching any state.
pub fn preview_damage(inputs: &StrikeInputs<'_>, config: &EngineConfig) -> Strike {
    strike(inputs, config.mean_roll())
}

/// Apply damage to a hit-point pool, clamped at zero. Returns the new value.
pub fn apply_damage(hp: &mut i32, damage: i32) -> i32 {
    *hp = (*hp - damage.max(0)).max(0);
    *hp
}

/// Retaliation owed by `side` at resolve time: its window's retaliation if
/// the opponent drew blood this round.
pub fn retaliation_owed(state: &BattleState, side: Side) -> i32 {
    let opponent = state.side(side.opponent());
    if opponent.damage_dealt_this_round <= 0 {
        return 0;
    }
    let ctx = state.context_for(side);
    let net = effects::combine(state.side(side).active_window().map(|p| effects::resolve(&p.card, &ctx)));
    net.retaliation_damage.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectType;

    fn card(attack: i32, effect: Option<EffectType>) -> Card {
        Card {
            id: CardId(1),
            name: "Test".into(),
            unit_type: None,
            attack_bonus: attack,
            defense_bonus: 0,
            mobility_bonus: 0,
            command_required: 1,
            effect_type: effect,
            general_order: false,
        }
    }

    fn commander() -> Commander {
        Commander {
            id: CommanderId(1),
            name: "Test".into(),
            specialization: Some(UnitType::Infantry),
            command_base: 3,
            command_free: 3,
            strategy: 0,
            guard: 0,
            is_general: false,
            tapped: false,
            spare_plays: 0,
        }
    }

    fn ctx() -> GameContext {
        GameContext {
            terrain: Terrain::Plains,
            secondary_terrain: Vec::new(),
            climate: Climate::Temperate,
            season: Season::Spring,
            is_defending: false,
            has_initiative: true,
            round: 1,
            phase: Phase::Actions,
            own_damage_this_round: 0,
            enemy_damage_this_round: 0,
        }
    }

    fn inputs<'a>(c: &'a Card, m: &'a Commander, enemy: Vec<&'a Card>, hp: i32) -> StrikeInputs<'a> {
        StrikeInputs {
            card: c,
            commander: m,
            own_window: Vec::new(),
            enemy_window: enemy,
            own_ctx: ctx(),
            enemy_ctx: GameContext { is_defending: true, has_initiative: false, ..ctx() },
            enemy_guard: 0,
            enemy_hp: hp,
        }
    }

    #[test]
    fn test_fixed_roll_clamps() {
        assert_eq!(FixedRoll(9).roll(1, 5), 5);
        assert_eq!(FixedRoll(0).roll(1, 5), 1);
    }

    #[test]
    fn test_rng_rolls_stay_in_range() {
        let mut r = RngRolls(ChaCha8Rng::seed_from_u64(7));
        for _ in 0..200 {
            let v = r.roll(1, 5);
            assert!((1..=5).contains(&v));
        }
    }

    #[test]
    fn test_damage_is_attack_plus_roll() {
        let c = card(3, None);
        let m = commander();
        let s = strike(&inputs(&c, &m, vec![], 100), 2);
        assert_eq!(s.damage, 5);
        assert!(!s.finishing);
    }

    #[test]
    fn test_reduction_floors_at_zero() {
        let c = card(1, None);
        let m = commander();
        let wall = Card { defense_bonus: 3, ..card(0, Some(EffectType::DamageReduction2)) };
        let s = strike(&inputs(&c, &m, vec![&wall], 100), 1);
        assert_eq!(s.damage, 0);
    }

    #[test]
    fn test_extra_damage_only_on_finishing_blow() {
        let c = card(4, Some(EffectType::ExtraDamageOnWin));
        let m = commander();
        let normal = strike(&inputs(&c, &m, vec![], 100), 1);
        assert_eq!(normal.damage, 5);
        let finishing = strike(&inputs(&c, &m, vec![], 5), 1);
        assert!(finishing.finishing);
        assert_eq!(finishing.damage, 7);
    }

    #[test]
    fn test_apply_damage_clamps() {
        let mut hp = 5;
        assert_eq!(apply_damage(&mut hp, 7), 0);
        assert_eq!(hp, 0);
    }

    #[test]
    fn test_disadvantage_takes_lower_roll() {
        struct Seq(Vec<i32>);
        impl RollSource for Seq {
            fn roll(&mut self, _min: i32, _max: i32) -> i32 {
                self.0.remove(0)
            }
        }
        let config = EngineConfig::default();
        assert_eq!(roll_damage(&mut Seq(vec![4, 2]), &config, true), 2);
        assert_eq!(roll_damage(&mut Seq(vec![4, 2]), &config, false), 4);
    }
}
