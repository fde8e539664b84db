// ═══════════════════════════════════════════════════════════════════════
// Card effects — tag registry, resolver and aggregator
//
// Every effect tag maps to a pure function `(card, context) -> EffectResult`.
// Results form a monoid: `EffectResult::default()` is the identity and
// `merge` is associative and commutative, so a whole resolution window is
// just `combine(window.map(resolve))`.
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::*;

// ── Effect tags ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    #[serde(rename = "damage_reduction_1")]
    DamageReduction1,
    #[serde(rename = "damage_reduction_2")]
    DamageReduction2,
    IgnoreClimateHeat,
    IgnoreClimateAll,
    IgnoreTerrainDifficult,
    IgnoreTerrainAll,
    BonusOnTerrainUrban,
    BonusOnTerrainForest,
    BonusOnTerrainHills,
    BonusOnTerrainOpen,
    BonusOnRiver,
    BonusInWinter,
    BonusInSummer,
    BonusWhenDefending,
    BonusWhenAttacking,
    BonusWithInitiative,
    #[serde(rename = "enemy_attack_minus_1")]
    EnemyAttackMinus1,
    #[serde(rename = "enemy_defense_minus_1")]
    EnemyDefenseMinus1,
    #[serde(rename = "enemy_mobility_minus_2")]
    EnemyMobilityMinus2,
    ForceEnemyDisadvantage,
    ExtraDamageOnWin,
    #[serde(rename = "cancel_enemy_card_1")]
    CancelEnemyCard1,
    #[serde(rename = "cancel_enemy_card_2")]
    CancelEnemyCard2,
    UntapCommander,
    TapEnemyCommander,
    DoubleCardPerTap,
    ReturnToHand,
    DrawOnInitiative,
    Retaliation,
    BlockCavalry,
    BlockRanged,
    AmplifyClimatePenalty,
    ForceTerrainPlains,
    FlexibleCommand,
    FlexibleMounted,
}

impl EffectType {
    pub const ALL: [EffectType; 35] = [
        EffectType::DamageReduction1,
        EffectType::DamageReduction2,
        EffectType::IgnoreClimateHeat,
        EffectType::IgnoreClimateAll,
        EffectType::IgnoreTerrainDifficult,
        EffectType::IgnoreTerrainAll,
        EffectType::BonusOnTerrainUrban,
        EffectType::BonusOnTerrainForest,
        EffectType::BonusOnTerrainHills,
        EffectType::BonusOnTerrainOpen,
        EffectType::BonusOnRiver,
        EffectType::BonusInWinter,
        EffectType::BonusInSummer,
        EffectType::BonusWhenDefending,
        EffectType::BonusWhenAttacking,
        EffectType::BonusWithInitiative,
        EffectType::EnemyAttackMinus1,
        EffectType::EnemyDefenseMinus1,
        EffectType::EnemyMobilityMinus2,
        EffectType::ForceEnemyDisadvantage,
        EffectType::ExtraDamageOnWin,
        EffectType::CancelEnemyCard1,
        EffectType::CancelEnemyCard2,
        EffectType::UntapCommander,
        EffectType::TapEnemyCommander,
        EffectType::DoubleCardPerTap,
        EffectType::ReturnToHand,
        EffectType::DrawOnInitiative,
        EffectType::Retaliation,
        EffectType::BlockCavalry,
        EffectType::BlockRanged,
        EffectType::AmplifyClimatePenalty,
        EffectType::ForceTerrainPlains,
        EffectType::FlexibleCommand,
        EffectType::FlexibleMounted,
    ];

    /// The external snake_case tag.
    pub fn as_tag(self) -> &'static str {
        match self {
            EffectType::DamageReduction1 => "damage_reduction_1",
            EffectType::DamageReduction2 => "damage_reduction_2",
            EffectType::IgnoreClimateHeat => "ignore_climate_heat",
            EffectType::IgnoreClimateAll => "ignore_climate_all",
            EffectType::IgnoreTerrainDifficult => "ignore_terrain_difficult",
            EffectType::IgnoreTerrainAll => "ignore_terrain_all",
            EffectType::BonusOnTerrainUrban => "bonus_on_terrain_urban",
            EffectType::BonusOnTerrainForest => "bonus_on_terrain_forest",
            EffectType::BonusOnTerrainHills => "bonus_on_terrain_hills",
            EffectType::BonusOnTerrainOpen => "bonus_on_terrain_open",
            EffectType::BonusOnRiver => "bonus_on_river",
            EffectType::BonusInWinter => "bonus_in_winter",
            EffectType::BonusInSummer => "bonus_in_summer",
            EffectType::BonusWhenDefending => "bonus_when_defending",
            EffectType::BonusWhenAttacking => "bonus_when_attacking",
            EffectType::BonusWithInitiative => "bonus_with_initiative",
            EffectType::EnemyAttackMinus1 => "enemy_attack_minus_1",
            EffectType::EnemyDefenseMinus1 => "enemy_defense_minus_1",
            EffectType::EnemyMobilityMinus2 => "enemy_mobility_minus_2",
            EffectType::ForceEnemyDisadvantage => "force_enemy_disadvantage",
            EffectType::ExtraDamageOnWin => "extra_damage_on_win",
            EffectType::CancelEnemyCard1 => "cancel_enemy_card_1",
            EffectType::CancelEnemyCard2 => "cancel_enemy_card_2",
            EffectType::UntapCommander => "untap_commander",
            EffectType::TapEnemyCommander => "tap_enemy_commander",
            EffectType::DoubleCardPerTap => "double_card_per_tap",
            EffectType::ReturnToHand => "return_to_hand",
            EffectType::DrawOnInitiative => "draw_on_initiative",
            EffectType::Retaliation => "retaliation",
            EffectType::BlockCavalry => "block_cavalry",
            EffectType::BlockRanged => "block_ranged",
            EffectType::AmplifyClimatePenalty => "amplify_climate_penalty",
            EffectType::ForceTerrainPlains => "force_terrain_plains",
            EffectType::FlexibleCommand => "flexible_command",
            EffectType::FlexibleMounted => "flexible_mounted",
        }
    }

    /// Parse an external tag. Unknown tags yield `None`, which resolves to
    /// the identity result.
    pub fn from_tag(tag: &str) -> Option<EffectType> {
        let tag = tag.trim();
        EffectType::ALL.into_iter().find(|t| t.as_tag() == tag)
    }

    /// Terrain this tag substitutes for the battlefield's, if any.
    pub fn forced_terrain(self) -> Option<Terrain> {
        match self {
            EffectType::ForceTerrainPlains => Some(Terrain::Plains),
            _ => None,
        }
    }
}

// ── Effect result (monoid) ─────────────────────────────────────────────

/// Which climate penalties a side shrugs off. Ordered by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClimateImmunity {
    #[default]
    None,
    Heat,
    All,
}

impl ClimateImmunity {
    pub fn covers(self, climate: Climate) -> bool {
        match self {
            ClimateImmunity::None => false,
            ClimateImmunity::Heat => climate == Climate::Heat,
            ClimateImmunity::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectResult {
    pub attack_modifier: i32,
    pub defense_modifier: i32,
    pub mobility_modifier: i32,
    pub enemy_attack_modifier: i32,
    pub enemy_defense_modifier: i32,
    pub enemy_mobility_modifier: i32,
    pub damage_reduction: i32,
    pub extra_damage_on_win: i32,
    pub retaliation_damage: i32,
    pub draw_cards: i32,
    pub extra_card_plays: i32,
    pub special_effects: BTreeSet<String>,
    pub blocked_card_types: BTreeSet<UnitType>,
    pub ignore_terrain: BTreeSet<Terrain>,
    pub return_to_hand: bool,
    pub force_enemy_disadvantage: bool,
    pub untap_commander: bool,
    pub force_tap_enemy_commander: bool,
    pub amplify_enemy_climate: bool,
    pub cancel_enemy_card_max_cost: Option<u8>,
    pub ignore_climate: ClimateImmunity,
    pub forced_terrain: Option<Terrain>,
}

impl EffectResult {
    pub fn identity() -> Self {
        EffectResult::default()
    }

    pub fn is_identity(&self) -> bool {
        *self == EffectResult::default()
    }

    fn described(mut self, text: &str) -> Self {
        self.special_effects.insert(text.to_string());
        self
    }

    /// Monoid operation.
    pub fn merge(mut self, other: EffectResult) -> EffectResult {
        self.attack_modifier += other.attack_modifier;
        self.defense_modifier += other.defense_modifier;
        self.mobility_modifier += other.mobility_modifier;
        self.enemy_attack_modifier += other.enemy_attack_modifier;
        self.enemy_defense_modifier += other.enemy_defense_modifier;
        self.enemy_mobility_modifier += other.enemy_mobility_modifier;
        self.damage_reduction += other.damage_reduction;
        self.extra_damage_on_win += other.extra_damage_on_win;
        self.retaliation_damage += other.retaliation_damage;
        self.draw_cards += other.draw_cards;
        self.extra_card_plays += other.extra_card_plays;
        self.special_effects.extend(other.special_effects);
        self.blocked_card_types.extend(other.blocked_card_types);
        self.ignore_terrain.extend(other.ignore_terrain);
        self.return_to_hand |= other.return_to_hand;
        self.force_enemy_disadvantage |= other.force_enemy_disadvantage;
        self.untap_commander |= other.untap_commander;
        self.force_tap_enemy_commander |= other.force_tap_enemy_commander;
        self.amplify_enemy_climate |= other.amplify_enemy_climate;
        self.cancel_enemy_card_max_cost = match (self.cancel_enemy_card_max_cost, other.cancel_enemy_card_max_cost) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.ignore_climate = self.ignore_climate.max(other.ignore_climate);
        self.forced_terrain = match (self.forced_terrain, other.forced_terrain) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self
    }
}

impl std::iter::Sum for EffectResult {
    fn sum<I: Iterator<Item = EffectResult>>(iter: I) -> Self {
        iter.fold(EffectResult::default(), EffectResult::merge)
    }
}

/// Aggregate every result of a resolution window into one net result.
pub fn combine<I>(results: I) -> EffectResult
where
    I: IntoIterator<Item = EffectResult>,
{
    results.into_iter().sum()
}

// ── Registry ───────────────────────────────────────────────────────────

pub type EffectFn = fn(&Card, &GameContext) -> EffectResult;

/// Tag → resolver. Legality-only tags (`flexible_*`) have no entry and
/// resolve to the identity.
pub static EFFECT_REGISTRY: &[(EffectType, EffectFn)] = &[
    (EffectType::DamageReduction1, damage_reduction_1),
    (EffectType::DamageReduction2, damage_reduction_2),
    (EffectType::IgnoreClimateHeat, ignore_climate_heat),
    (EffectType::IgnoreClimateAll, ignore_climate_all),
    (EffectType::IgnoreTerrainDifficult, ignore_terrain_difficult),
    (EffectType::IgnoreTerrainAll, ignore_terrain_all),
    (EffectType::BonusOnTerrainUrban, bonus_on_terrain_urban),
    (EffectType::BonusOnTerrainForest, bonus_on_terrain_forest),
    (EffectType::BonusOnTerrainHills, bonus_on_terrain_hills),
    (EffectType::BonusOnTerrainOpen, bonus_on_terrain_open),
    (EffectType::BonusOnRiver, bonus_on_river),
    (EffectType::BonusInWinter, bonus_in_winter),
    (EffectType::BonusInSummer, bonus_in_summer),
    (EffectType::BonusWhenDefending, bonus_when_defending),
    (EffectType::BonusWhenAttacking, bonus_when_attacking),
    (EffectType::BonusWithInitiative, bonus_with_initiative),
    (EffectType::EnemyAttackMinus1, enemy_attack_minus_1),
    (EffectType::EnemyDefenseMinus1, enemy_defense_minus_1),
    (EffectType::EnemyMobilityMinus2, enemy_mobility_minus_2),
    (EffectType::ForceEnemyDisadvantage, force_enemy_disadvantage),
    (EffectType::ExtraDamageOnWin, extra_damage_on_win),
    (EffectType::CancelEnemyCard1, cancel_enemy_card_1),
    (EffectType::CancelEnemyCard2, cancel_enemy_card_2),
    (EffectType::UntapCommander, untap_commander),
    (EffectType::TapEnemyCommander, tap_enemy_commander),
    (EffectType::DoubleCardPerTap, double_card_per_tap),
    (EffectType::ReturnToHand, return_to_hand),
    (EffectType::DrawOnInitiative, draw_on_initiative),
    (EffectType::Retaliation, retaliation),
    (EffectType::BlockCavalry, block_cavalry),
    (EffectType::BlockRanged, block_ranged),
    (EffectType::AmplifyClimatePenalty, amplify_climate_penalty),
    (EffectType::ForceTerrainPlains, force_terrain_plains),
];

pub fn handler_for(tag: EffectType) -> Option<EffectFn> {
    EFFECT_REGISTRY.iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, f)| *f)
}

/// Resolve one card against a context. Pure and total.
pub fn resolve(card: &Card, ctx: &GameContext) -> EffectResult {
    card.effect_type
        .and_then(handler_for)
        .map_or_else(EffectResult::identity, |f| f(card, ctx))
}

// ── Handlers ───────────────────────────────────────────────────────────

fn damage_reduction_1(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { damage_reduction: 1, ..Default::default() }
        .described("Reduces incoming damage by 1")
}

fn damage_reduction_2(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { damage_reduction: 2, ..Default::default() }
        .described("Reduces incoming damage by 2")
}

fn ignore_climate_heat(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { ignore_climate: ClimateImmunity::Heat, ..Default::default() }
        .described("Ignores heat penalties")
}

fn ignore_climate_all(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { ignore_climate: ClimateImmunity::All, ..Default::default() }
        .described("Ignores all climate penalties")
}

fn ignore_terrain_difficult(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult {
        ignore_terrain: Terrain::DIFFICULT.into_iter().collect(),
        ..Default::default()
    }
    .described("Ignores difficult terrain")
}

fn ignore_terrain_all(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult {
        ignore_terrain: Terrain::ALL.into_iter().collect(),
        ..Default::default()
    }
    .described("Ignores all terrain penalties")
}

fn bonus_on_terrain_urban(_card: &Card, ctx: &GameContext) -> EffectResult {
    if ctx.terrain == Terrain::Urban || ctx.has_secondary(SecondaryTerrain::Cover) {
        EffectResult { attack_modifier: 1, defense_modifier: 1, ..Default::default() }
            .described("+1 attack and +1 defense in urban terrain or cover")
    } else {
        EffectResult::identity()
    }
}

fn bonus_on_terrain_forest(_card: &Card, ctx: &GameContext) -> EffectResult {
    if ctx.terrain == Terrain::Forest {
        EffectResult { attack_modifier: 2, ..Default::default() }
            .described("+2 attack in forest")
    } else {
        EffectResult::identity()
    }
}

fn bonus_on_terrain_hills(_card: &Card, ctx: &GameContext) -> EffectResult {
    if ctx.terrain == Terrain::Hills {
        EffectResult { defense_modifier: 1, mobility_modifier: 1, ..Default::default() }
            .described("+1 defense and +1 mobility on hills")
    } else {
        EffectResult::identity()
    }
}

fn bonus_on_terrain_open(_card: &Card, ctx: &GameContext) -> EffectResult {
    if matches!(ctx.terrain, Terrain::Plains | Terrain::Desert) {
        EffectResult { attack_modifier: 1, mobility_modifier: 1, ..Default::default() }
            .described("+1 attack and +1 mobility in open terrain")
    } else {
        EffectResult::identity()
    }
}

fn bonus_on_river(_card: &Card, ctx: &GameContext) -> EffectResult {
    if ctx.has_secondary(SecondaryTerrain::River) {
        EffectResult { defense_modifier: 2, ..Default::default() }
            .described("+2 defense holding a river line")
    } else {
        EffectResult::identity()
    }
}

fn bonus_in_winter(_card: &Card, ctx: &GameContext) -> EffectResult {
    if ctx.season == Season::Winter {
        EffectResult { attack_modifier: 1, defense_modifier: 1, ..Default::default() }
            .described("+1 attack and +1 defense in winter")
    } else {
        EffectResult::identity()
    }
}

fn bonus_in_summer(_card: &Card, ctx: &GameContext) -> EffectResult {
    if ctx.season == Season::Summer {
        EffectResult { attack_modifier: 1, ..Default::default() }
            .described("+1 attack in summer")
    } else {
        EffectResult::identity()
    }
}

fn bonus_when_defending(_card: &Card, ctx: &GameContext) -> EffectResult {
    if ctx.is_defending {
        EffectResult { defense_modifier: 2, ..Default::default() }
            .described("+2 defense while defending")
    } else {
        EffectResult::identity()
    }
}

fn bonus_when_attacking(_card: &Card, ctx: &GameContext) -> EffectResult {
    if !ctx.is_defending {
        EffectResult { attack_modifier: 2, ..Default::default() }
            .described("+2 attack while attacking")
    } else {
        EffectResult::identity()
    }
}

fn bonus_with_initiative(_card: &Card, ctx: &GameContext) -> EffectResult {
    if ctx.has_initiative {
        EffectResult { attack_modifier: 1, mobility_modifier: 1, ..Default::default() }
            .described("+1 attack and +1 mobility with initiative")
    } else {
        EffectResult::identity()
    }
}

fn enemy_attack_minus_1(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { enemy_attack_modifier: -1, ..Default::default() }
        .described("Enemy attack -1")
}

fn enemy_defense_minus_1(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { enemy_defense_modifier: -1, ..Default::default() }
        .described("Enemy defense -1")
}

fn enemy_mobility_minus_2(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { enemy_mobility_modifier: -2, ..Default::default() }
        .described("Enemy mobility -2")
}

fn force_enemy_disadvantage(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { force_enemy_disadvantage: true, ..Default::default() }
        .described("Enemy rolls with disadvantage")
}

fn extra_damage_on_win(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { extra_damage_on_win: 2, ..Default::default() }
        .described("+2 damage on a finishing blow")
}

fn cancel_enemy_card_1(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { cancel_enemy_card_max_cost: Some(1), ..Default::default() }
        .described("Cancels an enemy card costing up to 1")
}

fn cancel_enemy_card_2(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { cancel_enemy_card_max_cost: Some(2), ..Default::default() }
        .described("Cancels an enemy card costing up to 2")
}

fn untap_commander(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { untap_commander: true, ..Default::default() }
        .described("Untaps its commander")
}

fn tap_enemy_commander(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { force_tap_enemy_commander: true, ..Default::default() }
        .described("Taps an enemy commander")
}

fn double_card_per_tap(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { extra_card_plays: 1, ..Default::default() }
        .described("Its commander may issue one more card before tapping")
}

fn return_to_hand(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { return_to_hand: true, ..Default::default() }
        .described("Returns to hand at the end of the round")
}

fn draw_on_initiative(_card: &Card, ctx: &GameContext) -> EffectResult {
    if ctx.has_initiative {
        EffectResult { draw_cards: 1, ..Default::default() }
            .described("Draws a card with initiative")
    } else {
        EffectResult::identity()
    }
}

fn retaliation(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { retaliation_damage: 2, ..Default::default() }
        .described("Retaliates for 2 if struck this round")
}

fn block_cavalry(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult {
        blocked_card_types: [UnitType::Cavalry].into_iter().collect(),
        ..Default::default()
    }
    .described("Blocks enemy cavalry cards this round")
}

fn block_ranged(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult {
        blocked_card_types: [UnitType::Archer, UnitType::Siege].into_iter().collect(),
        ..Default::default()
    }
    .described("Blocks enemy archer and siege cards this round")
}

fn amplify_climate_penalty(_card: &Card, ctx: &GameContext) -> EffectResult {
    if ctx.climate != Climate::Temperate {
        EffectResult { amplify_enemy_climate: true, ..Default::default() }
            .described("Doubles the enemy's climate penalties")
    } else {
        EffectResult::identity()
    }
}

fn force_terrain_plains(_card: &Card, _ctx: &GameContext) -> EffectResult {
    EffectResult { forced_terrain: Some(Terrain::Plains), ..Default::default() }
        .described("Draws the battle onto open plains")
}
