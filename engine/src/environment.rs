// ═══════════════════════════════════════════════════════════════════════
// Environmental penalties — climate and terrain tables
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::effects::EffectResult;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Penalty {
    pub attack: i32,
    pub mobility: i32,
}

impl Penalty {
    const NONE: Penalty = Penalty { attack: 0, mobility: 0 };

    fn scaled(self, factor: i32) -> Penalty {
        Penalty { attack: self.attack * factor, mobility: self.mobility * factor }
    }
}

impl std::ops::Add for Penalty {
    type Output = Penalty;
    fn add(self, rhs: Penalty) -> Penalty {
        Penalty { attack: self.attack + rhs.attack, mobility: self.mobility + rhs.mobility }
    }
}

/// Climate penalty for a card of the given affinity (`None` = neutral).
pub fn climate_penalty(climate: Climate, unit: Option<UnitType>) -> Penalty {
    match (climate, unit) {
        (Climate::Temperate, _) => Penalty::NONE,
        (Climate::Heat, _) => Penalty { attack: -1, mobility: -1 },
        (Climate::Cold, _) => Penalty { attack: 0, mobility: -1 },
        (Climate::Rain, Some(UnitType::Archer)) | (Climate::Rain, Some(UnitType::Siege)) => {
            Penalty { attack: -1, mobility: -1 }
        }
        (Climate::Rain, _) => Penalty { attack: 0, mobility: -1 },
        (Climate::Storm, _) => Penalty { attack: -1, mobility: -2 },
        (Climate::Fog, Some(UnitType::Archer)) => Penalty { attack: -2, mobility: 0 },
        (Climate::Fog, _) => Penalty { attack: -1, mobility: 0 },
    }
}

/// Terrain penalty for a card of the given affinity (`None` = neutral).
pub fn terrain_penalty(terrain: Terrain, unit: Option<UnitType>) -> Penalty {
    match (terrain, unit) {
        (Terrain::Forest, Some(UnitType::Cavalry)) => Penalty { attack: -1, mobility: -2 },
        (Terrain::Forest, Some(UnitType::Archer)) => Penalty { attack: -1, mobility: 0 },
        (Terrain::Forest, _) => Penalty { attack: 0, mobility: -1 },
        (Terrain::Swamp, Some(UnitType::Siege)) => Penalty { attack: -2, mobility: -2 },
        (Terrain::Swamp, _) => Penalty { attack: 0, mobility: -1 },
        (Terrain::Mountains, Some(UnitType::Cavalry)) | (Terrain::Mountains, Some(UnitType::Siege)) => {
            Penalty { attack: -2, mobility: -2 }
        }
        (Terrain::Mountains, _) => Penalty { attack: 0, mobility: -1 },
        (Terrain::Urban, Some(UnitType::Cavalry)) => Penalty { attack: -1, mobility: -1 },
        (Terrain::Hills, Some(UnitType::Siege)) => Penalty { attack: 0, mobility: -1 },
        (Terrain::Desert, _) => Penalty { attack: 0, mobility: -1 },
        (Terrain::Coast, Some(UnitType::Cavalry)) => Penalty { attack: 0, mobility: -1 },
        _ => Penalty::NONE,
    }
}

/// Penalty applied to a card, after the owner's immunities and the enemy's
/// amplification.
pub fn penalty_for(
    unit: Option<UnitType>,
    ctx: &GameContext,
    own: &EffectResult,
    enemy: &EffectResult,
) -> Penalty {
    let climate = if own.ignore_climate.covers(ctx.climate) {
        Penalty::NONE
    } else {
        let factor = if enemy.amplify_enemy_climate { 2 } else { 1 };
        climate_penalty(ctx.climate, unit).scaled(factor)
    };
    let terrain = if own.ignore_terrain.contains(&ctx.terrain) {
        Penalty::NONE
    } else {
        terrain_penalty(ctx.terrain, unit)
    };
    climate + terrain
}

/// Battlefield terrain after forced substitutions from either side's
/// window. Competing substitutions resolve to the lowest `Terrain`.
pub fn effective_terrain(state: &BattleState) -> Terrain {
    state.sides.iter()
        .flat_map(|c| c.active_window())
        .filter_map(|p| p.card.effect_type.and_then(|t| t.forced_terrain()))
        .min()
        .unwrap_or(state.environment.terrain)
}
