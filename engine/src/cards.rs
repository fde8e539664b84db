// ═══════════════════════════════════════════════════════════════════════
// Card catalog and commander rosters — static data per culture
// ═══════════════════════════════════════════════════════════════════════

use crate::effects::EffectType;
use crate::types::*;

/// Catalog entry. Instantiated into a `Card` with a battle-unique id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardDef {
    pub name: &'static str,
    pub unit_type: Option<UnitType>,
    pub attack_bonus: i32,
    pub defense_bonus: i32,
    pub mobility_bonus: i32,
    pub command_required: u8,
    pub effect_type: Option<EffectType>,
    pub general_order: bool,
}

impl CardDef {
    pub fn instantiate(&self, id: CardId) -> Card {
        Card {
            id,
            name: self.name.to_string(),
            unit_type: self.unit_type,
            attack_bonus: self.attack_bonus,
            defense_bonus: self.defense_bonus,
            mobility_bonus: self.mobility_bonus,
            command_required: self.command_required,
            effect_type: self.effect_type,
            general_order: self.general_order,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommanderDef {
    pub name: &'static str,
    pub specialization: Option<UnitType>,
    pub command_base: u8,
    pub strategy: i32,
    pub guard: i32,
    pub is_general: bool,
}

impl CommanderDef {
    pub fn instantiate(&self, id: CommanderId) -> Commander {
        Commander {
            id,
            name: self.name.to_string(),
            specialization: self.specialization,
            command_base: self.command_base,
            command_free: self.command_base,
            strategy: self.strategy,
            guard: self.guard,
            is_general: self.is_general,
            tapped: false,
            spare_plays: 0,
        }
    }
}

fn card(
    name: &'static str,
    unit_type: Option<UnitType>,
    (attack_bonus, defense_bonus, mobility_bonus): (i32, i32, i32),
    command_required: u8,
    effect_type: Option<EffectType>,
) -> CardDef {
    CardDef {
        name,
        unit_type,
        attack_bonus,
        defense_bonus,
        mobility_bonus,
        command_required,
        effect_type,
        general_order: false,
    }
}

fn order(
    name: &'static str,
    stats: (i32, i32, i32),
    command_required: u8,
    effect_type: Option<EffectType>,
) -> CardDef {
    let mut def = card(name, None, stats, command_required, effect_type);
    def.general_order = true;
    def
}

const INF: Option<UnitType> = Some(UnitType::Infantry);
const CAV: Option<UnitType> = Some(UnitType::Cavalry);
const ARC: Option<UnitType> = Some(UnitType::Archer);
const SIE: Option<UnitType> = Some(UnitType::Siege);

// ── Cards ──────────────────────────────────────────────────────────────

pub fn culture_cards(culture: Culture) -> Vec<CardDef> {
    use EffectType::*;
    match culture {
        Culture::Imperial => vec![
            card("Shield Wall",        INF,  (1, 3, 0),  1, Some(DamageReduction1)),
            card("Legion Advance",     INF,  (3, 1, 0),  2, Some(BonusOnTerrainUrban)),
            card("Volley",             ARC,  (3, 0, 0),  2, Some(EnemyAttackMinus1)),
            card("Scorpion Battery",   ARC,  (4, 0, -1), 3, Some(ExtraDamageOnWin)),
            card("Testudo",            INF,  (0, 2, 0),  1, Some(BlockRanged)),
            card("Paved Roads",        None, (0, 0, 2),  1, Some(ForceTerrainPlains)),
            card("Disciplined Ranks",  INF,  (2, 1, 0),  1, Some(FlexibleCommand)),
            card("Veteran Centurion",  INF,  (2, 0, 0),  1, Some(DoubleCardPerTap)),
            card("Fortified Camp",     None, (0, 3, 0),  2, Some(BonusWhenDefending)),
            order("Imperial Decree",         (1, 1, 0),  2, Some(TapEnemyCommander)),
        ],
        Culture::Steppe => vec![
            card("Horse Archers",        ARC,  (2, 0, 2), 1, Some(BonusOnTerrainOpen)),
            card("Feigned Retreat",      CAV,  (1, 0, 2), 1, Some(ForceEnemyDisadvantage)),
            card("Lancer Charge",        CAV,  (4, 0, 1), 2, Some(BonusWhenAttacking)),
            card("Outriders",            CAV,  (1, 0, 3), 1, Some(DrawOnInitiative)),
            card("Sun-Hardened Riders",  CAV,  (2, 0, 1), 1, Some(IgnoreClimateHeat)),
            card("Encirclement",         CAV,  (2, 0, 0), 2, Some(EnemyMobilityMinus2)),
            card("Raid the Baggage",     None, (1, 0, 0), 1, Some(CancelEnemyCard1)),
            card("Wheeling Host",        INF,  (2, 0, 1), 1, Some(FlexibleMounted)),
            card("Steppe Wind",          None, (0, 0, 1), 1, Some(AmplifyClimatePenalty)),
            order("Khan's Command",            (2, 0, 0), 2, Some(BonusWithInitiative)),
        ],
        Culture::Highland => vec![
            card("Pike Square",      INF,  (1, 2, 0),  1, Some(BlockCavalry)),
            card("Mountain Ambush",  INF,  (3, 0, 0),  2, Some(IgnoreTerrainDifficult)),
            card("Highland Charge",  INF,  (4, 0, 0),  2, Some(ExtraDamageOnWin)),
            card("Trebuchet",        SIE,  (5, 0, -2), 3, None),
            card("Winter Clans",     INF,  (2, 1, 0),  1, Some(BonusInWinter)),
            card("Stone Ramparts",   SIE,  (0, 4, 0),  2, Some(DamageReduction2)),
            card("Blood Feud",       None, (1, 0, 0),  1, Some(Retaliation)),
            card("Hill Fort",        None, (0, 2, 0),  1, Some(BonusOnTerrainHills)),
            card("Sappers",          SIE,  (2, 0, 0),  2, Some(EnemyDefenseMinus1)),
            order("Chieftain's Oath",      (1, 1, 0),  1, Some(UntapCommander)),
        ],
        Culture::Sylvan => vec![
            card("Longbow Line",     ARC,  (3, 0, 0), 2, Some(BonusOnTerrainForest)),
            card("Hidden Paths",     None, (0, 0, 2), 1, Some(IgnoreTerrainAll)),
            card("Mist Walkers",     ARC,  (2, 0, 1), 1, Some(IgnoreClimateAll)),
            card("Thorn Barricade",  INF,  (0, 3, 0), 1, Some(BonusOnRiver)),
            card("Counterfire",      ARC,  (1, 0, 0), 1, Some(CancelEnemyCard2)),
            card("Wardens",          INF,  (2, 1, 0), 1, Some(ReturnToHand)),
            card("Snare",            None, (0, 0, 0), 1, Some(TapEnemyCommander)),
            card("Summer Hunt",      ARC,  (2, 0, 0), 1, Some(BonusInSummer)),
            card("Grove Sentinel",   INF,  (1, 2, 0), 2, Some(DamageReduction1)),
            order("Elder's Call",          (1, 0, 0), 2, Some(EnemyAttackMinus1)),
        ],
    }
}

// ── Commanders ─────────────────────────────────────────────────────────

/// Two specialists and one general per culture.
pub fn culture_roster(culture: Culture) -> Vec<CommanderDef> {
    let specialist = |name, spec, command_base, strategy, guard| CommanderDef {
        name,
        specialization: Some(spec),
        command_base,
        strategy,
        guard,
        is_general: false,
    };
    let general = |name, command_base, strategy, guard| CommanderDef {
        name,
        specialization: None,
        command_base,
        strategy,
        guard,
        is_general: true,
    };
    match culture {
        Culture::Imperial => vec![
            specialist("Legate Varro", UnitType::Infantry, 3, 1, 2),
            specialist("Sagittarius Nerva", UnitType::Archer, 3, 1, 1),
            general("General Aurelia", 2, 1, 1),
        ],
        Culture::Steppe => vec![
            specialist("Batu the Swift", UnitType::Cavalry, 4, 1, 0),
            specialist("Temur Longsight", UnitType::Archer, 3, 1, 1),
            general("Khan Ogedei", 2, 2, 0),
        ],
        Culture::Highland => vec![
            specialist("Fergus Redhand", UnitType::Infantry, 3, 1, 2),
            specialist("Brann Stonebreaker", UnitType::Siege, 3, 0, 1),
            general("Thane Mora", 2, 1, 2),
        ],
        Culture::Sylvan => vec![
            specialist("Ailin Greenshaft", UnitType::Archer, 3, 1, 1),
            specialist("Corrin Oakheart", UnitType::Infantry, 3, 0, 2),
            general("Lady Elowen", 2, 1, 1),
        ],
    }
}

/// Rough raw value of a culture's catalog, used by bots picking a faction.
pub fn catalog_strength(culture: Culture) -> i32 {
    let cards: i32 = culture_cards(culture).iter()
        .map(|c| c.attack_bonus + c.defense_bonus + c.mobility_bonus)
        .sum();
    let commanders: i32 = culture_roster(culture).iter()
        .map(|c| c.strategy + c.guard + c.command_base as i32)
        .sum();
    cards + commanders
}
