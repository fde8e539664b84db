// ═══════════════════════════════════════════════════════════════════════
// Core types — battle data model shared by every engine module
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::effects::EffectType;

// ── Enums ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Attacker, Side::Defender];

    pub fn opponent(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Attacker => 0,
            Side::Defender => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Attacker => write!(f, "Attacker"),
            Side::Defender => write!(f, "Defender"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum UnitType {
    Infantry,
    Cavalry,
    Archer,
    Siege,
}

impl UnitType {
    pub const ALL: [UnitType; 4] = [
        UnitType::Infantry,
        UnitType::Cavalry,
        UnitType::Archer,
        UnitType::Siege,
    ];
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitType::Infantry => write!(f, "Infantry"),
            UnitType::Cavalry => write!(f, "Cavalry"),
            UnitType::Archer => write!(f, "Archer"),
            UnitType::Siege => write!(f, "Siege"),
        }
    }
}

/// Primary terrain of the battlefield. The serialized names are the ones
/// the surrounding app stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum Terrain {
    #[serde(rename = "Llanura")]
    Plains,
    #[serde(rename = "Bosque")]
    Forest,
    #[serde(rename = "Colinas")]
    Hills,
    #[serde(rename = "Montaña")]
    Mountains,
    #[serde(rename = "Urbano")]
    Urban,
    #[serde(rename = "Pantano")]
    Swamp,
    #[serde(rename = "Desierto")]
    Desert,
    #[serde(rename = "Costa")]
    Coast,
}

impl Terrain {
    pub const ALL: [Terrain; 8] = [
        Terrain::Plains,
        Terrain::Forest,
        Terrain::Hills,
        Terrain::Mountains,
        Terrain::Urban,
        Terrain::Swamp,
        Terrain::Desert,
        Terrain::Coast,
    ];

    /// Terrain that slows troops down; what "ignore difficult terrain" covers.
    pub const DIFFICULT: [Terrain; 3] = [Terrain::Forest, Terrain::Swamp, Terrain::Mountains];

    pub fn external_name(self) -> &'static str {
        match self {
            Terrain::Plains => "Llanura",
            Terrain::Forest => "Bosque",
            Terrain::Hills => "Colinas",
            Terrain::Mountains => "Montaña",
            Terrain::Urban => "Urbano",
            Terrain::Swamp => "Pantano",
            Terrain::Desert => "Desierto",
            Terrain::Coast => "Costa",
        }
    }

    /// Accepts the stored name or the English variant name, case-insensitive.
    pub fn from_name(name: &str) -> Option<Terrain> {
        let name = name.trim();
        Terrain::ALL.into_iter().find(|t| {
            t.external_name().eq_ignore_ascii_case(name)
                || format!("{:?}", t).eq_ignore_ascii_case(name)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum SecondaryTerrain {
    #[serde(rename = "Cobertura")]
    Cover,
    #[serde(rename = "Río")]
    River,
    #[serde(rename = "Camino")]
    Road,
    #[serde(rename = "Fortificación")]
    Fortification,
    #[serde(rename = "Ruinas")]
    Ruins,
}

impl SecondaryTerrain {
    pub const ALL: [SecondaryTerrain; 5] = [
        SecondaryTerrain::Cover,
        SecondaryTerrain::River,
        SecondaryTerrain::Road,
        SecondaryTerrain::Fortification,
        SecondaryTerrain::Ruins,
    ];

    pub fn external_name(self) -> &'static str {
        match self {
            SecondaryTerrain::Cover => "Cobertura",
            SecondaryTerrain::River => "Río",
            SecondaryTerrain::Road => "Camino",
            SecondaryTerrain::Fortification => "Fortificación",
            SecondaryTerrain::Ruins => "Ruinas",
        }
    }

    pub fn from_name(name: &str) -> Option<SecondaryTerrain> {
        let name = name.trim();
        SecondaryTerrain::ALL.into_iter().find(|t| {
            t.external_name().eq_ignore_ascii_case(name)
                || format!("{:?}", t).eq_ignore_ascii_case(name)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Climate {
    Temperate,
    Heat,
    Cold,
    Rain,
    Storm,
    Fog,
}

impl Climate {
    pub const ALL: [Climate; 6] = [
        Climate::Temperate,
        Climate::Heat,
        Climate::Cold,
        Climate::Rain,
        Climate::Storm,
        Climate::Fog,
    ];

    pub fn from_name(name: &str) -> Option<Climate> {
        let name = name.trim();
        Climate::ALL.into_iter().find(|c| format!("{:?}", c).eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn from_name(name: &str) -> Option<Season> {
        let name = name.trim();
        Season::ALL.into_iter().find(|s| format!("{:?}", s).eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    PreCombat,
    Deployment,
    Initiative,
    Actions,
    Resolve,
    EndRound,
    Finished,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::PreCombat => "pre_combat",
            Phase::Deployment => "deployment",
            Phase::Initiative => "initiative",
            Phase::Actions => "actions",
            Phase::Resolve => "resolve",
            Phase::EndRound => "end_round",
            Phase::Finished => "finished",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Culture {
    Imperial,
    Steppe,
    Highland,
    Sylvan,
}

impl Culture {
    pub const ALL: [Culture; 4] = [
        Culture::Imperial,
        Culture::Steppe,
        Culture::Highland,
        Culture::Sylvan,
    ];

    pub fn from_name(name: &str) -> Option<Culture> {
        let name = name.trim();
        Culture::ALL.into_iter().find(|c| format!("{:?}", c).eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Culture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ── Identifiers ────────────────────────────────────────────────────────

/// Card instance id, unique within one battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct CardId(pub u16);

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Commander id, unique within one battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct CommanderId(pub u8);

impl std::fmt::Display for CommanderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", self.0)
    }
}

// ── Card ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    /// `None` = neutral, any specialist may play it.
    pub unit_type: Option<UnitType>,
    #[serde(default)]
    pub attack_bonus: i32,
    #[serde(default)]
    pub defense_bonus: i32,
    #[serde(default)]
    pub mobility_bonus: i32,
    #[serde(default)]
    pub command_required: u8,
    #[serde(default)]
    pub effect_type: Option<EffectType>,
    /// General-only orders, paid from the general pool.
    #[serde(default)]
    pub general_order: bool,
}

impl Card {
    /// Whether `commander` is allowed to issue this card, ignoring cost and tap state.
    pub fn commandable_by(&self, commander: &Commander) -> bool {
        if self.general_order || commander.is_general {
            return self.general_order && commander.is_general;
        }
        let Some(unit_type) = self.unit_type else {
            return true;
        };
        if commander.specialization == Some(unit_type) {
            return true;
        }
        match self.effect_type {
            Some(EffectType::FlexibleCommand) => true,
            Some(EffectType::FlexibleMounted) => {
                matches!(unit_type, UnitType::Infantry | UnitType::Cavalry)
                    && matches!(
                        commander.specialization,
                        Some(UnitType::Infantry) | Some(UnitType::Cavalry)
                    )
            }
            _ => false,
        }
    }
}

// ── Commander ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commander {
    pub id: CommanderId,
    pub name: String,
    /// `None` only for the general.
    pub specialization: Option<UnitType>,
    pub command_base: u8,  // 1–6
    pub command_free: u8,  // 0..=command_base; for the general this is the general pool
    pub strategy: i32,
    pub guard: i32,
    pub is_general: bool,
    pub tapped: bool,
    /// Plays left before this commander taps (double-card-per-tap allowances).
    pub spare_plays: u8,
}

// ── Environment & context ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub terrain: Terrain,
    #[serde(default)]
    pub secondary_terrain: Vec<SecondaryTerrain>,
    pub climate: Climate,
    pub season: Season,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            terrain: Terrain::Plains,
            secondary_terrain: Vec::new(),
            climate: Climate::Temperate,
            season: Season::Summer,
        }
    }
}

/// Read-only snapshot handed to the effect resolver. Built fresh for every
/// resolution, from the point of view of the card's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    pub terrain: Terrain,
    pub secondary_terrain: Vec<SecondaryTerrain>,
    pub climate: Climate,
    pub season: Season,
    pub is_defending: bool,
    pub has_initiative: bool,
    pub round: u32,
    pub phase: Phase,
    pub own_damage_this_round: i32,
    pub enemy_damage_this_round: i32,
}

impl GameContext {
    pub fn has_secondary(&self, marker: SecondaryTerrain) -> bool {
        self.secondary_terrain.contains(&marker)
    }
}

// ── Combatant (one side) ───────────────────────────────────────────────

/// A card sitting in a side's resolution window for the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedCard {
    pub card: Card,
    pub commander: CommanderId,
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub side: Side,
    pub culture: Culture,
    pub hand: Vec<Card>,        // PRIVATE
    pub deck: Vec<Card>,        // HIDDEN, draw from front
    pub in_play: Vec<PlayedCard>,
    pub discard: Vec<Card>,     // PUBLIC
    pub commanders: Vec<Commander>,
    pub hp: i32,                // 0–100
    pub passed: bool,
    pub damage_dealt_this_round: i32,
    pub mobility_this_round: i32,
    pub bid: Option<u8>,
}

impl Combatant {
    pub fn commander(&self, id: CommanderId) -> Option<&Commander> {
        self.commanders.iter().find(|c| c.id == id)
    }

    pub fn commander_mut(&mut self, id: CommanderId) -> Option<&mut Commander> {
        self.commanders.iter_mut().find(|c| c.id == id)
    }

    pub fn general(&self) -> Option<&Commander> {
        self.commanders.iter().find(|c| c.is_general)
    }

    /// The shared general command pool.
    pub fn general_pool(&self) -> u8 {
        self.general().map_or(0, |g| g.command_free)
    }

    pub fn hand_position(&self, id: CardId) -> Option<usize> {
        self.hand.iter().position(|c| c.id == id)
    }

    /// Non-cancelled cards of this round's resolution window.
    pub fn active_window(&self) -> impl Iterator<Item = &PlayedCard> {
        self.in_play.iter().filter(|p| !p.cancelled)
    }

    /// Highest guard among untapped commanders.
    pub fn standing_guard(&self) -> i32 {
        self.commanders.iter()
            .filter(|c| !c.tapped)
            .map(|c| c.guard)
            .max()
            .unwrap_or(0)
            .max(0)
    }

    pub fn draw(&mut self, count: usize) -> usize {
        let n = count.min(self.deck.len());
        let drawn: Vec<Card> = self.deck.drain(..n).collect();
        self.hand.extend(drawn);
        n
    }
}

// ── Battle log ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub round: u32,
    pub phase: Phase,
    /// `None` for engine-driven entries (retaliation, round end, ...).
    pub actor: Option<Side>,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Victory(Side),
    Draw,
}

impl Outcome {
    pub fn winner(self) -> Option<Side> {
        match self {
            Outcome::Victory(side) => Some(side),
            Outcome::Draw => None,
        }
    }
}

// ── Battle State ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    pub round: u32,
    pub phase: Phase,
    /// Side allowed to play in the `Actions` phase.
    pub active_side: Side,
    pub initiative: Side,
    /// Indexed by `Side::index()`.
    pub sides: [Combatant; 2],
    pub environment: Environment,
    pub config: crate::config::EngineConfig,
    pub log: VecDeque<LogEntry>,
    /// Number of accepted actions; remote authorities use it to order submissions.
    pub action_seq: u64,
    /// Set when exhaustion or the round limit is reached in `EndRound`.
    pub final_round: bool,

    // Deterministic RNG
    pub seed: u64,
    pub rng_counter: u64,

    pub outcome: Option<Outcome>,
}

impl BattleState {
    pub fn side(&self, side: Side) -> &Combatant {
        &self.sides[side.index()]
    }

    pub fn side_mut(&mut self, side: Side) -> &mut Combatant {
        &mut self.sides[side.index()]
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn winner(&self) -> Option<Side> {
        self.outcome.and_then(Outcome::winner)
    }

    pub fn push_log(&mut self, actor: Option<Side>, summary: impl Into<String>) {
        let entry = LogEntry {
            round: self.round,
            phase: self.phase,
            actor,
            summary: summary.into(),
        };
        self.log.push_back(entry);
        while self.log.len() > self.config.log_capacity.max(1) {
            self.log.pop_front();
        }
    }

    /// Context for resolving a card owned by `side`.
    pub fn context_for(&self, side: Side) -> GameContext {
        GameContext {
            terrain: crate::environment::effective_terrain(self),
            secondary_terrain: self.environment.secondary_terrain.clone(),
            climate: self.environment.climate,
            season: self.environment.season,
            is_defending: side == Side::Defender,
            has_initiative: self.initiative == side,
            round: self.round,
            phase: self.phase,
            own_damage_this_round: self.side(side).damage_dealt_this_round,
            enemy_damage_this_round: self.side(side.opponent()).damage_dealt_this_round,
        }
    }

    /// Panics when a rule invariant is broken. None of the documented rules
    /// can produce such a state, so a failure here is an engine bug.
    pub fn check_invariants(&self) {
        for combatant in &self.sides {
            assert!(
                (0..=crate::config::MAX_HP).contains(&combatant.hp),
                "EngineInvariantViolation: {} hp {} outside [0, {}]",
                combatant.side, combatant.hp, crate::config::MAX_HP
            );
            let generals = combatant.commanders.iter().filter(|c| c.is_general).count();
            assert_eq!(
                generals, 1,
                "EngineInvariantViolation: {} has {} generals", combatant.side, generals
            );
            for c in &combatant.commanders {
                assert!(
                    (1..=crate::config::MAX_COMMAND_BASE).contains(&c.command_base),
                    "EngineInvariantViolation: {} command_base {} outside [1, {}]",
                    c.name, c.command_base, crate::config::MAX_COMMAND_BASE
                );
                assert!(
                    c.command_free <= c.command_base,
                    "EngineInvariantViolation: {} command_free {} exceeds base {}",
                    c.name, c.command_free, c.command_base
                );
            }
        }
        if self.sides.iter().any(|c| c.hp == 0) {
            assert!(
                self.phase == Phase::Finished,
                "EngineInvariantViolation: a side is at 0 hp but the battle is in {}",
                self.phase
            );
        }
    }
}
