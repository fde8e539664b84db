// ═══════════════════════════════════════════════════════════════════════
// Visibility / Information Model
//
//   PUBLIC  — hit points, both resolution windows, discard piles, every
//             commander's pool, guard and tap state, hand and deck sizes
//   PRIVATE — the viewer's own hand, and its bid until bids resolve
//   HIDDEN  — deck order, the opponent's hand
//
// Agents MUST only receive PlayerView, never the raw BattleState.
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::combat::{self, Strike, StrikeInputs};
use crate::config::EngineConfig;
use crate::effects;
use crate::engine;
use crate::types::*;

/// What anyone at the table can see of one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideView {
    pub side: Side,
    pub culture: Culture,
    pub hp: i32,
    pub passed: bool,
    pub hand_size: usize,
    pub deck_size: usize,
    pub in_play: Vec<PlayedCard>,
    pub discard: Vec<Card>,
    pub commanders: Vec<Commander>,
    pub damage_dealt_this_round: i32,
    pub mobility_this_round: i32,
    /// Only set for the viewer's own side, or for both once bids resolve.
    pub bid: Option<u8>,
}

impl SideView {
    fn of(c: &Combatant, show_bid: bool) -> Self {
        SideView {
            side: c.side,
            culture: c.culture,
            hp: c.hp,
            passed: c.passed,
            hand_size: c.hand.len(),
            deck_size: c.deck.len(),
            in_play: c.in_play.clone(),
            discard: c.discard.clone(),
            commanders: c.commanders.clone(),
            damage_dealt_this_round: c.damage_dealt_this_round,
            mobility_this_round: c.mobility_this_round,
            bid: if show_bid { c.bid } else { None },
        }
    }

    pub fn active_window(&self) -> impl Iterator<Item = &Card> {
        self.in_play.iter().filter(|p| !p.cancelled).map(|p| &p.card)
    }

    pub fn commander(&self, id: CommanderId) -> Option<&Commander> {
        self.commanders.iter().find(|c| c.id == id)
    }

    pub fn standing_guard(&self) -> i32 {
        self.commanders.iter()
            .filter(|c| !c.tapped)
            .map(|c| c.guard)
            .max()
            .unwrap_or(0)
            .max(0)
    }
}

/// A (card, commander) pair the viewer may submit right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalPlay {
    pub card_index: usize,
    pub card_id: CardId,
    pub commander_id: CommanderId,
}

/// The view of the battle a specific side is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub viewer: Side,
    pub round: u32,
    pub phase: Phase,
    pub active_side: Side,
    pub initiative: Side,
    pub environment: Environment,
    /// Terrain after forced substitutions.
    pub terrain: Terrain,
    pub config: EngineConfig,
    pub action_seq: u64,
    pub final_round: bool,
    pub outcome: Option<Outcome>,

    pub me: SideView,
    pub opponent: SideView,
    pub log: Vec<LogEntry>,

    // ── Private info (only for the viewer) ─────────────────
    pub my_hand: Vec<Card>,
}

/// Build the PlayerView for one side.
pub fn player_view(state: &BattleState, viewer: Side) -> PlayerView {
    let bids_public = state.phase != Phase::PreCombat;
    PlayerView {
        viewer,
        round: state.round,
        phase: state.phase,
        active_side: state.active_side,
        initiative: state.initiative,
        environment: state.environment.clone(),
        terrain: crate::environment::effective_terrain(state),
        config: state.config.clone(),
        action_seq: state.action_seq,
        final_round: state.final_round,
        outcome: state.outcome,
        me: SideView::of(state.side(viewer), true),
        opponent: SideView::of(state.side(viewer.opponent()), bids_public),
        log: state.log.iter().cloned().collect(),
        my_hand: state.side(viewer).hand.clone(),
    }
}

impl PlayerView {
    pub fn is_my_turn(&self) -> bool {
        self.phase == Phase::Actions && self.active_side == self.viewer && !self.me.passed
    }

    pub fn side(&self, side: Side) -> &SideView {
        if side == self.viewer { &self.me } else { &self.opponent }
    }

    /// Same context the engine builds for `side` at this moment.
    pub fn context_for(&self, side: Side) -> GameContext {
        GameContext {
            terrain: self.terrain,
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

    /// Unit types the opponent's window blocks for the viewer.
    pub fn blocked_types(&self) -> BTreeSet<UnitType> {
        let ctx = self.context_for(self.opponent.side);
        effects::combine(self.opponent.active_window().map(|c| effects::resolve(c, &ctx)))
            .blocked_card_types
    }

    /// Every play the engine would accept from the viewer right now, in
    /// hand order then commander order.
    pub fn legal_plays(&self) -> Vec<LegalPlay> {
        if !self.is_my_turn() {
            return Vec::new();
        }
        let blocked = self.blocked_types();
        let mut plays = Vec::new();
        for (card_index, card) in self.my_hand.iter().enumerate() {
            for commander in &self.me.commanders {
                if engine::check_issue(card, commander, &blocked).is_ok() {
                    plays.push(LegalPlay { card_index, card_id: card.id, commander_id: commander.id });
                }
            }
        }
        plays
    }

    /// Expected result of a play at the mean roll. `None` when the card or
    /// commander is not the viewer's.
    pub fn preview(&self, card_id: CardId, commander_id: CommanderId) -> Option<Strike> {
        let card = self.my_hand.iter().find(|c| c.id == card_id)?;
        let commander = self.me.commander(commander_id)?;
        let inputs = StrikeInputs {
            card,
            commander,
            own_window: self.me.active_window().collect(),
            enemy_window: self.opponent.active_window().collect(),
            own_ctx: self.context_for(self.viewer),
            enemy_ctx: self.context_for(self.opponent.side),
            enemy_guard: self.opponent.standing_guard(),
            enemy_hp: self.opponent.hp,
        };
        Some(combat::preview_damage(&inputs, &self.config))
    }
}
