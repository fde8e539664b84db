// ═══════════════════════════════════════════════════════════════════════
// Agent Trait — interface every battle participant implements
//
// KEY DESIGN PRINCIPLE:
//   Agents receive a `PlayerView` (not raw BattleState), which only
//   contains information the side is legally allowed to see.
//   This enforces information hiding at the type level.
//
//   The agent never gets to see:
//     - The opponent's hand
//     - The opponent's sealed bid before bids resolve
//     - Deck ordering
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use warband_engine::engine::Action;
use warband_engine::types::*;
use warband_engine::visibility::PlayerView;

/// What an agent wants to do on its turn in the actions phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Index into the viewer's hand.
    PlayCard { card_index: usize, commander_id: CommanderId },
    Pass,
}

impl Decision {
    /// Translate into an engine action. A stale card index becomes a pass.
    pub fn into_action(self, view: &PlayerView) -> Action {
        match self {
            Decision::PlayCard { card_index, commander_id } => match view.my_hand.get(card_index) {
                Some(card) => Action::PlayCard { card_id: card.id, commander_id },
                None => Action::Pass,
            },
            Decision::Pass => Action::Pass,
        }
    }
}

/// Trait that all agents must implement.
pub trait Agent: Send + Sync {
    /// Human-readable name (e.g. "Bot (hard)").
    fn name(&self) -> &str;

    /// The side this agent is playing.
    fn side(&self) -> Side;

    /// Universal entry point: pick the action for the current view.
    /// Outside the agent's own turn the only useful move is to advance.
    fn decide(&mut self, view: &PlayerView) -> Action {
        match view.phase {
            Phase::PreCombat if view.me.bid.is_none() => Action::Bid(self.choose_bid(view)),
            Phase::Actions if view.is_my_turn() => self.choose_play(view).into_action(view),
            _ => Action::AdvancePhase,
        }
    }

    // ── Individual decision methods ────────────────────────────────────

    /// Card play or pass for the actions phase.
    fn choose_play(&mut self, view: &PlayerView) -> Decision;

    /// Sealed initiative bid, at most `view.config.max_bid`.
    fn choose_bid(&mut self, view: &PlayerView) -> u8;

    /// Pick a culture before the battle is created.
    fn choose_culture(&mut self, cultures: &[Culture]) -> Culture;
}
