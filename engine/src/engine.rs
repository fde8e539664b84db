// ═══════════════════════════════════════════════════════════════════════
// Battle Engine — action validation and resolution
//
// Architecture:
//   The engine is a pure state machine. It never does I/O, never sleeps
//   and never calls agents. Callers submit an `Action` for a `Side`; the
//   engine validates it against the current state, and only then mutates.
//
// Flow:
//   1. Caller (runner, tournament, session layer) builds a PlayerView
//   2. The side's agent picks an Action
//   3. `apply_action(state, side, action)` → Ok(outcome) or Err(reason)
//   4. Repeat until state.phase == Finished
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::combat::{self, RollSource, StrikeInputs};
use crate::command;
use crate::effects;
use crate::error::{ActionError, IllegalReason};
use crate::phase;
use crate::types::*;

/// Actions a side can submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Issue a card from hand through one of the side's commanders.
    PlayCard { card_id: CardId, commander_id: CommanderId },

    /// Stop playing for the rest of the round.
    Pass,

    /// Move to the next phase.
    AdvancePhase,

    /// Move to a named phase; rejected unless it is the next one.
    AdvanceTo(Phase),

    /// Pre-combat initiative bid.
    Bid(u8),
}

/// Action tagged with the sequence number the sender believed current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub side: Side,
    pub seq: u64,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Played {
        card: CardId,
        roll: i32,
        damage: i32,
        /// Enemy card knocked out of the window by this play.
        cancelled: Option<CardId>,
        drawn: usize,
    },
    Passed,
    Advanced(Phase),
    BidPlaced(u8),
}

// ── Entry points ───────────────────────────────────────────────────────

/// Apply an action with rolls derived from the battle seed.
pub fn apply_action(state: &mut BattleState, side: Side, action: Action) -> Result<ActionOutcome, ActionError> {
    let mut roller = combat::state_rolls(state);
    apply_action_with(state, side, action, &mut roller)
}

/// Apply an action with an explicit roll source.
pub fn apply_action_with(
    state: &mut BattleState,
    side: Side,
    action: Action,
    roller: &mut dyn RollSource,
) -> Result<ActionOutcome, ActionError> {
    let outcome = match &action {
        Action::PlayCard { card_id, commander_id } => play_card(state, side, *card_id, *commander_id, roller)?,
        Action::Pass => pass(state, side)?,
        Action::AdvancePhase => advance(state, side, None)?,
        Action::AdvanceTo(target) => advance(state, side, Some(*target))?,
        Action::Bid(amount) => bid(state, side, *amount)?,
    };
    state.action_seq += 1;
    debug!(seq = state.action_seq, %side, ?action, round = state.round, phase = %state.phase, "action accepted");
    state.check_invariants();
    Ok(outcome)
}

/// Apply a submission from a remote authority, rejecting stale or
/// duplicated sequence numbers.
pub fn apply_submission(state: &mut BattleState, submission: Submission) -> Result<ActionOutcome, ActionError> {
    if submission.seq != state.action_seq {
        warn!(expected = state.action_seq, got = submission.seq, side = %submission.side, "out-of-order submission");
        return Err(ActionError::OutOfOrder { expected: state.action_seq, got: submission.seq });
    }
    apply_action(state, submission.side, submission.action)
}

/// Replace the battlefield conditions. Only between rounds or before the
/// first round starts.
pub fn set_environment(state: &mut BattleState, environment: Environment) -> Result<(), ActionError> {
    let allowed = matches!(state.phase, Phase::PreCombat | Phase::Deployment | Phase::EndRound);
    if !allowed {
        return Err(ActionError::illegal(IllegalReason::WrongPhase(state.phase)));
    }
    let summary = format!(
        "Conditions change: {}, {:?}, {:?}",
        environment.terrain.external_name(),
        environment.climate,
        environment.season
    );
    state.environment = environment;
    state.push_log(None, summary);
    Ok(())
}

// ── Validation ─────────────────────────────────────────────────────────

/// Whether `commander` may issue `card` now: tap state, specialization,
/// blocked categories and cost. Turn and phase are checked separately.
pub fn check_issue(card: &Card, commander: &Commander, blocked: &BTreeSet<UnitType>) -> Result<(), ActionError> {
    if commander.tapped {
        return Err(ActionError::illegal(IllegalReason::CommanderTapped(commander.id)));
    }
    if !card.commandable_by(commander) {
        return Err(ActionError::illegal(IllegalReason::SpecializationMismatch {
            card: card.id,
            commander: commander.id,
        }));
    }
    if let Some(unit) = card.unit_type.filter(|u| blocked.contains(u)) {
        return Err(ActionError::illegal(IllegalReason::CardTypeBlocked(unit)));
    }
    if !command::can_afford(commander, card.command_required) {
        return Err(ActionError::InsufficientCommand {
            required: card.command_required,
            available: commander.command_free,
        });
    }
    Ok(())
}

fn check_turn(state: &BattleState, side: Side) -> Result<(), ActionError> {
    if state.phase != Phase::Actions {
        return Err(ActionError::illegal(IllegalReason::WrongPhase(state.phase)));
    }
    if state.side(side).passed {
        return Err(ActionError::illegal(IllegalReason::AlreadyPassed));
    }
    if state.active_side != side {
        return Err(ActionError::illegal(IllegalReason::NotYourTurn { active: state.active_side }));
    }
    Ok(())
}

/// Unit types `side` cannot play because of the opponent's window.
pub fn blocked_for(state: &BattleState, side: Side) -> BTreeSet<UnitType> {
    let enemy = side.opponent();
    let ctx = state.context_for(enemy);
    effects::combine(state.side(enemy).active_window().map(|p| effects::resolve(&p.card, &ctx)))
        .blocked_card_types
}

// ── Handlers ───────────────────────────────────────────────────────────

fn play_card(
    state: &mut BattleState,
    side: Side,
    card_id: CardId,
    commander_id: CommanderId,
    roller: &mut dyn RollSource,
) -> Result<ActionOutcome, ActionError> {
    check_turn(state, side)?;
    let own = state.side(side);
    let hand_pos = own.hand_position(card_id).ok_or(ActionError::UnknownCard(card_id))?;
    let card = own.hand[hand_pos].clone();
    let commander = own.commander(commander_id).cloned().ok_or(ActionError::UnknownCommander(commander_id))?;
    check_issue(&card, &commander, &blocked_for(state, side))?;

    // Validated; from here on the play happens.
    let enemy_side = side.opponent();
    let card_effect = effects::resolve(&card, &state.context_for(side));

    let cancelled = card_effect.cancel_enemy_card_max_cost
        .and_then(|max_cost| cancel_latest(state.side_mut(enemy_side), max_cost));

    let strike = {
        let inputs = StrikeInputs::gather(state, side, &card, &commander);
        let roll = combat::roll_damage(roller, &state.config, inputs.at_disadvantage());
        combat::strike(&inputs, roll)
    };
    state.rng_counter += 1;

    let own = state.side_mut(side);
    if let Some(m) = own.commander_mut(commander_id) {
        command::spend(m, card.command_required)?;
        command::commit_play(m, card_effect.extra_card_plays, card_effect.untap_commander);
    }
    own.hand.remove(hand_pos);
    own.in_play.push(PlayedCard { card: card.clone(), commander: commander_id, cancelled: false });
    own.damage_dealt_this_round += strike.damage;
    own.mobility_this_round += strike.mobility;
    let drawn = own.draw(usize::try_from(card_effect.draw_cards.max(0)).unwrap_or(0));

    let enemy = state.side_mut(enemy_side);
    let hp = combat::apply_damage(&mut enemy.hp, strike.damage);
    enemy.mobility_this_round += strike.enemy_mobility;
    let tapped = if card_effect.force_tap_enemy_commander {
        command::force_tap_target(&enemy.commanders)
    } else {
        None
    };
    if let Some(target) = tapped.and_then(|id| enemy.commander_mut(id)) {
        target.tapped = true;
    }

    let mut summary = format!(
        "{} plays {} via {}: roll {}, attack {} vs defense {}, {} damage ({} at {} hp)",
        side, card.name, commander.name, strike.roll, strike.attack, strike.defense,
        strike.damage, enemy_side, hp
    );
    if let Some(id) = cancelled {
        summary.push_str(&format!(", cancels {}", id));
    }
    if let Some(id) = tapped {
        summary.push_str(&format!(", taps {}", id));
    }
    if drawn > 0 {
        summary.push_str(&format!(", draws {}", drawn));
    }
    state.push_log(Some(side), summary);

    if !phase::check_termination(state) && !state.side(enemy_side).passed {
        state.active_side = enemy_side;
    }

    Ok(ActionOutcome::Played { card: card.id, roll: strike.roll, damage: strike.damage, cancelled, drawn })
}

/// Cancel the opponent's most recent live card costing at most `max_cost`.
fn cancel_latest(enemy: &mut Combatant, max_cost: u8) -> Option<CardId> {
    let target = enemy.in_play.iter_mut()
        .rev()
        .find(|p| !p.cancelled && p.card.command_required <= max_cost)?;
    target.cancelled = true;
    Some(target.card.id)
}

fn pass(state: &mut BattleState, side: Side) -> Result<ActionOutcome, ActionError> {
    check_turn(state, side)?;
    state.side_mut(side).passed = true;
    if !state.side(side.opponent()).passed {
        state.active_side = side.opponent();
    }
    state.push_log(Some(side), format!("{} passes", side));
    Ok(ActionOutcome::Passed)
}

fn advance(state: &mut BattleState, side: Side, target: Option<Phase>) -> Result<ActionOutcome, ActionError> {
    let from = state.phase;
    let now = phase::advance_phase(state, target)?;
    debug!(%side, %from, to = %now, "phase advanced");
    Ok(ActionOutcome::Advanced(now))
}

fn bid(state: &mut BattleState, side: Side, amount: u8) -> Result<ActionOutcome, ActionError> {
    if state.phase != Phase::PreCombat {
        return Err(ActionError::illegal(IllegalReason::WrongPhase(state.phase)));
    }
    if state.side(side).bid.is_some() {
        return Err(ActionError::illegal(IllegalReason::AlreadyBid));
    }
    let max = state.config.max_bid;
    if amount > max {
        return Err(ActionError::illegal(IllegalReason::BidOutOfRange { max }));
    }
    state.side_mut(side).bid = Some(amount);
    state.push_log(Some(side), format!("{} places a sealed bid", side));
    Ok(ActionOutcome::BidPlaced(amount))
}
