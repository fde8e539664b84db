// ═══════════════════════════════════════════════════════════════════════
// Battle state machine — phase order, entry/exit hooks, termination
//
//   PreCombat → Deployment → Initiative → Actions → Resolve → EndRound
//                                ↑                                │
//                                └──────── round + 1 ─────────────┘
//
// Phases only move on an explicit advance. `Finished` is terminal and can
// be reached from any phase as soon as a side drops to 0 hp.
// ═══════════════════════════════════════════════════════════════════════

use tracing::info;

use crate::combat;
use crate::command;
use crate::error::ActionError;
use crate::types::*;

impl Phase {
    /// The only legal successor. `None` for `Finished`.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::PreCombat => Some(Phase::Deployment),
            Phase::Deployment => Some(Phase::Initiative),
            Phase::Initiative => Some(Phase::Actions),
            Phase::Actions => Some(Phase::Resolve),
            Phase::Resolve => Some(Phase::EndRound),
            Phase::EndRound => Some(Phase::Initiative),
            Phase::Finished => None,
        }
    }
}

/// Check an advance request without touching the state.
pub fn validate_advance(state: &BattleState, requested: Option<Phase>) -> Result<Phase, ActionError> {
    let from = state.phase;
    let Some(next) = from.next() else {
        return Err(ActionError::InvalidTransition { from, to: requested.unwrap_or(from) });
    };
    match requested {
        Some(to) if to != next => Err(ActionError::InvalidTransition { from, to }),
        _ => Ok(next),
    }
}

/// Move to the next phase, running exit and entry hooks. Returns the phase
/// the battle is in afterwards, which is `Finished` when a hook ended it.
pub fn advance_phase(state: &mut BattleState, requested: Option<Phase>) -> Result<Phase, ActionError> {
    let next = validate_advance(state, requested)?;

    match state.phase {
        Phase::PreCombat => resolve_bids(state),
        Phase::EndRound => {
            if state.final_round {
                finish_by_hp(state);
                return Ok(state.phase);
            }
            state.round += 1;
            let amount = state.config.command_restore;
            for side in &mut state.sides {
                command::restore(&mut side.commanders, amount);
            }
        }
        _ => {}
    }

    state.phase = next;

    match next {
        Phase::Deployment => deal_opening_hands(state),
        Phase::Initiative => begin_round(state),
        Phase::Resolve => apply_retaliation(state),
        Phase::EndRound => end_round(state),
        _ => {}
    }
    Ok(state.phase)
}

/// End the battle now.
pub fn finish(state: &mut BattleState, outcome: Outcome) {
    if state.phase == Phase::Finished {
        return;
    }
    state.phase = Phase::Finished;
    state.outcome = Some(outcome);
    let summary = match outcome {
        Outcome::Victory(side) => format!("{} wins the battle", side),
        Outcome::Draw => "The battle ends in a draw".to_string(),
    };
    info!(round = state.round, ?outcome, "battle finished");
    state.push_log(None, summary);
}

/// Finish the battle if a side has been broken. Returns true when finished.
pub fn check_termination(state: &mut BattleState) -> bool {
    if state.phase == Phase::Finished {
        return true;
    }
    let attacker_down = state.side(Side::Attacker).hp <= 0;
    let defender_down = state.side(Side::Defender).hp <= 0;
    match (attacker_down, defender_down) {
        (false, false) => false,
        (true, true) => {
            finish(state, Outcome::Draw);
            true
        }
        (true, false) => {
            finish(state, Outcome::Victory(Side::Defender));
            true
        }
        (false, true) => {
            finish(state, Outcome::Victory(Side::Attacker));
            true
        }
    }
}

fn finish_by_hp(state: &mut BattleState) {
    let a = state.side(Side::Attacker).hp;
    let d = state.side(Side::Defender).hp;
    let outcome = match a.cmp(&d) {
        std::cmp::Ordering::Greater => Outcome::Victory(Side::Attacker),
        std::cmp::Ordering::Less => Outcome::Victory(Side::Defender),
        std::cmp::Ordering::Equal => Outcome::Draw,
    };
    finish(state, outcome);
}

// ── Hooks ──────────────────────────────────────────────────────────────

fn resolve_bids(state: &mut BattleState) {
    let a = state.side(Side::Attacker).bid.unwrap_or(0);
    let d = state.side(Side::Defender).bid.unwrap_or(0);
    let holder = if d > a { Side::Defender } else { Side::Attacker };
    state.initiative = holder;
    state.active_side = holder;
    state.push_log(None, format!("Bids {}–{}: {} opens with the initiative", a, d, holder));
}

fn deal_opening_hands(state: &mut BattleState) {
    let hand_size = state.config.hand_size;
    for side in &mut state.sides {
        side.draw(hand_size);
    }
    state.push_log(None, format!("Both sides deploy with {} cards", hand_size));
}

fn begin_round(state: &mut BattleState) {
    if state.round > 1 {
        let a = state.side(Side::Attacker).mobility_this_round;
        let d = state.side(Side::Defender).mobility_this_round;
        if a > d {
            state.initiative = Side::Attacker;
        } else if d > a {
            state.initiative = Side::Defender;
        }
    }
    state.active_side = state.initiative;
    for side in &mut state.sides {
        side.passed = false;
        side.damage_dealt_this_round = 0;
        side.mobility_this_round = 0;
    }
    let holder = state.initiative;
    state.push_log(None, format!("Round {}: {} holds the initiative", state.round, holder));
}

/// Both debts are settled against the damage dealt before Resolve, so one
/// retaliation never triggers the other. Initiative only orders the hits.
fn apply_retaliation(state: &mut BattleState) {
    let first = state.initiative;
    let owed = [first, first.opponent()].map(|side| (side, combat::retaliation_owed(state, side)));
    for (side, owed) in owed {
        if owed == 0 {
            continue;
        }
        let target = side.opponent();
        let hp = combat::apply_damage(&mut state.side_mut(target).hp, owed);
        state.side_mut(side).damage_dealt_this_round += owed;
        state.push_log(Some(side), format!("Retaliates for {} ({} at {} hp)", owed, target, hp));
        if check_termination(state) {
            return;
        }
    }
}

fn end_round(state: &mut BattleState) {
    for side in &mut state.sides {
        for played in side.in_play.drain(..) {
            let returns = !played.cancelled
                && played.card.effect_type == Some(crate::effects::EffectType::ReturnToHand);
            if returns {
                side.hand.push(played.card);
            } else {
                side.discard.push(played.card);
            }
        }
    }
    let exhausted = state.sides.iter().all(|s| s.hand.is_empty());
    state.final_round = exhausted || state.round >= state.config.max_rounds;
    if state.final_round {
        let reason = if exhausted { "both hands are spent" } else { "the round limit is reached" };
        state.push_log(None, format!("Round {} closes and {}", state.round, reason));
    } else {
        state.push_log(None, format!("Round {} closes", state.round));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_cycle() {
        let mut p = Phase::PreCombat;
        let mut seen = vec![p];
        for _ in 0..7 {
            p = p.next().unwrap();
            seen.push(p);
        }
        assert_eq!(seen, vec![
            Phase::PreCombat, Phase::Deployment, Phase::Initiative, Phase::Actions,
            Phase::Resolve, Phase::EndRound, Phase::Initiative, Phase::Actions,
        ]);
        assert_eq!(Phase::Finished.next(), None);
    }
}
