// ═══════════════════════════════════════════════════════════════════════
// Battle engine test suite — full flows through `apply_action`
// ═══════════════════════════════════════════════════════════════════════

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::combat::FixedRoll;
use crate::config::EngineConfig;
use crate::effects::{self, ClimateImmunity, EffectType};
use crate::engine::{apply_action, apply_action_with, apply_submission, set_environment, Action, ActionOutcome, Submission};
use crate::error::{ActionError, IllegalReason};
use crate::setup::{create_battle, BattleSetup};
use crate::types::*;
use crate::visibility::player_view;

// ── Helpers ──────────────────────────────────────────────────────────────

const VARRO: CommanderId = CommanderId(1); // Imperial infantry, strategy 1
const NERVA: CommanderId = CommanderId(2); // Imperial archer
const AURELIA: CommanderId = CommanderId(3); // Imperial general

fn battle(attacker: Culture, defender: Culture, seed: u64) -> BattleState {
    create_battle(&BattleSetup::new(attacker, defender, seed), EngineConfig::default())
}

fn advance(state: &mut BattleState) -> Phase {
    match apply_action(state, Side::Attacker, Action::AdvancePhase).unwrap() {
        ActionOutcome::Advanced(phase) => phase,
        other => panic!("unexpected outcome {:?}", other),
    }
}

/// Imperial vs Steppe, advanced to round 1 actions with the attacker to play.
fn in_actions(seed: u64) -> BattleState {
    let mut state = battle(Culture::Imperial, Culture::Steppe, seed);
    while state.phase != Phase::Actions {
        advance(&mut state);
    }
    state
}

fn test_card(id: u16, unit_type: Option<UnitType>, attack: i32, cost: u8, effect: Option<EffectType>) -> Card {
    Card {
        id: CardId(id),
        name: format!("Test card {}", id),
        unit_type,
        attack_bonus: attack,
        defense_bonus: 0,
        mobility_bonus: 0,
        command_required: cost,
        effect_type: effect,
        general_order: false,
    }
}

fn give(state: &mut BattleState, side: Side, card: Card) -> CardId {
    let id = card.id;
    state.side_mut(side).hand.push(card);
    id
}

fn play(state: &mut BattleState, side: Side, card_id: CardId, commander_id: CommanderId, roll: i32)
    -> Result<ActionOutcome, ActionError>
{
    apply_action_with(state, side, Action::PlayCard { card_id, commander_id }, &mut FixedRoll(roll))
}

fn strip_guard(state: &mut BattleState, side: Side) {
    for c in &mut state.side_mut(side).commanders {
        c.guard = 0;
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[test]
fn test_urban_card_spends_exact_pool() {
    let mut state = battle(Culture::Imperial, Culture::Steppe, 1);
    let urban = Environment { terrain: Terrain::from_name("Urbano").unwrap(), ..Environment::default() };
    set_environment(&mut state, urban).unwrap();
    while state.phase != Phase::Actions {
        advance(&mut state);
    }
    let card = test_card(900, Some(UnitType::Infantry), 3, 2, Some(EffectType::BonusOnTerrainUrban));

    let r = effects::resolve(&card, &state.context_for(Side::Attacker));
    assert_eq!(r.attack_modifier, 1);
    assert_eq!(r.defense_modifier, 1);

    state.side_mut(Side::Attacker).commander_mut(VARRO).unwrap().command_free = 2;
    let id = give(&mut state, Side::Attacker, card);
    play(&mut state, Side::Attacker, id, VARRO, 3).unwrap();
    assert_eq!(state.side(Side::Attacker).commander(VARRO).unwrap().command_free, 0);
    assert!(state.side(Side::Attacker).hand_position(id).is_none());
}

#[test]
fn test_insufficient_command_leaves_state_unchanged() {
    let mut state = in_actions(2);
    state.side_mut(Side::Attacker).commander_mut(VARRO).unwrap().command_free = 2;
    let id = give(&mut state, Side::Attacker, test_card(900, Some(UnitType::Infantry), 5, 3, None));
    let before = state.clone();

    let err = play(&mut state, Side::Attacker, id, VARRO, 3).unwrap_err();
    assert_eq!(err, ActionError::InsufficientCommand { required: 3, available: 2 });
    assert_eq!(state, before);
}

#[test]
fn test_climate_immunities_combine_in_any_order() {
    let state = in_actions(3);
    let ctx = state.context_for(Side::Attacker);
    let heat = effects::resolve(&test_card(900, None, 0, 1, Some(EffectType::IgnoreClimateHeat)), &ctx);
    let all = effects::resolve(&test_card(901, None, 0, 1, Some(EffectType::IgnoreClimateAll)), &ctx);
    assert_eq!(effects::combine([heat.clone(), all.clone()]).ignore_climate, ClimateImmunity::All);
    assert_eq!(effects::combine([all, heat]).ignore_climate, ClimateImmunity::All);
}

#[test]
fn test_finishing_blow_clamps_and_ends_battle() {
    let mut state = in_actions(4);
    strip_guard(&mut state, Side::Defender);
    state.side_mut(Side::Defender).hp = 5;
    // 3 attack + 1 strategy + 1 roll = 5 damage, +2 on the finishing blow.
    let id = give(&mut state, Side::Attacker, test_card(900, Some(UnitType::Infantry), 3, 1, Some(EffectType::ExtraDamageOnWin)));

    let outcome = play(&mut state, Side::Attacker, id, VARRO, 1).unwrap();
    assert!(matches!(outcome, ActionOutcome::Played { damage: 7, .. }));
    assert_eq!(state.side(Side::Defender).hp, 0);
    assert_eq!(state.phase, Phase::Finished);
    assert_eq!(state.winner(), Some(Side::Attacker));

    let before = state.clone();
    let err = apply_action(&mut state, Side::Attacker, Action::AdvancePhase).unwrap_err();
    assert!(matches!(err, ActionError::InvalidTransition { from: Phase::Finished, .. }));
    let card = state.side(Side::Attacker).hand[0].id;
    let err = play(&mut state, Side::Attacker, card, NERVA, 1).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::WrongPhase(Phase::Finished)));
    assert_eq!(state, before);
}

#[test]
fn test_empty_phases_may_be_skipped() {
    let mut state = in_actions(5);
    assert_eq!(advance(&mut state), Phase::Resolve);
    assert_eq!(advance(&mut state), Phase::EndRound);
    assert_eq!(state.round, 1);
}

#[test]
fn test_round_increments_once_per_cycle() {
    let mut state = in_actions(6);
    advance(&mut state);
    advance(&mut state);
    assert_eq!(state.phase, Phase::EndRound);
    assert_eq!(advance(&mut state), Phase::Initiative);
    assert_eq!(state.round, 2);
    assert_eq!(advance(&mut state), Phase::Actions);
    assert_eq!(state.round, 2);
    for _ in 0..3 {
        advance(&mut state);
    }
    assert_eq!(state.phase, Phase::Initiative);
    assert_eq!(state.round, 3);
}

// ── Phase machine ────────────────────────────────────────────────────────

#[test]
fn test_skipping_a_phase_is_rejected() {
    let mut state = battle(Culture::Imperial, Culture::Steppe, 7);
    let err = apply_action(&mut state, Side::Defender, Action::AdvanceTo(Phase::Actions)).unwrap_err();
    assert_eq!(err, ActionError::InvalidTransition { from: Phase::PreCombat, to: Phase::Actions });
    apply_action(&mut state, Side::Defender, Action::AdvanceTo(Phase::Deployment)).unwrap();
    let err = apply_action(&mut state, Side::Defender, Action::AdvanceTo(Phase::PreCombat)).unwrap_err();
    assert_eq!(err, ActionError::InvalidTransition { from: Phase::Deployment, to: Phase::PreCombat });
}

#[test]
fn test_deployment_deals_hands() {
    let mut state = battle(Culture::Highland, Culture::Sylvan, 8);
    advance(&mut state);
    for side in Side::ALL {
        assert_eq!(state.side(side).hand.len(), 7);
        assert_eq!(state.side(side).deck.len(), 3);
    }
}

#[test]
fn test_higher_bid_takes_initiative() {
    let mut state = battle(Culture::Imperial, Culture::Steppe, 9);
    apply_action(&mut state, Side::Attacker, Action::Bid(2)).unwrap();
    apply_action(&mut state, Side::Defender, Action::Bid(5)).unwrap();
    while state.phase != Phase::Actions {
        advance(&mut state);
    }
    assert_eq!(state.initiative, Side::Defender);
    assert_eq!(state.active_side, Side::Defender);
}

#[test]
fn test_tied_bids_favour_attacker() {
    let mut state = battle(Culture::Imperial, Culture::Steppe, 10);
    apply_action(&mut state, Side::Attacker, Action::Bid(3)).unwrap();
    apply_action(&mut state, Side::Defender, Action::Bid(3)).unwrap();
    advance(&mut state);
    assert_eq!(state.initiative, Side::Attacker);
}

#[test]
fn test_bid_rules() {
    let mut state = battle(Culture::Imperial, Culture::Steppe, 11);
    let err = apply_action(&mut state, Side::Attacker, Action::Bid(11)).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::BidOutOfRange { max: 10 }));
    apply_action(&mut state, Side::Attacker, Action::Bid(1)).unwrap();
    let err = apply_action(&mut state, Side::Attacker, Action::Bid(2)).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::AlreadyBid));
    advance(&mut state);
    let err = apply_action(&mut state, Side::Defender, Action::Bid(2)).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::WrongPhase(Phase::Deployment)));
}

#[test]
fn test_play_outside_actions_is_wrong_phase() {
    let mut state = battle(Culture::Imperial, Culture::Steppe, 12);
    advance(&mut state);
    let id = state.side(Side::Attacker).hand[0].id;
    let err = play(&mut state, Side::Attacker, id, VARRO, 1).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::WrongPhase(Phase::Deployment)));
}

#[test]
fn test_sides_alternate_and_passed_side_is_skipped() {
    let mut state = in_actions(13);
    let id = give(&mut state, Side::Defender, test_card(900, None, 1, 1, None));
    let err = play(&mut state, Side::Defender, id, CommanderId(11), 1).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::NotYourTurn { active: Side::Attacker }));

    apply_action(&mut state, Side::Attacker, Action::Pass).unwrap();
    assert_eq!(state.active_side, Side::Defender);
    play(&mut state, Side::Defender, id, CommanderId(11), 1).unwrap();
    // Attacker passed, so the defender keeps the turn.
    assert_eq!(state.active_side, Side::Defender);
    let err = apply_action(&mut state, Side::Attacker, Action::Pass).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::AlreadyPassed));
}

#[test]
fn test_unknown_card_and_commander() {
    let mut state = in_actions(14);
    let err = play(&mut state, Side::Attacker, CardId(999), VARRO, 1).unwrap_err();
    assert_eq!(err, ActionError::UnknownCard(CardId(999)));
    let id = give(&mut state, Side::Attacker, test_card(900, None, 1, 1, None));
    let err = play(&mut state, Side::Attacker, id, CommanderId(11), 1).unwrap_err();
    assert_eq!(err, ActionError::UnknownCommander(CommanderId(11)));
}

// ── Command economy through plays ────────────────────────────────────────

#[test]
fn test_specialization_and_general_orders() {
    let mut state = in_actions(15);
    let archer = give(&mut state, Side::Attacker, test_card(900, Some(UnitType::Archer), 1, 1, None));
    let err = play(&mut state, Side::Attacker, archer, VARRO, 1).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::SpecializationMismatch { card: archer, commander: VARRO }));
    let err = play(&mut state, Side::Attacker, archer, AURELIA, 1).unwrap_err();
    assert!(matches!(err, ActionError::IllegalAction { reason: IllegalReason::SpecializationMismatch { .. } }));

    let flexible = give(&mut state, Side::Attacker, test_card(901, Some(UnitType::Archer), 1, 1, Some(EffectType::FlexibleCommand)));
    play(&mut state, Side::Attacker, flexible, VARRO, 1).unwrap();

    apply_action(&mut state, Side::Defender, Action::Pass).unwrap();
    let mut decree = test_card(902, None, 1, 2, None);
    decree.general_order = true;
    let decree = give(&mut state, Side::Attacker, decree);
    let err = play(&mut state, Side::Attacker, decree, NERVA, 1).unwrap_err();
    assert!(matches!(err, ActionError::IllegalAction { reason: IllegalReason::SpecializationMismatch { .. } }));
    let pool = state.side(Side::Attacker).general_pool();
    play(&mut state, Side::Attacker, decree, AURELIA, 1).unwrap();
    assert_eq!(state.side(Side::Attacker).general_pool(), pool - 2);
}

#[test]
fn test_commander_taps_after_issuing() {
    let mut state = in_actions(16);
    let first = give(&mut state, Side::Attacker, test_card(900, None, 1, 1, None));
    let second = give(&mut state, Side::Attacker, test_card(901, None, 1, 1, None));
    play(&mut state, Side::Attacker, first, VARRO, 1).unwrap();
    assert!(state.side(Side::Attacker).commander(VARRO).unwrap().tapped);
    apply_action(&mut state, Side::Defender, Action::Pass).unwrap();
    let err = play(&mut state, Side::Attacker, second, VARRO, 1).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::CommanderTapped(VARRO)));
}

#[test]
fn test_double_card_per_tap() {
    let mut state = in_actions(17);
    let first = give(&mut state, Side::Attacker, test_card(900, Some(UnitType::Infantry), 1, 1, Some(EffectType::DoubleCardPerTap)));
    let second = give(&mut state, Side::Attacker, test_card(901, None, 1, 1, None));
    play(&mut state, Side::Attacker, first, VARRO, 1).unwrap();
    assert!(!state.side(Side::Attacker).commander(VARRO).unwrap().tapped);
    apply_action(&mut state, Side::Defender, Action::Pass).unwrap();
    play(&mut state, Side::Attacker, second, VARRO, 1).unwrap();
    assert!(state.side(Side::Attacker).commander(VARRO).unwrap().tapped);
}

#[test]
fn test_untap_commander_order() {
    let mut state = in_actions(18);
    let id = give(&mut state, Side::Attacker, test_card(900, None, 1, 1, Some(EffectType::UntapCommander)));
    play(&mut state, Side::Attacker, id, VARRO, 1).unwrap();
    assert!(!state.side(Side::Attacker).commander(VARRO).unwrap().tapped);
}

#[test]
fn test_round_restoration_clamps_and_untaps() {
    let mut state = in_actions(19);
    let id = give(&mut state, Side::Attacker, test_card(900, None, 1, 2, None));
    play(&mut state, Side::Attacker, id, VARRO, 1).unwrap();
    {
        let varro = state.side(Side::Attacker).commander(VARRO).unwrap();
        assert_eq!(varro.command_free, 1);
        assert!(varro.tapped);
    }
    while state.phase != Phase::Initiative {
        advance(&mut state);
    }
    let attacker = state.side(Side::Attacker);
    let varro = attacker.commander(VARRO).unwrap();
    assert_eq!(varro.command_free, 2);
    assert!(!varro.tapped);
    for c in &attacker.commanders {
        assert!(c.command_free <= c.command_base);
    }
}

// ── Effects in play ──────────────────────────────────────────────────────

#[test]
fn test_block_cavalry_blocks_enemy_cavalry() {
    let mut state = battle(Culture::Steppe, Culture::Highland, 20);
    while state.phase != Phase::Actions {
        advance(&mut state);
    }
    let pikes = test_card(950, Some(UnitType::Infantry), 0, 1, Some(EffectType::BlockCavalry));
    state.side_mut(Side::Defender).in_play.push(PlayedCard { card: pikes, commander: CommanderId(11), cancelled: false });
    let lancers = give(&mut state, Side::Attacker, test_card(900, Some(UnitType::Cavalry), 3, 1, None));
    let err = play(&mut state, Side::Attacker, lancers, CommanderId(1), 1).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::CardTypeBlocked(UnitType::Cavalry)));
}

#[test]
fn test_cancel_enemy_card() {
    let mut state = in_actions(21);
    let wall = Card { defense_bonus: 3, ..test_card(950, None, 0, 1, None) };
    state.side_mut(Side::Defender).in_play.push(PlayedCard { card: wall, commander: CommanderId(11), cancelled: false });
    strip_guard(&mut state, Side::Defender);
    // 1 attack + 1 strategy + 1 roll; the wall would have absorbed all of it.
    let id = give(&mut state, Side::Attacker, test_card(900, None, 1, 1, Some(EffectType::CancelEnemyCard1)));
    let outcome = play(&mut state, Side::Attacker, id, VARRO, 1).unwrap();
    assert!(matches!(outcome, ActionOutcome::Played { cancelled: Some(CardId(950)), damage: 3, .. }));
    assert!(state.side(Side::Defender).in_play[0].cancelled);
}

#[test]
fn test_tap_enemy_commander() {
    let mut state = in_actions(22);
    let id = give(&mut state, Side::Attacker, test_card(900, None, 0, 1, Some(EffectType::TapEnemyCommander)));
    play(&mut state, Side::Attacker, id, VARRO, 1).unwrap();
    // Batu the Swift carries the largest pool.
    assert!(state.side(Side::Defender).commander(CommanderId(11)).unwrap().tapped);
    assert!(!state.side(Side::Defender).commander(CommanderId(12)).unwrap().tapped);
}

#[test]
fn test_draw_on_initiative() {
    let mut state = in_actions(23);
    let deck = state.side(Side::Attacker).deck.len();
    let id = give(&mut state, Side::Attacker, test_card(900, None, 0, 1, Some(EffectType::DrawOnInitiative)));
    let outcome = play(&mut state, Side::Attacker, id, VARRO, 1).unwrap();
    assert!(matches!(outcome, ActionOutcome::Played { drawn: 1, .. }));
    assert_eq!(state.side(Side::Attacker).deck.len(), deck - 1);
}

#[test]
fn test_return_to_hand_at_round_end() {
    let mut state = in_actions(24);
    let keeper = give(&mut state, Side::Attacker, test_card(900, None, 0, 1, Some(EffectType::ReturnToHand)));
    let spent = give(&mut state, Side::Defender, test_card(901, None, 0, 1, None));
    play(&mut state, Side::Attacker, keeper, VARRO, 1).unwrap();
    play(&mut state, Side::Defender, spent, CommanderId(11), 1).unwrap();
    advance(&mut state);
    advance(&mut state);
    assert_eq!(state.phase, Phase::EndRound);
    assert!(state.side(Side::Attacker).hand_position(keeper).is_some());
    assert!(state.side(Side::Defender).discard.iter().any(|c| c.id == spent));
    assert!(state.sides.iter().all(|s| s.in_play.is_empty()));
}

#[test]
fn test_retaliation_on_resolve() {
    let mut state = battle(Culture::Imperial, Culture::Highland, 25);
    while state.phase != Phase::Actions {
        advance(&mut state);
    }
    let feud = test_card(950, None, 0, 1, Some(EffectType::Retaliation));
    state.side_mut(Side::Defender).in_play.push(PlayedCard { card: feud, commander: CommanderId(11), cancelled: false });
    strip_guard(&mut state, Side::Defender);
    let id = give(&mut state, Side::Attacker, test_card(900, None, 4, 1, None));
    play(&mut state, Side::Attacker, id, VARRO, 1).unwrap();
    assert_eq!(state.side(Side::Attacker).hp, 100);
    advance(&mut state);
    assert_eq!(state.phase, Phase::Resolve);
    assert_eq!(state.side(Side::Attacker).hp, 98);
}

#[test]
fn test_retaliation_ignores_initiative_order() {
    for holder in Side::ALL {
        let mut state = battle(Culture::Imperial, Culture::Highland, 27);
        while state.phase != Phase::Actions {
            advance(&mut state);
        }
        for (side, id) in [(Side::Attacker, 950), (Side::Defender, 951)] {
            let feud = test_card(id, None, 0, 1, Some(EffectType::Retaliation));
            state.side_mut(side).in_play.push(PlayedCard { card: feud, commander: CommanderId(1), cancelled: false });
        }
        state.side_mut(Side::Attacker).damage_dealt_this_round = 5;
        state.initiative = holder;
        advance(&mut state);
        assert_eq!(state.phase, Phase::Resolve);
        // Only the defender was struck, so only the defender retaliates.
        assert_eq!(state.side(Side::Attacker).hp, 98, "holder {}", holder);
        assert_eq!(state.side(Side::Defender).hp, 100, "holder {}", holder);
    }
}

#[test]
fn test_cancelled_card_is_discarded_at_round_end() {
    let mut state = in_actions(28);
    let recall = test_card(950, None, 0, 1, Some(EffectType::ReturnToHand));
    state.side_mut(Side::Defender).in_play.push(PlayedCard { card: recall, commander: CommanderId(11), cancelled: false });
    let id = give(&mut state, Side::Attacker, test_card(900, None, 0, 1, Some(EffectType::CancelEnemyCard1)));
    play(&mut state, Side::Attacker, id, VARRO, 1).unwrap();
    assert!(state.side(Side::Defender).in_play[0].cancelled);
    while state.phase != Phase::EndRound {
        advance(&mut state);
    }
    let defender = state.side(Side::Defender);
    assert!(defender.in_play.is_empty());
    assert!(defender.discard.iter().any(|c| c.id == CardId(950)));
    assert!(!defender.hand.iter().any(|c| c.id == CardId(950)));
}

#[test]
#[should_panic(expected = "command_base")]
fn test_invariants_reject_oversized_command_pool() {
    let mut state = battle(Culture::Imperial, Culture::Steppe, 29);
    let varro = state.side_mut(Side::Attacker).commander_mut(VARRO).unwrap();
    varro.command_base = crate::config::MAX_COMMAND_BASE + 1;
    state.check_invariants();
}

#[test]
fn test_initiative_follows_mobility() {
    let mut state = in_actions(26);
    apply_action(&mut state, Side::Attacker, Action::Pass).unwrap();
    let scouts = Card { mobility_bonus: 3, ..test_card(900, None, 0, 1, None) };
    let id = give(&mut state, Side::Defender, scouts);
    play(&mut state, Side::Defender, id, CommanderId(11), 1).unwrap();
    while state.phase != Phase::Initiative {
        advance(&mut state);
    }
    assert_eq!(state.initiative, Side::Defender);
    assert_eq!(state.active_side, Side::Defender);
    assert!(state.sides.iter().all(|s| s.mobility_this_round == 0 && !s.passed));
}

#[test]
fn test_tied_mobility_keeps_initiative() {
    let mut state = in_actions(27);
    while state.phase != Phase::Initiative {
        advance(&mut state);
    }
    assert_eq!(state.initiative, Side::Attacker);
}

// ── Termination ──────────────────────────────────────────────────────────

#[test]
fn test_round_limit_finishes_by_hp() {
    let config = EngineConfig { max_rounds: 1, ..EngineConfig::default() };
    let mut state = create_battle(&BattleSetup::new(Culture::Imperial, Culture::Steppe, 28), config);
    while state.phase != Phase::Actions {
        advance(&mut state);
    }
    let id = give(&mut state, Side::Attacker, test_card(900, None, 6, 1, None));
    play(&mut state, Side::Attacker, id, VARRO, 1).unwrap();
    advance(&mut state);
    advance(&mut state);
    assert!(state.final_round);
    assert_eq!(advance(&mut state), Phase::Finished);
    assert_eq!(state.round, 1);
    assert_eq!(state.winner(), Some(Side::Attacker));
}

#[test]
fn test_exhaustion_with_equal_hp_is_a_draw() {
    let mut state = in_actions(29);
    for side in &mut state.sides {
        side.hand.clear();
    }
    advance(&mut state);
    advance(&mut state);
    assert!(state.final_round);
    advance(&mut state);
    assert_eq!(state.outcome, Some(Outcome::Draw));
    assert_eq!(state.winner(), None);
}

// ── Orchestrator ─────────────────────────────────────────────────────────

#[test]
fn test_stale_and_duplicate_submissions_rejected() {
    let mut state = battle(Culture::Imperial, Culture::Steppe, 30);
    let submission = Submission { side: Side::Attacker, seq: 0, action: Action::AdvancePhase };
    apply_submission(&mut state, submission.clone()).unwrap();
    assert_eq!(state.action_seq, 1);
    let before = state.clone();
    let err = apply_submission(&mut state, submission).unwrap_err();
    assert_eq!(err, ActionError::OutOfOrder { expected: 1, got: 0 });
    let err = apply_submission(&mut state, Submission { side: Side::Attacker, seq: 5, action: Action::AdvancePhase }).unwrap_err();
    assert_eq!(err, ActionError::OutOfOrder { expected: 1, got: 5 });
    assert_eq!(state, before);
}

#[test]
fn test_replaying_an_action_is_deterministic() {
    let state = in_actions(31);
    let card = state.side(Side::Attacker).hand.iter()
        .find(|c| c.unit_type == Some(UnitType::Infantry) && c.command_required <= 3 && !c.general_order)
        .map(|c| c.id);
    let Some(card) = card else { return };
    let action = Action::PlayCard { card_id: card, commander_id: VARRO };
    let mut a = state.clone();
    let mut b = state;
    let ra = apply_action(&mut a, Side::Attacker, action.clone());
    let rb = apply_action(&mut b, Side::Attacker, action);
    assert_eq!(ra, rb);
    assert_eq!(a, b);
}

#[test]
fn test_accepted_actions_are_logged_and_counted() {
    let mut state = in_actions(32);
    let seq = state.action_seq;
    let logged = state.log.len();
    apply_action(&mut state, Side::Attacker, Action::Pass).unwrap();
    assert_eq!(state.action_seq, seq + 1);
    assert_eq!(state.log.len(), logged + 1);
    let last = state.log.back().unwrap();
    assert_eq!(last.actor, Some(Side::Attacker));
    assert_eq!(last.phase, Phase::Actions);
}

#[test]
fn test_log_is_bounded() {
    let config = EngineConfig { log_capacity: 4, ..EngineConfig::default() };
    let mut state = create_battle(&BattleSetup::new(Culture::Imperial, Culture::Steppe, 33), config);
    for _ in 0..12 {
        advance(&mut state);
    }
    assert_eq!(state.log.len(), 4);
}

#[test]
fn test_environment_changes_only_between_rounds() {
    let mut state = in_actions(34);
    let fog = Environment { climate: Climate::Fog, ..Environment::default() };
    let err = set_environment(&mut state, fog.clone()).unwrap_err();
    assert_eq!(err, ActionError::illegal(IllegalReason::WrongPhase(Phase::Actions)));
    advance(&mut state);
    advance(&mut state);
    set_environment(&mut state, fog).unwrap();
    assert_eq!(state.context_for(Side::Attacker).climate, Climate::Fog);
}

#[test]
fn test_forced_plains_applies_to_both_sides() {
    let mut state = battle(Culture::Imperial, Culture::Sylvan, 35);
    let forest = Environment { terrain: Terrain::Forest, ..Environment::default() };
    set_environment(&mut state, forest).unwrap();
    while state.phase != Phase::Actions {
        advance(&mut state);
    }
    assert_eq!(state.context_for(Side::Defender).terrain, Terrain::Forest);
    let roads = give(&mut state, Side::Attacker, test_card(900, None, 0, 1, Some(EffectType::ForceTerrainPlains)));
    play(&mut state, Side::Attacker, roads, VARRO, 1).unwrap();
    assert_eq!(state.context_for(Side::Defender).terrain, Terrain::Plains);
    assert_eq!(player_view(&state, Side::Defender).terrain, Terrain::Plains);
}

#[test]
fn test_action_wire_format() {
    let action = Action::PlayCard { card_id: CardId(3), commander_id: CommanderId(1) };
    let json = serde_json::to_string(&action).unwrap();
    assert_eq!(json, r#"{"PlayCard":{"card_id":3,"commander_id":1}}"#);
    let back: Action = serde_json::from_str(&json).unwrap();
    assert_eq!(back, action);
}

// ── Full battles ─────────────────────────────────────────────────────────

/// Play a whole battle with random legal choices drawn through PlayerView.
fn play_out(attacker: Culture, defender: Culture, seed: u64) -> BattleState {
    let mut state = battle(attacker, defender, seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_mul(999_961));
    for _ in 0..5_000 {
        if state.is_finished() {
            break;
        }
        let side = state.active_side;
        let action = if state.phase == Phase::Actions && !state.side(side).passed {
            let plays = player_view(&state, side).legal_plays();
            match plays.choose(&mut rng) {
                Some(p) if !rng.gen_bool(0.15) => Action::PlayCard { card_id: p.card_id, commander_id: p.commander_id },
                _ => Action::Pass,
            }
        } else if state.phase == Phase::PreCombat && state.side(side).bid.is_none() {
            Action::Bid(rng.gen_range(0..=state.config.max_bid))
        } else {
            Action::AdvancePhase
        };
        apply_action(&mut state, side, action).unwrap();
    }
    state
}

#[test]
fn test_battles_complete_for_every_pairing() {
    for (i, a) in Culture::ALL.into_iter().enumerate() {
        for (j, d) in Culture::ALL.into_iter().enumerate() {
            let state = play_out(a, d, (i * 4 + j) as u64);
            assert!(state.is_finished(), "{} vs {} did not finish", a, d);
            assert!(state.outcome.is_some());
            state.check_invariants();
        }
    }
}

#[test]
fn test_same_seed_same_battle() {
    let a = play_out(Culture::Steppe, Culture::Sylvan, 77);
    let b = play_out(Culture::Steppe, Culture::Sylvan, 77);
    assert_eq!(a, b);
}
