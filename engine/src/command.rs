// ═══════════════════════════════════════════════════════════════════════
// Command economy — per-commander pools, the general pool, tap state
// ═══════════════════════════════════════════════════════════════════════

use crate::error::ActionError;
use crate::types::*;

pub fn can_afford(commander: &Commander, cost: u8) -> bool {
    cost <= commander.command_free
}

/// Pay `cost` from the commander's pool. All or nothing.
pub fn spend(commander: &mut Commander, cost: u8) -> Result<(), ActionError> {
    if !can_afford(commander, cost) {
        return Err(ActionError::InsufficientCommand {
            required: cost,
            available: commander.command_free,
        });
    }
    commander.command_free -= cost;
    Ok(())
}

/// Round-change restoration: every commander (the general's pool included)
/// regains `amount`, clamped at its base, and stands ready again.
pub fn restore(commanders: &mut [Commander], amount: u8) {
    for c in commanders {
        c.command_free = c.command_free.saturating_add(amount).min(c.command_base);
        c.tapped = false;
        c.spare_plays = 0;
    }
}

/// Tap bookkeeping after `commander` issued a card. `extra_plays` and
/// `untap` come from that card alone.
pub fn commit_play(commander: &mut Commander, extra_plays: i32, untap: bool) {
    let granted = u8::try_from(extra_plays.max(0)).unwrap_or(u8::MAX);
    commander.spare_plays = commander.spare_plays.saturating_add(granted);
    if commander.spare_plays > 0 {
        commander.spare_plays -= 1;
    } else {
        commander.tapped = true;
    }
    if untap {
        commander.tapped = false;
    }
}

/// The enemy commander a forced tap lands on: the untapped one with the
/// most free command, lowest id on ties.
pub fn force_tap_target(commanders: &[Commander]) -> Option<CommanderId> {
    commanders.iter()
        .filter(|c| !c.tapped)
        .max_by(|a, b| a.command_free.cmp(&b.command_free).then(b.id.cmp(&a.id)))
        .map(|c| c.id)
}

/// Commanders of `combatant` able to issue `card` right now (cost, tap
/// state and specialization).
pub fn eligible_commanders<'a>(combatant: &'a Combatant, card: &'a Card) -> impl Iterator<Item = &'a Commander> + 'a {
    combatant.commanders.iter()
        .filter(move |c| !c.tapped && card.commandable_by(c) && can_afford(c, card.command_required))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commander(base: u8, free: u8) -> Commander {
        Commander {
            id: CommanderId(1),
            name: "Test".into(),
            specialization: Some(UnitType::Infantry),
            command_base: base,
            command_free: free,
            strategy: 0,
            guard: 0,
            is_general: false,
            tapped: false,
            spare_plays: 0,
        }
    }

    #[test]
    fn test_spend_exact_pool() {
        let mut c = commander(3, 2);
        spend(&mut c, 2).unwrap();
        assert_eq!(c.command_free, 0);
    }

    #[test]
    fn test_spend_rejects_without_mutation() {
        let mut c = commander(3, 1);
        let before = c.clone();
        let err = spend(&mut c, 2).unwrap_err();
        assert_eq!(err, ActionError::InsufficientCommand { required: 2, available: 1 });
        assert_eq!(c, before);
    }

    #[test]
    fn test_restore_clamps_at_base() {
        let mut cs = vec![commander(3, 0), commander(3, 2), commander(3, 3)];
        cs[0].tapped = true;
        restore(&mut cs, 2);
        assert_eq!(cs.iter().map(|c| c.command_free).collect::<Vec<_>>(), vec![2, 3, 3]);
        assert!(cs.iter().all(|c| !c.tapped));
    }

    #[test]
    fn test_double_card_per_tap() {
        let mut c = commander(3, 3);
        commit_play(&mut c, 1, false);
        assert!(!c.tapped);
        commit_play(&mut c, 0, false);
        assert!(c.tapped);
    }

    #[test]
    fn test_untap_after_play() {
        let mut c = commander(3, 3);
        commit_play(&mut c, 0, true);
        assert!(!c.tapped);
    }

    #[test]
    fn test_force_tap_prefers_largest_pool() {
        let mut a = commander(3, 1);
        let mut b = commander(3, 3);
        b.id = CommanderId(2);
        assert_eq!(force_tap_target(&[a.clone(), b.clone()]), Some(CommanderId(2)));
        b.tapped = true;
        assert_eq!(force_tap_target(&[a.clone(), b.clone()]), Some(CommanderId(1)));
        a.tapped = true;
        assert_eq!(force_tap_target(&[a, b]), None);
    }
}
