// ═══════════════════════════════════════════════════════════════════════
// Action errors — recoverable rule violations reported to the caller
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CardId, CommanderId, Phase, Side, UnitType};

/// Why an otherwise well-formed action is not legal right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IllegalReason {
    WrongPhase(Phase),
    NotYourTurn { active: Side },
    CommanderTapped(CommanderId),
    SpecializationMismatch { card: CardId, commander: CommanderId },
    CardTypeBlocked(UnitType),
    AlreadyPassed,
    AlreadyBid,
    BidOutOfRange { max: u8 },
}

impl std::fmt::Display for IllegalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IllegalReason::WrongPhase(phase) => write!(f, "not allowed during {}", phase),
            IllegalReason::NotYourTurn { active } => write!(f, "it is {}'s turn", active),
            IllegalReason::CommanderTapped(id) => write!(f, "commander {} is tapped", id),
            IllegalReason::SpecializationMismatch { card, commander } => {
                write!(f, "commander {} cannot issue card {}", commander, card)
            }
            IllegalReason::CardTypeBlocked(unit) => write!(f, "{} cards are blocked this round", unit),
            IllegalReason::AlreadyPassed => write!(f, "side already passed this round"),
            IllegalReason::AlreadyBid => write!(f, "side already placed its bid"),
            IllegalReason::BidOutOfRange { max } => write!(f, "bid exceeds the maximum of {}", max),
        }
    }
}

/// Every variant is returned without touching the battle state.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionError {
    #[error("Illegal action: {reason}")]
    IllegalAction { reason: IllegalReason },
    #[error("Insufficient command: required {required}, available {available}")]
    InsufficientCommand { required: u8, available: u8 },
    #[error("Unknown card: {0}")]
    UnknownCard(CardId),
    #[error("Unknown commander: {0}")]
    UnknownCommander(CommanderId),
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },
    #[error("Out-of-order submission: expected sequence {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },
}

impl ActionError {
    pub fn illegal(reason: IllegalReason) -> Self {
        ActionError::IllegalAction { reason }
    }
}
