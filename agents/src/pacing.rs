// ═══════════════════════════════════════════════════════════════════════
// Bot pacing — deferred delivery of an already-made decision
//
//   Idle ──start()──▶ Thinking ──tick() past ready_after──▶ Committed
//    ▲                                                          │
//    └─────────────────────────── take() ───────────────────────┘
//
// No clocks, no sleeping: the caller feeds elapsed time through `tick`.
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::agent::Decision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredDecision {
    pub decision: Decision,
    pub ready_after: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BotTurn {
    #[default]
    Idle,
    Thinking { pending: DeferredDecision, waited: Duration },
    Committed(Decision),
}

impl BotTurn {
    /// Begin thinking. Ignored unless idle.
    pub fn start(&mut self, deferred: DeferredDecision) {
        if *self == BotTurn::Idle {
            *self = BotTurn::Thinking { pending: deferred, waited: Duration::ZERO };
            self.tick(Duration::ZERO);
        }
    }

    /// Advance the clock. Returns the decision once it is committed.
    pub fn tick(&mut self, elapsed: Duration) -> Option<Decision> {
        if let BotTurn::Thinking { pending, waited } = *self {
            let waited = waited.saturating_add(elapsed);
            *self = if waited >= pending.ready_after {
                BotTurn::Committed(pending.decision)
            } else {
                BotTurn::Thinking { pending, waited }
            };
        }
        match *self {
            BotTurn::Committed(decision) => Some(decision),
            _ => None,
        }
    }

    /// Hand the committed decision to the orchestrator and go idle.
    pub fn take(&mut self) -> Option<Decision> {
        match *self {
            BotTurn::Committed(decision) => {
                *self = BotTurn::Idle;
                Some(decision)
            }
            _ => None,
        }
    }

    pub fn is_thinking(&self) -> bool {
        matches!(self, BotTurn::Thinking { .. })
    }
}
