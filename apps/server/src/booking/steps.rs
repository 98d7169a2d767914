use serde::Serialize;

use super::draft::{BookingDraft, Field};

/// One entry of a flow's step table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub required: &'static [Field],
}

/// Result of a forward navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepMove {
    Advanced { to: &'static str },
    /// Required fields of the current step are unset; the cursor did not move.
    Blocked { missing: Vec<Field> },
    /// The cursor is on the payment step. Only a completed payment moves on.
    AwaitingPayment,
    AtTerminal,
}

/// Linear cursor over a fixed step table.
///
/// The table must hold at least two steps: the last one is the terminal
/// confirmation step, the one before it is the payment step.
#[derive(Debug, Clone)]
pub struct StepController {
    steps: &'static [StepDefinition],
    cursor: usize,
}

impl StepController {
    pub fn new(steps: &'static [StepDefinition]) -> Self {
        assert!(
            steps.len() >= 2,
            "a flow needs at least a payment and a confirmation step"
        );
        Self { steps, cursor: 0 }
    }

    pub fn steps(&self) -> &'static [StepDefinition] {
        self.steps
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &'static StepDefinition {
        &self.steps[self.cursor]
    }

    pub fn is_terminal(&self) -> bool {
        self.cursor == self.steps.len() - 1
    }

    pub fn is_payment_step(&self) -> bool {
        self.cursor == self.steps.len() - 2
    }

    /// Required fields of the current step that the draft has not set.
    pub fn missing<S>(&self, draft: &BookingDraft<S>) -> Vec<Field> {
        self.current()
            .required
            .iter()
            .copied()
            .filter(|f| !draft.is_set(*f))
            .collect()
    }

    pub fn can_advance<S>(&self, draft: &BookingDraft<S>) -> bool {
        !self.is_terminal() && !self.is_payment_step() && self.missing(draft).is_empty()
    }

    pub fn can_retreat(&self) -> bool {
        self.cursor > 0
    }

    /// Move forward one step if the current step's requirements hold.
    /// A rejected attempt leaves the cursor where it was.
    pub fn advance<S>(&mut self, draft: &BookingDraft<S>) -> StepMove {
        if self.is_terminal() {
            return StepMove::AtTerminal;
        }
        if self.is_payment_step() {
            return StepMove::AwaitingPayment;
        }

        let missing = self.missing(draft);
        if !missing.is_empty() {
            return StepMove::Blocked { missing };
        }

        self.cursor += 1;
        StepMove::Advanced {
            to: self.current().id,
        }
    }

    /// Move back one step. Returns `false` on the first step.
    pub fn retreat(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub(super) fn enter_terminal(&mut self) {
        self.cursor = self.steps.len() - 1;
    }
}

// ── Tests ──
