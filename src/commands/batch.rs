//! Per-item results for commands that act on several identifiers.
//!
//! Every item is attempted; the batch fails with the worst severity seen.

use crate::error::{DkrError, EngineError, Severity};
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Done(String),
    Failed { severity: Severity, message: String },
}

impl ItemOutcome {
    pub fn failed(error: &EngineError) -> Self {
        ItemOutcome::Failed {
            severity: error.severity(),
            message: error.to_string(),
        }
    }

    /// Identifier on stdout for a completed item, the failure message on stderr otherwise.
    pub fn write(&self, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<()> {
        match self {
            ItemOutcome::Done(id) => writeln!(out, "{}", id),
            ItemOutcome::Failed { message, .. } => writeln!(err, "{}", message),
        }
    }
}

/// Highest failure severity among `outcomes`, `None` when all succeeded.
pub fn worst_severity(outcomes: &[ItemOutcome]) -> Option<Severity> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            ItemOutcome::Failed { severity, .. } => Some(*severity),
            ItemOutcome::Done(_) => None,
        })
        .max()
}

#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: ItemOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn finish(self) -> Result<(), DkrError> {
        match worst_severity(&self.outcomes) {
            None => Ok(()),
            Some(severity) => Err(DkrError::Batch {
                severity,
                failures: self
                    .outcomes
                    .iter()
                    .filter(|o| matches!(o, ItemOutcome::Failed { .. }))
                    .count(),
            }),
        }
    }
}
