//! Per-round training records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Losses after one boosting round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 0-based round index
    pub iteration: usize,
    /// Seconds since training started
    pub elapsed_secs: f64,
    /// Mean training loss
    pub train_loss: f64,
    /// Mean validation loss, when a validation set was given
    pub valid_loss: Option<f64>,
}

impl fmt::Display for RoundRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:4} {:8.1} {:10.5}",
            self.iteration, self.elapsed_secs, self.train_loss
        )?;
        match self.valid_loss {
            Some(loss) => write!(f, " {:10.5}", loss),
            None => write!(f, " {:>10}", "-"),
        }
    }
}

/// Header matching the columns of [`RoundRecord`]'s display.
pub const HISTORY_HEADER: &str = "iter     time    tr_loss    va_loss";

/// Every round of one fit, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    records: Vec<RoundRecord>,
}

impl TrainingHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a round.
    pub fn push(&mut self, record: RoundRecord) {
        self.records.push(record);
    }

    /// All rounds in order.
    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    /// Number of rounds.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no round was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent round.
    pub fn last(&self) -> Option<&RoundRecord> {
        self.records.last()
    }

    /// Training loss of every round.
    pub fn train_losses(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.train_loss).collect()
    }

    /// Round with the lowest validation loss.
    pub fn best_valid_round(&self) -> Option<&RoundRecord> {
        self.records
            .iter()
            .filter(|r| r.valid_loss.is_some())
            .min_by(|a, b| {
                a.valid_loss
                    .partial_cmp(&b.valid_loss)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}
