//! Boosting driver for cartboost.
//!
//! [`GBDT`] fits one [`crate::Tree`] per round against the logistic-loss
//! residuals of the running score and records the losses of every round.

pub mod gbdt;
pub mod history;
pub mod loss;

pub use gbdt::GBDT;
pub use history::{RoundRecord, TrainingHistory, HISTORY_HEADER};
pub use loss::{calc_bias, logloss, mean_logloss, residual, residuals, sigmoid};
