//! Ensemble methods
//!
//! The price model is an averaging ensemble of a random forest, boosted
//! trees and ordinary least squares.

mod voting;

pub use voting::{RegressorModel, VotingRegressor};
