//! Candidate pool access port trait.

use crate::domain::candidate::Candidate;
use crate::domain::error::StrategyError;
use crate::domain::sleeve::Sleeve;

pub trait CandidatePort {
    /// Eligible codes for a sleeve, best first. The pool owns discovery,
    /// filtering and ranking; the engine consumes the snapshot as-is.
    fn get_candidates(&self, sleeve: Sleeve) -> Result<Vec<Candidate>, StrategyError>;
}
