//! Candidate instruments and intra-sleeve rotation scoring.
//!
//! Candidates arrive pre-ranked from the candidate pool; the engine only
//! re-scores them when choosing a switch target.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Broad,
    Sector,
    Theme,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Broad => "broad",
            Category::Sector => "sector",
            Category::Theme => "theme",
        }
    }

    pub fn from_name(name: &str) -> Option<Category> {
        match name {
            "broad" => Some(Category::Broad),
            "sector" => Some(Category::Sector),
            "theme" => Some(Category::Theme),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Immutable per-cycle snapshot from the candidate pool.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub code: String,
    pub name: String,
    pub category: Category,
    /// Daily volume in units, the liquidity proxy.
    pub volume: i64,
    pub valuation_percentile: f64,
}

const VALUATION_CHEAP_PERCENTILE: f64 = 40.0;
const LIQUIDITY_SCORE_CAP: f64 = 20.0;
const LIQUIDITY_UNIT: f64 = 10_000_000.0;

/// Rotation score used to pick a switch target: base 50 plus a capped
/// liquidity score plus a valuation tier (30 below the cheap percentile,
/// 15 otherwise).
pub fn switch_score(candidate: &Candidate) -> f64 {
    let liquidity = (candidate.volume as f64 / LIQUIDITY_UNIT).min(LIQUIDITY_SCORE_CAP);
    let valuation = if candidate.valuation_percentile < VALUATION_CHEAP_PERCENTILE {
        30.0
    } else {
        15.0
    };
    50.0 + liquidity + valuation
}
