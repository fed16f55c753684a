//! Market environment classification from a benchmark index.
//!
//! Derived from the benchmark's trailing one-month return. The split
//! tables are computed and reported every cycle but do not rescale
//! sleeve sizing (observational, see DESIGN.md).

use std::fmt;

use crate::domain::error::StrategyError;
use crate::domain::series::InstrumentSeries;

/// Trailing window in trading days (~one calendar month).
pub const TRAILING_BARS: usize = 21;
pub const BULL_THRESHOLD: f64 = 0.05;
pub const BEAR_THRESHOLD: f64 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketEnvironment {
    Bull,
    Bear,
    /// Sideways chop, the middle regime.
    Shock,
}

/// Cross-sleeve capital fractions suggested for an environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalSplit {
    pub stable: f64,
    pub aggressive: f64,
    pub arbitrage: f64,
}

impl MarketEnvironment {
    pub fn from_monthly_return(r: f64) -> Self {
        if r >= BULL_THRESHOLD {
            MarketEnvironment::Bull
        } else if r <= BEAR_THRESHOLD {
            MarketEnvironment::Bear
        } else {
            MarketEnvironment::Shock
        }
    }

    /// Classify from a benchmark series: simple return of the latest
    /// close against the close `TRAILING_BARS` bars earlier.
    pub fn classify(benchmark: &InstrumentSeries) -> Result<Self, StrategyError> {
        benchmark.require(TRAILING_BARS + 1)?;
        let (Some(latest), Some(base)) = (benchmark.back(0), benchmark.back(TRAILING_BARS)) else {
            return Err(StrategyError::Computation {
                reason: format!("benchmark window lookup failed for {}", benchmark.code),
            });
        };
        let (latest, base) = (latest.close, base.close);
        if base <= 0.0 {
            return Err(StrategyError::Computation {
                reason: format!("non-positive benchmark close for {}", benchmark.code),
            });
        }
        Ok(Self::from_monthly_return((latest - base) / base))
    }

    pub fn name(&self) -> &'static str {
        match self {
            MarketEnvironment::Bull => "bull",
            MarketEnvironment::Bear => "bear",
            MarketEnvironment::Shock => "shock",
        }
    }

    pub fn capital_split(&self) -> CapitalSplit {
        match self {
            MarketEnvironment::Bull => CapitalSplit {
                stable: 0.50,
                aggressive: 0.40,
                arbitrage: 0.10,
            },
            MarketEnvironment::Bear => CapitalSplit {
                stable: 0.70,
                aggressive: 0.20,
                arbitrage: 0.10,
            },
            MarketEnvironment::Shock => CapitalSplit {
                stable: 0.60,
                aggressive: 0.30,
                arbitrage: 0.10,
            },
        }
    }
}

impl fmt::Display for MarketEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
