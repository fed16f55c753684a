//! Sleeve tags and per-sleeve parameter tables.
//!
//! The three capital buckets share one decision pipeline; everything
//! sleeve-specific lives in the constant table below instead of branching
//! on strings.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sleeve {
    Stable,
    Aggressive,
    Arbitrage,
}

/// Sleeve-specific constants. Ratios are fractions of the sleeve's
/// capital; thresholds are simple returns against cost basis.
#[derive(Debug, Clone, Copy)]
pub struct SleeveParams {
    /// Maximum position_ratio an `add` may reach.
    pub ceiling: f64,
    /// Ratio taken on a fresh `buy` (arbitrage: fraction of sleeve
    /// capital committed per opportunity).
    pub entry_ratio: f64,
    /// Increment per `add`.
    pub add_step: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

const STABLE_PARAMS: SleeveParams = SleeveParams {
    ceiling: 0.70,
    entry_ratio: 0.30,
    add_step: 0.20,
    take_profit: 0.15,
    stop_loss: -0.05,
};

const AGGRESSIVE_PARAMS: SleeveParams = SleeveParams {
    ceiling: 0.60,
    entry_ratio: 0.20,
    add_step: 0.15,
    take_profit: 0.25,
    stop_loss: -0.08,
};

const ARBITRAGE_PARAMS: SleeveParams = SleeveParams {
    ceiling: 0.30,
    entry_ratio: 0.30,
    add_step: 0.0,
    take_profit: 0.05,
    stop_loss: -0.02,
};

impl Sleeve {
    pub const ALL: [Sleeve; 3] = [Sleeve::Stable, Sleeve::Aggressive, Sleeve::Arbitrage];

    pub fn params(&self) -> &'static SleeveParams {
        match self {
            Sleeve::Stable => &STABLE_PARAMS,
            Sleeve::Aggressive => &AGGRESSIVE_PARAMS,
            Sleeve::Arbitrage => &ARBITRAGE_PARAMS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sleeve::Stable => "stable",
            Sleeve::Aggressive => "aggressive",
            Sleeve::Arbitrage => "arbitrage",
        }
    }

    pub fn from_name(name: &str) -> Option<Sleeve> {
        match name {
            "stable" => Some(Sleeve::Stable),
            "aggressive" => Some(Sleeve::Aggressive),
            "arbitrage" => Some(Sleeve::Arbitrage),
            _ => None,
        }
    }
}

impl fmt::Display for Sleeve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
