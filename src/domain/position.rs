//! Position snapshots and the per-sleeve position book.
//!
//! The book is a plain value passed into and out of each cycle; the
//! ledger is its only mutator.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::candidate::Category;
use crate::domain::sleeve::Sleeve;

/// Open direction of an arbitrage holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }

    pub fn from_name(name: &str) -> Option<Direction> {
        match name {
            "buy" => Some(Direction::Buy),
            "sell" => Some(Direction::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Holding in the stable or aggressive sleeve.
#[derive(Debug, Clone)]
pub struct SwingPosition {
    pub code: String,
    pub name: String,
    pub category: Category,
    /// Fraction of the sleeve's capital, bounded by the sleeve ceiling.
    pub position_ratio: f64,
    pub buy_price: f64,
    pub buy_date: NaiveDate,
    pub last_add_date: Option<NaiveDate>,
}

impl SwingPosition {
    /// Simple return of `price` against cost basis.
    pub fn return_ratio(&self, price: f64) -> Option<f64> {
        if self.buy_price <= 0.0 {
            return None;
        }
        Some((price - self.buy_price) / self.buy_price)
    }
}

/// Holding in the arbitrage sleeve.
#[derive(Debug, Clone)]
pub struct ArbitragePosition {
    pub code: String,
    pub name: String,
    pub category: Category,
    pub direction: Direction,
    pub open_price: f64,
    pub open_date: NaiveDate,
    pub expected_return: f64,
}

impl ArbitragePosition {
    /// Realized return at `price`, signed by open direction.
    pub fn realized_return(&self, price: f64) -> Option<f64> {
        if self.open_price <= 0.0 {
            return None;
        }
        let raw = (price - self.open_price) / self.open_price;
        Some(match self.direction {
            Direction::Buy => raw,
            Direction::Sell => -raw,
        })
    }

    pub fn age_days(&self, today: NaiveDate) -> i64 {
        (today - self.open_date).num_days()
    }
}

/// One optional position per sleeve; absent means flat.
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    pub stable: Option<SwingPosition>,
    pub aggressive: Option<SwingPosition>,
    pub arbitrage: Option<ArbitragePosition>,
}

impl PositionBook {
    pub fn swing(&self, sleeve: Sleeve) -> Option<&SwingPosition> {
        match sleeve {
            Sleeve::Stable => self.stable.as_ref(),
            Sleeve::Aggressive => self.aggressive.as_ref(),
            Sleeve::Arbitrage => None,
        }
    }

    pub fn set_swing(&mut self, sleeve: Sleeve, position: Option<SwingPosition>) {
        match sleeve {
            Sleeve::Stable => self.stable = position,
            Sleeve::Aggressive => self.aggressive = position,
            Sleeve::Arbitrage => {}
        }
    }

    pub fn is_flat(&self, sleeve: Sleeve) -> bool {
        match sleeve {
            Sleeve::Stable => self.stable.is_none(),
            Sleeve::Aggressive => self.aggressive.is_none(),
            Sleeve::Arbitrage => self.arbitrage.is_none(),
        }
    }
}
