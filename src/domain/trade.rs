//! Immutable trade records and history queries.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::fmt;

use crate::domain::sleeve::Sleeve;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    Add,
    Sell,
    PartialSell,
    SwitchSell,
    SwitchBuy,
    Close,
}

impl TradeKind {
    pub fn name(&self) -> &'static str {
        match self {
            TradeKind::Buy => "buy",
            TradeKind::Add => "add",
            TradeKind::Sell => "sell",
            TradeKind::PartialSell => "partial_sell",
            TradeKind::SwitchSell => "switch_sell",
            TradeKind::SwitchBuy => "switch_buy",
            TradeKind::Close => "close",
        }
    }

    pub fn from_name(name: &str) -> Option<TradeKind> {
        match name {
            "buy" => Some(TradeKind::Buy),
            "add" => Some(TradeKind::Add),
            "sell" => Some(TradeKind::Sell),
            "partial_sell" => Some(TradeKind::PartialSell),
            "switch_sell" => Some(TradeKind::SwitchSell),
            "switch_buy" => Some(TradeKind::SwitchBuy),
            "close" => Some(TradeKind::Close),
            _ => None,
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Append-only record of one ledger mutation. Never updated or deleted.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    pub kind: TradeKind,
    pub sleeve: Sleeve,
    pub code: String,
    pub name: String,
    pub amount: f64,
    pub reason: String,
    pub timestamp: NaiveDateTime,
}

/// Switches already booked for `sleeve` in the calendar month of `date`.
/// Each switch writes a sell leg and a buy leg; only the sell leg is
/// counted.
pub fn switches_in_month(history: &[TradeRecord], sleeve: Sleeve, date: NaiveDate) -> usize {
    history
        .iter()
        .filter(|r| {
            r.kind == TradeKind::SwitchSell
                && r.sleeve == sleeve
                && r.timestamp.date().year() == date.year()
                && r.timestamp.date().month() == date.month()
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: TradeKind, sleeve: Sleeve, y: i32, m: u32, d: u32) -> TradeRecord {
        TradeRecord {
            kind,
            sleeve,
            code: "510300".into(),
            name: "csi300".into(),
            amount: 3_600.0,
            reason: "test".into(),
            timestamp: NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn kind_name_round_trip() {
        for kind in [
            TradeKind::Buy,
            TradeKind::Add,
            TradeKind::Sell,
            TradeKind::PartialSell,
            TradeKind::SwitchSell,
            TradeKind::SwitchBuy,
            TradeKind::Close,
        ] {
            assert_eq!(TradeKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(TradeKind::from_name("rebalance"), None);
    }

    #[test]
    fn switches_counted_per_sleeve_and_month() {
        let history = vec![
            record(TradeKind::SwitchSell, Sleeve::Stable, 2024, 6, 3),
            record(TradeKind::SwitchBuy, Sleeve::Stable, 2024, 6, 3),
            record(TradeKind::SwitchSell, Sleeve::Stable, 2024, 6, 12),
            record(TradeKind::SwitchSell, Sleeve::Aggressive, 2024, 6, 12),
            record(TradeKind::SwitchSell, Sleeve::Stable, 2024, 5, 30),
            record(TradeKind::Sell, Sleeve::Stable, 2024, 6, 20),
        ];
        let june = NaiveDate::from_ymd_opt(2024, 6, 25).unwrap();
        assert_eq!(switches_in_month(&history, Sleeve::Stable, june), 2);
        assert_eq!(switches_in_month(&history, Sleeve::Aggressive, june), 1);
        assert_eq!(switches_in_month(&history, Sleeve::Arbitrage, june), 0);
        let may = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(switches_in_month(&history, Sleeve::Stable, may), 1);
    }

    #[test]
    fn empty_history_counts_zero() {
        let june = NaiveDate::from_ymd_opt(2024, 6, 25).unwrap();
        assert_eq!(switches_in_month(&[], Sleeve::Stable, june), 0);
    }
}
