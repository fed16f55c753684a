//! Position ledger: the sole writer of position state.
//!
//! Applying a decision emits the trade records for that sleeve (switches
//! and pair trades emit two) and then mutates the book. Persistence of
//! the whole book happens once per cycle, after all three sleeves.

use chrono::NaiveDateTime;

use crate::domain::engine::Decision;
use crate::domain::position::{ArbitragePosition, PositionBook, SwingPosition};
use crate::domain::sleeve::Sleeve;
use crate::domain::trade::{TradeKind, TradeRecord};

fn record(
    kind: TradeKind,
    sleeve: Sleeve,
    code: &str,
    name: &str,
    amount: f64,
    reason: &str,
    timestamp: NaiveDateTime,
) -> TradeRecord {
    TradeRecord {
        kind,
        sleeve,
        code: code.to_string(),
        name: name.to_string(),
        amount,
        reason: reason.to_string(),
        timestamp,
    }
}

/// Apply one sleeve's decision: emit its trade records, then mutate the
/// book. Records are returned in append order (sell leg before buy leg).
pub fn apply(
    book: &mut PositionBook,
    sleeve: Sleeve,
    decision: &Decision,
    now: NaiveDateTime,
) -> Vec<TradeRecord> {
    let today = now.date();
    match decision {
        Decision::Hold { .. } => Vec::new(),

        Decision::Buy {
            candidate,
            price,
            ratio,
            amount,
            reason,
        } => {
            let records = vec![record(
                TradeKind::Buy,
                sleeve,
                &candidate.code,
                &candidate.name,
                *amount,
                reason,
                now,
            )];
            book.set_swing(
                sleeve,
                Some(SwingPosition {
                    code: candidate.code.clone(),
                    name: candidate.name.clone(),
                    category: candidate.category,
                    position_ratio: *ratio,
                    buy_price: *price,
                    buy_date: today,
                    last_add_date: Some(today),
                }),
            );
            records
        }

        Decision::Add {
            code,
            name,
            amount,
            ratio,
            reason,
        } => {
            let records = vec![record(
                TradeKind::Add,
                sleeve,
                code,
                name,
                *amount,
                reason,
                now,
            )];
            if let Some(pos) = match sleeve {
                Sleeve::Stable => book.stable.as_mut(),
                Sleeve::Aggressive => book.aggressive.as_mut(),
                Sleeve::Arbitrage => None,
            } {
                pos.position_ratio = *ratio;
                pos.last_add_date = Some(today);
            }
            records
        }

        Decision::PartialSell {
            code,
            name,
            amount,
            ratio,
            reason,
        } => {
            let records = vec![record(
                TradeKind::PartialSell,
                sleeve,
                code,
                name,
                *amount,
                reason,
                now,
            )];
            if let Some(pos) = match sleeve {
                Sleeve::Stable => book.stable.as_mut(),
                Sleeve::Aggressive => book.aggressive.as_mut(),
                Sleeve::Arbitrage => None,
            } {
                pos.position_ratio = *ratio;
            }
            records
        }

        Decision::Sell {
            code,
            name,
            amount,
            reason,
            ..
        } => {
            let records = vec![record(
                TradeKind::Sell,
                sleeve,
                code,
                name,
                *amount,
                reason,
                now,
            )];
            book.set_swing(sleeve, None);
            records
        }

        Decision::Switch {
            outgoing_code,
            outgoing_name,
            incoming,
            price,
            ratio,
            sell_amount,
            buy_amount,
            reason,
        } => {
            let records = vec![
                record(
                    TradeKind::SwitchSell,
                    sleeve,
                    outgoing_code,
                    outgoing_name,
                    *sell_amount,
                    reason,
                    now,
                ),
                record(
                    TradeKind::SwitchBuy,
                    sleeve,
                    &incoming.code,
                    &incoming.name,
                    *buy_amount,
                    reason,
                    now,
                ),
            ];
            book.set_swing(
                sleeve,
                Some(SwingPosition {
                    code: incoming.code.clone(),
                    name: incoming.name.clone(),
                    category: incoming.category,
                    position_ratio: *ratio,
                    buy_price: *price,
                    buy_date: today,
                    last_add_date: Some(today),
                }),
            );
            records
        }

        Decision::OpenArbitrage {
            opportunity,
            price,
            amount,
            reason,
        } => {
            let kind = match opportunity.direction {
                crate::domain::position::Direction::Buy => TradeKind::Buy,
                crate::domain::position::Direction::Sell => TradeKind::Sell,
            };
            let mut records = Vec::new();
            if let Some((pair_code, pair_name)) = &opportunity.pair {
                // Pair trade: size split evenly across both legs.
                let leg = amount / 2.0;
                records.push(record(
                    kind,
                    sleeve,
                    &opportunity.code,
                    &opportunity.name,
                    leg,
                    reason,
                    now,
                ));
                records.push(record(kind, sleeve, pair_code, pair_name, leg, reason, now));
            } else {
                records.push(record(
                    kind,
                    sleeve,
                    &opportunity.code,
                    &opportunity.name,
                    *amount,
                    reason,
                    now,
                ));
            }
            book.arbitrage = Some(ArbitragePosition {
                code: opportunity.code.clone(),
                name: opportunity.name.clone(),
                category: opportunity.category,
                direction: opportunity.direction,
                open_price: *price,
                open_date: today,
                expected_return: opportunity.expected_return,
            });
            records
        }

        Decision::Close {
            code,
            name,
            amount,
            reason,
            ..
        } => {
            let records = vec![record(
                TradeKind::Close,
                sleeve,
                code,
                name,
                *amount,
                reason,
                now,
            )];
            book.arbitrage = None;
            records
        }
    }
}
