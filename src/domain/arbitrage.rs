//! Arbitrage detectors and the opportunity combiner.
//!
//! Three independent checks run over the candidate universe each cycle:
//! premium/discount against IOPV, upcoming corporate events, and
//! cross-market pair spreads. Each yields at most one opportunity per
//! instrument (or pair); the combiner ranks, floors and deduplicates.

use chrono::NaiveDate;

use crate::domain::candidate::{Candidate, Category};
use crate::domain::event::CorporateEvent;
use crate::domain::position::Direction;
use crate::domain::series::RealtimeQuote;

pub const PREMIUM_MIN_RATE: f64 = 0.01;
pub const PREMIUM_MIN_VOLUME: i64 = 5_000_000;
pub const PREMIUM_FEE: f64 = 0.001;

pub const EVENT_HORIZON_DAYS: i64 = 3;
pub const EVENT_EXPECTED_RETURN: f64 = 0.015;

pub const PAIR_MIN_SPREAD: f64 = 0.005;
pub const PAIR_MIN_VOLUME: i64 = 3_000_000;
pub const PAIR_FEE: f64 = 0.002;

pub const EXPECTED_RETURN_FLOOR: f64 = 0.003;
pub const MAX_OPPORTUNITIES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpportunityKind {
    Premium,
    Event,
    CrossMarket,
}

impl OpportunityKind {
    pub fn priority(&self) -> u8 {
        match self {
            OpportunityKind::Premium => 3,
            OpportunityKind::Event => 2,
            OpportunityKind::CrossMarket => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OpportunityKind::Premium => "premium",
            OpportunityKind::Event => "event",
            OpportunityKind::CrossMarket => "cross_market",
        }
    }
}

/// Candidate opportunity, recomputed every cycle.
#[derive(Debug, Clone)]
pub struct ArbitrageOpportunity {
    pub kind: OpportunityKind,
    pub code: String,
    pub name: String,
    pub category: Category,
    /// Second leg of a cross-market pair (code, name).
    pub pair: Option<(String, String)>,
    pub direction: Direction,
    pub expected_return: f64,
    pub reason: String,
}

impl ArbitrageOpportunity {
    pub fn priority(&self) -> u8 {
        self.kind.priority()
    }
}

/// Premium/discount against IOPV. Fires when the absolute rate reaches
/// 1% on sufficient volume; fee-adjusted expected return.
pub fn detect_premium(
    candidate: &Candidate,
    quote: &RealtimeQuote,
) -> Option<ArbitrageOpportunity> {
    let iopv = quote.iopv?;
    if iopv <= 0.0 || quote.volume < PREMIUM_MIN_VOLUME {
        return None;
    }
    let rate = (quote.price - iopv) / iopv;
    if rate.abs() < PREMIUM_MIN_RATE {
        return None;
    }
    let direction = if rate <= -PREMIUM_MIN_RATE {
        Direction::Buy
    } else {
        Direction::Sell
    };
    Some(ArbitrageOpportunity {
        kind: OpportunityKind::Premium,
        code: candidate.code.clone(),
        name: candidate.name.clone(),
        category: candidate.category,
        pair: None,
        direction,
        expected_return: rate.abs() - PREMIUM_FEE,
        reason: format!("{:.2}% premium/discount vs iopv", rate * 100.0),
    })
}

/// Corporate events landing within the next three days, ranked
/// share-conversion over dividend over constituent-rebalance.
pub fn detect_event(
    candidate: &Candidate,
    events: &[CorporateEvent],
    today: NaiveDate,
) -> Option<ArbitrageOpportunity> {
    let best = events
        .iter()
        .filter(|e| (0..=EVENT_HORIZON_DAYS).contains(&(e.date - today).num_days()))
        .filter_map(|e| e.kind.arbitrage_rank().map(|rank| (rank, e)))
        .max_by_key(|(rank, _)| *rank)?;
    let (_, event) = best;
    Some(ArbitrageOpportunity {
        kind: OpportunityKind::Event,
        code: candidate.code.clone(),
        name: candidate.name.clone(),
        category: candidate.category,
        pair: None,
        direction: Direction::Buy,
        expected_return: EVENT_EXPECTED_RETURN,
        reason: format!(
            "{} scheduled {}",
            event.kind.name(),
            event.date.format("%Y-%m-%d")
        ),
    })
}

/// Cross-market spread against related instruments. Among multiple
/// related legs only the widest fee-adjusted spread survives.
pub fn detect_pair(
    candidate: &Candidate,
    quote: &RealtimeQuote,
    related: &[(Candidate, RealtimeQuote)],
) -> Option<ArbitrageOpportunity> {
    let mut best: Option<(f64, ArbitrageOpportunity)> = None;
    for (leg, leg_quote) in related {
        if leg_quote.price <= 0.0 {
            continue;
        }
        if quote.volume < PAIR_MIN_VOLUME || leg_quote.volume < PAIR_MIN_VOLUME {
            continue;
        }
        let spread = (quote.price - leg_quote.price) / leg_quote.price;
        if spread.abs() < PAIR_MIN_SPREAD {
            continue;
        }
        let expected = spread.abs() - PAIR_FEE;
        if best.as_ref().is_some_and(|(e, _)| *e >= expected) {
            continue;
        }
        // Rich primary leg gets sold, cheap one gets bought.
        let direction = if spread > 0.0 {
            Direction::Sell
        } else {
            Direction::Buy
        };
        best = Some((
            expected,
            ArbitrageOpportunity {
                kind: OpportunityKind::CrossMarket,
                code: candidate.code.clone(),
                name: candidate.name.clone(),
                category: candidate.category,
                pair: Some((leg.code.clone(), leg.name.clone())),
                direction,
                expected_return: expected,
                reason: format!(
                    "{:.2}% spread vs {}",
                    spread * 100.0,
                    leg.code
                ),
            },
        ));
    }
    best.map(|(_, opp)| opp)
}

/// Rank by (priority desc, expected return desc), drop everything under
/// the fee floor, then keep at most one opportunity per kind, unless
/// fewer than three kinds are present, in which case the list is topped
/// up to three from the remainder in rank order.
pub fn combine(mut opportunities: Vec<ArbitrageOpportunity>) -> Vec<ArbitrageOpportunity> {
    opportunities.retain(|o| o.expected_return >= EXPECTED_RETURN_FLOOR);
    opportunities.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then(b.expected_return.total_cmp(&a.expected_return))
    });

    let mut picked: Vec<ArbitrageOpportunity> = Vec::new();
    let mut rest: Vec<ArbitrageOpportunity> = Vec::new();
    for opp in opportunities {
        if picked.iter().any(|p| p.kind == opp.kind) {
            rest.push(opp);
        } else {
            picked.push(opp);
        }
    }
    for opp in rest {
        if picked.len() >= MAX_OPPORTUNITIES {
            break;
        }
        picked.push(opp);
    }
    picked.truncate(MAX_OPPORTUNITIES);
    picked.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then(b.expected_return.total_cmp(&a.expected_return))
    });
    picked
}
