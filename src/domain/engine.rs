//! Per-sleeve evaluation state machines and cycle orchestration.
//!
//! One cycle: load authoritative state, classify the market environment,
//! evaluate each sleeve against fresh provider data, hand every decision
//! to the ledger, persist the book once, and emit a human-readable
//! summary. A sleeve whose data is degraded simply holds; only a failure
//! to load positions or history aborts the cycle.

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::arbitrage::{
    self, combine, detect_event, detect_pair, detect_premium, ArbitrageOpportunity,
};
use crate::domain::candidate::{switch_score, Candidate};
use crate::domain::environment::{CapitalSplit, MarketEnvironment};
use crate::domain::error::StrategyError;
use crate::domain::ledger;
use crate::domain::position::{PositionBook, SwingPosition};
use crate::domain::series::RealtimeQuote;
use crate::domain::signal::{
    check_add, check_buy, check_liquidation, check_sell, Verdict,
};
use crate::domain::sleeve::Sleeve;
use crate::domain::trade::switches_in_month;
use crate::ports::candidate_port::CandidatePort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::state_port::StatePort;

pub const MAX_SWITCHES_PER_MONTH: usize = 3;
/// Close an arbitrage position once this fraction of its recorded
/// expected return is realized.
pub const PROFIT_CAPTURE_FRACTION: f64 = 0.8;

/// Engine sizing and benchmark configuration. The static split sizes the
/// sleeves; the environment-driven split tables stay observational.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub total_capital: f64,
    pub benchmark: String,
    pub split: CapitalSplit,
}

impl EngineConfig {
    pub fn new(total_capital: f64, benchmark: impl Into<String>) -> Self {
        EngineConfig {
            total_capital,
            benchmark: benchmark.into(),
            split: CapitalSplit {
                stable: 0.60,
                aggressive: 0.30,
                arbitrage: 0.10,
            },
        }
    }

    pub fn capital_for(&self, sleeve: Sleeve) -> f64 {
        let fraction = match sleeve {
            Sleeve::Stable => self.split.stable,
            Sleeve::Aggressive => self.split.aggressive,
            Sleeve::Arbitrage => self.split.arbitrage,
        };
        self.total_capital * fraction
    }
}

/// Transient output of one sleeve evaluation; input to the ledger.
#[derive(Debug, Clone)]
pub enum Decision {
    Hold {
        reason: String,
    },
    Buy {
        candidate: Candidate,
        price: f64,
        ratio: f64,
        amount: f64,
        reason: String,
    },
    Add {
        code: String,
        name: String,
        amount: f64,
        ratio: f64,
        reason: String,
    },
    PartialSell {
        code: String,
        name: String,
        amount: f64,
        ratio: f64,
        reason: String,
    },
    Sell {
        code: String,
        name: String,
        amount: f64,
        forced: bool,
        reason: String,
    },
    Switch {
        outgoing_code: String,
        outgoing_name: String,
        incoming: Candidate,
        price: f64,
        ratio: f64,
        sell_amount: f64,
        buy_amount: f64,
        reason: String,
    },
    OpenArbitrage {
        opportunity: ArbitrageOpportunity,
        price: f64,
        amount: f64,
        reason: String,
    },
    Close {
        code: String,
        name: String,
        amount: f64,
        forced: bool,
        reason: String,
    },
}

impl Decision {
    pub fn action(&self) -> &'static str {
        match self {
            Decision::Hold { .. } => "hold",
            Decision::Buy { .. } => "buy",
            Decision::Add { .. } => "add",
            Decision::PartialSell { .. } => "partial_sell",
            Decision::Sell { .. } => "sell",
            Decision::Switch { .. } => "switch",
            // Arbitrage opens read as their trade direction.
            Decision::OpenArbitrage { opportunity, .. } => opportunity.direction.name(),
            Decision::Close { .. } => "close",
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Decision::Hold { .. })
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Decision::Hold { .. } => None,
            Decision::Buy { candidate, .. } => Some(&candidate.code),
            Decision::Add { code, .. }
            | Decision::PartialSell { code, .. }
            | Decision::Sell { code, .. }
            | Decision::Close { code, .. } => Some(code),
            Decision::Switch { incoming, .. } => Some(&incoming.code),
            Decision::OpenArbitrage { opportunity, .. } => Some(&opportunity.code),
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Decision::Hold { reason, .. }
            | Decision::Buy { reason, .. }
            | Decision::Add { reason, .. }
            | Decision::PartialSell { reason, .. }
            | Decision::Sell { reason, .. }
            | Decision::Switch { reason, .. }
            | Decision::OpenArbitrage { reason, .. }
            | Decision::Close { reason, .. } => reason,
        }
    }

    /// Position ratio after this decision, where one is defined.
    pub fn resulting_ratio(&self) -> Option<f64> {
        match self {
            Decision::Buy { ratio, .. }
            | Decision::Add { ratio, .. }
            | Decision::PartialSell { ratio, .. }
            | Decision::Switch { ratio, .. } => Some(*ratio),
            Decision::Sell { .. } | Decision::Close { .. } => Some(0.0),
            Decision::Hold { .. } | Decision::OpenArbitrage { .. } => None,
        }
    }
}

/// Combined output of one evaluation cycle.
#[derive(Debug, Clone)]
pub struct StrategyResult {
    pub timestamp: NaiveDateTime,
    pub environment: MarketEnvironment,
    /// Suggested cross-sleeve split for the environment (observational).
    pub suggested_split: CapitalSplit,
    pub stable: Decision,
    pub aggressive: Decision,
    pub arbitrage: Decision,
    pub summary: String,
}

pub struct StrategyEngine<'a> {
    market: &'a dyn MarketDataPort,
    candidates: &'a dyn CandidatePort,
    state: &'a dyn StatePort,
    config: EngineConfig,
}

impl<'a> StrategyEngine<'a> {
    pub fn new(
        market: &'a dyn MarketDataPort,
        candidates: &'a dyn CandidatePort,
        state: &'a dyn StatePort,
        config: EngineConfig,
    ) -> Self {
        StrategyEngine {
            market,
            candidates,
            state,
            config,
        }
    }

    /// Run one decision cycle. Fails only when authoritative state
    /// cannot be loaded or written back.
    pub fn run_cycle(&self, now: NaiveDateTime) -> Result<StrategyResult, StrategyError> {
        let mut book = self.state.load_positions()?;
        let history = self.state.trade_history()?;
        let today = now.date();

        let environment = self.classify_environment();

        let stable = self.evaluate_swing(Sleeve::Stable, &book, &history, today);
        let aggressive = self.evaluate_swing(Sleeve::Aggressive, &book, &history, today);
        let arbitrage = self.evaluate_arbitrage(&book, today);

        for (sleeve, decision) in [
            (Sleeve::Stable, &stable),
            (Sleeve::Aggressive, &aggressive),
            (Sleeve::Arbitrage, &arbitrage),
        ] {
            for record in ledger::apply(&mut book, sleeve, decision, now) {
                self.state.append_trade(&record)?;
            }
        }
        self.state.save_positions(&book)?;

        let summary = summarize(&[
            (Sleeve::Stable, &stable),
            (Sleeve::Aggressive, &aggressive),
            (Sleeve::Arbitrage, &arbitrage),
        ]);

        Ok(StrategyResult {
            timestamp: now,
            environment,
            suggested_split: environment.capital_split(),
            stable,
            aggressive,
            arbitrage,
            summary,
        })
    }

    /// Degrades to the sideways regime when benchmark data is missing.
    fn classify_environment(&self) -> MarketEnvironment {
        self.market
            .get_series(&self.config.benchmark)
            .and_then(|series| MarketEnvironment::classify(&series))
            .unwrap_or(MarketEnvironment::Shock)
    }

    fn evaluate_swing(
        &self,
        sleeve: Sleeve,
        book: &PositionBook,
        history: &[crate::domain::trade::TradeRecord],
        today: NaiveDate,
    ) -> Decision {
        let params = sleeve.params();
        let capital = self.config.capital_for(sleeve);
        let candidates = self.candidates.get_candidates(sleeve).unwrap_or_default();

        let Some(position) = book.swing(sleeve) else {
            for candidate in &candidates {
                if let Some((verdict, price)) = self.probe_buy(candidate, sleeve) {
                    if verdict.satisfied {
                        return Decision::Buy {
                            candidate: candidate.clone(),
                            price,
                            ratio: params.entry_ratio,
                            amount: params.entry_ratio * capital,
                            reason: verdict.reason,
                        };
                    }
                }
            }
            return Decision::Hold {
                reason: "no candidate passed the buy check".to_string(),
            };
        };

        let series = match self.market.get_series(&position.code) {
            Ok(series) => series,
            Err(err) => {
                return Decision::Hold {
                    reason: format!("market data degraded for {} ({err})", position.code),
                }
            }
        };

        let events = self.market.get_events(&position.code).unwrap_or_default();
        let policy = self
            .market
            .get_policy_events(&position.code)
            .unwrap_or_default();
        let liquidation = check_liquidation(sleeve, &events, &policy, None, today);
        if liquidation.satisfied {
            return Decision::Sell {
                code: position.code.clone(),
                name: position.name.clone(),
                amount: position.position_ratio * capital,
                forced: true,
                reason: format!("forced liquidation: {}", liquidation.reason),
            };
        }

        let sell = check_sell(&series, position.buy_price, sleeve);
        if sell.satisfied {
            if let Some(decision) =
                self.try_switch(sleeve, position, &candidates, history, today, &sell.reason)
            {
                return decision;
            }
            if sleeve == Sleeve::Stable && position.position_ratio > params.entry_ratio {
                let new_ratio = position.position_ratio / 2.0;
                return Decision::PartialSell {
                    code: position.code.clone(),
                    name: position.name.clone(),
                    amount: new_ratio * capital,
                    ratio: new_ratio,
                    reason: sell.reason,
                };
            }
            return Decision::Sell {
                code: position.code.clone(),
                name: position.name.clone(),
                amount: position.position_ratio * capital,
                forced: false,
                reason: sell.reason,
            };
        }

        if position.position_ratio < params.ceiling {
            let add = check_add(&series, position.last_add_date);
            if add.satisfied {
                let step = params.add_step.min(params.ceiling - position.position_ratio);
                return Decision::Add {
                    code: position.code.clone(),
                    name: position.name.clone(),
                    amount: step * capital,
                    ratio: position.position_ratio + step,
                    reason: add.reason,
                };
            }
        }

        Decision::Hold {
            reason: "no exit, switch or add trigger".to_string(),
        }
    }

    /// Rotation into a better candidate, only meaningful once the current
    /// holding has triggered its own sell check. Rate-limited per
    /// calendar month from trade history.
    fn try_switch(
        &self,
        sleeve: Sleeve,
        position: &SwingPosition,
        candidates: &[Candidate],
        history: &[crate::domain::trade::TradeRecord],
        today: NaiveDate,
        exit_reason: &str,
    ) -> Option<Decision> {
        let capital = self.config.capital_for(sleeve);
        if switches_in_month(history, sleeve, today) >= MAX_SWITCHES_PER_MONTH {
            return None;
        }
        let mut best: Option<(f64, &Candidate, Verdict, f64)> = None;
        for candidate in candidates {
            if candidate.code == position.code {
                continue;
            }
            let Some((verdict, price)) = self.probe_buy(candidate, sleeve) else {
                continue;
            };
            if !verdict.satisfied {
                continue;
            }
            let score = switch_score(candidate);
            if best.as_ref().is_none_or(|(s, ..)| score > *s) {
                best = Some((score, candidate, verdict, price));
            }
        }
        let (_, incoming, verdict, price) = best?;
        let params = sleeve.params();
        Some(Decision::Switch {
            outgoing_code: position.code.clone(),
            outgoing_name: position.name.clone(),
            incoming: incoming.clone(),
            price,
            ratio: params.entry_ratio,
            sell_amount: position.position_ratio * capital,
            buy_amount: params.entry_ratio * capital,
            reason: format!("exit: {exit_reason}; entry: {}", verdict.reason),
        })
    }

    /// Buy check with provider fetches guarded: a failed fetch turns
    /// into a rejection reason instead of an error. Returns the verdict
    /// plus the latest close as the execution reference price.
    fn probe_buy(&self, candidate: &Candidate, sleeve: Sleeve) -> Option<(Verdict, f64)> {
        let series = match self.market.get_series(&candidate.code) {
            Ok(series) => series,
            Err(err) => {
                return Some((
                    Verdict::no(format!("series unavailable ({err})")),
                    0.0,
                ))
            }
        };
        let price = series.latest()?.close;

        let valuation = if sleeve == Sleeve::Stable {
            match self.market.get_valuation(&candidate.code) {
                Ok(v) => v.percentile,
                Err(err) => {
                    return Some((Verdict::no(format!("valuation unavailable ({err})")), price))
                }
            }
        } else {
            candidate.valuation_percentile
        };
        let sentiment = if sleeve == Sleeve::Aggressive {
            match self.market.get_sentiment(&candidate.code) {
                Ok(score) => score,
                Err(err) => {
                    return Some((Verdict::no(format!("sentiment unavailable ({err})")), price))
                }
            }
        } else {
            0.0
        };

        Some((check_buy(&series, sleeve, valuation, sentiment), price))
    }

    fn evaluate_arbitrage(&self, book: &PositionBook, today: NaiveDate) -> Decision {
        let params = Sleeve::Arbitrage.params();
        let capital = self.config.capital_for(Sleeve::Arbitrage);

        if let Some(position) = &book.arbitrage {
            let events = self.market.get_events(&position.code).unwrap_or_default();
            let policy = self
                .market
                .get_policy_events(&position.code)
                .unwrap_or_default();
            let liquidation = check_liquidation(
                Sleeve::Arbitrage,
                &events,
                &policy,
                Some(position.age_days(today)),
                today,
            );
            if liquidation.satisfied {
                return Decision::Close {
                    code: position.code.clone(),
                    name: position.name.clone(),
                    amount: params.entry_ratio * capital,
                    forced: true,
                    reason: format!("forced liquidation: {}", liquidation.reason),
                };
            }

            let price = self
                .market
                .get_realtime(&position.code)
                .map(|quote| quote.price)
                .ok()
                .or_else(|| {
                    self.market
                        .get_series(&position.code)
                        .ok()
                        .and_then(|s| s.latest().map(|bar| bar.close))
                });
            return match price {
                Some(price) => {
                    let captured = position.realized_return(price).is_some_and(|realized| {
                        position.expected_return > 0.0
                            && realized >= PROFIT_CAPTURE_FRACTION * position.expected_return
                    });
                    if captured {
                        Decision::Close {
                            code: position.code.clone(),
                            name: position.name.clone(),
                            amount: params.entry_ratio * capital,
                            forced: false,
                            reason: format!(
                                "realized {:.0}% of the {:.2}% expected return",
                                PROFIT_CAPTURE_FRACTION * 100.0,
                                position.expected_return * 100.0
                            ),
                        }
                    } else {
                        Decision::Hold {
                            reason: "arbitrage position within targets".to_string(),
                        }
                    }
                }
                None => Decision::Hold {
                    reason: format!("pricing degraded for {}", position.code),
                },
            };
        }

        let universe = self
            .candidates
            .get_candidates(Sleeve::Arbitrage)
            .unwrap_or_default();
        let mut hits: Vec<ArbitrageOpportunity> = Vec::new();
        for candidate in &universe {
            let quote = self.market.get_realtime(&candidate.code).ok();
            if let Some(quote) = &quote {
                if let Some(opp) = detect_premium(candidate, quote) {
                    hits.push(opp);
                }
                let related = self.related_quotes(&candidate.code);
                if let Some(opp) = detect_pair(candidate, quote, &related) {
                    hits.push(opp);
                }
            }
            let events = self.market.get_events(&candidate.code).unwrap_or_default();
            if let Some(opp) = detect_event(candidate, &events, today) {
                hits.push(opp);
            }
        }

        let ranked = combine(hits);
        let Some(top) = ranked.into_iter().next() else {
            return Decision::Hold {
                reason: format!(
                    "no arbitrage opportunity above the {:.1}% floor",
                    arbitrage::EXPECTED_RETURN_FLOOR * 100.0
                ),
            };
        };

        let price = self
            .market
            .get_realtime(&top.code)
            .map(|quote| quote.price)
            .ok()
            .or_else(|| {
                self.market
                    .get_series(&top.code)
                    .ok()
                    .and_then(|s| s.latest().map(|bar| bar.close))
            });
        match price {
            Some(price) => {
                let amount = (params.entry_ratio * capital).min(capital);
                Decision::OpenArbitrage {
                    reason: top.reason.clone(),
                    opportunity: top,
                    price,
                    amount,
                }
            }
            None => Decision::Hold {
                reason: format!("pricing degraded for {}", top.code),
            },
        }
    }

    fn related_quotes(&self, code: &str) -> Vec<(Candidate, RealtimeQuote)> {
        let related = self.market.get_related(code).unwrap_or_default();
        related
            .into_iter()
            .filter_map(|leg| {
                let quote = self.market.get_realtime(&leg.code).ok()?;
                Some((leg, quote))
            })
            .collect()
    }
}

const NO_ACTION_SUMMARY: &str = "all sleeves unchanged; no action suggested";

/// One line per non-hold sleeve: `"<sleeve>: <action> <code> (<reason>)"`.
pub fn summarize(decisions: &[(Sleeve, &Decision)]) -> String {
    let lines: Vec<String> = decisions
        .iter()
        .filter(|(_, decision)| !decision.is_hold())
        .map(|(sleeve, decision)| {
            format!(
                "{}: {} {} ({})",
                sleeve,
                decision.action(),
                decision.code().unwrap_or(""),
                decision.reason()
            )
        })
        .collect();
    if lines.is_empty() {
        NO_ACTION_SUMMARY.to_string()
    } else {
        lines.join("\n")
    }
}
