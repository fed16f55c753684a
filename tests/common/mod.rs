#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use etfsig::domain::candidate::{Candidate, Category};
use etfsig::domain::error::StrategyError;
use etfsig::domain::event::{CorporateEvent, PolicyEvent};
use etfsig::domain::position::PositionBook;
use etfsig::domain::series::{DailyBar, InstrumentSeries, RealtimeQuote, Valuation};
use etfsig::domain::sleeve::Sleeve;
use etfsig::domain::trade::TradeRecord;
use etfsig::ports::candidate_port::CandidatePort;
use etfsig::ports::market_data_port::MarketDataPort;
use etfsig::ports::state_port::StatePort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at_close(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(14, 0, 0).unwrap()
}

pub fn candidate(code: &str, category: Category) -> Candidate {
    Candidate {
        code: code.to_string(),
        name: format!("{code}-etf"),
        category,
        volume: 80_000_000,
        valuation_percentile: 35.0,
    }
}

/// Bars ending at `end`, one per day, with the given closes/volumes.
pub fn series_ending(
    code: &str,
    end: NaiveDate,
    closes: &[f64],
    volumes: &[i64],
) -> InstrumentSeries {
    assert_eq!(closes.len(), volumes.len());
    let start = end - chrono::Duration::days(closes.len() as i64 - 1);
    let bars = closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| DailyBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume,
            ma20: None,
            volume_ma5: None,
        })
        .collect();
    InstrumentSeries::new(code, bars).unwrap()
}

/// 25 rising bars satisfying the buy check (sustained breakout above a
/// rising ma20 plus a 1.3x volume surge on the last bar).
pub fn breakout_series(code: &str, end: NaiveDate) -> InstrumentSeries {
    let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
    let mut volumes = vec![10_000i64; 25];
    volumes[24] = 13_000;
    series_ending(code, end, &closes, &volumes)
}

/// Flat series: no buy, no sell, no add trigger.
pub fn flat_series(code: &str, end: NaiveDate, close: f64) -> InstrumentSeries {
    series_ending(code, end, &vec![close; 25], &vec![10_000i64; 25])
}

#[derive(Default)]
pub struct MockMarketData {
    pub series: HashMap<String, InstrumentSeries>,
    pub valuations: HashMap<String, f64>,
    pub sentiment: HashMap<String, f64>,
    pub realtime: HashMap<String, RealtimeQuote>,
    pub events: HashMap<String, Vec<CorporateEvent>>,
    pub policy_events: HashMap<String, Vec<PolicyEvent>>,
    pub related: HashMap<String, Vec<Candidate>>,
    pub series_errors: HashMap<String, String>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: InstrumentSeries) -> Self {
        self.series.insert(series.code.clone(), series);
        self
    }

    pub fn with_valuation(mut self, code: &str, percentile: f64) -> Self {
        self.valuations.insert(code.to_string(), percentile);
        self
    }

    pub fn with_sentiment(mut self, code: &str, score: f64) -> Self {
        self.sentiment.insert(code.to_string(), score);
        self
    }

    pub fn with_realtime(mut self, code: &str, quote: RealtimeQuote) -> Self {
        self.realtime.insert(code.to_string(), quote);
        self
    }

    pub fn with_events(mut self, code: &str, events: Vec<CorporateEvent>) -> Self {
        self.events.insert(code.to_string(), events);
        self
    }

    pub fn with_policy_events(mut self, code: &str, events: Vec<PolicyEvent>) -> Self {
        self.policy_events.insert(code.to_string(), events);
        self
    }

    pub fn with_related(mut self, code: &str, related: Vec<Candidate>) -> Self {
        self.related.insert(code.to_string(), related);
        self
    }

    pub fn with_series_error(mut self, code: &str, reason: &str) -> Self {
        self.series_errors
            .insert(code.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn get_series(&self, code: &str) -> Result<InstrumentSeries, StrategyError> {
        if let Some(reason) = self.series_errors.get(code) {
            return Err(StrategyError::provider("get_series", reason));
        }
        self.series
            .get(code)
            .cloned()
            .ok_or_else(|| StrategyError::provider("get_series", format!("no series for {code}")))
    }

    fn get_valuation(&self, code: &str) -> Result<Valuation, StrategyError> {
        self.valuations
            .get(code)
            .map(|&percentile| Valuation { percentile })
            .ok_or_else(|| StrategyError::provider("get_valuation", "no row"))
    }

    fn get_sentiment(&self, code: &str) -> Result<f64, StrategyError> {
        self.sentiment
            .get(code)
            .copied()
            .ok_or_else(|| StrategyError::provider("get_sentiment", "no row"))
    }

    fn get_realtime(&self, code: &str) -> Result<RealtimeQuote, StrategyError> {
        self.realtime
            .get(code)
            .cloned()
            .ok_or_else(|| StrategyError::provider("get_realtime", "no row"))
    }

    fn get_events(&self, code: &str) -> Result<Vec<CorporateEvent>, StrategyError> {
        Ok(self.events.get(code).cloned().unwrap_or_default())
    }

    fn get_policy_events(&self, code: &str) -> Result<Vec<PolicyEvent>, StrategyError> {
        Ok(self.policy_events.get(code).cloned().unwrap_or_default())
    }

    fn get_related(&self, code: &str) -> Result<Vec<Candidate>, StrategyError> {
        Ok(self.related.get(code).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MockCandidatePool {
    pub candidates: HashMap<&'static str, Vec<Candidate>>,
}

impl MockCandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidates(mut self, sleeve: Sleeve, candidates: Vec<Candidate>) -> Self {
        self.candidates.insert(sleeve.name(), candidates);
        self
    }
}

impl CandidatePort for MockCandidatePool {
    fn get_candidates(&self, sleeve: Sleeve) -> Result<Vec<Candidate>, StrategyError> {
        Ok(self
            .candidates
            .get(sleeve.name())
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory state store tracking every append and save.
#[derive(Default)]
pub struct MockStateStore {
    pub book: RefCell<PositionBook>,
    pub history: RefCell<Vec<TradeRecord>>,
    pub saves: RefCell<usize>,
    pub fail_load: bool,
}

impl MockStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_book(self, book: PositionBook) -> Self {
        *self.book.borrow_mut() = book;
        self
    }

    pub fn with_history(self, history: Vec<TradeRecord>) -> Self {
        *self.history.borrow_mut() = history;
        self
    }

    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }
}

impl StatePort for MockStateStore {
    fn load_positions(&self) -> Result<PositionBook, StrategyError> {
        if self.fail_load {
            return Err(StrategyError::store("positions unreadable"));
        }
        Ok(self.book.borrow().clone())
    }

    fn save_positions(&self, book: &PositionBook) -> Result<(), StrategyError> {
        *self.book.borrow_mut() = book.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn append_trade(&self, record: &TradeRecord) -> Result<(), StrategyError> {
        self.history.borrow_mut().push(record.clone());
        Ok(())
    }

    fn trade_history(&self) -> Result<Vec<TradeRecord>, StrategyError> {
        if self.fail_load {
            return Err(StrategyError::store("history unreadable"));
        }
        Ok(self.history.borrow().clone())
    }
}
