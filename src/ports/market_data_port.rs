//! Market data access port trait.
//!
//! The engine never fetches data itself; every per-instrument request
//! goes through this seam. Calls are blocking and issued at most once
//! per instrument per concern within a cycle.

use crate::domain::candidate::Candidate;
use crate::domain::error::StrategyError;
use crate::domain::event::{CorporateEvent, PolicyEvent};
use crate::domain::series::{InstrumentSeries, RealtimeQuote, Valuation};

pub trait MarketDataPort {
    /// Daily series, oldest first. Twenty or more bars are expected but
    /// not guaranteed.
    fn get_series(&self, code: &str) -> Result<InstrumentSeries, StrategyError>;

    fn get_valuation(&self, code: &str) -> Result<Valuation, StrategyError>;

    /// Sentiment score; positive means constructive.
    fn get_sentiment(&self, code: &str) -> Result<f64, StrategyError>;

    fn get_realtime(&self, code: &str) -> Result<RealtimeQuote, StrategyError>;

    /// Corporate events within the provider's evaluation window.
    fn get_events(&self, code: &str) -> Result<Vec<CorporateEvent>, StrategyError>;

    fn get_policy_events(&self, code: &str) -> Result<Vec<PolicyEvent>, StrategyError>;

    /// Related instruments for the cross-market detector.
    fn get_related(&self, code: &str) -> Result<Vec<Candidate>, StrategyError>;
}
