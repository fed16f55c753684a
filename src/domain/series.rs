//! Daily bar and instrument series representation.

use chrono::NaiveDate;

use crate::domain::error::StrategyError;

/// One daily bar. `ma20`/`volume_ma5` are optional precomputed values a
/// data source may supply; when present they take precedence over
/// locally derived figures.
#[derive(Debug, Clone)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub ma20: Option<f64>,
    pub volume_ma5: Option<f64>,
}

/// Ordered daily series for one instrument, oldest first.
///
/// Invariant: strictly increasing dates (no duplicates), enforced at
/// construction.
#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    pub code: String,
    bars: Vec<DailyBar>,
}

impl InstrumentSeries {
    pub fn new(code: impl Into<String>, bars: Vec<DailyBar>) -> Result<Self, StrategyError> {
        let code = code.into();
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(StrategyError::Computation {
                    reason: format!(
                        "series for {} not strictly chronological at {}",
                        code, pair[1].date
                    ),
                });
            }
        }
        Ok(Self { code, bars })
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar.
    pub fn latest(&self) -> Option<&DailyBar> {
        self.bars.last()
    }

    /// Bar `offset` trading days before the latest (0 = latest).
    pub fn back(&self, offset: usize) -> Option<&DailyBar> {
        self.bars.len().checked_sub(offset + 1).map(|i| &self.bars[i])
    }

    /// Fails with `InsufficientData` when fewer than `minimum` bars are
    /// available. Callers treat this as "condition not satisfied".
    pub fn require(&self, minimum: usize) -> Result<(), StrategyError> {
        if self.bars.len() < minimum {
            return Err(StrategyError::InsufficientData {
                code: self.code.clone(),
                bars: self.bars.len(),
                minimum,
            });
        }
        Ok(())
    }
}

/// Realtime quote for premium/discount detection. `iopv` is absent when
/// the source does not publish a fair-value reference.
#[derive(Debug, Clone)]
pub struct RealtimeQuote {
    pub price: f64,
    pub iopv: Option<f64>,
    pub volume: i64,
}

/// Valuation snapshot for an instrument.
#[derive(Debug, Clone, Copy)]
pub struct Valuation {
    pub percentile: f64,
}
