//! Moving averages and volume baselines derived from a series.
//!
//! Precomputed `ma20`/`volume_ma5` values on a bar take precedence over
//! locally derived figures (the data source may supply better-adjusted
//! numbers). Every accessor fails with `InsufficientData` when the
//! window does not fit; callers treat that as "condition not satisfied".

use crate::domain::error::StrategyError;
use crate::domain::series::InstrumentSeries;

pub const MA_WINDOW: usize = 20;
pub const VOLUME_MA_WINDOW: usize = 5;
pub const HIGH_WINDOW: usize = 10;

fn window_shortfall(series: &InstrumentSeries, index: usize, window: usize) -> Option<StrategyError> {
    if index >= series.len() || index + 1 < window {
        return Some(StrategyError::InsufficientData {
            code: series.code.clone(),
            bars: (index + 1).min(series.len()),
            minimum: window,
        });
    }
    None
}

/// 20-period simple moving average of close at `index`.
pub fn ma20_at(series: &InstrumentSeries, index: usize) -> Result<f64, StrategyError> {
    if index < series.len() {
        if let Some(value) = series.bars()[index].ma20 {
            return Ok(value);
        }
    }
    if let Some(err) = window_shortfall(series, index, MA_WINDOW) {
        return Err(err);
    }
    let window = &series.bars()[index + 1 - MA_WINDOW..=index];
    Ok(window.iter().map(|b| b.close).sum::<f64>() / MA_WINDOW as f64)
}

/// 5-period simple moving average of volume at `index`.
pub fn volume_ma5_at(series: &InstrumentSeries, index: usize) -> Result<f64, StrategyError> {
    if index < series.len() {
        if let Some(value) = series.bars()[index].volume_ma5 {
            return Ok(value);
        }
    }
    if let Some(err) = window_shortfall(series, index, VOLUME_MA_WINDOW) {
        return Err(err);
    }
    let window = &series.bars()[index + 1 - VOLUME_MA_WINDOW..=index];
    Ok(window.iter().map(|b| b.volume as f64).sum::<f64>() / VOLUME_MA_WINDOW as f64)
}

/// Highest high over the 10 bars ending at `index`, for pullback checks.
pub fn recent_high_at(series: &InstrumentSeries, index: usize) -> Result<f64, StrategyError> {
    if let Some(err) = window_shortfall(series, index, HIGH_WINDOW) {
        return Err(err);
    }
    let window = &series.bars()[index + 1 - HIGH_WINDOW..=index];
    Ok(window.iter().map(|b| b.high).fold(f64::MIN, f64::max))
}
