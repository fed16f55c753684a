//! Signal evaluators: buy, add, sell and forced-liquidation checks.
//!
//! Each check answers one question for one instrument and reports the
//! first failing condition as its reason. Indicator errors never escape:
//! they downgrade the check to "not satisfied" with the error text
//! folded into the reason.

use chrono::NaiveDate;

use crate::domain::error::StrategyError;
use crate::domain::event::{CorporateEvent, EventKind, PolicyEvent, PolicyImpact};
use crate::domain::indicator::{ma20_at, recent_high_at, volume_ma5_at};
use crate::domain::series::InstrumentSeries;
use crate::domain::sleeve::Sleeve;

pub const MIN_BARS: usize = 20;
/// Bars between the two ma20 samples of the trend condition.
pub const TREND_LOOKBACK: usize = 3;
pub const VOLUME_SURGE_RATIO: f64 = 1.2;
pub const STABLE_MAX_VALUATION: f64 = 60.0;

pub const ADD_SPACING_DAYS: i64 = 5;
pub const ADD_MAX_PULLBACK: f64 = 0.05;
pub const ADD_VOLUME_FLOOR: f64 = 0.7;
pub const ADD_VOLUME_CAP: f64 = 1.3;

pub const BLOWUP_LIQUIDATION_COUNT: usize = 3;
pub const POLICY_LOOKBACK_DAYS: i64 = 5;
pub const ARBITRAGE_MAX_HOLD_DAYS: i64 = 3;

/// Outcome of a boolean check with its explanation.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub satisfied: bool,
    pub reason: String,
}

impl Verdict {
    pub fn yes(reason: impl Into<String>) -> Self {
        Verdict {
            satisfied: true,
            reason: reason.into(),
        }
    }

    pub fn no(reason: impl Into<String>) -> Self {
        Verdict {
            satisfied: false,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellKind {
    ProfitTake,
    StopLoss,
    Technical,
    None,
}

#[derive(Debug, Clone)]
pub struct SellVerdict {
    pub satisfied: bool,
    pub kind: SellKind,
    pub reason: String,
}

impl SellVerdict {
    fn hit(kind: SellKind, reason: impl Into<String>) -> Self {
        SellVerdict {
            satisfied: true,
            kind,
            reason: reason.into(),
        }
    }

    fn miss(reason: impl Into<String>) -> Self {
        SellVerdict {
            satisfied: false,
            kind: SellKind::None,
            reason: reason.into(),
        }
    }
}

fn fold(err: StrategyError, what: &str) -> Verdict {
    Verdict::no(format!("{what} unavailable ({err})"))
}

/// Buy check: sustained close above a rising ma20 with a volume surge,
/// gated per sleeve (valuation for stable, sentiment for aggressive).
pub fn check_buy(
    series: &InstrumentSeries,
    sleeve: Sleeve,
    valuation_percentile: f64,
    sentiment: f64,
) -> Verdict {
    if let Err(err) = series.require(MIN_BARS) {
        return fold(err, "price history");
    }
    let last = series.len() - 1;

    let ma_latest = match ma20_at(series, last) {
        Ok(v) => v,
        Err(err) => return fold(err, "ma20"),
    };
    let ma_prev = match ma20_at(series, last - 1) {
        Ok(v) => v,
        Err(err) => return fold(err, "ma20"),
    };
    let close_latest = series.bars()[last].close;
    let close_prev = series.bars()[last - 1].close;
    if close_latest <= ma_latest || close_prev <= ma_prev {
        return Verdict::no("close not sustained above ma20 over the last two bars");
    }

    let ma_trend_base = match last
        .checked_sub(TREND_LOOKBACK)
        .ok_or(StrategyError::InsufficientData {
            code: series.code.clone(),
            bars: series.len(),
            minimum: MIN_BARS + TREND_LOOKBACK,
        })
        .and_then(|i| ma20_at(series, i))
    {
        Ok(v) => v,
        Err(err) => return fold(err, "ma20 trend"),
    };
    if ma_latest <= ma_trend_base {
        return Verdict::no("ma20 not rising against three bars prior");
    }

    let volume_ma = match volume_ma5_at(series, last) {
        Ok(v) => v,
        Err(err) => return fold(err, "volume baseline"),
    };
    if (series.bars()[last].volume as f64) < VOLUME_SURGE_RATIO * volume_ma {
        return Verdict::no("volume below 1.2x the 5-day average");
    }

    match sleeve {
        Sleeve::Stable => {
            if valuation_percentile >= STABLE_MAX_VALUATION {
                return Verdict::no(format!(
                    "valuation percentile {:.0} not below {:.0}",
                    valuation_percentile, STABLE_MAX_VALUATION
                ));
            }
        }
        Sleeve::Aggressive => {
            if sentiment <= 0.0 {
                return Verdict::no("sentiment not positive");
            }
        }
        Sleeve::Arbitrage => {}
    }

    Verdict::yes("sustained breakout above rising ma20 with volume surge")
}

/// Add-position check: spacing since the last add, a shallow pullback
/// holding above ma20, and volume inside the steady band.
pub fn check_add(series: &InstrumentSeries, last_add_date: Option<NaiveDate>) -> Verdict {
    let Some(latest) = series.latest() else {
        return Verdict::no("price history unavailable (empty series)");
    };

    if let Some(added) = last_add_date {
        let elapsed = (latest.date - added).num_days();
        if elapsed < ADD_SPACING_DAYS {
            return Verdict::no(format!(
                "only {elapsed} days since last add (need {ADD_SPACING_DAYS})"
            ));
        }
    }

    let last = series.len() - 1;
    let high = match recent_high_at(series, last) {
        Ok(v) => v,
        Err(err) => return fold(err, "10-bar high"),
    };
    if high <= 0.0 {
        return Verdict::no("10-bar high unavailable (non-positive)");
    }
    let pullback = (high - latest.close) / high;
    if pullback > ADD_MAX_PULLBACK {
        return Verdict::no(format!(
            "pullback {:.1}% deeper than {:.0}%",
            pullback * 100.0,
            ADD_MAX_PULLBACK * 100.0
        ));
    }
    let ma = match ma20_at(series, last) {
        Ok(v) => v,
        Err(err) => return fold(err, "ma20"),
    };
    if latest.close < ma {
        return Verdict::no("close below ma20");
    }

    let volume_ma = match volume_ma5_at(series, last) {
        Ok(v) => v,
        Err(err) => return fold(err, "volume baseline"),
    };
    if volume_ma <= 0.0 {
        return Verdict::no("volume baseline unavailable (zero)");
    }
    let ratio = latest.volume as f64 / volume_ma;
    if !(ADD_VOLUME_FLOOR..=ADD_VOLUME_CAP).contains(&ratio) {
        return Verdict::no(format!(
            "volume ratio {ratio:.2} outside [{ADD_VOLUME_FLOOR}, {ADD_VOLUME_CAP}]"
        ));
    }

    Verdict::yes("shallow pullback above ma20 with steady volume")
}

/// Sell check against cost basis. Thresholds are checked in order:
/// take-profit, stop-loss, then the technical exit; first match wins.
pub fn check_sell(series: &InstrumentSeries, buy_price: f64, sleeve: Sleeve) -> SellVerdict {
    let Some(latest) = series.latest() else {
        return SellVerdict::miss("price history unavailable (empty series)");
    };
    if buy_price <= 0.0 {
        return SellVerdict::miss("cost basis unavailable (non-positive buy price)");
    }
    let ret = (latest.close - buy_price) / buy_price;
    let params = sleeve.params();

    if ret >= params.take_profit {
        return SellVerdict::hit(
            SellKind::ProfitTake,
            format!(
                "return {:.1}% reached the {:.0}% take-profit",
                ret * 100.0,
                params.take_profit * 100.0
            ),
        );
    }
    if ret <= params.stop_loss {
        return SellVerdict::hit(
            SellKind::StopLoss,
            format!(
                "return {:.1}% breached the {:.0}% stop-loss",
                ret * 100.0,
                params.stop_loss * 100.0
            ),
        );
    }

    // Technical exit: two closes below a falling ma20.
    if series.len() >= 2 {
        let last = series.len() - 1;
        let below_both = match (ma20_at(series, last), ma20_at(series, last - 1)) {
            (Ok(ma_latest), Ok(ma_prev)) => {
                series.bars()[last].close < ma_latest && series.bars()[last - 1].close < ma_prev
            }
            _ => false,
        };
        let falling = match last
            .checked_sub(TREND_LOOKBACK)
            .map(|i| (ma20_at(series, last), ma20_at(series, i)))
        {
            Some((Ok(ma_latest), Ok(ma_base))) => ma_latest < ma_base,
            _ => false,
        };
        if below_both && falling {
            return SellVerdict::hit(
                SellKind::Technical,
                "two closes below a falling ma20".to_string(),
            );
        }
    }

    SellVerdict::miss("holding above thresholds and ma20")
}

/// Forced liquidation, overriding ordinary profit/loss logic: clustered
/// fundamental blow-ups among constituents, a fresh severe adverse
/// policy event, or (arbitrage only) an aged holding.
///
/// The provider scopes the corporate-event window; every supplied
/// blow-up counts.
pub fn check_liquidation(
    sleeve: Sleeve,
    events: &[CorporateEvent],
    policy_events: &[PolicyEvent],
    holding_age_days: Option<i64>,
    today: NaiveDate,
) -> Verdict {
    let blowups = events
        .iter()
        .filter(|e| e.kind == EventKind::FundamentalBlowup)
        .count();
    if blowups >= BLOWUP_LIQUIDATION_COUNT {
        return Verdict::yes(format!(
            "{blowups} fundamental blow-ups among constituents"
        ));
    }

    for event in policy_events {
        if event.impact == PolicyImpact::SevereAdverse {
            let age = (today - event.date).num_days();
            if (0..=POLICY_LOOKBACK_DAYS).contains(&age) {
                return Verdict::yes(format!(
                    "severe adverse policy event {age} days ago"
                ));
            }
        }
    }

    if sleeve == Sleeve::Arbitrage {
        if let Some(age) = holding_age_days {
            if age >= ARBITRAGE_MAX_HOLD_DAYS {
                return Verdict::yes(format!(
                    "arbitrage holding aged {age} days (limit {ARBITRAGE_MAX_HOLD_DAYS})"
                ));
            }
        }
    }

    Verdict::no("no liquidation trigger")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::DailyBar;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn series_from(closes: &[f64], volumes: &[i64]) -> InstrumentSeries {
        assert_eq!(closes.len(), volumes.len());
        let bars = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| DailyBar {
                date: day(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume,
                ma20: None,
                volume_ma5: None,
            })
            .collect();
        InstrumentSeries::new("510300", bars).unwrap()
    }

    /// 25 bars trending up: the last two closes sit above a rising ma20,
    /// and the latest volume is 1.3x the 5-day average.
    fn breakout_series() -> InstrumentSeries {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let mut volumes = vec![10_000i64; 25];
        volumes[24] = 13_000;
        series_from(&closes, &volumes)
    }

    #[test]
    fn buy_fires_on_breakout_for_stable() {
        let verdict = check_buy(&breakout_series(), Sleeve::Stable, 40.0, 0.0);
        assert!(verdict.satisfied, "{}", verdict.reason);
    }

    #[test]
    fn buy_rejects_short_series() {
        let closes: Vec<f64> = (0..19).map(|i| 100.0 + i as f64).collect();
        let volumes = vec![10_000i64; 19];
        let verdict = check_buy(&series_from(&closes, &volumes), Sleeve::Stable, 40.0, 0.0);
        assert!(!verdict.satisfied);
        assert!(verdict.reason.contains("price history"));
    }

    #[test]
    fn buy_requires_both_closes_above_ma20() {
        let mut closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        closes[23] = 50.0; // previous close dives below the average
        let mut volumes = vec![10_000i64; 25];
        volumes[24] = 13_000;
        let verdict = check_buy(&series_from(&closes, &volumes), Sleeve::Stable, 40.0, 0.0);
        assert!(!verdict.satisfied);
        assert!(verdict.reason.contains("sustained"));
    }

    #[test]
    fn buy_requires_rising_ma20() {
        // Downtrend that ends with two closes just above the falling average.
        let mut closes: Vec<f64> = (0..25).map(|i| 200.0 - 4.0 * i as f64).collect();
        closes[23] = 165.0;
        closes[24] = 170.0;
        let mut volumes = vec![10_000i64; 25];
        volumes[24] = 13_000;
        let verdict = check_buy(&series_from(&closes, &volumes), Sleeve::Stable, 40.0, 0.0);
        assert!(!verdict.satisfied);
        assert!(verdict.reason.contains("rising"));
    }

    #[test]
    fn buy_requires_volume_surge() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let volumes = vec![10_000i64; 25];
        let verdict = check_buy(&series_from(&closes, &volumes), Sleeve::Stable, 40.0, 0.0);
        assert!(!verdict.satisfied);
        assert!(verdict.reason.contains("volume"));
    }

    #[test]
    fn stable_buy_gated_by_valuation() {
        let verdict = check_buy(&breakout_series(), Sleeve::Stable, 60.0, 0.0);
        assert!(!verdict.satisfied);
        assert!(verdict.reason.contains("valuation"));
    }

    #[test]
    fn aggressive_buy_gated_by_sentiment() {
        let series = breakout_series();
        assert!(!check_buy(&series, Sleeve::Aggressive, 40.0, 0.0).satisfied);
        assert!(check_buy(&series, Sleeve::Aggressive, 40.0, 0.1).satisfied);
    }

    /// Flat 20 bars then a gentle rise holding near the 10-bar high.
    fn add_friendly_series() -> InstrumentSeries {
        let mut closes = vec![100.0; 20];
        closes.extend([101.0, 102.0, 103.0, 104.0, 103.0]);
        let volumes = vec![10_000i64; 25];
        series_from(&closes, &volumes)
    }

    #[test]
    fn add_fires_after_spacing_with_shallow_pullback() {
        let series = add_friendly_series();
        let verdict = check_add(&series, Some(day(24 - 5)));
        assert!(verdict.satisfied, "{}", verdict.reason);
    }

    #[test]
    fn add_blocked_by_spacing() {
        let series = add_friendly_series();
        let verdict = check_add(&series, Some(day(24 - 2)));
        assert!(!verdict.satisfied);
        assert!(verdict.reason.contains("since last add"));
    }

    #[test]
    fn add_blocked_by_deep_pullback() {
        let mut closes = vec![100.0; 20];
        closes.extend([110.0, 112.0, 114.0, 116.0, 105.0]); // ~9.5% off the high
        let volumes = vec![10_000i64; 25];
        let series = series_from(&closes, &volumes);
        let verdict = check_add(&series, Some(day(0)));
        assert!(!verdict.satisfied);
        assert!(verdict.reason.contains("pullback"));
    }

    #[test]
    fn add_blocked_by_volume_outside_band() {
        let mut closes = vec![100.0; 20];
        closes.extend([101.0, 102.0, 103.0, 104.0, 103.0]);
        let mut volumes = vec![10_000i64; 25];
        volumes[24] = 20_000; // ~1.85x the 5-day average
        let series = series_from(&closes, &volumes);
        let verdict = check_add(&series, Some(day(0)));
        assert!(!verdict.satisfied);
        assert!(verdict.reason.contains("volume ratio"));
    }

    #[test]
    fn sell_take_profit_first() {
        let closes = vec![115.0; 25];
        let volumes = vec![10_000i64; 25];
        let series = series_from(&closes, &volumes);
        let verdict = check_sell(&series, 100.0, Sleeve::Stable);
        assert!(verdict.satisfied);
        assert_eq!(verdict.kind, SellKind::ProfitTake);
    }

    #[test]
    fn sell_stop_loss_at_stable_threshold() {
        let closes = vec![84.0; 25];
        let volumes = vec![10_000i64; 25];
        let series = series_from(&closes, &volumes);
        let verdict = check_sell(&series, 100.0, Sleeve::Stable);
        assert!(verdict.satisfied);
        assert_eq!(verdict.kind, SellKind::StopLoss);
    }

    #[test]
    fn sell_thresholds_vary_by_sleeve() {
        let closes = vec![94.0; 25]; // -6%
        let volumes = vec![10_000i64; 25];
        let series = series_from(&closes, &volumes);
        assert_eq!(
            check_sell(&series, 100.0, Sleeve::Stable).kind,
            SellKind::StopLoss
        );
        // aggressive tolerates -6% (stop at -8%)
        assert!(!check_sell(&series, 100.0, Sleeve::Aggressive).satisfied);
    }

    #[test]
    fn sell_technical_exit_below_falling_ma20() {
        // Rise then roll over: ma20 falling, last two closes below it.
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + 2.0 * i as f64).collect();
        closes.extend([120.0, 110.0, 100.0, 90.0, 80.0]);
        let volumes = vec![10_000i64; 25];
        let series = series_from(&closes, &volumes);
        let verdict = check_sell(&series, 79.0, Sleeve::Aggressive);
        assert!(verdict.satisfied, "{}", verdict.reason);
        assert_eq!(verdict.kind, SellKind::Technical);
    }

    #[test]
    fn sell_rejects_zero_cost_basis() {
        let closes = vec![100.0; 25];
        let volumes = vec![10_000i64; 25];
        let series = series_from(&closes, &volumes);
        let verdict = check_sell(&series, 0.0, Sleeve::Stable);
        assert!(!verdict.satisfied);
        assert_eq!(verdict.kind, SellKind::None);
        assert!(verdict.reason.contains("cost basis"));
    }

    #[test]
    fn liquidation_on_three_blowups() {
        let events: Vec<CorporateEvent> = (0..3)
            .map(|i| CorporateEvent {
                date: day(i),
                kind: EventKind::FundamentalBlowup,
            })
            .collect();
        let verdict = check_liquidation(Sleeve::Stable, &events, &[], None, day(10));
        assert!(verdict.satisfied);
        assert!(verdict.reason.contains("blow-up"));
    }

    #[test]
    fn two_blowups_do_not_liquidate() {
        let events: Vec<CorporateEvent> = (0..2)
            .map(|i| CorporateEvent {
                date: day(i),
                kind: EventKind::FundamentalBlowup,
            })
            .collect();
        assert!(!check_liquidation(Sleeve::Stable, &events, &[], None, day(10)).satisfied);
    }

    #[test]
    fn liquidation_on_recent_severe_policy_event() {
        let policy = vec![PolicyEvent {
            date: day(8),
            impact: PolicyImpact::SevereAdverse,
        }];
        assert!(check_liquidation(Sleeve::Aggressive, &[], &policy, None, day(10)).satisfied);
        // same event six days out no longer triggers
        assert!(!check_liquidation(Sleeve::Aggressive, &[], &policy, None, day(14)).satisfied);
    }

    #[test]
    fn neutral_policy_event_ignored() {
        let policy = vec![PolicyEvent {
            date: day(10),
            impact: PolicyImpact::Neutral,
        }];
        assert!(!check_liquidation(Sleeve::Stable, &[], &policy, None, day(10)).satisfied);
    }

    #[test]
    fn arbitrage_age_out_only_for_arbitrage_sleeve() {
        assert!(check_liquidation(Sleeve::Arbitrage, &[], &[], Some(3), day(10)).satisfied);
        assert!(!check_liquidation(Sleeve::Arbitrage, &[], &[], Some(2), day(10)).satisfied);
        assert!(!check_liquidation(Sleeve::Stable, &[], &[], Some(10), day(10)).satisfied);
    }
}
