//! Configuration validation.
//!
//! Validates all engine-facing config fields before a cycle runs.

use chrono::NaiveTime;

use crate::domain::error::StrategyError;
use crate::ports::config_port::ConfigPort;

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    validate_total_capital(config)?;
    validate_split(config)?;
    validate_benchmark(config)?;
    validate_evaluation_time(config)?;
    Ok(())
}

fn validate_total_capital(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    let value = config.get_double("capital", "total", 0.0);
    if value <= 0.0 {
        return Err(StrategyError::ConfigInvalid {
            section: "capital".to_string(),
            key: "total".to_string(),
            reason: "total must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_split(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    let stable = config.get_double("capital", "stable", 0.60);
    let aggressive = config.get_double("capital", "aggressive", 0.30);
    let arbitrage = config.get_double("capital", "arbitrage", 0.10);

    for (key, value) in [
        ("stable", stable),
        ("aggressive", aggressive),
        ("arbitrage", arbitrage),
    ] {
        if value <= 0.0 || value >= 1.0 {
            return Err(StrategyError::ConfigInvalid {
                section: "capital".to_string(),
                key: key.to_string(),
                reason: format!("{key} fraction must be between 0 and 1"),
            });
        }
    }

    let total = stable + aggressive + arbitrage;
    if (total - 1.0).abs() > 1e-6 {
        return Err(StrategyError::ConfigInvalid {
            section: "capital".to_string(),
            key: "stable".to_string(),
            reason: format!("sleeve fractions sum to {total}, expected 1.0"),
        });
    }
    Ok(())
}

fn validate_benchmark(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    match config.get_string("strategy", "benchmark") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(StrategyError::ConfigMissing {
            section: "strategy".to_string(),
            key: "benchmark".to_string(),
        }),
    }
}

fn validate_evaluation_time(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    match config.get_string("strategy", "evaluation_time") {
        None => Ok(()),
        Some(s) => {
            parse_evaluation_time(&s)?;
            Ok(())
        }
    }
}

/// Parse a daily evaluation time in `HH:MM`.
pub fn parse_evaluation_time(value: &str) -> Result<NaiveTime, StrategyError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| StrategyError::ConfigInvalid {
        section: "strategy".to_string(),
        key: "evaluation_time".to_string(),
        reason: format!("invalid time {value:?}, expected HH:MM"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_config_passes() {
        let adapter = config(
            "[capital]\ntotal = 20000\n\
             [strategy]\nbenchmark = 000300\nevaluation_time = 14:00\n",
        );
        assert!(validate_engine_config(&adapter).is_ok());
    }

    #[test]
    fn missing_capital_rejected() {
        let adapter = config("[strategy]\nbenchmark = 000300\n");
        assert!(matches!(
            validate_engine_config(&adapter),
            Err(StrategyError::ConfigInvalid { section, .. }) if section == "capital"
        ));
    }

    #[test]
    fn negative_capital_rejected() {
        let adapter = config("[capital]\ntotal = -5\n[strategy]\nbenchmark = 000300\n");
        assert!(validate_engine_config(&adapter).is_err());
    }

    #[test]
    fn split_must_sum_to_one() {
        let adapter = config(
            "[capital]\ntotal = 20000\nstable = 0.5\naggressive = 0.3\narbitrage = 0.1\n\
             [strategy]\nbenchmark = 000300\n",
        );
        assert!(matches!(
            validate_engine_config(&adapter),
            Err(StrategyError::ConfigInvalid { reason, .. }) if reason.contains("sum")
        ));
    }

    #[test]
    fn split_fractions_bounded() {
        let adapter = config(
            "[capital]\ntotal = 20000\nstable = 1.5\naggressive = 0.3\narbitrage = 0.1\n\
             [strategy]\nbenchmark = 000300\n",
        );
        assert!(validate_engine_config(&adapter).is_err());
    }

    #[test]
    fn missing_benchmark_rejected() {
        let adapter = config("[capital]\ntotal = 20000\n");
        assert!(matches!(
            validate_engine_config(&adapter),
            Err(StrategyError::ConfigMissing { key, .. }) if key == "benchmark"
        ));
    }

    #[test]
    fn evaluation_time_optional_but_validated() {
        let adapter = config(
            "[capital]\ntotal = 20000\n[strategy]\nbenchmark = 000300\n",
        );
        assert!(validate_engine_config(&adapter).is_ok());

        let adapter = config(
            "[capital]\ntotal = 20000\n[strategy]\nbenchmark = 000300\nevaluation_time = 25:99\n",
        );
        assert!(validate_engine_config(&adapter).is_err());
    }

    #[test]
    fn parse_time_accepts_hh_mm() {
        let time = parse_evaluation_time("14:00").unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert!(parse_evaluation_time("2pm").is_err());
    }
}
