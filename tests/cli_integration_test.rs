//! CLI integration tests for cycle orchestration.
//!
//! Tests cover:
//! - Config parsing (build_engine_config) from real INI files on disk
//! - Engine-facing config validation on the same files
//! - Store construction from config (SqliteAdapter::from_config)
//! - Full pipeline: config file -> store -> cycle -> persisted book

#![cfg(feature = "sqlite")]

mod common;

use common::*;
use etfsig::adapters::file_config_adapter::FileConfigAdapter;
use etfsig::adapters::sqlite_adapter::SqliteAdapter;
use etfsig::cli::build_engine_config;
use etfsig::domain::candidate::Category;
use etfsig::domain::config_validation::validate_engine_config;
use etfsig::domain::engine::StrategyEngine;
use etfsig::domain::error::StrategyError;
use etfsig::domain::sleeve::Sleeve;
use etfsig::domain::trade::TradeKind;
use etfsig::ports::state_port::StatePort;
use std::io::Write;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[capital]
total = 20000
stable = 0.6
aggressive = 0.3
arbitrage = 0.1

[strategy]
benchmark = 000300
evaluation_time = 14:00

[sqlite]
path = etfsig.db
pool_size = 2

[notify]
enabled = no
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_engine_config_from_file_on_disk() {
        let file = write_temp_ini(VALID_INI);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(validate_engine_config(&adapter).is_ok());

        let config = build_engine_config(&adapter).unwrap();
        assert_eq!(config.total_capital, 20_000.0);
        assert_eq!(config.benchmark, "000300");
        assert_eq!(config.capital_for(Sleeve::Stable), 12_000.0);
        assert_eq!(config.capital_for(Sleeve::Arbitrage), 2_000.0);
    }

    #[test]
    fn split_defaults_when_absent() {
        let file = write_temp_ini("[capital]\ntotal = 10000\n[strategy]\nbenchmark = 000300\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let config = build_engine_config(&adapter).unwrap();
        assert_eq!(config.split.stable, 0.60);
        assert_eq!(config.split.aggressive, 0.30);
        assert_eq!(config.split.arbitrage, 0.10);
    }

    #[test]
    fn validation_rejects_bad_file() {
        let file = write_temp_ini("[capital]\ntotal = -1\n[strategy]\nbenchmark = 000300\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(matches!(
            validate_engine_config(&adapter),
            Err(StrategyError::ConfigInvalid { section, .. }) if section == "capital"
        ));
    }
}

mod store_from_config {
    use super::*;

    #[test]
    fn missing_sqlite_path_is_config_error() {
        let adapter = FileConfigAdapter::from_string("[capital]\ntotal = 20000\n").unwrap();
        assert!(matches!(
            SqliteAdapter::from_config(&adapter),
            Err(StrategyError::ConfigMissing { section, key }) if section == "sqlite" && key == "path"
        ));
    }

    #[test]
    fn store_opens_and_initializes_at_configured_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("etfsig.db");
        let adapter = FileConfigAdapter::from_string(&format!(
            "[sqlite]\npath = {}\npool_size = 1\n",
            db_path.display()
        ))
        .unwrap();

        let store = SqliteAdapter::from_config(&adapter).unwrap();
        let book = store.load_positions().unwrap();
        assert!(book.stable.is_none());
        assert!(db_path.exists());
    }
}

mod full_pipeline {
    use super::*;

    #[test]
    fn cycle_from_config_file_persists_across_reopens() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("etfsig.db");
        let ini = format!(
            "[capital]\ntotal = 20000\n\
             [strategy]\nbenchmark = 000300\n\
             [sqlite]\npath = {}\npool_size = 1\n",
            db_path.display()
        );
        let file = write_temp_ini(&ini);

        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let engine_config = build_engine_config(&adapter).unwrap();
        let store = SqliteAdapter::from_config(&adapter).unwrap();

        let series = breakout_series("510300", date(2024, 6, 10));
        store.insert_bars("510300", series.bars()).unwrap();
        store.set_valuation("510300", 40.0).unwrap();
        store
            .set_candidates(Sleeve::Stable, &[candidate("510300", Category::Broad)])
            .unwrap();

        let engine = StrategyEngine::new(&store, &store, &store, engine_config);
        let result = engine.run_cycle(at_close(2024, 6, 10)).unwrap();
        assert_eq!(result.stable.action(), "buy");
        drop(engine);
        drop(store);

        // a fresh adapter over the same file sees the persisted state
        let reopened = SqliteAdapter::from_config(&adapter).unwrap();
        let book = reopened.load_positions().unwrap();
        let pos = book.stable.as_ref().unwrap();
        assert_eq!(pos.code, "510300");
        assert_eq!(pos.position_ratio, 0.30);
        let history = reopened.trade_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TradeKind::Buy);
    }
}

mod bar_import {
    use super::*;
    use etfsig::adapters::csv_import::import_bars;
    use etfsig::ports::market_data_port::MarketDataPort;

    #[test]
    fn imported_bars_feed_the_engine_series() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv_dir = dir.path().join("bars");
        std::fs::create_dir(&csv_dir).unwrap();
        std::fs::write(
            csv_dir.join("510300.csv"),
            "date,open,high,low,close,volume\n\
             2024-06-03,3.90,3.95,3.88,3.92,50000000\n\
             2024-06-04,3.91,3.97,3.89,3.95,52000000\n",
        )
        .unwrap();

        let store = SqliteAdapter::in_memory().unwrap();
        assert_eq!(import_bars(&store, &csv_dir).unwrap(), 1);
        let series = store.get_series("510300").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().unwrap().close, 3.95);
    }
}
