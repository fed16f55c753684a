//! CLI definition and dispatch.
//!
//! The engine itself is one atomic unit of work per invocation; `run`
//! executes a single cycle and `loop` is the thin daily scheduler around
//! it (retry cadence lives here, never inside the engine).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{parse_evaluation_time, validate_engine_config};
use crate::domain::engine::EngineConfig;
use crate::domain::environment::CapitalSplit;
use crate::domain::error::StrategyError;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "etfsig", about = "Three-sleeve ETF strategy signal engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one decision cycle now
    Run {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run the daily scheduler, evaluating once per day at the
    /// configured time
    Loop {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the current position book
    Positions {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show trade history
    History {
        #[arg(short, long)]
        config: PathBuf,
        /// Restrict to one calendar month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
    /// Import daily bar CSV files into the store
    ImportBars {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of per-code CSV files; defaults to [data] csv_dir
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config } => run_cycle_once(&config),
        Command::Loop { config } => run_loop(&config),
        Command::Positions { config } => run_positions(&config),
        Command::History { config, month } => run_history(&config, month.as_deref()),
        Command::ImportBars { config, dir } => run_import_bars(&config, dir.as_deref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Build engine sizing from a validated config.
pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, StrategyError> {
    let benchmark =
        config
            .get_string("strategy", "benchmark")
            .ok_or_else(|| StrategyError::ConfigMissing {
                section: "strategy".into(),
                key: "benchmark".into(),
            })?;
    let mut engine_config = EngineConfig::new(config.get_double("capital", "total", 0.0), benchmark);
    engine_config.split = CapitalSplit {
        stable: config.get_double("capital", "stable", 0.60),
        aggressive: config.get_double("capital", "aggressive", 0.30),
        arbitrage: config.get_double("capital", "arbitrage", 0.10),
    };
    Ok(engine_config)
}

fn load_validated_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = load_config(path)?;
    if let Err(err) = validate_engine_config(&adapter) {
        eprintln!("error: {err}");
        return Err(ExitCode::from(&err));
    }
    Ok(adapter)
}

#[cfg(feature = "sqlite")]
fn run_cycle_once(config_path: &PathBuf) -> ExitCode {
    match execute_cycle(config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

#[cfg(feature = "sqlite")]
fn execute_cycle(config_path: &PathBuf) -> Result<(), ExitCode> {
    use crate::adapters::console_notify_adapter::ConsoleNotifyAdapter;
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::domain::engine::StrategyEngine;
    use crate::ports::notify_port::NotifyPort;

    let adapter = load_validated_config(config_path)?;
    let engine_config = build_engine_config(&adapter).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;
    let store = SqliteAdapter::from_config(&adapter).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;

    let engine = StrategyEngine::new(&store, &store, &store, engine_config);
    let now = chrono::Local::now().naive_local();
    let result = engine.run_cycle(now).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;

    eprintln!(
        "environment: {} (suggested split {:.0}/{:.0}/{:.0})",
        result.environment,
        result.suggested_split.stable * 100.0,
        result.suggested_split.aggressive * 100.0,
        result.suggested_split.arbitrage * 100.0,
    );

    let notifier = ConsoleNotifyAdapter::new(adapter.get_bool("notify", "enabled", true));
    if let Err(err) = notifier.send_text(&result.summary) {
        eprintln!("warning: notification failed: {err}");
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
fn run_loop(config_path: &PathBuf) -> ExitCode {
    use chrono::NaiveDate;
    use std::thread;
    use std::time::Duration;

    let adapter = match load_validated_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let evaluation_time = match adapter
        .get_string("strategy", "evaluation_time")
        .as_deref()
        .map(parse_evaluation_time)
        .transpose()
    {
        Ok(time) => {
            time.unwrap_or_else(|| chrono::NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default())
        }
        Err(err) => {
            eprintln!("error: {err}");
            return (&err).into();
        }
    };
    let poll_secs = adapter.get_int("strategy", "poll_interval_secs", 60).max(1) as u64;
    let retry_secs = adapter.get_int("strategy", "retry_interval_secs", 1800).max(1) as u64;

    eprintln!("scheduler started; daily evaluation at {evaluation_time}");
    let mut last_run: Option<NaiveDate> = None;
    loop {
        let now = chrono::Local::now().naive_local();
        let due = now.time() >= evaluation_time && last_run != Some(now.date());
        if due {
            match execute_cycle(config_path) {
                Ok(()) => {
                    last_run = Some(now.date());
                }
                Err(_) => {
                    eprintln!("cycle failed; retrying in {retry_secs}s");
                    thread::sleep(Duration::from_secs(retry_secs));
                    continue;
                }
            }
        }
        thread::sleep(Duration::from_secs(poll_secs));
    }
}

#[cfg(feature = "sqlite")]
fn run_positions(config_path: &PathBuf) -> ExitCode {
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::ports::state_port::StatePort;

    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let store = match SqliteAdapter::from_config(&adapter) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error: {err}");
            return (&err).into();
        }
    };
    let book = match store.load_positions() {
        Ok(b) => b,
        Err(err) => {
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    match &book.stable {
        Some(pos) => println!(
            "stable: {} {} ratio {:.0}% @ {:.3} since {}",
            pos.code,
            pos.name,
            pos.position_ratio * 100.0,
            pos.buy_price,
            pos.buy_date
        ),
        None => println!("stable: flat"),
    }
    match &book.aggressive {
        Some(pos) => println!(
            "aggressive: {} {} ratio {:.0}% @ {:.3} since {}",
            pos.code,
            pos.name,
            pos.position_ratio * 100.0,
            pos.buy_price,
            pos.buy_date
        ),
        None => println!("aggressive: flat"),
    }
    match &book.arbitrage {
        Some(pos) => println!(
            "arbitrage: {} {} {} @ {:.3} since {} (expected {:.2}%)",
            pos.direction,
            pos.code,
            pos.name,
            pos.open_price,
            pos.open_date,
            pos.expected_return * 100.0
        ),
        None => println!("arbitrage: flat"),
    }
    ExitCode::SUCCESS
}

#[cfg(feature = "sqlite")]
fn run_history(config_path: &PathBuf, month: Option<&str>) -> ExitCode {
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::ports::state_port::StatePort;
    use chrono::Datelike;

    let month_filter = match month {
        None => None,
        Some(raw) => match chrono::NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
            Ok(date) => Some((date.year(), date.month())),
            Err(_) => {
                eprintln!("error: invalid month {raw:?}, expected YYYY-MM");
                return ExitCode::from(2);
            }
        },
    };

    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let store = match SqliteAdapter::from_config(&adapter) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error: {err}");
            return (&err).into();
        }
    };
    let history = match store.trade_history() {
        Ok(h) => h,
        Err(err) => {
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    for record in history {
        if let Some((year, month)) = month_filter {
            let date = record.timestamp.date();
            if date.year() != year || date.month() != month {
                continue;
            }
        }
        println!(
            "{} {} {} {} {:.2} ({})",
            record.timestamp, record.sleeve, record.kind, record.code, record.amount, record.reason
        );
    }
    ExitCode::SUCCESS
}

#[cfg(feature = "sqlite")]
fn run_import_bars(config_path: &PathBuf, dir: Option<&std::path::Path>) -> ExitCode {
    use crate::adapters::csv_import::import_bars;
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => match adapter.get_string("data", "csv_dir") {
            Some(d) => PathBuf::from(d),
            None => {
                eprintln!("error: no --dir given and no [data] csv_dir configured");
                return ExitCode::from(2);
            }
        },
    };
    let store = match SqliteAdapter::from_config(&adapter) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error: {err}");
            return (&err).into();
        }
    };
    match import_bars(&store, &dir) {
        Ok(count) => {
            eprintln!("imported {count} instruments from {}", dir.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            (&err).into()
        }
    }
}

#[cfg(not(feature = "sqlite"))]
fn run_cycle_once(_config_path: &PathBuf) -> ExitCode {
    eprintln!("error: the sqlite feature is required");
    ExitCode::from(1)
}

#[cfg(not(feature = "sqlite"))]
fn run_loop(_config_path: &PathBuf) -> ExitCode {
    eprintln!("error: the sqlite feature is required");
    ExitCode::from(1)
}

#[cfg(not(feature = "sqlite"))]
fn run_positions(_config_path: &PathBuf) -> ExitCode {
    eprintln!("error: the sqlite feature is required");
    ExitCode::from(1)
}

#[cfg(not(feature = "sqlite"))]
fn run_history(_config_path: &PathBuf, _month: Option<&str>) -> ExitCode {
    eprintln!("error: the sqlite feature is required");
    ExitCode::from(1)
}

#[cfg(not(feature = "sqlite"))]
fn run_import_bars(_config_path: &PathBuf, _dir: Option<&std::path::Path>) -> ExitCode {
    eprintln!("error: the sqlite feature is required");
    ExitCode::from(1)
}
