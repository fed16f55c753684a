//! SQLite adapter backing the state store, the market-data provider and
//! the candidate pool.
//!
//! One database holds everything the engine consumes in a cycle: daily
//! bars (with optional precomputed averages), valuation/sentiment
//! snapshots, realtime quotes, event calendars, related-instrument
//! links, the ranked candidate pool, the position book and the
//! append-only trade history.

use chrono::{NaiveDate, NaiveDateTime};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::domain::candidate::{Candidate, Category};
use crate::domain::error::StrategyError;
use crate::domain::event::{CorporateEvent, EventKind, PolicyEvent, PolicyImpact};
use crate::domain::position::{ArbitragePosition, Direction, PositionBook, SwingPosition};
use crate::domain::series::{DailyBar, InstrumentSeries, RealtimeQuote, Valuation};
use crate::domain::sleeve::Sleeve;
use crate::domain::trade::{TradeKind, TradeRecord};
use crate::ports::candidate_port::CandidatePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::state_port::StatePort;

const DATE_FMT: &str = "%Y-%m-%d";
const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StrategyError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| StrategyError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| StrategyError::store(e))?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, StrategyError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| StrategyError::store(e))?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StrategyError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| StrategyError::store(e))
    }

    pub fn initialize_schema(&self) -> Result<(), StrategyError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS bars (
                code TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                ma20 REAL,
                volume_ma5 REAL,
                PRIMARY KEY (code, date)
            );
            CREATE INDEX IF NOT EXISTS idx_bars_code ON bars(code);
            CREATE TABLE IF NOT EXISTS valuations (
                code TEXT PRIMARY KEY,
                percentile REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sentiment (
                code TEXT PRIMARY KEY,
                score REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS realtime (
                code TEXT PRIMARY KEY,
                price REAL NOT NULL,
                iopv REAL,
                volume INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS events (
                code TEXT NOT NULL,
                date TEXT NOT NULL,
                kind TEXT NOT NULL,
                PRIMARY KEY (code, date, kind)
            );
            CREATE TABLE IF NOT EXISTS policy_events (
                code TEXT NOT NULL,
                date TEXT NOT NULL,
                impact TEXT NOT NULL,
                PRIMARY KEY (code, date)
            );
            CREATE TABLE IF NOT EXISTS related (
                code TEXT NOT NULL,
                related_code TEXT NOT NULL,
                related_name TEXT NOT NULL,
                category TEXT NOT NULL,
                volume INTEGER NOT NULL,
                valuation_percentile REAL NOT NULL,
                PRIMARY KEY (code, related_code)
            );
            CREATE TABLE IF NOT EXISTS candidate_pool (
                sleeve TEXT NOT NULL,
                rank INTEGER NOT NULL,
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                volume INTEGER NOT NULL,
                valuation_percentile REAL NOT NULL,
                PRIMARY KEY (sleeve, rank)
            );
            CREATE TABLE IF NOT EXISTS positions (
                sleeve TEXT PRIMARY KEY,
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                position_ratio REAL,
                buy_price REAL,
                buy_date TEXT,
                last_add_date TEXT,
                direction TEXT,
                open_price REAL,
                open_date TEXT,
                expected_return REAL
            );
            CREATE TABLE IF NOT EXISTS trade_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                sleeve TEXT NOT NULL,
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                reason TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        Ok(())
    }

    pub fn insert_bars(&self, code: &str, bars: &[DailyBar]) -> Result<(), StrategyError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO bars
                 (code, date, open, high, low, close, volume, ma20, volume_ma5)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    code,
                    bar.date.format(DATE_FMT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume,
                    bar.ma20,
                    bar.volume_ma5,
                ],
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        }
        tx.commit()
            .map_err(|e: rusqlite::Error| StrategyError::store(e))
    }

    pub fn set_valuation(&self, code: &str, percentile: f64) -> Result<(), StrategyError> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO valuations (code, percentile) VALUES (?1, ?2)",
                params![code, percentile],
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        Ok(())
    }

    pub fn set_sentiment(&self, code: &str, score: f64) -> Result<(), StrategyError> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO sentiment (code, score) VALUES (?1, ?2)",
                params![code, score],
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        Ok(())
    }

    pub fn set_realtime(&self, code: &str, quote: &RealtimeQuote) -> Result<(), StrategyError> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO realtime (code, price, iopv, volume)
                 VALUES (?1, ?2, ?3, ?4)",
                params![code, quote.price, quote.iopv, quote.volume],
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        Ok(())
    }

    pub fn add_event(&self, code: &str, event: &CorporateEvent) -> Result<(), StrategyError> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO events (code, date, kind) VALUES (?1, ?2, ?3)",
                params![
                    code,
                    event.date.format(DATE_FMT).to_string(),
                    event.kind.name()
                ],
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        Ok(())
    }

    pub fn add_policy_event(&self, code: &str, event: &PolicyEvent) -> Result<(), StrategyError> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO policy_events (code, date, impact) VALUES (?1, ?2, ?3)",
                params![
                    code,
                    event.date.format(DATE_FMT).to_string(),
                    event.impact.name()
                ],
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        Ok(())
    }

    pub fn add_related(&self, code: &str, related: &Candidate) -> Result<(), StrategyError> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO related
                 (code, related_code, related_name, category, volume, valuation_percentile)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    code,
                    related.code,
                    related.name,
                    related.category.name(),
                    related.volume,
                    related.valuation_percentile,
                ],
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        Ok(())
    }

    /// Replace a sleeve's ranked candidate list.
    pub fn set_candidates(
        &self,
        sleeve: Sleeve,
        candidates: &[Candidate],
    ) -> Result<(), StrategyError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        tx.execute(
            "DELETE FROM candidate_pool WHERE sleeve = ?1",
            params![sleeve.name()],
        )
        .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        for (rank, candidate) in candidates.iter().enumerate() {
            tx.execute(
                "INSERT INTO candidate_pool
                 (sleeve, rank, code, name, category, volume, valuation_percentile)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    sleeve.name(),
                    rank as i64,
                    candidate.code,
                    candidate.name,
                    candidate.category.name(),
                    candidate.volume,
                    candidate.valuation_percentile,
                ],
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        }
        tx.commit()
            .map_err(|e: rusqlite::Error| StrategyError::store(e))
    }
}

fn parse_date(value: &str, what: &str) -> Result<NaiveDate, StrategyError> {
    NaiveDate::parse_from_str(value, DATE_FMT).map_err(|e| {
        StrategyError::store(format!("invalid {what} date {value:?}: {e}"))
    })
}

fn parse_category(value: &str) -> Result<Category, StrategyError> {
    Category::from_name(value)
        .ok_or_else(|| StrategyError::store(format!("unknown category {value:?}")))
}

impl MarketDataPort for SqliteAdapter {
    fn get_series(&self, code: &str) -> Result<InstrumentSeries, StrategyError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume, ma20, volume_ma5
                 FROM bars WHERE code = ?1 ORDER BY date",
            )
            .map_err(|e: rusqlite::Error| StrategyError::provider("get_series", e))?;
        let rows = stmt
            .query_map(params![code], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, Option<f64>>(6)?,
                    row.get::<_, Option<f64>>(7)?,
                ))
            })
            .map_err(|e: rusqlite::Error| StrategyError::provider("get_series", e))?;

        let mut bars = Vec::new();
        for row in rows {
            let (date, open, high, low, close, volume, ma20, volume_ma5) =
                row.map_err(|e: rusqlite::Error| StrategyError::provider("get_series", e))?;
            bars.push(DailyBar {
                date: parse_date(&date, "bar")?,
                open,
                high,
                low,
                close,
                volume,
                ma20,
                volume_ma5,
            });
        }
        InstrumentSeries::new(code, bars)
    }

    fn get_valuation(&self, code: &str) -> Result<Valuation, StrategyError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT percentile FROM valuations WHERE code = ?1",
            params![code],
            |row| row.get::<_, f64>(0),
        )
        .map(|percentile| Valuation { percentile })
        .map_err(|e: rusqlite::Error| StrategyError::provider("get_valuation", e))
    }

    fn get_sentiment(&self, code: &str) -> Result<f64, StrategyError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT score FROM sentiment WHERE code = ?1",
            params![code],
            |row| row.get::<_, f64>(0),
        )
        .map_err(|e: rusqlite::Error| StrategyError::provider("get_sentiment", e))
    }

    fn get_realtime(&self, code: &str) -> Result<RealtimeQuote, StrategyError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT price, iopv, volume FROM realtime WHERE code = ?1",
            params![code],
            |row| {
                Ok(RealtimeQuote {
                    price: row.get(0)?,
                    iopv: row.get(1)?,
                    volume: row.get(2)?,
                })
            },
        )
        .map_err(|e: rusqlite::Error| StrategyError::provider("get_realtime", e))
    }

    fn get_events(&self, code: &str) -> Result<Vec<CorporateEvent>, StrategyError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT date, kind FROM events WHERE code = ?1 ORDER BY date")
            .map_err(|e: rusqlite::Error| StrategyError::provider("get_events", e))?;
        let rows = stmt
            .query_map(params![code], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e: rusqlite::Error| StrategyError::provider("get_events", e))?;

        let mut events = Vec::new();
        for row in rows {
            let (date, kind) =
                row.map_err(|e: rusqlite::Error| StrategyError::provider("get_events", e))?;
            let kind = EventKind::from_name(&kind)
                .ok_or_else(|| StrategyError::provider("get_events", format!("unknown event kind {kind:?}")))?;
            events.push(CorporateEvent {
                date: parse_date(&date, "event")?,
                kind,
            });
        }
        Ok(events)
    }

    fn get_policy_events(&self, code: &str) -> Result<Vec<PolicyEvent>, StrategyError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT date, impact FROM policy_events WHERE code = ?1 ORDER BY date")
            .map_err(|e: rusqlite::Error| StrategyError::provider("get_policy_events", e))?;
        let rows = stmt
            .query_map(params![code], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e: rusqlite::Error| StrategyError::provider("get_policy_events", e))?;

        let mut events = Vec::new();
        for row in rows {
            let (date, impact) = row
                .map_err(|e: rusqlite::Error| StrategyError::provider("get_policy_events", e))?;
            let impact = PolicyImpact::from_name(&impact).ok_or_else(|| {
                StrategyError::provider("get_policy_events", format!("unknown impact {impact:?}"))
            })?;
            events.push(PolicyEvent {
                date: parse_date(&date, "policy event")?,
                impact,
            });
        }
        Ok(events)
    }

    fn get_related(&self, code: &str) -> Result<Vec<Candidate>, StrategyError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT related_code, related_name, category, volume, valuation_percentile
                 FROM related WHERE code = ?1 ORDER BY related_code",
            )
            .map_err(|e: rusqlite::Error| StrategyError::provider("get_related", e))?;
        let rows = stmt
            .query_map(params![code], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })
            .map_err(|e: rusqlite::Error| StrategyError::provider("get_related", e))?;

        let mut related = Vec::new();
        for row in rows {
            let (code, name, category, volume, valuation_percentile) =
                row.map_err(|e: rusqlite::Error| StrategyError::provider("get_related", e))?;
            related.push(Candidate {
                code,
                name,
                category: parse_category(&category)?,
                volume,
                valuation_percentile,
            });
        }
        Ok(related)
    }
}

impl CandidatePort for SqliteAdapter {
    fn get_candidates(&self, sleeve: Sleeve) -> Result<Vec<Candidate>, StrategyError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT code, name, category, volume, valuation_percentile
                 FROM candidate_pool WHERE sleeve = ?1 ORDER BY rank",
            )
            .map_err(|e: rusqlite::Error| StrategyError::provider("get_candidates", e))?;
        let rows = stmt
            .query_map(params![sleeve.name()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })
            .map_err(|e: rusqlite::Error| StrategyError::provider("get_candidates", e))?;

        let mut candidates = Vec::new();
        for row in rows {
            let (code, name, category, volume, valuation_percentile) =
                row.map_err(|e: rusqlite::Error| StrategyError::provider("get_candidates", e))?;
            candidates.push(Candidate {
                code,
                name,
                category: parse_category(&category)?,
                volume,
                valuation_percentile,
            });
        }
        Ok(candidates)
    }
}

impl StatePort for SqliteAdapter {
    fn load_positions(&self) -> Result<PositionBook, StrategyError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT sleeve, code, name, category, position_ratio, buy_price, buy_date,
                        last_add_date, direction, open_price, open_date, expected_return
                 FROM positions",
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, Option<f64>>(9)?,
                    row.get::<_, Option<String>>(10)?,
                    row.get::<_, Option<f64>>(11)?,
                ))
            })
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;

        let mut book = PositionBook::default();
        for row in rows {
            let (
                sleeve,
                code,
                name,
                category,
                position_ratio,
                buy_price,
                buy_date,
                last_add_date,
                direction,
                open_price,
                open_date,
                expected_return,
            ) = row.map_err(|e: rusqlite::Error| StrategyError::store(e))?;

            let sleeve = Sleeve::from_name(&sleeve)
                .ok_or_else(|| StrategyError::store(format!("unknown sleeve {sleeve:?}")))?;
            let category = parse_category(&category)?;

            match sleeve {
                Sleeve::Stable | Sleeve::Aggressive => {
                    let (Some(position_ratio), Some(buy_price), Some(buy_date)) =
                        (position_ratio, buy_price, buy_date)
                    else {
                        return Err(StrategyError::store(format!(
                            "incomplete swing position for {code}"
                        )));
                    };
                    let last_add_date = match last_add_date {
                        Some(d) => Some(parse_date(&d, "last add")?),
                        None => None,
                    };
                    book.set_swing(
                        sleeve,
                        Some(SwingPosition {
                            code,
                            name,
                            category,
                            position_ratio,
                            buy_price,
                            buy_date: parse_date(&buy_date, "buy")?,
                            last_add_date,
                        }),
                    );
                }
                Sleeve::Arbitrage => {
                    let (Some(direction), Some(open_price), Some(open_date), Some(expected)) =
                        (direction, open_price, open_date, expected_return)
                    else {
                        return Err(StrategyError::store(format!(
                            "incomplete arbitrage position for {code}"
                        )));
                    };
                    let direction = Direction::from_name(&direction).ok_or_else(|| {
                        StrategyError::store(format!("unknown direction {direction:?}"))
                    })?;
                    book.arbitrage = Some(ArbitragePosition {
                        code,
                        name,
                        category,
                        direction,
                        open_price,
                        open_date: parse_date(&open_date, "open")?,
                        expected_return: expected,
                    });
                }
            }
        }
        Ok(book)
    }

    fn save_positions(&self, book: &PositionBook) -> Result<(), StrategyError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        tx.execute("DELETE FROM positions", [])
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;

        for (sleeve, position) in [
            (Sleeve::Stable, &book.stable),
            (Sleeve::Aggressive, &book.aggressive),
        ] {
            if let Some(pos) = position {
                tx.execute(
                    "INSERT INTO positions
                     (sleeve, code, name, category, position_ratio, buy_price, buy_date, last_add_date)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        sleeve.name(),
                        pos.code,
                        pos.name,
                        pos.category.name(),
                        pos.position_ratio,
                        pos.buy_price,
                        pos.buy_date.format(DATE_FMT).to_string(),
                        pos.last_add_date.map(|d| d.format(DATE_FMT).to_string()),
                    ],
                )
                .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
            }
        }

        if let Some(pos) = &book.arbitrage {
            tx.execute(
                "INSERT INTO positions
                 (sleeve, code, name, category, direction, open_price, open_date, expected_return)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    Sleeve::Arbitrage.name(),
                    pos.code,
                    pos.name,
                    pos.category.name(),
                    pos.direction.name(),
                    pos.open_price,
                    pos.open_date.format(DATE_FMT).to_string(),
                    pos.expected_return,
                ],
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| StrategyError::store(e))
    }

    fn append_trade(&self, record: &TradeRecord) -> Result<(), StrategyError> {
        self.conn()?
            .execute(
                "INSERT INTO trade_history (kind, sleeve, code, name, amount, reason, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.kind.name(),
                    record.sleeve.name(),
                    record.code,
                    record.name,
                    record.amount,
                    record.reason,
                    record.timestamp.format(TIMESTAMP_FMT).to_string(),
                ],
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        Ok(())
    }

    fn trade_history(&self) -> Result<Vec<TradeRecord>, StrategyError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT kind, sleeve, code, name, amount, reason, timestamp
                 FROM trade_history ORDER BY id",
            )
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .map_err(|e: rusqlite::Error| StrategyError::store(e))?;

        let mut history = Vec::new();
        for row in rows {
            let (kind, sleeve, code, name, amount, reason, timestamp) =
                row.map_err(|e: rusqlite::Error| StrategyError::store(e))?;
            let kind = TradeKind::from_name(&kind)
                .ok_or_else(|| StrategyError::store(format!("unknown trade kind {kind:?}")))?;
            let sleeve = Sleeve::from_name(&sleeve)
                .ok_or_else(|| StrategyError::store(format!("unknown sleeve {sleeve:?}")))?;
            let timestamp = NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_FMT)
                .map_err(|e| StrategyError::store(format!("invalid timestamp: {e}")))?;
            history.push(TradeRecord {
                kind,
                sleeve,
                code,
                name,
                amount,
                reason,
                timestamp,
            });
        }
        Ok(history)
    }
}
