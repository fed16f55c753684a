//! Persistence port trait for positions and trade history.

use crate::domain::error::StrategyError;
use crate::domain::position::PositionBook;
use crate::domain::trade::TradeRecord;

pub trait StatePort {
    fn load_positions(&self) -> Result<PositionBook, StrategyError>;

    /// Replace the persisted book wholesale. Called once per cycle.
    fn save_positions(&self, book: &PositionBook) -> Result<(), StrategyError>;

    fn append_trade(&self, record: &TradeRecord) -> Result<(), StrategyError>;

    /// Full history in append order.
    fn trade_history(&self) -> Result<Vec<TradeRecord>, StrategyError>;
}
