//! Outbound notification port trait.

use crate::domain::error::StrategyError;

pub trait NotifyPort {
    fn send_text(&self, content: &str) -> Result<(), StrategyError>;
}
