//! Console notification adapter.
//!
//! Prints each message with a local-time prefix, matching the outbound
//! push format. A disabled notifier swallows messages silently.

use crate::domain::error::StrategyError;
use crate::ports::notify_port::NotifyPort;

pub struct ConsoleNotifyAdapter {
    enabled: bool,
}

impl ConsoleNotifyAdapter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl NotifyPort for ConsoleNotifyAdapter {
    fn send_text(&self, content: &str) -> Result<(), StrategyError> {
        if !self.enabled {
            return Ok(());
        }
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        println!("[{stamp}] {content}");
        Ok(())
    }
}
