pub mod message;
pub mod signal;
pub mod trade;
pub mod whale;

pub use message::ChatMessage;
pub use signal::{SentimentLabel, Signal, TokenSentiment};
pub use trade::Transaction;
pub use whale::{WhaleListing, WhaleSnapshot};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Direction of a transfer relative to the watched address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// The watched address sending tokens out is a sell; anything else is a buy.
    pub fn relative_to(sender: &str, watched: &str) -> Self {
        if sender.to_lowercase() == watched.to_lowercase() {
            Direction::Sell
        } else {
            Direction::Buy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
