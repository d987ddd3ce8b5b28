pub mod fallback;
pub mod message_consumer;
pub mod scheduler;
pub mod sentiment_ticker;
pub mod telegram_listener;
pub mod whale_poller;
pub mod whale_tracker;

pub use fallback::DegradedMode;
pub use scheduler::{run_periodic, FirstTick, PeriodicTask, TickError};
pub use whale_poller::{PollReport, WhalePoller};
pub use whale_tracker::{TrackOutcome, TrackedToken, WhaleTracker};
