pub mod aggregator;
pub mod classifier;
pub mod sentiment;

pub use aggregator::{aggregate, filter_by_threshold, WhaleReport};
pub use classifier::{classify_batch, classify_transfer, ClassifyContext};
pub use sentiment::{classify_message, classify_text, SentimentAggregator};
