//! Corpus readers and prediction writers.
pub mod clickbait_jsonl;

pub use clickbait_jsonl::{write_predictions, ClickbaitDataset, ClickbaitReaderConfig};
