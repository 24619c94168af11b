//! Miner log module
//!
//! Reads the ethminer log from its end, picks the newest trustworthy status
//! line and decides whether the miner is still hashing.

pub mod evaluator;
pub mod parser;
pub mod probe;
pub mod reader;
pub mod types;

pub use evaluator::ActivityEvaluator;
pub use parser::LineClassifier;
pub use probe::LogFileProbe;
pub use reader::ReverseLines;
pub use types::{AnchorMode, EvaluatorConfig, ParsedStatus};
