//! Per-language analysis and the header update pipeline

pub mod analyzer;
pub mod languages;
pub mod pipeline;
pub mod pool;
pub mod resolve;


pub use analyzer::{LanguageAnalyzer, analyzer_for};
pub use pipeline::{BatchReport, UpdateOutcome, UpdatePipeline};
pub use pool::UpdatePool;
