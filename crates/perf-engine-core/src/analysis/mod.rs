//! Periodic performance reports over an analysis window.

pub mod analyzer;
pub mod record;
pub mod request;
pub mod trailing;

pub use analyzer::{analyze_performance, Feeds, PerformanceAnalyzer};
pub use record::PeriodRecord;
pub use request::{AnalysisFlags, AnalysisRequest, MwrMethod, PeriodUnit, TwrMethod};
