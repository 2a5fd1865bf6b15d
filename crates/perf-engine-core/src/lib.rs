//! Investment performance engine.
//!
//! Pure, synchronous return calculations over a cash-flow ledger and an
//! asset-valuation curve: simple return, Modified Dietz, true time-weighted
//! return, linked Modified Dietz TWR, and a periodic performance analyzer.

pub mod calendar;
pub mod error;
pub mod feeds;
pub mod types;

#[cfg(feature = "returns")]
pub mod returns;

#[cfg(feature = "analysis")]
pub mod analysis;

pub use error::PerfEngineError;
pub use types::*;

/// Standard result type for all engine operations
pub type PerfEngineResult<T> = Result<T, PerfEngineError>;
