//! Reconciliation of end-of-day margins against intraday snapshots
//!
//! The [`Reconciler`] normalizes both snapshots once and answers two checks:
//!
//! - previous day: every end-of-day record of day D appears in the first
//!   intraday snapshot of D+1
//! - last intraday: every end-of-day record of day D appears in the last
//!   intraday snapshot of D
//!
//! Both checks join the two sides on the business key and report unmatched
//! records from either side.

pub mod matching;
pub mod outcome;
pub mod reconciler;

pub use matching::Cutover;
pub use outcome::*;
pub use reconciler::*;
