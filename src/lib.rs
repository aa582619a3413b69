//! # Margin Plausibility
//!
//! Plausibility checks for clearing margin data: end-of-day margin records
//! are reconciled against the intraday snapshots they must agree with.
//!
//! ## Features
//!
//! - **Reconciliation**: full outer join on (clearing number, account, margin type, margin)
//! - **Previous-day check**: end-of-day of D against the 08:00:00 snapshot of D+1
//! - **Last-intraday check**: end-of-day of D against the 19:00:00 snapshot of D
//! - **Collaborator traits**: data sources, notifiers and check loggers are injected
//!
//! ## Quick Start
//!
//! ```rust
//! use margin_plausibility::{EndOfDayRow, IntradayRow, Reconciler};
//!
//! let eod = vec![EndOfDayRow::new("2020-05-11", "Bank 1", "A1", "SPAN", 3212.2)];
//! let intraday = vec![
//!     IntradayRow::new("2020-05-11", "19:00:00", "Bank 1", "A1", "SPAN", 3212.2),
//!     IntradayRow::new("2020-05-12", "08:00:00", "Bank 1", "A1", "SPAN", 3212.2),
//! ];
//!
//! let reconciler = Reconciler::new(&eod, &intraday).unwrap();
//! assert!(reconciler.check_previous_day().matched);
//! assert!(reconciler.check_last_intraday().matched);
//! ```

pub mod config;
pub mod monitor;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use monitor::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
