//! # fdgd-report
//!
//! Packages descent trajectories for consumers: a labeled values table with
//! JSON and CSV export, and a run record tracking lifecycle and best epoch.

mod run;
mod table;

pub use run::{RunId, RunRecord, RunState};
pub use table::ValuesTable;
