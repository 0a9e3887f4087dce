//! Turns a day of scattered activity records (browser history, AI chat exports, git logs,
//! file-system touches and manual notes) into one categorized daily report.
//!
//! Collectors drop their output into a record directory, [collection] loads it, [engine] dedupes,
//! categorizes and aggregates it, and [cli] prints the result.

pub mod cli;
pub mod collection;
pub mod config;
pub mod engine;
pub mod utils;
