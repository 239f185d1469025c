//! Torrent filtering and tracker URL rewriting.
//!
//! Everything here is pure: no network access, no logging side effects beyond
//! `debug!` traces. The runner decides what to do with the outcomes.

mod filter;
mod rule;

pub use filter::{is_eligible, retain_requested};
pub use rule::{RewriteOutcome, RewriteRule};
