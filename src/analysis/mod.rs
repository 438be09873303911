//! Analysis modules.
//!
//! Statistics over the final record set.

pub mod aggregator;

pub use aggregator::*;
