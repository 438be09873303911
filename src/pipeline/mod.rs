//! Record processing stages.
//!
//! Parsing and cleaning, validation, deduplication with email encryption,
//! and low-score flagging. Stages run sequentially over an in-memory list.

pub mod cleaner;
pub mod dedup;
pub mod processor;
pub mod validator;

pub use cleaner::{clean_records, parse_student_data};
pub use processor::RecordProcessor;
