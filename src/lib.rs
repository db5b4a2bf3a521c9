//! Grow stage aggregation and apply-to-plants sync.
//!
//! `model` holds the value types and the stage vocabulary, `ops` the pure
//! engine (relevance, aggregation, sync eligibility, save decisions), `io`
//! the file-backed collaborators, and `cli` the `stg` host.

pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
