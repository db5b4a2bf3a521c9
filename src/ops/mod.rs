pub mod relevance;
pub mod aggregate;
pub mod sync;
pub mod save;
