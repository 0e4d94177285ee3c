//! Engine-side infrastructure around the search: time management.

pub mod time;

pub use time::TimeManager;
