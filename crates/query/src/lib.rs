//! Asynchronous query execution against the external engine.
//!
//! Submits a statement, polls it to a terminal state, and returns tabular
//! results. The same state machine drives analytical queries and catalog
//! maintenance (partition repair).

pub mod analytics;
pub mod catalog;
pub mod clock;
pub mod engine;
pub mod runner;

pub use analytics::*;
pub use catalog::*;
pub use clock::*;
pub use engine::*;
pub use runner::*;
