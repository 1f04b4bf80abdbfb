//! Core types and validation for the parking pipeline.

pub mod error;
pub mod event;
pub mod job;

pub use error::{Error, Result};
pub use event::*;
pub use job::*;
