//! Pipeline workers: enrichment, queue draining, and background scheduling.

pub mod enrichment;
pub mod ingest;
pub mod pipeline;
pub mod scheduler;

pub use enrichment::*;
pub use ingest::*;
pub use pipeline::*;
pub use scheduler::*;
