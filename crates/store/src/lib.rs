//! Object storage interface and the partitioned store writer.

pub mod memory;
pub mod object;
pub mod writer;

pub use memory::*;
pub use object::*;
pub use writer::*;
