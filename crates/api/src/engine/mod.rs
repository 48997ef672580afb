//! Server-side sync processing.

pub mod batch;

pub use batch::process_batch;
