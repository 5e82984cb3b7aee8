//! Persistent pool of candidate images indexed by color signature

/// Directory scanning and parallel signature extraction into a pool
pub mod build;
/// SQLite table definitions
pub mod schema;
/// Pool handle: registration, usage tracking and candidate queries
pub mod store;

pub use build::{BuildReport, PoolBuilder};
pub use store::{Candidate, ImagePool, ImageRecord, SignatureEntry};
