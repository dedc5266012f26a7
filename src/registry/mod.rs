pub mod core;
pub mod persist;


// Re-export the primary types so callers can use `crate::registry::*`.
pub use self::core::{LoadReport, Registry, Snapshot};
pub use persist::{NoopSink, PersistSink};
