//! Permission store, evaluator and per-session loaders.

pub mod session;
pub mod store;

pub use session::{LoadOutcome, PermissionSession};
pub use store::{Partition, PermissionStore};
