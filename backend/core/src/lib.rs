pub mod crud;
pub mod error;
pub mod traits;
pub mod types;
pub mod user;

pub use crud::{flatten, CrudGrant, CrudMap};
pub use error::{PortcullisError, Result};
pub use traits::{EnvironmentSource, PermissionSource, UserSource};
pub use types::{permissions, Environment, PermissionString, Scope};
pub use user::{User, UserRole};
