pub mod chain;
pub mod environment;
pub mod environment_guard;
pub mod guard;
pub mod navigation;

pub use chain::GuardChain;
pub use environment::{resolve_environment, EnvironmentResolution};
pub use environment_guard::EnvironmentGuard;
pub use guard::{
    GuardDecision, GuardOptions, LoadFailurePolicy, OrganizationPermissionGuard, Prepared,
    RouteData, RouteGuard, RoutePermissions, ScopedPermissionGuard, DEFAULT_LOGIN_PATH,
};
pub use navigation::Navigation;
