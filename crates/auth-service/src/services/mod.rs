pub mod authentication;
pub mod authorization;

pub use authentication::AuthenticationService;
pub use authorization::{AuthPolicy, AuthorizationEnforcer, RolePolicy};
