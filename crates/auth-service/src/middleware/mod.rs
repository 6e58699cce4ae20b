pub mod auth;

pub use auth::{establish_public_context, require_auth};
