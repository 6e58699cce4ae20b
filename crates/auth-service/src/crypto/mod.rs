pub mod keys;
pub mod password;
pub mod token;

pub use keys::{EnvSecretStore, SecretStore, SigningKeyProvider};
pub use token::TokenCodec;
