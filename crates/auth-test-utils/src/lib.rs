//! # Auth Test Utilities
//!
//! Shared test utilities for the Toybox authentication service.
//!
//! This crate provides:
//! - Crypto fixtures (signing keys, fast password hashes, test accounts)
//! - Test data builders (`TestTokenBuilder`)
//! - Tamper helpers for negative-path token tests
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! let fixture = AuthFixture::new(vec![admin_account()]);
//! let token = TestTokenBuilder::new(fixture.account_id("admin@example.com"))
//!     .audience(Audience::Sse)
//!     .with_scope(Scope::SseHandshake)
//!     .encode(&fixture.codec);
//!
//! token.assert_valid_jwt().assert_audience("sse");
//! ```

pub mod assertions;
pub mod fixtures;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use token_builders::*;
