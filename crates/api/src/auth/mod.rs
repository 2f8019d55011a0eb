//! Authentication primitives.
//!
//! - [`password`]: Argon2id hashing and verification.
//! - [`jwt`]: access tokens and refresh-token helpers.

pub mod jwt;
pub mod password;
