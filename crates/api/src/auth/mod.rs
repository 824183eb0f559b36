//! Authentication primitives.
//!
//! - [`jwt`] -- bearer token issuing and verification.

pub mod jwt;
