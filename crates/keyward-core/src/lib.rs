//! Shared types for the keyward key custodian.
//!
//! This crate holds the error taxonomy and configuration types used by the
//! rest of the workspace. It deliberately contains no cryptography and no
//! I/O beyond configuration loading, so every other crate can depend on it
//! without pulling in the controller stack.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
