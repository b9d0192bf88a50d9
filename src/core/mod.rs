//! Core infrastructure — shared foundation used across the whole crate.
//!
//! - **config** — configuration loading and resolved types.
//! - **error** — application-wide and domain error enums.

pub mod config;
pub mod error;
