//! Core infrastructure shared across the crate.
//!
//! - **config**: configuration loading and resolved types.
//! - **error**: startup error enum.

pub mod config;
pub mod error;
