//! # DETECT Library
//!
//! This library exposes the DETECT application modules for testing and
//! integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod pages;

// Re-export detect_core for convenience
pub use detect_core;
