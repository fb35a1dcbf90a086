//! Configuration module
//!
//! Settings file handling: backend URL, timeouts, default query mode
//! and display options.

pub mod config;
