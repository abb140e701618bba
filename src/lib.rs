//! `swiss-energy` library crate.
//!
//! The binary (`energy`) is a thin wrapper around this library so that:
//!
//! - fetching, caching and aggregation are testable without spawning processes
//! - the same service objects can back other front-ends (web dashboards, notebooks)

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
