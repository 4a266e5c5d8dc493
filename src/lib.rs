//! CARDLINE: trade-up combination scanner for collectible skins
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod floats;
pub mod catalog;
pub mod market;
pub mod resolver;
pub mod search;
pub mod report;
