//! market-glance: a terminal dashboard of sector positions and company
//! prices read from a data warehouse.
//!
//! This library exposes the core modules for use by the binary and the
//! integration tests.

pub mod cli;
pub mod config;
pub mod connection;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod query;
pub mod tui;
pub mod warehouse;
