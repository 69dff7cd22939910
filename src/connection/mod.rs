//! Connection management for market-glance.
//!
//! Owns the single warehouse connection of a session.

pub mod manager;

pub use manager::ConnectionManager;
