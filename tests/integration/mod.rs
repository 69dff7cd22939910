//! Integration test modules.

pub mod connection_test;
pub mod dashboard_test;
pub mod query_test;
