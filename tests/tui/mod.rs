//! TUI integration tests.
//!
//! Headless runs are driven in-process through `HeadlessRunner`; the binary
//! tests exercise the `--headless` command line end to end.

pub mod binary_test;
pub mod common;
pub mod headless_test;
