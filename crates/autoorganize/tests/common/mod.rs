//! Shared test utilities for autoorganize integration tests.
//!
//! - `TestHarness` for isolated runs with temp directories and fakes
//! - In-memory fakes of the catalog, metadata resolver and library monitor

pub mod fakes;
pub mod harness;

pub use fakes::{FakeCatalog, FakeMonitor, FakeResolver};
pub use harness::{write_file, TestHarness};
