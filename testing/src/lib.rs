//! Shared test fixtures for the remote configuration workspace.
//!
//! Provides:
//! - Counting wrappers around the pipeline collaborators (downloader,
//!   extractor, provider, parser) so tests can assert how often each ran
//! - Builders for in-memory `.tar.gz` configuration bundles
//! - Unique identifiers for tests sharing one process

mod fixtures;

pub use fixtures::*;
use std::sync::atomic::{AtomicU32, Ordering};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

pub fn unique_component() -> String {
    unique_id("test-component")
}
