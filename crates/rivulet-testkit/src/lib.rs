//! Rivulet Testing Infrastructure
//!
//! A fake host with a batched watch mechanism, common streams
//! configurations, and tracing setup for tests.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! rivulet-testkit = { path = "../rivulet-testkit" }
//! ```
//!
//! ```rust,ignore
//! use rivulet_testkit::*;
//!
//! #[test]
//! fn doubles() {
//!     let host = Rc::new(FakeHost::new("Counter").with_data("count", json!(5)));
//!     let _bridge = mount(&host, Some(doubling_config("count")));
//!     assert_eq!(host.value("doubled"), Some(json!(10)));
//! }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod host;

pub use fixtures::*;
pub use host::{FakeHost, WatchRecord};

/// Install a test-friendly tracing subscriber. Safe to call repeatedly.
///
/// The filter comes from `RUST_LOG`, defaulting to `warn`.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_test_writer()
        .try_init();
}
