//! Test utilities for the backend crate.
//!
//! Shared by unit tests in `src/` and integration tests in `tests/`; only
//! compiled for tests or with the `test-support` feature.

mod clock;
mod fixtures;
mod harness;

pub use clock::{FixtureClock, fixture_timestamp};
pub use fixtures::{facebook_identity, itinerary_driven_by};
pub use harness::{MemoryApp, login_request, memory_app};
