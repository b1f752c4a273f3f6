//! Shared harness for the bridge behaviour suites.

mod reporter;
mod world;

use std::cell::RefCell;

pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::TestWorld;

/// Fresh world for a scenario.
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
