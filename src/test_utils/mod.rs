/// Scripted driver for exercising a connection handle without a database
pub mod in_memory_driver;
pub mod test_helpers;

pub use in_memory_driver::{FailurePoint, InMemoryDriver, RecordedExecution};
pub use test_helpers::{create_test_row, raw_result};
