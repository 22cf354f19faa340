//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod fan_out;
pub mod generate_title;
pub mod health_monitor;
pub mod run_council;

#[cfg(test)]
pub(crate) mod test_support;
