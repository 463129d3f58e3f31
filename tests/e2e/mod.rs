//! End-to-end tests against mock ports.

pub mod discovery_tests;
pub mod exchange_tests;
