//! Tests for the executor
//!
//! Organized by feature area

mod driver_tests;
mod helpers;
