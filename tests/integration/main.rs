//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the mock digital I/O capability. All tests run on the host
//! with no real hardware required.

mod door_tests;
