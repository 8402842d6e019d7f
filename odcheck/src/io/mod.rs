//! Side-effecting operations: device shell access, process execution, config.
//! Isolated behind traits to enable mocking in tests.

pub mod config;
pub mod device;
pub mod process;
