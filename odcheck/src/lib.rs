//! Verification of on-device AOT compilation artifacts.
//!
//! This crate checks that a device's ahead-of-time compiled artifacts were
//! correctly generated, named, and actually loaded by the long-running
//! processes that should map them, and that a triggered recompilation left a
//! coherent compilation history. The architecture enforces a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (path derivation, map
//!   extraction, set verification, log comparison). No I/O, fully testable
//!   in isolation.
//! - **[`io`]**: Side-effecting operations (adb shell, file pulls, process
//!   listing). Isolated behind the [`io::device::Device`] trait to enable
//!   mocking in tests.
//!
//! The orchestration module ([`verify`]) coordinates core logic with device
//! I/O to implement CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod verify;
