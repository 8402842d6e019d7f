//! Stable exit codes for odcheck CLI commands.

/// All verification checks passed.
pub const OK: i32 = 0;
/// Config, device, or other boundary error before verification completed.
pub const ERROR: i32 = 1;
/// Verification completed and at least one check failed.
pub const FAILED: i32 = 2;
