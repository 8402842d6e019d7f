//! Pure verification logic: no I/O, deterministic, fully testable in isolation.

pub mod artifact_path;
pub mod artifact_set;
pub mod cache_info;
pub mod compilation_log;
pub mod failure;
pub mod maps;
pub mod types;
