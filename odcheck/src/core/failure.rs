//! Typed verification failures and the per-check report that carries them.
//!
//! Every failure carries enough structured context (offending path, field
//! name, expected vs actual value) to be surfaced directly as an assertion
//! message. Independent checks within one verification pass accumulate their
//! failures into a [`VerificationReport`] rather than short-circuiting, so a
//! caller sees the complete failure set in one pass.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::compilation_log::FieldPolicy;

/// A single terminal, locally-unrecoverable verification failure.
///
/// None of these are retried internally; retry/backoff belongs to the device
/// collaborator, not the verification core.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// A boot-extension artifact triple is incomplete or has the wrong size.
    #[error(
        "incomplete artifact set for '{name}': expected {expected} artifacts, found {found}, missing extensions [{}]",
        .missing.join(", ")
    )]
    IncompleteArtifactSet {
        name: String,
        expected: usize,
        found: usize,
        missing: Vec<String>,
    },

    /// A derived expected artifact path was absent from the observed set.
    #[error("missing artifact: {path}")]
    MissingArtifact { path: String },

    /// An observed mapped file does not end in any recognized artifact suffix.
    #[error("unrecognized artifact kind: {path}")]
    UnrecognizedArtifactKind { path: String },

    /// Classpath-mode verification requires at least one observed artifact to
    /// derive the instruction-set segment from.
    #[error("observed artifact set is empty")]
    EmptyObservedSet,

    /// A log entry's field cardinality does not match its peer or the schema.
    #[error("malformed log entry '{entry}': expected {expected} fields, found {found}")]
    MalformedLogEntry {
        entry: String,
        expected: usize,
        found: usize,
    },

    /// Two consecutive log entries violate a field's comparison policy.
    #[error("log ordering violation at field '{field}': {policy} violated ({first} vs {second})")]
    LogOrderingViolation {
        field: String,
        policy: FieldPolicy,
        first: i64,
        second: i64,
    },

    /// The cache descriptor has no checksum line for the target dependency.
    /// A caller-configuration error, never retried.
    #[error("pattern not found: no mutable checksum line for dependency '{dependency}'")]
    PatternNotFound { dependency: String },

    /// Upstream text was unusable (unresolvable process, non-numeric log
    /// field, empty classpath).
    #[error("parse error: {message}")]
    ParseError { message: String },

    /// A boot-classpath artifact was rewritten by a recompilation that should
    /// not have touched it.
    #[error("unexpected recompilation of {path}: mtime {mtime} >= {since}")]
    UnexpectedRecompilation { path: String, mtime: i64, since: i64 },

    /// A system-server artifact was left untouched by a recompilation that
    /// should have refreshed it.
    #[error("missing recompilation of {path}: mtime {mtime} < {since}")]
    MissingRecompilation { path: String, mtime: i64, since: i64 },
}

/// Outcome of one named verification check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Stable check name, e.g. `zygote-artifacts`.
    pub check: String,
    /// Accumulated failures; empty means the check passed.
    pub failures: Vec<Failure>,
}

impl VerificationReport {
    pub fn new(check: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            failures: Vec::new(),
        }
    }

    pub fn push(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    pub fn is_pass(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report's failures into this one, keeping this check name.
    pub fn merge(&mut self, other: VerificationReport) {
        self.failures.extend(other.failures);
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pass() {
            return write!(f, "PASS {}", self.check);
        }
        writeln!(f, "FAIL {}", self.check)?;
        for failure in &self.failures {
            writeln!(f, "- {failure}")?;
        }
        Ok(())
    }
}
