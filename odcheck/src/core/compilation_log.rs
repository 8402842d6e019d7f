//! Parsing and coherence checking of the odrefresh compilation log.
//!
//! The log is line-oriented: line 0 holds the format version, every later
//! line records one triggered compilation as five whitespace-delimited
//! numeric fields. Each field is tagged with an explicit comparison policy
//! instead of hard-coded positional indices, so two consecutive entries can
//! be diffed field-by-field.

use std::fmt;

use serde::Serialize;

use crate::core::failure::{Failure, VerificationReport};

/// How a field must relate across two consecutive compilation entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldPolicy {
    /// Both entries must hold the same value (trigger reason, status, ...).
    Equal,
    /// The later entry must hold a strictly greater value (timestamps).
    StrictlyIncreasing,
}

impl fmt::Display for FieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPolicy::Equal => write!(f, "equal"),
            FieldPolicy::StrictlyIncreasing => write!(f, "strictly-increasing"),
        }
    }
}

/// One field of a compilation log entry and its comparison policy.
#[derive(Debug, Clone, Copy)]
pub struct LogField {
    pub name: &'static str,
    pub policy: FieldPolicy,
}

/// Entry schema: `<apex-version> <last-update-ms> <trigger> <compiled-at> <status>`.
pub const LOG_ENTRY_SCHEMA: [LogField; 5] = [
    LogField {
        name: "apex-version",
        policy: FieldPolicy::Equal,
    },
    LogField {
        name: "last-update-millis",
        policy: FieldPolicy::StrictlyIncreasing,
    },
    LogField {
        name: "trigger-reason",
        policy: FieldPolicy::Equal,
    },
    LogField {
        name: "compilation-time",
        policy: FieldPolicy::StrictlyIncreasing,
    },
    LogField {
        name: "status",
        policy: FieldPolicy::Equal,
    },
];

/// One compilation event row, header excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub fields: Vec<i64>,
}

/// Parsed compilation log: format version plus one entry per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationLog {
    pub format_version: i64,
    pub entries: Vec<LogEntry>,
}

impl CompilationLog {
    /// Parse the raw log text.
    ///
    /// An empty log, a non-numeric header, or a non-numeric entry field is a
    /// `ParseError`; an entry whose field count differs from the schema is a
    /// `MalformedLogEntry`.
    pub fn parse(text: &str) -> Result<Self, Failure> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());

        let header = lines.next().ok_or_else(|| Failure::ParseError {
            message: "compilation log is empty".to_string(),
        })?;
        let format_version = parse_numeric(header.trim(), "format version")?;

        let mut entries = Vec::new();
        for line in lines {
            entries.push(parse_entry(line)?);
        }

        Ok(Self {
            format_version,
            entries,
        })
    }
}

fn parse_entry(line: &str) -> Result<LogEntry, Failure> {
    let raw: Vec<&str> = line.split_whitespace().collect();
    if raw.len() != LOG_ENTRY_SCHEMA.len() {
        return Err(Failure::MalformedLogEntry {
            entry: line.to_string(),
            expected: LOG_ENTRY_SCHEMA.len(),
            found: raw.len(),
        });
    }
    let mut fields = Vec::with_capacity(raw.len());
    for value in raw {
        fields.push(parse_numeric(value, "log entry field")?);
    }
    Ok(LogEntry { fields })
}

fn parse_numeric(value: &str, what: &str) -> Result<i64, Failure> {
    value.parse().map_err(|_| Failure::ParseError {
        message: format!("non-numeric {what} '{value}'"),
    })
}

/// Compare two consecutive compilation entries field-by-field.
///
/// Field cardinality must match before any per-field comparison. Every
/// policy violation is accumulated, one `LogOrderingViolation` per field.
pub fn compare_entries(first: &LogEntry, second: &LogEntry) -> VerificationReport {
    let mut report = VerificationReport::new("compilation-log");

    if first.fields.len() != second.fields.len() {
        report.push(Failure::MalformedLogEntry {
            entry: format!("{:?} vs {:?}", first.fields, second.fields),
            expected: first.fields.len(),
            found: second.fields.len(),
        });
        return report;
    }
    if first.fields.len() != LOG_ENTRY_SCHEMA.len() {
        report.push(Failure::MalformedLogEntry {
            entry: format!("{:?}", first.fields),
            expected: LOG_ENTRY_SCHEMA.len(),
            found: first.fields.len(),
        });
        return report;
    }

    for (i, field) in LOG_ENTRY_SCHEMA.iter().enumerate() {
        let (a, b) = (first.fields[i], second.fields[i]);
        let violated = match field.policy {
            FieldPolicy::Equal => a != b,
            FieldPolicy::StrictlyIncreasing => a >= b,
        };
        if violated {
            report.push(Failure::LogOrderingViolation {
                field: field.name.to_string(),
                policy: field.policy,
                first: a,
                second: b,
            });
        }
    }

    report
}
