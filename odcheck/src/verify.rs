//! Verification passes: core logic composed with device I/O.
//!
//! Each operation takes a single snapshot of device state, runs the pure
//! checks over it, and returns one [`VerificationReport`]. Boundary errors
//! (shell failure, timeout) surface as `anyhow` errors; verification
//! outcomes, including unusable upstream text, land in the report as typed
//! failures.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::artifact_set::{verify_boot_extension_artifacts, verify_classpath_artifacts};
use crate::core::cache_info::replace_dependency_checksum;
use crate::core::compilation_log::{CompilationLog, compare_entries};
use crate::core::failure::{Failure, VerificationReport};
use crate::core::maps::mapped_artifacts;
use crate::io::config::CheckConfig;
use crate::io::device::Device;

/// Verify each running zygote has the boot-extension triple mapped.
///
/// Both 32-bit and 64-bit zygotes may exist; absent ones are skipped, but at
/// least one must be running.
pub fn verify_zygote_artifacts(
    device: &dyn Device,
    cfg: &CheckConfig,
) -> Result<VerificationReport> {
    let mut report = VerificationReport::new("zygote-artifacts");
    let mut zygotes_checked = 0usize;

    for name in &cfg.zygote_names {
        let Some(artifacts) = zygote_loaded_artifacts(device, cfg, name)? else {
            continue;
        };
        zygotes_checked += 1;
        debug!(zygote = %name, artifacts = artifacts.len(), "checking boot extension triple");
        report.merge(verify_boot_extension_artifacts(
            &artifacts,
            &cfg.boot_extension_name,
        ));
    }

    if zygotes_checked == 0 {
        report.push(Failure::ParseError {
            message: format!("no zygote process found among [{}]", cfg.zygote_names.join(", ")),
        });
    }
    Ok(report)
}

/// Verify the system server has a complete artifact triple mapped for every
/// element of its running classpath.
pub fn verify_system_server_artifacts(
    device: &dyn Device,
    cfg: &CheckConfig,
) -> Result<VerificationReport> {
    let mut report = VerificationReport::new("system-server-artifacts");

    let Some(pid) = device.find_process(&cfg.system_server_process)? else {
        report.push(Failure::ParseError {
            message: format!("process '{}' not found", cfg.system_server_process),
        });
        return Ok(report);
    };

    let classpath_raw = device
        .env_value(&cfg.classpath_env_var)
        .with_context(|| format!("read ${}", cfg.classpath_env_var))?;
    let classpath: Vec<String> = classpath_raw
        .trim()
        .split(':')
        .filter(|element| !element.is_empty())
        .map(str::to_string)
        .collect();
    if classpath.is_empty() {
        report.push(Failure::ParseError {
            message: format!("${} is empty", cfg.classpath_env_var),
        });
        return Ok(report);
    }

    let observed = system_server_loaded_artifacts(device, cfg, &pid)?;
    debug!(artifacts = observed.len(), elements = classpath.len(), "checking classpath triples");
    report.merge(verify_classpath_artifacts(
        &observed,
        &classpath,
        &cfg.cache_root,
    ));
    Ok(report)
}

/// Verify the compilation log records exactly one new, later compilation.
///
/// The log must exist, carry its version header plus two entries, and the
/// second entry must be a coherent successor of the first (timestamps move
/// forward, everything else unchanged).
pub fn verify_compilation_log(
    device: &dyn Device,
    cfg: &CheckConfig,
) -> Result<VerificationReport> {
    let mut report = VerificationReport::new("compilation-log");

    if !device.file_exists(&cfg.compilation_log_path)? {
        report.push(Failure::ParseError {
            message: format!("compilation log '{}' not found", cfg.compilation_log_path),
        });
        return Ok(report);
    }

    let text = device.read_file(&cfg.compilation_log_path)?;
    let log = match CompilationLog::parse(&text) {
        Ok(log) => log,
        Err(failure) => {
            report.push(failure);
            return Ok(report);
        }
    };

    if log.entries.len() != 2 {
        report.push(Failure::ParseError {
            message: format!(
                "expected 2 entries in '{}', found {}",
                cfg.compilation_log_path,
                log.entries.len()
            ),
        });
        return Ok(report);
    }

    report.merge(compare_entries(&log.entries[0], &log.entries[1]));
    Ok(report)
}

/// Rewrite the cache descriptor so one dependency appears changed.
///
/// A `PatternNotFound` here is a caller-configuration error and is surfaced
/// as a hard failure, never retried.
pub fn simulate_staleness(device: &dyn Device, cfg: &CheckConfig) -> Result<()> {
    let text = device
        .read_file(&cfg.cache_info_path)
        .with_context(|| format!("read {}", cfg.cache_info_path))?;
    let mutated =
        replace_dependency_checksum(&text, &cfg.staleness_dependency, &cfg.checksum_sentinel)
            .map_err(anyhow::Error::new)
            .with_context(|| format!("mutate {}", cfg.cache_info_path))?;
    device
        .write_file(&cfg.cache_info_path, &mutated)
        .with_context(|| format!("write {}", cfg.cache_info_path))?;
    info!(dependency = %cfg.staleness_dependency, "cache descriptor checksum mutated");
    Ok(())
}

/// Verify which artifacts a staleness-triggered recompilation touched.
///
/// The mutated dependency is off the primary compilation classpath, so boot
/// artifacts must predate `since` while every system-server artifact must
/// have been rewritten at or after it.
pub fn verify_recompilation_scope(
    device: &dyn Device,
    boot_artifacts: &BTreeSet<String>,
    server_artifacts: &BTreeSet<String>,
    since: i64,
) -> Result<VerificationReport> {
    let mut report = VerificationReport::new("recompilation-scope");

    for artifact in boot_artifacts {
        let mtime = device.mtime_secs(artifact)?;
        if mtime >= since {
            report.push(Failure::UnexpectedRecompilation {
                path: artifact.clone(),
                mtime,
                since,
            });
        }
    }
    for artifact in server_artifacts {
        let mtime = device.mtime_secs(artifact)?;
        if mtime < since {
            report.push(Failure::MissingRecompilation {
                path: artifact.clone(),
                mtime,
                since,
            });
        }
    }
    Ok(report)
}

/// Full staleness flow: snapshot loaded artifacts, mutate the cache
/// descriptor, trigger a recompilation, then verify its scope.
pub fn check_staleness_flow(device: &dyn Device, cfg: &CheckConfig) -> Result<VerificationReport> {
    let mut boot_artifacts = BTreeSet::new();
    for name in &cfg.zygote_names {
        if let Some(artifacts) = zygote_loaded_artifacts(device, cfg, name)? {
            boot_artifacts.extend(artifacts);
        }
    }

    let mut server_artifacts = BTreeSet::new();
    if let Some(pid) = device.find_process(&cfg.system_server_process)? {
        server_artifacts = system_server_loaded_artifacts(device, cfg, &pid)?;
    }

    let since = device.current_time_secs()?;
    simulate_staleness(device, cfg)?;

    // Stale log entries make odrefresh back off instead of recompiling.
    device
        .remove_file(&cfg.compilation_log_path)
        .with_context(|| format!("remove {}", cfg.compilation_log_path))?;

    let exit_code = device.trigger_recompilation()?;
    debug!(exit_code, "recompilation triggered");

    verify_recompilation_scope(device, &boot_artifacts, &server_artifacts, since)
}

/// Mapped boot-extension artifacts of one zygote, or `None` if the process
/// is not running.
fn zygote_loaded_artifacts(
    device: &dyn Device,
    cfg: &CheckConfig,
    zygote_name: &str,
) -> Result<Option<BTreeSet<String>>> {
    let Some(pid) = device.find_process(zygote_name)? else {
        return Ok(None);
    };
    let maps = device.process_maps(&pid)?;
    Ok(Some(mapped_artifacts(
        &maps,
        &cfg.boot_extension_name,
        &cfg.cache_root,
    )))
}

/// Mapped `@classes` artifacts of the system server.
fn system_server_loaded_artifacts(
    device: &dyn Device,
    cfg: &CheckConfig,
    pid: &str,
) -> Result<BTreeSet<String>> {
    let maps = device.process_maps(pid)?;
    // System server artifact names all contain "@classes"; the prefix keeps
    // only paths under the APEX dalvik cache.
    Ok(mapped_artifacts(&maps, "@classes", &cfg.cache_root))
}
