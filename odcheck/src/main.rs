//! CLI for on-device AOT artifact verification.
//!
//! Each subcommand takes one snapshot of device state through adb, runs the
//! corresponding verification pass, prints the report to stdout, and exits
//! with a stable code.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use odcheck::core::failure::VerificationReport;
use odcheck::exit_codes;
use odcheck::io::config::{CheckConfig, load_config};
use odcheck::io::device::AdbDevice;
use odcheck::verify;

#[derive(Parser)]
#[command(
    name = "odcheck",
    version,
    about = "Verify on-device AOT compilation artifacts"
)]
struct Cli {
    /// Path to config TOML; stock Android defaults apply when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Adb device serial (passed as `adb -s`).
    #[arg(long, global = true)]
    serial: Option<String>,

    /// Emit verification reports as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify zygote and system server processes have loaded the expected artifacts.
    Loaded,
    /// Verify the compilation log records one coherent follow-up compilation.
    Log,
    /// Mutate the cache descriptor so one dependency appears changed.
    MutateCache,
    /// Simulate staleness, trigger a recompilation, and verify its scope.
    Recompile,
}

fn main() -> ExitCode {
    odcheck::logging::init();
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let cfg = CheckConfig::default();
            cfg.validate()?;
            cfg
        }
    };
    let device = AdbDevice::new(cli.serial.clone(), &cfg);

    let reports = match cli.command {
        Command::Loaded => vec![
            verify::verify_compilation_log(&device, &cfg).context("check compilation log")?,
            verify::verify_zygote_artifacts(&device, &cfg).context("check zygote artifacts")?,
            verify::verify_system_server_artifacts(&device, &cfg)
                .context("check system server artifacts")?,
        ],
        Command::Log => {
            vec![verify::verify_compilation_log(&device, &cfg).context("check compilation log")?]
        }
        Command::MutateCache => {
            verify::simulate_staleness(&device, &cfg).context("simulate staleness")?;
            return Ok(exit_codes::OK);
        }
        Command::Recompile => {
            vec![verify::check_staleness_flow(&device, &cfg).context("staleness flow")?]
        }
    };

    print_reports(&reports, cli.json)?;
    if reports.iter().all(VerificationReport::is_pass) {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::FAILED)
    }
}

fn print_reports(reports: &[VerificationReport], json: bool) -> Result<()> {
    if json {
        let mut payload = serde_json::to_string_pretty(reports).context("serialize reports")?;
        payload.push('\n');
        print!("{payload}");
    } else {
        for report in reports {
            println!("{report}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_loaded() {
        let cli = Cli::parse_from(["odcheck", "loaded"]);
        assert!(matches!(cli.command, Command::Loaded));
        assert!(!cli.json);
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["odcheck", "log", "--json", "--serial", "emulator-5554"]);
        assert!(matches!(cli.command, Command::Log));
        assert!(cli.json);
        assert_eq!(cli.serial.as_deref(), Some("emulator-5554"));
    }

    #[test]
    fn parse_mutate_cache() {
        let cli = Cli::parse_from(["odcheck", "mutate-cache"]);
        assert!(matches!(cli.command, Command::MutateCache));
    }
}
