//! Device boundary: the collaborator surface the verification core consumes.
//!
//! The core only ever sees already-collected text and numbers; every blocking
//! call (shell execution, file pulls, recompilation) lives behind [`Device`].
//! A timeout or shell failure surfaces as an error and is propagated
//! unchanged.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, instrument};

use crate::io::config::CheckConfig;
use crate::io::process::{CommandOutput, run_command_with_timeout};

/// Read/act surface of the device under verification.
pub trait Device {
    /// Resolve a running process by name to its pid, or `None` if absent.
    fn find_process(&self, name: &str) -> Result<Option<String>>;

    /// Raw `/proc/<pid>/maps` dump.
    fn process_maps(&self, pid: &str) -> Result<String>;

    /// Value of an environment variable in the device shell.
    fn env_value(&self, var: &str) -> Result<String>;

    /// UTF-8 contents of a device file.
    fn read_file(&self, path: &str) -> Result<String>;

    /// Overwrite a device file with the given contents.
    fn write_file(&self, path: &str, contents: &str) -> Result<()>;

    /// Remove a device file, succeeding when it is already absent.
    fn remove_file(&self, path: &str) -> Result<()>;

    /// Whether a device path exists.
    fn file_exists(&self, path: &str) -> Result<bool>;

    /// File modification time in seconds since the epoch.
    fn mtime_secs(&self, path: &str) -> Result<i64>;

    /// Current device time in seconds since the epoch.
    fn current_time_secs(&self) -> Result<i64>;

    /// Trigger a recompilation pass, returning the command's exit code.
    fn trigger_recompilation(&self) -> Result<i32>;
}

/// Device reached through the `adb` host tool.
#[derive(Debug, Clone)]
pub struct AdbDevice {
    serial: Option<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl AdbDevice {
    pub fn new(serial: Option<String>, cfg: &CheckConfig) -> Self {
        Self {
            serial,
            timeout: Duration::from_secs(cfg.shell_timeout_secs),
            output_limit_bytes: cfg.shell_output_limit_bytes,
        }
    }

    #[instrument(skip(self, stdin))]
    fn shell(&self, command: &str, stdin: Option<&[u8]>) -> Result<CommandOutput> {
        let mut cmd = Command::new("adb");
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.arg("shell").arg(command);

        let output = run_command_with_timeout(cmd, stdin, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("adb shell '{command}'"))?;
        if output.timed_out {
            bail!("adb shell '{command}' timed out after {:?}", self.timeout);
        }
        debug!(exit_code = ?output.status.code(), "shell command done");
        Ok(output)
    }

    fn shell_checked(&self, command: &str) -> Result<String> {
        let output = self.shell(command, None)?;
        if !output.status.success() {
            bail!(
                "adb shell '{command}' exited with {:?}: {}",
                output.status.code(),
                output.stderr_text()
            );
        }
        Ok(output.stdout_text())
    }
}

impl Device for AdbDevice {
    fn find_process(&self, name: &str) -> Result<Option<String>> {
        let output = self.shell(&format!("pgrep {name}"), None)?;
        if !output.status.success() {
            return Ok(None);
        }
        let pid = output
            .stdout_text()
            .lines()
            .next()
            .map(|line| line.trim().to_string());
        Ok(pid.filter(|p| !p.is_empty()))
    }

    fn process_maps(&self, pid: &str) -> Result<String> {
        self.shell_checked(&format!("cat /proc/{pid}/maps"))
    }

    fn env_value(&self, var: &str) -> Result<String> {
        self.shell_checked(&format!("echo ${var}"))
    }

    fn read_file(&self, path: &str) -> Result<String> {
        self.shell_checked(&format!("cat '{path}'"))
    }

    fn write_file(&self, path: &str, contents: &str) -> Result<()> {
        let output = self.shell(&format!("cat > '{path}'"), Some(contents.as_bytes()))?;
        if !output.status.success() {
            bail!(
                "write to '{path}' exited with {:?}: {}",
                output.status.code(),
                output.stderr_text()
            );
        }
        Ok(())
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        self.shell_checked(&format!("rm -f '{path}'")).map(|_| ())
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        let output = self.shell(&format!("stat '{path}'"), None)?;
        Ok(output.status.success())
    }

    fn mtime_secs(&self, path: &str) -> Result<i64> {
        let raw = self.shell_checked(&format!("stat -c '%Y' '{path}'"))?;
        raw.trim()
            .parse()
            .map_err(|_| anyhow!("unparseable mtime '{raw}' for '{path}'"))
    }

    fn current_time_secs(&self) -> Result<i64> {
        let raw = self.shell_checked("date +%s")?;
        raw.trim()
            .parse()
            .map_err(|_| anyhow!("unparseable device time '{raw}'"))
    }

    fn trigger_recompilation(&self) -> Result<i32> {
        let output = self.shell("odrefresh --compile", None)?;
        output
            .status
            .code()
            .ok_or_else(|| anyhow!("odrefresh terminated without an exit code"))
    }
}
