//! Verification configuration (TOML).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Checker configuration.
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to the stock Android layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CheckConfig {
    /// ART APEX dalvik-cache directory holding all on-device artifacts.
    pub cache_root: String,

    /// Path of the odrefresh compilation log.
    pub compilation_log_path: String,

    /// Path of the cache descriptor recording per-dependency checksums.
    pub cache_info_path: String,

    /// Candidate zygote process names; at least one must be running.
    pub zygote_names: Vec<String>,

    /// System server process name.
    pub system_server_process: String,

    /// Environment variable holding the colon-separated system server classpath.
    pub classpath_env_var: String,

    /// Logical name of the boot extension image to check.
    pub boot_extension_name: String,

    /// Dependency whose checksum is mutated to simulate staleness. Must be on
    /// BOOTCLASSPATH but not DEX2OATBOOTCLASSPATH so the mutation triggers
    /// staleness detection without changing the recompiled boot artifact set.
    pub staleness_dependency: String,

    /// Replacement checksum value written by the staleness simulation.
    pub checksum_sentinel: String,

    /// Per-shell-command wall-clock budget in seconds.
    pub shell_timeout_secs: u64,

    /// Truncate shell stdout/stderr beyond this many bytes.
    pub shell_output_limit_bytes: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            cache_root: "/data/misc/apexdata/com.android.art/dalvik-cache".to_string(),
            compilation_log_path: "/data/misc/odrefresh/compilation-log.txt".to_string(),
            cache_info_path: "/data/misc/apexdata/com.android.art/dalvik-cache/cache-info.xml"
                .to_string(),
            zygote_names: vec!["zygote".to_string(), "zygote64".to_string()],
            system_server_process: "system_server".to_string(),
            classpath_env_var: "SYSTEMSERVERCLASSPATH".to_string(),
            boot_extension_name: "boot-framework".to_string(),
            staleness_dependency: "com.android.wifi".to_string(),
            checksum_sentinel: "aaaaaaaa".to_string(),
            shell_timeout_secs: 2 * 60,
            shell_output_limit_bytes: 1_000_000,
        }
    }
}

impl CheckConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cache_root.trim().is_empty() {
            return Err(anyhow!("cache_root must be non-empty"));
        }
        if self.zygote_names.is_empty()
            || self.zygote_names.iter().any(|name| name.trim().is_empty())
        {
            return Err(anyhow!("zygote_names must be a non-empty array of names"));
        }
        if self.system_server_process.trim().is_empty() {
            return Err(anyhow!("system_server_process must be non-empty"));
        }
        if self.boot_extension_name.trim().is_empty() {
            return Err(anyhow!("boot_extension_name must be non-empty"));
        }
        if self.checksum_sentinel.trim().is_empty() {
            return Err(anyhow!("checksum_sentinel must be non-empty"));
        }
        if self.shell_timeout_secs == 0 {
            return Err(anyhow!("shell_timeout_secs must be > 0"));
        }
        if self.shell_output_limit_bytes == 0 {
            return Err(anyhow!("shell_output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CheckConfig::default()`.
pub fn load_config(path: &Path) -> Result<CheckConfig> {
    if !path.exists() {
        let cfg = CheckConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CheckConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, CheckConfig::default());
    }

    #[test]
    fn load_overrides_only_named_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("check.toml");
        fs::write(&path, "boot_extension_name = \"boot-minimal\"\n").expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.boot_extension_name, "boot-minimal");
        assert_eq!(cfg.cache_root, CheckConfig::default().cache_root);
    }

    #[test]
    fn validate_rejects_empty_zygote_names() {
        let cfg = CheckConfig {
            zygote_names: Vec::new(),
            ..CheckConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let cfg = CheckConfig {
            shell_timeout_secs: 0,
            ..CheckConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
