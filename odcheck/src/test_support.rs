//! Test-only helpers: an in-memory device and canonical fixtures.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, anyhow};

use crate::core::artifact_path::expected_artifact_path;
use crate::core::types::{APP_ARTIFACT_KINDS, BOOT_ARTIFACT_KINDS};
use crate::io::config::CheckConfig;
use crate::io::device::Device;

/// Classpath used by [`FakeDevice::with_healthy_snapshot`].
pub const FIXTURE_CLASSPATH: [&str; 2] = [
    "/system/framework/services.jar",
    "/apex/com.android.ipsec/javalib/android.net.ipsec.ike.jar",
];

/// Compilation log with a version header and two coherent entries.
pub const FIXTURE_COMPILATION_LOG: &str = "1\n1 100 0 200 0\n1 150 0 260 0\n";

/// In-memory [`Device`] holding one snapshot of device state.
#[derive(Debug, Default)]
pub struct FakeDevice {
    processes: BTreeMap<String, String>,
    maps: BTreeMap<String, String>,
    env: BTreeMap<String, String>,
    files: RefCell<BTreeMap<String, String>>,
    mtimes: BTreeMap<String, i64>,
    now_secs: i64,
    recompile_exit_code: i32,
    recompilations: Cell<u32>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device whose zygote, system server, cache descriptor, and
    /// compilation log are all consistent with `CheckConfig::default()`.
    pub fn with_healthy_snapshot() -> Self {
        let cfg = CheckConfig::default();

        let boot_artifacts: BTreeSet<String> = BOOT_ARTIFACT_KINDS
            .iter()
            .map(|kind| {
                format!(
                    "{}/arm64/{}{}",
                    cfg.cache_root,
                    cfg.boot_extension_name,
                    kind.extension()
                )
            })
            .collect();

        let mut server_artifacts = BTreeSet::new();
        for element in FIXTURE_CLASSPATH {
            for kind in APP_ARTIFACT_KINDS {
                server_artifacts.insert(expected_artifact_path(
                    &cfg.cache_root,
                    "arm64",
                    element,
                    kind.extension(),
                ));
            }
        }

        let mut device = Self::new()
            .with_process("zygote64", "123")
            .with_process(&cfg.system_server_process, "456")
            .with_maps("123", &maps_dump(&boot_artifacts))
            .with_maps("456", &maps_dump(&server_artifacts))
            .with_env(&cfg.classpath_env_var, &FIXTURE_CLASSPATH.join(":"))
            .with_file(&cfg.cache_info_path, &fixture_cache_info())
            .with_file(&cfg.compilation_log_path, FIXTURE_COMPILATION_LOG)
            .with_time(1500);

        for artifact in &boot_artifacts {
            device = device.with_mtime(artifact, 100);
        }
        for artifact in &server_artifacts {
            device = device.with_mtime(artifact, 1600);
        }
        device
    }

    pub fn with_process(mut self, name: &str, pid: &str) -> Self {
        self.processes.insert(name.to_string(), pid.to_string());
        self
    }

    pub fn with_maps(mut self, pid: &str, maps: &str) -> Self {
        self.maps.insert(pid.to_string(), maps.to_string());
        self
    }

    pub fn with_env(mut self, var: &str, value: &str) -> Self {
        self.env.insert(var.to_string(), value.to_string());
        self
    }

    pub fn with_file(self, path: &str, contents: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(path.to_string(), contents.to_string());
        self
    }

    pub fn with_mtime(mut self, path: &str, secs: i64) -> Self {
        self.mtimes.insert(path.to_string(), secs);
        self
    }

    pub fn with_time(mut self, now_secs: i64) -> Self {
        self.now_secs = now_secs;
        self
    }

    pub fn with_recompile_exit_code(mut self, code: i32) -> Self {
        self.recompile_exit_code = code;
        self
    }

    /// Current contents of a fake file; panics if absent.
    pub fn file_contents(&self, path: &str) -> String {
        self.files
            .borrow()
            .get(path)
            .unwrap_or_else(|| panic!("no fake file '{path}'"))
            .clone()
    }

    /// How many times a recompilation was triggered.
    pub fn recompilations(&self) -> u32 {
        self.recompilations.get()
    }
}

impl Device for FakeDevice {
    fn find_process(&self, name: &str) -> Result<Option<String>> {
        Ok(self.processes.get(name).cloned())
    }

    fn process_maps(&self, pid: &str) -> Result<String> {
        self.maps
            .get(pid)
            .cloned()
            .ok_or_else(|| anyhow!("no maps for pid {pid}"))
    }

    fn env_value(&self, var: &str) -> Result<String> {
        Ok(self.env.get(var).cloned().unwrap_or_default())
    }

    fn read_file(&self, path: &str) -> Result<String> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no such file '{path}'"))
    }

    fn write_file(&self, path: &str, contents: &str) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_string(), contents.to_string());
        Ok(())
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        self.files.borrow_mut().remove(path);
        Ok(())
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.files.borrow().contains_key(path))
    }

    fn mtime_secs(&self, path: &str) -> Result<i64> {
        self.mtimes
            .get(path)
            .copied()
            .ok_or_else(|| anyhow!("no mtime for '{path}'"))
    }

    fn current_time_secs(&self) -> Result<i64> {
        Ok(self.now_secs)
    }

    fn trigger_recompilation(&self) -> Result<i32> {
        self.recompilations.set(self.recompilations.get() + 1);
        Ok(self.recompile_exit_code)
    }
}

/// Render a set of paths as a `/proc/<pid>/maps`-shaped dump, including an
/// anonymous region that extraction must skip.
pub fn maps_dump(paths: &BTreeSet<String>) -> String {
    let mut lines: Vec<String> = paths
        .iter()
        .map(|path| format!("7f0c2000-7f0c5000 r--p 00000000 fe:01 1234    {path}"))
        .collect();
    lines.push(
        "7f1a0000-7f1a1000 rw-p 00000000 00:00 0       [anon:dalvik-zygote-space]".to_string(),
    );
    lines.join("\n")
}

/// Cache descriptor with checksum lines for two APEX dependencies.
pub fn fixture_cache_info() -> String {
    "<cacheInfo>\n\
     <module name=\"/apex/com.android.ipsec/javalib/android.net.ipsec.ike.jar\" checksums=\"12ab34cd\"/>\n\
     <module name=\"/apex/com.android.wifi/javalib/service-wifi.jar\" checksums=\"56ef78de\"/>\n\
     </cacheInfo>\n"
        .to_string()
}
