//! Removable-media discovery and mounting.
//!
//! A scan produces an explicit [`DeviceSnapshot`] of the block devices that
//! match the device filter, keyed by device path. [`LinuxMedia`] reads them
//! from `blkid`, mounts with `mount`/`umount` (optionally through `sudo`) and
//! reads the mount table from `/proc/self/mounts`.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use regex::Regex;

use crate::core::config::UsbConfig;
use crate::core::errors::{CsError, Result};

/// Filesystem attributes reported for one block device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceAttrs {
    pub uuid: Option<String>,
    pub label: Option<String>,
    pub fs_type: Option<String>,
}

impl DeviceAttrs {
    /// Label when present, otherwise the UUID.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.label.as_deref().or(self.uuid.as_deref())
    }
}

/// Devices present at scan time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    devices: BTreeMap<String, DeviceAttrs>,
}

impl DeviceSnapshot {
    #[must_use]
    pub fn new(devices: BTreeMap<String, DeviceAttrs>) -> Self {
        Self { devices }
    }

    /// At least one device matched the filter.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Whether a device path or filesystem UUID is in the snapshot.
    #[must_use]
    pub fn contains(&self, device_or_uuid: &str) -> bool {
        self.devices.contains_key(device_or_uuid) || self.device_for_uuid(device_or_uuid).is_some()
    }

    #[must_use]
    pub fn device_for_uuid(&self, uuid: &str) -> Option<&str> {
        self.devices
            .iter()
            .find(|(_, attrs)| attrs.uuid.as_deref() == Some(uuid))
            .map(|(dev, _)| dev.as_str())
    }

    #[must_use]
    pub fn get(&self, device: &str) -> Option<&DeviceAttrs> {
        self.devices.get(device)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceAttrs)> {
        self.devices.iter().map(|(dev, attrs)| (dev.as_str(), attrs))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Device discovery and mount control.
pub trait MediaEnumerator: Send + Sync {
    /// Fresh snapshot of the removable devices.
    fn scan(&self) -> Result<DeviceSnapshot>;
    /// Mount `device` at `target`. `Ok(false)` when the mount tool refused.
    fn mount(&self, device: &str, target: &Path, options: &str) -> Result<bool>;
    /// Unmount `device`. `Ok(false)` when the unmount tool refused.
    fn unmount(&self, device: &str) -> Result<bool>;
    /// Mounted devices matching the device filter and where they are mounted.
    fn mount_points(&self) -> Result<BTreeMap<String, PathBuf>>;
}

// ──────────────────── parsing ────────────────────

const BLKID_PAIR: &str = r#"([A-Za-z_]+)="((?:[^"\\]|\\.)*)""#;

/// Parse `blkid` output (`/dev/sdb1: UUID="..." TYPE="vfat"` per line),
/// keeping devices whose path matches `filter`.
pub fn parse_blkid(raw: &str, filter: &Regex) -> Result<DeviceSnapshot> {
    let pair = Regex::new(BLKID_PAIR).map_err(|err| CsError::Enumeration {
        details: format!("blkid pattern: {err}"),
    })?;
    let mut devices = BTreeMap::new();
    for line in raw.lines() {
        let Some((device, rest)) = line.split_once(": ") else {
            if !line.trim().is_empty() {
                log::debug!("skipping malformed blkid line: {line}");
            }
            continue;
        };
        let device = device.trim();
        if !filter.is_match(device) {
            continue;
        }
        let mut attrs = DeviceAttrs::default();
        for caps in pair.captures_iter(rest) {
            let value = caps[2].replace("\\\"", "\"").replace("\\\\", "\\");
            match &caps[1] {
                "UUID" => attrs.uuid = Some(value),
                "LABEL" => attrs.label = Some(value),
                "TYPE" => attrs.fs_type = Some(value),
                _ => {}
            }
        }
        devices.insert(device.to_string(), attrs);
    }
    Ok(DeviceSnapshot::new(devices))
}

/// Parse a `/proc/self/mounts` table into device -> mount point for devices
/// matching `filter`. The first mount of a device wins.
#[must_use]
pub fn parse_proc_mounts(raw: &str, filter: &Regex) -> BTreeMap<String, PathBuf> {
    let mut mounts = BTreeMap::new();
    for line in raw.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            log::warn!("skipping malformed mount table line: {line}");
            continue;
        }
        let device = unescape_mount_field(fields[0]);
        if !filter.is_match(&device) {
            continue;
        }
        mounts
            .entry(device)
            .or_insert_with(|| PathBuf::from(unescape_mount_field(fields[1])));
    }
    mounts
}

/// Decode the kernel's octal escapes (`\040` for space and so on).
fn unescape_mount_field(raw: &str) -> String {
    let raw_bytes = raw.as_bytes();
    let mut bytes = Vec::with_capacity(raw_bytes.len());
    let mut i = 0;
    while i < raw_bytes.len() {
        if raw_bytes[i] == b'\\' && i + 3 < raw_bytes.len() {
            let digits = &raw_bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = (digits[0] - b'0') * 64 + (digits[1] - b'0') * 8 + (digits[2] - b'0');
                bytes.push(value);
                i += 4;
                continue;
            }
        }
        bytes.push(raw_bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

// ──────────────────── linux ────────────────────

/// [`MediaEnumerator`] backed by util-linux tools.
#[derive(Debug, Clone)]
pub struct LinuxMedia {
    filter: Regex,
    use_sudo: bool,
    mount_table: PathBuf,
}

impl LinuxMedia {
    pub fn from_config(usb: &UsbConfig) -> Result<Self> {
        let filter = Regex::new(&usb.device_filter).map_err(|err| CsError::InvalidConfig {
            details: format!("usb.device_filter is not a valid regex: {err}"),
        })?;
        Ok(Self {
            filter,
            use_sudo: usb.use_sudo,
            mount_table: PathBuf::from("/proc/self/mounts"),
        })
    }

    /// Read the mount table from another file.
    #[must_use]
    pub fn with_mount_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.mount_table = path.into();
        self
    }

    fn command(&self, program: &str) -> Command {
        if self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg("-n").arg(program);
            cmd
        } else {
            Command::new(program)
        }
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.command(program)
            .args(args)
            .output()
            .map_err(|err| CsError::Enumeration {
                details: format!("failed to run {program}: {err}"),
            })
    }
}

fn is_permission_failure(output: &Output) -> bool {
    let stderr = String::from_utf8_lossy(&output.stderr).to_ascii_lowercase();
    stderr.contains("permission denied")
        || stderr.contains("only root")
        || stderr.contains("must be superuser")
        || stderr.contains("a password is required")
}

impl MediaEnumerator for LinuxMedia {
    fn scan(&self) -> Result<DeviceSnapshot> {
        let output = self.run("blkid", &[])?;
        // blkid exits with 2 when it finds nothing.
        if !output.status.success() && output.status.code() != Some(2) {
            return Err(CsError::Enumeration {
                details: format!(
                    "blkid exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        let snapshot = parse_blkid(&String::from_utf8_lossy(&output.stdout), &self.filter)?;
        log::debug!("device scan found {} removable device(s)", snapshot.len());
        Ok(snapshot)
    }

    fn mount(&self, device: &str, target: &Path, options: &str) -> Result<bool> {
        let target_str = target.to_string_lossy();
        let mkdir = self.run("mkdir", &["-p", &target_str])?;
        if !mkdir.status.success() && is_permission_failure(&mkdir) {
            return Err(CsError::MountPermissionDenied {
                device: device.to_string(),
            });
        }

        let mut args = vec![device, &*target_str];
        if !options.is_empty() {
            args.extend(["-o", options]);
        }
        let output = self.run("mount", &args)?;
        if output.status.success() {
            log::info!("mounted {device} at {}", target.display());
            return Ok(true);
        }
        if is_permission_failure(&output) {
            return Err(CsError::MountPermissionDenied {
                device: device.to_string(),
            });
        }
        log::warn!(
            "mount {device} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(false)
    }

    fn unmount(&self, device: &str) -> Result<bool> {
        let output = self.run("umount", &[device])?;
        if output.status.success() {
            log::info!("unmounted {device}");
        } else {
            log::warn!(
                "umount {device} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.status.success())
    }

    fn mount_points(&self) -> Result<BTreeMap<String, PathBuf>> {
        let raw = fs::read_to_string(&self.mount_table)
            .map_err(|source| CsError::io(&self.mount_table, source))?;
        Ok(parse_proc_mounts(&raw, &self.filter))
    }
}
