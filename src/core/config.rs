//! Configuration system: TOML file + env var overrides + smart defaults, and the
//! persisted settings store (timing windows, trusted devices) with save-on-exit.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{CsError, Result};
use crate::display::Rgb;
use crate::timing::estimator::TimingKind;
use crate::workflow::signing::DeclinePolicy;

/// Full coldsign configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub transaction: TransactionConfig,
    pub signer: SignerConfig,
    pub usb: UsbConfig,
    pub stats: StatsConfig,
    pub ui: UiConfig,
    pub paths: PathsConfig,
}

/// Display appearance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Backlight colour restored whenever a coloured status message goes away.
    pub backlight: Rgb,
}

/// Where unsigned transactions live on the stick and how signed ones are named.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransactionConfig {
    /// Directory relative to the stick's mount point.
    pub directory: PathBuf,
    /// Regex matched against file names.
    pub unsigned_pattern: String,
    /// Appended to the file stem; `{time}` expands to the local signing time.
    pub signed_suffix: String,
}

/// External signer invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SignerConfig {
    pub electrum_path: PathBuf,
    pub wallet_password: String,
}

/// Removable-media handling and the trusted-device set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UsbConfig {
    pub trusted_uuids: BTreeSet<String>,
    /// Regex a block device path must match to count as removable media.
    pub device_filter: String,
    /// Trusted sticks are mounted at `<mount_root>/<uuid>`.
    pub mount_root: PathBuf,
    pub mount_options: String,
    /// Prefix blkid/mount/umount with `sudo`.
    pub use_sudo: bool,
}

/// Persisted timing windows (seconds per kilobyte, newest first).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StatsConfig {
    pub sign: Vec<f64>,
    pub deserialize: Vec<f64>,
}

/// Console pacing and workflow policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    pub redraw_tick_ms: u64,
    pub progress_tick_ms: u64,
    pub decline_policy: DeclinePolicy,
}

/// Filesystem paths used by coldsign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub journal: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            backlight: Rgb::WHITE,
        }
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("transactions"),
            unsigned_pattern: r"\.txn$".to_string(),
            signed_suffix: "_signed_{time}".to_string(),
        }
    }
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            electrum_path: PathBuf::from("electrum"),
            wallet_password: String::new(),
        }
    }
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            trusted_uuids: BTreeSet::new(),
            device_filter: "^/dev/sd.+".to_string(),
            mount_root: PathBuf::from("/media"),
            mount_options: "umask=000".to_string(),
            use_sudo: true,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            redraw_tick_ms: 25,
            progress_tick_ms: 250,
            decline_policy: DeclinePolicy::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                log::warn!("HOME not set, falling back to /tmp for coldsign paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("coldsign").join("config.toml"),
            journal: home_dir
                .join(".local")
                .join("share")
                .join("coldsign")
                .join("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| CsError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(CsError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write the config as TOML, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| CsError::io(parent, source))?;
        }
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, raw).map_err(|source| CsError::io(&tmp, source))?;
        fs::rename(&tmp, path).map_err(|source| CsError::io(path, source))?;
        Ok(())
    }

    /// Deterministic hash of the effective config for the activity journal.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CS_SIGNER_ELECTRUM_PATH") {
            self.signer.electrum_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CS_SIGNER_WALLET_PASSWORD") {
            self.signer.wallet_password = raw;
        }
        if let Some(raw) = lookup("CS_TRANSACTION_DIRECTORY") {
            self.transaction.directory = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CS_TRANSACTION_UNSIGNED_PATTERN") {
            self.transaction.unsigned_pattern = raw;
        }
        if let Some(raw) = lookup("CS_USB_USE_SUDO") {
            self.usb.use_sudo = parse_env_bool("CS_USB_USE_SUDO", &raw)?;
        }
        if let Some(raw) = lookup("CS_USB_MOUNT_ROOT") {
            self.usb.mount_root = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CS_UI_REDRAW_TICK_MS") {
            self.ui.redraw_tick_ms = parse_env_u64("CS_UI_REDRAW_TICK_MS", &raw)?;
        }
        if let Some(raw) = lookup("CS_UI_PROGRESS_TICK_MS") {
            self.ui.progress_tick_ms = parse_env_u64("CS_UI_PROGRESS_TICK_MS", &raw)?;
        }
        if let Some(raw) = lookup("CS_PATHS_JOURNAL") {
            self.paths.journal = PathBuf::from(raw);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (name, pattern) in [
            (
                "transaction.unsigned_pattern",
                &self.transaction.unsigned_pattern,
            ),
            ("usb.device_filter", &self.usb.device_filter),
        ] {
            Regex::new(pattern).map_err(|error| CsError::InvalidConfig {
                details: format!("{name} is not a valid regex: {error}"),
            })?;
        }

        if self.ui.redraw_tick_ms == 0 || self.ui.progress_tick_ms == 0 {
            return Err(CsError::InvalidConfig {
                details: "ui.redraw_tick_ms and ui.progress_tick_ms must be > 0".to_string(),
            });
        }

        if self.signer.electrum_path.as_os_str().is_empty() {
            return Err(CsError::InvalidConfig {
                details: "signer.electrum_path must not be empty".to_string(),
            });
        }

        for (name, samples) in [
            ("stats.sign", &self.stats.sign),
            ("stats.deserialize", &self.stats.deserialize),
        ] {
            if let Some(bad) = samples.iter().find(|s| !s.is_finite() || **s < 0.0) {
                return Err(CsError::InvalidConfig {
                    details: format!("{name} contains an invalid sample: {bad}"),
                });
            }
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| CsError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CsError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: expected a boolean"),
        }),
    }
}

// ──────────────────── settings store ────────────────────

/// Persisted key-value state consumed by the workflow and the timing estimator.
pub trait SettingsStore: Send {
    /// Samples for `kind`, newest first.
    fn timing_window(&self, kind: TimingKind) -> Vec<f64>;
    fn set_timing_window(&mut self, kind: TimingKind, samples: Vec<f64>);
    fn is_trusted(&self, id: &str) -> bool;
    fn add_trusted(&mut self, id: &str);
    /// Write pending changes to durable storage.
    fn persist(&mut self) -> Result<()>;
}

/// Settings store shared between the workflow, the estimator and the CLI.
pub type SharedSettings = Arc<Mutex<dyn SettingsStore>>;

/// [`SettingsStore`] backed by the TOML config file.
///
/// Mutations only mark the store dirty; the file is rewritten on [`persist`]
/// or, when `save_on_exit` is set, when the store is dropped.
///
/// [`persist`]: SettingsStore::persist
#[derive(Debug)]
pub struct ConfigStore {
    config: Config,
    path: Option<PathBuf>,
    dirty: bool,
    save_on_exit: bool,
}

impl ConfigStore {
    /// Load from disk; the loaded file is also where changes are saved.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let config = Config::load(path)?;
        let path = config.paths.config_file.clone();
        Ok(Self {
            config,
            path: Some(path),
            dirty: false,
            save_on_exit: true,
        })
    }

    /// Store without a backing file; `persist` is a no-op.
    #[must_use]
    pub fn in_memory(config: Config) -> Self {
        Self {
            config,
            path: None,
            dirty: false,
            save_on_exit: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_save_on_exit(&mut self, enabled: bool) {
        self.save_on_exit = enabled;
    }

    /// Wrap into the shared handle used across the crate.
    #[must_use]
    pub fn into_shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }
}

impl SettingsStore for ConfigStore {
    fn timing_window(&self, kind: TimingKind) -> Vec<f64> {
        match kind {
            TimingKind::Sign => self.config.stats.sign.clone(),
            TimingKind::Deserialize => self.config.stats.deserialize.clone(),
        }
    }

    fn set_timing_window(&mut self, kind: TimingKind, samples: Vec<f64>) {
        let slot = match kind {
            TimingKind::Sign => &mut self.config.stats.sign,
            TimingKind::Deserialize => &mut self.config.stats.deserialize,
        };
        *slot = samples;
        self.dirty = true;
    }

    fn is_trusted(&self, id: &str) -> bool {
        self.config.usb.trusted_uuids.contains(id)
    }

    fn add_trusted(&mut self, id: &str) {
        if self.config.usb.trusted_uuids.insert(id.to_string()) {
            self.dirty = true;
        }
    }

    fn persist(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            self.config.save(path)?;
            log::info!("configuration saved to {}", path.display());
        }
        self.dirty = false;
        Ok(())
    }
}

impl Drop for ConfigStore {
    fn drop(&mut self) {
        if self.save_on_exit
            && self.dirty
            && let Err(err) = self.persist()
        {
            log::warn!("failed to save configuration on exit: {err}");
        }
    }
}
