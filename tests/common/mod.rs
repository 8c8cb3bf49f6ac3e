#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use coldsign::core::config::{Config, ConfigStore, SharedSettings};
use coldsign::core::errors::{CsError, Result};
use coldsign::logger::journal::ActivityJournal;
use coldsign::platform::media::{DeviceAttrs, DeviceSnapshot, MediaEnumerator};
use coldsign::platform::signer::{TransactionSigner, TxOutput, write_new_file};
use coldsign::timing::estimator::TimingEstimator;
use coldsign::worker::executor::BackgroundExecutor;
use coldsign::workflow::Services;
use parking_lot::Mutex;

// ──────────────────── CLI runner ────────────────────

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_coldsign") {
        return PathBuf::from(path);
    }

    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join("coldsign"));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve coldsign binary path for integration test"),
    }
}

/// Run the binary with `args`, keeping a log of the exchange for debugging.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("coldsign-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let output = Command::new(&bin_path)
        .args(args)
        .env_remove("CS_OUTPUT_FORMAT")
        .env("RUST_BACKTRACE", "1")
        .output()
        .expect("execute coldsign command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_content = format!(
        "case={case_name}\nbin={}\nargs={args:?}\nstatus={}\n----- stdout -----\n{stdout}\n----- stderr -----\n{stderr}\n",
        bin_path.display(),
        output.status,
    );
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

// ──────────────────── fakes ────────────────────

#[derive(Debug, Default)]
pub struct StickBay {
    devices: Mutex<BTreeMap<String, DeviceAttrs>>,
    mounts: Mutex<BTreeMap<String, PathBuf>>,
    unmounts: Mutex<Vec<String>>,
}

impl StickBay {
    pub fn plug(self, device: &str, uuid: &str, label: Option<&str>) -> Self {
        self.devices.lock().insert(
            device.to_string(),
            DeviceAttrs {
                uuid: Some(uuid.to_string()),
                label: label.map(str::to_string),
                fs_type: Some("vfat".to_string()),
            },
        );
        self
    }

    pub fn unmounts(&self) -> Vec<String> {
        self.unmounts.lock().clone()
    }

    pub fn mounted(&self) -> BTreeMap<String, PathBuf> {
        self.mounts.lock().clone()
    }
}

impl MediaEnumerator for StickBay {
    fn scan(&self) -> Result<DeviceSnapshot> {
        Ok(DeviceSnapshot::new(self.devices.lock().clone()))
    }

    fn mount(&self, device: &str, target: &Path, _options: &str) -> Result<bool> {
        fs::create_dir_all(target).map_err(|source| CsError::io(target, source))?;
        self.mounts
            .lock()
            .insert(device.to_string(), target.to_path_buf());
        Ok(true)
    }

    fn unmount(&self, device: &str) -> Result<bool> {
        self.unmounts.lock().push(device.to_string());
        Ok(self.mounts.lock().remove(device).is_some())
    }

    fn mount_points(&self) -> Result<BTreeMap<String, PathBuf>> {
        Ok(self.mounted())
    }
}

#[derive(Debug, Default)]
pub struct ScriptedSigner {
    outputs: Vec<TxOutput>,
    signed: Mutex<Vec<PathBuf>>,
}

impl ScriptedSigner {
    pub fn paying(outputs: &[(&str, u64)]) -> Self {
        Self {
            outputs: outputs
                .iter()
                .map(|(address, value_sat)| TxOutput {
                    address: (*address).to_string(),
                    value_sat: *value_sat,
                })
                .collect(),
            signed: Mutex::new(Vec::new()),
        }
    }

    pub fn signed(&self) -> Vec<PathBuf> {
        self.signed.lock().clone()
    }
}

impl TransactionSigner for ScriptedSigner {
    fn deserialize(&self, _tx_path: &Path) -> Result<Vec<TxOutput>> {
        Ok(self.outputs.clone())
    }

    fn sign(&self, tx_path: &Path, out_path: &Path, _password: &str) -> Result<()> {
        let raw = fs::read(tx_path).map_err(|source| CsError::io(tx_path, source))?;
        write_new_file(out_path, &raw)?;
        self.signed.lock().push(out_path.to_path_buf());
        Ok(())
    }

    fn version(&self) -> Result<String> {
        Ok("4.5.5".to_string())
    }
}

/// Services over the fakes with settings persisted to `config_path`.
pub fn services_at(
    config_path: &Path,
    mount_root: &Path,
    bay: Arc<StickBay>,
    signer: Arc<ScriptedSigner>,
) -> Services {
    let mut config = Config::default();
    config.usb.mount_root = mount_root.to_path_buf();
    config.ui.progress_tick_ms = 5;
    config.paths.config_file = config_path.to_path_buf();
    config.save(config_path).expect("write test config");

    let store = ConfigStore::open(Some(config_path)).expect("open test config");
    let config = store.config().clone();
    let settings: SharedSettings = store.into_shared();
    let estimator = TimingEstimator::new(Arc::clone(&settings));
    let executor = BackgroundExecutor::start(estimator).expect("start executor");
    Services {
        config: Arc::new(config),
        settings,
        media: bay,
        signer,
        executor: Arc::new(executor),
        journal: ActivityJournal::disabled(),
    }
}

/// Write a config file at `path` whose data paths stay inside `dir`.
pub fn write_config(dir: &Path, trusted: &[&str]) -> PathBuf {
    let path = dir.join("config.toml");
    let mut config = Config::default();
    config.paths.config_file = path.clone();
    config.paths.journal = dir.join("activity.jsonl");
    config.usb.mount_root = dir.join("media");
    config.usb.trusted_uuids = trusted.iter().map(|u| (*u).to_string()).collect();
    config.stats.sign = vec![0.5, 0.25];
    config.save(&path).expect("write config");
    path
}
