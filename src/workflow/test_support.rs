//! In-memory collaborators for flow unit tests.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::config::{Config, ConfigStore, SharedSettings};
use crate::core::errors::{CsError, Result};
use crate::logger::journal::ActivityJournal;
use crate::platform::media::{DeviceAttrs, DeviceSnapshot, MediaEnumerator};
use crate::platform::signer::{TransactionSigner, TxOutput, write_new_file};
use crate::timing::estimator::TimingEstimator;
use crate::worker::executor::BackgroundExecutor;
use crate::workflow::Services;

#[derive(Debug, Default)]
pub struct FakeMedia {
    devices: Mutex<BTreeMap<String, DeviceAttrs>>,
    mounts: Mutex<BTreeMap<String, PathBuf>>,
    unmounts: Mutex<Vec<String>>,
    deny_mount: bool,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, device: &str, uuid: &str, label: Option<&str>) -> Self {
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

    pub fn with_mount(self, device: &str, path: &Path) -> Self {
        self.mounts
            .lock()
            .insert(device.to_string(), path.to_path_buf());
        self
    }

    pub fn denying_mounts(mut self) -> Self {
        self.deny_mount = true;
        self
    }

    pub fn unmount_calls(&self) -> Vec<String> {
        self.unmounts.lock().clone()
    }

    pub fn mounted(&self) -> BTreeMap<String, PathBuf> {
        self.mounts.lock().clone()
    }
}

impl MediaEnumerator for FakeMedia {
    fn scan(&self) -> Result<DeviceSnapshot> {
        Ok(DeviceSnapshot::new(self.devices.lock().clone()))
    }

    fn mount(&self, device: &str, target: &Path, _options: &str) -> Result<bool> {
        if self.deny_mount {
            return Err(CsError::MountPermissionDenied {
                device: device.to_string(),
            });
        }
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
pub struct FakeSigner {
    outputs: Vec<TxOutput>,
    sign_error: Option<String>,
    signed: Mutex<Vec<PathBuf>>,
}

impl FakeSigner {
    pub fn with_outputs(outputs: &[(&str, u64)]) -> Self {
        Self {
            outputs: outputs
                .iter()
                .map(|(address, value_sat)| TxOutput {
                    address: (*address).to_string(),
                    value_sat: *value_sat,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing_sign(mut self, details: &str) -> Self {
        self.sign_error = Some(details.to_string());
        self
    }

    pub fn signed(&self) -> Vec<PathBuf> {
        self.signed.lock().clone()
    }
}

impl TransactionSigner for FakeSigner {
    fn deserialize(&self, _tx_path: &Path) -> Result<Vec<TxOutput>> {
        Ok(self.outputs.clone())
    }

    fn sign(&self, _tx_path: &Path, out_path: &Path, _password: &str) -> Result<()> {
        if let Some(details) = &self.sign_error {
            return Err(CsError::ToolUnavailable {
                tool: PathBuf::from("electrum"),
                details: details.clone(),
            });
        }
        write_new_file(out_path, b"signed")?;
        self.signed.lock().push(out_path.to_path_buf());
        Ok(())
    }

    fn version(&self) -> Result<String> {
        Ok("4.5.5".to_string())
    }
}

/// Config that mounts sticks below `mount_root` and trusts `trusted`.
pub fn test_config(mount_root: &Path, trusted: &[&str]) -> Config {
    let mut config = Config::default();
    config.usb.mount_root = mount_root.to_path_buf();
    config.usb.trusted_uuids = trusted.iter().map(|u| (*u).to_string()).collect();
    config.ui.progress_tick_ms = 5;
    config
}

pub fn services(config: Config, media: Arc<FakeMedia>, signer: Arc<FakeSigner>) -> Services {
    let settings: SharedSettings = ConfigStore::in_memory(config.clone()).into_shared();
    let estimator = TimingEstimator::new(Arc::clone(&settings));
    let executor = BackgroundExecutor::start(estimator).unwrap();
    Services {
        config: Arc::new(config),
        settings,
        media,
        signer,
        executor: Arc::new(executor),
        journal: ActivityJournal::disabled(),
    }
}
