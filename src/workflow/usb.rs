//! Trusted-stick discovery and the Trust USB / Eject USB flows.

#![allow(missing_docs)]

use std::path::PathBuf;

use crate::core::config::{SharedSettings, UsbConfig};
use crate::core::errors::{CsError, Result};
use crate::display::{Display, Renderer, center};
use crate::input::InputEvent;
use crate::logger::journal::{EventType, JournalEntry};
use crate::platform::media::{DeviceSnapshot, MediaEnumerator};
use crate::views::{DialogView, MessageView, OptionSwitcher, RadioListView, View, ViewEvent};
use crate::workflow::{Flow, Services};

/// A trusted stick mounted for this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedDevice {
    pub device: String,
    pub uuid: String,
    pub mount_path: PathBuf,
    /// It was mounted before the workflow looked at it.
    pub already_mounted: bool,
}

/// Mount the first trusted device of `snapshot` at `<mount_root>/<uuid>`, or
/// reuse its existing mount point.
pub fn find_trusted(
    media: &dyn MediaEnumerator,
    snapshot: &DeviceSnapshot,
    settings: &SharedSettings,
    usb: &UsbConfig,
) -> Result<MountedDevice> {
    if !snapshot.is_present() {
        return Err(CsError::NoRemovableMedia);
    }
    let mut mount_points = None;
    for (device, attrs) in snapshot.iter() {
        let Some(uuid) = attrs.uuid.as_deref() else {
            continue;
        };
        if !settings.lock().is_trusted(uuid) {
            log::debug!("{device} ({uuid}) is not trusted");
            continue;
        }
        if mount_points.is_none() {
            mount_points = Some(media.mount_points()?);
        }
        if let Some(path) = mount_points.as_ref().and_then(|mounts| mounts.get(device)) {
            log::info!("trusted {device} already mounted at {}", path.display());
            return Ok(MountedDevice {
                device: device.to_string(),
                uuid: uuid.to_string(),
                mount_path: path.clone(),
                already_mounted: true,
            });
        }
        let target = usb.mount_root.join(uuid);
        if media.mount(device, &target, &usb.mount_options)? {
            return Ok(MountedDevice {
                device: device.to_string(),
                uuid: uuid.to_string(),
                mount_path: target,
                already_mounted: false,
            });
        }
    }
    Err(CsError::NoTrustedDevice)
}

// ──────────────────── trust ────────────────────

#[derive(Debug, Clone)]
struct Candidate {
    device: String,
    uuid: String,
    label: Option<String>,
}

impl Candidate {
    fn entry_text(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.uuid.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrustStage {
    Idle,
    Choosing,
    Confirming(usize),
    Reporting,
    Done,
}

/// Add a plugged-in stick to the trusted set.
pub struct TrustFlow {
    services: Services,
    switcher: OptionSwitcher<View>,
    candidates: Vec<Candidate>,
    stage: TrustStage,
}

impl TrustFlow {
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self {
            services,
            switcher: OptionSwitcher::new(),
            candidates: Vec::new(),
            stage: TrustStage::Idle,
        }
    }

    #[must_use]
    pub fn view(&self) -> Option<&View> {
        self.switcher.current()
    }

    fn report(&mut self, headline: &str, message: impl Into<String>, display: &mut dyn Display) {
        let view = MessageView::new(
            headline,
            message,
            self.services.config.display.backlight,
        );
        self.switcher.switch(View::Message(view), display.backlight());
        self.stage = TrustStage::Reporting;
    }

    fn scan_untrusted(&self) -> Result<Option<Vec<Candidate>>> {
        let snapshot = self.services.media.scan()?;
        if !snapshot.is_present() {
            return Ok(None);
        }
        let settings = self.services.settings.lock();
        Ok(Some(
            snapshot
                .iter()
                .filter_map(|(device, attrs)| {
                    let uuid = attrs.uuid.clone()?;
                    (!settings.is_trusted(&uuid)).then(|| Candidate {
                        device: device.to_string(),
                        uuid,
                        label: attrs.label.clone(),
                    })
                })
                .collect(),
        ))
    }

    fn confirm(&mut self, index: usize, display: &mut dyn Display) {
        let Some(candidate) = self.candidates.get(index) else {
            return;
        };
        let label = candidate.label.as_deref().unwrap_or("-");
        let dialog = DialogView::new(
            "Trust stick?",
            format!("Trust {} labeled with \"{label}\"?", candidate.device),
        );
        self.switcher.switch(View::Dialog(dialog), display.backlight());
        self.stage = TrustStage::Confirming(index);
    }

    fn trust(&mut self, index: usize, display: &mut dyn Display) {
        let Some(candidate) = self.candidates.get(index).cloned() else {
            return;
        };
        let persisted = {
            let mut settings = self.services.settings.lock();
            settings.add_trusted(&candidate.uuid);
            settings.persist()
        };
        self.services.journal.record(
            &JournalEntry::new(EventType::DeviceTrusted)
                .device(&candidate.device)
                .details(candidate.uuid.clone()),
        );
        log::info!("trusted {} ({})", candidate.device, candidate.uuid);

        let name = candidate.label.as_ref().map_or_else(
            || format!("UUID: {}", candidate.uuid),
            |label| format!("LABEL: {label}"),
        );
        match persisted {
            Ok(()) => self.report(
                "Success",
                format!(
                    "Added device ({name}) to the list of trusted devices. \
                     It will be mounted automatically."
                ),
                display,
            ),
            Err(err) => {
                log::warn!("trusted set not saved yet: {err}");
                self.report(
                    "Warning",
                    format!("Added device ({name}), but the configuration could not be saved yet."),
                    display,
                );
            }
        }
    }
}

impl Flow for TrustFlow {
    fn begin(&mut self, display: &mut dyn Display) {
        match self.scan_untrusted() {
            Err(err) => self.report(err.headline(), err.user_message(), display),
            Ok(None) => self.report("Information", "No USB stick has been found.", display),
            Ok(Some(candidates)) if candidates.is_empty() => self.report(
                "Please note",
                "Stick(s) are already on the list of trusted devices.",
                display,
            ),
            Ok(Some(candidates)) if candidates.len() == 1 => {
                self.candidates = candidates;
                self.confirm(0, display);
            }
            Ok(Some(candidates)) => {
                let entries = candidates.iter().map(Candidate::entry_text).collect();
                self.candidates = candidates;
                let radio = RadioListView::new(entries, Some("Select stick".to_string()));
                self.switcher.switch(View::Radio(radio), display.backlight());
                self.stage = TrustStage::Choosing;
            }
        }
    }

    fn handle(&mut self, input: InputEvent, display: &mut dyn Display) -> bool {
        match (self.stage, input) {
            // Right moves on once a stick is marked.
            (TrustStage::Choosing, InputEvent::Right) => {
                let marked = match self.switcher.current() {
                    Some(View::Radio(radio)) => radio.marked(),
                    _ => None,
                };
                marked.is_some_and(|index| {
                    self.confirm(index, display);
                    true
                })
            }
            (_, InputEvent::Up) => self.switcher.up(),
            (_, InputEvent::Down) => self.switcher.down(),
            (_, InputEvent::Left) => self.switcher.left(),
            (_, InputEvent::Right) => self.switcher.right(),
            (_, InputEvent::Cancel) => false,
            (stage, InputEvent::Select) => {
                let event = self.switcher.select();
                match (stage, event) {
                    (TrustStage::Choosing, None) => true,
                    (TrustStage::Confirming(index), Some(ViewEvent::Answered(true))) => {
                        self.trust(index, display);
                        true
                    }
                    (TrustStage::Confirming(_), Some(ViewEvent::Answered(false)))
                    | (TrustStage::Reporting, Some(ViewEvent::Dismissed)) => {
                        self.close(display);
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        self.switcher.redraw(renderer);
    }

    fn close(&mut self, display: &mut dyn Display) -> bool {
        self.switcher.close(display.backlight());
        self.stage = TrustStage::Done;
        true
    }

    fn is_done(&self) -> bool {
        self.stage == TrustStage::Done
    }
}

// ──────────────────── eject ────────────────────

/// Unmount every mounted stick after a yes/no confirmation.
pub struct EjectFlow {
    services: Services,
    switcher: OptionSwitcher<View>,
    done: bool,
}

impl EjectFlow {
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self {
            services,
            switcher: OptionSwitcher::new(),
            done: false,
        }
    }

    /// Unmount all mounted devices matching the device filter. Returns how
    /// many were unmounted.
    pub fn eject_all(&self) -> Result<usize> {
        let mounts = self.services.media.mount_points()?;
        let mut ejected = Vec::new();
        for device in mounts.keys() {
            if self.services.media.unmount(device)? {
                ejected.push(device.clone());
            }
        }
        if !ejected.is_empty() {
            self.services.journal.record(
                &JournalEntry::new(EventType::DevicesEjected).details(ejected.join(",")),
            );
        }
        Ok(ejected.len())
    }
}

impl Flow for EjectFlow {
    fn begin(&mut self, display: &mut dyn Display) {
        let dialog = DialogView::new(center("Eject?"), "Mounted USB stick(s) will be unmounted.");
        self.switcher.switch(View::Dialog(dialog), display.backlight());
    }

    fn handle(&mut self, input: InputEvent, display: &mut dyn Display) -> bool {
        match input {
            InputEvent::Up => self.switcher.up(),
            InputEvent::Down => self.switcher.down(),
            InputEvent::Left => self.switcher.left(),
            InputEvent::Right => self.switcher.right(),
            InputEvent::Cancel => false,
            InputEvent::Select => match self.switcher.select() {
                Some(ViewEvent::Answered(true)) => {
                    match self.eject_all() {
                        Ok(count) => {
                            log::info!("ejected {count} device(s)");
                            self.close(display);
                        }
                        Err(err) => {
                            let view = MessageView::new(
                                err.headline(),
                                err.user_message(),
                                self.services.config.display.backlight,
                            );
                            self.switcher.switch(View::Message(view), display.backlight());
                        }
                    }
                    true
                }
                Some(ViewEvent::Answered(false) | ViewEvent::Dismissed) => {
                    self.close(display);
                    true
                }
                _ => false,
            },
        }
    }

    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        self.switcher.redraw(renderer);
    }

    fn close(&mut self, display: &mut dyn Display) -> bool {
        self.switcher.close(display.backlight());
        self.done = true;
        true
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
