//! The Sign TX flow: mount a trusted stick, pick a transaction, review its
//! outputs, confirm, sign, and unmount.
//!
//! Both slow steps run on the background executor while the foreground
//! blocks in the progress poller, redrawing the progress view each tick.

#![allow(missing_docs)]

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{CsError, Result};
use crate::core::paths::{signed_name_pattern, signed_output_path, transaction_root};
use crate::display::{Display, Glyph, GlyphSet, Renderer};
use crate::input::InputEvent;
use crate::logger::journal::{EventType, JournalEntry};
use crate::platform::signer::TxOutput;
use crate::timing::estimator::TimingKind;
use crate::views::{
    DialogView, FileEntry, FileSelectView, MessageView, OptionSwitcher, Page, PageRow, PageView,
    ProgressView, View, ViewEvent,
};
use crate::worker::executor::Tracking;
use crate::worker::poller::ProgressPoller;
use crate::workflow::usb::{MountedDevice, find_trusted};
use crate::workflow::{Flow, Services};

const SIGN_ERROR_PREFIX: &str = "There was an error while signing the transaction: ";

/// What a "no" in the sign dialog leads to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclinePolicy {
    /// Back to the file list on the still-mounted stick.
    #[default]
    ReturnToFileSelect,
    /// End the flow; the stick stays mounted.
    Terminate,
}

/// What the status screen shows for a failed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: &'static str,
    pub title: String,
    pub message: String,
}

impl Failure {
    fn signing(err: &CsError) -> Self {
        Self {
            code: err.code(),
            title: "Error".to_string(),
            message: format!("{SIGN_ERROR_PREFIX}{}", err.user_message()),
        }
    }
}

impl From<&CsError> for Failure {
    fn from(err: &CsError) -> Self {
        Self {
            code: err.code(),
            title: err.headline().to_string(),
            message: err.user_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    CheckingUsb,
    SelectingFile,
    Deserializing,
    ReviewingPages,
    ConfirmingSign,
    Signing,
    Finished,
    Failed(Failure),
}

impl WorkflowState {
    /// A background task is running and the progress view is up.
    #[must_use]
    pub const fn is_progressing(&self) -> bool {
        matches!(self, Self::Deserializing | Self::Signing)
    }
}

#[derive(Debug, Clone)]
struct Transaction {
    entry: FileEntry,
    size: u64,
    outputs: Vec<TxOutput>,
}

pub struct SigningWorkflow {
    services: Services,
    poller: ProgressPoller,
    state: WorkflowState,
    switcher: OptionSwitcher<View>,
    mounted: Option<MountedDevice>,
    transaction: Option<Transaction>,
    done: bool,
}

impl std::fmt::Debug for SigningWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningWorkflow")
            .field("state", &self.state)
            .field("mounted", &self.mounted)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl SigningWorkflow {
    #[must_use]
    pub fn new(services: Services) -> Self {
        let tick = Duration::from_millis(services.config.ui.progress_tick_ms);
        Self {
            services,
            poller: ProgressPoller::new(tick),
            state: WorkflowState::Idle,
            switcher: OptionSwitcher::new(),
            mounted: None,
            transaction: None,
            done: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &WorkflowState {
        &self.state
    }

    #[must_use]
    pub fn view(&self) -> Option<&View> {
        self.switcher.current()
    }

    /// Device mounted for the current cycle, until it is unmounted.
    #[must_use]
    pub const fn mounted(&self) -> Option<&MountedDevice> {
        self.mounted.as_ref()
    }

    /// Forget the previous cycle and go back to `Idle`.
    pub fn restart(&mut self) {
        self.state = WorkflowState::Idle;
        self.mounted = None;
        self.transaction = None;
        self.done = false;
    }

    fn on_event(&mut self, event: ViewEvent, display: &mut dyn Display) {
        match (&self.state, event) {
            (WorkflowState::SelectingFile, ViewEvent::FileChosen(entry)) => {
                self.read_transaction(entry, display);
            }
            (WorkflowState::ReviewingPages, ViewEvent::Confirmed) => self.confirm(display),
            (WorkflowState::ConfirmingSign, ViewEvent::Answered(true)) => self.sign(display),
            (WorkflowState::ConfirmingSign, ViewEvent::Answered(false)) => self.decline(display),
            (WorkflowState::Finished | WorkflowState::Failed(_), ViewEvent::Dismissed) => {
                self.close(display);
            }
            (state, event) => log::debug!("ignoring {event:?} in {state:?}"),
        }
    }

    fn check_usb(&self) -> Result<MountedDevice> {
        let media = self.services.media.as_ref();
        let snapshot = media.scan()?;
        find_trusted(
            media,
            &snapshot,
            &self.services.settings,
            &self.services.config.usb,
        )
    }

    fn enter_file_select(&mut self, display: &mut dyn Display) {
        let Some(mounted) = &self.mounted else {
            self.fail(&CsError::NoTrustedDevice, None, display);
            return;
        };
        let tx_config = &self.services.config.transaction;
        let root = transaction_root(&mounted.mount_path, &tx_config.directory);
        let signed = signed_name_pattern(&tx_config.signed_suffix).map_err(|err| {
            CsError::InvalidConfig {
                details: format!("transaction.signed_suffix: {err}"),
            }
        });
        let view = Regex::new(&tx_config.unsigned_pattern)
            .map_err(|err| CsError::InvalidConfig {
                details: format!("transaction.unsigned_pattern: {err}"),
            })
            .and_then(|pattern| Ok((pattern, signed?)))
            .and_then(|(pattern, signed)| {
                FileSelectView::scan(&root, &pattern, signed.as_ref(), "Select TX on USB")
            });
        match view {
            Ok(view) => {
                self.switcher.switch(View::Files(view), display.backlight());
                self.state = WorkflowState::SelectingFile;
            }
            Err(err) => self.fail(&err, None, display),
        }
    }

    fn read_transaction(&mut self, entry: FileEntry, display: &mut dyn Display) {
        let size = match fs::metadata(&entry.path) {
            Ok(meta) => meta.len(),
            Err(err) => {
                let err = CsError::FileRead {
                    path: entry.path.clone(),
                    details: err.to_string(),
                };
                self.fail(&err, None, display);
                return;
            }
        };

        self.state = WorkflowState::Deserializing;
        self.switcher
            .switch(View::Progress(ProgressView::new("Reading TX...")), display.backlight());
        let signer = Arc::clone(&self.services.signer);
        let path = entry.path.clone();
        let outcome = self.run_task(
            TimingKind::Deserialize,
            size,
            move || signer.deserialize(&path),
            display,
        );

        match outcome {
            Ok(outputs) if outputs.is_empty() => {
                let err = CsError::FileRead {
                    path: entry.path,
                    details: "Transaction has no outputs.".to_string(),
                };
                self.fail(&err, None, display);
            }
            Ok(outputs) => {
                self.services.journal.record(
                    &JournalEntry::new(EventType::TransactionRead)
                        .path(&entry.path)
                        .size_bytes(size)
                        .outputs(outputs.len()),
                );
                self.transaction = Some(Transaction {
                    entry,
                    size,
                    outputs,
                });
                self.enter_review(display);
            }
            Err(err) => self.fail(&err, None, display),
        }
    }

    /// Submit `operation` and block in the poller until it resolves, feeding
    /// the progress view and the backlight graph.
    fn run_task<T, F>(
        &mut self,
        kind: TimingKind,
        size: u64,
        operation: F,
        display: &mut dyn Display,
    ) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let Self {
            services,
            poller,
            switcher,
            ..
        } = self;
        let executor = services.executor.as_ref();
        let estimate = executor.estimator().estimate_duration(kind, size);
        let mut handle = executor.submit(Some(Tracking::new(kind, size)), operation)?;
        let mut sink = |progress: f64| {
            if let Some(View::Progress(view)) = switcher.current_mut() {
                view.set_value(progress);
            }
            display.backlight().set_graph(progress);
            switcher.redraw(display.renderer());
        };
        poller.run(executor, &mut handle, &mut sink, estimate)
    }

    fn enter_review(&mut self, display: &mut dyn Display) {
        let Some(tx) = &self.transaction else {
            return;
        };
        let glyphs = GlyphSet::new(&[Glyph::BitcoinLogo]);
        let logo = glyphs.slot(Glyph::BitcoinLogo).unwrap_or('B');
        let pages = tx
            .outputs
            .iter()
            .map(|output| {
                Page::new(
                    PageRow::new(format!("To: {}", output.address)),
                    PageRow::new(format!(" : {}", output.amount_text())).icon(logo),
                )
            })
            .collect();
        let view = PageView::new(pages).auto_center(false).glyphs(glyphs);
        self.switcher.switch(View::Pages(view), display.backlight());
        self.state = WorkflowState::ReviewingPages;
    }

    fn confirm(&mut self, display: &mut dyn Display) {
        let Some(tx) = &self.transaction else {
            return;
        };
        let dialog = DialogView::new(
            "Sign TX?",
            format!(
                "Confirm to sign \"{}\" and save it to your USB stick. \
                 Use left/right + select to choose an answer (Y/N).",
                tx.entry.name
            ),
        );
        self.switcher.switch(View::Dialog(dialog), display.backlight());
        self.state = WorkflowState::ConfirmingSign;
    }

    fn sign(&mut self, display: &mut dyn Display) {
        let Some(tx) = self.transaction.clone() else {
            return;
        };
        self.state = WorkflowState::Signing;
        let out_path = signed_output_path(
            &tx.entry.path,
            &self.services.config.transaction.signed_suffix,
            &chrono::Local::now(),
        );
        self.switcher.switch(
            View::Progress(ProgressView::new("Signing TX...").value_suffix(" (ca.)")),
            display.backlight(),
        );

        let signer = Arc::clone(&self.services.signer);
        let password = self.services.config.signer.wallet_password.clone();
        let tx_path = tx.entry.path.clone();
        let task_out = out_path.clone();
        let outcome = self.run_task(
            TimingKind::Sign,
            tx.size,
            move || signer.sign(&tx_path, &task_out, &password),
            display,
        );
        let unmounted = self.unmount_once();

        match outcome {
            Ok(()) => {
                self.services.journal.record(
                    &JournalEntry::new(EventType::TransactionSigned)
                        .path(&out_path)
                        .size_bytes(tx.size)
                        .outputs(tx.outputs.len()),
                );
                log::info!("signed {} into {}", tx.entry.name, out_path.display());
                let message = if unmounted {
                    "The transaction has been signed successfully. \
                     The USB stick was automatically unmounted."
                } else {
                    "The transaction has been signed successfully. \
                     The USB stick could not be unmounted, use Eject USB."
                };
                let view = MessageView::new(
                    "Success",
                    message,
                    self.services.config.display.backlight,
                );
                self.switcher.switch(View::Message(view), display.backlight());
                self.state = WorkflowState::Finished;
            }
            Err(err) => self.fail(&err, Some(Failure::signing(&err)), display),
        }
    }

    fn decline(&mut self, display: &mut dyn Display) {
        if let Some(tx) = &self.transaction {
            self.services
                .journal
                .record(&JournalEntry::new(EventType::SignDeclined).path(&tx.entry.path));
        }
        self.transaction = None;
        match self.services.config.ui.decline_policy {
            DeclinePolicy::ReturnToFileSelect => self.enter_file_select(display),
            DeclinePolicy::Terminate => {
                self.close(display);
                self.state = WorkflowState::Idle;
            }
        }
    }

    /// Unmount the cycle's device. Later calls do nothing.
    fn unmount_once(&mut self) -> bool {
        let Some(mounted) = self.mounted.take() else {
            return false;
        };
        match self.services.media.unmount(&mounted.device) {
            Ok(true) => {
                self.services
                    .journal
                    .record(&JournalEntry::new(EventType::UsbUnmounted).device(&mounted.device));
                true
            }
            Ok(false) => {
                log::warn!("{} was not mounted anymore", mounted.device);
                false
            }
            Err(err) => {
                log::warn!("unmounting {} failed: {err}", mounted.device);
                false
            }
        }
    }

    fn fail(&mut self, err: &CsError, failure: Option<Failure>, display: &mut dyn Display) {
        let failure = failure.unwrap_or_else(|| Failure::from(err));
        log::warn!("sign flow failed in {:?}: {err}", self.state);
        let mut entry = JournalEntry::new(EventType::WorkflowFailed).error(err);
        if let Some(mounted) = &self.mounted {
            entry = entry.device(&mounted.device);
        }
        self.services.journal.record(&entry);

        let view = MessageView::new(
            failure.title.as_str(),
            failure.message.as_str(),
            self.services.config.display.backlight,
        );
        self.switcher.switch(View::Message(view), display.backlight());
        self.state = WorkflowState::Failed(failure);
    }
}

impl Flow for SigningWorkflow {
    fn begin(&mut self, display: &mut dyn Display) {
        if self.state != WorkflowState::Idle {
            log::warn!("begin called in {:?}, restart first", self.state);
            return;
        }
        self.state = WorkflowState::CheckingUsb;
        match self.check_usb() {
            Ok(mounted) => {
                if !mounted.already_mounted {
                    self.services.journal.record(
                        &JournalEntry::new(EventType::UsbMounted)
                            .device(&mounted.device)
                            .path(&mounted.mount_path),
                    );
                }
                self.mounted = Some(mounted);
                self.enter_file_select(display);
            }
            Err(err) => self.fail(&err, None, display),
        }
    }

    fn handle(&mut self, input: InputEvent, display: &mut dyn Display) -> bool {
        if self.state.is_progressing() {
            return input.is_directional();
        }
        match input {
            InputEvent::Up => self.switcher.up(),
            InputEvent::Down => self.switcher.down(),
            InputEvent::Left => self.switcher.left(),
            InputEvent::Right => self.switcher.right(),
            InputEvent::Cancel => false,
            InputEvent::Select => match self.switcher.select() {
                Some(event) => {
                    self.on_event(event, display);
                    true
                }
                None => false,
            },
        }
    }

    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        self.switcher.redraw(renderer);
    }

    fn close(&mut self, display: &mut dyn Display) -> bool {
        if self.state.is_progressing() {
            return false;
        }
        self.switcher.close(display.backlight());
        self.done = true;
        true
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn is_progressing(&self) -> bool {
        self.state.is_progressing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TextDisplay;
    use crate::workflow::test_support::{FakeMedia, FakeSigner, services, test_config};

    const UUID: &str = "1234-ABCD";

    struct Rig {
        _dir: tempfile::TempDir,
        media: Arc<FakeMedia>,
        signer: Arc<FakeSigner>,
        flow: SigningWorkflow,
        display: TextDisplay,
    }

    fn rig_with(policy: DeclinePolicy, signer: FakeSigner, files: &[&str]) -> Rig {
        let dir = tempfile::tempdir().unwrap();
        let mount = dir.path().join("mnt");
        let tx_dir = mount.join("transactions");
        fs::create_dir_all(&tx_dir).unwrap();
        for name in files {
            fs::write(tx_dir.join(name), b"0200000001abcdef").unwrap();
        }
        let mut config = test_config(dir.path(), &[UUID]);
        config.ui.decline_policy = policy;
        let media = Arc::new(
            FakeMedia::new()
                .with_device("/dev/sdb1", UUID, Some("COLD"))
                .with_mount("/dev/sdb1", &mount),
        );
        let signer = Arc::new(signer);
        let flow = SigningWorkflow::new(services(config, Arc::clone(&media), Arc::clone(&signer)));
        Rig {
            _dir: dir,
            media,
            signer,
            flow,
            display: TextDisplay::new(),
        }
    }

    fn rig(policy: DeclinePolicy) -> Rig {
        rig_with(
            policy,
            FakeSigner::with_outputs(&[("bc1qdest", 150_000_000), ("bc1qchange", 2500)]),
            &["a.txn"],
        )
    }

    impl Rig {
        fn press(&mut self, input: InputEvent) -> bool {
            self.flow.handle(input, &mut self.display)
        }

        fn to_dialog(&mut self) {
            self.flow.begin(&mut self.display);
            assert_eq!(self.flow.state(), &WorkflowState::SelectingFile);
            assert!(self.press(InputEvent::Select));
            assert_eq!(self.flow.state(), &WorkflowState::ReviewingPages);
            assert!(self.press(InputEvent::Select));
            assert_eq!(self.flow.state(), &WorkflowState::ConfirmingSign);
        }
    }

    #[test]
    fn no_media_fails_with_note() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(FakeMedia::new());
        let mut flow = SigningWorkflow::new(services(
            test_config(dir.path(), &[UUID]),
            media,
            Arc::new(FakeSigner::default()),
        ));
        let mut display = TextDisplay::new();
        flow.begin(&mut display);
        let WorkflowState::Failed(failure) = flow.state() else {
            panic!("expected failure, got {:?}", flow.state());
        };
        assert_eq!(failure.code, "CS-2001");
        assert_eq!(failure.title, "Please note");
        flow.redraw(&mut display);
        assert_eq!(display.row(0).trim(), "Please note");
        assert_eq!(display.colour(), crate::display::Rgb::BLUE);
    }

    #[test]
    fn untrusted_stick_is_not_mounted() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(FakeMedia::new().with_device("/dev/sdb1", "FFFF-0000", None));
        let mut flow = SigningWorkflow::new(services(
            test_config(dir.path(), &[UUID]),
            Arc::clone(&media),
            Arc::new(FakeSigner::default()),
        ));
        flow.begin(&mut TextDisplay::new());
        assert!(matches!(flow.state(), WorkflowState::Failed(f) if f.code == "CS-2002"));
        assert!(media.mounted().is_empty());
    }

    #[test]
    fn mount_permission_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(
            FakeMedia::new()
                .with_device("/dev/sdb1", UUID, None)
                .denying_mounts(),
        );
        let mut flow = SigningWorkflow::new(services(
            test_config(dir.path(), &[UUID]),
            media,
            Arc::new(FakeSigner::default()),
        ));
        flow.begin(&mut TextDisplay::new());
        assert!(
            matches!(flow.state(), WorkflowState::Failed(f) if f.code == "CS-2003" && f.title == "Warning")
        );
    }

    #[test]
    fn review_shows_one_page_per_output() {
        let mut rig = rig(DeclinePolicy::default());
        rig.flow.begin(&mut rig.display);
        rig.press(InputEvent::Select);
        let Some(View::Pages(pages)) = rig.flow.view() else {
            panic!("expected review pages");
        };
        assert_eq!(pages.page_count(), 2);
        rig.flow.redraw(&mut rig.display);
        assert!(rig.display.row(0).starts_with("To: bc1qdest"));
        assert!(rig.display.row(1).contains(" : 1.5"));
        assert!(rig.press(InputEvent::Right));
        rig.flow.redraw(&mut rig.display);
        assert!(rig.display.row(1).contains(" : 0.000025"));
    }

    #[test]
    fn declining_returns_to_file_list_without_signing() {
        let mut rig = rig(DeclinePolicy::ReturnToFileSelect);
        rig.to_dialog();
        rig.press(InputEvent::Left);
        rig.press(InputEvent::Select);
        assert_eq!(rig.flow.state(), &WorkflowState::SelectingFile);
        assert!(rig.signer.signed().is_empty());
        assert!(rig.media.unmount_calls().is_empty());
        assert!(!rig.flow.is_done());
    }

    #[test]
    fn terminate_policy_ends_flow_and_keeps_mount() {
        let mut rig = rig(DeclinePolicy::Terminate);
        rig.to_dialog();
        rig.press(InputEvent::Down);
        rig.press(InputEvent::Select);
        assert_eq!(rig.flow.state(), &WorkflowState::Idle);
        assert!(rig.flow.is_done());
        assert!(rig.signer.signed().is_empty());
        assert_eq!(rig.media.mounted().len(), 1);
    }

    #[test]
    fn select_without_answer_does_not_sign() {
        let mut rig = rig(DeclinePolicy::default());
        rig.to_dialog();
        assert!(!rig.press(InputEvent::Select));
        assert_eq!(rig.flow.state(), &WorkflowState::ConfirmingSign);
        assert!(rig.signer.signed().is_empty());
    }

    #[test]
    fn confirming_signs_and_unmounts_once() {
        let mut rig = rig(DeclinePolicy::default());
        rig.to_dialog();
        rig.press(InputEvent::Right);
        rig.press(InputEvent::Select);
        assert_eq!(rig.flow.state(), &WorkflowState::Finished);
        assert_eq!(rig.media.unmount_calls(), vec!["/dev/sdb1".to_string()]);
        let signed = rig.signer.signed();
        assert_eq!(signed.len(), 1);
        assert!(signed[0].exists());
        assert!(rig.flow.mounted().is_none());
        assert_eq!(rig.display.colour(), crate::display::Rgb::GREEN);

        rig.press(InputEvent::Select);
        assert!(rig.flow.is_done());
        assert_eq!(rig.display.colour(), crate::display::Rgb::WHITE);
        assert_eq!(rig.media.unmount_calls().len(), 1);
    }

    #[test]
    fn sign_failure_is_prefixed_and_still_unmounts() {
        let mut rig = rig_with(
            DeclinePolicy::default(),
            FakeSigner::with_outputs(&[("bc1qdest", 1000)]).failing_sign("wallet locked"),
            &["a.txn"],
        );
        rig.to_dialog();
        rig.press(InputEvent::Up);
        rig.press(InputEvent::Select);
        let WorkflowState::Failed(failure) = rig.flow.state() else {
            panic!("expected failure");
        };
        assert!(failure.message.starts_with(SIGN_ERROR_PREFIX));
        assert_eq!(failure.title, "Error");
        assert_eq!(rig.media.unmount_calls().len(), 1);
    }

    #[test]
    fn signed_outputs_are_not_offered_for_signing() {
        let mut rig = rig_with(
            DeclinePolicy::default(),
            FakeSigner::with_outputs(&[("bc1qdest", 1000)]),
            &["a.txn", "a_signed_2026-03-01_09-05-00.txn"],
        );
        rig.flow.begin(&mut rig.display);
        let Some(View::Files(files)) = rig.flow.view() else {
            panic!("expected file list");
        };
        let names: Vec<&str> = files
            .window()
            .entries()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.txn"]);
    }

    #[test]
    fn transaction_without_outputs_fails_to_read() {
        let mut rig = rig_with(DeclinePolicy::default(), FakeSigner::default(), &["a.txn"]);
        rig.flow.begin(&mut rig.display);
        rig.press(InputEvent::Select);
        assert!(matches!(rig.flow.state(), WorkflowState::Failed(f) if f.code == "CS-3001"));
    }

    #[test]
    fn missing_transaction_directory_fails_to_read() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(
            FakeMedia::new()
                .with_device("/dev/sdb1", UUID, None)
                .with_mount("/dev/sdb1", &dir.path().join("empty")),
        );
        let mut flow = SigningWorkflow::new(services(
            test_config(dir.path(), &[UUID]),
            media,
            Arc::new(FakeSigner::default()),
        ));
        flow.begin(&mut TextDisplay::new());
        assert!(matches!(flow.state(), WorkflowState::Failed(f) if f.code == "CS-3001"));
    }

    #[test]
    fn successful_read_records_timing_sample() {
        let mut rig = rig(DeclinePolicy::default());
        rig.flow.begin(&mut rig.display);
        rig.press(InputEvent::Select);
        let estimator = rig.flow.services.executor.estimator();
        assert_eq!(estimator.window(TimingKind::Deserialize).len(), 1);
        assert!(estimator.window(TimingKind::Sign).is_empty());
    }

    #[test]
    fn cancel_is_never_handled_by_the_flow() {
        let mut rig = rig(DeclinePolicy::default());
        rig.flow.begin(&mut rig.display);
        assert!(!rig.press(InputEvent::Cancel));
        assert!(rig.flow.close(&mut rig.display));
        assert!(rig.flow.is_done());
        assert!(rig.media.unmount_calls().is_empty());
    }

    #[test]
    fn restart_is_required_before_next_cycle() {
        let mut rig = rig(DeclinePolicy::default());
        rig.flow.begin(&mut rig.display);
        rig.flow.close(&mut rig.display);
        rig.flow.begin(&mut rig.display);
        assert_eq!(rig.flow.state(), &WorkflowState::SelectingFile);
        rig.flow.restart();
        assert_eq!(rig.flow.state(), &WorkflowState::Idle);
        assert!(!rig.flow.is_done());
        rig.flow.begin(&mut rig.display);
        assert_eq!(rig.flow.state(), &WorkflowState::SelectingFile);
    }
}
