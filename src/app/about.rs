//! About screen: version banner, installed signer version and timing averages.

#![allow(missing_docs)]

use std::sync::Arc;

use crate::display::{
    Display, Glyph, GlyphSet, OptionRow, ROM_ARROW_LEFT, ROM_ARROW_RIGHT, Renderer, center,
};
use crate::input::InputEvent;
use crate::timing::estimator::TimingKind;
use crate::worker::executor::TaskHandle;
use crate::workflow::{Flow, Services};

pub const APP_NAME: &str = "coldsign";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const SCROLL_SPEED_MS: u32 = 200;
const SCROLL_DELAY_MS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SignerVersion {
    Fetching,
    Known(String),
    Unavailable,
}

pub struct AboutFlow {
    services: Services,
    glyphs: GlyphSet,
    pending: Option<TaskHandle<String>>,
    version: SignerVersion,
    done: bool,
}

impl AboutFlow {
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self {
            services,
            glyphs: GlyphSet::new(&[Glyph::ArrowRight, Glyph::BitcoinLogo, Glyph::Target]),
            pending: None,
            version: SignerVersion::Fetching,
            done: false,
        }
    }

    /// Scrolling details text as of now.
    #[must_use]
    pub fn details(&self) -> String {
        let estimator = self.services.executor.estimator();
        let average = |kind| {
            estimator
                .average(kind)
                .map_or_else(|| "n/a".to_string(), |avg| format!("{avg:.2}s/kB"))
        };
        let version = match &self.version {
            SignerVersion::Fetching => "Fetching...",
            SignerVersion::Known(version) => version.as_str(),
            SignerVersion::Unavailable => "unavailable",
        };
        let logo = self.glyphs.slot(Glyph::BitcoinLogo).unwrap_or('B');
        format!(
            "Offline wallet {logo} Easily sign your bitcoin transactions. \
             Installed Electrum version: {version} - \
             Electrum benchmark stats: DESERIALIZE={} | SIGN={}",
            average(TimingKind::Deserialize),
            average(TimingKind::Sign),
        )
    }

    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.version == SignerVersion::Fetching
    }

    fn poll_version(&mut self) {
        let Some(handle) = self.pending.as_mut() else {
            return;
        };
        let Some(outcome) = self.services.executor.try_resolve(handle) else {
            return;
        };
        self.pending = None;
        self.version = match outcome {
            Ok(version) => SignerVersion::Known(version),
            Err(err) => {
                log::warn!("signer version unavailable: {err}");
                SignerVersion::Unavailable
            }
        };
    }
}

impl Flow for AboutFlow {
    fn begin(&mut self, _display: &mut dyn Display) {
        let signer = Arc::clone(&self.services.signer);
        match self.services.executor.submit(None, move || signer.version()) {
            Ok(handle) => self.pending = Some(handle),
            Err(err) => {
                log::info!("not fetching signer version: {err}");
                self.version = SignerVersion::Unavailable;
            }
        }
    }

    fn handle(&mut self, input: InputEvent, display: &mut dyn Display) -> bool {
        match input {
            InputEvent::Select => self.close(display),
            _ => false,
        }
    }

    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        self.poll_version();
        renderer.load_glyphs(&self.glyphs);
        renderer.write_row(0, &format!("{APP_NAME} v{APP_VERSION}"));
        let details = self.details();
        renderer.write_option(
            1,
            &OptionRow::new(&details)
                .scroll(!self.is_fetching())
                .timing(SCROLL_SPEED_MS, SCROLL_DELAY_MS),
        );
        renderer.write_row(2, &center(&format!("{ROM_ARROW_RIGHT}[OK]{ROM_ARROW_LEFT}")));
    }

    fn close(&mut self, _display: &mut dyn Display) -> bool {
        // Dropping an unresolved handle frees the worker; the task still finishes.
        self.pending = None;
        self.done = true;
        true
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
