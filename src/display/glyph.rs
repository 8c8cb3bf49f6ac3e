//! Custom glyph slots. The display controller offers eight of them.

#![allow(missing_docs)]

/// Number of custom glyph slots on the controller.
pub const GLYPH_SLOTS: usize = 8;

/// Symbols the views place into custom glyph slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    ArrowRight,
    ArrowLeft,
    Circle,
    CircleFilled,
    Tick,
    Cross,
    Hourglass,
    Target,
    BitcoinLogo,
}

impl Glyph {
    /// Closest printable stand-in, for terminals and logs.
    #[must_use]
    pub const fn printable(self) -> char {
        match self {
            Self::ArrowRight => '▷',
            Self::ArrowLeft => '◁',
            Self::Circle => '○',
            Self::CircleFilled => '●',
            Self::Tick => '✓',
            Self::Cross => '✗',
            Self::Hourglass => '⧗',
            Self::Target => '◎',
            Self::BitcoinLogo => '₿',
        }
    }
}

/// An ordered set of at most [`GLYPH_SLOTS`] glyphs; slot `i` renders as `char(i)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphSet {
    glyphs: Vec<Glyph>,
}

impl GlyphSet {
    /// # Panics
    /// Panics when more than [`GLYPH_SLOTS`] glyphs are requested; the slot count
    /// is a hardware limit, so this is a programming error.
    #[must_use]
    pub fn new(glyphs: &[Glyph]) -> Self {
        assert!(
            glyphs.len() <= GLYPH_SLOTS,
            "display supports only {GLYPH_SLOTS} custom glyphs at a time, got {}",
            glyphs.len()
        );
        Self {
            glyphs: glyphs.to_vec(),
        }
    }

    /// Character that addresses `glyph`, if it is loaded.
    #[must_use]
    pub fn slot(&self, glyph: Glyph) -> Option<char> {
        self.glyphs
            .iter()
            .position(|g| *g == glyph)
            .and_then(|idx| u32::try_from(idx).ok())
            .and_then(char::from_u32)
    }

    /// Glyph loaded at the slot addressed by `c`.
    #[must_use]
    pub fn glyph_at(&self, c: char) -> Option<Glyph> {
        let idx = usize::try_from(u32::from(c)).ok()?;
        self.glyphs.get(idx).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}
