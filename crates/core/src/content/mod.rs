//! Static narration and puzzle data, one module per phase.
//!
//! Positions are `[x, y, z]` in scene units and colors are `0xRRGGBB`.

pub mod courage;
pub mod darkness;
pub mod faith;
pub mod grace;
pub mod intro;
pub mod loyalty;
pub mod patronus;
pub mod temptation;
pub mod wisdom;

/// One narrated line.
///
/// A line with empty text is a silent pause of `hold_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub text: &'static str,
    pub verse: Option<&'static str>,
    /// How long the text stays on screen.
    pub hold_ms: u64,
    /// Voice cue played while the line is shown.
    pub voice: Option<&'static str>,
}

impl Line {
    pub const fn new(text: &'static str, hold_ms: u64) -> Self {
        Self {
            text,
            verse: None,
            hold_ms,
            voice: None,
        }
    }

    pub const fn silence(hold_ms: u64) -> Self {
        Self::new("", hold_ms)
    }

    pub const fn with_verse(self, verse: &'static str) -> Self {
        Self {
            verse: Some(verse),
            ..self
        }
    }

    pub const fn with_voice(self, voice: &'static str) -> Self {
        Self {
            voice: Some(voice),
            ..self
        }
    }

    pub fn is_silence(&self) -> bool {
        self.text.is_empty()
    }
}
