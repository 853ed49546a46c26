use display_interface::DisplayError;

use crate::font::FontSize;

/// Errors returned by the drawing primitives and the audio engine.
///
/// Every variant except `Interface` is a caller precondition that is checked
/// before anything is sent to the hardware.
#[derive(Debug)]
pub enum Error {
    /// The transport to the display controller failed.
    Interface(DisplayError),
    /// A coordinate (or a shape's extent) falls outside the panel.
    OutOfBounds,
    /// No glyph table was installed for this font size.
    MissingFont(FontSize),
    /// The glyph table has no record for this character code.
    UnsupportedCharacter(u8),
    /// A glyph table header is inconsistent with its data.
    InvalidGlyphTable,
    /// `play` was called with no samples.
    EmptyStream,
    /// `play` was called while a stream is still being clocked out.
    AlreadyStreaming,
    /// The audio engine has not been initialized.
    NotInitialized,
    /// The sample rate cannot be derived from the peripheral clock.
    UnsupportedSampleRate,
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Error::Interface(e)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Interface(_) => defmt::write!(f, "Interface"),
            Error::OutOfBounds => defmt::write!(f, "OutOfBounds"),
            Error::MissingFont(size) => defmt::write!(f, "MissingFont({})", size),
            Error::UnsupportedCharacter(c) => defmt::write!(f, "UnsupportedCharacter({=u8:#x})", c),
            Error::InvalidGlyphTable => defmt::write!(f, "InvalidGlyphTable"),
            Error::EmptyStream => defmt::write!(f, "EmptyStream"),
            Error::AlreadyStreaming => defmt::write!(f, "AlreadyStreaming"),
            Error::NotInitialized => defmt::write!(f, "NotInitialized"),
            Error::UnsupportedSampleRate => defmt::write!(f, "UnsupportedSampleRate"),
        }
    }
}
