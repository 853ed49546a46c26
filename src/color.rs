//! 12-bit colour handling.
//!
//! The controller runs in 4096-colour mode and takes pixels two at a time:
//! three bytes carry two 12-bit values with their nibbles interleaved.
//!
//! ```text
//!  byte 0        byte 1        byte 2
//!  R0 G0         B0 R1         G1 B1
//! ```

/// A 12-bit RGB colour, 4 bits per channel, stored as `0x0RGB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb12(u16);

impl Rgb12 {
    pub const WHITE: Rgb12 = Rgb12(0xFFF);
    pub const BLACK: Rgb12 = Rgb12(0x000);
    pub const RED: Rgb12 = Rgb12(0xF00);
    pub const GREEN: Rgb12 = Rgb12(0x0F0);
    pub const BLUE: Rgb12 = Rgb12(0x00F);
    pub const CYAN: Rgb12 = Rgb12(0x0FF);
    pub const MAGENTA: Rgb12 = Rgb12(0xF0F);
    pub const YELLOW: Rgb12 = Rgb12(0xFF0);
    pub const BROWN: Rgb12 = Rgb12(0xB22);
    pub const ORANGE: Rgb12 = Rgb12(0xFA0);
    pub const PINK: Rgb12 = Rgb12(0xF6A);

    /// Build a colour from 4-bit channels. Higher bits are dropped.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb12((((r & 0xF) as u16) << 8) | (((g & 0xF) as u16) << 4) | ((b & 0xF) as u16))
    }

    /// Wrap a raw `0x0RGB` value. Bits above the low twelve are dropped.
    pub const fn from_raw(raw: u16) -> Self {
        Rgb12(raw & 0xFFF)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 8) as u8 & 0xF
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 4) as u8 & 0xF
    }

    pub const fn b(self) -> u8 {
        self.0 as u8 & 0xF
    }
}

impl From<u16> for Rgb12 {
    fn from(raw: u16) -> Self {
        Rgb12::from_raw(raw)
    }
}

/// Encode two pixels into the three bytes the controller expects.
pub const fn pack_pair(first: Rgb12, second: Rgb12) -> [u8; 3] {
    let a = first.0;
    let b = second.0;
    [
        (a >> 4) as u8,
        (((a & 0xF) << 4) | (b >> 8)) as u8,
        b as u8,
    ]
}

/// Inverse of [`pack_pair`].
pub const fn unpack_pair(bytes: [u8; 3]) -> (Rgb12, Rgb12) {
    let first = ((bytes[0] as u16) << 4) | ((bytes[1] as u16) >> 4);
    let second = (((bytes[1] & 0xF) as u16) << 8) | bytes[2] as u16;
    (Rgb12(first), Rgb12(second))
}
