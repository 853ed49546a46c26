#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

extern crate embedded_hal;

mod command;
mod raster;
pub mod audio;
pub mod backlight;
pub mod color;
pub mod config;
pub mod delay;
pub mod display;
pub mod error;
pub mod font;
pub mod interface;

#[cfg(feature = "lpc2378")]
pub mod lpc2378;

#[cfg(test)]
mod mock;

pub use audio::{Dac, PlaybackState, Player, SampleTimer};
pub use backlight::Backlight;
pub use color::Rgb12;
pub use command::Command;
pub use config::{AudioConfig, DisplayConfig, LinkConfig};
pub use display::{Display, Fill};
pub use error::Error;
pub use font::{FontSize, Fonts, GlyphTable};
pub use interface::{Link, SerialPort};
