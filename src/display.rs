use display_interface::{DataFormat::{U8, U8Iter}, WriteOnlyDataCommand};
use embedded_hal::blocking::delay::DelayUs;

use crate::color::{pack_pair, Rgb12};
use crate::command::Command;
use crate::config::DisplayConfig;
use crate::error::Error;
use crate::font::{FontSize, Fonts};
use crate::raster::{Circle, Line};

/// How `rectangle` paints its area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fill {
    /// Paint every pixel of the box
    Solid,
    /// Only draw the four edges
    Outline,
}

/// Drawing on an S1D15G10 panel.
///
/// There is no framebuffer: every primitive programs the controller's
/// address window and streams packed pixel pairs straight into its memory.
/// `x` selects the page (PASET) and `y` the column (CASET).
///
/// Coordinates are checked against the panel before anything is sent, so a
/// primitive either draws completely or returns [`Error::OutOfBounds`].
pub struct Display<DI> {
    iface: DI,
    config: DisplayConfig,
    fonts: Fonts,
}

impl<DI> Display<DI>
where
    DI: WriteOnlyDataCommand,
{
    pub fn new(iface: DI, config: DisplayConfig) -> Display<DI> {
        Display {
            iface,
            config,
            fonts: Fonts::new(),
        }
    }

    /// Install the glyph tables used by `print_character` and `print_string`.
    pub fn with_fonts(mut self, fonts: Fonts) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn set_fonts(&mut self, fonts: Fonts) {
        self.fonts = fonts;
    }

    /// Bring the controller out of reset into 12-bit colour mode and turn it on.
    ///
    /// The link must already have pulsed the reset line.
    pub fn init<D>(&mut self, delay: &mut D) -> Result<(), Error>
    where
        D: DelayUs<u32>,
    {
        let settle = self.config.settle_delay_us;

        Command::DisplayControl(0x00, 0x20, 0x0C, 0x00).send(&mut self.iface)?;

        // oscillator has to run before leaving sleep
        Command::OscillatorOn.send(&mut self.iface)?;
        delay.delay_us(settle);
        Command::SleepOut.send(&mut self.iface)?;

        Command::Volume(self.config.volume, self.config.resistor_ratio).send(&mut self.iface)?;
        Command::Invert(true).send(&mut self.iface)?;
        Command::ComScan(0x01).send(&mut self.iface)?;

        Command::PowerControl(0x0F).send(&mut self.iface)?;
        delay.delay_us(settle);

        // page address inverted, RGB order, 16-level grayscale (12-bit colour)
        Command::DataControl(0x01, 0x00, 0x02).send(&mut self.iface)?;
        Command::DisplayOn(true).send(&mut self.iface)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("display initialised: {}", self.config);

        Ok(())
    }

    /// Panel size as (pages, columns).
    pub fn dimensions(&self) -> (u8, u8) {
        (self.config.width, self.config.height)
    }

    /// Turn the display on.
    pub fn on(&mut self) -> Result<(), Error> {
        Ok(Command::DisplayOn(true).send(&mut self.iface)?)
    }

    /// Turn the display off.
    pub fn off(&mut self) -> Result<(), Error> {
        Ok(Command::DisplayOn(false).send(&mut self.iface)?)
    }

    pub fn set_inverted(&mut self, inverted: bool) -> Result<(), Error> {
        Ok(Command::Invert(inverted).send(&mut self.iface)?)
    }

    pub fn sleep(&mut self) -> Result<(), Error> {
        Command::DisplayOn(false).send(&mut self.iface)?;
        Command::SleepIn.send(&mut self.iface)?;
        Ok(Command::OscillatorOff.send(&mut self.iface)?)
    }

    pub fn wake<D>(&mut self, delay: &mut D) -> Result<(), Error>
    where
        D: DelayUs<u32>,
    {
        Command::OscillatorOn.send(&mut self.iface)?;
        delay.delay_us(self.config.settle_delay_us);
        Command::SleepOut.send(&mut self.iface)?;
        Ok(Command::DisplayOn(true).send(&mut self.iface)?)
    }

    pub fn set_contrast(&mut self, volume: u8, resistor_ratio: u8) -> Result<(), Error> {
        self.config.volume = volume;
        self.config.resistor_ratio = resistor_ratio;
        Ok(Command::Volume(volume, resistor_ratio).send(&mut self.iface)?)
    }

    pub fn contrast_up(&mut self) -> Result<(), Error> {
        Ok(Command::VolumeUp.send(&mut self.iface)?)
    }

    pub fn contrast_down(&mut self) -> Result<(), Error> {
        Ok(Command::VolumeDown.send(&mut self.iface)?)
    }

    /// Set the address window, both corners inclusive, and start a memory
    /// write. Data sent with `draw` afterwards fills the window in raster
    /// order and wraps around at its end.
    pub fn set_draw_area(&mut self, start: (u8, u8), end: (u8, u8)) -> Result<(), Error> {
        self.check(start.0, start.1)?;
        self.check(end.0, end.1)?;

        Command::PageAddress(start.0, end.0).send(&mut self.iface)?;
        Command::ColumnAddress(start.1, end.1).send(&mut self.iface)?;
        Ok(Command::MemoryWrite.send(&mut self.iface)?)
    }

    /// Send raw packed pixel data into the current draw area.
    pub fn draw(&mut self, buffer: &[u8]) -> Result<(), Error> {
        Ok(self.iface.send_data(U8(buffer))?)
    }

    /// Paint the whole panel white.
    pub fn clear(&mut self) -> Result<(), Error> {
        let (w, h) = self.dimensions();
        let max = (self.config.max_x(), self.config.max_y());
        self.set_draw_area((0, 0), max)?;

        let pixels = u32::from(w) * u32::from(h);
        self.fill_pairs(Rgb12::WHITE, (pixels + 1) / 2)
    }

    pub fn pixel(&mut self, x: u8, y: u8, color: Rgb12) -> Result<(), Error> {
        self.set_draw_area((x, y), (x, y))?;
        // a 1x1 window still takes a whole pair; the second one wraps onto the first
        self.draw(&pack_pair(color, color))
    }

    /// Bresenham line between two points, both included.
    pub fn line(&mut self, x0: u8, y0: u8, x1: u8, y1: u8, color: Rgb12) -> Result<(), Error> {
        self.check(x0, y0)?;
        self.check(x1, y1)?;

        for (x, y) in Line::new((i16::from(x0), i16::from(y0)), (i16::from(x1), i16::from(y1))) {
            self.pixel(to_coord(x)?, to_coord(y)?, color)?;
        }
        Ok(())
    }

    /// Rectangle with opposite corners `(x0, y0)` and `(x1, y1)`, in any order.
    pub fn rectangle(
        &mut self,
        x0: u8,
        y0: u8,
        x1: u8,
        y1: u8,
        fill: Fill,
        color: Rgb12,
    ) -> Result<(), Error> {
        match fill {
            Fill::Solid => {
                let (xmin, xmax) = (x0.min(x1), x0.max(x1));
                let (ymin, ymax) = (y0.min(y1), y0.max(y1));
                self.set_draw_area((xmin, ymin), (xmax, ymax))?;

                let area = (u32::from(xmax - xmin) + 1) * (u32::from(ymax - ymin) + 1);
                self.fill_pairs(color, (area + 1) / 2)
            }
            Fill::Outline => {
                self.check(x0, y0)?;
                self.check(x1, y1)?;

                self.line(x0, y0, x1, y0, color)?;
                self.line(x0, y1, x1, y1, color)?;
                self.line(x0, y0, x0, y1, color)?;
                self.line(x1, y0, x1, y1, color)
            }
        }
    }

    /// Midpoint circle around `(x0, y0)`. The whole circle must fit on the panel.
    pub fn circumference(&mut self, x0: u8, y0: u8, radius: u8, color: Rgb12) -> Result<(), Error> {
        let r = u16::from(radius);
        if u16::from(x0) < r
            || u16::from(y0) < r
            || u16::from(x0) + r > u16::from(self.config.max_x())
            || u16::from(y0) + r > u16::from(self.config.max_y())
        {
            return Err(Error::OutOfBounds);
        }

        for (x, y) in Circle::new((i16::from(x0), i16::from(y0)), i16::from(radius)) {
            self.pixel(to_coord(x)?, to_coord(y)?, color)?;
        }
        Ok(())
    }

    /// Draw one character with its top-left corner at `(x, y)`.
    ///
    /// Set bits are painted with `color`, clear bits with `background`.
    pub fn print_character(
        &mut self,
        c: u8,
        x: u8,
        y: u8,
        size: FontSize,
        color: Rgb12,
        background: Rgb12,
    ) -> Result<(), Error> {
        let glyph = self.fonts.get(size)?.glyph(c)?;
        let rows = glyph.rows();
        let columns = glyph.columns();

        let x_end = u16::from(x) + u16::from(rows) - 1;
        let y_end = u16::from(y) + u16::from(columns) - 1;
        if x_end > u16::from(self.config.max_x()) || y_end > u16::from(self.config.max_y()) {
            return Err(Error::OutOfBounds);
        }
        self.set_draw_area((x, y), (x_end as u8, y_end as u8))?;

        let pairs = (columns + 1) / 2;
        let mut bytes = glyph.rows_in_send_order().flat_map(move |bits| {
            (0..pairs).flat_map(move |p| {
                let mask = 0x80u8 >> (2 * p);
                let first = if bits & mask != 0 { color } else { background };
                let second = if bits & (mask >> 1) != 0 { color } else { background };
                pack_pair(first, second)
            })
        });
        Ok(self.iface.send_data(U8Iter(&mut bytes))?)
    }

    /// Draw `s` left to right starting at `(x, y)`.
    ///
    /// The column advances by the font pitch after each character. Printing
    /// stops at the first character that would not fit on the panel; there
    /// is no wrapping. Every character that fits is looked up before the
    /// first one is drawn.
    pub fn print_string(
        &mut self,
        s: &str,
        x: u8,
        y: u8,
        size: FontSize,
        color: Rgb12,
        background: Rgb12,
    ) -> Result<(), Error> {
        let table = *self.fonts.get(size)?;
        let columns = u16::from(table.columns());
        let limit = u16::from(self.config.max_y());
        let pitch = u16::from(size.advance());

        let mut fits = 0;
        let mut end = u16::from(y) + columns - 1;
        for c in s.bytes() {
            if end > limit {
                break;
            }
            table.glyph(c)?;
            fits += 1;
            end += pitch;
        }

        let mut y = u16::from(y);
        for c in s.bytes().take(fits) {
            self.print_character(c, x, y as u8, size, color, background)?;
            y += pitch;
        }
        Ok(())
    }

    /// Give back the interface.
    pub fn release(self) -> DI {
        self.iface
    }

    fn fill_pairs(&mut self, color: Rgb12, pairs: u32) -> Result<(), Error> {
        let packed = pack_pair(color, color);
        let mut bytes = (0..pairs).flat_map(move |_| packed);
        Ok(self.iface.send_data(U8Iter(&mut bytes))?)
    }

    fn check(&self, x: u8, y: u8) -> Result<(), Error> {
        if x > self.config.max_x() || y > self.config.max_y() {
            return Err(Error::OutOfBounds);
        }
        Ok(())
    }
}

fn to_coord(v: i16) -> Result<u8, Error> {
    u8::try_from(v).map_err(|_| Error::OutOfBounds)
}
