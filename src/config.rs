//! Tunables for the display link, the panel and the audio engine.
//!
//! The defaults describe the LPC2378-STK: an 18 MHz peripheral clock, a
//! 132x132 S1D15G10 panel on SSP0 and the on-chip 10-bit DAC.

use crate::error::Error;

/// Serial bus settings for the display link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Clock prescale divisor written to the bus controller.
    pub clock_prescale: u8,
    /// Bits per frame: 8 payload bits plus the command/data tag.
    pub frame_bits: u8,
    /// Maximum polls of a bus status flag before giving up.
    /// `None` spins forever, which is what real hardware wants.
    pub spin_limit: Option<u32>,
    /// Stale receive words read back during `init`.
    pub drain_reads: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            clock_prescale: 8,
            frame_bits: 9,
            spin_limit: None,
            drain_reads: 8,
        }
    }
}

impl LinkConfig {
    pub fn with_spin_limit(mut self, limit: u32) -> Self {
        self.spin_limit = Some(limit);
        self
    }

    pub fn with_clock_prescale(mut self, prescale: u8) -> Self {
        self.clock_prescale = prescale;
        self
    }
}

/// Panel geometry and power-up parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    /// Number of addressable pages (x axis).
    pub width: u8,
    /// Number of addressable columns (y axis).
    pub height: u8,
    /// Electronic volume (contrast) set during init.
    pub volume: u8,
    /// Internal resistor ratio set alongside the volume.
    pub resistor_ratio: u8,
    /// Settle time after oscillator and power-control changes.
    pub settle_delay_us: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width: 132,
            height: 132,
            volume: 0x24,
            resistor_ratio: 0x03,
            settle_delay_us: 10_000,
        }
    }
}

impl DisplayConfig {
    pub fn with_contrast(mut self, volume: u8, resistor_ratio: u8) -> Self {
        self.volume = volume;
        self.resistor_ratio = resistor_ratio;
        self
    }

    pub fn with_settle_delay_us(mut self, us: u32) -> Self {
        self.settle_delay_us = us;
        self
    }

    /// Highest valid page address.
    pub fn max_x(&self) -> u8 {
        self.width.saturating_sub(1)
    }

    /// Highest valid column address.
    pub fn max_y(&self) -> u8 {
        self.height.saturating_sub(1)
    }
}

/// Sample clock settings for the audio engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioConfig {
    /// Peripheral clock feeding the sample timer.
    pub pclk_hz: u32,
    /// Output sample rate.
    pub sample_rate: u32,
    /// Significant low bits of each sample; the rest are dropped.
    pub dac_bits: u8,
    /// Left shift applied to each sample before it is written to the DAC.
    pub dac_shift: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig::new(18_000_000, 8_000)
    }
}

impl AudioConfig {
    /// Settings for a 10-bit DAC that takes its value in bits 15:6.
    pub const fn new(pclk_hz: u32, sample_rate: u32) -> Self {
        AudioConfig {
            pclk_hz,
            sample_rate,
            dac_bits: 10,
            dac_shift: 6,
        }
    }

    /// DAC register value for one sample.
    pub fn dac_value(&self, sample: u16) -> u32 {
        let mask = (1u32 << self.dac_bits.min(16)) - 1;
        (u32::from(sample) & mask) << self.dac_shift
    }

    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn with_pclk_hz(mut self, hz: u32) -> Self {
        self.pclk_hz = hz;
        self
    }

    /// Prescale and match values that produce one match event per sample.
    ///
    /// The timer is made to count microseconds when the clock allows it, so
    /// the defaults give a prescale of 18 and a match of 125 (125 us).
    pub fn timer_divisors(&self) -> Result<(u32, u32), Error> {
        if self.sample_rate == 0 || self.pclk_hz % self.sample_rate != 0 {
            return Err(Error::UnsupportedSampleRate);
        }
        let ticks = self.pclk_hz / self.sample_rate;

        let per_us = self.pclk_hz / 1_000_000;
        let prescale = if per_us > 1 && ticks % per_us == 0 { per_us } else { 1 };

        Ok((prescale, ticks / prescale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timer_runs_at_8khz() {
        let (prescale, matched) = AudioConfig::default().timer_divisors().unwrap();
        assert_eq!((prescale, matched), (18, 125));
        assert_eq!(18_000_000 / (prescale * matched), 8_000);
    }

    #[test]
    fn odd_clock_falls_back_to_raw_ticks() {
        let cfg = AudioConfig::default().with_pclk_hz(12_000_000).with_sample_rate(16_000);
        let (prescale, matched) = cfg.timer_divisors().unwrap();
        assert_eq!((prescale, matched), (1, 750));
    }

    #[test]
    fn samples_are_cut_to_the_dac_width() {
        let cfg = AudioConfig::default();
        assert_eq!(cfg.dac_value(0x03FF), 0xFFC0);
        assert_eq!(cfg.dac_value(0x0123), 0x0123 << 6);
        // bit 16 of DACR is BIAS and must never be set by a sample
        assert_eq!(cfg.dac_value(0xFFFF), 0xFFC0);
        assert_eq!(cfg.dac_value(0x0400), 0);
    }

    #[test]
    fn rejects_rates_that_do_not_divide() {
        let cfg = AudioConfig::default().with_sample_rate(44_100);
        assert!(matches!(cfg.timer_divisors(), Err(Error::UnsupportedSampleRate)));

        let cfg = AudioConfig::default().with_sample_rate(0);
        assert!(matches!(cfg.timer_divisors(), Err(Error::UnsupportedSampleRate)));
    }

    #[test]
    fn reference_panel_limits() {
        let cfg = DisplayConfig::default();
        assert_eq!((cfg.max_x(), cfg.max_y()), (131, 131));
    }
}
