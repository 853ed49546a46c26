//! Interrupt driven sample playback through a DAC.
//!
//! A periodic timer match interrupt clocks one sample per tick into the DAC
//! register. The foreground only starts and stops streams; the interrupt
//! handler does all the work in between.
//!
//! ```text
//!  Idle --initialize--> Armed --play--> Streaming
//!                         ^                 |
//!                         +--last sample----+
//!                         +--stop-----------+
//! ```
//!
//! The stream position is the only state shared between the two contexts.
//! It lives inside a [`critical_section::Mutex`], so `play` hands a stream
//! over with the timer interrupt masked and the handler owns it from then on.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::config::AudioConfig;
use crate::error::Error;

/// A timer able to raise a periodic match interrupt.
pub trait SampleTimer {
    /// Program the prescale divisor and the match count (both as plain
    /// divisors, not register values) with interrupt and reset on match.
    /// The timer is left stopped.
    fn configure(&mut self, prescale: u32, match_value: u32);

    /// Hook the match interrupt up at the lowest priority and unmask it.
    fn listen(&mut self);

    /// Start counting.
    fn start(&mut self);

    /// Stop counting. A pending match is not cleared.
    fn stop(&mut self);

    /// Acknowledge the match interrupt at the timer.
    fn clear_match(&mut self);

    /// Signal end of interrupt to the interrupt controller.
    fn end_of_interrupt(&mut self);

    /// Let the core take interrupts at all. Called outside any critical
    /// section once the match interrupt is hooked up.
    fn unmask_core_interrupts();
}

/// A single channel DAC.
pub trait Dac {
    /// Route the DAC to its output pin.
    fn enable(&mut self);

    /// Latch a raw register value.
    fn write(&mut self, value: u32);
}

/// Where the engine is in its life cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    /// Not configured yet
    Idle,
    /// Timer configured but stopped
    Armed,
    /// Clocking samples out
    Streaming,
}

struct Stream {
    samples: &'static [u16],
    next: usize,
}

impl Stream {
    fn remaining(&self) -> usize {
        self.samples.len().saturating_sub(self.next)
    }
}

struct Inner<T, D> {
    timer: T,
    dac: D,
    config: AudioConfig,
    state: PlaybackState,
    stream: Option<Stream>,
}

impl<T, D> Inner<T, D>
where
    T: SampleTimer,
    D: Dac,
{
    fn tick(&mut self) {
        self.timer.clear_match();

        let finished = match self.stream.as_mut() {
            Some(stream) => {
                if let Some(&sample) = stream.samples.get(stream.next) {
                    self.dac.write(self.config.dac_value(sample));
                    stream.next += 1;
                }
                stream.remaining() == 0
            }
            // spurious match with nothing to play
            None => true,
        };

        if finished {
            // the last sample stays latched in the DAC
            self.timer.stop();
            self.stream = None;
            if self.state == PlaybackState::Streaming {
                self.state = PlaybackState::Armed;
                #[cfg(feature = "defmt")]
                defmt::trace!("stream finished");
            }
        }

        self.timer.end_of_interrupt();
    }
}

/// The audio streaming engine.
///
/// Meant to live in a `static` so both the foreground and the timer
/// interrupt can reach it:
///
/// ```ignore
/// static PLAYER: Player<Timer0, Dac0> = Player::new(
///     unsafe { Timer0::steal(timer0_isr) },
///     unsafe { Dac0::steal() },
///     AudioConfig::new(18_000_000, 8_000),
/// );
///
/// extern "C" fn timer0_isr() {
///     PLAYER.on_interrupt();
/// }
/// ```
pub struct Player<T, D> {
    inner: Mutex<RefCell<Inner<T, D>>>,
}

impl<T, D> Player<T, D>
where
    T: SampleTimer,
    D: Dac,
{
    pub const fn new(timer: T, dac: D, config: AudioConfig) -> Self {
        Player {
            inner: Mutex::new(RefCell::new(Inner {
                timer,
                dac,
                config,
                state: PlaybackState::Idle,
                stream: None,
            })),
        }
    }

    /// Configure the DAC pin and the sample timer, leaving the timer stopped,
    /// then unmask interrupts at the core.
    ///
    /// Calling this again while armed reprograms the timer; calling it while
    /// a stream is playing is refused. Must not be called from inside a
    /// critical section.
    pub fn initialize(&self) -> Result<(), Error> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if inner.state == PlaybackState::Streaming {
                return Err(Error::AlreadyStreaming);
            }
            let (prescale, match_value) = inner.config.timer_divisors()?;

            inner.dac.enable();
            inner.timer.stop();
            inner.timer.configure(prescale, match_value);
            inner.timer.listen();
            inner.state = PlaybackState::Armed;

            #[cfg(feature = "defmt")]
            defmt::debug!(
                "audio armed: prescale {=u32}, match {=u32}",
                prescale,
                match_value
            );
            Ok::<(), Error>(())
        })?;

        // unmasking inside the critical section would break it
        T::unmask_core_interrupts();
        Ok(())
    }

    /// Start clocking `samples` out. Returns as soon as the timer runs.
    ///
    /// Samples are right aligned to the DAC width (10 bits on the
    /// LPC2378); higher bits are dropped.
    pub fn play(&self, samples: &'static [u16]) -> Result<(), Error> {
        if samples.is_empty() {
            #[cfg(feature = "defmt")]
            defmt::warn!("refusing to play an empty stream");
            return Err(Error::EmptyStream);
        }

        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            let state = inner.state;
            match state {
                PlaybackState::Idle => Err(Error::NotInitialized),
                PlaybackState::Streaming => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("play while streaming");
                    Err(Error::AlreadyStreaming)
                }
                PlaybackState::Armed => {
                    inner.stream = Some(Stream { samples, next: 0 });
                    inner.state = PlaybackState::Streaming;
                    inner.timer.start();

                    #[cfg(feature = "defmt")]
                    defmt::debug!("playing {=usize} samples", samples.len());
                    Ok(())
                }
            }
        })
    }

    /// Cancel the current stream. Does nothing unless streaming.
    pub fn stop(&self) {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if inner.state == PlaybackState::Streaming {
                inner.timer.stop();
                inner.stream = None;
                inner.state = PlaybackState::Armed;

                #[cfg(feature = "defmt")]
                defmt::debug!("playback stopped");
            }
        })
    }

    /// Body of the timer match interrupt handler.
    pub fn on_interrupt(&self) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).tick())
    }

    pub fn state(&self) -> PlaybackState {
        critical_section::with(|cs| self.inner.borrow_ref(cs).state)
    }

    /// Samples still to be played, if a stream is active.
    pub fn remaining(&self) -> Option<usize> {
        critical_section::with(|cs| {
            self.inner
                .borrow_ref(cs)
                .stream
                .as_ref()
                .map(Stream::remaining)
        })
    }

    /// Give back the timer and the DAC.
    pub fn release(self) -> (T, D) {
        let inner = self.inner.into_inner().into_inner();
        (inner.timer, inner.dac)
    }
}
