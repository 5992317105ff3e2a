#![no_std]

//! DMX512 receive path for the ledwash RGB fixture.
//!
//! The wire is a continuous 250 kbit/s 8N2 stream. A break (line held low
//! past a byte time, surfacing as a UART framing error) marks the start of a
//! frame, followed by the 0x00 start code and 512 channel slots. Board glue
//! forwards the UART framing-error and byte-received interrupts to
//! [`DmxReceiver::on_break`] / [`DmxReceiver::on_byte`]; the application
//! loop polls [`DmxReceiver::take_frame_ready`] and pulls the fixture's five
//! slots with [`DmxReceiver::decode`].

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

#[cfg(test)]
extern crate std;

/// Start code slot plus 512 channel slots.
pub const FRAME_LEN: usize = 513;
/// Channel slots carried by one frame.
pub const CHANNEL_COUNT: usize = 512;
/// Start code of a standard dimmer frame; anything else is rejected at decode.
pub const START_CODE: u8 = 0x00;
/// Consecutive slots one fixture consumes: red, green, blue, dimmer, flash.
pub const FIXTURE_SLOTS: usize = 5;
/// Lowest configurable base channel.
pub const BASE_CHANNEL_MIN: u16 = 1;
/// Highest configurable base channel.
pub const BASE_CHANNEL_MAX: u16 = 506;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Slot 0 carried something other than the dimmer start code.
    InvalidStartCode(u8),
    /// Base channel outside `BASE_CHANNEL_MIN..=BASE_CHANNEL_MAX`.
    InvalidBaseChannel(u16),
}

/// Values of the five consecutive slots a fixture listens to, in wire order.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelData {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// Master brightness, applied to the colors by [`ChannelData::apply_dimmer`].
    pub dimmer: u8,
    /// Strobe period selector, passed through to the actuation layer.
    pub flash: u8,
}

impl ChannelData {
    /// Scale the color slots by the master dimmer (255 = unity, floor
    /// division). Dimmer and flash pass through unchanged.
    #[inline]
    pub fn apply_dimmer(self) -> Self {
        // Widen before multiplying; 255 * 255 does not fit in u8 math.
        let scale = |color: u8| ((color as u32 * self.dimmer as u32) / 255) as u8;
        Self {
            red: scale(self.red),
            green: scale(self.green),
            blue: scale(self.blue),
            dimmer: self.dimmer,
            flash: self.flash,
        }
    }
}

/// Receive statistics since power-up or the last [`DmxReceiver::reset_stats`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames that passed the start-code check and were handed out.
    pub frames_decoded: u32,
    /// Frames rejected for a bad start code.
    pub frames_rejected: u32,
}

/// Receive side of the DMX line.
///
/// The core never owns the peripheral; board glue implements this for
/// whatever UART it wired up. Every event handler re-arms the next
/// single-byte reception through it before returning, otherwise the line
/// goes quiet.
pub trait DmxUart {
    /// Queue reception of the next byte. Must not block.
    fn arm_byte_receive(&mut self);
}

/// Raw frame store. Slot 0 is the start code, slots 1..=512 are channels
/// 1..=512. `fill` is the next slot to write; only a break resets it.
struct FrameBuf {
    slots: [u8; FRAME_LEN],
    fill: u16,
}

impl FrameBuf {
    const fn new() -> Self {
        Self {
            slots: [0; FRAME_LEN],
            fill: 0,
        }
    }
}

/// Receive and decode context for one DMX input.
///
/// Built to live in a `static` shared between two contexts: the UART
/// interrupt drives [`DmxReceiver::on_break`] and [`DmxReceiver::on_byte`],
/// the application loop polls [`DmxReceiver::take_frame_ready`] and calls
/// [`DmxReceiver::decode`]. The frame store sits behind a critical-section
/// mutex so the decode snapshot cannot be torn by a byte landing mid-copy;
/// the ready gate and counters are plain atomics.
pub struct DmxReceiver {
    frame: Mutex<CriticalSectionRawMutex, RefCell<FrameBuf>>,
    frame_ready: AtomicBool,
    base_channel: AtomicU16,
    frames_decoded: AtomicU32,
    frames_rejected: AtomicU32,
}

impl DmxReceiver {
    pub const fn new() -> Self {
        Self {
            frame: Mutex::new(RefCell::new(FrameBuf::new())),
            frame_ready: AtomicBool::new(false),
            base_channel: AtomicU16::new(BASE_CHANNEL_MIN),
            frames_decoded: AtomicU32::new(0),
            frames_rejected: AtomicU32::new(0),
        }
    }

    /// Reset the receive state, start listening and apply `base_channel`.
    ///
    /// Reception is armed even when the address is rejected; the previously
    /// active (default 1) base channel stays in effect in that case.
    pub fn init(&self, base_channel: u16, uart: &mut impl DmxUart) -> Result<(), Error> {
        self.frame.lock(|frame| {
            let mut frame = frame.borrow_mut();
            frame.slots = [0; FRAME_LEN];
            frame.fill = 0;
        });
        self.frame_ready.store(false, Ordering::Release);
        self.reset_stats();
        uart.arm_byte_receive();
        self.set_base_channel(base_channel)
    }

    /// Break handler. The UART reports a framing error when the line is held
    /// low past a byte time, which is how a frame start reaches software.
    /// Resynchronizes unconditionally: fill index to 0, ready gate down.
    pub fn on_break(&self, uart: &mut impl DmxUart) {
        self.frame.lock(|frame| frame.borrow_mut().fill = 0);
        self.frame_ready.store(false, Ordering::Release);
        uart.arm_byte_receive();
    }

    /// Byte handler. Stores the byte at the fill index and raises the ready
    /// gate once slot 512 lands. Bytes arriving on a full store (no break
    /// seen since) are dropped until the next resync.
    pub fn on_byte(&self, byte: u8, uart: &mut impl DmxUart) {
        let completed = self.frame.lock(|frame| {
            let mut frame = frame.borrow_mut();
            let at = frame.fill as usize;
            if at < FRAME_LEN {
                frame.slots[at] = byte;
                frame.fill += 1;
                frame.fill as usize == FRAME_LEN
            } else {
                false
            }
        });
        if completed {
            self.frame_ready.store(true, Ordering::Release);
        }
        uart.arm_byte_receive();
    }

    /// True exactly once per completed frame (atomic test-and-clear).
    pub fn take_frame_ready(&self) -> bool {
        self.frame_ready.swap(false, Ordering::AcqRel)
    }

    /// Validate the start code and snapshot the five slots at the configured
    /// base channel. The copy runs under the receive lock, so an interleaved
    /// break or byte cannot tear it. The frame store is left untouched.
    pub fn decode(&self) -> Result<ChannelData, Error> {
        let base = self.base_channel.load(Ordering::Relaxed) as usize;
        let (start, slots) = self.frame.lock(|frame| {
            let frame = frame.borrow();
            let mut slots = [0u8; FIXTURE_SLOTS];
            slots.copy_from_slice(&frame.slots[base..base + FIXTURE_SLOTS]);
            (frame.slots[0], slots)
        });
        if start != START_CODE {
            self.frames_rejected.fetch_add(1, Ordering::Relaxed);
            return Err(Error::InvalidStartCode(start));
        }
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
        let [red, green, blue, dimmer, flash] = slots;
        Ok(ChannelData {
            red,
            green,
            blue,
            dimmer,
            flash,
        })
    }

    /// Set the first of the five consecutive slots this fixture listens to.
    /// Out-of-range values are rejected and the previous setting stays
    /// active. Takes effect on the next decode.
    pub fn set_base_channel(&self, channel: u16) -> Result<(), Error> {
        if !(BASE_CHANNEL_MIN..=BASE_CHANNEL_MAX).contains(&channel) {
            return Err(Error::InvalidBaseChannel(channel));
        }
        self.base_channel.store(channel, Ordering::Relaxed);
        Ok(())
    }

    pub fn base_channel(&self) -> u16 {
        self.base_channel.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
        }
    }

    /// Zero both counters. Receive state and base channel are untouched.
    pub fn reset_stats(&self) {
        self.frames_decoded.store(0, Ordering::Relaxed);
        self.frames_rejected.store(0, Ordering::Relaxed);
    }
}
