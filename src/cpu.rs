//! CPU interface for the Ricoh 2A03 (modified MOS 6502)
//!
//! The CPU core itself is an external dependency; this module defines the
//! seam it plugs into. The core sees memory only through [`CpuBus`], and the
//! system drives it one clock at a time through [`Cpu::step`] — multi-cycle
//! instruction sequencing is the core's own bookkeeping.

/// Memory interface the CPU operates on.
///
/// Reads are `&mut self` because several NES registers mutate on read
/// (PPUSTATUS clears the vblank flag and write latch, PPUDATA advances the
/// VRAM address, controller reads shift out a bit).
pub trait CpuBus {
    /// Read a byte from the given address.
    fn read(&mut self, addr: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, addr: u16, value: u8);
}

/// A 6502-family CPU core.
///
/// The type parameter `B` is the bus type this CPU operates on.
pub trait Cpu<B: CpuBus> {
    /// Advance the CPU by one clock.
    ///
    /// The core is expected to track where it is inside a multi-cycle
    /// instruction; the system calls this exactly once per CPU cycle.
    fn step(&mut self, bus: &mut B);

    /// Reset the CPU to its power-on state (fetches the reset vector
    /// from $FFFC/$FFFD).
    fn reset(&mut self, bus: &mut B);

    /// Signal a non-maskable interrupt. Level-latched; the core services
    /// it at the next instruction boundary.
    fn nmi(&mut self);

    /// Signal a maskable interrupt. Level-latched; serviced when the
    /// interrupt-disable flag allows.
    fn irq(&mut self);
}
