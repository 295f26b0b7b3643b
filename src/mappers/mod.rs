//! Mapper implementations for NES cartridges
//!
//! The NES uses various memory mappers to expand the capabilities of the
//! hardware. This module provides implementations for mappers 0-4 and 7,
//! which cover a large percentage of the NES game library.

mod mapper000; // NROM
mod mapper001; // MMC1
mod mapper002; // UxROM
mod mapper003; // CNROM
mod mapper004; // MMC3
mod mapper007; // AxROM

pub use mapper000::Mapper000;
pub use mapper001::Mapper001;
pub use mapper002::Mapper002;
pub use mapper003::Mapper003;
pub use mapper004::Mapper004;
pub use mapper007::Mapper007;

use crate::cartridge::Mirroring;
use crate::errors::NesError;

/// Trait for NES mappers
///
/// A mapper translates CPU and PPU addresses into PRG/CHR storage offsets
/// according to its current bank configuration. All storage is owned by the
/// mapper instance.
pub trait Mapper {
    /// Read from PRG ROM/RAM (CPU address space, $4020-$FFFF)
    fn read_prg(&self, addr: u16) -> u8;

    /// Write to PRG RAM or mapper control registers
    fn write_prg(&mut self, addr: u16, value: u8);

    /// Read from CHR ROM/RAM (PPU address space, $0000-$1FFF)
    fn read_chr(&self, addr: u16) -> u8;

    /// Write to CHR RAM; ignored for CHR ROM
    fn write_chr(&mut self, addr: u16, value: u8);

    /// Get the current nametable mirroring mode
    fn mirroring(&self) -> Mirroring;

    /// Notify the mapper that the PPU completed a rendered scanline
    fn notify_scanline(&mut self) {}

    /// Check if the mapper has raised an IRQ
    fn irq_triggered(&self) -> bool {
        false
    }

    /// Acknowledge and clear a pending IRQ
    fn acknowledge_irq(&mut self) {}
}

/// Create a new mapper instance based on mapper number
///
/// An empty `chr_rom` means the cartridge uses 8KB of CHR RAM instead.
pub fn create_mapper(
    mapper_id: u8,
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    mirroring: Mirroring,
) -> Result<Box<dyn Mapper>, NesError> {
    match mapper_id {
        0 => Ok(Box::new(Mapper000::new(prg_rom, chr_rom, mirroring))),
        1 => Ok(Box::new(Mapper001::new(prg_rom, chr_rom, mirroring))),
        2 => Ok(Box::new(Mapper002::new(prg_rom, chr_rom, mirroring))),
        3 => Ok(Box::new(Mapper003::new(prg_rom, chr_rom, mirroring))),
        4 => Ok(Box::new(Mapper004::new(prg_rom, chr_rom, mirroring))),
        7 => Ok(Box::new(Mapper007::new(prg_rom, chr_rom, mirroring))),
        _ => Err(NesError::UnsupportedMapper(mapper_id)),
    }
}
