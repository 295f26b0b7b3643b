//! NES cartridge implementation
//!
//! This module handles the NES cartridge format (iNES), including header
//! parsing and mapper instantiation. The NES uses a cartridge system with
//! separate PRG ROM (program code) and CHR ROM/RAM (character/graphics data).

use std::fmt;
use log::info;

use crate::errors::NesError;
use crate::mappers::{create_mapper, Mapper};

/// Size of the iNES header
const INES_HEADER_SIZE: usize = 16;

/// Size of the optional trainer blob between header and PRG ROM
const TRAINER_SIZE: usize = 512;

/// Size of a PRG ROM bank (16KB)
const PRG_ROM_BANK_SIZE: usize = 16 * 1024;

/// Size of a CHR ROM bank (8KB)
const CHR_ROM_BANK_SIZE: usize = 8 * 1024;

/// iNES header magic number ("NES\x1A")
const INES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

/// Mirroring modes for the NES
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    /// Horizontal mirroring (vertical arrangement of nametables)
    Horizontal,

    /// Vertical mirroring (horizontal arrangement of nametables)
    Vertical,

    /// Single-screen mirroring, lower bank
    SingleLow,

    /// Single-screen mirroring, upper bank
    SingleHigh,

    /// Four-screen mirroring (no mirroring; needs cartridge VRAM)
    FourScreen,
}

/// Represents a loaded NES cartridge
///
/// The cartridge owns its mapper, which in turn owns all PRG/CHR storage.
pub struct Cartridge {
    /// Bank-switching logic and ROM/RAM storage
    mapper: Box<dyn Mapper>,

    /// Mapper number from the header
    mapper_id: u8,

    /// Number of 16KB PRG ROM banks
    prg_banks: u8,

    /// Number of 8KB CHR ROM banks (0 means CHR RAM)
    chr_banks: u8,

    /// Whether battery-backed PRG RAM is present
    has_battery: bool,
}

impl Cartridge {
    /// Parse an iNES image from an in-memory byte buffer and instantiate
    /// the matching mapper.
    pub fn from_bytes(data: &[u8]) -> Result<Self, NesError> {
        if data.len() < INES_HEADER_SIZE {
            return Err(NesError::TruncatedRom {
                needed: INES_HEADER_SIZE,
                actual: data.len(),
            });
        }
        if data[0..4] != INES_MAGIC {
            return Err(NesError::BadInesMagic);
        }

        let prg_banks = data[4];
        let chr_banks = data[5];

        let flags6 = data[6];
        let flags7 = data[7];

        let mirroring = if (flags6 & 0x08) != 0 {
            Mirroring::FourScreen
        } else if (flags6 & 0x01) != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let has_battery = (flags6 & 0x02) != 0;
        let has_trainer = (flags6 & 0x04) != 0;

        // Mapper number is split across flags 6 and 7
        let mapper_id = (flags7 & 0xF0) | ((flags6 >> 4) & 0x0F);

        // A 512-byte trainer sits between the header and PRG ROM; skip it
        let trainer_size = if has_trainer { TRAINER_SIZE } else { 0 };

        let prg_size = prg_banks as usize * PRG_ROM_BANK_SIZE;
        let chr_size = chr_banks as usize * CHR_ROM_BANK_SIZE;

        let expected = INES_HEADER_SIZE + trainer_size + prg_size + chr_size;
        if data.len() < expected {
            return Err(NesError::TruncatedRom {
                needed: expected,
                actual: data.len(),
            });
        }

        let prg_start = INES_HEADER_SIZE + trainer_size;
        let prg_rom = data[prg_start..prg_start + prg_size].to_vec();

        // CHR bank count of zero means the cartridge carries 8KB of CHR RAM
        // instead; the mapper allocates it when handed an empty CHR buffer.
        let chr_rom = data[prg_start + prg_size..prg_start + prg_size + chr_size].to_vec();

        let mapper = create_mapper(mapper_id, prg_rom, chr_rom, mirroring)?;

        info!(
            "Loaded cartridge - Mapper: {}, PRG ROM: {}KB, CHR {}: {}KB, Mirroring: {:?}, Battery: {}",
            mapper_id,
            prg_size / 1024,
            if chr_banks == 0 { "RAM" } else { "ROM" },
            if chr_banks == 0 { 8 } else { chr_size / 1024 },
            mirroring,
            has_battery
        );

        Ok(Cartridge {
            mapper,
            mapper_id,
            prg_banks,
            chr_banks,
            has_battery,
        })
    }

    /// Access the cartridge's mapper
    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    /// Mutable access to the cartridge's mapper
    pub fn mapper_mut(&mut self) -> &mut dyn Mapper {
        self.mapper.as_mut()
    }

    /// Mapper number from the header
    pub fn mapper_id(&self) -> u8 {
        self.mapper_id
    }

    /// Number of 16KB PRG ROM banks
    pub fn prg_banks(&self) -> u8 {
        self.prg_banks
    }

    /// Number of 8KB CHR ROM banks (0 means 8KB CHR RAM)
    pub fn chr_banks(&self) -> u8 {
        self.chr_banks
    }

    /// Whether battery-backed PRG RAM is present
    pub fn has_battery(&self) -> bool {
        self.has_battery
    }
}

impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cartridge")
            .field("mapper_id", &self.mapper_id)
            .field("prg_banks", &self.prg_banks)
            .field("chr_banks", &self.chr_banks)
            .field("mirroring", &self.mapper.mirroring())
            .field("has_battery", &self.has_battery)
            .finish()
    }
}
