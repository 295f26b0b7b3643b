//! Mapper 004 (MMC3) implementation
//!
//! This mapper features fine-grained PRG and CHR banking plus a scanline
//! counter that can raise IRQs, used by games for raster splits.
//! Used by games like Super Mario Bros. 2/3, Mega Man 3-6, Kirby's Adventure.
//!
//! Memory map:
//! - PRG RAM: 8KB (0x6000-0x7FFF), enable/write-protect bits
//! - PRG ROM: four 8KB windows; $E000 fixed to the last bank, $A000 always
//!   R7, and the PRG mode bit swaps which of $8000/$C000 is R6 and which is
//!   pinned to the second-to-last bank
//! - CHR: two 2KB windows + four 1KB windows, arrangement flipped by the
//!   CHR mode (A12 inversion) bit
//!
//! Registers (all at $8000-$FFFF, selected by address bits 13-14 and bit 0):
//! - $8000/$8001: bank select / bank data
//! - $A000/$A001: mirroring / PRG RAM protect
//! - $C000/$C001: IRQ latch / IRQ reload
//! - $E000/$E001: IRQ disable / IRQ enable

use log::debug;

use crate::cartridge::Mirroring;
use super::Mapper;

/// 8KB PRG bank size
const PRG_BANK_SIZE: usize = 8 * 1024;

/// 1KB CHR bank size
const CHR_BANK_SIZE: usize = 1024;

pub struct Mapper004 {
    /// PRG ROM data
    prg_rom: Vec<u8>,

    /// CHR ROM/RAM data
    chr: Vec<u8>,

    /// PRG RAM data
    prg_ram: Vec<u8>,

    /// Whether CHR is RAM (writable) or ROM (read-only)
    chr_is_ram: bool,

    /// Number of 8KB PRG banks
    prg_banks: u8,

    /// Which bank register the next bank-data write updates (0-7)
    bank_select: u8,

    /// PRG bank mode (0 or 1)
    prg_mode: u8,

    /// CHR bank mode / A12 inversion (0 or 1)
    chr_mode: u8,

    /// Bank registers R0-R7
    registers: [u8; 8],

    /// Mirroring mode
    mirroring: Mirroring,

    /// PRG RAM chip enable
    prg_ram_enabled: bool,

    /// PRG RAM write protect
    prg_ram_write_protect: bool,

    /// IRQ counter reload value
    irq_latch: u8,

    /// IRQ counter (counts down once per scanline)
    irq_counter: u8,

    /// IRQ enabled flag
    irq_enabled: bool,

    /// IRQ pending flag
    irq_pending: bool,

    /// Reload flag (true = reload counter on next clock)
    irq_reload: bool,
}

impl Mapper004 {
    /// Create a new Mapper004 instance
    pub fn new(prg_rom: Vec<u8>, chr_rom: Vec<u8>, mirroring: Mirroring) -> Self {
        let chr_is_ram = chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0; 8 * 1024]
        } else {
            chr_rom
        };

        Mapper004 {
            prg_banks: (prg_rom.len() / PRG_BANK_SIZE) as u8,
            prg_rom,
            chr,
            prg_ram: vec![0; 8 * 1024],
            chr_is_ram,
            bank_select: 0,
            prg_mode: 0,
            chr_mode: 0,
            registers: [0; 8],
            mirroring,
            prg_ram_enabled: true,
            prg_ram_write_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_enabled: false,
            irq_pending: false,
            irq_reload: false,
        }
    }

    /// Resolve a CPU address to a PRG ROM offset through the current banks
    fn prg_offset(&self, addr: u16) -> usize {
        let second_last = self.prg_banks.saturating_sub(2);
        let bank = match addr {
            0x8000..=0x9FFF => {
                if self.prg_mode == 0 {
                    self.registers[6]
                } else {
                    second_last
                }
            }
            0xA000..=0xBFFF => self.registers[7],
            0xC000..=0xDFFF => {
                if self.prg_mode == 0 {
                    second_last
                } else {
                    self.registers[6]
                }
            }
            _ => self.prg_banks.saturating_sub(1),
        };
        bank as usize * PRG_BANK_SIZE + (addr & 0x1FFF) as usize
    }

    /// Resolve a PPU address to a CHR offset through the current banks
    ///
    /// R0/R1 address 2KB pairs, so their bit 0 is ignored.
    fn chr_offset(&self, addr: u16) -> usize {
        let (bank, within) = if self.chr_mode == 0 {
            // 2KB banks at $0000, 1KB banks at $1000
            match addr {
                0x0000..=0x07FF => (self.registers[0] & 0xFE, addr & 0x07FF),
                0x0800..=0x0FFF => (self.registers[1] & 0xFE, addr & 0x07FF),
                0x1000..=0x13FF => (self.registers[2], addr & 0x03FF),
                0x1400..=0x17FF => (self.registers[3], addr & 0x03FF),
                0x1800..=0x1BFF => (self.registers[4], addr & 0x03FF),
                _ => (self.registers[5], addr & 0x03FF),
            }
        } else {
            // Inverted: 1KB banks at $0000, 2KB banks at $1000
            match addr {
                0x0000..=0x03FF => (self.registers[2], addr & 0x03FF),
                0x0400..=0x07FF => (self.registers[3], addr & 0x03FF),
                0x0800..=0x0BFF => (self.registers[4], addr & 0x03FF),
                0x0C00..=0x0FFF => (self.registers[5], addr & 0x03FF),
                0x1000..=0x17FF => (self.registers[0] & 0xFE, addr & 0x07FF),
                _ => (self.registers[1] & 0xFE, addr & 0x07FF),
            }
        };
        bank as usize * CHR_BANK_SIZE + within as usize
    }
}

impl Mapper for Mapper004 {
    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled {
                    self.prg_ram[(addr & 0x1FFF) as usize]
                } else {
                    0
                }
            }
            0x8000..=0xFFFF => {
                let offset = self.prg_offset(addr);
                if offset < self.prg_rom.len() {
                    self.prg_rom[offset]
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled && !self.prg_ram_write_protect {
                    self.prg_ram[(addr & 0x1FFF) as usize] = value;
                }
            }
            0x8000..=0x9FFF => {
                if addr & 0x01 == 0 {
                    // Bank select
                    self.bank_select = value & 0x07;
                    self.prg_mode = (value >> 6) & 0x01;
                    self.chr_mode = (value >> 7) & 0x01;
                } else {
                    // Bank data
                    self.registers[self.bank_select as usize] = value;
                    debug!(
                        "MMC3 bank data: R{} = ${:02X} (prg_mode={}, chr_mode={})",
                        self.bank_select, value, self.prg_mode, self.chr_mode
                    );
                }
            }
            0xA000..=0xBFFF => {
                if addr & 0x01 == 0 {
                    // Mirroring
                    self.mirroring = if (value & 0x01) == 0 {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    };
                } else {
                    // PRG RAM protect
                    self.prg_ram_write_protect = (value & 0x40) != 0;
                    self.prg_ram_enabled = (value & 0x80) != 0;
                }
            }
            0xC000..=0xDFFF => {
                if addr & 0x01 == 0 {
                    // IRQ latch
                    self.irq_latch = value;
                } else {
                    // IRQ reload
                    self.irq_counter = 0;
                    self.irq_reload = true;
                }
            }
            0xE000..=0xFFFF => {
                if addr & 0x01 == 0 {
                    // IRQ disable
                    self.irq_enabled = false;
                    self.irq_pending = false;
                } else {
                    // IRQ enable
                    self.irq_enabled = true;
                }
            }
            _ => {}
        }
    }

    fn read_chr(&self, addr: u16) -> u8 {
        let offset = self.chr_offset(addr);
        if offset < self.chr.len() {
            self.chr[offset]
        } else {
            0
        }
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        if !self.chr_is_ram {
            return;
        }
        let offset = self.chr_offset(addr);
        if offset < self.chr.len() {
            self.chr[offset] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn notify_scanline(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn irq_triggered(&self) -> bool {
        self.irq_pending
    }

    fn acknowledge_irq(&mut self) {
        self.irq_pending = false;
    }
}
