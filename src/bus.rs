//! System bus implementation for the NES
//!
//! The NES has a 16-bit CPU address space with various memory-mapped
//! components. This module implements the bus that connects them and
//! advances the PPU and OAM DMA engine with each CPU cycle.
//!
//! CPU memory map:
//! - 0x0000 - 0x1FFF: 2KB internal RAM, mirrored every 2KB
//! - 0x2000 - 0x3FFF: PPU registers, mirrored every 8 bytes
//! - 0x4014: OAM DMA trigger (write only)
//! - 0x4016: Controller strobe (write) / controller 1 data (read)
//! - 0x4017: Controller 2 data (read)
//! - 0x4020 - 0xFFFF: Cartridge space (PRG ROM, PRG RAM, mapper registers)

use log::trace;

use crate::cartridge::Cartridge;
use crate::controller::Controller;
use crate::cpu::CpuBus;
use crate::ppu::Ppu;

/// Size of the internal RAM (2KB)
const RAM_SIZE: usize = 0x0800;

/// OAM DMA engine state
///
/// A write to $4014 copies a 256-byte page into OAM through $2004. The
/// transfer costs one dummy alignment cycle plus alternating read/write
/// cycles, 513 CPU cycles in total.
#[derive(Debug, Default)]
struct OamDma {
    /// Transfer in progress
    active: bool,

    /// Source page (high byte of the source address)
    page: u8,

    /// Index of the byte currently being transferred
    addr: u8,

    /// Byte latched by the read cycle, written on the next cycle
    data: u8,

    /// Write cycle next (false = read cycle next)
    write_phase: bool,

    /// Dummy alignment cycle still pending
    dummy: bool,
}

/// The system bus connecting CPU, RAM, PPU, controllers and cartridge
pub struct Bus {
    /// Internal RAM (2KB, mirrored to fill $0000-$1FFF)
    ram: [u8; RAM_SIZE],

    /// Picture Processing Unit
    pub ppu: Ppu,

    /// Loaded cartridge (owns the mapper)
    cartridge: Cartridge,

    /// Controllers at $4016/$4017
    controllers: [Controller; 2],

    /// OAM DMA state
    dma: OamDma,
}

impl Bus {
    /// Create a new bus around a loaded cartridge
    pub fn new(cartridge: Cartridge) -> Self {
        Bus {
            ram: [0; RAM_SIZE],
            ppu: Ppu::new(),
            cartridge,
            controllers: [Controller::new(), Controller::new()],
            dma: OamDma::default(),
        }
    }

    /// Reset bus-side state (RAM contents survive, as on hardware)
    pub fn reset(&mut self) {
        self.ppu.reset();
        self.dma = OamDma::default();
        self.controllers[0].reset();
        self.controllers[1].reset();
    }

    /// Advance the bus by one CPU cycle
    ///
    /// Runs the PPU at 3x the CPU rate and moves one DMA cycle if a
    /// transfer is in progress.
    pub fn clock(&mut self) {
        for _ in 0..3 {
            self.ppu.clock(self.cartridge.mapper_mut());
        }

        if self.dma.active {
            self.clock_dma();
        }
    }

    fn clock_dma(&mut self) {
        if self.dma.dummy {
            self.dma.dummy = false;
            return;
        }

        if !self.dma.write_phase {
            let addr = ((self.dma.page as u16) << 8) | self.dma.addr as u16;
            self.dma.data = self.read(addr);
            self.dma.write_phase = true;
        } else {
            let data = self.dma.data;
            self.ppu
                .write_register(0x2004, data, self.cartridge.mapper_mut());
            self.dma.write_phase = false;

            self.dma.addr = self.dma.addr.wrapping_add(1);
            if self.dma.addr == 0 {
                self.dma.active = false;
            }
        }
    }

    /// True while an OAM DMA transfer is in progress
    pub fn dma_active(&self) -> bool {
        self.dma.active
    }

    /// Access the loaded cartridge
    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    /// Mutable access to the loaded cartridge
    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    /// Access a controller (0 or 1)
    pub fn controller_mut(&mut self, index: usize) -> &mut Controller {
        &mut self.controllers[index]
    }
}

impl CpuBus for Bus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Internal RAM and mirrors
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],

            // PPU registers, mirrored every 8 bytes
            0x2000..=0x3FFF => {
                let port = 0x2000 | (addr & 0x0007);
                self.ppu.read_register(port, self.cartridge.mapper())
            }

            // Controller shift-out
            0x4016 => self.controllers[0].read(),
            0x4017 => self.controllers[1].read(),

            // Cartridge space
            0x4020..=0xFFFF => self.cartridge.mapper().read_prg(addr),

            // Unmapped APU/IO range reads as open bus (modeled as 0)
            _ => {
                trace!("Read from unmapped address: ${:04X}", addr);
                0
            }
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // Internal RAM and mirrors
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,

            // PPU registers, mirrored every 8 bytes
            0x2000..=0x3FFF => {
                let port = 0x2000 | (addr & 0x0007);
                self.ppu
                    .write_register(port, value, self.cartridge.mapper_mut());
            }

            // OAM DMA trigger
            0x4014 => {
                self.dma.page = value;
                self.dma.addr = 0;
                self.dma.data = 0;
                self.dma.write_phase = false;
                self.dma.dummy = true;
                self.dma.active = true;
            }

            // Controller strobe goes to both ports
            0x4016 => {
                self.controllers[0].write(value);
                self.controllers[1].write(value);
            }

            // Cartridge space
            0x4020..=0xFFFF => self.cartridge.mapper_mut().write_prg(addr, value),

            // Unmapped APU/IO range: writes are dropped
            _ => {
                trace!("Write to unmapped address: ${:04X} = ${:02X}", addr, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_bus() -> Bus {
        let mut rom = vec![0u8; 16 + 16 * 1024 + 8 * 1024];
        rom[0..4].copy_from_slice(b"NES\x1A");
        rom[4] = 1;
        rom[5] = 1;
        Bus::new(Cartridge::from_bytes(&rom).unwrap())
    }

    #[test]
    fn ram_is_mirrored_every_2kb() {
        let mut bus = test_bus();
        bus.write(0x0000, 0x12);
        assert_eq!(bus.read(0x0800), 0x12);
        assert_eq!(bus.read(0x1000), 0x12);
        assert_eq!(bus.read(0x1800), 0x12);
    }

    #[test]
    fn ppu_ports_are_mirrored_every_8_bytes() {
        let mut bus = test_bus();
        // $2006 mirror at $3FFE/$3FF6: set an address, then check v
        bus.write(0x3FFE, 0x21);
        bus.write(0x2006, 0x08);
        assert_eq!(bus.ppu.vram_address(), 0x2108);
    }

    #[test]
    fn oam_dma_copies_a_full_page() {
        let mut bus = test_bus();
        // Fill RAM page $02 with a known pattern
        for i in 0..256u16 {
            bus.write(0x0200 + i, i as u8);
        }
        bus.write(0x2003, 0x00); // OAMADDR = 0
        bus.write(0x4014, 0x02);

        assert!(bus.dma_active());
        let mut cycles = 0;
        while bus.dma_active() {
            bus.clock();
            cycles += 1;
        }
        assert_eq!(cycles, 513);

        // Read OAM back through $2004
        for i in 0..=255u8 {
            bus.write(0x2003, i);
            assert_eq!(bus.read(0x2004), i);
        }
    }

    #[test]
    fn controllers_are_strobed_together() {
        let mut bus = test_bus();
        bus.controller_mut(0).set_buttons(crate::controller::Buttons::A);
        bus.controller_mut(1)
            .set_buttons(crate::controller::Buttons::B);

        bus.write(0x4016, 1);
        bus.write(0x4016, 0);

        assert_eq!(bus.read(0x4016) & 1, 1); // controller 1: A
        assert_eq!(bus.read(0x4017) & 1, 0); // controller 2: A not pressed
        assert_eq!(bus.read(0x4017) & 1, 1); // controller 2: B
    }

    #[test]
    fn unmapped_io_reads_zero_and_drops_writes() {
        let mut bus = test_bus();
        bus.write(0x4000, 0xFF);
        assert_eq!(bus.read(0x4000), 0);
        assert_eq!(bus.read(0x4014), 0);
    }
}
