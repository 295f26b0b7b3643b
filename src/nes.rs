//! NES system implementation
//!
//! This module ties together the CPU, bus, PPU, cartridge and controllers
//! into one deterministic, tick-synchronous machine. The CPU core itself is
//! supplied by the host through the [`Cpu`] trait.

use std::path::Path;

use anyhow::Context;
use log::info;

use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::controller::Buttons;
use crate::cpu::{Cpu, CpuBus};
use crate::errors::NesError;
use crate::ppu::FRAME_BUFFER_SIZE;

/// Number of controller ports
const CONTROLLER_PORTS: usize = 2;

/// The complete NES system
///
/// Owns the CPU and the bus; the bus in turn owns the PPU, cartridge and
/// controllers, so ownership forms a simple tree with no back-references.
pub struct NesSystem<C> {
    /// 6502-family CPU core (external)
    cpu: C,

    /// System bus
    bus: Bus,

    /// Total CPU cycles executed
    cycles: u64,
}

impl<C: Cpu<Bus>> NesSystem<C> {
    /// Build a system from an iNES image already in memory
    pub fn from_ines_bytes(cpu: C, rom: &[u8]) -> Result<Self, NesError> {
        let cartridge = Cartridge::from_bytes(rom)?;
        Ok(NesSystem {
            cpu,
            bus: Bus::new(cartridge),
            cycles: 0,
        })
    }

    /// Build a system from an iNES ROM file
    pub fn from_file<P: AsRef<Path>>(cpu: C, path: P) -> anyhow::Result<Self> {
        let rom = std::fs::read(&path)
            .with_context(|| format!("Failed to read ROM file: {}", path.as_ref().display()))?;

        let system = Self::from_ines_bytes(cpu, &rom)
            .with_context(|| format!("Failed to load ROM: {}", path.as_ref().display()))?;

        info!("Loaded ROM: {}", path.as_ref().display());
        Ok(system)
    }

    /// Reset the system to its power-on state
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        self.cycles = 0;
    }

    /// Execute one CPU cycle
    ///
    /// The CPU core sequences its own multi-cycle instructions; each call
    /// advances the whole machine by exactly one CPU clock (three PPU
    /// ticks), then forwards any latched interrupt signals to the CPU.
    pub fn step(&mut self) {
        self.cpu.step(&mut self.bus);
        self.bus.clock();

        if self.bus.ppu.take_nmi() {
            self.cpu.nmi();
        }

        if self.bus.cartridge().mapper().irq_triggered() {
            self.cpu.irq();
            self.bus.cartridge_mut().mapper_mut().acknowledge_irq();
        }

        self.cycles += 1;
    }

    /// Run until the PPU finishes rendering one frame (~29,781 CPU cycles)
    pub fn run_frame(&mut self) {
        self.bus.ppu.clear_frame_complete();
        while !self.bus.ppu.frame_complete() {
            self.step();
        }
    }

    /// The rendered frame: 256x240 palette indices (0-63)
    pub fn framebuffer(&self) -> &[u8; FRAME_BUFFER_SIZE] {
        self.bus.ppu.framebuffer()
    }

    /// Update the button state of a controller (0 or 1)
    pub fn set_controller(&mut self, index: usize, buttons: Buttons) -> Result<(), NesError> {
        if index >= CONTROLLER_PORTS {
            return Err(NesError::BadControllerIndex(index));
        }
        self.bus.controller_mut(index).set_buttons(buttons);
        Ok(())
    }

    /// Total CPU cycles executed since power-on or the last reset
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Access the system bus (PPU, cartridge and controllers hang off it)
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Mutable access to the system bus, for direct harness reads/writes
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Access the CPU core
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    /// Read a byte from the CPU address space
    ///
    /// Register side effects apply exactly as if the CPU performed the read.
    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    /// Write a byte to the CPU address space
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value);
    }
}
