//! famicore - a cycle-accurate NES emulation core
//!
//! This crate implements the heart of a Nintendo Entertainment System
//! emulator: the Picture Processing Unit with its 341-cycle by 262-scanline
//! state machine, the cartridge memory-mapper subsystem (mappers 0-4 and 7),
//! the system bus, and the controller ports. One call to
//! [`NesSystem::run_frame`] produces a 256x240 indexed-color frame.
//!
//! The 6502 CPU core is an external collaborator: hosts plug one in through
//! the [`Cpu`] trait and the core drives it one clock at a time, three PPU
//! ticks per CPU cycle. Display, audio and input frontends live outside
//! this crate; the framebuffer holds palette indices that the host converts
//! to pixels with [`NTSC_PALETTE`].

mod bus;
mod cartridge;
mod controller;
mod cpu;
mod errors;
mod mappers;
mod nes;
mod ppu;

pub use bus::Bus;
pub use cartridge::{Cartridge, Mirroring};
pub use controller::{Buttons, Controller};
pub use cpu::{Cpu, CpuBus};
pub use errors::NesError;
pub use mappers::{create_mapper, Mapper};
pub use nes::NesSystem;
pub use ppu::{
    Ppu, Rgb, FRAME_BUFFER_SIZE, NTSC_PALETTE, SCREEN_HEIGHT, SCREEN_WIDTH,
};
