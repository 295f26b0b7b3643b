//! Emulator core errors
//!
//! All errors the core can produce. Construction-time failures (ROM parsing,
//! mapper selection) abort system construction; after construction the core
//! never errors except for host misuse of the controller API.

use thiserror::Error;

/// Errors produced by the emulation core
#[derive(Error, Debug)]
pub enum NesError {
    /// The ROM image does not start with the iNES magic `NES\x1A`
    #[error("invalid iNES header magic")]
    BadInesMagic,

    /// The declared PRG/CHR sizes exceed the supplied byte buffer
    #[error("ROM image truncated: need {needed} bytes, got {actual}")]
    TruncatedRom { needed: usize, actual: usize },

    /// Mapper id outside the supported set {0, 1, 2, 3, 4, 7}
    #[error("unsupported mapper: {0}")]
    UnsupportedMapper(u8),

    /// Controller index outside 0..2
    #[error("controller index out of range: {0}")]
    BadControllerIndex(usize),
}
