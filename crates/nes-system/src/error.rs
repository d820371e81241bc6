//! Cartridge loading errors.

use std::error::Error;
use std::fmt;

/// Why a ROM image could not be turned into a runnable cartridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Shorter than the 16-byte iNES header.
    TooShort { actual: usize },
    /// The magic bytes are not `NES\x1a`.
    BadMagic,
    /// The header promises more PRG/CHR data than the file contains.
    Truncated { expected: usize, actual: usize },
    /// The mapper number is one this machine has no implementation for.
    UnsupportedMapper(u8),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { actual } => {
                write!(f, "ROM image is {actual} bytes, shorter than the iNES header")
            }
            Self::BadMagic => write!(f, "missing NES<1A> magic, not an iNES image"),
            Self::Truncated { expected, actual } => {
                write!(f, "ROM image truncated: header promises {expected} bytes, file has {actual}")
            }
            Self::UnsupportedMapper(id) => write!(f, "unsupported mapper {id}"),
        }
    }
}

impl Error for LoadError {}
