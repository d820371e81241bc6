//! Regional timing variants.

/// Video region, which fixes the CPU clock and the frame geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NesRegion {
    #[default]
    Ntsc,
    Pal,
}

impl NesRegion {
    /// CPU clock in Hz (master crystal divided by 12 for NTSC, 16 for PAL).
    #[must_use]
    pub const fn cpu_hz(self) -> u32 {
        match self {
            Self::Ntsc => 1_789_773,
            Self::Pal => 1_662_607,
        }
    }

    /// Total scanlines per frame, pre-render line included.
    #[must_use]
    pub const fn scanlines_per_frame(self) -> u16 {
        match self {
            Self::Ntsc => 262,
            Self::Pal => 312,
        }
    }

    /// CPU cycles per frame: scanlines x 341 dots at 3 dots per cycle.
    #[must_use]
    pub const fn cycles_per_frame(self) -> u32 {
        match self {
            Self::Ntsc => 29_781,
            Self::Pal => 35_464,
        }
    }
}
