//! Picture processing unit (2C02).
//!
//! The PPU is stepped one dot at a time, three dots per CPU cycle. A
//! frame is exactly 341 x 262 dots on NTSC (341 x 312 on PAL) with no
//! odd-frame dot skip. Rendering works a scanline at a time: at dot 0 of
//! each visible line the background and sprite pixels are gathered into
//! line buffers from the current scroll state, then composited into the
//! palette-index framebuffer as the dots advance.
//!
//! Scrolling uses the standard two-register scheme: `v` is the live VRAM
//! address, `t` the latched copy the CPU writes into, `fine_x` the
//! sub-tile horizontal offset, and a shared write latch distinguishes
//! first and second writes to $2005/$2006.

use crate::cartridge::Mirroring;
use crate::config::NesRegion;
use crate::mapper::Mapper;

pub const FRAME_WIDTH: usize = 256;
pub const FRAME_HEIGHT: usize = 240;

const DOTS_PER_SCANLINE: u16 = 341;
const VISIBLE_SCANLINES: u16 = 240;
const VBLANK_SCANLINE: u16 = 241;

mod ctrl {
    pub const NAMETABLE: u8 = 0x03;
    pub const VRAM_INCREMENT: u8 = 0x04;
    pub const SPRITE_PATTERN: u8 = 0x08;
    pub const BACKGROUND_PATTERN: u8 = 0x10;
    pub const SPRITE_SIZE: u8 = 0x20;
    pub const NMI_ENABLE: u8 = 0x80;
}

mod mask {
    pub const GREYSCALE: u8 = 0x01;
    pub const BACKGROUND_LEFT: u8 = 0x02;
    pub const SPRITE_LEFT: u8 = 0x04;
    pub const BACKGROUND_ENABLE: u8 = 0x08;
    pub const SPRITE_ENABLE: u8 = 0x10;
}

mod status {
    pub const SPRITE_OVERFLOW: u8 = 0x20;
    pub const SPRITE_ZERO_HIT: u8 = 0x40;
    pub const VBLANK: u8 = 0x80;
}

pub struct Ppu {
    ctrl: u8,
    mask: u8,
    status: u8,
    oam_addr: u8,
    oam: [u8; 256],
    nametable_ram: [u8; 2048],
    palette_ram: [u8; 32],

    v: u16,
    t: u16,
    fine_x: u8,
    write_latch: bool,
    read_buffer: u8,

    scanline: u16,
    dot: u16,
    scanlines_per_frame: u16,
    nmi_pending: bool,

    bg_color: [u8; FRAME_WIDTH],
    bg_opaque: [bool; FRAME_WIDTH],
    sprite_color: [u8; FRAME_WIDTH],
    sprite_opaque: [bool; FRAME_WIDTH],
    sprite_behind: [bool; FRAME_WIDTH],
    sprite_is_zero: [bool; FRAME_WIDTH],
    sprite_zero_line_hit: bool,
    sprite_zero_frame_latched: bool,

    framebuffer: [u8; FRAME_WIDTH * FRAME_HEIGHT],
}

impl Ppu {
    #[must_use]
    pub fn new(region: NesRegion) -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            oam: [0; 256],
            nametable_ram: [0; 2048],
            palette_ram: [0; 32],
            v: 0,
            t: 0,
            fine_x: 0,
            write_latch: false,
            read_buffer: 0,
            scanline: 0,
            dot: 0,
            scanlines_per_frame: region.scanlines_per_frame(),
            nmi_pending: false,
            bg_color: [0; FRAME_WIDTH],
            bg_opaque: [false; FRAME_WIDTH],
            sprite_color: [0; FRAME_WIDTH],
            sprite_opaque: [false; FRAME_WIDTH],
            sprite_behind: [false; FRAME_WIDTH],
            sprite_is_zero: [false; FRAME_WIDTH],
            sprite_zero_line_hit: false,
            sprite_zero_frame_latched: false,
            framebuffer: [0; FRAME_WIDTH * FRAME_HEIGHT],
        }
    }

    /// 6-bit palette indices, row-major 256x240.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8; FRAME_WIDTH * FRAME_HEIGHT] {
        &self.framebuffer
    }

    #[must_use]
    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    #[must_use]
    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Consume the pending NMI edge, if any.
    pub fn pull_nmi(&mut self) -> bool {
        let pending = self.nmi_pending;
        self.nmi_pending = false;
        pending
    }

    /// OAM DMA byte: store at the current OAM address and advance it.
    pub fn write_oam_dma(&mut self, value: u8) {
        self.oam[usize::from(self.oam_addr)] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    fn rendering_enabled(&self) -> bool {
        self.mask & (mask::BACKGROUND_ENABLE | mask::SPRITE_ENABLE) != 0
    }

    /// Advance one dot.
    pub fn tick(&mut self, mapper: &mut dyn Mapper) {
        let pre_render = self.scanlines_per_frame - 1;
        if self.scanline < VISIBLE_SCANLINES {
            if self.dot == 0 {
                self.render_background_line(mapper);
                self.render_sprite_line(mapper);
            }
            if self.dot < 256 {
                self.composite_pixel(usize::from(self.dot));
            }
            if self.dot == 257 {
                // Sprite-zero hit latches once per frame, at the end of
                // the line that produced it.
                if self.sprite_zero_line_hit && !self.sprite_zero_frame_latched {
                    self.status |= status::SPRITE_ZERO_HIT;
                    self.sprite_zero_frame_latched = true;
                }
                self.sprite_zero_line_hit = false;
            }
            if self.rendering_enabled() {
                if self.dot == 256 {
                    self.increment_y();
                } else if self.dot == 257 {
                    self.copy_horizontal();
                }
            }
        } else if self.scanline == VBLANK_SCANLINE && self.dot == 1 {
            self.status |= status::VBLANK;
            if self.ctrl & ctrl::NMI_ENABLE != 0 {
                self.nmi_pending = true;
            }
        } else if self.scanline == pre_render {
            if self.dot == 1 {
                self.status &=
                    !(status::VBLANK | status::SPRITE_ZERO_HIT | status::SPRITE_OVERFLOW);
                self.sprite_zero_frame_latched = false;
            } else if self.dot == 280 && self.rendering_enabled() {
                self.copy_vertical();
            }
        }

        self.dot += 1;
        if self.dot == DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline == self.scanlines_per_frame {
                self.scanline = 0;
            }
        }
    }

    /// CPU read of $2000-$2007 (index already masked to 0-7 by the bus).
    pub fn cpu_read(&mut self, register: u16, mapper: &mut dyn Mapper) -> u8 {
        match register {
            2 => {
                // Stale bus bits ride along in the low five.
                let value = (self.status & 0xE0) | (self.read_buffer & 0x1F);
                self.status &= !status::VBLANK;
                self.write_latch = false;
                value
            }
            4 => self.oam[usize::from(self.oam_addr)],
            7 => {
                let address = self.v & 0x3FFF;
                let value = if address >= 0x3F00 {
                    // Palette reads are direct; the buffer still refills
                    // from the nametable underneath.
                    self.read_buffer = self.nametable_read(address - 0x1000, mapper);
                    self.palette_ram[mirror_palette(address)]
                } else {
                    let stale = self.read_buffer;
                    self.read_buffer = self.ppu_read(address, mapper);
                    stale
                };
                self.v = self.v.wrapping_add(self.vram_increment());
                value
            }
            _ => self.read_buffer,
        }
    }

    /// CPU write of $2000-$2007.
    pub fn cpu_write(&mut self, register: u16, value: u8, mapper: &mut dyn Mapper) {
        match register {
            0 => {
                let was_enabled = self.ctrl & ctrl::NMI_ENABLE != 0;
                self.ctrl = value;
                self.t = (self.t & !0x0C00) | (u16::from(value & ctrl::NAMETABLE) << 10);
                // Turning NMI on mid-vblank raises the edge immediately.
                if !was_enabled
                    && value & ctrl::NMI_ENABLE != 0
                    && self.status & status::VBLANK != 0
                {
                    self.nmi_pending = true;
                }
            }
            1 => self.mask = value,
            3 => self.oam_addr = value,
            4 => {
                self.oam[usize::from(self.oam_addr)] = value;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            5 => {
                if self.write_latch {
                    // Second write: fine Y and coarse Y.
                    self.t = (self.t & !0x73E0)
                        | (u16::from(value & 0x07) << 12)
                        | (u16::from(value >> 3) << 5);
                } else {
                    self.t = (self.t & !0x001F) | u16::from(value >> 3);
                    self.fine_x = value & 0x07;
                }
                self.write_latch = !self.write_latch;
            }
            6 => {
                if self.write_latch {
                    self.t = (self.t & 0xFF00) | u16::from(value);
                    self.v = self.t;
                } else {
                    self.t = (self.t & 0x00FF) | (u16::from(value & 0x3F) << 8);
                }
                self.write_latch = !self.write_latch;
            }
            7 => {
                self.ppu_write(self.v & 0x3FFF, value, mapper);
                self.v = self.v.wrapping_add(self.vram_increment());
            }
            _ => {}
        }
    }

    fn vram_increment(&self) -> u16 {
        if self.ctrl & ctrl::VRAM_INCREMENT != 0 { 32 } else { 1 }
    }

    fn nametable_read(&self, address: u16, mapper: &dyn Mapper) -> u8 {
        self.nametable_ram[mirror_nametable(address, mapper.mirroring())]
    }

    fn ppu_read(&self, address: u16, mapper: &mut dyn Mapper) -> u8 {
        match address {
            0x0000..=0x1FFF => mapper.chr_read(address),
            0x2000..=0x3EFF => self.nametable_read(address, mapper),
            _ => self.palette_ram[mirror_palette(address)],
        }
    }

    fn ppu_write(&mut self, address: u16, value: u8, mapper: &mut dyn Mapper) {
        match address {
            0x0000..=0x1FFF => mapper.chr_write(address, value),
            0x2000..=0x3EFF => {
                self.nametable_ram[mirror_nametable(address, mapper.mirroring())] = value;
            }
            _ => self.palette_ram[mirror_palette(address)] = value,
        }
    }

    /// Gather one scanline of background pixels into the line buffers.
    ///
    /// Works on a scratch copy of `v`: 33 tile columns are fetched (one
    /// extra for the fine-X overlap) with coarse X incrementing across
    /// nametable boundaries, then the line is shifted left by fine X.
    fn render_background_line(&mut self, mapper: &mut dyn Mapper) {
        self.bg_color = [0; FRAME_WIDTH];
        self.bg_opaque = [false; FRAME_WIDTH];
        if self.mask & mask::BACKGROUND_ENABLE == 0 {
            return;
        }

        let fine_y = (self.v >> 12) & 0x07;
        let pattern_base = if self.ctrl & ctrl::BACKGROUND_PATTERN != 0 {
            0x1000
        } else {
            0x0000
        };
        let mirroring = mapper.mirroring();

        let mut v = self.v;
        let mut colors = [0u8; 33 * 8];
        let mut opaque = [false; 33 * 8];
        for column in 0..33usize {
            let tile_address = 0x2000 | (v & 0x0FFF);
            let tile = self.nametable_ram[mirror_nametable(tile_address, mirroring)];
            let attribute_address =
                0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
            let attribute = self.nametable_ram[mirror_nametable(attribute_address, mirroring)];
            // Which quadrant of the 32x32 attribute area this tile is in.
            let shift = ((v >> 4) & 0x04) | (v & 0x02);
            let palette_high = (attribute >> shift) & 0x03;

            let pattern_address = pattern_base + u16::from(tile) * 16 + fine_y;
            let low = mapper.chr_read(pattern_address);
            let high = mapper.chr_read(pattern_address + 8);
            for pixel in 0..8usize {
                let bit = 7 - pixel as u8;
                let value = (((high >> bit) & 1) << 1) | ((low >> bit) & 1);
                if value != 0 {
                    opaque[column * 8 + pixel] = true;
                    colors[column * 8 + pixel] =
                        self.palette_ram[usize::from(palette_high * 4 + value)] & 0x3F;
                }
            }
            v = increment_coarse_x(v);
        }

        let offset = usize::from(self.fine_x);
        self.bg_color.copy_from_slice(&colors[offset..offset + FRAME_WIDTH]);
        self.bg_opaque.copy_from_slice(&opaque[offset..offset + FRAME_WIDTH]);
    }

    /// Gather the sprites covering this scanline, at most eight, lower
    /// OAM indices winning pixel overlaps.
    fn render_sprite_line(&mut self, mapper: &mut dyn Mapper) {
        self.sprite_color = [0; FRAME_WIDTH];
        self.sprite_opaque = [false; FRAME_WIDTH];
        self.sprite_behind = [false; FRAME_WIDTH];
        self.sprite_is_zero = [false; FRAME_WIDTH];
        if self.mask & mask::SPRITE_ENABLE == 0 {
            return;
        }

        let height: u16 = if self.ctrl & ctrl::SPRITE_SIZE != 0 { 16 } else { 8 };
        let line = self.scanline;
        let mut found = 0;
        for index in 0..64usize {
            let y = u16::from(self.oam[index * 4]);
            if line < y || line >= y + height {
                continue;
            }
            found += 1;
            if found > 8 {
                self.status |= status::SPRITE_OVERFLOW;
                break;
            }
            let tile = self.oam[index * 4 + 1];
            let attributes = self.oam[index * 4 + 2];
            let x = self.oam[index * 4 + 3];

            let mut row = line - y;
            if attributes & 0x80 != 0 {
                row = height - 1 - row;
            }
            let pattern_address = if height == 16 {
                // Bit 0 of the tile byte picks the pattern table; the
                // bottom half is the next tile over.
                let table = u16::from(tile & 0x01) * 0x1000;
                let mut tile_index = u16::from(tile & 0xFE);
                if row >= 8 {
                    tile_index += 1;
                    row -= 8;
                }
                table + tile_index * 16 + row
            } else {
                let table = if self.ctrl & ctrl::SPRITE_PATTERN != 0 {
                    0x1000
                } else {
                    0x0000
                };
                table + u16::from(tile) * 16 + row
            };
            let low = mapper.chr_read(pattern_address);
            let high = mapper.chr_read(pattern_address + 8);

            for pixel in 0..8u8 {
                let bit = if attributes & 0x40 != 0 { pixel } else { 7 - pixel };
                let value = (((high >> bit) & 1) << 1) | ((low >> bit) & 1);
                if value == 0 {
                    continue;
                }
                let sx = usize::from(x) + usize::from(pixel);
                if sx >= FRAME_WIDTH {
                    break;
                }
                if self.sprite_opaque[sx] {
                    continue;
                }
                self.sprite_opaque[sx] = true;
                let palette_address = 0x3F10 + u16::from((attributes & 0x03) * 4 + value);
                self.sprite_color[sx] = self.palette_ram[mirror_palette(palette_address)] & 0x3F;
                self.sprite_behind[sx] = attributes & 0x20 != 0;
                self.sprite_is_zero[sx] = index == 0;
            }
        }
    }

    fn composite_pixel(&mut self, x: usize) {
        let bg = self.bg_opaque[x]
            && self.mask & mask::BACKGROUND_ENABLE != 0
            && (x >= 8 || self.mask & mask::BACKGROUND_LEFT != 0);
        let sprite = self.sprite_opaque[x]
            && self.mask & mask::SPRITE_ENABLE != 0
            && (x >= 8 || self.mask & mask::SPRITE_LEFT != 0);

        let color = match (bg, sprite) {
            (false, false) => self.palette_ram[0],
            (false, true) => self.sprite_color[x],
            (true, false) => self.bg_color[x],
            (true, true) => {
                // Sprite zero hit: both pipelines opaque, never at x=255.
                if self.sprite_is_zero[x] && x != 255 {
                    self.sprite_zero_line_hit = true;
                }
                if self.sprite_behind[x] {
                    self.bg_color[x]
                } else {
                    self.sprite_color[x]
                }
            }
        };

        let mut color = color & 0x3F;
        if self.mask & mask::GREYSCALE != 0 {
            color &= 0x30;
        }
        self.framebuffer[usize::from(self.scanline) * FRAME_WIDTH + x] = color;
    }

    fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
        } else {
            self.v &= !0x7000;
            let mut coarse_y = (self.v >> 5) & 0x1F;
            if coarse_y == 29 {
                coarse_y = 0;
                self.v ^= 0x0800;
            } else if coarse_y == 31 {
                coarse_y = 0;
            } else {
                coarse_y += 1;
            }
            self.v = (self.v & !0x03E0) | (coarse_y << 5);
        }
    }

    fn copy_horizontal(&mut self) {
        self.v = (self.v & !0x041F) | (self.t & 0x041F);
    }

    fn copy_vertical(&mut self) {
        self.v = (self.v & 0x041F) | (self.t & !0x041F);
    }
}

fn increment_coarse_x(mut v: u16) -> u16 {
    if v & 0x001F == 31 {
        v &= !0x001F;
        v ^= 0x0400;
    } else {
        v += 1;
    }
    v
}

/// Fold a nametable address into the console's 2KB of VRAM.
fn mirror_nametable(address: u16, mirroring: Mirroring) -> usize {
    let relative = usize::from(address - 0x2000) & 0x0FFF;
    let table = relative / 0x400;
    let offset = relative & 0x03FF;
    let physical = match mirroring {
        Mirroring::Horizontal => table / 2,
        Mirroring::Vertical => table % 2,
        Mirroring::SingleScreenLower => 0,
        Mirroring::SingleScreenUpper => 1,
        // True four-screen needs cartridge VRAM; alias into the 2KB.
        Mirroring::FourScreen => table % 2,
    };
    physical * 0x400 + offset
}

/// Fold $3F00-$3FFF into the 32 palette bytes. The sprite backdrop
/// mirrors ($3F10/$14/$18/$1C) alias their background counterparts.
fn mirror_palette(address: u16) -> usize {
    let index = usize::from(address) & 0x1F;
    if index >= 0x10 && index % 4 == 0 {
        index - 0x10
    } else {
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{Cartridge, CartridgeHeader};
    use crate::mapper::{self, Mapper};

    fn make_mapper(mirroring: Mirroring) -> Box<dyn Mapper> {
        mapper::create(Cartridge {
            header: CartridgeHeader {
                prg_pages: 1,
                chr_pages: 0,
                mapper_id: 0,
                mirroring,
                has_battery: false,
                has_trainer: false,
            },
            prg: vec![0; 16 * 1024],
            chr: vec![0; 8 * 1024],
            chr_is_ram: true,
        })
        .unwrap()
    }

    fn tick_n(ppu: &mut Ppu, mapper: &mut Box<dyn Mapper>, n: u32) {
        for _ in 0..n {
            ppu.tick(mapper.as_mut());
        }
    }

    #[test]
    fn frame_is_exactly_341_by_262_dots() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        assert_eq!((ppu.scanline(), ppu.dot()), (0, 0));
        tick_n(&mut ppu, &mut mapper, 341 * 262);
        assert_eq!((ppu.scanline(), ppu.dot()), (0, 0));
        // Pre-render cleared every status flag on the way around.
        assert_eq!(ppu.status, 0);
    }

    #[test]
    fn vblank_sets_at_241_and_clears_on_pre_render() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        tick_n(&mut ppu, &mut mapper, 241 * 341 + 2);
        assert!(ppu.status & status::VBLANK != 0);
        tick_n(&mut ppu, &mut mapper, 20 * 341);
        assert!(ppu.status & status::VBLANK == 0);
    }

    #[test]
    fn status_read_clears_vblank_and_the_write_latch() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        ppu.status |= status::VBLANK;
        ppu.write_latch = true;
        let value = ppu.cpu_read(2, mapper.as_mut());
        assert!(value & status::VBLANK != 0);
        assert!(ppu.status & status::VBLANK == 0);
        assert!(!ppu.write_latch);
    }

    #[test]
    fn nmi_fires_only_when_enabled() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        tick_n(&mut ppu, &mut mapper, 241 * 341 + 2);
        assert!(!ppu.pull_nmi());
        // Enabling NMI while VBLANK is high raises the edge at once.
        ppu.cpu_write(0, ctrl::NMI_ENABLE, mapper.as_mut());
        assert!(ppu.pull_nmi());
        assert!(!ppu.pull_nmi());
    }

    #[test]
    fn data_reads_are_buffered_one_behind() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        // Write $AB then $CD at $2000.
        ppu.cpu_write(6, 0x20, mapper.as_mut());
        ppu.cpu_write(6, 0x00, mapper.as_mut());
        ppu.cpu_write(7, 0xAB, mapper.as_mut());
        ppu.cpu_write(7, 0xCD, mapper.as_mut());
        // Point back and read: first value is the stale buffer.
        ppu.cpu_write(6, 0x20, mapper.as_mut());
        ppu.cpu_write(6, 0x00, mapper.as_mut());
        let stale = ppu.cpu_read(7, mapper.as_mut());
        let first = ppu.cpu_read(7, mapper.as_mut());
        let second = ppu.cpu_read(7, mapper.as_mut());
        assert_eq!(stale, 0x00); // power-on buffer contents
        assert_eq!(first, 0xAB);
        assert_eq!(second, 0xCD);
    }

    #[test]
    fn palette_reads_bypass_the_buffer() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        ppu.cpu_write(6, 0x3F, mapper.as_mut());
        ppu.cpu_write(6, 0x01, mapper.as_mut());
        ppu.cpu_write(7, 0x21, mapper.as_mut());
        ppu.cpu_write(6, 0x3F, mapper.as_mut());
        ppu.cpu_write(6, 0x01, mapper.as_mut());
        assert_eq!(ppu.cpu_read(7, mapper.as_mut()), 0x21);
    }

    #[test]
    fn sprite_palette_backdrops_mirror_background() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        ppu.cpu_write(6, 0x3F, mapper.as_mut());
        ppu.cpu_write(6, 0x10, mapper.as_mut());
        ppu.cpu_write(7, 0x2A, mapper.as_mut());
        assert_eq!(ppu.palette_ram[0x00], 0x2A);
        assert_eq!(mirror_palette(0x3F14), 0x04);
        assert_eq!(mirror_palette(0x3F1C), 0x0C);
        assert_eq!(mirror_palette(0x3F11), 0x11);
    }

    #[test]
    fn nametable_mirroring_modes() {
        // Horizontal: $2000/$2400 share, $2800/$2C00 share.
        assert_eq!(
            mirror_nametable(0x2000, Mirroring::Horizontal),
            mirror_nametable(0x2400, Mirroring::Horizontal)
        );
        assert_ne!(
            mirror_nametable(0x2000, Mirroring::Horizontal),
            mirror_nametable(0x2800, Mirroring::Horizontal)
        );
        // Vertical: $2000/$2800 share, $2400/$2C00 share.
        assert_eq!(
            mirror_nametable(0x2000, Mirroring::Vertical),
            mirror_nametable(0x2800, Mirroring::Vertical)
        );
        assert_ne!(
            mirror_nametable(0x2000, Mirroring::Vertical),
            mirror_nametable(0x2400, Mirroring::Vertical)
        );
        // Single screen pins everything to one table.
        assert_eq!(mirror_nametable(0x2C00, Mirroring::SingleScreenLower), 0);
        assert_eq!(
            mirror_nametable(0x2C00, Mirroring::SingleScreenUpper),
            0x400
        );
    }

    #[test]
    fn scroll_writes_assemble_t_and_fine_x() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        ppu.cpu_write(0, 0x01, mapper.as_mut()); // nametable 1
        ppu.cpu_write(5, 0x7D, mapper.as_mut()); // X = 15*8 + 5
        ppu.cpu_write(5, 0x5E, mapper.as_mut()); // Y = 11*8 + 6
        assert_eq!(ppu.fine_x, 5);
        assert_eq!(ppu.t & 0x001F, 15); // coarse X
        assert_eq!((ppu.t >> 5) & 0x1F, 11); // coarse Y
        assert_eq!((ppu.t >> 12) & 0x07, 6); // fine Y
        assert_eq!((ppu.t >> 10) & 0x03, 1); // nametable
    }

    #[test]
    fn address_writes_load_v_on_the_second_byte() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        ppu.cpu_write(6, 0x21, mapper.as_mut());
        assert_eq!(ppu.v, 0);
        ppu.cpu_write(6, 0x08, mapper.as_mut());
        assert_eq!(ppu.v, 0x2108);
    }

    #[test]
    fn background_line_renders_a_solid_tile() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        // Tile 1: all pixels colour 3 (both planes set).
        for row in 0..8 {
            mapper.chr_write(16 + row, 0xFF);
            mapper.chr_write(16 + row + 8, 0xFF);
        }
        // Fill the first nametable row with tile 1.
        for column in 0..32 {
            ppu.cpu_write(6, 0x20, mapper.as_mut());
            ppu.cpu_write(6, column, mapper.as_mut());
            ppu.cpu_write(7, 0x01, mapper.as_mut());
        }
        // Palette: universal backdrop $0F, colour 3 of palette 0 = $21.
        ppu.cpu_write(6, 0x3F, mapper.as_mut());
        ppu.cpu_write(6, 0x00, mapper.as_mut());
        ppu.cpu_write(7, 0x0F, mapper.as_mut());
        ppu.cpu_write(6, 0x3F, mapper.as_mut());
        ppu.cpu_write(6, 0x03, mapper.as_mut());
        ppu.cpu_write(7, 0x21, mapper.as_mut());
        // Reset the address so rendering starts from (0,0), enable BG.
        ppu.cpu_write(6, 0x00, mapper.as_mut());
        ppu.cpu_write(6, 0x00, mapper.as_mut());
        ppu.cpu_write(1, mask::BACKGROUND_ENABLE | mask::BACKGROUND_LEFT, mapper.as_mut());

        tick_n(&mut ppu, &mut mapper, 341); // one full scanline
        let fb = ppu.framebuffer();
        assert_eq!(fb[0], 0x21);
        assert_eq!(fb[255], 0x21);
    }

    #[test]
    fn sprite_zero_hit_requires_both_pipelines() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        // Solid tile 1 in both pattern tables' slot 1.
        for row in 0..8 {
            mapper.chr_write(16 + row, 0xFF);
            mapper.chr_write(16 + row + 8, 0xFF);
        }
        // Background tile 1 at the top-left corner.
        ppu.cpu_write(6, 0x20, mapper.as_mut());
        ppu.cpu_write(6, 0x00, mapper.as_mut());
        ppu.cpu_write(7, 0x01, mapper.as_mut());
        // Sprite 0 overlapping it.
        ppu.oam[0] = 0x00; // y
        ppu.oam[1] = 0x01; // tile
        ppu.oam[2] = 0x00; // attributes
        ppu.oam[3] = 0x00; // x
        ppu.cpu_write(6, 0x00, mapper.as_mut());
        ppu.cpu_write(6, 0x00, mapper.as_mut());

        // Background only: no hit.
        ppu.cpu_write(1, mask::BACKGROUND_ENABLE | mask::BACKGROUND_LEFT, mapper.as_mut());
        tick_n(&mut ppu, &mut mapper, 341);
        assert!(ppu.status & status::SPRITE_ZERO_HIT == 0);

        // Both pipelines: hit on the next line the sprite covers.
        ppu.cpu_write(
            1,
            mask::BACKGROUND_ENABLE
                | mask::SPRITE_ENABLE
                | mask::BACKGROUND_LEFT
                | mask::SPRITE_LEFT,
            mapper.as_mut(),
        );
        tick_n(&mut ppu, &mut mapper, 341);
        assert!(ppu.status & status::SPRITE_ZERO_HIT != 0);
    }

    #[test]
    fn no_more_than_eight_sprites_per_line_and_overflow_flags() {
        let mut ppu = Ppu::new(NesRegion::Ntsc);
        let mut mapper = make_mapper(Mirroring::Horizontal);
        for row in 0..8 {
            mapper.chr_write(row, 0xFF);
        }
        // Nine sprites on scanline 0, spread horizontally.
        for index in 0..9 {
            ppu.oam[index * 4] = 0;
            ppu.oam[index * 4 + 1] = 0;
            ppu.oam[index * 4 + 2] = 0;
            ppu.oam[index * 4 + 3] = (index * 16) as u8;
        }
        ppu.cpu_write(1, mask::SPRITE_ENABLE | mask::SPRITE_LEFT, mapper.as_mut());
        tick_n(&mut ppu, &mut mapper, 341);
        assert!(ppu.status & status::SPRITE_OVERFLOW != 0);
        // The ninth sprite (x=128) was not drawn.
        assert!(!ppu.sprite_opaque[128 + 4]);
    }
}
