//! iNES ROM image parsing.

use log::warn;

use crate::error::LoadError;

pub const PRG_PAGE_SIZE: usize = 16 * 1024;
pub const CHR_PAGE_SIZE: usize = 8 * 1024;
const HEADER_SIZE: usize = 16;
const TRAINER_SIZE: usize = 512;

/// Nametable mirroring arrangement.
///
/// Horizontal/Vertical/FourScreen come from the header; the single-screen
/// modes are only ever selected at runtime by MMC1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
    SingleScreenLower,
    SingleScreenUpper,
}

/// Decoded iNES header fields.
#[derive(Debug, Clone, Copy)]
pub struct CartridgeHeader {
    pub prg_pages: u8,
    pub chr_pages: u8,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    pub has_battery: bool,
    pub has_trainer: bool,
}

/// A parsed cartridge: header plus the raw PRG and CHR banks.
#[derive(Debug)]
pub struct Cartridge {
    pub header: CartridgeHeader,
    pub prg: Vec<u8>,
    pub chr: Vec<u8>,
    /// True when the image carried no CHR data and an 8KB RAM bank was
    /// substituted.
    pub chr_is_ram: bool,
}

/// Parse an iNES image.
///
/// Unknown reserved bytes and trailing data are tolerated with a warning;
/// a short file or a bad magic is fatal.
pub fn parse_ines(data: &[u8]) -> Result<Cartridge, LoadError> {
    if data.len() < HEADER_SIZE {
        return Err(LoadError::TooShort { actual: data.len() });
    }
    if &data[0..4] != b"NES\x1a" {
        return Err(LoadError::BadMagic);
    }

    let prg_pages = data[4];
    let chr_pages = data[5];
    let control1 = data[6];
    let control2 = data[7];

    if data[8..16].iter().any(|&b| b != 0) {
        warn!("nonzero reserved header bytes, treating as iNES 1.0 anyway");
    }

    let mirroring = if control1 & 0x08 != 0 {
        Mirroring::FourScreen
    } else if control1 & 0x01 != 0 {
        Mirroring::Vertical
    } else {
        Mirroring::Horizontal
    };
    let has_battery = control1 & 0x02 != 0;
    let has_trainer = control1 & 0x04 != 0;
    let mapper_id = (control2 & 0xF0) | (control1 >> 4);

    let prg_len = usize::from(prg_pages) * PRG_PAGE_SIZE;
    let chr_len = usize::from(chr_pages) * CHR_PAGE_SIZE;
    let prg_start = HEADER_SIZE + if has_trainer { TRAINER_SIZE } else { 0 };
    let expected = prg_start + prg_len + chr_len;
    if data.len() < expected {
        return Err(LoadError::Truncated {
            expected,
            actual: data.len(),
        });
    }
    if data.len() > expected {
        warn!("{} trailing bytes after CHR data, ignored", data.len() - expected);
    }

    let prg = data[prg_start..prg_start + prg_len].to_vec();
    let chr_start = prg_start + prg_len;
    let (chr, chr_is_ram) = if chr_pages == 0 {
        // No CHR ROM: the board carries 8KB of CHR RAM instead.
        (vec![0; CHR_PAGE_SIZE], true)
    } else {
        (data[chr_start..chr_start + chr_len].to_vec(), false)
    };

    Ok(Cartridge {
        header: CartridgeHeader {
            prg_pages,
            chr_pages,
            mapper_id,
            mirroring,
            has_battery,
            has_trainer,
        },
        prg,
        chr,
        chr_is_ram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ines(prg_pages: u8, chr_pages: u8, control1: u8, control2: u8) -> Vec<u8> {
        let mut data = vec![
            0x4E, 0x45, 0x53, 0x1A, // "NES" + EOF
            prg_pages, chr_pages, control1, control2, //
            0, 0, 0, 0, 0, 0, 0, 0, // reserved
        ];
        data.resize(
            16 + usize::from(prg_pages) * PRG_PAGE_SIZE + usize::from(chr_pages) * CHR_PAGE_SIZE,
            0,
        );
        data
    }

    #[test]
    fn parses_nrom_header_fields() {
        let cartridge = parse_ines(&make_ines(2, 1, 0x01, 0x00)).unwrap();
        assert_eq!(cartridge.header.prg_pages, 2);
        assert_eq!(cartridge.header.chr_pages, 1);
        assert_eq!(cartridge.header.mapper_id, 0);
        assert_eq!(cartridge.header.mirroring, Mirroring::Vertical);
        assert_eq!(cartridge.prg.len(), 2 * PRG_PAGE_SIZE);
        assert!(!cartridge.chr_is_ram);
    }

    #[test]
    fn mapper_id_combines_both_control_nibbles() {
        let cartridge = parse_ines(&make_ines(1, 1, 0x10, 0x40)).unwrap();
        assert_eq!(cartridge.header.mapper_id, 0x41);
    }

    #[test]
    fn four_screen_bit_wins_over_vertical() {
        let cartridge = parse_ines(&make_ines(1, 1, 0x09, 0x00)).unwrap();
        assert_eq!(cartridge.header.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn trainer_is_skipped() {
        let mut data = make_ines(1, 1, 0x04, 0x00);
        // Insert the 512-byte trainer and a marker at the PRG start.
        let mut with_trainer = data[..16].to_vec();
        with_trainer.extend(std::iter::repeat_n(0xEE, 512));
        with_trainer.extend_from_slice(&data.split_off(16));
        with_trainer[16 + 512] = 0xAB;
        let cartridge = parse_ines(&with_trainer).unwrap();
        assert!(cartridge.header.has_trainer);
        assert_eq!(cartridge.prg[0], 0xAB);
    }

    #[test]
    fn missing_chr_falls_back_to_ram() {
        let cartridge = parse_ines(&make_ines(1, 0, 0x00, 0x00)).unwrap();
        assert!(cartridge.chr_is_ram);
        assert_eq!(cartridge.chr.len(), CHR_PAGE_SIZE);
    }

    #[test]
    fn rejects_short_and_unmagical_files() {
        assert_eq!(
            parse_ines(&[0x4E, 0x45]).unwrap_err(),
            LoadError::TooShort { actual: 2 }
        );
        let mut data = make_ines(1, 1, 0, 0);
        data[3] = 0x00;
        assert_eq!(parse_ines(&data).unwrap_err(), LoadError::BadMagic);
    }

    #[test]
    fn rejects_truncated_prg_data() {
        let mut data = make_ines(2, 1, 0, 0);
        data.truncate(16 + PRG_PAGE_SIZE);
        assert!(matches!(parse_ines(&data), Err(LoadError::Truncated { .. })));
    }
}
