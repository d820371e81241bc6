//! Headless runner: execute a ROM for a number of frames, optionally
//! dumping the final frame as PNG and the audio as WAV.

use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

use log::info;
use nes_system::{FRAME_HEIGHT, FRAME_WIDTH, Nes, NesRegion, palette};

struct Options {
    rom_path: String,
    frames: u32,
    region: NesRegion,
    screenshot: Option<String>,
    wav: Option<String>,
}

fn usage() -> String {
    "usage: nes-headless <rom.nes> [--frames N] [--region ntsc|pal] \
     [--screenshot out.png] [--wav out.wav]"
        .to_string()
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut rom_path = None;
    let mut frames = 60;
    let mut region = NesRegion::Ntsc;
    let mut screenshot = None;
    let mut wav = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--frames" => {
                let value = iter.next().ok_or_else(usage)?;
                frames = value
                    .parse()
                    .map_err(|_| format!("bad frame count: {value}"))?;
            }
            "--region" => {
                region = match iter.next().ok_or_else(usage)?.as_str() {
                    "ntsc" => NesRegion::Ntsc,
                    "pal" => NesRegion::Pal,
                    other => return Err(format!("unknown region: {other}")),
                };
            }
            "--screenshot" => screenshot = Some(iter.next().ok_or_else(usage)?.clone()),
            "--wav" => wav = Some(iter.next().ok_or_else(usage)?.clone()),
            _ if rom_path.is_none() => rom_path = Some(arg.clone()),
            other => return Err(format!("unexpected argument: {other}")),
        }
    }

    Ok(Options {
        rom_path: rom_path.ok_or_else(usage)?,
        frames,
        region,
        screenshot,
        wav,
    })
}

fn run(options: &Options) -> Result<(), String> {
    let rom = std::fs::read(&options.rom_path)
        .map_err(|error| format!("{}: {error}", options.rom_path))?;
    let mut nes =
        Nes::new(&rom, options.region).map_err(|error| format!("{}: {error}", options.rom_path))?;

    let mut audio = Vec::new();
    for frame in 0..options.frames {
        nes.run_frame()
            .map_err(|error| format!("frame {frame}: {error}"))?;
        let samples = nes.take_audio_buffer();
        if options.wav.is_some() {
            audio.extend_from_slice(&samples);
        }
    }
    info!(
        "ran {} frames, {} CPU cycles",
        options.frames,
        nes.total_cycles()
    );

    if let Some(path) = &options.screenshot {
        write_png(path, nes.framebuffer())?;
        info!("wrote {path}");
    }
    if let Some(path) = &options.wav {
        write_wav(path, &audio, options.region)?;
        info!("wrote {path} ({} samples)", audio.len());
    }
    Ok(())
}

/// Expand the palette-index framebuffer to RGB and encode it.
fn write_png(path: &str, framebuffer: &[u8; FRAME_WIDTH * FRAME_HEIGHT]) -> Result<(), String> {
    let file = File::create(path).map_err(|error| format!("{path}: {error}"))?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        FRAME_WIDTH as u32,
        FRAME_HEIGHT as u32,
    );
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|error| format!("{path}: {error}"))?;

    let mut pixels = Vec::with_capacity(FRAME_WIDTH * FRAME_HEIGHT * 3);
    for &index in framebuffer {
        let argb = palette::argb(index);
        pixels.push((argb >> 16) as u8);
        pixels.push((argb >> 8) as u8);
        pixels.push(argb as u8);
    }
    writer
        .write_image_data(&pixels)
        .map_err(|error| format!("{path}: {error}"))
}

/// Write the unsigned 8-bit PCM stream as 16-bit mono WAV.
fn write_wav(path: &str, samples: &[u8], region: NesRegion) -> Result<(), String> {
    let spec = hound::WavSpec {
        channels: 1,
        // One sample per 34 CPU cycles.
        sample_rate: region.cpu_hz() / 34,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|error| format!("{path}: {error}"))?;
    for &sample in samples {
        let signed = (i16::from(sample) - 128) << 8;
        writer
            .write_sample(signed)
            .map_err(|error| format!("{path}: {error}"))?;
    }
    writer.finalize().map_err(|error| format!("{path}: {error}"))
}

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{}", usage());
            return ExitCode::FAILURE;
        }
    };
    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
