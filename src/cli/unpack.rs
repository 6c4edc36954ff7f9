use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result, anyhow, ensure};
use indicatif::{MultiProgress, ProgressBar};
use log::Level;

use super::command::{Cli, UnpackArgs};
use super::progress::{create_progress_bar, finish_progress, update_progress};
use crate::input::InputReader;
use crate::sidecar::Sidecar;
use bitstream::log_or_err;
use bitstream::stream::BitStream;
use bitstream::utils::errors::BitstreamError;

pub struct ReadState {
    pub fail_level: Level,
}

pub fn cmd_unpack(args: &UnpackArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let is_pipe = args.input.to_string_lossy() == "-";
    let state = ReadState {
        fail_level: cli.fail_level(),
    };

    let (padding, sidecar) = match args.padding {
        Some(padding) => (padding, None),
        None => {
            ensure!(!is_pipe, "--padding is required when reading from stdin");
            let sidecar = Sidecar::read(&args.input).context("No --padding given")?;
            (sidecar.padding, Some(sidecar))
        }
    };

    log::info!(
        "Unpacking bits: {} (padding: {padding}, strict mode: {})",
        args.input.display(),
        cli.strict
    );

    let mut input = InputReader::new(&args.input)?;
    let pb = create_progress_bar(multi, "Unpacking")?;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let count = match args.width {
        Some(width) => unpack_values(&mut input, padding, width, &state, &pb, &mut out)?,
        None => unpack_bits(&mut input, padding, args.group, &state, &pb, &mut out)?,
    };
    out.flush()?;

    let bytes = input.bytes_read();
    finish_progress(pb, bytes);

    if let Some(sidecar) = sidecar {
        if sidecar.bytes != bytes {
            log_or_err!(
                state,
                Level::Warn,
                anyhow!(
                    "Sidecar expects {} bytes, input has {bytes}",
                    sidecar.bytes
                )
            );
        }
    }

    log::debug!("Unpacked {count} items from {bytes} bytes");

    Ok(())
}

/// Writes the data bits as '0'/'1', with a space every `group` bits.
pub fn unpack_bits<W: Write>(
    input: &mut InputReader,
    padding: u8,
    group: usize,
    state: &ReadState,
    pb: &Option<ProgressBar>,
    out: &mut W,
) -> Result<u64> {
    let mut stream = BitStream::reader(input, padding)?;
    stream.set_fail_level(state.fail_level);

    let mut count = 0u64;
    while let Some(bit) = stream.read_bit()? {
        if group > 0 && count > 0 && count.is_multiple_of(group as u64) {
            out.write_all(b" ")?;
        }
        out.write_all(if bit { b"1" } else { b"0" })?;
        count += 1;

        update_progress(pb, stream.channel().get_ref().bytes_read());
    }

    if count > 0 {
        writeln!(out)?;
    }

    stream.close()?;

    Ok(count)
}

/// Writes one decimal value per line, each read as `width` bits.
pub fn unpack_values<W: Write>(
    input: &mut InputReader,
    padding: u8,
    width: u32,
    state: &ReadState,
    pb: &Option<ProgressBar>,
    out: &mut W,
) -> Result<u64> {
    let mut stream = BitStream::reader(input, padding)?;
    stream.set_fail_level(state.fail_level);

    let mut count = 0u64;
    loop {
        match stream.read_nbits(width) {
            Ok(value) => {
                writeln!(out, "{value}")?;
                count += 1;
            }
            Err(BitstreamError::InsufficientData { available: 0, .. }) => break,
            Err(BitstreamError::InsufficientData {
                requested,
                available,
            }) => {
                log_or_err!(
                    state,
                    Level::Warn,
                    anyhow!("{available} trailing bits do not fill a {requested}-bit value")
                );
                break;
            }
            Err(e) => return Err(e.into()),
        }

        update_progress(pb, stream.channel().get_ref().bytes_read());
    }

    stream.close()?;

    Ok(count)
}
