use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar};

use super::command::PackArgs;
use super::progress::{create_progress_bar, finish_progress};
use crate::input::InputReader;
use crate::sidecar::Sidecar;
use bitstream::stream::BitStream;

pub fn cmd_pack(args: &PackArgs, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Packing bits: {} -> {}",
        args.input.display(),
        args.output.display()
    );

    let text = InputReader::new(&args.input)?.read_to_string()?;
    let pb = create_progress_bar(multi, "Packing")?;

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut out = BufWriter::new(file);
    let sidecar = pack_text(&text, &pb, &mut out)?;
    out.flush()?;

    finish_progress(pb, sidecar.bytes);
    log::info!(
        "Packed {} bits into {} bytes, {} padding bits",
        sidecar.bits,
        sidecar.bytes,
        sidecar.padding
    );

    if args.no_sidecar {
        log::warn!(
            "No sidecar written, unpack with --padding {}",
            sidecar.padding
        );
    } else {
        let path = sidecar.write(&args.output)?;
        log::info!("Padding sidecar: {}", path.display());
    }

    Ok(())
}

/// Packs the '0'/'1' characters of `text`, skipping ASCII whitespace.
pub fn pack_text<W: Write>(text: &str, pb: &Option<ProgressBar>, out: W) -> Result<Sidecar> {
    let mut stream = BitStream::writer(out);
    let mut bits = 0u64;

    for (line, symbols) in text.lines().enumerate() {
        for (column, symbol) in symbols.chars().enumerate() {
            if symbol.is_ascii_whitespace() {
                continue;
            }

            stream
                .write_bit(symbol)
                .with_context(|| format!("line {}, column {}", line + 1, column + 1))?;
            bits += 1;
        }

        if let Some(pb) = pb {
            pb.set_position(stream.channel().written());
        }
    }

    let padding = stream.close()?;

    Ok(Sidecar::new(bits, padding))
}
