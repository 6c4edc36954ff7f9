use std::io::{self, BufWriter, Write};

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar};

use super::command::DumpArgs;
use super::progress::{create_progress_bar, finish_progress, update_progress};
use crate::input::InputReader;
use bitstream::stream::BitStream;

pub fn cmd_dump(args: &DumpArgs, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Dumping bytes: {}", args.input.display());

    let mut input = InputReader::new(&args.input)?;
    let pb = create_progress_bar(multi, "Dumping")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let count = dump_bytes(&mut input, args.columns, &pb, &mut out)?;
    out.flush()?;

    finish_progress(pb, count);
    log::debug!("Dumped {count} bytes");

    Ok(())
}

/// Writes every byte of `input` as two hex digits, `columns` per line.
pub fn dump_bytes<W: Write>(
    input: &mut InputReader,
    columns: usize,
    pb: &Option<ProgressBar>,
    out: &mut W,
) -> Result<u64> {
    let mut stream = BitStream::reader(input, 0)?;
    let mut count = 0u64;
    let mut in_line = 0usize;

    while let Some(byte) = stream.read_byte()? {
        if in_line > 0 {
            out.write_all(b" ")?;
        }
        write!(out, "{byte:02x}")?;

        count += 1;
        in_line += 1;
        if columns > 0 && in_line == columns {
            writeln!(out)?;
            in_line = 0;
        }

        update_progress(pb, count);
    }

    if in_line > 0 {
        writeln!(out)?;
    }

    stream.close()?;

    Ok(count)
}
