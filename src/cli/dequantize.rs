use std::io::{self, Write};

use anyhow::Result;

use super::command::DequantizeArgs;
use crate::input::InputReader;
use bitstream::quant::{Block, QualityFactor, QuantMatrix, parse_coefficients, split_quality};

pub fn cmd_dequantize(args: &DequantizeArgs) -> Result<()> {
    let text = InputReader::new(&args.input)?.read_to_string()?;

    let (quality, coefficients) = match args.quality {
        Some(value) => (QualityFactor::new(value)?, parse_coefficients(&text)?),
        None => {
            let (quality, rest) = split_quality(&text)?;
            (quality, parse_coefficients(rest)?)
        }
    };

    log::info!(
        "Dequantizing with quality factor {} (scale {}%)",
        quality.get(),
        quality.scale_factor()
    );

    let matrix = QuantMatrix::for_quality(quality);
    let output = matrix.dequantize(&coefficients);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_block(&mut out, &output)?;
    out.flush()?;

    Ok(())
}

pub fn write_block<W: Write>(out: &mut W, block: &Block<i32>) -> io::Result<()> {
    for row in block {
        for value in row {
            write!(out, "{value} ")?;
        }
        writeln!(out)?;
    }

    Ok(())
}
