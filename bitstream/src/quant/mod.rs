//! Quantization matrix recalculation for 8x8 DCT blocks.
//!
//! A quality factor scales the quality-50 luminance table into the table an
//! encoder used; multiplying quantized coefficients by that table recovers
//! the DCT coefficients. Nothing here touches [`crate::stream`].

use std::fmt::{Display, Formatter};

use anyhow::{Result, bail, ensure};
use log::trace;

use crate::utils::errors::QuantError;

pub const BLOCK_SIZE: usize = 8;

pub type Block<T> = [[T; BLOCK_SIZE]; BLOCK_SIZE];

/// Luminance table at quality factor 50.
pub const BASE_LUMINANCE: Block<u8> = [
    [16, 11, 10, 16, 24, 40, 51, 61],
    [12, 12, 14, 19, 26, 58, 60, 55],
    [14, 13, 16, 24, 40, 57, 69, 56],
    [14, 17, 22, 29, 51, 87, 80, 62],
    [18, 22, 37, 56, 68, 109, 103, 77],
    [24, 35, 55, 64, 81, 104, 113, 92],
    [49, 64, 78, 87, 103, 121, 120, 101],
    [72, 92, 95, 98, 112, 100, 103, 99],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityFactor(u8);

impl QualityFactor {
    pub const BASE: Self = Self(50);

    pub fn new(value: u32) -> Result<Self, QuantError> {
        match value {
            1..=100 => Ok(Self(value as u8)),
            _ => Err(QuantError::InvalidQuality(value)),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Percentage applied to the base table.
    pub fn scale_factor(self) -> u32 {
        let q = self.0 as u32;
        if q < 50 { 5000 / q } else { 200 - 2 * q }
    }
}

impl TryFrom<u32> for QualityFactor {
    type Error = QuantError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Display for QualityFactor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantMatrix {
    table: Block<u8>,
}

impl Default for QuantMatrix {
    fn default() -> Self {
        Self {
            table: BASE_LUMINANCE,
        }
    }
}

impl QuantMatrix {
    /// Entries are `floor((S * base + 50) / 100)` clamped to 1..=255.
    pub fn for_quality(quality: QualityFactor) -> Self {
        if quality == QualityFactor::BASE {
            return Self::default();
        }

        let scale = quality.scale_factor();
        let mut table = [[0u8; BLOCK_SIZE]; BLOCK_SIZE];

        for (row, base_row) in table.iter_mut().zip(BASE_LUMINANCE.iter()) {
            for (entry, &base) in row.iter_mut().zip(base_row.iter()) {
                *entry = ((scale * base as u32 + 50) / 100).clamp(1, 255) as u8;
            }
        }

        trace!("{quality}: scale {scale}%, table {table:?}");

        Self { table }
    }

    pub fn table(&self) -> &Block<u8> {
        &self.table
    }

    pub fn dequantize(&self, coefficients: &Block<i32>) -> Block<i32> {
        let mut output = [[0i32; BLOCK_SIZE]; BLOCK_SIZE];

        for (i, row) in output.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = coefficients[i][j].saturating_mul(self.table[i][j] as i32);
            }
        }

        output
    }
}

/// Parses 64 whitespace-separated integers in row-major order.
pub fn parse_coefficients(text: &str) -> Result<Block<i32>> {
    let values = text
        .split_ascii_whitespace()
        .map(|token| {
            token
                .parse::<i32>()
                .map_err(|_| QuantError::InvalidCoefficient(token.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    ensure!(
        values.len() == BLOCK_SIZE * BLOCK_SIZE,
        QuantError::CoefficientCount(values.len())
    );

    let mut block = [[0i32; BLOCK_SIZE]; BLOCK_SIZE];
    for (row, chunk) in block.iter_mut().zip(values.chunks_exact(BLOCK_SIZE)) {
        row.copy_from_slice(chunk);
    }

    Ok(block)
}

/// Reads the quality factor from the first token of `text`, returning the
/// remainder for [`parse_coefficients`].
pub fn split_quality(text: &str) -> Result<(QualityFactor, &str)> {
    let trimmed = text.trim_start();
    let end = trimmed
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(trimmed.len());
    let (token, rest) = trimmed.split_at(end);

    let Ok(value) = token.parse::<u32>() else {
        bail!("Expected a quality factor, found {token:?}");
    };

    Ok((QualityFactor::new(value)?, rest))
}
