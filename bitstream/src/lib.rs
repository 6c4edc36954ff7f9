#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Bit-level reading and writing over byte-oriented channels.
//!
//! ### Wire Format
//!
//! **Packing**: bits are packed MSB-first into consecutive bytes.
//! **Termination**: the final byte is zero-filled in its low bits. The number
//! of filler bits is not stored in the stream; the writer reports it on close
//! and the reader must be given the same count.
//!
//! ## Quick Start
//!
//! ```rust
//! use bitstream::stream::BitStream;
//!
//! let mut bytes = Vec::new();
//!
//! let mut writer = BitStream::writer(&mut bytes);
//! writer.write_bitstring("1100101")?;
//! writer.write_bits(0x3, 2)?;
//! let padding = writer.close()?;
//!
//! let mut reader = BitStream::reader(&bytes[..], padding)?;
//! assert_eq!(reader.read_nbits(9)?, 0b1100101_11);
//! assert_eq!(reader.read_bit()?, None);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Bit-level streams.
///
/// - **BitStream** ([`stream::BitStream`]): read or write mode codec
/// - **Channels** ([`stream::channel`]): byte sources and sinks
pub mod stream;

/// Quantization matrix recalculation for 8x8 DCT blocks.
pub mod quant;

/// Utility functions and supporting infrastructure.
///
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
