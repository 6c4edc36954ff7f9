//! Bit-granular access to a byte-oriented channel.
//!
//! A [`BitStream`] is opened either for reading or for writing. Writers pack
//! bits MSB-first into bytes and zero-fill the low end of the final byte on
//! [`close`](BitStream::close), which reports how many filler bits were
//! added. The stream carries no header, so that padding count has to reach
//! the reader out-of-band, where it is passed to [`BitStream::reader`].
//!
//! ```rust
//! use bitstream::stream::BitStream;
//!
//! let mut bytes = Vec::new();
//! let mut writer = BitStream::writer(&mut bytes);
//! writer.write_bitstring("101")?;
//! let padding = writer.close()?;
//! assert_eq!((bytes.as_slice(), padding), (&[0xA0][..], 5));
//!
//! let mut reader = BitStream::reader(&bytes[..], padding)?;
//! assert_eq!(reader.read_nbits(3)?, 0b101);
//! assert_eq!(reader.read_bit()?, None);
//! # Ok::<(), bitstream::utils::errors::BitstreamError>(())
//! ```

pub mod channel;

use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};

use log::{Level, debug, trace, warn};

use crate::log_or_err;
use crate::utils::errors::BitstreamError;
use channel::{ByteChannel, Sink, Source};

pub type Result<T> = std::result::Result<T, BitstreamError>;

/// Largest number of filler bits a final byte can carry.
pub const MAX_PADDING: u8 = 7;

/// Widest value moved by [`BitStream::read_nbits`] / [`BitStream::write_bits`].
pub const MAX_NBITS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `padding` low bits of the last byte are filler, never data.
    Read { padding: u8 },
    Write,
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Read { .. } => f.write_str("read"),
            Mode::Write => f.write_str("write"),
        }
    }
}

/// Filler bits a writer appends after `bit_count` data bits.
pub const fn padding_for(bit_count: u64) -> u8 {
    ((8 - bit_count % 8) % 8) as u8
}

#[derive(Debug)]
pub struct BitStream<C: ByteChannel> {
    channel: C,
    mode: Mode,
    buffer: u8,
    bit_offset: u8,
    at_last_byte: bool,
    padding_checked: bool,
    poisoned: bool,
    fail_level: Level,
}

impl<R: BufRead> BitStream<Source<R>> {
    /// Opens `read` for bit reading. `padding` is the count returned by the
    /// writer's [`close`](BitStream::close).
    pub fn reader(read: R, padding: u8) -> Result<Self> {
        Self::new(Source::new(read), Mode::Read { padding })
    }
}

impl<W: Write> BitStream<Sink<W>> {
    pub fn writer(write: W) -> Self {
        Self::with_mode(Sink::new(write), Mode::Write)
    }
}

impl<C: ByteChannel> BitStream<C> {
    pub fn new(channel: C, mode: Mode) -> Result<Self> {
        if let Mode::Read { padding } = mode {
            if padding > MAX_PADDING {
                return Err(BitstreamError::InvalidPadding(padding));
            }
        }

        Ok(Self::with_mode(channel, mode))
    }

    fn with_mode(channel: C, mode: Mode) -> Self {
        Self {
            channel,
            mode,
            buffer: 0,
            bit_offset: 0,
            at_last_byte: false,
            padding_checked: false,
            poisoned: false,
            fail_level: Level::Error,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Bits held in the accumulator: placed but not flushed when writing,
    /// fetched but not consumed when reading.
    pub fn bit_offset(&self) -> u8 {
        self.bit_offset
    }

    pub fn is_at_last_byte(&self) -> bool {
        self.at_last_byte
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Sets the failure level for validation errors.
    ///
    /// - `log::Level::Error`: non-zero padding bits are only logged (default)
    /// - `log::Level::Warn`: non-zero padding bits fail the read (strict mode)
    pub fn set_fail_level(&mut self, level: Level) {
        self.fail_level = level;
    }

    /// Writes one bit given as the character `'0'` or `'1'`.
    pub fn write_bit(&mut self, symbol: char) -> Result<()> {
        self.ensure_writable("write_bit")?;

        let bit = match symbol {
            '0' => false,
            '1' => true,
            other => return Err(BitstreamError::InvalidSymbol(other)),
        };

        self.push_bit(bit)
    }

    pub fn put_bit(&mut self, bit: bool) -> Result<()> {
        self.ensure_writable("put_bit")?;
        self.push_bit(bit)
    }

    /// Writes every character of `symbols` with [`write_bit`](Self::write_bit).
    ///
    /// Not atomic: bits ahead of an invalid character stay written.
    pub fn write_bitstring(&mut self, symbols: &str) -> Result<()> {
        for symbol in symbols.chars() {
            self.write_bit(symbol)?;
        }

        Ok(())
    }

    /// Writes the low `n` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, n: u32) -> Result<()> {
        self.ensure_writable("write_bits")?;

        if n > MAX_NBITS {
            return Err(BitstreamError::TooManyBits(n));
        }

        for shift in (0..n).rev() {
            self.push_bit((value >> shift) & 1 != 0)?;
        }

        Ok(())
    }

    /// Reads one bit, `None` once only filler (or nothing) remains.
    pub fn read_bit(&mut self) -> Result<Option<bool>> {
        let padding = self.ensure_readable("read_bit")?;

        if self.bit_offset == 0 {
            let Some(byte) = self.channel.take().map_err(|e| self.poison(e))? else {
                self.at_last_byte = true;
                return Ok(None);
            };

            self.buffer = byte;
            self.bit_offset = 8;
            self.at_last_byte = self.channel.at_end().map_err(|e| self.poison(e))?;

            if self.at_last_byte {
                trace!("last byte {byte:#04X}, {padding} padding bits");
            }
        }

        if self.at_last_byte && self.bit_offset <= padding {
            self.check_padding(padding)?;
            return Ok(None);
        }

        let shift = self.bit_offset - 1;
        let bit = (self.buffer >> shift) & 1 != 0;
        self.buffer &= !(1 << shift);
        self.bit_offset -= 1;

        Ok(Some(bit))
    }

    /// Reads a whole byte straight from the channel.
    ///
    /// Any bits still held from an earlier [`read_bit`](Self::read_bit) are
    /// dropped and padding is not applied; callers must be byte aligned.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        self.ensure_readable("read_byte")?;

        self.bit_offset = 0;

        let Some(byte) = self.channel.take().map_err(|e| self.poison(e))? else {
            self.buffer = 0;
            self.at_last_byte = true;
            return Ok(None);
        };

        self.buffer = byte;
        self.at_last_byte = self.channel.at_end().map_err(|e| self.poison(e))?;

        Ok(Some(byte))
    }

    /// Reads `n` bits into an integer, first bit most significant.
    ///
    /// Bits consumed before an [`InsufficientData`](BitstreamError::InsufficientData)
    /// failure are not restored.
    pub fn read_nbits(&mut self, n: u32) -> Result<u64> {
        self.ensure_readable("read_nbits")?;

        if n > MAX_NBITS {
            return Err(BitstreamError::TooManyBits(n));
        }

        let mut value = 0u64;
        for available in 0..n {
            match self.read_bit()? {
                Some(bit) => value = (value << 1) | bit as u64,
                None => {
                    return Err(BitstreamError::InsufficientData {
                        requested: n,
                        available,
                    });
                }
            }
        }

        Ok(value)
    }

    /// Iterates over the remaining data bits.
    pub fn bits(&mut self) -> Bits<'_, C> {
        Bits { stream: self }
    }

    /// Finishes the stream.
    ///
    /// In write mode the pending bits are written as the high bits of a
    /// final byte and the number of zero filler bits (0-7) is returned; a
    /// reader needs that count. Read mode returns 0.
    pub fn close(mut self) -> Result<u8> {
        if self.poisoned {
            return Err(BitstreamError::Poisoned);
        }

        let padding = match self.mode {
            Mode::Read { .. } => 0,
            Mode::Write => self.flush_partial()?,
        };

        debug!("Closed {} stream with {padding} padding bits", self.mode);

        Ok(padding)
    }

    fn ensure_writable(&self, operation: &'static str) -> Result<()> {
        if self.poisoned {
            return Err(BitstreamError::Poisoned);
        }

        match self.mode {
            Mode::Write => Ok(()),
            mode => Err(BitstreamError::WrongMode { operation, mode }),
        }
    }

    fn ensure_readable(&self, operation: &'static str) -> Result<u8> {
        if self.poisoned {
            return Err(BitstreamError::Poisoned);
        }

        match self.mode {
            Mode::Read { padding } => Ok(padding),
            mode => Err(BitstreamError::WrongMode { operation, mode }),
        }
    }

    fn push_bit(&mut self, bit: bool) -> Result<()> {
        self.buffer = (self.buffer << 1) | bit as u8;
        self.bit_offset += 1;

        if self.bit_offset == 8 {
            let byte = self.buffer;
            self.buffer = 0;
            self.bit_offset = 0;

            trace!("flush {byte:#04X}");
            self.channel.put(byte).map_err(|e| self.poison(e))?;
        }

        Ok(())
    }

    fn flush_partial(&mut self) -> Result<u8> {
        if self.bit_offset == 0 {
            return Ok(0);
        }

        let padding = 8 - self.bit_offset;
        let byte = self.buffer << padding;
        self.buffer = 0;
        self.bit_offset = 0;

        trace!("flush final {byte:#04X}, {padding} padding bits");
        self.channel.put(byte).map_err(|e| self.poison(e))?;

        Ok(padding)
    }

    fn check_padding(&mut self, padding: u8) -> Result<()> {
        if self.padding_checked || padding == 0 {
            return Ok(());
        }
        self.padding_checked = true;

        let bits = self.buffer & ((1 << padding) - 1);
        if bits != 0 {
            log_or_err!(
                self,
                Level::Warn,
                BitstreamError::PaddingNotZero { padding, bits }
            );
        }

        Ok(())
    }

    fn poison(&mut self, err: io::Error) -> BitstreamError {
        self.poisoned = true;
        BitstreamError::Io(err)
    }
}

impl<C: ByteChannel> Drop for BitStream<C> {
    fn drop(&mut self) {
        if self.poisoned || self.mode != Mode::Write || self.bit_offset == 0 {
            return;
        }

        match self.flush_partial() {
            Ok(padding) => {
                warn!("Write stream dropped without close, final byte carries {padding} padding bits")
            }
            Err(e) => warn!("Write stream dropped without close, final byte lost: {e}"),
        }
    }
}

/// Iterator returned by [`BitStream::bits`].
pub struct Bits<'a, C: ByteChannel> {
    stream: &'a mut BitStream<C>,
}

impl<C: ByteChannel> Iterator for Bits<'_, C> {
    type Item = Result<bool>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.read_bit().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

    fn pattern(n: usize) -> String {
        (0..n)
            .map(|i| if (i * 7 + 3) % 5 < 2 { '1' } else { '0' })
            .collect()
    }

    fn pack(bits: &str) -> Result<(Vec<u8>, u8)> {
        let mut bytes = Vec::new();
        let mut writer = BitStream::writer(&mut bytes);
        writer.write_bitstring(bits)?;
        let padding = writer.close()?;

        Ok((bytes, padding))
    }

    fn unpack(bytes: &[u8], padding: u8) -> Result<String> {
        let mut reader = BitStream::reader(bytes, padding)?;
        let text = reader
            .bits()
            .map(|bit| bit.map(|bit| if bit { '1' } else { '0' }))
            .collect();

        text
    }

    #[test]
    fn round_trip_any_length() -> Result<()> {
        for n in 0..=40 {
            let bits = pattern(n);
            let (bytes, padding) = pack(&bits)?;

            assert_eq!(padding, padding_for(n as u64), "n = {n}");
            assert!(padding <= MAX_PADDING);
            assert_eq!(bytes.len(), n.div_ceil(8));

            let mut reader = BitStream::reader(&bytes[..], padding)?;
            for (i, expected) in bits.chars().enumerate() {
                assert_eq!(reader.read_bit()?, Some(expected == '1'), "n = {n}, bit {i}");
            }
            assert_eq!(reader.read_bit()?, None, "n = {n}");
        }

        Ok(())
    }

    #[test]
    fn packs_whole_bytes_without_padding() -> Result<()> {
        let mut bytes = Vec::new();
        let mut writer = BitStream::writer(&mut bytes);
        writer.write_bitstring("10110000")?;
        assert_eq!(writer.channel().written(), 1);
        writer.write_bitstring("00000000")?;
        let padding = writer.close()?;

        assert_eq!(bytes, [0xB0, 0x00]);
        assert_eq!(padding, 0);
        Ok(())
    }

    #[test]
    fn reads_msb_first() -> Result<()> {
        let (bytes, padding) = pack("11001010")?;
        assert_eq!(bytes, [0xCA]);

        let mut reader = BitStream::reader(&bytes[..], padding)?;
        let mut read = Vec::new();
        while let Some(bit) = reader.read_bit()? {
            read.push(bit as u8);
        }

        assert_eq!(read, [1, 1, 0, 0, 1, 0, 1, 0]);
        Ok(())
    }

    #[test]
    fn read_nbits_is_big_endian() -> Result<()> {
        let mut reader = BitStream::reader(&[0xDE, 0xAD][..], 0)?;
        assert_eq!(reader.read_nbits(16)?, 0xDEAD);
        assert_eq!(reader.read_bit()?, None);

        let mut reader = BitStream::reader(&[0xDE, 0xAD][..], 0)?;
        assert_eq!(reader.read_nbits(0)?, 0);
        assert_eq!(reader.read_nbits(4)?, 0xD);
        assert_eq!(reader.read_nbits(12)?, 0xEAD);
        Ok(())
    }

    #[test]
    fn filler_bits_are_never_data() -> Result<()> {
        let (bytes, padding) = pack("101")?;
        assert_eq!(bytes, [0xA0]);
        assert_eq!(padding, 5);

        let mut reader = BitStream::reader(&bytes[..], padding)?;
        assert_eq!(reader.read_bit()?, Some(true));
        assert_eq!(reader.read_bit()?, Some(false));
        assert_eq!(reader.read_bit()?, Some(true));
        for _ in 0..10 {
            assert_eq!(reader.read_bit()?, None);
        }
        assert!(reader.is_at_last_byte());
        Ok(())
    }

    #[test]
    fn empty_stream_has_no_bits() -> Result<()> {
        let (bytes, padding) = pack("")?;
        assert!(bytes.is_empty());
        assert_eq!(padding, 0);

        let mut reader = BitStream::reader(&bytes[..], 0)?;
        assert_eq!(reader.read_bit()?, None);
        assert_eq!(reader.read_bit()?, None);
        assert_eq!(reader.read_byte()?, None);
        Ok(())
    }

    #[test]
    fn write_in_read_mode_is_rejected() -> Result<()> {
        let mut out = Vec::new();
        {
            let mut stream = BitStream::new(Sink::new(&mut out), Mode::Read { padding: 0 })?;
            for _ in 0..8 {
                let err = stream.write_bit('1').unwrap_err();
                assert!(matches!(
                    err,
                    BitstreamError::WrongMode {
                        operation: "write_bit",
                        mode: Mode::Read { padding: 0 }
                    }
                ));
            }
            assert_eq!(stream.close()?, 0);
        }
        assert!(out.is_empty());

        let mut reader = BitStream::reader(&[0xFFu8][..], 0)?;
        assert!(matches!(
            reader.write_bits(1, 1),
            Err(BitstreamError::WrongMode { .. })
        ));
        assert_eq!(reader.read_bit()?, Some(true));
        Ok(())
    }

    #[test]
    fn read_in_write_mode_is_rejected() {
        let mut writer = BitStream::writer(Vec::new());
        assert!(matches!(
            writer.read_bit(),
            Err(BitstreamError::WrongMode {
                operation: "read_bit",
                mode: Mode::Write
            })
        ));
        assert!(matches!(
            writer.read_byte(),
            Err(BitstreamError::WrongMode { .. })
        ));
        assert!(matches!(
            writer.read_nbits(3),
            Err(BitstreamError::WrongMode { .. })
        ));
    }

    #[test]
    fn rejects_invalid_symbols() -> Result<()> {
        let mut bytes = Vec::new();
        let mut writer = BitStream::writer(&mut bytes);

        assert!(matches!(
            writer.write_bit('2'),
            Err(BitstreamError::InvalidSymbol('2'))
        ));
        assert_eq!(writer.bit_offset(), 0);

        assert!(matches!(
            writer.write_bitstring("10x1"),
            Err(BitstreamError::InvalidSymbol('x'))
        ));
        assert_eq!(writer.bit_offset(), 2);
        assert_eq!(writer.close()?, 6);

        assert_eq!(bytes, [0x80]);
        Ok(())
    }

    #[test]
    fn rejects_invalid_padding() {
        assert!(matches!(
            BitStream::reader(&[0u8][..], 8),
            Err(BitstreamError::InvalidPadding(8))
        ));
        assert!(BitStream::reader(&[0u8][..], MAX_PADDING).is_ok());
    }

    #[test]
    fn truncated_read_nbits_is_an_error() -> Result<()> {
        let mut reader = BitStream::reader(&[0xF0][..], 4)?;
        let err = reader.read_nbits(6).unwrap_err();
        assert!(matches!(
            err,
            BitstreamError::InsufficientData {
                requested: 6,
                available: 4
            }
        ));

        let mut reader = BitStream::reader(&[0x00][..], 0)?;
        assert_eq!(reader.read_nbits(8)?, 0);
        assert!(matches!(
            reader.read_nbits(1),
            Err(BitstreamError::InsufficientData { available: 0, .. })
        ));

        assert!(matches!(
            reader.read_nbits(65),
            Err(BitstreamError::TooManyBits(65))
        ));
        Ok(())
    }

    #[test]
    fn read_nbits_full_width() -> Result<()> {
        let bytes = 0x0123_4567_89AB_CDEFu64.to_be_bytes();
        let mut reader = BitStream::reader(&bytes[..], 0)?;
        assert_eq!(reader.read_nbits(64)?, 0x0123_4567_89AB_CDEF);
        Ok(())
    }

    #[test]
    fn read_byte_discards_partial_bits() -> Result<()> {
        let mut reader = BitStream::reader(&[0xAB, 0xCD, 0xEF][..], 0)?;

        assert_eq!(reader.read_bit()?, Some(true));
        assert_eq!(reader.bit_offset(), 7);

        assert_eq!(reader.read_byte()?, Some(0xCD));
        assert_eq!(reader.bit_offset(), 0);
        assert!(!reader.is_at_last_byte());

        assert_eq!(reader.read_nbits(8)?, 0xEF);
        assert!(reader.is_at_last_byte());
        assert_eq!(reader.read_byte()?, None);
        Ok(())
    }

    #[test]
    fn read_byte_detects_last_byte() -> Result<()> {
        let data = [0x01, 0x10, 0xFF];
        let mut reader = BitStream::reader(&data[..], 0)?;

        let mut dumped = Vec::new();
        while !reader.is_at_last_byte() {
            if let Some(byte) = reader.read_byte()? {
                dumped.push(byte);
            }
        }

        assert_eq!(dumped, data);
        Ok(())
    }

    #[test]
    fn write_bits_matches_symbols() -> Result<()> {
        let mut bytes = Vec::new();
        let mut writer = BitStream::writer(&mut bytes);
        writer.write_bits(0b101, 3)?;
        writer.write_bits(0xDEAD, 16)?;
        writer.put_bit(true)?;
        writer.write_bits(0, 0)?;
        assert!(matches!(
            writer.write_bits(0, 65),
            Err(BitstreamError::TooManyBits(65))
        ));
        let padding = writer.close()?;

        let (expected, expected_padding) = pack("10111011110101011011")?;
        assert_eq!(bytes, expected);
        assert_eq!(padding, expected_padding);
        Ok(())
    }

    #[test]
    fn drop_flushes_pending_bits() {
        let mut bytes = Vec::new();
        {
            let mut writer = BitStream::writer(&mut bytes);
            writer.write_bitstring("1111111101").unwrap();
        }

        assert_eq!(bytes, [0xFF, 0x40]);
    }

    #[test]
    fn nonzero_padding_is_logged_unless_strict() -> Result<()> {
        let data = [0b1010_0011];

        assert_eq!(unpack(&data, 2)?, "101000");

        let mut reader = BitStream::reader(&data[..], 2)?;
        reader.set_fail_level(Level::Warn);
        assert_eq!(reader.read_nbits(6)?, 0b101000);
        assert!(matches!(
            reader.read_bit(),
            Err(BitstreamError::PaddingNotZero {
                padding: 2,
                bits: 0b11
            })
        ));
        Ok(())
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn channel_failure_poisons_stream() {
        let mut writer = BitStream::writer(BrokenPipe);
        writer.write_bitstring("1010101").unwrap();

        assert!(matches!(writer.write_bit('0'), Err(BitstreamError::Io(_))));
        assert!(matches!(
            writer.write_bit('0'),
            Err(BitstreamError::Poisoned)
        ));
        assert!(matches!(writer.close(), Err(BitstreamError::Poisoned)));
    }

    #[test]
    fn packing_agrees_with_bitstream_io() -> anyhow::Result<()> {
        for n in [1, 7, 8, 9, 23, 64, 77] {
            let bits = pattern(n);

            let mut oracle = BitWriter::<_, BigEndian>::new(Vec::new());
            for symbol in bits.chars() {
                oracle.write_bit(symbol == '1')?;
            }
            oracle.byte_align()?;
            let expected = oracle.into_writer();

            let (bytes, padding) = pack(&bits)?;
            assert_eq!(bytes, expected, "n = {n}");

            let mut oracle = BitReader::<_, BigEndian>::new(&bytes[..]);
            let mut reader = BitStream::reader(&bytes[..], padding)?;
            let mut remaining = n as u32;
            while remaining > 0 {
                let width = remaining.min(13);
                let expected: u64 = oracle.read_var(width)?;
                assert_eq!(reader.read_nbits(width)?, expected, "n = {n}");
                remaining -= width;
            }
            assert_eq!(reader.read_bit()?, None);
        }

        Ok(())
    }
}
