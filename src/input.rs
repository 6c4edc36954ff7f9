use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// Unified input reader that handles both file and pipe input with buffered reading
pub struct InputReader {
    reader: Box<dyn BufRead>,
    is_pipe: bool,
    bytes_read: u64,
}

impl InputReader {
    /// Create a new InputReader from a path
    /// Use "-" for stdin pipe input
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let input_path = input_path.as_ref();
        let is_pipe = input_path.to_string_lossy() == "-";

        let reader: Box<dyn BufRead> = if is_pipe {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(input_path)
                .with_context(|| format!("Failed to open {}", input_path.display()))?;
            Box::new(BufReader::new(file))
        };

        Ok(Self::from_reader(reader, is_pipe))
    }

    pub fn from_reader(reader: Box<dyn BufRead>, is_pipe: bool) -> Self {
        Self {
            reader,
            is_pipe,
            bytes_read: 0,
        }
    }

    /// Check if this is pipe input
    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    /// Bytes consumed so far, through either `Read` or `BufRead`
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read all remaining input as UTF-8 text
    pub fn read_to_string(&mut self) -> Result<String> {
        let mut text = String::new();
        Read::read_to_string(self, &mut text)?;
        Ok(text)
    }
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl BufRead for InputReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.bytes_read += amt as u64;
        self.reader.consume(amt);
    }
}
