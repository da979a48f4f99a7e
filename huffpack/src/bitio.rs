//! MSB-first bit I/O and payload packing.
//!
//! The first bit written lands in the most significant position of the first byte. A trailing
//! partial byte is flushed with its bits in the high positions and zeros below them; readers are
//! expected to know how many bits are meaningful.

use crate::error::{Error, Result};
use crate::huffman::{HuffmanTable, PrefixCode};
use bitvec::prelude::*;
use std::io::{self, Read, Write};

pub struct BitWriter<W: Write> {
    writer: W,
    buffer: u8,
    buffer_length: u8,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(writer: W) -> Self {
        BitWriter {
            writer,
            buffer: 0,
            buffer_length: 0,
            bits_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.buffer = (self.buffer << 1) | bit as u8;
        self.buffer_length += 1;
        self.bits_written += 1;

        if self.buffer_length == 8 {
            self.flush_buffer()?;
        }

        Ok(())
    }

    pub fn write_code(&mut self, code: &PrefixCode) -> io::Result<()> {
        for bit in code.bits().iter().by_vals() {
            self.write_bit(bit)?;
        }

        Ok(())
    }

    /// Emits any buffered bits as one byte, zero-padded on the low end.
    pub fn flush_buffer(&mut self) -> io::Result<()> {
        if self.buffer_length > 0 {
            self.buffer <<= 8 - self.buffer_length;
            self.writer.write_all(&[self.buffer])?;
            self.buffer = 0;
            self.buffer_length = 0;
        }

        Ok(())
    }

    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }
}

impl<W: Write> Drop for BitWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush_buffer();
    }
}

pub struct BitReader<R: Read> {
    reader: R,
    buffer: u8,
    buffer_length: u8,
}

impl<R: Read> BitReader<R> {
    pub fn new(reader: R) -> Self {
        BitReader {
            reader,
            buffer: 0,
            buffer_length: 0,
        }
    }

    /// Next bit, or `None` once the underlying reader is exhausted.
    pub fn read_bit(&mut self) -> io::Result<Option<bool>> {
        if self.buffer_length == 0 {
            let mut byte = [0];
            let bytes_read = self.reader.read(&mut byte)?;

            if bytes_read == 0 {
                return Ok(None);
            }

            self.buffer = byte[0];
            self.buffer_length = 8;
        }

        self.buffer_length -= 1;

        Ok(Some((self.buffer >> self.buffer_length) & 1 == 1))
    }
}

/// Encodes `data` with `table` and packs the bitstream into bytes.
pub fn pack(data: &[u8], table: &HuffmanTable) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    let mut writer = BitWriter::new(&mut payload);

    for &symbol in data {
        let code = table.code(symbol).ok_or_else(|| {
            Error::CorruptPayload(format!("symbol {symbol:#04x} has no code"))
        })?;
        writer.write_code(code)?;
    }

    let bits = writer.bits_written();
    if bits % 8 != 0 {
        log::debug!("padding final byte: {} of 8 bits used", bits % 8);
    }
    writer.flush_buffer()?;
    drop(writer);

    Ok(payload)
}

/// Expands every byte into its eight bits, most significant first.
///
/// Whole-buffer form of [`BitReader`]; the decoder streams through a `BitReader` instead so it can
/// stop as soon as the last symbol is out.
pub fn unpack(payload: &[u8]) -> BitVec<u8, Msb0> {
    BitVec::from_slice(payload)
}
