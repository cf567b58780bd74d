use std::io;
use std::io::Read;
use thiserror::Error;

/// The error type that describes failures to decode Base64 encoded strings.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// An invalid byte was found in the input. The offset and offending byte are provided.
    #[error("invalid byte {1} at offset {0}")]
    InvalidByte(usize, u8),
}

/// A reader adapter turning URL-safe Base64 characters into the bytes they encode.
///
/// TC strings are not padded, so the last partial byte is completed with zero bits. Those bits
/// are not part of the input, readers of the decoded bytes have to stop at `6 * chars` bits.
pub struct Base64Reader<R>
where
    R: Read,
{
    inner_reader: R,
    inner_reader_pos: usize,
    pending: u32,
    pending_bits: u32,
    exhausted: bool,
}

impl<R> Base64Reader<R>
where
    R: Read,
{
    pub fn new(r: R) -> Self {
        Self {
            inner_reader: r,
            inner_reader_pos: 0,
            pending: 0,
            pending_bits: 0,
            exhausted: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut char_buf = [0];

        while self.pending_bits < 8 && !self.exhausted {
            if self.inner_reader.read(&mut char_buf)? == 0 {
                self.exhausted = true;
                break;
            }
            self.inner_reader_pos += 1;

            let c = char_buf[0];
            let val = url_safe_value(c).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    DecodeError::InvalidByte(self.inner_reader_pos - 1, c),
                )
            })?;

            self.pending = (self.pending << 6) | u32::from(val);
            self.pending_bits += 6;
        }

        Ok(())
    }
}

impl<R> Read for Base64Reader<R>
where
    R: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut bytes_written = 0;

        for b in buf.iter_mut() {
            self.fill()?;

            if self.pending_bits >= 8 {
                self.pending_bits -= 8;
                *b = (self.pending >> self.pending_bits) as u8;
                self.pending &= (1 << self.pending_bits) - 1;
            } else if self.pending_bits > 0 {
                // input is exhausted, pad the last byte
                *b = (self.pending << (8 - self.pending_bits)) as u8;
                self.pending = 0;
                self.pending_bits = 0;
            } else {
                break;
            }

            bytes_written += 1;
        }

        Ok(bytes_written)
    }
}

/// Value of a character in the URL-safe alphabet used by TC strings.
fn url_safe_value(b: u8) -> Option<u8> {
    match b {
        b'A'..=b'Z' => Some(b - b'A'),
        b'a'..=b'z' => Some(b - b'a' + 26),
        b'0'..=b'9' => Some(b - b'0' + 52),
        b'-' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}

/// Value of a character in the standard Base64 alphabet (`+` and `/` for 62 and 63).
pub(crate) fn standard_value(c: char) -> Option<u8> {
    match c {
        'A'..='Z' => Some(c as u8 - b'A'),
        'a'..='z' => Some(c as u8 - b'a' + 26),
        '0'..='9' => Some(c as u8 - b'0' + 52),
        '+' => Some(62),
        '/' => Some(63),
        _ => None,
    }
}
