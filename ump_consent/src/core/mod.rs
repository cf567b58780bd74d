use crate::core::base64::Base64Reader;
use bitstream_io::{BigEndian, BitRead, BitReader};
use std::collections::BTreeSet;
use std::io;
use std::io::{Cursor, Read};
use std::iter::repeat_with;

pub(crate) mod base64;

pub use base64::DecodeError;

/// Bit-level reading primitives for the fields of a TC string.
pub(crate) trait DataRead {
    fn read_string(&mut self, chars: usize) -> io::Result<String>;

    fn read_deciseconds(&mut self) -> io::Result<u64>;

    fn read_fixed_bitfield(&mut self, bits: usize) -> io::Result<BTreeSet<u16>>;

    fn read_integer_range(&mut self) -> io::Result<BTreeSet<u16>>;

    /// Reads a vendor section: the max vendor id, then either a bitfield or a range list.
    fn read_optimized_integer_range(&mut self) -> io::Result<(u16, BTreeSet<u16>)>;
}

impl<T> DataRead for T
where
    T: BitRead,
{
    fn read_string(&mut self, chars: usize) -> io::Result<String> {
        repeat_with(|| self.read_unsigned::<6, u8>())
            .take(chars)
            .map(|r| r.map(|n| (n + b'A') as char))
            .collect::<Result<String, _>>()
    }

    fn read_deciseconds(&mut self) -> io::Result<u64> {
        self.read_unsigned::<36, u64>()
    }

    fn read_fixed_bitfield(&mut self, bits: usize) -> io::Result<BTreeSet<u16>> {
        let mut result = BTreeSet::new();
        for i in 1..=bits {
            if self.read_bit()? {
                result.insert(i as u16);
            }
        }

        Ok(result)
    }

    fn read_integer_range(&mut self) -> io::Result<BTreeSet<u16>> {
        let n = self.read_unsigned::<12, u16>()?;
        let mut range = BTreeSet::new();

        for _ in 0..n {
            let is_group = self.read_bit()?;
            if is_group {
                let start = self.read_unsigned::<16, u16>()?;
                let end = self.read_unsigned::<16, u16>()?;
                range.extend(start..=end);
            } else {
                range.insert(self.read_unsigned::<16, u16>()?);
            }
        }

        Ok(range)
    }

    fn read_optimized_integer_range(&mut self) -> io::Result<(u16, BTreeSet<u16>)> {
        let max_id = self.read_unsigned::<16, u16>()?;
        let is_int_range = self.read_bit()?;
        let ids = if is_int_range {
            self.read_integer_range()?
        } else {
            self.read_fixed_bitfield(max_id as usize)?
        };

        Ok((max_id, ids))
    }
}

pub(crate) type Base64BitReader = BitReader<Cursor<Vec<u8>>, BigEndian>;

/// Decodes a URL-safe Base64 string and returns a bit reader over its bytes.
pub(crate) fn base64_bit_reader(s: &str) -> io::Result<Base64BitReader> {
    let mut bytes = Vec::with_capacity(s.len() * 6 / 8 + 1);
    Base64Reader::new(s.as_bytes()).read_to_end(&mut bytes)?;

    Ok(BitReader::endian(Cursor::new(bytes), BigEndian))
}

/// Fails with `UnexpectedEof` if the reader went past the bits encoded by `chars` characters,
/// into the zero bits completing the last byte.
pub(crate) fn ensure_encoded_bits(r: &mut Base64BitReader, chars: usize) -> io::Result<()> {
    if r.position_in_bits()? > 6 * chars as u64 {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }

    Ok(())
}
