use std::io::Read;

use crate::class_parser::ParseError;

pub trait BEReader<const N: usize>: Sized {
    fn from_byte_array(buf: [u8; N]) -> Self;

    fn read(reader: &mut impl Read) -> Result<Self, ParseError> {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf).map_err(|_| ParseError::Truncated)?;

        Ok(Self::from_byte_array(buf))
    }
}

// We can't abstract over from_be_bytes, because no trait exposes it, so we
// resort to a macro. 64-bit widths go through from_be_bytes directly and keep
// the full value range.
macro_rules! be_reader {
    ($t: ty, $n: expr) => {
        impl BEReader<$n> for $t {
            fn from_byte_array(buf: [u8; $n]) -> Self {
                <$t>::from_be_bytes(buf)
            }
        }
    }
}

be_reader!(u8, 1);
be_reader!(u16, 2);
be_reader!(u32, 4);
be_reader!(u64, 8);
be_reader!(i8, 1);
be_reader!(i16, 2);
be_reader!(i32, 4);
be_reader!(i64, 8);
be_reader!(f32, 4);
be_reader!(f64, 8);

pub fn read_bytes(reader: &mut impl Read, length: usize) -> Result<Vec<u8>, ParseError> {
    let mut buf = vec![0; length];
    reader.read_exact(&mut buf).map_err(|_| ParseError::Truncated)?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::class_parser::be_reader::{read_bytes, BEReader};
    use crate::class_parser::types::{U2, U4, U8};
    use crate::class_parser::ParseError;

    #[test]
    fn widths_advance_in_order() {
        let buf = [0x12u8, 0x34, 0x00, 0x00, 0x00, 0x2A];
        let mut cursor = Cursor::new(&buf[..]);

        assert_eq!(U2::read(&mut cursor).unwrap(), 0x1234);
        assert_eq!(U4::read(&mut cursor).unwrap(), 42);
    }

    #[test]
    fn full_64_bit_range() {
        // All-ones must survive as a complete 64-bit value, sign bit included.
        let buf = [0xFFu8; 8];

        let unsigned = U8::read(&mut Cursor::new(&buf[..])).unwrap();
        assert_eq!(unsigned, u64::MAX);

        let signed = i64::read(&mut Cursor::new(&buf[..])).unwrap();
        assert_eq!(signed, -1);
    }

    #[test]
    fn floats_decode_big_endian() {
        let bytes = 3.5f64.to_be_bytes();
        assert_eq!(f64::read(&mut Cursor::new(&bytes[..])).unwrap(), 3.5);

        let bytes = (-0.25f32).to_be_bytes();
        assert_eq!(f32::read(&mut Cursor::new(&bytes[..])).unwrap(), -0.25);
    }

    #[test]
    fn reading_past_end_is_truncation() {
        let buf = [0xCAu8, 0xFE];
        let mut cursor = Cursor::new(&buf[..]);

        assert!(matches!(U4::read(&mut cursor), Err(ParseError::Truncated)));
        assert!(matches!(
            read_bytes(&mut Cursor::new(&buf[..]), 3),
            Err(ParseError::Truncated)
        ));
    }
}
