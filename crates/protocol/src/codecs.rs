//! Big-endian field codecs
//!
//! Every multi-byte integer on the wire is an unsigned big-endian value of fixed
//! width. Reads check the remaining length first and report
//! [`ProtocolError::Truncated`] instead of panicking, so a short frame can never
//! take the reader down.

use crate::ProtocolError;
use bytes::{Buf, BufMut, BytesMut};

/// Width of the fixed, NUL-padded name fields
pub const NAME_LENGTH: usize = 30;

#[inline]
fn ensure(buf: &impl Buf, needed: usize) -> Result<(), ProtocolError> {
    if buf.remaining() < needed {
        return Err(ProtocolError::Truncated {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Read an unsigned byte
#[inline]
pub fn read_u8(buf: &mut impl Buf) -> Result<u8, ProtocolError> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

/// Read a signed byte (elevations)
#[inline]
pub fn read_i8(buf: &mut impl Buf) -> Result<i8, ProtocolError> {
    ensure(buf, 1)?;
    Ok(buf.get_i8())
}

/// Read a big-endian `u16`
#[inline]
pub fn read_u16(buf: &mut impl Buf) -> Result<u16, ProtocolError> {
    ensure(buf, 2)?;
    Ok(buf.get_u16())
}

/// Read a big-endian `u32`
#[inline]
pub fn read_u32(buf: &mut impl Buf) -> Result<u32, ProtocolError> {
    ensure(buf, 4)?;
    Ok(buf.get_u32())
}

/// Read a fixed-width, NUL-padded string field
///
/// The field always consumes `width` bytes; the string ends at the first NUL.
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn read_fixed_str(buf: &mut impl Buf, width: usize) -> Result<String, ProtocolError> {
    ensure(buf, width)?;
    let raw = buf.copy_to_bytes(width);
    let end = raw.iter().position(|&b| b == 0).unwrap_or(width);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Read a NUL-terminated string that runs to the end of the frame
///
/// A missing terminator is tolerated; everything after the terminator is
/// consumed and ignored.
pub fn read_cstring(buf: &mut impl Buf) -> Result<String, ProtocolError> {
    let raw = buf.copy_to_bytes(buf.remaining());
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Write a fixed-width, NUL-padded string field, truncating long input
pub fn write_fixed_str(buf: &mut BytesMut, value: &str, width: usize) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(width);
    buf.put_slice(&bytes[..len]);
    buf.put_bytes(0, width - len);
}

/// Write a NUL-terminated string
///
/// Interior NUL bytes would end the string early on the other side, so the
/// text is cut at the first one.
pub fn write_cstring(buf: &mut BytesMut, value: &str) {
    write_cstring_within(buf, value, usize::MAX);
}

/// Write a NUL-terminated string taking at most `max` bytes, terminator included
///
/// Text that does not fit is cut on a character boundary.
pub fn write_cstring_within(buf: &mut BytesMut, value: &str, max: usize) {
    if max == 0 {
        return;
    }
    let bytes = value.as_bytes();
    let mut end = bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(bytes.len())
        .min(max - 1);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    buf.put_slice(&bytes[..end]);
    buf.put_u8(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_big_endian() {
        let mut buf: &[u8] = &[0x12, 0x34, 0xDE, 0xAD, 0xBE, 0xEF, 0xFE];
        assert_eq!(read_u16(&mut buf).unwrap(), 0x1234);
        assert_eq!(read_u32(&mut buf).unwrap(), 0xDEAD_BEEF);
        assert_eq!(read_i8(&mut buf).unwrap(), -2);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_truncated_read_reports_error() {
        let mut buf: &[u8] = &[0x00, 0x01, 0x02];
        let err = read_u32(&mut buf).unwrap_err();
        assert_eq!(err, ProtocolError::Truncated { needed: 4, remaining: 3 });
        // Nothing consumed on failure
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_fixed_str_padding() {
        let mut out = BytesMut::new();
        write_fixed_str(&mut out, "Lord British", NAME_LENGTH);
        assert_eq!(out.len(), NAME_LENGTH);
        assert_eq!(out[12], 0);

        let mut buf: &[u8] = &out;
        assert_eq!(read_fixed_str(&mut buf, NAME_LENGTH).unwrap(), "Lord British");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fixed_str_truncates_long_names() {
        let long = "x".repeat(40);
        let mut out = BytesMut::new();
        write_fixed_str(&mut out, &long, NAME_LENGTH);
        assert_eq!(out.len(), NAME_LENGTH);
    }

    #[test]
    fn test_cstring_stops_at_terminator() {
        let mut buf: &[u8] = b"hail\0garbage";
        assert_eq!(read_cstring(&mut buf).unwrap(), "hail");
        assert!(buf.is_empty());

        let mut unterminated: &[u8] = b"open";
        assert_eq!(read_cstring(&mut unterminated).unwrap(), "open");
    }

    #[test]
    fn test_bounded_cstring_cuts_on_char_boundary() {
        let mut out = BytesMut::new();
        write_cstring_within(&mut out, "h\u{e9}llo", 3);
        assert_eq!(&out[..], b"h\0");

        let mut out = BytesMut::new();
        write_cstring_within(&mut out, "hail", 64);
        assert_eq!(&out[..], b"hail\0");

        let mut out = BytesMut::new();
        write_cstring_within(&mut out, "hail", 0);
        assert!(out.is_empty());
    }
}
