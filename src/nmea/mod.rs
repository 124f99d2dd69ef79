//! NMEA sentence checksum and field scanning, shared by the ZDA and GGA
//! decoders.
//!
//! Decoders return `Ok(None)` for anything that is structurally wrong (bad
//! checksum, unexpected message id, wrong field width, values out of range).
//! Only a malformed number inside a well-formed field is an error.

use crate::config::GpsData;

pub mod gga;
pub mod zda;

pub use gga::{parse_gga, GpsPosition};
pub use zda::{parse_zda, GpsTime};

pub const NMEA_START: u8 = b'$';
pub const NMEA_CHECKSUM_START: u8 = b'*';
pub const NMEA_SEPARATOR: u8 = b',';
pub const NMEA_END: u8 = b'\n';

/// Longest sentence the receiver emits, terminator included
pub const NMEA_FRAME_SIZE: usize = 128;

#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    #[error("invalid digit {0:#04x}")]
    InvalidDigit(u8),
    #[error("number without digits")]
    NoDigits,
}

/// `Ok(None)` means the frame was read but not decoded.
pub type ParseResult<T> = Result<Option<T>, ParseError>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sentence {
    Time(GpsTime),
    Position(GpsPosition),
}

impl Sentence {
    /// Decodes `frame` with the decoder matching the acquired data kind.
    pub fn parse(data: GpsData, frame: &[u8]) -> ParseResult<Self> {
        Ok(match data {
            GpsData::Time => parse_zda(frame)?.map(Sentence::Time),
            GpsData::Position => parse_gga(frame)?.map(Sentence::Position),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Checksum ////////////////////////////////////////////////////////////////////
////////////////////////////////////////////////////////////////////////////////

/// XOR of every byte between `$` and `*`, or `None` if either is missing.
pub fn compute_checksum(frame: &[u8]) -> Option<u8> {
    let start = frame.iter().position(|&b| b == NMEA_START)?;
    let body = &frame[start + 1..];
    let end = body.iter().position(|&b| b == NMEA_CHECKSUM_START)?;
    Some(body[..end].iter().fold(0, |ck, &b| ck ^ b))
}

/// The two hex digits following `*`.
pub fn received_checksum(frame: &[u8]) -> Option<u8> {
    let star = frame.iter().position(|&b| b == NMEA_CHECKSUM_START)?;
    match frame.get(star + 1..star + 3)? {
        &[hi, lo] => Some(hex_digit(hi)? << 4 | hex_digit(lo)?),
        _ => None,
    }
}

pub fn verify_checksum(frame: &[u8]) -> bool {
    match (compute_checksum(frame), received_checksum(frame)) {
        (Some(computed), Some(received)) => computed == received,
        _ => false,
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

////////////////////////////////////////////////////////////////////////////////
// Fields //////////////////////////////////////////////////////////////////////
////////////////////////////////////////////////////////////////////////////////

/// Comma-terminated fields of a sentence, starting after `$`.
///
/// A field is only yielded once its closing comma has been seen, so whatever
/// sits between the last comma and `*` is never returned. Scanning stops at
/// the line terminator.
pub struct Fields<'a> {
    buf: &'a [u8],
    start: usize,
    pos: usize,
}

impl<'a> Fields<'a> {
    pub fn new(frame: &'a [u8]) -> Option<Self> {
        let start = frame.iter().position(|&b| b == NMEA_START)? + 1;
        Some(Self {
            buf: frame,
            start,
            pos: start,
        })
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&b) = self.buf.get(self.pos) {
            if b == NMEA_END {
                self.pos = self.buf.len();
                return None;
            }
            self.pos += 1;
            if b == NMEA_SEPARATOR {
                let field = &self.buf[self.start..self.pos - 1];
                self.start = self.pos;
                return Some(field);
            }
        }
        None
    }
}

/// The field if it is exactly `width` bytes long.
pub(crate) fn fixed(field: &[u8], width: usize) -> Option<&[u8]> {
    (field.len() == width).then_some(field)
}

/// Checks the address field: 2-char talker followed by the message code.
pub(crate) fn is_message(field: &[u8], code: &[u8; 3]) -> bool {
    matches!(fixed(field, 5), Some(f) if &f[2..] == code)
}

pub(crate) fn decimal(digits: &[u8]) -> Result<u32, ParseError> {
    if digits.is_empty() {
        return Err(ParseError::NoDigits);
    }
    digits.iter().try_fold(0u32, |acc, &b| match b {
        b'0'..=b'9' => Ok(acc * 10 + (b - b'0') as u32),
        _ => Err(ParseError::InvalidDigit(b)),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Appends `*hh\r\n` with the correct checksum to a `$...` body.
    pub fn sentence(body: &str) -> std::vec::Vec<u8> {
        let ck = body.bytes().skip(1).fold(0u8, |ck, b| ck ^ b);
        std::format!("{body}*{ck:02X}\r\n").into_bytes()
    }

    #[test]
    fn checksum_of_known_sentence() {
        let frame = b"$GPZDA,082710.00,16,09,2002,00,00*64\r\n";
        assert_eq!(compute_checksum(frame), Some(0x64));
        assert_eq!(received_checksum(frame), Some(0x64));
        assert!(verify_checksum(frame));
    }

    #[test]
    fn flipped_checksum_digit_fails() {
        let mut frame = b"$GPZDA,082710.00,16,09,2002,00,00*64\r\n".to_vec();
        frame[34] = b'5';
        assert_eq!(received_checksum(&frame), Some(0x54));
        assert!(!verify_checksum(&frame));
    }

    #[test]
    fn checksum_accepts_lowercase_hex() {
        // XOR of the body is 0x3b
        let frame = b"$GPTXT,01,01,02,ANTSTATUS=OK*3b\r\n";
        assert!(verify_checksum(frame));
        assert_eq!(sentence("$GPTXT,01,01,02,ANTSTATUS=OK"), b"$GPTXT,01,01,02,ANTSTATUS=OK*3B\r\n");
    }

    #[test]
    fn missing_markers_are_not_found() {
        assert_eq!(compute_checksum(b"GPZDA,1*00\r\n"), None);
        assert_eq!(compute_checksum(b"$GPZDA,1\r\n"), None);
        assert_eq!(received_checksum(b"$GPZDA,1\r\n"), None);
        assert!(!verify_checksum(b"$GPZDA,1\r\n"));
    }

    #[test]
    fn malformed_received_checksum_is_not_found() {
        assert_eq!(received_checksum(b"$A*G1\r\n"), None);
        assert_eq!(received_checksum(b"$A*4"), None);
        // computed XOR of "A" is 0x41, but the received digits don't decode
        assert!(!verify_checksum(b"$A*4Z\r\n"));
        assert!(verify_checksum(b"$A*41\r\n"));
    }

    #[test]
    fn fields_stop_at_terminator_and_skip_unclosed_tail() {
        let frame = b"$GPGGA,a,,bc*00\r\n,x,";
        let fields: std::vec::Vec<&[u8]> = Fields::new(frame).unwrap().collect();
        let expected: [&[u8]; 3] = [b"GPGGA", b"a", b""];
        assert_eq!(fields, expected);
    }

    #[test]
    fn fields_need_a_start_marker() {
        assert!(Fields::new(b"GPGGA,1,2,\r\n").is_none());
    }

    #[test]
    fn decimal_digits() {
        assert_eq!(decimal(b"0042"), Ok(42));
        assert_eq!(decimal(b"4x"), Err(ParseError::InvalidDigit(b'x')));
        assert_eq!(decimal(b""), Err(ParseError::NoDigits));
    }

    #[test]
    fn message_id_check() {
        assert!(is_message(b"GPZDA", b"ZDA"));
        assert!(is_message(b"GNZDA", b"ZDA"));
        assert!(!is_message(b"GPGGA", b"ZDA"));
        assert!(!is_message(b"GPZDAX", b"ZDA"));
    }
}
