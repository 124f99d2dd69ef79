use super::{decimal, fixed, is_message, verify_checksum, Fields, ParseError, ParseResult};
use crate::Position;

const FIELD_MESSAGE: usize = 0;
const FIELD_LAT: usize = 2;
const FIELD_NS: usize = 3;
const FIELD_LONG: usize = 4;
const FIELD_EW: usize = 5;
const FIELD_ALT: usize = 9;
const FIELD_U_ALT: usize = 10;

const WIDTH_LAT: usize = 10; // ddmm.mmmmm
const WIDTH_LONG: usize = 11; // dddmm.mmmmm
const WIDTH_FLAG: usize = 1;

// Keeps the integer part inside i32.
const ALTITUDE_MAX_DIGITS: usize = 9;

/// Position of the last fix. Latitude and longitude are split into degrees,
/// whole minutes and the fractional part of the minutes times 100000 (kept in
/// the `*_seconds` fields). Altitude is above mean sea level, rounded to the
/// meter.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsPosition {
    pub lat_degrees: u8,
    pub lat_minutes: u8,
    pub lat_seconds: u32,
    pub lat_north: bool,

    pub long_degrees: u8,
    pub long_minutes: u8,
    pub long_seconds: u32,
    pub long_east: bool,

    pub altitude: i32,
}

impl GpsPosition {
    pub fn lat_degrees(&self) -> f32 {
        let lat = to_degrees(self.lat_degrees, self.lat_minutes, self.lat_seconds);
        if self.lat_north {
            lat
        } else {
            -lat
        }
    }

    pub fn lon_degrees(&self) -> f32 {
        let lon = to_degrees(self.long_degrees, self.long_minutes, self.long_seconds);
        if self.long_east {
            lon
        } else {
            -lon
        }
    }

    pub fn position(&self) -> Position {
        Position {
            lat: self.lat_degrees(),
            lon: self.lon_degrees(),
        }
    }
}

fn to_degrees(degrees: u8, minutes: u8, fraction: u32) -> f32 {
    degrees as f32 + (minutes as f32 + fraction as f32 / 100_000.0) / 60.0
}

// Wide enough to hold out-of-range values until the validity check.
#[derive(Default)]
struct Coordinate {
    degrees: u32,
    minutes: u32,
    fraction: u32,
}

impl Coordinate {
    fn parse(field: &[u8], degree_digits: usize) -> Result<Self, ParseError> {
        Ok(Self {
            degrees: decimal(&field[..degree_digits])?,
            minutes: decimal(&field[degree_digits..degree_digits + 2])?,
            // skip the decimal point
            fraction: decimal(&field[degree_digits + 3..])?,
        })
    }

    fn is_valid(&self, max_degrees: u32) -> bool {
        self.degrees < max_degrees && self.minutes < 60 && self.fraction < 100_000
    }
}

fn hemisphere(field: &[u8], positive: u8, negative: u8) -> Option<bool> {
    match fixed(field, WIDTH_FLAG)? {
        [b] if *b == positive => Some(true),
        [b] if *b == negative => Some(false),
        _ => None,
    }
}

/// Integer meters. A first fractional digit of 5 or more rounds away from
/// zero, anything else truncates.
fn altitude(field: &[u8]) -> ParseResult<i32> {
    if field.is_empty() {
        return Ok(None);
    }
    let int_len = field
        .iter()
        .position(|&b| b == b'.')
        .unwrap_or(field.len());
    let (negative, digits) = match &field[..int_len] {
        [b'-', digits @ ..] => (true, digits),
        digits => (false, digits),
    };
    if digits.len() > ALTITUDE_MAX_DIGITS {
        return Ok(None);
    }
    let mut meters = decimal(digits)? as i32;
    if field.len() - int_len >= 2 && decimal(&field[int_len + 1..int_len + 2])? >= 5 {
        meters += 1;
    }
    Ok(Some(if negative { -meters } else { meters }))
}

/// Decodes a GGA sentence
/// (`$xxGGA,time,lat,N,long,E,quality,numSV,HDOP,alt,M,sep,M,diffAge,diffStation*hh`).
pub fn parse_gga(frame: &[u8]) -> ParseResult<GpsPosition> {
    if !verify_checksum(frame) {
        return Ok(None);
    }
    let Some(fields) = Fields::new(frame) else {
        return Ok(None);
    };

    let mut lat = Coordinate::default();
    let mut long = Coordinate::default();
    let mut position = GpsPosition::default();
    let mut complete = false;
    for (idx, field) in fields.enumerate() {
        match idx {
            FIELD_MESSAGE => {
                if !is_message(field, b"GGA") {
                    return Ok(None);
                }
            }
            FIELD_LAT => {
                let Some(f) = fixed(field, WIDTH_LAT) else {
                    return Ok(None);
                };
                lat = Coordinate::parse(f, 2)?;
            }
            FIELD_NS => {
                let Some(north) = hemisphere(field, b'N', b'S') else {
                    return Ok(None);
                };
                position.lat_north = north;
            }
            FIELD_LONG => {
                let Some(f) = fixed(field, WIDTH_LONG) else {
                    return Ok(None);
                };
                long = Coordinate::parse(f, 3)?;
            }
            FIELD_EW => {
                let Some(east) = hemisphere(field, b'E', b'W') else {
                    return Ok(None);
                };
                position.long_east = east;
            }
            FIELD_ALT => {
                let Some(meters) = altitude(field)? else {
                    return Ok(None);
                };
                position.altitude = meters;
            }
            FIELD_U_ALT => {
                if fixed(field, WIDTH_FLAG) != Some(&b"M"[..]) {
                    return Ok(None);
                }
                complete = true;
                break;
            }
            _ => {}
        }
    }

    if !(complete && lat.is_valid(90) && long.is_valid(180)) {
        return Ok(None);
    }
    position.lat_degrees = lat.degrees as u8;
    position.lat_minutes = lat.minutes as u8;
    position.lat_seconds = lat.fraction;
    position.long_degrees = long.degrees as u8;
    position.long_minutes = long.minutes as u8;
    position.long_seconds = long.fraction;
    Ok(Some(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmea::tests::sentence;

    fn gga_with_altitude(alt: &str) -> std::vec::Vec<u8> {
        sentence(&std::format!(
            "$GPGGA,092725.00,4717.11399,N,00833.91590,E,1,08,1.01,{alt},M,48.0,M,,"
        ))
    }

    #[test]
    fn decodes_reference_sentence() {
        let frame =
            b"$GPGGA,121212.00,3745.12345,N,12230.54321,W,1,08,0.9,123.4,M,,,,*2C\r\n";
        let position = parse_gga(frame).unwrap().unwrap();
        assert_eq!(
            position,
            GpsPosition {
                lat_degrees: 37,
                lat_minutes: 45,
                lat_seconds: 12345,
                lat_north: true,
                long_degrees: 122,
                long_minutes: 30,
                long_seconds: 54321,
                long_east: false,
                altitude: 123,
            }
        );
    }

    #[test]
    fn altitude_rounding() {
        let alt = |s: &str| parse_gga(&gga_with_altitude(s)).unwrap().unwrap().altitude;
        assert_eq!(alt("499.6"), 500);
        assert_eq!(alt("499.5"), 500);
        assert_eq!(alt("499.49"), 499);
        assert_eq!(alt("499.0"), 499);
        assert_eq!(alt("499"), 499);
        assert_eq!(alt("499."), 499);
        assert_eq!(alt("0.5"), 1);
        assert_eq!(alt("-12.7"), -13);
        assert_eq!(alt("-12.2"), -12);
    }

    #[test]
    fn empty_altitude_is_not_decoded() {
        assert_eq!(parse_gga(&gga_with_altitude("")), Ok(None));
    }

    #[test]
    fn oversized_altitude_is_not_decoded() {
        assert_eq!(parse_gga(&gga_with_altitude("1234567890.1")), Ok(None));
    }

    #[test]
    fn malformed_altitude_is_an_error() {
        assert_eq!(
            parse_gga(&gga_with_altitude("4a9.1")),
            Err(ParseError::InvalidDigit(b'a'))
        );
        assert_eq!(
            parse_gga(&gga_with_altitude("499.x")),
            Err(ParseError::InvalidDigit(b'x'))
        );
        assert_eq!(parse_gga(&gga_with_altitude(".5")), Err(ParseError::NoDigits));
    }

    #[test]
    fn no_fix_is_not_decoded() {
        let frame = sentence("$GPGGA,092725.00,,,,,0,00,99.99,,,,,,");
        assert_eq!(parse_gga(&frame), Ok(None));
    }

    #[test]
    fn hemisphere_must_be_known() {
        let frame = sentence("$GPGGA,092725.00,4717.11399,X,00833.91590,E,1,08,1.01,499.6,M,48.0,M,,");
        assert_eq!(parse_gga(&frame), Ok(None));
        let frame = sentence("$GPGGA,092725.00,4717.11399,S,00833.91590,Q,1,08,1.01,499.6,M,48.0,M,,");
        assert_eq!(parse_gga(&frame), Ok(None));
    }

    #[test]
    fn altitude_unit_must_be_meters() {
        let frame = sentence("$GPGGA,092725.00,4717.11399,N,00833.91590,E,1,08,1.01,499.6,F,48.0,M,,");
        assert_eq!(parse_gga(&frame), Ok(None));
    }

    #[test]
    fn altitude_unit_must_be_closed_by_a_separator() {
        let frame = sentence("$GPGGA,092725.00,4717.11399,N,00833.91590,E,1,08,1.01,499.6,M");
        assert_eq!(parse_gga(&frame), Ok(None));
    }

    #[test]
    fn out_of_range_coordinates_are_not_decoded() {
        let frame = sentence("$GPGGA,092725.00,9017.11399,N,00833.91590,E,1,08,1.01,499.6,M,48.0,M,,");
        assert_eq!(parse_gga(&frame), Ok(None));
        let frame = sentence("$GPGGA,092725.00,4760.11399,N,00833.91590,E,1,08,1.01,499.6,M,48.0,M,,");
        assert_eq!(parse_gga(&frame), Ok(None));
        let frame = sentence("$GPGGA,092725.00,4717.11399,N,18033.91590,E,1,08,1.01,499.6,M,48.0,M,,");
        assert_eq!(parse_gga(&frame), Ok(None));
        // would wrap to a plausible value if narrowed before checking
        let frame = sentence("$GPGGA,092725.00,4717.11399,N,30033.91590,E,1,08,1.01,499.6,M,48.0,M,,");
        assert_eq!(parse_gga(&frame), Ok(None));
    }

    #[test]
    fn wrong_message_is_not_decoded() {
        let frame = sentence("$GPRMC,092725.00,4717.11399,N,00833.91590,E,1,08,1.01,499.6,M,48.0,M,,");
        assert_eq!(parse_gga(&frame), Ok(None));
    }

    #[test]
    fn converts_to_signed_degrees() {
        let frame = sentence("$GPGGA,092725.00,4730.00000,S,00815.00000,W,1,08,1.01,499.6,M,48.0,M,,");
        let position = parse_gga(&frame).unwrap().unwrap().position();
        assert!((position.lat + 47.5).abs() < 1e-4);
        assert!((position.lon + 8.25).abs() < 1e-4);
    }
}
