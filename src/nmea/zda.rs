use chrono::{NaiveDate, NaiveDateTime};

use super::{decimal, fixed, is_message, verify_checksum, Fields, ParseResult};

const FIELD_MESSAGE: usize = 0;
const FIELD_TIME: usize = 1;
const FIELD_DAY: usize = 2;
const FIELD_MONTH: usize = 3;
const FIELD_YEAR: usize = 4;

const WIDTH_TIME: usize = 9; // hhmmss.ss
const WIDTH_DAY: usize = 2;
const WIDTH_MONTH: usize = 2;
const WIDTH_YEAR: usize = 4;

/// UTC date and time reported by the receiver. All zero until the first
/// successful decode.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsTime {
    pub year: u16,
    pub month: u8,
    pub date: u8,

    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl GpsTime {
    pub fn is_valid(&self) -> bool {
        (1..=31).contains(&self.date)
            && (1..=12).contains(&self.month)
            && self.year > 2023
            && self.year < 2094
            && self.hours < 24
            && self.minutes < 60
            && self.seconds < 60
    }

    /// `None` for the zero value and for dates the calendar rejects (Feb 30).
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.date as u32)?.and_hms_opt(
            self.hours as u32,
            self.minutes as u32,
            self.seconds as u32,
        )
    }
}

/// Decodes a ZDA sentence (`$xxZDA,hhmmss.ss,dd,mm,yyyy,zz,zz*hh`).
pub fn parse_zda(frame: &[u8]) -> ParseResult<GpsTime> {
    if !verify_checksum(frame) {
        return Ok(None);
    }
    let Some(fields) = Fields::new(frame) else {
        return Ok(None);
    };

    let mut time = GpsTime::default();
    let mut complete = false;
    for (idx, field) in fields.enumerate() {
        match idx {
            FIELD_MESSAGE => {
                if !is_message(field, b"ZDA") {
                    return Ok(None);
                }
            }
            FIELD_TIME => {
                let Some(f) = fixed(field, WIDTH_TIME) else {
                    return Ok(None);
                };
                time.hours = decimal(&f[0..2])? as u8;
                time.minutes = decimal(&f[2..4])? as u8;
                time.seconds = decimal(&f[4..6])? as u8;
            }
            FIELD_DAY => {
                let Some(f) = fixed(field, WIDTH_DAY) else {
                    return Ok(None);
                };
                time.date = decimal(f)? as u8;
            }
            FIELD_MONTH => {
                let Some(f) = fixed(field, WIDTH_MONTH) else {
                    return Ok(None);
                };
                time.month = decimal(f)? as u8;
            }
            FIELD_YEAR => {
                let Some(f) = fixed(field, WIDTH_YEAR) else {
                    return Ok(None);
                };
                time.year = decimal(f)? as u16;
                complete = true;
                break;
            }
            _ => {}
        }
    }

    Ok((complete && time.is_valid()).then_some(time))
}
