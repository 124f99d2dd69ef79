use bytemuck::{Pod, Zeroable};

use super::generator::SendablePacket;

////////////////////////////////////////////////////////////////////////////////
// CFG-MSG /////////////////////////////////////////////////////////////////////
////////////////////////////////////////////////////////////////////////////////

pub const CFG_MSG_PAYLOAD_LEN: usize = 8;

/// Message class of the standard NMEA sentences
pub const NMEA_STANDARD_CLASS: u8 = 0xf0;

/// Standard NMEA message ids, in the order of the sentence selection mask
/// bits: GGA is bit 3, ZDA is bit 17.
pub const NMEA_MESSAGE_IDS: [u8; 18] = [
    0x0a, // DTM
    0x44, // GBQ
    0x09, // GBS
    0x00, // GGA
    0x01, // GLL
    0x43, // GLQ
    0x42, // GNQ
    0x0d, // GNS
    0x40, // GPQ
    0x06, // GRS
    0x02, // GSA
    0x07, // GST
    0x03, // GSV
    0x04, // RMC
    0x41, // TXT
    0x0f, // VLW
    0x05, // VTG
    0x08, // ZDA
];

pub const NMEA_GGA_MASK: u32 = 1 << 3;
pub const NMEA_ZDA_MASK: u32 = 1 << 17;

/// Sets the output rate of one NMEA message on all six ports.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CfgMsg {
    pub msg_class: u8,
    pub msg_id: u8,
    pub rates: [u8; 6],
}

impl CfgMsg {
    pub fn nmea(msg_id: u8, enabled: bool) -> Self {
        Self {
            msg_class: NMEA_STANDARD_CLASS,
            msg_id,
            rates: [enabled as u8; 6],
        }
    }
}

impl SendablePacket for CfgMsg {
    type I = core::array::IntoIter<u8, CFG_MSG_PAYLOAD_LEN>;

    fn class(&self) -> u8 {
        0x06
    }

    fn id(&self) -> u8 {
        0x01
    }

    fn payload_len(&self) -> usize {
        CFG_MSG_PAYLOAD_LEN
    }

    fn payload_bytes(self) -> Self::I {
        let [r0, r1, r2, r3, r4, r5] = self.rates;
        [self.msg_class, self.msg_id, r0, r1, r2, r3, r4, r5].into_iter()
    }
}

////////////////////////////////////////////////////////////////////////////////
// CFG-TP5 /////////////////////////////////////////////////////////////////////
////////////////////////////////////////////////////////////////////////////////

pub const CFG_TP5_PAYLOAD_LEN: usize = 32;

pub const TIMEPULSE_FREQUENCY_MAX_HZ: u32 = 10_000_000;
pub const TIMEPULSE_DUTY_CYCLE_MAX_PERCENT: u8 = 100;

// active | lockGnssFreq | isFreq | polarity (rising edge at top of second)
pub const TP5_FLAGS_ACTIVE: u32 = 0x4b;
pub const TP5_FLAGS_INACTIVE: u32 = 0x4a;

/// CFG-TP5 payload, version 1.
///
/// Every field is stored little-endian, so `bytemuck::cast` yields the wire
/// layout on any host.
// SAFETY: All fields are naturally aligned, so there is no padding.
#[repr(C)]
#[derive(Pod, Zeroable, Copy, Clone, Debug, PartialEq, Eq)]
pub struct CfgTp5 {
    pub tp_idx: u8,
    pub version: u8,
    pub reserved1: [u8; 2],
    pub ant_cable_delay: i16,
    pub rf_group_delay: i16,
    pub freq_period: u32,
    pub freq_period_lock: u32,
    pub pulse_len_ratio: u32,
    pub pulse_len_ratio_lock: u32,
    pub user_config_delay: i32,
    pub flags: u32,
}

impl CfgTp5 {
    /// Timepulse 0 running at `frequency_hz` with the given duty cycle.
    /// Range checks are the caller's job.
    pub fn new(active: bool, frequency_hz: u32, duty_cycle_percent: u8) -> Self {
        Self {
            tp_idx: 0,
            version: 1,
            freq_period: frequency_hz.to_le(),
            pulse_len_ratio: pulse_len_ratio(duty_cycle_percent).to_le(),
            flags: if active {
                TP5_FLAGS_ACTIVE
            } else {
                TP5_FLAGS_INACTIVE
            }
            .to_le(),
            ..Zeroable::zeroed()
        }
    }
}

/// `round(duty / 100 * (2^32 - 1))`, in integer arithmetic.
pub fn pulse_len_ratio(duty_cycle_percent: u8) -> u32 {
    let scaled = duty_cycle_percent as u64 * u32::MAX as u64;
    ((scaled + 50) / 100).min(u32::MAX as u64) as u32
}

impl SendablePacket for CfgTp5 {
    type I = core::array::IntoIter<u8, CFG_TP5_PAYLOAD_LEN>;

    fn class(&self) -> u8 {
        0x06
    }

    fn id(&self) -> u8 {
        0x31
    }

    fn payload_len(&self) -> usize {
        CFG_TP5_PAYLOAD_LEN
    }

    fn payload_bytes(self) -> Self::I {
        bytemuck::cast::<Self, [u8; CFG_TP5_PAYLOAD_LEN]>(self).into_iter()
    }
}
