use tinyvec::ArrayVec;

pub mod cfg;
pub mod generator;
pub mod packets;

pub use cfg::{select_sentences, set_timepulse, TimepulseConfig};
pub use generator::{SendablePacket, UbxGenerator};
pub use packets::{CfgMsg, CfgTp5, NMEA_MESSAGE_IDS};

pub const UBX_SYNC_1: u8 = 0xb5;
pub const UBX_SYNC_2: u8 = 0x62;

/// Sync bytes, class, id and the two length bytes, plus the trailing checksum
pub const UBX_OVERHEAD: usize = 8;

/// Largest frame this driver ever builds (CFG-TP5)
pub const UBX_FRAME_SIZE: usize = UBX_OVERHEAD + packets::CFG_TP5_PAYLOAD_LEN;

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct UbxFrame(pub ArrayVec<[u8; UBX_FRAME_SIZE]>);

#[cfg(feature = "defmt")]
impl defmt::Format for UbxFrame {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.0.as_slice())
    }
}

impl core::ops::Deref for UbxFrame {
    type Target = ArrayVec<[u8; UBX_FRAME_SIZE]>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl core::ops::DerefMut for UbxFrame {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// 8-bit Fletcher checksum over class, id, length and payload.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UbxChecksum(pub u8, pub u8);

impl UbxChecksum {
    pub fn new() -> Self {
        Self(0, 0)
    }

    pub fn next(self, byte: u8) -> Self {
        let Self(a, b) = self;
        let a = a.wrapping_add(byte);
        Self(a, b.wrapping_add(a))
    }

    /// Checksum of a complete frame, skipping the sync bytes and the two
    /// trailing checksum bytes.
    pub fn of_frame(frame: &[u8]) -> Option<Self> {
        if frame.len() < UBX_OVERHEAD {
            return None;
        }
        Some(
            frame[2..frame.len() - 2]
                .iter()
                .fold(Self::new(), |ck, &b| ck.next(b)),
        )
    }
}

impl PartialEq<(u8, u8)> for UbxChecksum {
    fn eq(&self, (other_a, other_b): &(u8, u8)) -> bool {
        let Self(a, b) = self;
        a == other_a && b == other_b
    }
}
