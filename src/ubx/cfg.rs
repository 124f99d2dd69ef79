use super::{
    generator::SendablePacket,
    packets::{
        CfgMsg, CfgTp5, NMEA_MESSAGE_IDS, TIMEPULSE_DUTY_CYCLE_MAX_PERCENT,
        TIMEPULSE_FREQUENCY_MAX_HZ,
    },
};
use crate::{transport::Transport, Error};

/// The receiver drops configuration frames sent back to back.
pub const MESSAGE_PACING_MS: u32 = 100;

/// Enables the NMEA sentences whose bit is set in `mask` and disables all the
/// others. Bit `i` selects `NMEA_MESSAGE_IDS[i]`. Stops at the first failure.
pub fn select_sentences<T: Transport>(transport: &mut T, mask: u32) -> Result<(), T::Error> {
    debug!("selecting nmea sentences {=u32:#x}", mask);
    for (i, &msg_id) in NMEA_MESSAGE_IDS.iter().enumerate() {
        CfgMsg::nmea(msg_id, mask & (1 << i) != 0).send(transport)?;
        transport.delay_ms(MESSAGE_PACING_MS)?;
    }
    Ok(())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimepulseConfig {
    pub active: bool,
    pub frequency_hz: u32,
    pub duty_cycle_percent: u8,
}

impl TimepulseConfig {
    pub fn validate<E>(&self) -> crate::Result<(), E> {
        if self.frequency_hz > TIMEPULSE_FREQUENCY_MAX_HZ {
            return Err(Error::TimepulseFrequency(self.frequency_hz));
        }
        if self.duty_cycle_percent > TIMEPULSE_DUTY_CYCLE_MAX_PERCENT {
            return Err(Error::TimepulseDutyCycle(self.duty_cycle_percent));
        }
        Ok(())
    }
}

/// Sends a single CFG-TP5 frame. Nothing is sent if the configuration is out
/// of range.
pub fn set_timepulse<T: Transport>(
    transport: &mut T,
    config: &TimepulseConfig,
) -> crate::Result<(), T::Error> {
    config.validate::<T::Error>()?;
    info!(
        "timepulse active={=bool} {=u32} Hz {=u8}%",
        config.active,
        config.frequency_hz,
        config.duty_cycle_percent
    );
    CfgTp5::new(config.active, config.frequency_hz, config.duty_cycle_percent)
        .send(transport)
        .map_err(Error::Transport)
}
