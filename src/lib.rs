#![cfg_attr(not(test), no_std)]

// must come first so the log macros are visible to every other module
#[macro_use]
mod fmt;

pub mod config;
pub mod gps;
pub mod nmea;
pub mod rb;
pub mod stability;
pub mod transport;
pub mod ubx;

pub use config::{Config, GpsData, StabilityMode, BAUD_RATE};
pub use gps::{AcquisitionRequest, AcquisitionStatus, Gps, State};
pub use nmea::{GpsPosition, GpsTime, ParseError};
pub use rb::{FrameConsumer, FrameProducer, FrameRing};
pub use transport::{NoopTransport, SerialTransport, Transport};
pub use ubx::TimepulseConfig;

#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    #[error("acquisition request without callbacks")]
    NullParameter,
    #[error("an acquisition is already running")]
    AcquisitionRunning,
    #[error("data kind not enabled in this driver")]
    UnsupportedData,
    #[error("timepulse frequency {0} Hz out of range")]
    TimepulseFrequency(u32),
    #[error("timepulse duty cycle {0}% out of range")]
    TimepulseDutyCycle(u8),
    #[error("malformed sentence: {0}")]
    Parse(#[from] ParseError),
    #[error("transport error: {0:?}")]
    Transport(E),
}

pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Signed decimal degrees, north and east positive
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub lat: f32,
    pub lon: f32,
}
