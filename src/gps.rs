//! Acquisition state machine.
//!
//! A [`Gps`] owns the transport and the reading end of the frame ring. While
//! an acquisition runs, the receiver is told to emit only the sentence for
//! the requested data kind, and every frame handed over by the interrupt is
//! decoded in [`Gps::process`]. Each successful decode is reported through
//! the completion callback. Acquisitions never end on their own.

use crate::{
    config::{Config, GpsData, BAUD_RATE},
    nmea::{GpsPosition, GpsTime, Sentence},
    rb::FrameConsumer,
    stability::StabilityFilter,
    transport::Transport,
    ubx::{
        cfg::{self, TimepulseConfig},
        packets::{NMEA_GGA_MASK, NMEA_ZDA_MASK},
    },
    Error, Result,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionStatus {
    /// A sentence was decoded and the retained value updated
    Found,
    /// Same as `Found`, and the altitude has settled
    Stable,
}

#[derive(Debug, Copy, Clone)]
pub struct AcquisitionRequest {
    pub gps_data: GpsData,
    /// Fired from the receive interrupt after each sentence. Should only
    /// schedule a call to [`Gps::process`].
    pub process_cb: Option<fn()>,
    /// Called from [`Gps::process`] after each successful decode
    pub completion_cb: Option<fn(AcquisitionStatus)>,
    /// Used with [`StabilityMode::Runtime`](crate::StabilityMode::Runtime)
    pub altitude_stability_threshold: u8,
}

impl AcquisitionRequest {
    pub fn new(gps_data: GpsData, process_cb: fn(), completion_cb: fn(AcquisitionStatus)) -> Self {
        Self {
            gps_data,
            process_cb: Some(process_cb),
            completion_cb: Some(completion_cb),
            altitude_stability_threshold: 0,
        }
    }

    pub fn with_stability_threshold(self, altitude_stability_threshold: u8) -> Self {
        Self {
            altitude_stability_threshold,
            ..self
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Idle,
    Acquiring(GpsData),
}

#[derive(Copy, Clone)]
struct Acquisition {
    data: GpsData,
    completion_cb: fn(AcquisitionStatus),
    threshold: u8,
}

pub struct Gps<T: Transport> {
    transport: T,
    frames: FrameConsumer,
    config: Config,
    acquisition: Option<Acquisition>,

    last_time: GpsTime,
    last_position: GpsPosition,
    stability: StabilityFilter,
}

impl<T: Transport> Gps<T> {
    pub fn new(transport: T, frames: FrameConsumer, config: Config) -> Self {
        Self {
            transport,
            frames,
            config,
            acquisition: None,
            last_time: GpsTime::default(),
            last_position: GpsPosition::default(),
            stability: StabilityFilter::new(),
        }
    }

    /// Forgets any acquisition and pending frame, then brings the link up at
    /// [`BAUD_RATE`].
    pub fn init(&mut self) -> Result<(), T::Error> {
        self.acquisition = None;
        self.frames.set_trigger(None);
        self.frames.clear();
        self.transport.init(BAUD_RATE).map_err(Error::Transport)
    }

    pub fn de_init(&mut self) -> Result<(), T::Error> {
        self.transport.de_init().map_err(Error::Transport)
    }

    /// Starts collecting `request.gps_data`.
    ///
    /// The retained record for that kind goes back to all zero.
    ///
    /// Requests are fully checked before anything changes. Once the checks
    /// pass the driver is acquiring, even if configuring the receiver or
    /// enabling reception then fails: call
    /// [`stop_acquisition`](Self::stop_acquisition) to recover.
    pub fn start_acquisition(&mut self, request: &AcquisitionRequest) -> Result<(), T::Error> {
        if self.acquisition.is_some() {
            return Err(Error::AcquisitionRunning);
        }
        let (Some(process_cb), Some(completion_cb)) = (request.process_cb, request.completion_cb)
        else {
            return Err(Error::NullParameter);
        };
        let data = request.gps_data;
        if !self.config.supports(data) {
            return Err(Error::UnsupportedData);
        }

        let threshold = self
            .config
            .stability_threshold(request.altitude_stability_threshold);
        info!("acquisition start {}, stability threshold {=u8}", data, threshold);

        match data {
            GpsData::Time => self.last_time = GpsTime::default(),
            GpsData::Position => self.last_position = GpsPosition::default(),
        }
        self.stability.reset();
        self.frames.clear();
        self.acquisition = Some(Acquisition {
            data,
            completion_cb,
            threshold,
        });
        self.frames.set_trigger(Some(process_cb));

        let mask = match data {
            GpsData::Time => NMEA_ZDA_MASK,
            GpsData::Position => NMEA_GGA_MASK,
        };
        cfg::select_sentences(&mut self.transport, mask).map_err(Error::Transport)?;
        self.transport.start_receive().map_err(Error::Transport)
    }

    /// Always leaves the driver idle. A failure to stop reception is still
    /// reported.
    pub fn stop_acquisition(&mut self) -> Result<(), T::Error> {
        if self.acquisition.take().is_some() {
            info!("acquisition stop");
        }
        self.frames.set_trigger(None);
        self.transport.stop_receive().map_err(Error::Transport)
    }

    /// Decodes the pending frame, if any.
    ///
    /// Returns the status passed to the completion callback, or `None` when
    /// there was no frame or it was not a valid sentence of the acquired kind.
    pub fn process(&mut self) -> Result<Option<AcquisitionStatus>, T::Error> {
        let Some(acquisition) = self.acquisition else {
            if self.frames.is_ready() {
                trace!("frame discarded while idle");
                self.frames.clear();
            }
            return Ok(None);
        };
        let Some(parsed) = self
            .frames
            .read(|frame| Sentence::parse(acquisition.data, frame))
        else {
            return Ok(None);
        };

        let status = match parsed? {
            None => {
                trace!("frame not decoded");
                return Ok(None);
            }
            Some(Sentence::Time(time)) => {
                self.last_time = time;
                AcquisitionStatus::Found
            }
            Some(Sentence::Position(position)) => {
                self.last_position = position;
                if self.stability.update(position.altitude, acquisition.threshold) {
                    AcquisitionStatus::Stable
                } else {
                    AcquisitionStatus::Found
                }
            }
        };
        debug!("acquisition {}", status);
        (acquisition.completion_cb)(status);
        Ok(Some(status))
    }

    /// Last decoded time, all zero if none yet
    pub fn get_time(&self) -> GpsTime {
        self.last_time
    }

    /// Last decoded position, all zero if none yet
    pub fn get_position(&self) -> GpsPosition {
        self.last_position
    }

    pub fn set_backup_voltage(&mut self, on: bool) -> Result<(), T::Error> {
        self.transport.set_power(on).map_err(Error::Transport)
    }

    pub fn backup_voltage(&self) -> bool {
        self.transport.power()
    }

    pub fn set_timepulse(&mut self, config: &TimepulseConfig) -> Result<(), T::Error> {
        cfg::set_timepulse(&mut self.transport, config)
    }

    pub fn state(&self) -> State {
        match self.acquisition {
            Some(acquisition) => State::Acquiring(acquisition.data),
            None => State::Idle,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn frames(&self) -> &FrameConsumer {
        &self.frames
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn release(self) -> (T, FrameConsumer) {
        (self.transport, self.frames)
    }
}
