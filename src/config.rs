/// UART speed the receiver ships with
pub const BAUD_RATE: u32 = 9600;

/// What an acquisition collects
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpsData {
    /// Date and time, from ZDA sentences
    Time,
    /// Latitude, longitude and altitude, from GGA sentences
    Position,
}

/// Where the altitude stability threshold comes from.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StabilityMode {
    /// Position acquisitions only ever report `Found`
    #[default]
    Disabled,
    /// Same threshold for every acquisition
    Fixed(u8),
    /// Threshold taken from each `AcquisitionRequest`
    Runtime,
}

/// Capabilities of a driver instance, fixed at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub time: bool,
    pub position: bool,
    pub stability: StabilityMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time: true,
            position: true,
            stability: StabilityMode::Disabled,
        }
    }
}

impl Config {
    pub fn with_stability(self, stability: StabilityMode) -> Self {
        Self { stability, ..self }
    }

    pub fn supports(&self, data: GpsData) -> bool {
        match data {
            GpsData::Time => self.time,
            GpsData::Position => self.position,
        }
    }

    /// Threshold in effect for an acquisition that requested `requested`.
    pub fn stability_threshold(&self, requested: u8) -> u8 {
        match self.stability {
            StabilityMode::Disabled => 0,
            StabilityMode::Fixed(threshold) => threshold,
            StabilityMode::Runtime => requested,
        }
    }
}
