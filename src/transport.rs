//! The byte link to the receiver.
//!
//! Received bytes don't go through this trait: the UART interrupt feeds them
//! straight into a [`FrameProducer`](crate::rb::FrameProducer).

use core::{convert::Infallible, fmt::Debug};

use embedded_hal::{blocking::delay::DelayMs, serial};

pub trait Transport {
    type Error: Debug;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
    fn start_receive(&mut self) -> Result<(), Self::Error>;
    fn stop_receive(&mut self) -> Result<(), Self::Error>;
    fn delay_ms(&mut self, ms: u32) -> Result<(), Self::Error>;

    fn init(&mut self, _baud_rate: u32) -> Result<(), Self::Error> {
        Ok(())
    }

    fn de_init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Switches the receiver's backup supply. Boards without one ignore it.
    fn set_power(&mut self, _on: bool) -> Result<(), Self::Error> {
        Ok(())
    }

    fn power(&self) -> bool {
        false
    }
}

/// Accepts everything and does nothing.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopTransport;

impl Transport for NoopTransport {
    type Error = Infallible;

    fn send(&mut self, _bytes: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn start_receive(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn stop_receive(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn delay_ms(&mut self, _ms: u32) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Blocking transmit over an `embedded-hal` serial port.
///
/// Only tracks whether reception is enabled; the interrupt glue checks
/// [`is_receiving`](Self::is_receiving) before forwarding bytes.
pub struct SerialTransport<S, D> {
    serial: S,
    delay: D,
    receiving: bool,
}

impl<S, D> SerialTransport<S, D>
where
    S: serial::Write<u8>,
    S::Error: Debug,
    D: DelayMs<u32>,
{
    pub fn new(serial: S, delay: D) -> Self {
        Self {
            serial,
            delay,
            receiving: false,
        }
    }

    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    pub fn release(self) -> (S, D) {
        (self.serial, self.delay)
    }
}

impl<S, D> Transport for SerialTransport<S, D>
where
    S: serial::Write<u8>,
    S::Error: Debug,
    D: DelayMs<u32>,
{
    type Error = S::Error;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &b in bytes {
            nb::block!(self.serial.write(b))?;
        }
        nb::block!(self.serial.flush())
    }

    fn start_receive(&mut self) -> Result<(), Self::Error> {
        self.receiving = true;
        Ok(())
    }

    fn stop_receive(&mut self) -> Result<(), Self::Error> {
        self.receiving = false;
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) -> Result<(), Self::Error> {
        self.delay.delay_ms(ms);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeSerial {
        written: Vec<u8>,
        flushes: usize,
        // every write returns WouldBlock this many times first
        busy: usize,
        busy_left: usize,
    }

    impl serial::Write<u8> for FakeSerial {
        type Error = ();

        fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
            if self.busy_left > 0 {
                self.busy_left -= 1;
                return Err(nb::Error::WouldBlock);
            }
            self.busy_left = self.busy;
            self.written.push(word);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }

    struct BrokenSerial;

    impl serial::Write<u8> for BrokenSerial {
        type Error = ();

        fn write(&mut self, _word: u8) -> nb::Result<(), Self::Error> {
            Err(nb::Error::Other(()))
        }

        fn flush(&mut self) -> nb::Result<(), Self::Error> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeDelay(Vec<u32>);

    impl DelayMs<u32> for FakeDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.0.push(ms);
        }
    }

    #[test]
    fn serial_writes_every_byte_then_flushes() {
        let serial = FakeSerial {
            busy: 2,
            busy_left: 2,
            ..Default::default()
        };
        let mut transport = SerialTransport::new(serial, FakeDelay::default());
        transport.send(&[0xb5, 0x62, 0x06]).unwrap();
        transport.delay_ms(100).unwrap();
        let (serial, delay) = transport.release();
        assert_eq!(serial.written, vec![0xb5, 0x62, 0x06]);
        assert_eq!(serial.flushes, 1);
        assert_eq!(delay.0, vec![100]);
    }

    #[test]
    fn serial_write_error_is_returned() {
        let mut transport = SerialTransport::new(BrokenSerial, FakeDelay::default());
        assert_eq!(transport.send(&[1]), Err(()));
    }

    #[test]
    fn serial_tracks_reception() {
        let mut transport = SerialTransport::new(FakeSerial::default(), FakeDelay::default());
        assert!(!transport.is_receiving());
        transport.start_receive().unwrap();
        assert!(transport.is_receiving());
        transport.stop_receive().unwrap();
        assert!(!transport.is_receiving());
    }

    #[test]
    fn default_power_control_is_absent() {
        let mut transport = NoopTransport;
        assert_eq!(transport.set_power(true), Ok(()));
        assert!(!transport.power());
        assert_eq!(transport.init(9600), Ok(()));
    }
}
