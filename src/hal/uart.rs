//! Radar UARTs.
//!
//! ```text
//! ESP32 RX ◀──── LD2410 TX
//! ESP32 TX ────▶ LD2410 RX      8N1, 256000 baud
//! ```

use core::time::Duration;

use esp_idf_svc::hal::delay::TickType;
use esp_idf_svc::hal::gpio::{AnyIOPin, InputPin, OutputPin};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, Uart, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::EspError;

use crate::error::LinkError;
use crate::ld2410::SerialPort;

/// One radar UART, owned by exactly one channel.
pub struct UartPort {
    driver: UartDriver<'static>,
}

impl UartPort {
    /// Install the UART driver on the given pins.
    pub fn open<U: Uart>(
        uart: impl Peripheral<P = U> + 'static,
        tx_pin: impl Peripheral<P = impl OutputPin> + 'static,
        rx_pin: impl Peripheral<P = impl InputPin> + 'static,
        baud: u32,
    ) -> Result<Self, EspError> {
        let config = uart::config::Config::default().baudrate(Hertz(baud));
        let driver = UartDriver::new(
            uart,
            tx_pin,
            rx_pin,
            Option::<AnyIOPin>::None, // CTS
            Option::<AnyIOPin>::None, // RTS
            &config,
        )?;
        Ok(Self { driver })
    }
}

impl SerialPort for UartPort {
    fn bytes_available(&mut self) -> usize {
        self.driver.remaining_read().unwrap_or(0)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, LinkError> {
        self.driver
            .read(buf, TickType::from(timeout).ticks())
            .map_err(|e| LinkError::Io(e.to_string()))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut written = 0;
        while written < bytes.len() {
            let n = self
                .driver
                .write(&bytes[written..])
                .map_err(|e| LinkError::Io(e.to_string()))?;
            if n == 0 {
                return Err(LinkError::Io("uart tx stalled".into()));
            }
            written += n;
        }
        Ok(())
    }
}
