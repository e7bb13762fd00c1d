//! ESP-IDF time base.

use core::time::Duration;

use esp_idf_svc::hal::delay::FreeRtos;

use crate::clock::Clock;

/// `esp_timer` microseconds plus FreeRTOS delays.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspClock;

impl Clock for EspClock {
    fn now_us(&self) -> i64 {
        // SAFETY: esp_timer_get_time is always safe to call after boot
        unsafe { esp_idf_svc::sys::esp_timer_get_time() }
    }

    fn sleep(&self, duration: Duration) {
        FreeRtos::delay_ms(duration.as_millis().min(u32::MAX as u128) as u32);
    }
}
