//! Channel link boundary.
//!
//! The sensor protocol itself lives behind this trait; the pipeline only
//! sees readings, frames and boolean command outcomes.

use crate::error::LinkError;
use crate::reading::SensorFrame;

/// One physical sensor link, exclusively owned by its channel.
pub trait ChannelLink: Send {
    /// True if the underlying serial link has unread bytes.
    fn has_data(&mut self) -> bool;

    /// Read one frame. Transport failures are transient.
    fn read_frame(&mut self) -> Result<SensorFrame, LinkError>;

    /// Basic liveness handshake.
    fn handshake(&mut self) -> bool;

    /// Switch the sensor to enhanced (per-gate) reporting.
    fn negotiate_enhanced_mode(&mut self) -> bool;

    /// Change the sensor reporting rate. `code` is device specific.
    fn set_reporting_rate(&mut self, code: u16) -> bool;
}

impl<L: ChannelLink + ?Sized> ChannelLink for Box<L> {
    fn has_data(&mut self) -> bool {
        (**self).has_data()
    }

    fn read_frame(&mut self) -> Result<SensorFrame, LinkError> {
        (**self).read_frame()
    }

    fn handshake(&mut self) -> bool {
        (**self).handshake()
    }

    fn negotiate_enhanced_mode(&mut self) -> bool {
        (**self).negotiate_enhanced_mode()
    }

    fn set_reporting_rate(&mut self, code: u16) -> bool {
        (**self).set_reporting_rate(code)
    }
}
