//! [`ChannelLink`] over an LD2410 attached to a serial port.

use core::time::Duration;

use super::frame::{
    cmd, decode_report, encode_command, Frame, FrameAssembler, GateThresholds, Report, ACK_FLAG,
    REPORT_BASIC, REPORT_ENGINEERING,
};
use crate::error::LinkError;
use crate::link::ChannelLink;
use crate::reading::{ChannelReading, SensorFrame, TargetRecord, TargetStatus};

/// Byte-level serial port.
pub trait SerialPort: Send {
    /// Bytes buffered by the driver and not yet read.
    fn bytes_available(&mut self) -> usize;

    /// Read up to `buf.len()` bytes, waiting at most `timeout` for the first.
    /// Returns 0 on timeout.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, LinkError>;

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError>;
}

/// Timing for serial exchanges.
#[derive(Debug, Clone, Copy)]
pub struct LinkTiming {
    /// Per-read wait.
    pub read_timeout: Duration,
    /// Reads allowed while waiting for one frame or ACK.
    pub max_reads: u32,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(50),
            max_reads: 20,
        }
    }
}

/// LD2410 protocol driver.
pub struct Ld2410Link<P> {
    port: P,
    assembler: FrameAssembler,
    /// Frame pulled out of the assembler by `has_data`.
    pending: Option<Frame>,
    thresholds: GateThresholds,
    timing: LinkTiming,
    firmware: Option<(u16, u16, u32)>,
}

impl<P: SerialPort> Ld2410Link<P> {
    pub fn new(port: P) -> Self {
        Self::with_timing(port, LinkTiming::default())
    }

    pub fn with_timing(port: P, timing: LinkTiming) -> Self {
        Self {
            port,
            assembler: FrameAssembler::new(),
            pending: None,
            thresholds: GateThresholds::default(),
            timing,
            firmware: None,
        }
    }

    /// Thresholds cached by the last successful parameter read.
    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    /// (type, major, minor) reported during the last handshake.
    pub fn firmware(&self) -> Option<(u16, u16, u32)> {
        self.firmware
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Pull bytes from the port until a frame is complete or reads run out.
    fn next_frame(&mut self) -> Result<Frame, LinkError> {
        if let Some(frame) = self.pending.take() {
            return Ok(frame);
        }
        let mut buf = [0u8; 64];
        for _ in 0..self.timing.max_reads {
            if let Some(frame) = self.assembler.next_frame() {
                return Ok(frame);
            }
            let n = self.port.read(&mut buf, self.timing.read_timeout)?;
            if n == 0 {
                return Err(LinkError::Timeout);
            }
            self.assembler.push(&buf[..n]);
        }
        self.assembler.next_frame().ok_or(LinkError::Timeout)
    }

    /// Send a command and wait for its successful ACK. Reports arriving in
    /// the meantime are discarded.
    fn command(&mut self, word: u16, value: &[u8]) -> Result<Vec<u8>, LinkError> {
        self.port.write(&encode_command(word, value))?;
        for _ in 0..self.timing.max_reads {
            if let Frame::Ack { word: acked, status, data } = self.next_frame()? {
                if acked == word | ACK_FLAG {
                    return match status {
                        0 => Ok(data),
                        _ => Err(LinkError::Malformed("command rejected")),
                    };
                }
            }
        }
        Err(LinkError::Timeout)
    }

    /// Run `body` inside an enable/end configuration bracket.
    fn configure<R>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<R, LinkError>,
    ) -> Result<R, LinkError> {
        self.command(cmd::ENABLE_CONFIG, &[0x01, 0x00])?;
        let result = body(self);
        // Leave configuration mode even when the body failed
        let end = self.command(cmd::END_CONFIG, &[]);
        let value = result?;
        end?;
        Ok(value)
    }

    fn read_params(&mut self) -> Result<(), LinkError> {
        let data = self.command(cmd::READ_PARAMS, &[])?;
        self.thresholds =
            GateThresholds::from_params(&data).ok_or(LinkError::Malformed("parameter block"))?;
        Ok(())
    }

    fn to_reading(&self, report: Report) -> ChannelReading {
        let (moving_thresholds, stationary_thresholds) = if report.engineering {
            (self.thresholds.moving.clone(), self.thresholds.stationary.clone())
        } else {
            (Vec::new(), Vec::new())
        };
        ChannelReading::from_parts(
            TargetStatus(report.target_state),
            report.detection_distance,
            TargetRecord {
                signal: report.moving_energy,
                distance: report.moving_distance,
                signals: report.moving_gates,
                thresholds: moving_thresholds,
            },
            TargetRecord {
                signal: report.stationary_energy,
                distance: report.stationary_distance,
                signals: report.stationary_gates,
                thresholds: stationary_thresholds,
            },
            report.engineering,
        )
    }
}

impl<P: SerialPort> ChannelLink for Ld2410Link<P> {
    fn has_data(&mut self) -> bool {
        // A partial frame left in the assembler needs more port bytes
        if self.pending.is_none() {
            self.pending = self.assembler.next_frame();
        }
        self.pending.is_some() || self.port.bytes_available() > 0
    }

    fn read_frame(&mut self) -> Result<SensorFrame, LinkError> {
        if !self.has_data() {
            return Err(LinkError::NoData);
        }
        match self.next_frame()? {
            Frame::Report(body) => match body.first() {
                Some(&REPORT_BASIC) | Some(&REPORT_ENGINEERING) => decode_report(&body)
                    .map(|report| SensorFrame::Data(self.to_reading(report)))
                    .map_err(|_| LinkError::Malformed("data report")),
                Some(&code) => Ok(SensorFrame::Unrecognized { code }),
                None => Err(LinkError::Malformed("empty report")),
            },
            Frame::Ack { word, .. } => Ok(SensorFrame::Unrecognized { code: word as u8 }),
        }
    }

    fn handshake(&mut self) -> bool {
        self.configure(|link| {
            let fw = link.command(cmd::READ_FIRMWARE, &[])?;
            if fw.len() >= 8 {
                link.firmware = Some((
                    u16::from_le_bytes([fw[0], fw[1]]),
                    u16::from_le_bytes([fw[2], fw[3]]),
                    u32::from_le_bytes([fw[4], fw[5], fw[6], fw[7]]),
                ));
            }
            link.read_params()
        })
        .is_ok()
    }

    fn negotiate_enhanced_mode(&mut self) -> bool {
        self.configure(|link| {
            link.command(cmd::ENABLE_ENGINEERING, &[])?;
            // Thresholds may be missing if the handshake never succeeded
            link.read_params()
        })
        .is_ok()
    }

    fn set_reporting_rate(&mut self, code: u16) -> bool {
        let set = self.configure(|link| link.command(cmd::SET_BAUD, &code.to_le_bytes()).map(|_| ()));
        // New rate only applies after a restart
        set.is_ok() && self.command(cmd::RESTART, &[]).is_ok()
    }
}
