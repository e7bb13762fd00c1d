//! LD2410 wire frames.
//!
//! ```text
//! command / ACK:  FD FC FB FA | len:u16le | word:u16le | value... | 04 03 02 01
//! data report:    F4 F3 F2 F1 | len:u16le | type | AA | report... | 55 00 | F8 F7 F6 F5
//! ```
//!
//! `len` counts the bytes between the length field and the tail.

use thiserror::Error;

pub const CMD_HEADER: [u8; 4] = [0xFD, 0xFC, 0xFB, 0xFA];
pub const CMD_TAIL: [u8; 4] = [0x04, 0x03, 0x02, 0x01];
pub const DATA_HEADER: [u8; 4] = [0xF4, 0xF3, 0xF2, 0xF1];
pub const DATA_TAIL: [u8; 4] = [0xF8, 0xF7, 0xF6, 0xF5];

/// ACK command word = request word | ACK_FLAG.
pub const ACK_FLAG: u16 = 0x0100;

/// Longest body accepted before the assembler resynchronises.
pub const MAX_BODY_LEN: usize = 64;

/// Assembler buffer ceiling; older bytes are discarded beyond this.
const MAX_BUFFERED: usize = 512;

/// Command words.
pub mod cmd {
    pub const ENABLE_CONFIG: u16 = 0x00FF;
    pub const END_CONFIG: u16 = 0x00FE;
    pub const READ_PARAMS: u16 = 0x0061;
    pub const ENABLE_ENGINEERING: u16 = 0x0062;
    pub const READ_FIRMWARE: u16 = 0x00A0;
    pub const SET_BAUD: u16 = 0x00A1;
    pub const RESTART: u16 = 0x00A3;
}

/// Report type byte of a data frame.
pub const REPORT_ENGINEERING: u8 = 0x01;
pub const REPORT_BASIC: u8 = 0x02;

const REPORT_HEAD: u8 = 0xAA;
const REPORT_TAIL: [u8; 2] = [0x55, 0x00];

/// Frame decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame too short")]
    Truncated,
    #[error("missing report head")]
    BadHead,
    #[error("missing report tail")]
    BadTail,
    #[error("gate count {0} out of range")]
    GateCount(u8),
}

/// Encode a command frame.
pub fn encode_command(word: u16, value: &[u8]) -> Vec<u8> {
    let len = (2 + value.len()) as u16;
    let mut out = Vec::with_capacity(4 + 2 + len as usize + 4);
    out.extend_from_slice(&CMD_HEADER);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&word.to_le_bytes());
    out.extend_from_slice(value);
    out.extend_from_slice(&CMD_TAIL);
    out
}

/// A complete frame pulled off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Command acknowledgement.
    Ack { word: u16, status: u16, data: Vec<u8> },
    /// Data report body, from the type byte through `55 00`.
    Report(Vec<u8>),
}

/// Decoded data report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub engineering: bool,
    pub target_state: u8,
    pub moving_distance: u16,
    pub moving_energy: u8,
    pub stationary_distance: u16,
    pub stationary_energy: u8,
    pub detection_distance: u16,
    /// Per-gate moving energies (engineering only).
    pub moving_gates: Vec<u8>,
    /// Per-gate stationary energies (engineering only).
    pub stationary_gates: Vec<u8>,
}

fn le16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

/// Decode a report body of type basic or engineering.
///
/// Callers check the type byte first; other types are not reports.
pub fn decode_report(body: &[u8]) -> Result<Report, FrameError> {
    // type, head, 9 report bytes, tail
    if body.len() < 13 {
        return Err(FrameError::Truncated);
    }
    if body[1] != REPORT_HEAD {
        return Err(FrameError::BadHead);
    }
    if body[body.len() - 2..] != REPORT_TAIL {
        return Err(FrameError::BadTail);
    }

    let mut report = Report {
        engineering: body[0] == REPORT_ENGINEERING,
        target_state: body[2],
        moving_distance: le16(body, 3),
        moving_energy: body[5],
        stationary_distance: le16(body, 6),
        stationary_energy: body[8],
        detection_distance: le16(body, 9),
        ..Report::default()
    };

    if report.engineering {
        let end = body.len() - 2;
        if end < 13 {
            return Err(FrameError::Truncated);
        }
        let max_moving = body[11];
        let max_stationary = body[12];
        if max_moving > 8 {
            return Err(FrameError::GateCount(max_moving));
        }
        if max_stationary > 8 {
            return Err(FrameError::GateCount(max_stationary));
        }
        let moving_start = 13;
        let stationary_start = moving_start + max_moving as usize + 1;
        let stationary_end = stationary_start + max_stationary as usize + 1;
        if stationary_end > end {
            return Err(FrameError::Truncated);
        }
        report.moving_gates = body[moving_start..stationary_start].to_vec();
        report.stationary_gates = body[stationary_start..stationary_end].to_vec();
    }

    Ok(report)
}

/// Gate sensitivity thresholds from a READ_PARAMS acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GateThresholds {
    pub moving: Vec<u8>,
    pub stationary: Vec<u8>,
}

impl GateThresholds {
    /// Parse READ_PARAMS ACK data:
    /// `AA | max gate N | max moving | max stationary | N+1 moving | N+1 stationary | idle:u16`
    pub fn from_params(data: &[u8]) -> Option<Self> {
        if data.len() < 4 || data[0] != REPORT_HEAD {
            return None;
        }
        let gates = data[1] as usize + 1;
        if gates > 9 || data.len() < 4 + 2 * gates {
            return None;
        }
        Some(Self {
            moving: data[4..4 + gates].to_vec(),
            stationary: data[4 + gates..4 + 2 * gates].to_vec(),
        })
    }
}

/// Length of the longest suffix of `buf` that could still grow into a header.
fn partial_header_len(buf: &[u8]) -> usize {
    (1..=buf.len().min(3))
        .rev()
        .find(|&n| {
            let tail = &buf[buf.len() - n..];
            CMD_HEADER.starts_with(tail) || DATA_HEADER.starts_with(tail)
        })
        .unwrap_or(0)
}

/// Byte stream to frame reassembly with header resynchronisation.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buf: Vec<u8>,
    discarded: usize,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() > MAX_BUFFERED {
            let excess = self.buf.len() - MAX_BUFFERED;
            self.buf.drain(..excess);
            self.discarded += excess;
        }
    }

    /// Bytes waiting for a complete frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Bytes thrown away while resynchronising.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    fn find_header(&self) -> Option<usize> {
        self.buf
            .windows(4)
            .position(|w| w == CMD_HEADER || w == DATA_HEADER)
    }

    fn skip(&mut self, n: usize) {
        self.buf.drain(..n);
        self.discarded += n;
    }

    /// Next complete frame, if any. Malformed frames are dropped.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match self.find_header() {
                Some(0) => {}
                Some(at) => self.skip(at),
                None => {
                    let keep = partial_header_len(&self.buf);
                    let drop = self.buf.len() - keep;
                    self.skip(drop);
                    return None;
                }
            }

            if self.buf.len() < 6 {
                return None;
            }
            let len = le16(&self.buf, 4) as usize;
            if len > MAX_BODY_LEN {
                self.skip(1);
                continue;
            }
            let total = 6 + len + 4;
            if self.buf.len() < total {
                return None;
            }

            let is_cmd = self.buf[..4] == CMD_HEADER;
            let tail = if is_cmd { CMD_TAIL } else { DATA_TAIL };
            if self.buf[6 + len..total] != tail {
                self.skip(1);
                continue;
            }

            let body: Vec<u8> = self.buf[6..6 + len].to_vec();
            self.buf.drain(..total);

            if !is_cmd {
                return Some(Frame::Report(body));
            }
            if body.len() < 4 {
                continue;
            }
            return Some(Frame::Ack {
                word: le16(&body, 0),
                status: le16(&body, 2),
                data: body[4..].to_vec(),
            });
        }
    }
}
