//! Non-blocking diagnostic logging for RadarTelemetryBridge.
//!
//! # Architecture
//!
//! ```text
//! Workers / bring-up      DiagStream             Log drain thread
//! ──────────────────      ──────────             ────────────────
//!
//! diag_info!() ────────▶ [L0][L1][L2] ────────▶ console + esp32/lg
//! no allocation            lock-free             blocking ok
//! never blocks             bounded ring
//! ```
//!
//! # Rules
//!
//! - Acquisition workers never block on logging
//! - Messages are dropped (and counted) when the ring is full
//! - A single thread drains the stream, see [`crate::log_drain`]

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Longest message kept; the rest is cut.
pub const MAX_MSG_LEN: usize = 120;

/// Slots in [`crate::DIAG_LOG`].
pub const LOG_BUFFER_SIZE: usize = 128;

/// Severity, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Label used in console lines.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// True if `self` is at least as severe as `threshold`.
    pub fn at_least(self, threshold: LogLevel) -> bool {
        self <= threshold
    }
}

/// One committed line.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Microseconds since boot.
    pub timestamp_us: i64,
    pub level: LogLevel,
    /// Bytes used in `msg`.
    pub len: u8,
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: LogEntry = LogEntry {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text, lossy on invalid UTF-8 truncation.
    pub fn text(&self) -> &str {
        let bytes = &self.msg[..self.len as usize];
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            // Truncation may split a multi-byte char; keep the valid prefix.
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Lock-free bounded log stream (multiple producers, single consumer).
///
/// Each slot carries a sequence stamp. A producer claims a slot with a CAS on
/// `write_idx` only when the slot is free for the current lap, so a full ring
/// rejects the push instead of overwriting unread entries. The consumer only
/// reads slots whose stamp says the write has been committed.
pub struct DiagStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    /// Stored as `stamp - slot_index` so a zeroed array is the initial state.
    stamps: [AtomicU32; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: Slot ownership is handed between threads through the stamp
// protocol: a producer writes a slot only after winning the CAS on
// `write_idx`, and the consumer reads it only after observing the producer's
// Release store of the committed stamp.
unsafe impl<const N: usize> Sync for DiagStream<N> {}
unsafe impl<const N: usize> Send for DiagStream<N> {}

impl<const N: usize> DiagStream<N> {
    const MASK: usize = N - 1;

    /// Empty stream; usable in a `static`.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "DiagStream size must be a power of two");

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            stamps: [const { AtomicU32::new(0) }; N],
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    #[inline]
    fn stamp(&self, idx: usize) -> u32 {
        self.stamps[idx].load(Ordering::Acquire).wrapping_add(idx as u32)
    }

    #[inline]
    fn set_stamp(&self, idx: usize, stamp: u32) {
        self.stamps[idx].store(stamp.wrapping_sub(idx as u32), Ordering::Release);
    }

    /// Queue one line without blocking.
    ///
    /// A full ring rejects the line, counts it, and returns `false`.
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        let mut pos = self.write_idx.load(Ordering::Relaxed);
        loop {
            let idx = (pos as usize) & Self::MASK;
            let lag = self.stamp(idx).wrapping_sub(pos) as i32;

            if lag == 0 {
                match self.write_idx.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: the CAS gave this producer exclusive
                        // ownership of slot `idx` for this lap.
                        unsafe {
                            let entry = &mut (*self.entries.get())[idx];
                            entry.timestamp_us = timestamp_us;
                            entry.level = level;
                            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
                            entry.msg[..entry.len as usize]
                                .copy_from_slice(&msg[..entry.len as usize]);
                        }
                        self.set_stamp(idx, pos.wrapping_add(1));
                        return true;
                    }
                    Err(current) => pos = current,
                }
            } else if lag < 0 {
                // Slot still holds an unread entry from the previous lap
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            } else {
                pos = self.write_idx.load(Ordering::Relaxed);
            }
        }
    }

    /// Oldest committed line. Only the drain thread calls this.
    pub fn drain(&self) -> Option<LogEntry> {
        let pos = self.read_idx.load(Ordering::Relaxed);
        let idx = (pos as usize) & Self::MASK;

        if self.stamp(idx) != pos.wrapping_add(1) {
            return None;
        }

        // SAFETY: stamp == pos + 1 means the producer committed this slot
        // and no producer can claim it again until we release it below.
        let entry = unsafe { (*self.entries.get())[idx] };

        self.set_stamp(idx, pos.wrapping_add(N as u32));
        self.read_idx.store(pos.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Lines rejected since the last reset.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Number of entries claimed but not yet drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Acquire);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for DiagStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Render `args` into `buf`, truncating, and return the length used.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Truncating writer over a fixed byte buffer.
pub(crate) struct BufWriter<'a> {
    pub(crate) buf: &'a mut [u8],
    pub(crate) pos: usize,
}

impl core::fmt::Write for BufWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_write = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Format on the stack and push; never allocates.
///
/// ```ignore
/// diag_log!(LogLevel::Info, DIAG_LOG, clock.now_us(), "radar {} ready", id);
/// ```
#[macro_export]
macro_rules! diag_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($timestamp, $level, &buf[..len]);
    }};
}

#[macro_export]
macro_rules! diag_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! diag_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! diag_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! diag_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}
