//! Log drain: console output plus mirroring to the diagnostic topic.
//!
//! ```text
//! DIAG_LOG ──▶ drain thread ──▶ stdout (ESP-IDF console)
//!                          └──▶ esp32/lg  (entries >= mirror level)
//! ```

use core::time::Duration;
use std::io::Write;

use crate::clock::Clock;
use crate::logging::{BufWriter, DiagStream, LogEntry, LogLevel};

/// How often dropped-message counts are reported.
const DROPPED_REPORT_INTERVAL_US: i64 = 10_000_000;

/// Idle wait when the stream is empty.
const IDLE_DELAY: Duration = Duration::from_millis(50);

/// Format log entry to a line.
///
/// Format: `[timestamp_us] LEVEL: message\n`
fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    use core::fmt::Write as _;

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.text()
    );
    writer.pos
}

/// Drain state carried across iterations of the drain loop.
pub struct LogDrain<'a, const N: usize> {
    stream: &'a DiagStream<N>,
    mirror_level: LogLevel,
    last_dropped_report: i64,
}

impl<'a, const N: usize> LogDrain<'a, N> {
    pub fn new(stream: &'a DiagStream<N>, mirror_level: LogLevel) -> Self {
        Self {
            stream,
            mirror_level,
            last_dropped_report: 0,
        }
    }

    /// Drain every pending entry.
    ///
    /// Each entry is written to `out`; entries at or above the mirror level
    /// are also handed to `mirror`. Returns the number of entries drained.
    pub fn drain_pending<W, M>(&mut self, now_us: i64, out: &mut W, mut mirror: M) -> usize
    where
        W: Write + ?Sized,
        M: FnMut(&str),
    {
        let mut format_buf = [0u8; 256];
        let mut count = 0;

        while let Some(entry) = self.stream.drain() {
            let len = format_log_entry(&entry, &mut format_buf);
            let _ = out.write_all(&format_buf[..len]);
            if entry.level.at_least(self.mirror_level) {
                mirror(entry.text());
            }
            count += 1;
        }

        if now_us - self.last_dropped_report > DROPPED_REPORT_INTERVAL_US {
            let dropped = self.stream.dropped();
            if dropped > 0 {
                let _ = writeln!(out, "[WARN] Dropped log lines: {}", dropped);
                self.stream.reset_dropped();
            }
            self.last_dropped_report = now_us;
        }

        let _ = out.flush();
        count
    }
}

/// Log drain task. Runs for the process lifetime.
pub fn log_drain_task<C, M, const N: usize>(
    stream: &DiagStream<N>,
    clock: C,
    mirror_level: LogLevel,
    mut mirror: M,
) -> !
where
    C: Clock,
    M: FnMut(&str),
{
    let mut drain = LogDrain::new(stream, mirror_level);
    let stdout = std::io::stdout();

    loop {
        let drained = {
            let mut out = stdout.lock();
            drain.drain_pending(clock.now_us(), &mut out, &mut mirror)
        };
        if drained == 0 {
            clock.sleep(IDLE_DELAY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: LogLevel, text: &[u8]) -> LogEntry {
        let mut e = LogEntry {
            timestamp_us: 1234567,
            level,
            len: text.len() as u8,
            ..LogEntry::default()
        };
        e.msg[..text.len()].copy_from_slice(text);
        e
    }

    #[test]
    fn test_format_log_entry() {
        let mut buf = [0u8; 256];
        let len = format_log_entry(&entry(LogLevel::Info, b"Hello world"), &mut buf);

        let formatted = core::str::from_utf8(&buf[..len]).unwrap();
        assert!(formatted.contains("1234567"));
        assert!(formatted.contains("INFO"));
        assert!(formatted.ends_with("Hello world\n"));
    }

    #[test]
    fn test_drain_mirrors_only_severe_entries() {
        let stream = DiagStream::<8>::new();
        stream.push(1, LogLevel::Info, b"radar 1 ready");
        stream.push(2, LogLevel::Warn, b"radar 2 handshake failed");
        stream.push(3, LogLevel::Error, b"broker unreachable");

        let mut out = Vec::new();
        let mut mirrored = Vec::new();
        let mut drain = LogDrain::new(&stream, LogLevel::Warn);
        let n = drain.drain_pending(0, &mut out, |m| mirrored.push(m.to_string()));

        assert_eq!(n, 3);
        assert_eq!(mirrored, vec!["radar 2 handshake failed", "broker unreachable"]);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_drain_reports_dropped() {
        let stream = DiagStream::<2>::new();
        stream.push(1, LogLevel::Info, b"a");
        stream.push(2, LogLevel::Info, b"b");
        stream.push(3, LogLevel::Info, b"c");
        assert_eq!(stream.dropped(), 1);

        let mut out = Vec::new();
        let mut drain = LogDrain::new(&stream, LogLevel::Error);
        drain.drain_pending(DROPPED_REPORT_INTERVAL_US + 1, &mut out, |_| {});

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Dropped log lines: 1"));
        assert_eq!(stream.dropped(), 0);
    }
}
