//! Kernel Log Capture
//!
//! Reads `/dev/kmsg` records and collects them, formatted the way `dmesg`
//! prints them, into a bounded history buffer that the drain loop encodes
//! into symbols.
//!
//! Each `/dev/kmsg` read returns one record of the form
//! `pri,seq,timestamp_us,flags;message`. Continuation lines (leading space)
//! carry device metadata and are dropped. Reads are non-blocking: the ring
//! is drained until `EAGAIN`, records overwritten mid-read (`EPIPE`) are
//! simply skipped.
//!
//! ## Example
//!
//! ```rust
//! use qrcon_fb::kmsg::{parse_record, HistoryBuffer};
//!
//! let rec = parse_record("6,1234,5217389,-;usb 1-1: new device\n").unwrap();
//! assert_eq!(rec.level, 6);
//!
//! let mut history = HistoryBuffer::new(4096);
//! assert!(history.push_record(&rec));
//! assert!(std::str::from_utf8(history.as_bytes()).unwrap().contains("usb 1-1"));
//! ```

use std::fs::OpenOptions;
use std::io::{self, BufRead, Read};
use std::os::unix::fs::OpenOptionsExt;

use crate::error::FbResult;

/// One parsed kernel log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmsgRecord {
    /// Syslog level, 0-7
    pub level: u8,
    /// Sequence number
    pub seq: u64,
    /// Microseconds since boot
    pub timestamp_us: u64,
    /// Message text without the trailing newline
    pub message: String,
}

/// Parse one `/dev/kmsg` record line. Returns `None` for continuation
/// lines and anything malformed.
pub fn parse_record(line: &str) -> Option<KmsgRecord> {
    if line.starts_with(' ') {
        return None;
    }
    let (prefix, message) = line.split_once(';')?;
    let mut fields = prefix.split(',');
    let pri: u32 = fields.next()?.parse().ok()?;
    let seq: u64 = fields.next()?.parse().ok()?;
    let timestamp_us: u64 = fields.next()?.parse().ok()?;

    Some(KmsgRecord {
        level: (pri & 7) as u8,
        seq,
        timestamp_us,
        message: message.trim_end_matches('\n').to_string(),
    })
}

/// Bounded accumulator for formatted log lines.
///
/// Lines are stored in the `dmesg` shape `<level>[sssss.uuuuuu] text`, the
/// format scanners reassemble after decoding. Once a line would exceed the
/// capacity the buffer refuses further input rather than dropping old data.
pub struct HistoryBuffer {
    data: Vec<u8>,
    cap: usize,
}

impl HistoryBuffer {
    /// Create a buffer holding at most `cap` bytes.
    pub fn new(cap: usize) -> HistoryBuffer {
        HistoryBuffer {
            data: Vec::new(),
            cap,
        }
    }

    /// Append a formatted record. Returns `false` when the buffer is full.
    pub fn push_record(&mut self, record: &KmsgRecord) -> bool {
        let secs = record.timestamp_us / 1_000_000;
        let usecs = record.timestamp_us % 1_000_000;
        let line = format!(
            "<{}>[{:5}.{:06}] {}\n",
            record.level, secs, usecs, record.message
        );
        if self.data.len() + line.len() > self.cap {
            return false;
        }
        self.data.extend_from_slice(line.as_bytes());
        true
    }

    /// Collected bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Collected length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop everything collected so far.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// Collect records from any line-oriented reader (a saved log, a test
/// fixture). Returns the number of records kept.
pub fn collect_from_reader(reader: impl BufRead, history: &mut HistoryBuffer) -> io::Result<usize> {
    let mut kept = 0usize;
    for line in reader.lines() {
        let line = line?;
        if let Some(record) = parse_record(&line) {
            if !history.push_record(&record) {
                tracing::warn!(cap = history.cap, "history buffer full, stopping capture");
                break;
            }
            kept += 1;
        }
    }
    Ok(kept)
}

/// Drain the kernel ring through `/dev/kmsg` without blocking. Returns the
/// number of records kept.
pub fn collect_from_device(history: &mut HistoryBuffer) -> FbResult<usize> {
    let mut file = OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open("/dev/kmsg")?;

    let mut kept = 0usize;
    let mut buf = [0u8; 8192];
    loop {
        match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let text = String::from_utf8_lossy(&buf[..n]);
                if let Some(record) = parse_record(&text) {
                    if !history.push_record(&record) {
                        tracing::warn!(cap = history.cap, "history buffer full, stopping capture");
                        break;
                    }
                    kept += 1;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            // The record under the cursor was overwritten; skip ahead.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => continue,
            Err(e) => return Err(e.into()),
        }
    }
    tracing::debug!(records = kept, bytes = history.len(), "kernel log collected");
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_basic_record() {
        let rec = parse_record("6,1234,5217389,-;usb 1-1: new full-speed USB device\n").unwrap();
        assert_eq!(rec.level, 6);
        assert_eq!(rec.seq, 1234);
        assert_eq!(rec.timestamp_us, 5217389);
        assert_eq!(rec.message, "usb 1-1: new full-speed USB device");
    }

    #[test]
    fn test_parse_level_masks_facility() {
        // Facility 3 (daemon), severity 4: pri 28.
        let rec = parse_record("28,77,100,-;daemon says hi").unwrap();
        assert_eq!(rec.level, 4);
    }

    #[test]
    fn test_parse_keeps_semicolons_in_message() {
        let rec = parse_record("4,9,50,-;values: a=1;b=2").unwrap();
        assert_eq!(rec.message, "values: a=1;b=2");
    }

    #[test]
    fn test_parse_rejects_continuation_and_junk() {
        assert!(parse_record(" SUBSYSTEM=usb").is_none());
        assert!(parse_record("not a record").is_none());
        assert!(parse_record("x,y,z;bad numbers").is_none());
        assert!(parse_record("").is_none());
    }

    #[test]
    fn test_history_formatting() {
        let mut history = HistoryBuffer::new(1024);
        let rec = KmsgRecord {
            level: 3,
            seq: 1,
            timestamp_us: 12_345_678,
            message: "disk on fire".to_string(),
        };
        assert!(history.push_record(&rec));
        assert_eq!(
            std::str::from_utf8(history.as_bytes()).unwrap(),
            "<3>[   12.345678] disk on fire\n"
        );
    }

    #[test]
    fn test_history_cap() {
        let mut history = HistoryBuffer::new(40);
        let rec = KmsgRecord {
            level: 6,
            seq: 0,
            timestamp_us: 0,
            message: "x".repeat(30),
        };
        assert!(!history.push_record(&rec));
        assert!(history.is_empty());

        let short = KmsgRecord {
            level: 6,
            seq: 0,
            timestamp_us: 0,
            message: "ok".to_string(),
        };
        assert!(history.push_record(&short));
        assert!(!history.is_empty());
    }

    #[test]
    fn test_collect_from_reader() {
        let input = "\
6,1,1000000,-;first line
 SUBSYSTEM=pci
3,2,2000000,-;second line
garbage
6,3,3000000,-;third line
";
        let mut history = HistoryBuffer::new(4096);
        let kept = collect_from_reader(Cursor::new(input), &mut history).unwrap();
        assert_eq!(kept, 3);
        let text = std::str::from_utf8(history.as_bytes()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("<6>[    1.000000] first line"));
        assert!(text.contains("<3>[    2.000000] second line"));
    }
}
