//! Log Drain Loop
//!
//! Walks a captured log buffer from left to right, packaging as many bytes
//! as possible into each successive QR symbol and handing the rendered
//! bitmap to a sink. The sink owns presentation: blitting the bitmap to a
//! display and pacing frames so a scanner can keep up.
//!
//! The loop makes progress on every iteration: a fitted frame advances the
//! cursor by the consumed byte count, and a failed fit skips ahead a fixed
//! amount so pathological input can never stall the drain.
//!
//! One caller-supplied buffer serves as both the frame destination and the
//! bitmap: the fitter writes the payload first, then the encoder overwrites
//! it with the image. The scratch buffer holds the encoded message.

use crate::encoder::{self, MIN_IMAGE_BUF, MIN_MSG_BUF};
use crate::error::{QrError, Result};
use crate::fitter::FrameFitter;

/// Bytes skipped when no prefix of the remaining input fits a symbol.
pub const SKIP_SIZE: usize = 1024;

/// Receives rendered symbols. Implementations blit the bitmap and delay
/// long enough for a scanner to acquire the frame before returning.
pub trait FrameSink {
    /// Present one symbol. `bitmap` is packed 1 bpp with stride
    /// `ceil(width / 8)`, a set bit meaning a dark module.
    fn show(&mut self, bitmap: &[u8], width: u8) -> Result<()>;
}

/// Counters for one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Symbols handed to the sink.
    pub symbols: usize,
    /// Source bytes carried inside emitted frames.
    pub consumed: usize,
    /// Source bytes skipped because nothing fit.
    pub skipped: usize,
}

/// Drives fitter, encoder and painter over a log buffer.
pub struct LogDrainer<'a> {
    fitter: FrameFitter,
    data: &'a mut [u8],
    tmp: &'a mut [u8],
}

impl<'a> LogDrainer<'a> {
    /// Create a drainer over caller-supplied buffers. `data` doubles as the
    /// frame and bitmap buffer, `tmp` as the message scratch; both must be
    /// sized for V40.
    pub fn new(fitter: FrameFitter, data: &'a mut [u8], tmp: &'a mut [u8]) -> Result<LogDrainer<'a>> {
        if data.len() < MIN_IMAGE_BUF {
            return Err(QrError::ImageBufferTooSmall {
                got: data.len(),
                need: MIN_IMAGE_BUF,
            });
        }
        if tmp.len() < MIN_MSG_BUF {
            return Err(QrError::MessageBufferTooSmall {
                got: tmp.len(),
                need: MIN_MSG_BUF,
            });
        }
        Ok(LogDrainer { fitter, data, tmp })
    }

    /// Emit symbols until the whole log has been consumed or skipped.
    ///
    /// Fit failures skip forward and continue; sink and encoder errors
    /// abort the drain.
    pub fn drain(&mut self, log: &[u8], sink: &mut dyn FrameSink) -> Result<DrainStats> {
        let mut stats = DrainStats::default();
        let mut pos = 0usize;

        while pos < log.len() {
            match self.fitter.fit(&log[pos..], self.data) {
                Ok(frame) => {
                    let width = encoder::generate(
                        None,
                        self.data,
                        frame.frame_len,
                        self.fitter.version(),
                        self.tmp,
                    )?;
                    let bitmap_len = (width as usize).div_ceil(8) * width as usize;
                    sink.show(&self.data[..bitmap_len], width)?;

                    pos += frame.consumed;
                    stats.symbols += 1;
                    stats.consumed += frame.consumed;
                }
                Err(QrError::NothingFits { .. }) => {
                    let skip = SKIP_SIZE.min(log.len() - pos);
                    tracing::warn!(pos, skip, "no prefix fits, skipping input");
                    pos += skip;
                    stats.skipped += skip;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            symbols = stats.symbols,
            consumed = stats.consumed,
            skipped = stats.skipped,
            "log drained"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    struct CollectingSink {
        widths: Vec<u8>,
        fail_after: Option<usize>,
    }

    impl CollectingSink {
        fn new() -> CollectingSink {
            CollectingSink {
                widths: Vec::new(),
                fail_after: None,
            }
        }
    }

    impl FrameSink for CollectingSink {
        fn show(&mut self, bitmap: &[u8], width: u8) -> Result<()> {
            let expect = (width as usize).div_ceil(8) * width as usize;
            assert_eq!(bitmap.len(), expect);
            self.widths.push(width);
            if self.fail_after == Some(self.widths.len()) {
                return Err(QrError::Sink("display gone".into()));
            }
            Ok(())
        }
    }

    fn sample_log(len: usize) -> Vec<u8> {
        let mut log = Vec::with_capacity(len);
        let mut seq = 0usize;
        while log.len() < len {
            log.extend_from_slice(
                format!("<6>[{:5}.{:06}] qrcon: event {seq} on cpu{}\n", seq, seq * 7, seq % 4)
                    .as_bytes(),
            );
            seq += 1;
        }
        log.truncate(len);
        log
    }

    fn drainer_buffers() -> (Vec<u8>, Vec<u8>) {
        (vec![0u8; MIN_IMAGE_BUF], vec![0u8; MIN_MSG_BUF])
    }

    #[test]
    fn test_drains_whole_log() {
        let log = sample_log(8 * 1024);
        let (mut data, mut tmp) = drainer_buffers();
        let fitter = FrameFitter::new(Version::new(10).unwrap(), 3).unwrap();
        let mut drainer = LogDrainer::new(fitter, &mut data, &mut tmp).unwrap();
        let mut sink = CollectingSink::new();

        let stats = drainer.drain(&log, &mut sink).unwrap();
        assert_eq!(stats.consumed, log.len());
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.symbols, sink.widths.len());
        assert!(stats.symbols >= 1);
        assert!(sink.widths.iter().all(|&w| w == 57));
    }

    #[test]
    fn test_empty_log() {
        let (mut data, mut tmp) = drainer_buffers();
        let fitter = FrameFitter::new(Version::new(10).unwrap(), 3).unwrap();
        let mut drainer = LogDrainer::new(fitter, &mut data, &mut tmp).unwrap();
        let mut sink = CollectingSink::new();

        let stats = drainer.drain(&[], &mut sink).unwrap();
        assert_eq!(stats, DrainStats::default());
    }

    #[test]
    fn test_skips_when_nothing_fits() {
        // V1 cannot hold any ZSTD frame, so the drain must skip through the
        // whole log in SKIP_SIZE hops and terminate.
        let log = sample_log(3000);
        let (mut data, mut tmp) = drainer_buffers();
        let fitter = FrameFitter::new(Version::new(1).unwrap(), 3).unwrap();
        let mut drainer = LogDrainer::new(fitter, &mut data, &mut tmp).unwrap();
        let mut sink = CollectingSink::new();

        let stats = drainer.drain(&log, &mut sink).unwrap();
        assert_eq!(stats.symbols, 0);
        assert_eq!(stats.consumed, 0);
        assert_eq!(stats.skipped, 3000);
    }

    #[test]
    fn test_sink_error_aborts() {
        let log = sample_log(16 * 1024);
        let (mut data, mut tmp) = drainer_buffers();
        let fitter = FrameFitter::new(Version::new(5).unwrap(), 3).unwrap();
        let mut drainer = LogDrainer::new(fitter, &mut data, &mut tmp).unwrap();
        let mut sink = CollectingSink::new();
        sink.fail_after = Some(1);

        assert!(matches!(
            drainer.drain(&log, &mut sink),
            Err(QrError::Sink(_))
        ));
        assert_eq!(sink.widths.len(), 1);
    }

    #[test]
    fn test_small_buffers_rejected() {
        let fitter = FrameFitter::new(Version::new(10).unwrap(), 3).unwrap();
        let mut data = vec![0u8; 100];
        let mut tmp = vec![0u8; MIN_MSG_BUF];
        assert!(LogDrainer::new(fitter, &mut data, &mut tmp).is_err());
    }
}
