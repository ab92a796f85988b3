//! On-Screen Symbol Renderer
//!
//! Places a packed QR bitmap on the framebuffer: computes the module pixel
//! size from the configured screen share, positions the symbol, paints the
//! white quiet zone and the dark modules, and paces successive frames so a
//! camera can lock onto each one.
//!
//! Implements [`FrameSink`], the seam the core drain loop drives.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use qrcon_core::{FrameSink, QrError};

use crate::config::QrConfig;
use crate::framebuffer::{FbGeometry, Framebuffer};

const COLOR_BLACK: u32 = 0x0000_0000;
const COLOR_WHITE: u32 = 0x00FF_FFFF;

/// Where the symbol sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrPosition {
    /// Centered on screen
    Center,
    /// Top-left corner plus offsets
    TopLeft,
    /// Top-right corner plus offsets
    TopRight,
    /// Bottom-left corner plus offsets
    BottomLeft,
    /// Bottom-right corner plus offsets
    BottomRight,
    /// Exactly at the configured offsets
    Custom,
}

/// Top-left pixel of a symbol of `render_width` pixels, clamped on screen.
pub(crate) fn placement(
    geometry: FbGeometry,
    render_width: u32,
    position: QrPosition,
    x_offset: u32,
    y_offset: u32,
) -> (i32, i32) {
    let (xres, yres) = (geometry.width as i32, geometry.height as i32);
    let rw = render_width as i32;
    let (xo, yo) = (x_offset as i32, y_offset as i32);

    let (mut x, mut y) = match position {
        QrPosition::Center => ((xres - rw) / 2, (yres - rw) / 2),
        QrPosition::TopLeft | QrPosition::Custom => (xo, yo),
        QrPosition::TopRight => (xres - rw - xo, yo),
        QrPosition::BottomLeft => (xo, yres - rw - yo),
        QrPosition::BottomRight => (xres - rw - xo, yres - rw - yo),
    };

    x = x.max(0).min(xres - rw);
    y = y.max(0).min(yres - rw);
    (x, y)
}

/// Blits symbols to a framebuffer with scanner-friendly pacing.
pub struct ScreenRenderer<'a> {
    fb: &'a mut Framebuffer,
    config: QrConfig,
    frames_shown: usize,
}

impl<'a> ScreenRenderer<'a> {
    /// Create a renderer over an open framebuffer.
    pub fn new(fb: &'a mut Framebuffer, config: QrConfig) -> ScreenRenderer<'a> {
        ScreenRenderer {
            fb,
            config,
            frames_shown: 0,
        }
    }

    /// Symbols blitted so far.
    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }

    fn draw(&mut self, bitmap: &[u8], width: u8) {
        let geometry = self.fb.geometry();
        let width = width as u32;
        let stride = (width as usize).div_ceil(8);

        // Module pixel size from the configured share of the short screen
        // edge, at least one pixel per module.
        let max_pixels = geometry.width.min(geometry.height) * self.config.size_percent / 100;
        let block = (max_pixels / width).max(1);
        let render_width = width * block;

        let (start_x, start_y) = placement(
            geometry,
            render_width,
            self.config.position,
            self.config.x_offset,
            self.config.y_offset,
        );

        let border = self.config.border as i32;
        self.fb.fill_rect(
            start_x - border,
            start_y - border,
            render_width + 2 * self.config.border,
            render_width + 2 * self.config.border,
            COLOR_WHITE,
        );

        for y in 0..width {
            for x in 0..width {
                let byte = bitmap[y as usize * stride + x as usize / 8];
                if byte & (0x80 >> (x % 8)) != 0 {
                    self.fb.fill_rect(
                        start_x + (x * block) as i32,
                        start_y + (y * block) as i32,
                        block,
                        block,
                        COLOR_BLACK,
                    );
                }
            }
        }

        tracing::debug!(
            x = start_x,
            y = start_y,
            pixels = render_width,
            modules = width,
            "symbol blitted"
        );
    }

    fn pace(&self) {
        let delay = if self.frames_shown == 1 {
            // Give the scanner extra time to find and focus the first frame.
            self.config.first_delay_ms
        } else {
            self.config.refresh_delay_ms
        };
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
    }
}

impl FrameSink for ScreenRenderer<'_> {
    fn show(&mut self, bitmap: &[u8], width: u8) -> qrcon_core::Result<()> {
        let expect = (width as usize).div_ceil(8) * width as usize;
        if bitmap.len() < expect {
            return Err(QrError::Sink(format!(
                "bitmap {} bytes, expected {expect}",
                bitmap.len()
            )));
        }
        self.draw(bitmap, width);
        self.frames_shown += 1;
        self.pace();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrcon_core::{encoder, Version};

    fn geometry() -> FbGeometry {
        FbGeometry {
            width: 800,
            height: 600,
            bytes_per_pixel: 4,
            line_length: 3200,
        }
    }

    #[test]
    fn test_placement_center() {
        assert_eq!(
            placement(geometry(), 200, QrPosition::Center, 0, 0),
            (300, 200)
        );
    }

    #[test]
    fn test_placement_corners() {
        let g = geometry();
        assert_eq!(placement(g, 100, QrPosition::TopLeft, 10, 20), (10, 20));
        assert_eq!(placement(g, 100, QrPosition::TopRight, 10, 20), (690, 20));
        assert_eq!(placement(g, 100, QrPosition::BottomLeft, 10, 20), (10, 480));
        assert_eq!(
            placement(g, 100, QrPosition::BottomRight, 10, 20),
            (690, 480)
        );
    }

    #[test]
    fn test_placement_clamps_on_screen() {
        let g = geometry();
        // Offsets pushing the symbol off screen get pulled back.
        assert_eq!(placement(g, 100, QrPosition::Custom, 900, 700), (700, 500));
        assert_eq!(placement(g, 100, QrPosition::TopRight, 1000, 0), (0, 0));
    }

    fn test_config() -> QrConfig {
        QrConfig {
            version: 1,
            position: QrPosition::TopLeft,
            x_offset: 10,
            y_offset: 10,
            size_percent: 50,
            border: 4,
            refresh_delay_ms: 0,
            first_delay_ms: 0,
        }
    }

    #[test]
    fn test_show_blits_quiet_zone_and_modules() {
        let mut data = vec![0u8; encoder::MIN_IMAGE_BUF];
        let mut tmp = vec![0u8; encoder::MIN_MSG_BUF];
        data[..5].copy_from_slice(b"PIXEL");
        let width = encoder::generate(None, &mut data, 5, Version::new(1).unwrap(), &mut tmp)
            .unwrap();
        let bitmap_len = (width as usize).div_ceil(8) * width as usize;

        let mut fb = Framebuffer::simulated(200, 200, 4);
        {
            let mut renderer = ScreenRenderer::new(&mut fb, test_config());
            renderer.show(&data[..bitmap_len], width).unwrap();
            assert_eq!(renderer.frames_shown(), 1);
        }

        // 50% of 200px over 21 modules: 4px blocks, 84px symbol at (10,10).
        // The quiet zone starts at (6,6).
        assert_eq!(fb.pixel(6, 6), 0x00FF_FFFF);
        // Module (9,6) is a dark timing module: pixel block at (46..50, 34..38).
        assert_eq!(fb.pixel(10 + 9 * 4, 10 + 6 * 4), COLOR_BLACK);
        // Module (10,6) is light.
        assert_eq!(fb.pixel(10 + 10 * 4, 10 + 6 * 4), COLOR_WHITE);
    }

    #[test]
    fn test_show_rejects_short_bitmap() {
        let mut fb = Framebuffer::simulated(100, 100, 4);
        let mut renderer = ScreenRenderer::new(&mut fb, test_config());
        assert!(renderer.show(&[0u8; 4], 21).is_err());
    }
}
