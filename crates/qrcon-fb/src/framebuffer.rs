//! Linux Framebuffer Access
//!
//! Opens a framebuffer device, reads its geometry from sysfs, maps the
//! pixel memory, and exposes a clipped solid-rectangle fill, which is all
//! the drawing the QR renderer needs.
//!
//! Geometry comes from `/sys/class/graphics/<dev>/{virtual_size,
//! bits_per_pixel,stride}` so no ioctl definitions are required; pixels are
//! written straight into the shared mapping of `/dev/<dev>`.
//!
//! A memory-backed variant with the same interface exists for tests and
//! headless use.
//!
//! ## Example
//!
//! ```rust,no_run
//! use qrcon_fb::framebuffer::Framebuffer;
//!
//! let mut fb = Framebuffer::open("fb0").unwrap();
//! let (w, h) = (fb.geometry().width, fb.geometry().height);
//! fb.fill_rect(0, 0, w, h, 0x00FF_FFFF); // white screen
//! ```

use std::fs::{File, OpenOptions};
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;

use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};

use crate::error::{FbError, FbResult};

/// Screen geometry as reported by sysfs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbGeometry {
    /// Visible width in pixels
    pub width: u32,
    /// Visible height in pixels
    pub height: u32,
    /// Bytes per pixel (1, 2, 3 or 4)
    pub bytes_per_pixel: u32,
    /// Bytes per scanline
    pub line_length: u32,
}

enum Backing {
    Mapped {
        ptr: *mut u8,
        len: usize,
        _file: File,
    },
    Owned(Vec<u8>),
}

/// An open framebuffer: geometry plus pixel memory.
pub struct Framebuffer {
    geometry: FbGeometry,
    backing: Backing,
}

/// Parse the sysfs `virtual_size` attribute, e.g. `"1920,1080"`.
fn parse_virtual_size(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.trim().split_once(',')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

fn read_sysfs_attr(dir: &Path, name: &str) -> FbResult<String> {
    let path = dir.join(name);
    std::fs::read_to_string(&path)
        .map_err(|e| FbError::InvalidGeometry(format!("{}: {}", path.display(), e)))
}

impl Framebuffer {
    /// Open and map a framebuffer device by name ("fb0").
    pub fn open(device: &str) -> FbResult<Framebuffer> {
        let dev_path = format!("/dev/{device}");
        let sysfs = Path::new("/sys/class/graphics").join(device);

        if !sysfs.exists() {
            return Err(FbError::DeviceNotFound(device.to_string()));
        }

        let (width, height) = parse_virtual_size(&read_sysfs_attr(&sysfs, "virtual_size")?)
            .ok_or_else(|| FbError::InvalidGeometry("virtual_size".to_string()))?;
        let bits: u32 = read_sysfs_attr(&sysfs, "bits_per_pixel")?
            .trim()
            .parse()
            .map_err(|_| FbError::InvalidGeometry("bits_per_pixel".to_string()))?;
        let line_length: u32 = read_sysfs_attr(&sysfs, "stride")?
            .trim()
            .parse()
            .map_err(|_| FbError::InvalidGeometry("stride".to_string()))?;

        let bytes_per_pixel = bits / 8;
        if !(1..=4).contains(&bytes_per_pixel) {
            return Err(FbError::UnsupportedDepth(bytes_per_pixel));
        }
        if line_length == 0 || height == 0 || line_length < width * bytes_per_pixel {
            return Err(FbError::InvalidGeometry(format!(
                "{width}x{height}, stride {line_length}"
            )));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&dev_path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::PermissionDenied {
                    FbError::PermissionDenied(dev_path.clone())
                } else {
                    FbError::Io(e)
                }
            })?;

        // Map whole scanlines, rounded up to the page size.
        let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let wanted = line_length as usize * height as usize;
        let len = wanted.div_ceil(page) * page;
        let len_nz = NonZeroUsize::new(len)
            .ok_or_else(|| FbError::InvalidGeometry("zero-sized framebuffer".to_string()))?;

        let ptr = unsafe {
            mmap(
                None,
                len_nz,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                Some(&file),
                0,
            )
        }
        .map_err(|e| FbError::MmapFailed {
            device: dev_path.clone(),
            reason: e.to_string(),
        })? as *mut u8;

        let geometry = FbGeometry {
            width,
            height,
            bytes_per_pixel,
            line_length,
        };
        tracing::info!(
            device = dev_path,
            width,
            height,
            bits,
            line_length,
            "framebuffer opened"
        );
        Ok(Framebuffer {
            geometry,
            backing: Backing::Mapped {
                ptr,
                len,
                _file: file,
            },
        })
    }

    /// A memory-backed framebuffer with the same drawing interface, for
    /// tests and headless runs.
    pub fn simulated(width: u32, height: u32, bytes_per_pixel: u32) -> Framebuffer {
        let line_length = width * bytes_per_pixel;
        Framebuffer {
            geometry: FbGeometry {
                width,
                height,
                bytes_per_pixel,
                line_length,
            },
            backing: Backing::Owned(vec![0u8; (line_length * height) as usize]),
        }
    }

    /// Screen geometry.
    pub fn geometry(&self) -> FbGeometry {
        self.geometry
    }

    fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.geometry.line_length as usize;
        let start = y as usize * stride;
        match &mut self.backing {
            Backing::Mapped { ptr, .. } => {
                // Rows stay inside the mapping: y < height and the mapping
                // covers height * line_length bytes.
                unsafe { std::slice::from_raw_parts_mut(ptr.add(start), stride) }
            }
            Backing::Owned(buf) => &mut buf[start..start + stride],
        }
    }

    fn row(&self, y: u32) -> &[u8] {
        let stride = self.geometry.line_length as usize;
        let start = y as usize * stride;
        match &self.backing {
            Backing::Mapped { ptr, .. } => unsafe {
                std::slice::from_raw_parts(ptr.add(start), stride)
            },
            Backing::Owned(buf) => &buf[start..start + stride],
        }
    }

    /// Fill a solid rectangle, clipped to the screen. Coordinates may be
    /// negative; the visible part is drawn.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: u32) {
        let geo = self.geometry;
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x.saturating_add(w as i32)).clamp(0, geo.width as i32) as u32;
        let y1 = (y.saturating_add(h as i32)).clamp(0, geo.height as i32) as u32;
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let bpp = geo.bytes_per_pixel as usize;
        for row_y in y0..y1 {
            let row = self.row_mut(row_y);
            for col in x0..x1 {
                let off = col as usize * bpp;
                write_color(&mut row[off..off + bpp], color);
            }
        }
    }

    /// Read back one pixel, zero-extended to u32. Out-of-range coordinates
    /// return 0.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        let geo = self.geometry;
        if x >= geo.width || y >= geo.height {
            return 0;
        }
        let bpp = geo.bytes_per_pixel as usize;
        let row = self.row(y);
        let off = x as usize * bpp;
        let mut value = 0u32;
        for (i, &b) in row[off..off + bpp].iter().enumerate() {
            value |= (b as u32) << (8 * i);
        }
        value
    }
}

/// Write a pixel color into `dst`, whose length selects the depth.
fn write_color(dst: &mut [u8], color: u32) {
    match dst.len() {
        4 => dst.copy_from_slice(&color.to_le_bytes()),
        3 => dst.copy_from_slice(&color.to_le_bytes()[..3]),
        2 => dst.copy_from_slice(&(color as u16).to_le_bytes()),
        1 => dst[0] = color as u8,
        _ => {}
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        if let Backing::Mapped { ptr, len, .. } = &self.backing {
            // The mapping outlived every row borrow; unmap ignores errors
            // on teardown.
            let _ = unsafe { munmap(*ptr as *mut libc::c_void, *len) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_virtual_size() {
        assert_eq!(parse_virtual_size("1920,1080\n"), Some((1920, 1080)));
        assert_eq!(parse_virtual_size("800,600"), Some((800, 600)));
        assert_eq!(parse_virtual_size("oops"), None);
        assert_eq!(parse_virtual_size("12,"), None);
    }

    #[test]
    fn test_fill_and_readback_32bpp() {
        let mut fb = Framebuffer::simulated(16, 16, 4);
        fb.fill_rect(2, 3, 4, 2, 0x00AABBCC);
        assert_eq!(fb.pixel(2, 3), 0x00AABBCC);
        assert_eq!(fb.pixel(5, 4), 0x00AABBCC);
        assert_eq!(fb.pixel(6, 3), 0);
        assert_eq!(fb.pixel(2, 5), 0);
    }

    #[test]
    fn test_fill_clips_negative_origin() {
        let mut fb = Framebuffer::simulated(8, 8, 4);
        fb.fill_rect(-3, -3, 5, 5, 0xFFFF_FFFF);
        assert_eq!(fb.pixel(0, 0), 0xFFFF_FFFF);
        assert_eq!(fb.pixel(1, 1), 0xFFFF_FFFF);
        assert_eq!(fb.pixel(2, 2), 0);
    }

    #[test]
    fn test_fill_clips_overflow() {
        let mut fb = Framebuffer::simulated(8, 8, 4);
        fb.fill_rect(6, 6, 10, 10, 0x0000_00FF);
        assert_eq!(fb.pixel(7, 7), 0xFF);
        // Nothing outside the screen was touched, nothing panicked.
        assert_eq!(fb.pixel(0, 0), 0);
    }

    #[test]
    fn test_16bpp_truncates_color() {
        let mut fb = Framebuffer::simulated(4, 4, 2);
        fb.fill_rect(0, 0, 1, 1, 0x00AB_CDEF);
        assert_eq!(fb.pixel(0, 0), 0xCDEF);
    }

    #[test]
    fn test_24bpp_keeps_three_bytes() {
        let mut fb = Framebuffer::simulated(4, 4, 3);
        fb.fill_rect(0, 0, 2, 1, 0x00AA_BBCC);
        assert_eq!(fb.pixel(0, 0), 0x00AA_BBCC);
        assert_eq!(fb.pixel(1, 0), 0x00AA_BBCC);
        assert_eq!(fb.pixel(2, 0), 0);
    }

    #[test]
    fn test_missing_device() {
        assert!(matches!(
            Framebuffer::open("fb-does-not-exist"),
            Err(FbError::DeviceNotFound(_))
        ));
    }
}
