//! # QR Console Framebuffer Front End
//!
//! The presentation half of qrcon: captures the kernel log from
//! `/dev/kmsg`, drives the core fitter/encoder over it, and blits each
//! resulting symbol onto the Linux framebuffer with pacing a camera can
//! follow. Configuration is a small YAML file; see [`config`].
//!
//! The `qrcond` binary wires these pieces together for one-shot drains of
//! the current kernel ring.

pub mod config;
pub mod error;
pub mod framebuffer;
pub mod kmsg;
pub mod logging;
pub mod render;

pub use config::QrconConfig;
pub use error::{FbError, FbResult};
pub use framebuffer::{FbGeometry, Framebuffer};
pub use kmsg::{HistoryBuffer, KmsgRecord};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use render::{QrPosition, ScreenRenderer};
