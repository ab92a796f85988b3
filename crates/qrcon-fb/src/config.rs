//! # Configuration System
//!
//! YAML configuration for the qrcon front end: symbol version and placement,
//! compression level, pacing delays, log capture limits, and logging.
//!
//! ## Configuration Search Path
//!
//! The first file found wins:
//! 1. Path in the `QRCON_CONFIG` environment variable
//! 2. `./qrcon.yaml`
//! 3. `~/.config/qrcon/config.yaml`
//! 4. `/etc/qrcon/config.yaml`
//!
//! ## Example Configuration
//!
//! ```yaml
//! qr:
//!   version: 20
//!   position: topright
//!   size_percent: 60
//!   refresh_delay_ms: 700
//!
//! compression:
//!   level: 15
//!
//! framebuffer:
//!   device: fb0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FbError, FbResult};
use crate::logging::LogConfig;
use crate::render::QrPosition;

/// Symbol and placement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Target QR version (1-40); fixes the symbol capacity
    pub version: usize,
    /// Placement on screen
    pub position: QrPosition,
    /// Horizontal offset in pixels for the corner and custom positions
    pub x_offset: u32,
    /// Vertical offset in pixels for the corner and custom positions
    pub y_offset: u32,
    /// Symbol size as a percentage of the smaller screen dimension
    pub size_percent: u32,
    /// Quiet-zone border in pixels
    pub border: u32,
    /// Delay between symbols in milliseconds
    pub refresh_delay_ms: u64,
    /// Extra delay before the first symbol so a scanner can focus
    pub first_delay_ms: u64,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            version: 20,
            position: QrPosition::TopRight,
            x_offset: 10,
            y_offset: 200,
            size_percent: 60,
            border: 5,
            refresh_delay_ms: 700,
            first_delay_ms: 2000,
        }
    }
}

/// Compression configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// ZSTD level, 1-22; higher packs more log per symbol but is slower
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self { level: 15 }
    }
}

/// Framebuffer device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FramebufferConfig {
    /// Device name under /dev and /sys/class/graphics
    pub device: String,
}

impl Default for FramebufferConfig {
    fn default() -> Self {
        Self {
            device: "fb0".to_string(),
        }
    }
}

/// Log capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Upper bound on collected kernel log bytes
    pub history_max_bytes: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            history_max_bytes: 128 * 1024,
        }
    }
}

/// Complete qrcon configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QrconConfig {
    /// Symbol and placement settings
    pub qr: QrConfig,
    /// Compression settings
    pub compression: CompressionConfig,
    /// Framebuffer settings
    pub framebuffer: FramebufferConfig,
    /// Log capture settings
    pub capture: CaptureConfig,
    /// Logging settings
    pub logging: LogConfig,
}

impl QrconConfig {
    /// Load configuration from the default search path, falling back to
    /// defaults when no file exists.
    pub fn load() -> FbResult<Self> {
        if let Ok(path) = std::env::var("QRCON_CONFIG") {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
        }

        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> FbResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FbError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> FbResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| FbError::Config(e.to_string()))
    }

    /// Configuration search paths, most specific first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./qrcon.yaml")];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "qrcon") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }
        paths.push(PathBuf::from("/etc/qrcon/config.yaml"));
        paths
    }

    /// Validate value ranges.
    pub fn validate(&self) -> FbResult<()> {
        if !(1..=40).contains(&self.qr.version) {
            return Err(FbError::Config(format!(
                "qr.version must be 1-40, got {}",
                self.qr.version
            )));
        }
        if !(1..=22).contains(&self.compression.level) {
            return Err(FbError::Config(format!(
                "compression.level must be 1-22, got {}",
                self.compression.level
            )));
        }
        if !(1..=100).contains(&self.qr.size_percent) {
            return Err(FbError::Config(format!(
                "qr.size_percent must be 1-100, got {}",
                self.qr.size_percent
            )));
        }
        if self.capture.history_max_bytes == 0 {
            return Err(FbError::Config(
                "capture.history_max_bytes must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QrconConfig::default();
        assert_eq!(config.qr.version, 20);
        assert_eq!(config.qr.position, QrPosition::TopRight);
        assert_eq!(config.compression.level, 15);
        assert_eq!(config.framebuffer.device, "fb0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
qr:
  version: 12
  position: center
  size_percent: 80

compression:
  level: 3
"#;
        let config = QrconConfig::parse(yaml).unwrap();
        assert_eq!(config.qr.version, 12);
        assert_eq!(config.qr.position, QrPosition::Center);
        assert_eq!(config.qr.size_percent, 80);
        assert_eq!(config.compression.level, 3);
        // Untouched sections keep their defaults.
        assert_eq!(config.qr.refresh_delay_ms, 700);
        assert_eq!(config.framebuffer.device, "fb0");
    }

    #[test]
    fn test_validation() {
        let mut config = QrconConfig::default();
        config.qr.version = 0;
        assert!(config.validate().is_err());

        config.qr.version = 41;
        assert!(config.validate().is_err());

        config.qr.version = 10;
        config.compression.level = 23;
        assert!(config.validate().is_err());

        config.compression.level = 22;
        config.qr.size_percent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_yaml_parses() {
        let yaml = QrconConfig::example_yaml();
        assert!(yaml.contains("qr:"));
        assert!(yaml.contains("compression:"));
        let parsed = QrconConfig::parse(&yaml).unwrap();
        assert_eq!(parsed.qr.version, QrconConfig::default().qr.version);
    }

    #[test]
    fn test_search_paths() {
        let paths = QrconConfig::search_paths();
        assert!(!paths.is_empty());
        assert!(paths[0].ends_with("qrcon.yaml"));
    }
}
