//! Daemon configuration: JSON file, load-or-default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::avi::{FourCc, VideoParams};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Mount point of the removable medium.
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,
    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: u32,
    /// Codec fourcc, exactly four ASCII characters.
    #[serde(default = "default_codec")]
    pub codec: String,
    /// Sysfs-style GPIO value file for the record trigger; absent means
    /// network-only control.
    #[serde(default)]
    pub trigger_gpio_value: Option<PathBuf>,
    #[serde(default = "default_trigger_poll_ms")]
    pub trigger_poll_ms: u64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("/media/sdcard")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_frame_width() -> u32 {
    640
}

fn default_frame_height() -> u32 {
    480
}

fn default_frame_rate_hz() -> u32 {
    25
}

fn default_codec() -> String {
    "MJPG".to_string()
}

fn default_trigger_poll_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            log_dir: default_log_dir(),
            http_addr: default_http_addr(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            frame_rate_hz: default_frame_rate_hz(),
            codec: default_codec(),
            trigger_gpio_value: None,
            trigger_poll_ms: default_trigger_poll_ms(),
        }
    }
}

impl Config {
    /// Loads from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn video_params(&self) -> VideoParams {
        VideoParams {
            width: self.frame_width,
            height: self.frame_height,
            frame_rate_hz: self.frame_rate_hz,
            codec: self.codec_fourcc(),
        }
    }

    /// First four bytes of `codec`, space-padded when shorter.
    fn codec_fourcc(&self) -> FourCc {
        let mut fourcc = *b"    ";
        for (slot, byte) in fourcc.iter_mut().zip(self.codec.bytes()) {
            *slot = byte;
        }
        fourcc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load(Path::new("/no/such/avicam.json")).unwrap();
        assert_eq!(config.frame_width, 640);
        assert_eq!(config.codec, "MJPG");
        assert!(config.trigger_gpio_value.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avicam.json");
        std::fs::write(&path, r#"{"frameWidth": 1280, "frameRateHz": 10}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.frame_width, 1280);
        assert_eq!(config.frame_rate_hz, 10);
        assert_eq!(config.frame_height, 480);
        assert_eq!(config.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avicam.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_codec_fourcc_is_padded() {
        let config = Config {
            codec: "XV".to_string(),
            ..Config::default()
        };
        assert_eq!(config.video_params().codec, *b"XV  ");
    }
}
