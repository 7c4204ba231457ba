//! Configuration file handling for gesture-sense.
//!
//! Settings are layered: command-line overrides > `GESTURE_SENSE_ENDPOINT`
//! (endpoint only) > `~/.config/gesture-sense/config.toml` > built-in
//! defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::camera::{CaptureConstraints, Resolution};
use crate::encoder::{OutputGeometry, DEFAULT_QUALITY, QUALITY_RANGE};
use crate::inference::DEFAULT_BASE_URL;
use crate::polling::{Cadence, PollingConfig, DEFAULT_INTERVAL, DEFAULT_MAX_IN_FLIGHT};

/// Shortest accepted polling interval.
pub const MIN_INTERVAL: Duration = Duration::from_millis(20);

/// Configuration file structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub camera: CameraConfig,
    pub encoder: EncoderConfig,
    pub polling: PollingSection,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct EndpointConfig {
    /// Base URL of the classification service
    pub url: Option<String>,
    /// Per-request timeout; unset means no timeout
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub device: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            width: Resolution::SQUARE.width,
            height: Resolution::SQUARE.height,
            fps: 30,
            mirror: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GeometryKind {
    #[default]
    Fixed,
    Native,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EncoderConfig {
    pub geometry: GeometryKind,
    /// Canvas size in fixed mode
    pub width: u32,
    pub height: u32,
    /// Upper bound in native mode
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryKind::Fixed,
            width: Resolution::SQUARE.width,
            height: Resolution::SQUARE.height,
            max_width: Resolution::VGA.width,
            max_height: Resolution::VGA.height,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl EncoderConfig {
    pub fn output_geometry(&self) -> OutputGeometry {
        match self.geometry {
            GeometryKind::Fixed => OutputGeometry::Fixed {
                width: self.width,
                height: self.height,
            },
            GeometryKind::Native => OutputGeometry::Native {
                max_width: self.max_width,
                max_height: self.max_height,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingSection {
    pub interval_ms: u64,
    pub cadence: Cadence,
    pub max_in_flight: usize,
    pub backoff: bool,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            cadence: Cadence::Serial,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            backoff: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Print state changes to stdout instead of drawing the dashboard
    pub headless: bool,
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub camera: Option<u32>,
    pub mirror: bool,
    pub interval_ms: Option<u64>,
    pub cadence: Option<Cadence>,
    pub quality: Option<u8>,
    pub backoff: bool,
    pub headless: bool,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint_url: String,
    pub request_timeout: Option<Duration>,
    pub constraints: CaptureConstraints,
    pub geometry: OutputGeometry,
    pub quality: u8,
    pub polling: PollingConfig,
    pub headless: bool,
}

impl Settings {
    /// Merge the layers and validate the result.
    pub fn resolve(
        config: &Config,
        overrides: &Overrides,
        env_endpoint: Option<String>,
    ) -> Result<Self, ConfigError> {
        let endpoint_url = overrides
            .endpoint
            .clone()
            .or(env_endpoint)
            .or_else(|| config.endpoint.url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(endpoint_url.starts_with("http://") || endpoint_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint URL must start with http:// or https://, got '{}'",
                endpoint_url
            )));
        }

        let quality = overrides.quality.unwrap_or(config.encoder.quality);
        if !QUALITY_RANGE.contains(&quality) {
            return Err(ConfigError::Invalid(format!(
                "encoder quality must be between {} and {}, got {}",
                QUALITY_RANGE.start(),
                QUALITY_RANGE.end(),
                quality
            )));
        }

        let interval =
            Duration::from_millis(overrides.interval_ms.unwrap_or(config.polling.interval_ms));
        if interval < MIN_INTERVAL {
            return Err(ConfigError::Invalid(format!(
                "polling interval must be at least {}ms, got {}ms",
                MIN_INTERVAL.as_millis(),
                interval.as_millis()
            )));
        }

        let cadence = overrides.cadence.unwrap_or(config.polling.cadence);
        let backoff = overrides.backoff || config.polling.backoff;
        if backoff && cadence == Cadence::FixedRate {
            return Err(ConfigError::Invalid(
                "backoff only applies to the serial cadence".to_string(),
            ));
        }

        let geometry = config.encoder.output_geometry();
        let (out_width, out_height) = match geometry {
            OutputGeometry::Fixed { width, height } => (width, height),
            OutputGeometry::Native {
                max_width,
                max_height,
            } => (max_width, max_height),
        };
        if out_width == 0 || out_height == 0 || config.camera.width == 0 || config.camera.height == 0
        {
            return Err(ConfigError::Invalid(
                "camera and encoder dimensions must be non-zero".to_string(),
            ));
        }

        Ok(Self {
            endpoint_url,
            request_timeout: config.endpoint.timeout_ms.map(Duration::from_millis),
            constraints: CaptureConstraints {
                device_index: overrides.camera.unwrap_or(config.camera.device),
                ideal_resolution: Resolution {
                    width: config.camera.width,
                    height: config.camera.height,
                },
                fps: config.camera.fps.max(1),
                mirror: overrides.mirror || config.camera.mirror,
            },
            geometry,
            quality,
            polling: PollingConfig {
                interval,
                cadence,
                max_in_flight: config.polling.max_in_flight.max(1),
                backoff,
            },
            headless: overrides.headless || config.ui.headless,
        })
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// if present, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_from(path)
            }
            None => {
                let path = default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Config file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("gesture-sense").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/gesture-sense/config.toml")
        })
}

/// Commented default configuration written by `config init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# gesture-sense configuration

[endpoint]
# Base URL of the classification service (POST {url}/predict)
# url = "https://gesture-sense-backend-production.up.railway.app"
# Per-request timeout in milliseconds (unset = no timeout)
# timeout_ms = 5000

[camera]
# Camera device index (see `gesture-sense list-cameras`)
device = 0
# Ideal capture resolution; the device may deliver another one
width = 200
height = 200
fps = 30
# Mirror horizontally (selfie view)
mirror = false

[encoder]
# "fixed": letterbox into width x height
# "native": keep capture size, downscale to fit max_width x max_height
geometry = "fixed"
width = 200
height = 200
max_width = 640
max_height = 480
# JPEG quality, 80-95
quality = 92

[polling]
# Time between submissions
interval_ms = 200
# "serial": wait for each result before re-arming
# "fixed-rate": submit every interval, overlapping requests allowed
cadence = "serial"
# Cap on overlapping requests in fixed-rate mode
max_in_flight = 4
# Back off exponentially after consecutive failures (serial cadence only)
backoff = false

[ui]
# Print updates to stdout instead of drawing the dashboard
headless = false
"#;

/// Write the default template to `path`, creating parent directories.
pub fn write_default(path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(io_err)
}
