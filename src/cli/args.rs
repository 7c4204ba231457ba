//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::CadenceArg;
use crate::config::Overrides;
use crate::encoder::QUALITY_RANGE;

/// Parse and validate JPEG quality (80-95)
fn parse_quality(s: &str) -> Result<u8, String> {
    let quality: u8 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid quality", s))?;
    if !QUALITY_RANGE.contains(&quality) {
        return Err(format!(
            "Quality must be between {} and {}, got {}",
            QUALITY_RANGE.start(),
            QUALITY_RANGE.end(),
            quality
        ));
    }
    Ok(quality)
}

/// Parse and validate polling interval in milliseconds (20-60000)
fn parse_interval(s: &str) -> Result<u64, String> {
    let ms: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid interval", s))?;
    if !(20..=60_000).contains(&ms) {
        return Err(format!(
            "Interval must be between 20 and 60000 ms, got {}",
            ms
        ));
    }
    Ok(ms)
}

/// Live hand-gesture recognition from a webcam
#[derive(Parser, Debug)]
#[command(name = "gesture-sense")]
#[command(version, about = "Live hand-gesture recognition from a webcam", long_about = None)]
#[command(after_help = "EXAMPLES:
    gesture-sense                              # Dashboard with default endpoint
    gesture-sense --endpoint http://localhost:8000
    gesture-sense --headless --cadence fixed-rate
    gesture-sense predict hand.jpg             # Classify a single image
    gesture-sense list-cameras")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Classification service base URL (overrides GESTURE_SENSE_ENDPOINT)
    #[arg(long, short)]
    pub endpoint: Option<String>,

    /// Camera device index (from list-cameras)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Mirror camera horizontally
    #[arg(long)]
    pub mirror: bool,

    /// Milliseconds between submissions
    #[arg(long, short, value_parser = parse_interval)]
    pub interval: Option<u64>,

    /// How submissions are scheduled
    #[arg(long)]
    pub cadence: Option<CadenceArg>,

    /// JPEG quality (80-95)
    #[arg(long, short, value_parser = parse_quality)]
    pub quality: Option<u8>,

    /// Back off after consecutive failed requests (serial cadence only)
    #[arg(long)]
    pub backoff: bool,

    /// Print updates to stdout instead of drawing the dashboard
    #[arg(long)]
    pub headless: bool,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Log file path (dashboard mode; headless logs go to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Command-line layer for [`crate::config::Settings::resolve`].
    pub fn overrides(&self) -> Overrides {
        Overrides {
            endpoint: self.endpoint.clone(),
            camera: self.camera,
            mirror: self.mirror,
            interval_ms: self.interval,
            cadence: self.cadence.map(Into::into),
            quality: self.quality,
            backoff: self.backoff,
            headless: self.headless,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Classify a single image file and print the result
    Predict {
        /// Image to classify (any format the image crate decodes)
        image: PathBuf,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,
    /// Create default config file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polling::Cadence;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["gesture-sense"]);
        assert!(args.endpoint.is_none());
        assert!(args.camera.is_none());
        assert!(!args.mirror);
        assert!(args.interval.is_none());
        assert!(args.cadence.is_none());
        assert!(args.quality.is_none());
        assert!(!args.backoff);
        assert!(!args.headless);
        assert!(args.config.is_none());
        assert!(args.log_file.is_none());
        assert!(args.command.is_none());
    }

    #[test]
    fn test_args_endpoint_option() {
        let args = Args::parse_from(["gesture-sense", "--endpoint", "http://localhost:8000"]);
        assert_eq!(args.endpoint.as_deref(), Some("http://localhost:8000"));

        let args = Args::parse_from(["gesture-sense", "-e", "http://10.0.0.2"]);
        assert_eq!(args.endpoint.as_deref(), Some("http://10.0.0.2"));
    }

    #[test]
    fn test_args_interval_bounds() {
        let args = Args::parse_from(["gesture-sense", "--interval", "500"]);
        assert_eq!(args.interval, Some(500));

        assert!(Args::try_parse_from(["gesture-sense", "--interval", "5"]).is_err());
        assert!(Args::try_parse_from(["gesture-sense", "--interval", "soon"]).is_err());
    }

    #[test]
    fn test_args_quality_bounds() {
        let args = Args::parse_from(["gesture-sense", "-q", "85"]);
        assert_eq!(args.quality, Some(85));

        assert!(Args::try_parse_from(["gesture-sense", "--quality", "79"]).is_err());
        assert!(Args::try_parse_from(["gesture-sense", "--quality", "96"]).is_err());
    }

    #[test]
    fn test_args_cadence_values() {
        let args = Args::parse_from(["gesture-sense", "--cadence", "serial"]);
        assert_eq!(args.cadence, Some(CadenceArg::Serial));

        let args = Args::parse_from(["gesture-sense", "--cadence", "fixed-rate"]);
        assert_eq!(args.cadence, Some(CadenceArg::FixedRate));

        assert!(Args::try_parse_from(["gesture-sense", "--cadence", "bursty"]).is_err());
    }

    #[test]
    fn test_args_list_cameras_subcommand() {
        let args = Args::parse_from(["gesture-sense", "list-cameras"]);
        assert!(matches!(args.command, Some(Command::ListCameras)));
    }

    #[test]
    fn test_args_config_subcommands() {
        let args = Args::parse_from(["gesture-sense", "config", "show"]);
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Show
            })
        ));

        let args = Args::parse_from(["gesture-sense", "config", "init"]);
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Init
            })
        ));
    }

    #[test]
    fn test_args_predict_subcommand() {
        let args = Args::parse_from(["gesture-sense", "predict", "/tmp/hand.jpg"]);
        match args.command {
            Some(Command::Predict { image }) => assert_eq!(image, PathBuf::from("/tmp/hand.jpg")),
            _ => panic!("Expected Predict subcommand"),
        }
    }

    #[test]
    fn test_overrides_from_args() {
        let args = Args::parse_from([
            "gesture-sense",
            "--endpoint",
            "http://localhost:8000",
            "--camera",
            "1",
            "--mirror",
            "--interval",
            "250",
            "--cadence",
            "fixed-rate",
            "--quality",
            "90",
            "--backoff",
            "--headless",
        ]);
        let overrides = args.overrides();
        assert_eq!(overrides.endpoint.as_deref(), Some("http://localhost:8000"));
        assert_eq!(overrides.camera, Some(1));
        assert!(overrides.mirror);
        assert_eq!(overrides.interval_ms, Some(250));
        assert_eq!(overrides.cadence, Some(Cadence::FixedRate));
        assert_eq!(overrides.quality, Some(90));
        assert!(overrides.backoff);
        assert!(overrides.headless);
    }
}
