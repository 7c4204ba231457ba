//! Subcommand handlers for list-cameras, config, and predict.

use std::path::{Path, PathBuf};

use super::args::ConfigAction;
use crate::app::AppError;
use crate::camera;
use crate::config::{self, ConfigError, Settings};
use crate::encoder::FrameEncoder;
use crate::inference::InferenceClient;

/// List available cameras and print them to stdout.
pub fn list_cameras() -> Result<(), AppError> {
    let devices = camera::list_devices()?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
        println!("On macOS, grant access in System Settings > Privacy & Security > Camera.");
    } else {
        println!("Available cameras:");
        for device in devices {
            println!("  {}", device);
        }
        println!();
        println!("Use --camera <index> to select a camera.");
    }
    Ok(())
}

/// Handle config subcommand actions.
///
/// `config_path` is the `--config` value, if given; `init` writes there
/// instead of the default location.
pub fn handle_config_action(
    action: ConfigAction,
    config_path: Option<&Path>,
    settings: &Settings,
) -> Result<(), AppError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_path);

    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            for line in describe_settings(settings) {
                println!("  {}", line);
            }
            println!();
            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
        }
        ConfigAction::Init => {
            if path.exists() {
                eprintln!("Config file already exists: {}", path.display());
                eprintln!("Use 'gesture-sense config show' to view current settings.");
                return Err(ConfigError::Invalid(format!(
                    "refusing to overwrite {}",
                    path.display()
                ))
                .into());
            }
            config::write_default(&path)?;
            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}

/// Human-readable lines for `config show`.
pub fn describe_settings(settings: &Settings) -> Vec<String> {
    let timeout = settings
        .request_timeout
        .map_or_else(|| "none".to_string(), |t| format!("{}ms", t.as_millis()));
    vec![
        format!("Endpoint: {}", settings.endpoint_url),
        format!("Request timeout: {}", timeout),
        format!("Camera: {}", settings.constraints.device_index),
        format!(
            "Capture: {} @ {}fps",
            settings.constraints.ideal_resolution, settings.constraints.fps
        ),
        format!(
            "Mirror: {}",
            if settings.constraints.mirror { "yes" } else { "no" }
        ),
        format!("Encoder: {:?}, quality {}", settings.geometry, settings.quality),
        format!("Interval: {}ms", settings.polling.interval.as_millis()),
        format!("Cadence: {}", settings.polling.cadence.name()),
        format!("Max in flight: {}", settings.polling.max_in_flight),
        format!(
            "Backoff: {}",
            if settings.polling.backoff { "on" } else { "off" }
        ),
        format!(
            "Mode: {}",
            if settings.headless { "headless" } else { "dashboard" }
        ),
    ]
}

/// Classify one image file with the configured encoder and endpoint.
pub async fn predict_image(image_path: PathBuf, settings: &Settings) -> Result<(), AppError> {
    let image = image::open(&image_path)
        .map_err(|source| AppError::Image {
            path: image_path.clone(),
            source,
        })?
        .to_rgb8();

    let encoder = FrameEncoder::new(settings.geometry, settings.quality)?;
    let encoded = encoder.encode_image(&image)?;
    let (width, height) = encoded.dimensions();
    log::info!(
        "Encoded {} as {}x{} JPEG ({} bytes)",
        image_path.display(),
        width,
        height,
        encoded.bytes().len()
    );

    let client = InferenceClient::with_timeout(&settings.endpoint_url, settings.request_timeout)?;
    let result = client.submit(encoded).await?;

    match result.hand_label() {
        Some(label) => println!("{} ({:.1}%)", label, f64::from(result.confidence.min(1.0)) * 100.0),
        None => println!("No hand detected"),
    }
    Ok(())
}
