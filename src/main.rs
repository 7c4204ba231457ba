use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use gesture_sense::app::{self, AppError};
use gesture_sense::cli::{self, Args, Command, ConfigAction};
use gesture_sense::config::{self, Config, Settings};
use gesture_sense::inference::ENDPOINT_ENV;

/// How long exit waits for blocking work still running on the runtime.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Default log file for dashboard mode, next to the data of other runs.
fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("gesture-sense")
        .join("gesture-sense.log")
}

/// Initialize logging.
///
/// The dashboard owns the terminal, so logs go to a file there; headless
/// mode and subcommands log to stderr. `RUST_LOG` overrides the level.
fn init_logging(to_file: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if let Some(path) = to_file {
        let opened = path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(path));
        match opened {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                // Logging to the terminal would corrupt the dashboard
                eprintln!("Warning: cannot open log file {}: {}", path.display(), e);
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    builder.init();
}

/// Load the config file.
///
/// If --config is specified, require the file to exist. Otherwise fall back
/// to defaults when the default file is missing or unreadable.
fn load_config(path: Option<&Path>) -> Result<Config, AppError> {
    match path {
        Some(path) => Ok(Config::load(Some(path))?),
        None => match Config::load(None) {
            Ok(c) => Ok(c),
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                eprintln!("Using default settings.\n");
                Ok(Config::default())
            }
        },
    }
}

fn run(args: Args) -> Result<(), AppError> {
    // `config init` creates the file, so it must not require it
    let creating = matches!(
        args.command,
        Some(Command::Config {
            action: ConfigAction::Init
        })
    );
    let file_config = if creating {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };
    let settings = Settings::resolve(
        &file_config,
        &args.overrides(),
        std::env::var(ENDPOINT_ENV).ok(),
    )?;

    let dashboard = args.command.is_none() && !settings.headless;
    let log_file = if dashboard {
        Some(args.log_file.clone().unwrap_or_else(default_log_path))
    } else {
        None
    };
    init_logging(log_file.as_deref());

    match args.command {
        Some(Command::ListCameras) => cli::list_cameras(),
        Some(Command::Config { action }) => {
            cli::handle_config_action(action, args.config.as_deref(), &settings)
        }
        Some(Command::Predict { image }) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cli::predict_image(image, &settings))
        }
        None => {
            if let Some(path) = &log_file {
                log::info!("Logging to {}", path.display());
            }
            let rt = tokio::runtime::Runtime::new()?;
            let result = rt.block_on(app::run(settings));
            // A camera open stuck in spawn_blocking must not hold up exit
            rt.shutdown_timeout(SHUTDOWN_GRACE);
            result
        }
    }
}

fn main() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        if matches!(e, AppError::Config(config::ConfigError::NotFound(_))) {
            eprintln!("Create one with 'gesture-sense config init'.");
        }
        std::process::exit(1);
    }
}
