use std::fs::{self, File};
use std::path::PathBuf;
use chrono::Local;
use env_logger::{Builder, Target};
use log::{info, LevelFilter};

use crate::config::subsystems::LoggingConfig;
use crate::error::{Error, Result};

/// Install the global logger.
///
/// With `log_to_file` set, output goes to `<log_dir>/<name>_<timestamp>.log`
/// and the path is returned; otherwise it goes to stderr.
pub fn init_logging(config: &LoggingConfig, name: &str) -> Result<Option<PathBuf>> {
    let level = config.level_filter();
    let mut builder = Builder::new();
    builder.filter(None, level);

    let log_path = if config.log_to_file {
        fs::create_dir_all(&config.log_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = config.log_dir.join(format!("{}_{}.log", name, timestamp));
        let log_file = File::create(&path)?;
        builder.target(Target::Pipe(Box::new(log_file)));
        Some(path)
    } else {
        builder.target(Target::Stderr);
        None
    };

    builder
        .try_init()
        .map_err(|e| Error::config(format!("Failed to initialise logger: {}", e)))?;

    if level != LevelFilter::Off {
        info!("Starting {} with log level: {:?}", name, level);
    }
    Ok(log_path)
}
