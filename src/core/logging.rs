//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - yt-dlp / token cache configuration logging at startup

use anyhow::Result;
use fs_err::File;
use simplelog::*;

use crate::core::config;

/// Parses a textual level, falling back to `Info` for unknown values.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `level` - Level filter applied to both outputs
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str, level: LevelFilter) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the yt-dlp and PO Token configuration at startup
pub fn log_startup_configuration() {
    log::info!("yt-dlp binary: {}", *config::YTDL_BIN);

    let cache_file = config::potoken::cache_file();
    if cache_file.exists() {
        log::info!("PO Token cache: {}", cache_file.display());
    } else {
        log::info!(
            "PO Token cache: {} (not created yet, tokens will be generated on demand)",
            cache_file.display()
        );
    }
    log::info!(
        "PO Token TTL: {} days, probe timeout: {}s",
        config::potoken::DEFAULT_TTL_DAYS,
        config::potoken::GENERATION_TIMEOUT_SECS
    );
}
