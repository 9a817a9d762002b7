//! Log backend writing timestamped lines to the console and a log file.
//!
//! Every module logs through the `log` facade; this backend formats each record
//! as `[HH:MM:SS.mmm] LEVEL message` and appends it to `logs/auto-spectator.log`.

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

pub const LOG_FILE_NAME: &str = "auto-spectator.log";

struct SpectatorLogger {
    log_path: PathBuf,
}

impl Log for SpectatorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(record.level(), &record.args().to_string());
        print!("{}", line);
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
        {
            let _ = file.write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

fn format_line(level: Level, message: &str) -> String {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    format!("[{}] {:<5} {}\n", timestamp, level, message)
}

/// Installs the logger. Call once at startup, after the logs directory exists.
pub fn init(debug: bool) -> anyhow::Result<()> {
    let logger = SpectatorLogger {
        log_path: crate::paths::get_logs_dir().join(LOG_FILE_NAME),
    };
    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
    set_debug(debug);
    Ok(())
}

/// Switches between debug and info verbosity at runtime.
pub fn set_debug(debug: bool) {
    log::set_max_level(if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
}
