use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the debug screenshot directory: `<exe_dir>/auto-spectator-debug/`
pub fn get_debug_dir() -> PathBuf {
    get_exe_dir().join("auto-spectator-debug")
}

/// Returns the resources directory: `<exe_dir>/resources/`
pub fn get_resources_dir() -> PathBuf {
    get_exe_dir().join("resources")
}

/// Returns the path of the reference histogram table.
pub fn get_histograms_path() -> PathBuf {
    get_resources_dir().join("histograms.json")
}

/// Returns the path of the connection manager used for pre-launch cleanup.
pub fn get_conman_path() -> PathBuf {
    get_exe_dir().join("redist").join("bf2-conman.exe")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories(debug_screenshots: bool) -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    if debug_screenshots {
        std::fs::create_dir_all(get_debug_dir())?;
    }
    Ok(())
}
