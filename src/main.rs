//! BF2 Auto Spectator
//!
//! Keeps a Battlefield 2 client spectating a server unattended: launches and
//! restarts the game, joins the target server, spawns and suicides each round
//! and rotates through players while the HUD is hidden.

mod config;
mod coords;
mod game;
mod logging;
mod paths;
mod platform;
mod remote;
mod spectate;
mod vision;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use config::{AppConfig, Cli};

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join(logging::LOG_FILE_NAME);
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            use std::io::Write;
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| paths::get_exe_dir().join("config.json"));
    let mut config = AppConfig::load(&config_path);
    config.apply_cli(&cli);

    paths::ensure_directories(config.debug_screenshot)?;
    logging::init(config.debug_log)?;
    info!("Starting auto-spectator v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("{:#}", e);
        return Err(e);
    }

    let result = run(config, config_path);
    if let Err(e) = &result {
        error!("Exiting: {:#}", e);
    }
    result
}

#[cfg(windows)]
fn run(config: AppConfig, config_path: std::path::PathBuf) -> Result<()> {
    use std::rc::Rc;

    use coords::SpawnTable;
    use game::manager::{Collaborators, InstanceManager, LaunchSettings};
    use platform::windows::{GdiScreenGrabber, SendInputSynthesizer, Win32GameHost};
    use platform::{Clock, SystemClock};
    use remote::{ControllerClient, HttpControllerClient, HttpStreamClient, StreamClient, REQUEST_TIMEOUT};
    use spectate::{ControlLoop, Remotes};
    use vision::{ReferenceHistograms, TesseractClassifier};

    let references = ReferenceHistograms::load(&paths::get_histograms_path(), config.resolution)?;
    info!("Loaded {} reference histograms for {}", references.len(), config.resolution);

    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let collaborators = Collaborators {
        classifier: Box::new(TesseractClassifier::new(
            &config.tesseract_path,
            Box::new(GdiScreenGrabber::new()),
            config.debug_screenshot,
        )),
        input: Box::new(SendInputSynthesizer::new()),
        host: Box::new(Win32GameHost::new()),
        clock: clock.clone(),
    };
    let launch = LaunchSettings {
        game_path: config.game_path.clone(),
        player_name: config.player_name.clone(),
        player_pass: config.player_pass.clone(),
        conman_path: paths::get_conman_path(),
    };
    let manager = InstanceManager::new(
        config.resolution,
        references,
        SpawnTable::builtin(),
        launch,
        collaborators,
    )?;

    let mut remotes = Remotes::default();
    if config.use_controller {
        info!("Using controller at {}", config.controller_base_uri);
        let controller: Box<dyn ControllerClient> =
            Box::new(HttpControllerClient::new(&config.controller_base_uri, REQUEST_TIMEOUT)?);
        remotes.controller = Some(controller);
    }
    if config.control_stream {
        info!("Controlling stream at {}", config.stream_base_uri);
        let stream: Box<dyn StreamClient> =
            Box::new(HttpStreamClient::new(&config.stream_base_uri, REQUEST_TIMEOUT)?);
        remotes.stream = Some(stream);
    }

    let mut control = ControlLoop::new(manager, config, Some(config_path), remotes, clock);
    control.attach();
    control.run()
}

#[cfg(not(windows))]
fn run(_config: AppConfig, _config_path: std::path::PathBuf) -> Result<()> {
    anyhow::bail!("auto-spectator drives the Windows game client and only runs on Windows")
}
