//! Configuration for the spectator.
//!
//! Settings come from `config.json` next to the executable, with every field
//! defaulted so partial files work. Command-line flags override file values.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::coords::Resolution;
use crate::game::state::ServerInfo;

/// Game mods the spectator can launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GameMod {
    Bf2,
    Xpack,
    Bfp2,
}

impl GameMod {
    pub fn as_str(self) -> &'static str {
        match self {
            GameMod::Bf2 => "bf2",
            GameMod::Xpack => "xpack",
            GameMod::Bfp2 => "bfp2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "bf2" => Some(GameMod::Bf2),
            "xpack" => Some(GameMod::Xpack),
            "bfp2" => Some(GameMod::Bfp2),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameMod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete spectator configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub player_name: String,
    pub player_pass: String,
    pub server_ip: String,
    pub server_port: u16,
    pub server_pass: Option<String>,
    pub server_mod: GameMod,
    /// Directory containing BF2.exe
    pub game_path: PathBuf,
    pub tesseract_path: PathBuf,
    pub resolution: Resolution,
    /// Whether instances are restarted after `instance_rtl` rounds
    pub limit_rtl: bool,
    pub instance_rtl: u32,
    pub min_iterations_on_player: u32,
    pub max_iterations_on_player: u32,
    pub max_iterations_on_default_camera_view: u32,
    pub lockup_iterations_on_spawn_menu: u32,
    pub active_join_delay_secs: u64,
    pub halted_stream_grace_secs: u64,
    pub use_controller: bool,
    pub controller_base_uri: String,
    pub control_stream: bool,
    pub stream_base_uri: String,
    pub debug_log: bool,
    pub debug_screenshot: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            player_name: String::new(),
            player_pass: String::new(),
            server_ip: String::new(),
            server_port: 16567,
            server_pass: None,
            server_mod: GameMod::Bf2,
            game_path: PathBuf::from(r"C:\Program Files (x86)\EA Games\Battlefield 2"),
            tesseract_path: PathBuf::from(r"C:\Program Files\Tesseract-OCR\tesseract.exe"),
            resolution: Resolution::Hd720,
            limit_rtl: true,
            instance_rtl: 6,
            min_iterations_on_player: 1,
            max_iterations_on_player: 5,
            max_iterations_on_default_camera_view: 6,
            lockup_iterations_on_spawn_menu: 5,
            active_join_delay_secs: 30,
            halted_stream_grace_secs: 180,
            use_controller: false,
            controller_base_uri: "http://localhost:8080".to_string(),
            control_stream: false,
            stream_base_uri: "http://localhost:4445".to_string(),
            debug_log: false,
            debug_screenshot: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, falling back to defaults when the file
    /// is missing or malformed.
    pub fn load(path: &Path) -> Self {
        info!("Looking for config at: {}", path.display());

        if !path.exists() {
            info!("{} not found, using default config", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    info!("Config loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Applies command-line overrides on top of file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.player_name {
            self.player_name = v.clone();
        }
        if let Some(v) = &cli.player_pass {
            self.player_pass = v.clone();
        }
        if let Some(v) = &cli.server_ip {
            self.server_ip = v.clone();
        }
        if let Some(v) = cli.server_port {
            self.server_port = v;
        }
        if let Some(v) = &cli.server_pass {
            self.server_pass = Some(v.clone()).filter(|p| !p.is_empty());
        }
        if let Some(v) = cli.server_mod {
            self.server_mod = v;
        }
        if let Some(v) = &cli.game_path {
            self.game_path = v.clone();
        }
        if let Some(v) = &cli.tesseract_path {
            self.tesseract_path = v.clone();
        }
        if let Some(v) = cli.game_res {
            self.resolution = v;
        }
        if let Some(v) = cli.instance_rtl {
            self.instance_rtl = v;
        }
        if cli.no_rtl_limit {
            self.limit_rtl = false;
        }
        if let Some(v) = cli.min_iterations_on_player {
            self.min_iterations_on_player = v;
        }
        if let Some(v) = cli.max_iterations_on_player {
            self.max_iterations_on_player = v;
        }
        if let Some(v) = cli.max_iterations_on_default_camera_view {
            self.max_iterations_on_default_camera_view = v;
        }
        if let Some(v) = cli.lockup_iterations_on_spawn_menu {
            self.lockup_iterations_on_spawn_menu = v;
        }
        if cli.use_controller {
            self.use_controller = true;
        }
        if let Some(v) = &cli.controller_base_uri {
            self.controller_base_uri = v.clone();
        }
        if cli.control_stream {
            self.control_stream = true;
        }
        if let Some(v) = &cli.stream_base_uri {
            self.stream_base_uri = v.clone();
        }
        if cli.debug_log {
            self.debug_log = true;
        }
        if cli.debug_screenshot {
            self.debug_screenshot = true;
        }
    }

    pub fn game_executable(&self) -> PathBuf {
        self.game_path.join("BF2.exe")
    }

    /// Server the spectator is configured to join.
    pub fn server(&self) -> ServerInfo {
        ServerInfo {
            ip: self.server_ip.clone(),
            port: self.server_port,
            password: self.server_pass.clone(),
        }
    }

    pub fn set_server(&mut self, server: &ServerInfo) {
        self.server_ip = server.ip.clone();
        self.server_port = server.port;
        self.server_pass = server.password.clone();
    }

    /// Checks the settings the spectator cannot run without.
    pub fn validate(&self) -> Result<()> {
        if !self.game_executable().is_file() {
            bail!(
                "Could not find BF2.exe in {}, please check your game path",
                self.game_path.display()
            );
        }
        if !self.tesseract_path.is_file() {
            bail!(
                "Could not find tesseract.exe at {}, please check your Tesseract install",
                self.tesseract_path.display()
            );
        }
        if self.server_ip.is_empty() && !self.use_controller {
            bail!("A server ip is required when not using a controller");
        }
        if self.min_iterations_on_player > self.max_iterations_on_player {
            bail!(
                "min-iterations-on-player ({}) exceeds max-iterations-on-player ({})",
                self.min_iterations_on_player,
                self.max_iterations_on_player
            );
        }
        Ok(())
    }

    /// Writes the configuration back, e.g. after the game swapped mods.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Command-line flags. Every value is optional and overrides config.json.
#[derive(Parser, Debug, Default)]
#[command(name = "auto-spectator", version, about = "Automated spectator for BF2 servers")]
pub struct Cli {
    /// Path of the config file (defaults to config.json next to the executable)
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub player_name: Option<String>,
    #[arg(long)]
    pub player_pass: Option<String>,
    #[arg(long)]
    pub server_ip: Option<String>,
    #[arg(long)]
    pub server_port: Option<u16>,
    #[arg(long)]
    pub server_pass: Option<String>,
    #[arg(long, value_enum)]
    pub server_mod: Option<GameMod>,
    #[arg(long)]
    pub game_path: Option<PathBuf>,
    #[arg(long)]
    pub tesseract_path: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub game_res: Option<Resolution>,
    /// Rounds played on one game instance before a scheduled restart
    #[arg(long)]
    pub instance_rtl: Option<u32>,
    #[arg(long)]
    pub no_rtl_limit: bool,
    #[arg(long)]
    pub min_iterations_on_player: Option<u32>,
    #[arg(long)]
    pub max_iterations_on_player: Option<u32>,
    #[arg(long)]
    pub max_iterations_on_default_camera_view: Option<u32>,
    #[arg(long)]
    pub lockup_iterations_on_spawn_menu: Option<u32>,
    #[arg(long)]
    pub use_controller: bool,
    #[arg(long)]
    pub controller_base_uri: Option<String>,
    #[arg(long)]
    pub control_stream: bool,
    #[arg(long)]
    pub stream_base_uri: Option<String>,
    #[arg(long)]
    pub debug_log: bool,
    #[arg(long)]
    pub debug_screenshot: bool,
}
