//! Instance manager: translates game intents into visual probes and input.
//!
//! Probes never fail: a classifier error is logged and reported as "not
//! matched". Actions report success as `bool`, except spawning, which also
//! signals when no spawn coordinates exist for the current map.
//!
//! Every UI transition follows the same shape: probe, act once, re-probe,
//! with a bounded number of attempts, since a single synthesized keypress or
//! click is not guaranteed to register.

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use super::constants::{self, refs};
use super::state::{ServerInfo, SessionState, Team};
use crate::config::GameMod;
use crate::coords::{
    ClickTarget, Coordinates, HistRegion, OcrRegion, Point, Rect, Resolution, SpawnTable,
    FULL_FRAME_SIDE_MARGIN, WINDOW_TITLE_BAR_HEIGHT,
};
use crate::platform::{Clock, GameHost, GameWindow, InputSynthesizer, Key};
use crate::vision::mapname::MapNameNormalizer;
use crate::vision::similarity::similarity;
use crate::vision::{Histogram, ImageOp, ReferenceHistograms, VisualClassifier};

/// Result of locating (or launching) the game window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstanceStatus {
    pub window_found: bool,
    /// Window size and mod match what was requested
    pub parameters_match: bool,
    /// Mod the game process is actually running, if it could be read
    pub running_mod: Option<GameMod>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned,
    Failed,
    /// No spawn coordinates exist for the current map/size/mode.
    UnsupportedCombination,
}

/// Player identity and install location used to launch the game.
#[derive(Clone, Debug)]
pub struct LaunchSettings {
    pub game_path: PathBuf,
    pub player_name: String,
    pub player_pass: String,
    pub conman_path: PathBuf,
}

/// External collaborators the manager drives.
pub struct Collaborators {
    pub classifier: Box<dyn VisualClassifier>,
    pub input: Box<dyn InputSynthesizer>,
    pub host: Box<dyn GameHost>,
    pub clock: Rc<dyn Clock>,
}

pub struct InstanceManager {
    coords: Coordinates,
    references: ReferenceHistograms,
    spawns: SpawnTable,
    normalizer: MapNameNormalizer,
    launch: LaunchSettings,
    classifier: Box<dyn VisualClassifier>,
    input: Box<dyn InputSynthesizer>,
    host: Box<dyn GameHost>,
    clock: Rc<dyn Clock>,
    rng: StdRng,
    window: Option<GameWindow>,
}

/// Extracts the mod from a `+modPath mods/<mod>` command-line argument.
pub fn parse_running_mod(command_line: &str) -> Option<GameMod> {
    let mut tokens = command_line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("+modPath") {
            let path = tokens.next()?.trim_matches('"');
            let name = path
                .strip_prefix("mods/")
                .or_else(|| path.strip_prefix("mods\\"))
                .unwrap_or(path);
            return GameMod::parse(name);
        }
    }
    None
}

impl InstanceManager {
    pub fn new(
        resolution: Resolution,
        references: ReferenceHistograms,
        spawns: SpawnTable,
        launch: LaunchSettings,
        collaborators: Collaborators,
    ) -> Result<Self> {
        Ok(Self {
            coords: Coordinates::new(resolution),
            references,
            spawns,
            normalizer: MapNameNormalizer::new()?,
            launch,
            classifier: collaborators.classifier,
            input: collaborators.input,
            host: collaborators.host,
            clock: collaborators.clock,
            rng: StdRng::from_entropy(),
            window: None,
        })
    }

    /// Makes random spawn selection reproducible.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn resolution(&self) -> Resolution {
        self.coords.resolution
    }

    pub fn window(&self) -> Option<&GameWindow> {
        self.window.as_ref()
    }

    pub fn set_debug_screenshots(&mut self, enabled: bool) {
        self.classifier.set_debug_screenshots(enabled);
    }

    fn sleep(&self, duration: Duration) {
        self.clock.sleep(duration);
    }

    // ---- launch / attach ----

    fn launch_args(&self, game_mod: GameMod) -> Vec<String> {
        let (width, height) = self.coords.resolution.window_size();
        vec![
            "+restart".to_string(),
            "1".to_string(),
            "+modPath".to_string(),
            format!("mods/{}", game_mod),
            "+playerName".to_string(),
            self.launch.player_name.clone(),
            "+playerPassword".to_string(),
            self.launch.player_pass.clone(),
            "+szx".to_string(),
            width.to_string(),
            "+szy".to_string(),
            height.to_string(),
            "+fullscreen".to_string(),
            "0".to_string(),
            // Fixed position keeps window rect math predictable
            "+wx".to_string(),
            "5".to_string(),
            "+wy".to_string(),
            "5".to_string(),
            "+developer".to_string(),
            "1".to_string(),
            "+disableShaderCache".to_string(),
            "1".to_string(),
            "+ignoreAsserts".to_string(),
            "1".to_string(),
        ]
    }

    /// Purges stale join history and caches. Failure is not fatal.
    fn run_pre_launch_cleanup(&mut self) {
        let conman = self.launch.conman_path.clone();
        if !conman.is_file() {
            debug!("{} not found, skipping pre-launch cleanup", conman.display());
            return;
        }
        info!("Running pre-launch cleanup");
        if let Err(e) =
            self.host
                .run_with_timeout(&conman, constants::CONMAN_ARGS, constants::CONMAN_TIMEOUT)
        {
            warn!("Pre-launch cleanup failed: {}", e);
        }
    }

    /// Starts a detached game process and waits for its window.
    pub fn launch_instance(&mut self, game_mod: GameMod) -> Result<InstanceStatus> {
        self.run_pre_launch_cleanup();

        let executable = self.launch.game_path.join(constants::GAME_EXECUTABLE);
        let args = self.launch_args(game_mod);
        info!("Launching {} ({})", executable.display(), game_mod);
        let game_path = self.launch.game_path.clone();
        self.host.spawn_detached(&executable, &args, &game_path)?;

        let mut found = false;
        for _ in 0..constants::LAUNCH_WINDOW_CHECKS {
            self.sleep(constants::LAUNCH_WINDOW_CHECK_INTERVAL);
            if self.refresh_window() {
                found = true;
                break;
            }
        }

        if found {
            // Login and initial menu rendering
            self.sleep(constants::LAUNCH_LOGIN_SETTLE);
        } else {
            error!("Game window did not appear after launch");
        }

        Ok(self.instance_status(game_mod))
    }

    /// Re-resolves the game window and checks it against the expected setup.
    pub fn find_instance(&mut self, game_mod: GameMod) -> InstanceStatus {
        self.refresh_window();
        self.instance_status(game_mod)
    }

    fn refresh_window(&mut self) -> bool {
        self.window = self
            .host
            .find_window(constants::GAME_WINDOW_TITLE, Some(constants::GAME_WINDOW_CLASS));
        self.window.is_some()
    }

    fn instance_status(&mut self, expected_mod: GameMod) -> InstanceStatus {
        let Some(window) = self.window.clone() else {
            return InstanceStatus {
                window_found: false,
                parameters_match: false,
                running_mod: None,
            };
        };

        let size_matches = window.client_size() == self.coords.resolution.window_size();
        if !size_matches {
            warn!(
                "Game window is {:?}, expected {:?}",
                window.client_size(),
                self.coords.resolution.window_size()
            );
        }

        let running_mod = self
            .host
            .command_line(window.pid)
            .and_then(|command_line| parse_running_mod(&command_line));
        if running_mod != Some(expected_mod) {
            warn!(
                "Game is running mod {:?}, expected {}",
                running_mod, expected_mod
            );
        }

        InstanceStatus {
            window_found: true,
            parameters_match: size_matches && running_mod == Some(expected_mod),
            running_mod,
        }
    }

    pub fn bring_to_foreground(&mut self) -> Result<()> {
        let window = self
            .window
            .as_ref()
            .ok_or_else(|| anyhow!("No game window"))?;
        self.host.bring_to_foreground(window)
    }

    pub fn is_responding(&mut self) -> bool {
        match &self.window {
            Some(window) => self.host.is_responding(window),
            None => false,
        }
    }

    /// Whether a native crash or assert dialog is open.
    pub fn is_error_window_present(&mut self) -> bool {
        constants::ERROR_WINDOW_TITLES
            .iter()
            .any(|title| self.host.find_window(title, None).is_some())
    }

    /// Quits through the in-game menu; returns whether the game stopped responding.
    pub fn quit_instance(&mut self) -> bool {
        self.open_menu(constants::OPEN_MENU_ATTEMPTS, constants::OPEN_MENU_INTERVAL);
        self.click(ClickTarget::QuitMenuItem);
        self.sleep(constants::QUIT_SETTLE);
        !self.is_responding()
    }

    pub fn kill_instance(&mut self) -> bool {
        let killed = match &self.window {
            Some(window) => self.host.kill(window),
            None => false,
        };
        // Windows needs a moment to tear the window down
        self.sleep(constants::KILL_SETTLE);
        self.window = None;
        killed
    }

    /// Opens the in-game menu unless it is already showing.
    pub fn open_menu(&mut self, max_attempts: u32, interval: Duration) -> bool {
        let mut in_menu = self.is_in_menu();
        let mut attempt = 0;
        while !in_menu && attempt < max_attempts {
            self.tap(Key::Escape);
            attempt += 1;
            self.sleep(interval);
            in_menu = self.is_in_menu();
        }
        self.reset_mouse();
        in_menu
    }

    // ---- input helpers ----

    fn send(&mut self, what: &str, f: impl FnOnce(&mut dyn InputSynthesizer) -> Result<()>) -> bool {
        match f(self.input.as_mut()) {
            Ok(()) => true,
            Err(e) => {
                warn!("Input failed ({}): {}", what, e);
                false
            }
        }
    }

    fn tap(&mut self, key: Key) -> bool {
        let down = self.send("key down", |input| input.key_down(key));
        self.sleep(constants::KEY_TAP_HOLD);
        let up = self.send("key up", |input| input.key_up(key));
        down && up
    }

    fn tap_repeatedly(&mut self, key: Key, count: u32) {
        for _ in 0..count {
            self.tap(key);
            self.sleep(constants::BACKSPACE_INTERVAL);
        }
    }

    fn type_text(&mut self, text: &str) -> bool {
        self.send("type", |input| input.type_text(text))
    }

    fn click(&mut self, target: ClickTarget) -> bool {
        let Some(window) = &self.window else {
            return false;
        };
        let point = self.coords.click(target);
        let (x, y) = (window.rect.left + point.x, window.rect.top + point.y);

        let moved = self.send("move", |input| input.move_to(x, y));
        self.sleep(constants::CLICK_SETTLE);
        let down = self.send("mouse down", |input| input.mouse_down());
        let up = self.send("mouse up", |input| input.mouse_up());
        moved && down && up
    }

    /// Moves by a raw offset and clicks. Only meaningful after a cursor reset.
    fn click_legacy(&mut self, offset: Point) -> bool {
        let moved = self.send("legacy move", |input| input.move_by(offset.x, offset.y));
        self.sleep(constants::LEGACY_MOVE_SETTLE);
        self.sleep(constants::SPAWN_MENU_SETTLE);
        let down = self.send("mouse down", |input| input.mouse_down());
        self.sleep(constants::LEGACY_MOVE_SETTLE);
        let up = self.send("mouse up", |input| input.mouse_up());
        moved && down && up
    }

    /// Pushes the cursor into the top-left corner using raw input.
    fn reset_mouse_legacy(&mut self) {
        let offset = constants::LEGACY_RESET_OFFSET;
        self.send("legacy reset", |input| input.move_by(offset, offset));
        self.sleep(constants::LEGACY_RESET_SETTLE);
    }

    /// Parks the cursor on the title bar so it does not highlight any control.
    fn reset_mouse(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let (x, y) = (window.rect.left + window.width() / 2, window.rect.top + 10);
        self.send("mouse reset", |input| input.move_to(x, y));
    }

    // ---- classifier helpers ----

    fn ocr_region(&mut self, rect: Rect, ops: &[ImageOp]) -> String {
        let Some(window) = &self.window else {
            return String::new();
        };
        match self.classifier.ocr(window, rect, ops) {
            Ok(text) => text,
            Err(e) => {
                debug!("OCR of {:?} failed: {}", rect, e);
                String::new()
            }
        }
    }

    fn ocr(&mut self, region: OcrRegion) -> String {
        let rect = self.coords.ocr(region);
        self.ocr_region(rect, &[ImageOp::Invert])
    }

    fn ocr_contains(&mut self, region: OcrRegion, needle: &str) -> bool {
        self.ocr(region).contains(needle)
    }

    fn histogram(&mut self, rect: Rect) -> Option<Histogram> {
        let window = self.window.as_ref()?;
        match self.classifier.histogram(window, rect) {
            Ok(histogram) => Some(histogram),
            Err(e) => {
                debug!("Histogram of {:?} failed: {}", rect, e);
                None
            }
        }
    }

    fn histogram_matches_any(&mut self, rect: Rect, keys: &[&str], max_delta: f64) -> bool {
        let Some(histogram) = self.histogram(rect) else {
            return false;
        };
        keys.iter().any(|key| match self.references.get(key) {
            Some(reference) => histogram.distance(reference) < max_delta,
            None => {
                warn!("Missing reference histogram {}", key);
                false
            }
        })
    }

    fn region_active(&mut self, region: HistRegion, key: &str) -> bool {
        let rect = self.coords.hist(region);
        self.histogram_matches_any(rect, &[key], constants::HISTCMP_MAX_DELTA)
    }

    /// Region of the window excluding the title bar and HUD edges.
    fn full_frame_rect(&self) -> Option<Rect> {
        let window = self.window.as_ref()?;
        Some(Rect::new(
            FULL_FRAME_SIDE_MARGIN,
            WINDOW_TITLE_BAR_HEIGHT,
            window.width() - 2 * FULL_FRAME_SIDE_MARGIN,
            window.height() - 40,
        ))
    }

    // ---- state probes ----

    pub fn is_in_menu(&mut self) -> bool {
        self.ocr_contains(OcrRegion::QuitMenuItem, "quit")
    }

    pub fn is_game_message_visible(&mut self) -> bool {
        self.ocr_contains(OcrRegion::GameMessageHeader, "game message")
    }

    pub fn ocr_game_message(&mut self) -> String {
        self.ocr(OcrRegion::GameMessageText)
    }

    pub fn is_multiplayer_menu_active(&mut self) -> bool {
        self.region_active(HistRegion::MenuMultiplayer, refs::MENU_MULTIPLAYER)
    }

    pub fn is_join_internet_menu_active(&mut self) -> bool {
        self.region_active(HistRegion::MenuJoinInternet, refs::MENU_JOIN_INTERNET)
    }

    pub fn is_connect_to_ip_button_visible(&mut self) -> bool {
        self.ocr_contains(OcrRegion::ConnectToIpButton, "connect to ip")
    }

    pub fn is_disconnect_prompt_visible(&mut self) -> bool {
        self.ocr_contains(OcrRegion::DisconnectPromptHeader, "disconnect")
    }

    pub fn is_disconnect_button_visible(&mut self) -> bool {
        self.ocr_contains(OcrRegion::DisconnectButton, "disconnect")
    }

    pub fn is_play_now_button_visible(&mut self) -> bool {
        self.ocr_contains(OcrRegion::PlayNowButton, "play now")
    }

    /// Tabs of the round-end screen are either all highlighted (while loading)
    /// or exactly one is (the selected tab). Only then is the header read.
    pub fn is_round_end_screen_visible(&mut self) -> bool {
        let tabs = [
            (HistRegion::EorScoreList, refs::EOR_SCORE_LIST),
            (HistRegion::EorTopPlayers, refs::EOR_TOP_PLAYERS),
            (HistRegion::EorTopScores, refs::EOR_TOP_SCORES),
            (HistRegion::EorMapBriefing, refs::EOR_MAP_BRIEFING),
        ];
        let active = tabs
            .iter()
            .filter(|(region, key)| self.region_active(*region, key))
            .count();
        if active != tabs.len() && active != 1 {
            return false;
        }

        let header = self.ocr(OcrRegion::EorHeaderItems);
        constants::EOR_HEADER_LABELS
            .iter()
            .any(|label| header.contains(label))
    }

    pub fn is_join_game_button_visible(&mut self) -> bool {
        // A hovered button renders differently
        self.reset_mouse();
        self.ocr_contains(OcrRegion::JoinGameButton, "join game")
    }

    /// Round-end screen without a join button: the next map is loading.
    pub fn is_map_loading(&mut self) -> bool {
        if self.is_join_game_button_visible() {
            return false;
        }
        self.is_round_end_screen_visible()
    }

    pub fn is_map_briefing_visible(&mut self) -> bool {
        self.ocr_contains(OcrRegion::MapBriefingHeader, "map briefing")
    }

    pub fn is_spawn_menu_visible(&mut self) -> bool {
        self.region_active(HistRegion::SpawnMenuCloseButton, refs::SPAWN_MENU_CLOSE)
    }

    pub fn is_scoreboard_visible(&mut self) -> bool {
        self.region_active(HistRegion::ScoreboardIconsLeft, refs::SCOREBOARD_ICONS_LEFT)
            && self.region_active(HistRegion::ScoreboardIconsRight, refs::SCOREBOARD_ICONS_RIGHT)
    }

    /// Compares the frame against the map's idle camera view, using a tighter
    /// threshold than other checks.
    pub fn is_default_camera_view_visible(&mut self, map: Option<&str>) -> bool {
        let Some(map) = map else {
            return false;
        };
        let key = refs::default_camera_view(map);
        if self.references.get(&key).is_none() {
            debug!("No default camera view reference for {}", map);
            return false;
        }
        let Some(rect) = self.full_frame_rect() else {
            return false;
        };
        self.histogram_matches_any(rect, &[&key], constants::DEFAULT_CAMERA_MAX_DELTA)
    }

    /// Samples several frames and checks that the picture actually changes.
    pub fn is_sufficient_action_on_screen(&mut self) -> bool {
        let Some(rect) = self.full_frame_rect() else {
            return false;
        };

        let mut histograms = Vec::with_capacity(constants::AFK_SCREENSHOT_COUNT);
        for i in 0..constants::AFK_SCREENSHOT_COUNT {
            match self.histogram(rect) {
                Some(histogram) => histograms.push(histogram),
                None => return false,
            }
            if i + 1 < constants::AFK_SCREENSHOT_COUNT {
                self.sleep(constants::AFK_SCREENSHOT_INTERVAL);
            }
        }

        let deltas: Vec<f64> = histograms
            .windows(2)
            .map(|pair| pair[0].distance(&pair[1]))
            .collect();
        let average = deltas.iter().sum::<f64>() / deltas.len().max(1) as f64;
        debug!("Average histogram delta: {:.4}", average);

        average > constants::AFK_MIN_DELTA
    }

    pub fn is_spawn_point_selectable(&mut self) -> bool {
        self.ocr_contains(OcrRegion::SpawnSelectedText, "select")
    }

    pub fn is_spawn_point_selected(&mut self) -> bool {
        self.ocr_contains(OcrRegion::SpawnSelectedText, "done")
    }

    pub fn is_suicide_button_visible(&mut self) -> bool {
        self.ocr_contains(OcrRegion::SuicideButton, "suicide")
    }

    pub fn get_map_name(&mut self) -> Option<String> {
        let raw = self.ocr(OcrRegion::EorMapName);
        if raw.is_empty() {
            return None;
        }
        let spawns = &self.spawns;
        Some(self.normalizer.normalize(&raw, |name| spawns.contains_map(name)))
    }

    pub fn get_map_size(&mut self) -> Option<u32> {
        let raw = self.ocr(OcrRegion::EorMapSize);
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok()
    }

    pub fn get_game_mode(&mut self) -> Option<String> {
        Some(self.ocr(OcrRegion::EorGameMode)).filter(|mode| !mode.is_empty())
    }

    /// Matches both team indicator regions; the right side wins if both match.
    pub fn get_player_team(&mut self) -> Option<Team> {
        let left = self.coords.hist(HistRegion::TeamLeft);
        let right = self.coords.hist(HistRegion::TeamRight);

        let mut team = None;
        if self.histogram_matches_any(
            left,
            &[refs::TEAM_USMC, refs::TEAM_EU],
            constants::HISTCMP_MAX_DELTA,
        ) {
            team = Some(Team::Left);
        }
        if self.histogram_matches_any(
            right,
            &[refs::TEAM_CHINA, refs::TEAM_MEC],
            constants::HISTCMP_MAX_DELTA,
        ) {
            team = Some(Team::Right);
        }
        team
    }

    /// Spawn points for the state's map, if it is a supported combination.
    pub fn spawn_points(&self, state: &SessionState) -> Option<&[Point]> {
        let map = state.rotation_map_name.as_deref()?;
        let size = state.rotation_map_size?;
        let mode = state.rotation_game_mode.as_deref()?;
        if !mode.contains(constants::SPAWN_GAME_MODE) {
            return None;
        }
        self.spawns.points(map, size)
    }

    // ---- state-changing actions ----

    /// Joins a server through the connect-to-ip dialog.
    pub fn connect_to_server(&mut self, server: &ServerInfo) -> bool {
        if !self.is_multiplayer_menu_active() {
            self.click(ClickTarget::MultiplayerMenuItem);
        }
        if !self.is_join_internet_menu_active() {
            self.click(ClickTarget::JoinInternetMenuItem);
        }

        let mut button_visible = false;
        for _ in 0..constants::CONNECT_MENU_CHECKS {
            button_visible = self.is_connect_to_ip_button_visible();
            if button_visible {
                break;
            }
            self.sleep(constants::CONNECT_MENU_CHECK_INTERVAL);
        }
        if !button_visible {
            warn!("Connect to ip button did not show up");
            return false;
        }

        self.click(ClickTarget::ConnectToIpButton);
        // Dialog needs a moment to appear
        self.sleep(constants::CONNECT_FIELD_SETTLE);

        self.tap_repeatedly(Key::Backspace, constants::CONNECT_IP_BACKSPACES);
        self.type_text(&server.ip);
        self.tap(Key::Tab);
        self.tap_repeatedly(Key::Backspace, constants::CONNECT_PORT_BACKSPACES);
        self.type_text(&server.port.to_string());
        self.sleep(constants::CONNECT_FIELD_SETTLE);

        // Password field clears itself on focus
        if let Some(password) = &server.password {
            self.tap(Key::Tab);
            self.type_text(password);
            self.sleep(constants::CONNECT_FIELD_SETTLE);
        }

        self.click(ClickTarget::ConnectToIpOkButton);

        // Joining leaves the menu; stop early on a game message
        let mut in_menu = true;
        for _ in 0..constants::CONNECT_RESULT_CHECKS {
            in_menu = self.is_in_menu();
            if !in_menu || self.is_game_message_visible() {
                break;
            }
            if self.is_disconnect_prompt_visible() {
                info!("Confirming disconnect from previous server");
                self.click(ClickTarget::DisconnectPromptYesButton);
                self.sleep(constants::DISCONNECT_PROMPT_SETTLE);
                break;
            }
            self.sleep(constants::CONNECT_RESULT_CHECK_INTERVAL);
        }

        !in_menu
    }

    /// Clicks disconnect in the open menu and waits for the main menu.
    pub fn disconnect_from_server(&mut self) -> bool {
        if self.is_disconnect_button_visible() {
            self.click(ClickTarget::DisconnectButton);
            self.reset_mouse();
        }

        let mut play_now = false;
        for _ in 0..constants::DISCONNECT_CHECKS {
            self.sleep(constants::DISCONNECT_CHECK_INTERVAL);
            play_now = self.is_play_now_button_visible();
            if play_now {
                break;
            }
        }

        self.is_in_menu() && play_now
    }

    fn console_readback(&mut self, chars: usize) -> String {
        let rect = self
            .coords
            .ocr(OcrRegion::ConsoleCommand)
            .widened(chars as i32 * constants::CONSOLE_PIXELS_PER_CHAR);
        self.ocr_region(rect, &[ImageOp::Invert])
    }

    /// Runs a console command, verifying it via OCR before committing.
    pub fn run_console_command(&mut self, command: &str) -> bool {
        self.tap(Key::Console);
        self.sleep(constants::CONSOLE_SETTLE);

        let mut cleared = false;
        for attempt in 0..constants::CONSOLE_CLEAR_ATTEMPTS {
            self.tap_repeatedly(Key::Backspace, (attempt + 1).pow(2));
            if self.console_readback(3) == constants::CONSOLE_PROMPT {
                cleared = true;
                break;
            }
        }

        let mut committed = false;
        if cleared {
            self.type_text(command);
            self.sleep(constants::CONSOLE_TYPE_SETTLE);

            let readback = self.console_readback(command.len());
            let readback = readback.trim_start_matches('>').trim();
            let score = similarity(readback, &command.to_lowercase());
            debug!("Console readback \"{}\" (similarity {:.2})", readback, score);

            if score >= constants::CONSOLE_MIN_SIMILARITY {
                self.tap(Key::Enter);
                self.sleep(constants::CONSOLE_SETTLE);
                committed = true;
            } else {
                warn!("Console command readback did not match");
            }
        } else {
            warn!("Failed to clear console input");
        }

        self.tap(Key::Console);
        self.sleep(constants::CONSOLE_SETTLE);
        committed
    }

    pub fn toggle_hud(&mut self, visible: bool) -> bool {
        self.run_console_command(&format!("renderer.drawHud {}", u8::from(visible)))
    }

    pub fn open_spawn_menu(&mut self, settle: Duration) {
        self.tap(Key::Enter);
        self.sleep(settle);
    }

    fn select_spawn_point(&mut self, offset: Point) -> bool {
        self.reset_mouse_legacy();
        self.click_legacy(offset);
        self.is_spawn_point_selected()
    }

    /// Tries the team's default spawn, then the alternates (in reverse for
    /// the right team, so both teams start from their own side).
    fn select_team_spawn_point(&mut self, points: &[Point], team: Team) -> bool {
        let Some(&primary) = points.get(team.index()) else {
            return false;
        };
        if self.select_spawn_point(primary) {
            return true;
        }

        let mut alternates: Vec<Point> = points.iter().skip(2).copied().collect();
        if team == Team::Right {
            alternates.reverse();
        }
        for point in alternates {
            debug!("Default spawn contested, trying {:?}", point);
            if self.select_spawn_point(point) {
                return true;
            }
        }
        false
    }

    fn select_random_spawn_point(&mut self) -> bool {
        let xs: Vec<i32> = (constants::RANDOM_SPAWN_X.0..constants::RANDOM_SPAWN_X.1)
            .step_by(constants::RANDOM_SPAWN_STEP)
            .collect();
        let ys: Vec<i32> = (constants::RANDOM_SPAWN_Y.0..constants::RANDOM_SPAWN_Y.1)
            .step_by(constants::RANDOM_SPAWN_STEP)
            .collect();

        for _ in 0..constants::RANDOM_SPAWN_ATTEMPTS {
            let (Some(&x), Some(&y)) = (xs.choose(&mut self.rng), ys.choose(&mut self.rng)) else {
                return false;
            };
            if self.select_spawn_point(Point::new(x, y)) {
                return true;
            }
        }
        false
    }

    /// Selects a spawn point, spawns and immediately suicides.
    pub fn spawn_suicide(&mut self, state: &SessionState, randomize: bool) -> SpawnOutcome {
        let selected = if randomize {
            self.is_spawn_point_selectable() && self.select_random_spawn_point()
        } else {
            let Some(points) = self.spawn_points(state).map(|p| p.to_vec()) else {
                return SpawnOutcome::UnsupportedCombination;
            };
            let Some(team) = state.round_team else {
                warn!("Cannot pick a spawn point without a team");
                return SpawnOutcome::Failed;
            };
            self.is_spawn_point_selectable() && self.select_team_spawn_point(&points, team)
        };

        if selected {
            self.tap(Key::Enter);
            self.sleep(constants::SPAWN_SETTLE);
            self.open_spawn_menu(constants::SPAWN_MENU_SETTLE);
            self.reset_mouse_legacy();
            self.click_legacy(self.coords.click(ClickTarget::SpawnpointDeselect));
        }

        let visible_before = self.is_suicide_button_visible();
        if visible_before {
            self.reset_mouse_legacy();
            self.click_legacy(self.coords.click(ClickTarget::SuicideButton));
            self.sleep(constants::SUICIDE_SETTLE);
        }
        let visible_after = visible_before && self.is_suicide_button_visible();

        if visible_before && !visible_after {
            SpawnOutcome::Spawned
        } else {
            SpawnOutcome::Failed
        }
    }

    /// Holds the scoreboard key and checks it toggles both ways.
    pub fn show_scoreboard(&mut self) -> bool {
        self.send("key down", |input| input.key_down(Key::Tab));
        self.sleep(constants::SCOREBOARD_SETTLE);
        let shown = self.is_scoreboard_visible();
        self.sleep(constants::SCOREBOARD_HOLD);
        self.send("key up", |input| input.key_up(Key::Tab));
        self.sleep(constants::SCOREBOARD_SETTLE);
        let hidden = !self.is_scoreboard_visible();
        shown && hidden
    }

    pub fn rotate_to_next_player(&mut self) -> bool {
        self.tap(Key::NextPlayer)
    }

    /// Toggles freecam; succeeds if the default camera view went away.
    pub fn start_spectating_via_freecam_toggle(&mut self, map: Option<&str>) -> bool {
        self.tap(Key::Space);
        self.sleep(constants::SPAWN_MENU_SETTLE);
        !self.is_default_camera_view_visible(map)
    }

    pub fn join_game(&mut self) -> bool {
        self.click(ClickTarget::JoinGameButton)
    }

    pub fn close_game_message(&mut self) -> bool {
        self.click(ClickTarget::GameMessageCloseButton)
    }

    /// Opens the map briefing tab of the round-end screen.
    pub fn open_map_briefing(&mut self) -> bool {
        let clicked = self.click(ClickTarget::MapBriefingTab);
        self.reset_mouse();
        clicked
    }
}
