//! Tuned thresholds, retry ceilings and settle delays.
//!
//! These are empirical values measured against the live game. Behavior
//! depends on them exactly, so change them only after revalidating.

use std::time::Duration;

pub const GAME_EXECUTABLE: &str = "BF2.exe";
pub const GAME_WINDOW_TITLE: &str = "BF2 (v1.5.3153-802.0, pid:";
pub const GAME_WINDOW_CLASS: &str = "BF2";
/// Titles of native crash/assert dialogs.
pub const ERROR_WINDOW_TITLES: &[&str] = &["BF2 Error", "Microsoft Visual C++ Runtime Library"];

pub const CONMAN_ARGS: &[&str] = &[
    "--no-gui",
    "--purge-server-history",
    "--purge-old-demo-bookmarks",
    "--purge-shader-cache",
    "--purge-logo-cache",
];
pub const CONMAN_TIMEOUT: Duration = Duration::from_secs(1);

pub const LAUNCH_WINDOW_CHECKS: u32 = 5;
pub const LAUNCH_WINDOW_CHECK_INTERVAL: Duration = Duration::from_secs(4);
pub const LAUNCH_LOGIN_SETTLE: Duration = Duration::from_secs(6);
pub const KILL_SETTLE: Duration = Duration::from_secs(3);

/// Generic histogram match threshold (Bhattacharyya distance).
pub const HISTCMP_MAX_DELTA: f64 = 0.2;
/// Tighter threshold for the default camera view, where false positives
/// trigger round-restart handling.
pub const DEFAULT_CAMERA_MAX_DELTA: f64 = 0.1;

pub const AFK_SCREENSHOT_COUNT: usize = 3;
pub const AFK_SCREENSHOT_INTERVAL: Duration = Duration::from_millis(550);
pub const AFK_MIN_DELTA: f64 = 0.022;

pub const KEY_TAP_HOLD: Duration = Duration::from_millis(80);
pub const BACKSPACE_INTERVAL: Duration = Duration::from_millis(50);
pub const LEGACY_MOVE_SETTLE: Duration = Duration::from_millis(80);
pub const LEGACY_RESET_SETTLE: Duration = Duration::from_millis(500);
pub const LEGACY_RESET_OFFSET: i32 = -10000;
pub const CLICK_SETTLE: Duration = Duration::from_millis(200);

pub const OPEN_MENU_ATTEMPTS: u32 = 5;
pub const OPEN_MENU_INTERVAL: Duration = Duration::from_secs(1);
pub const QUIT_SETTLE: Duration = Duration::from_secs(2);

pub const CONNECT_MENU_CHECKS: u32 = 10;
pub const CONNECT_MENU_CHECK_INTERVAL: Duration = Duration::from_secs(1);
pub const CONNECT_IP_BACKSPACES: u32 = 20;
pub const CONNECT_PORT_BACKSPACES: u32 = 10;
pub const CONNECT_FIELD_SETTLE: Duration = Duration::from_millis(300);
pub const CONNECT_RESULT_CHECKS: u32 = 16;
pub const CONNECT_RESULT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
pub const DISCONNECT_PROMPT_SETTLE: Duration = Duration::from_millis(500);

pub const DISCONNECT_CHECKS: u32 = 5;
pub const DISCONNECT_CHECK_INTERVAL: Duration = Duration::from_millis(300);

pub const CONSOLE_CLEAR_ATTEMPTS: u32 = 5;
pub const CONSOLE_PROMPT: &str = ">";
pub const CONSOLE_PIXELS_PER_CHAR: i32 = 6;
pub const CONSOLE_TYPE_SETTLE: Duration = Duration::from_millis(300);
pub const CONSOLE_SETTLE: Duration = Duration::from_millis(100);
/// Minimum normalized similarity between a typed and read-back command.
pub const CONSOLE_MIN_SIMILARITY: f64 = 0.8;

pub const SPAWN_MENU_SETTLE: Duration = Duration::from_millis(300);
pub const SPAWN_SETTLE: Duration = Duration::from_secs(1);
pub const SUICIDE_SETTLE: Duration = Duration::from_millis(500);
pub const RANDOM_SPAWN_ATTEMPTS: u32 = 5;
pub const RANDOM_SPAWN_X: (i32, i32) = (260, 613);
pub const RANDOM_SPAWN_Y: (i32, i32) = (50, 403);
pub const RANDOM_SPAWN_STEP: usize = 22;
/// Spawn coordinates are only valid for this game mode.
pub const SPAWN_GAME_MODE: &str = "conquest";

pub const SCOREBOARD_SETTLE: Duration = Duration::from_millis(250);
pub const SCOREBOARD_HOLD: Duration = Duration::from_millis(500);

/// Reference histogram keys.
pub mod refs {
    pub const TEAM_USMC: &str = "teams/usmc/active";
    pub const TEAM_EU: &str = "teams/eu/active";
    pub const TEAM_CHINA: &str = "teams/china/active";
    pub const TEAM_MEC: &str = "teams/mec/active";
    pub const MENU_MULTIPLAYER: &str = "menu/multiplayer/active";
    pub const MENU_JOIN_INTERNET: &str = "menu/join-internet/active";
    pub const EOR_SCORE_LIST: &str = "eor/score-list/active";
    pub const EOR_TOP_PLAYERS: &str = "eor/top-players/active";
    pub const EOR_TOP_SCORES: &str = "eor/top-scores/active";
    pub const EOR_MAP_BRIEFING: &str = "eor/map-briefing/active";
    pub const SPAWN_MENU_CLOSE: &str = "spawn-menu/close-button";
    pub const SCOREBOARD_ICONS_LEFT: &str = "scoreboard/icons-left";
    pub const SCOREBOARD_ICONS_RIGHT: &str = "scoreboard/icons-right";

    /// Default camera view of a specific map.
    pub fn default_camera_view(map: &str) -> String {
        format!("default-camera-view/{}", map)
    }
}

/// Labels of the round-end screen tabs.
pub const EOR_HEADER_LABELS: &[&str] = &["score list", "top players", "top scores", "map briefing"];

/// Consecutive unresponsive polls tolerated before a restart.
pub const UNRESPONSIVE_LIMIT: u32 = 3;
pub const UNRESPONSIVE_RECHECK: Duration = Duration::from_secs(2);
pub const UNRESPONSIVE_RECOVERY_SETTLE: Duration = Duration::from_secs(1);

/// Consecutive failed disconnects for a server switch before a restart.
pub const SWITCH_FAILURE_LIMIT: u32 = 3;

pub const SERVER_FULL_BACKOFF: Duration = Duration::from_secs(20);
pub const HALTED_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const STOPPED_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const RESTART_FAILURE_BACKOFF: Duration = Duration::from_secs(10);
pub const IDLE_WITHOUT_SERVER: Duration = Duration::from_secs(10);

/// Wait while the round-end screen, loading screen or briefing is shown.
pub const SCREEN_WAIT: Duration = Duration::from_secs(3);
pub const HUD_TEAM_SWAP_SETTLE: Duration = Duration::from_secs(3);
pub const HUD_ENABLE_SETTLE: Duration = Duration::from_secs(1);
pub const SPAWN_MENU_OPEN_SETTLE: Duration = Duration::from_millis(1500);
pub const TEAM_RETRY_INTERVAL: Duration = Duration::from_secs(2);
pub const PLAYER_WATCH_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_CAMERA_WAIT: Duration = Duration::from_secs(2);

pub const ROTATION_PAUSE_DEFAULT_MINUTES: u32 = 5;
