//! Session state of one running game instance.
//!
//! Owned by the control loop. Fields are only ever cleared through one of the
//! named reset paths below, never as a side effect of an unrelated update.

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

/// Address of a game server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub ip: String,
    pub port: u16,
    pub password: Option<String>,
}

impl std::fmt::Display for ServerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Side of the scoreboard the spectator was assigned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Team {
    /// USMC / EU
    Left,
    /// MEC / China
    Right,
}

impl Team {
    pub fn index(self) -> usize {
        match self {
            Team::Left => 0,
            Team::Right => 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    spectator_on_server: bool,
    server: Option<ServerInfo>,
    /// Set while a map load, briefing or round-end screen is up
    pub map_loading: bool,
    pub hud_hidden: bool,

    /// Rounds entered on this game instance
    pub round_num: u32,
    pub error_unresponsive_count: u32,
    pub iterations_on_player: u32,
    pub iterations_on_default_camera_view: u32,
    pub iterations_on_spawn_menu: u32,

    pub rotation_map_name: Option<String>,
    pub rotation_map_size: Option<u32>,
    pub rotation_game_mode: Option<String>,
    pub round_team: Option<Team>,
    pub round_spawned: bool,
    /// Set once HUD is hidden after spawning; the spectator is inside a live round
    pub round_entered: bool,
    pub round_spawn_randomize_coordinates: bool,
    pub round_freecam_toggle_spawn_attempted: bool,

    pub rtl_restart_required: bool,
    pub error_restart_required: bool,

    halted_since: Option<DateTime<Local>>,
    active_join_possible_after: Option<DateTime<Local>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spectator_on_server(&self) -> bool {
        self.spectator_on_server
    }

    /// Marks the spectator as on/off server. Never true without a server.
    pub fn set_spectator_on_server(&mut self, on_server: bool) {
        self.spectator_on_server = on_server && self.server.is_some();
    }

    pub fn server(&self) -> Option<&ServerInfo> {
        self.server.as_ref()
    }

    pub fn set_server(&mut self, server: Option<ServerInfo>) {
        if server.is_none() {
            self.spectator_on_server = false;
        }
        self.server = server;
    }

    pub fn restart_required(&self) -> bool {
        self.rtl_restart_required || self.error_restart_required
    }

    pub fn increase_round_num(&mut self) {
        self.round_num += 1;
    }

    /// Gives the instance one more round before its scheduled restart.
    pub fn decrease_round_num(&mut self) {
        self.round_num = self.round_num.saturating_sub(1);
    }

    /// Latches the halt timestamp. Setting an already halted session keeps the
    /// original timestamp; only `false` clears it.
    pub fn set_halted(&mut self, halted: bool, now: DateTime<Local>) {
        if !halted {
            self.halted_since = None;
        } else if self.halted_since.is_none() {
            self.halted_since = Some(now);
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted_since.is_some()
    }

    pub fn halted_since(&self) -> Option<DateTime<Local>> {
        self.halted_since
    }

    /// Whether the session has been halted for at least `grace`.
    pub fn halted(&self, grace: Duration, now: DateTime<Local>) -> bool {
        self.halted_since.is_some_and(|since| now >= since + grace)
    }

    pub fn arm_active_join(&mut self, now: DateTime<Local>, delay: Duration) {
        self.active_join_possible_after = Some(now + delay);
    }

    pub fn active_join_armed(&self) -> bool {
        self.active_join_possible_after.is_some()
    }

    pub fn active_join_possible(&self, now: DateTime<Local>) -> bool {
        self.active_join_possible_after.is_some_and(|after| now >= after)
    }

    /// Map and player-count size are both known.
    pub fn map_identified(&self) -> bool {
        self.rotation_map_name.is_some() && self.rotation_map_size.is_some()
    }

    /// The map changed under the spectator: forget the map and everything
    /// about the current round.
    pub fn map_rotation_reset(&mut self) {
        self.rotation_map_name = None;
        self.rotation_map_size = None;
        self.rotation_game_mode = None;
        self.active_join_possible_after = None;
        self.clear_round();
    }

    /// A round concluded: forget team and spawn state, keep map identity.
    /// The next briefing re-arms the active-join timer.
    pub fn round_end_reset(&mut self) {
        self.active_join_possible_after = None;
        self.clear_round();
    }

    /// A fresh game instance is up. Clears everything but the server identity.
    pub fn restart_reset(&mut self) {
        self.halted_since = None;
        self.spectator_on_server = false;
        self.map_loading = false;
        self.hud_hidden = false;
        self.round_num = 0;
        self.error_unresponsive_count = 0;
        self.iterations_on_player = 0;
        self.rtl_restart_required = false;
        self.error_restart_required = false;
        self.map_rotation_reset();
    }

    pub fn reset_error_unresponsive_count(&mut self) {
        self.error_unresponsive_count = 0;
    }

    pub fn reset_iterations_on_player(&mut self) {
        self.iterations_on_player = 0;
    }

    pub fn reset_iterations_on_default_camera_view(&mut self) {
        self.iterations_on_default_camera_view = 0;
    }

    pub fn reset_iterations_on_spawn_menu(&mut self) {
        self.iterations_on_spawn_menu = 0;
    }

    fn clear_round(&mut self) {
        self.round_team = None;
        self.round_spawned = false;
        self.round_entered = false;
        self.round_spawn_randomize_coordinates = false;
        self.round_freecam_toggle_spawn_attempted = false;
        self.iterations_on_default_camera_view = 0;
        self.iterations_on_spawn_menu = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Local> {
        Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn server() -> ServerInfo {
        ServerInfo {
            ip: "1.2.3.4".to_string(),
            port: 16567,
            password: None,
        }
    }

    /// A state with every field set to a non-default value.
    fn populated() -> SessionState {
        let mut state = SessionState::new();
        state.set_server(Some(server()));
        state.set_spectator_on_server(true);
        state.map_loading = true;
        state.hud_hidden = true;
        state.round_num = 3;
        state.error_unresponsive_count = 2;
        state.iterations_on_player = 4;
        state.iterations_on_default_camera_view = 5;
        state.iterations_on_spawn_menu = 6;
        state.rotation_map_name = Some("dragon-valley".to_string());
        state.rotation_map_size = Some(64);
        state.rotation_game_mode = Some("conquest".to_string());
        state.round_team = Some(Team::Right);
        state.round_spawned = true;
        state.round_entered = true;
        state.round_spawn_randomize_coordinates = true;
        state.round_freecam_toggle_spawn_attempted = true;
        state.rtl_restart_required = true;
        state.error_restart_required = true;
        state.set_halted(true, at(0));
        state.arm_active_join(at(0), Duration::seconds(30));
        state
    }

    fn assert_round_cleared(state: &SessionState) {
        assert_eq!(state.round_team, None);
        assert!(!state.round_spawned);
        assert!(!state.round_entered);
        assert!(!state.round_spawn_randomize_coordinates);
        assert!(!state.round_freecam_toggle_spawn_attempted);
        assert_eq!(state.iterations_on_default_camera_view, 0);
        assert_eq!(state.iterations_on_spawn_menu, 0);
    }

    #[test]
    fn test_round_end_reset_only_clears_round_fields() {
        let before = populated();
        let mut state = before.clone();
        state.round_end_reset();

        assert_round_cleared(&state);
        // Everything else is untouched
        let mut expected = state.clone();
        expected.round_team = before.round_team;
        expected.round_spawned = before.round_spawned;
        expected.round_entered = before.round_entered;
        expected.round_spawn_randomize_coordinates = before.round_spawn_randomize_coordinates;
        expected.round_freecam_toggle_spawn_attempted =
            before.round_freecam_toggle_spawn_attempted;
        expected.iterations_on_default_camera_view = before.iterations_on_default_camera_view;
        expected.iterations_on_spawn_menu = before.iterations_on_spawn_menu;
        expected.active_join_possible_after = before.active_join_possible_after;
        assert_eq!(expected, before);
        assert!(!state.active_join_armed());
    }

    #[test]
    fn test_map_rotation_reset_clears_map_and_round() {
        let before = populated();
        let mut state = before.clone();
        state.map_rotation_reset();

        assert_round_cleared(&state);
        assert_eq!(state.rotation_map_name, None);
        assert_eq!(state.rotation_map_size, None);
        assert_eq!(state.rotation_game_mode, None);
        assert!(!state.active_join_armed());

        assert!(state.spectator_on_server());
        assert!(state.map_loading);
        assert!(state.hud_hidden);
        assert_eq!(state.round_num, before.round_num);
        assert_eq!(state.error_unresponsive_count, before.error_unresponsive_count);
        assert_eq!(state.iterations_on_player, before.iterations_on_player);
        assert!(state.rtl_restart_required);
        assert!(state.error_restart_required);
        assert_eq!(state.halted_since(), before.halted_since());
    }

    #[test]
    fn test_restart_reset_keeps_only_identity() {
        let before = populated();
        let mut state = before.clone();
        state.restart_reset();

        let mut expected = SessionState::new();
        expected.set_server(Some(server()));
        assert_eq!(state, expected);
        assert!(!state.is_halted());
    }

    #[test]
    fn test_individual_counter_resets() {
        let before = populated();

        let mut state = before.clone();
        state.reset_error_unresponsive_count();
        assert_eq!(
            state,
            SessionState {
                error_unresponsive_count: 0,
                ..before.clone()
            }
        );

        let mut state = before.clone();
        state.reset_iterations_on_player();
        assert_eq!(
            state,
            SessionState {
                iterations_on_player: 0,
                ..before.clone()
            }
        );

        let mut state = before.clone();
        state.reset_iterations_on_default_camera_view();
        assert_eq!(
            state,
            SessionState {
                iterations_on_default_camera_view: 0,
                ..before.clone()
            }
        );

        let mut state = before.clone();
        state.reset_iterations_on_spawn_menu();
        assert_eq!(
            state,
            SessionState {
                iterations_on_spawn_menu: 0,
                ..before
            }
        );
    }

    #[test]
    fn test_halt_latch_keeps_first_timestamp() {
        let mut state = SessionState::new();
        state.set_halted(true, at(0));
        let first = state.halted_since();
        state.set_halted(true, at(60));
        assert_eq!(state.halted_since(), first);

        state.set_halted(false, at(90));
        assert!(!state.is_halted());
        state.set_halted(true, at(120));
        assert_eq!(state.halted_since(), Some(at(120)));
    }

    #[test]
    fn test_halted_grace_period() {
        let mut state = SessionState::new();
        assert!(!state.halted(Duration::seconds(180), at(0)));

        state.set_halted(true, at(0));
        assert!(!state.halted(Duration::seconds(180), at(179)));
        assert!(state.halted(Duration::seconds(180), at(180)));
        assert!(state.halted(Duration::seconds(180), at(500)));
    }

    #[test]
    fn test_spectator_on_server_requires_server() {
        let mut state = SessionState::new();
        state.set_spectator_on_server(true);
        assert!(!state.spectator_on_server());

        state.set_server(Some(server()));
        state.set_spectator_on_server(true);
        assert!(state.spectator_on_server());

        state.set_server(None);
        assert!(!state.spectator_on_server());
    }

    #[test]
    fn test_round_num_never_negative() {
        let mut state = SessionState::new();
        state.decrease_round_num();
        assert_eq!(state.round_num, 0);
        state.increase_round_num();
        state.increase_round_num();
        state.decrease_round_num();
        assert_eq!(state.round_num, 1);
    }

    #[test]
    fn test_active_join_timer() {
        let mut state = SessionState::new();
        assert!(!state.active_join_possible(at(0)));
        state.arm_active_join(at(0), Duration::seconds(30));
        assert!(state.active_join_armed());
        assert!(!state.active_join_possible(at(29)));
        assert!(state.active_join_possible(at(30)));
    }
}
