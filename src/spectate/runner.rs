//! The control loop: one poll per `step()`, driving the game through the
//! instance manager.
//!
//! Each step runs the same priority chain: liveness, crash dialogs, remote
//! commands, stream output, restarts, game messages, server switches,
//! off-server recovery and finally on-server phase handling. A branch that
//! acts ends the step, so at most one state-changing branch runs per poll.

use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::rc::Rc;

use super::decision::{
    decide_on_server, next_player_allowed, rtl_extension_due, stream_desired, DefaultCameraStep,
    Limits, OnServerAction, PhaseProbes, Rotation,
};
use super::messages::{classify_game_message, GameMessage};
use crate::config::AppConfig;
use crate::game::constants;
use crate::game::manager::{InstanceManager, InstanceStatus, SpawnOutcome};
use crate::game::phase::GamePhase;
use crate::game::state::{ServerInfo, SessionState};
use crate::platform::Clock;
use crate::remote::{Command, CommandStore, ControllerClient, StreamClient};

/// Optional remote collaborators.
#[derive(Default)]
pub struct Remotes {
    pub controller: Option<Box<dyn ControllerClient>>,
    pub stream: Option<Box<dyn StreamClient>>,
}

/// Loop tunables derived from the configuration.
#[derive(Clone, Copy, Debug)]
pub struct LoopSettings {
    pub limits: Limits,
    pub min_iterations_on_player: u32,
    pub lockup_iterations_on_spawn_menu: u32,
    pub active_join_delay: chrono::Duration,
    pub halted_stream_grace: chrono::Duration,
}

impl LoopSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            limits: Limits {
                limit_rtl: config.limit_rtl,
                instance_rtl: config.instance_rtl,
                max_iterations_on_player: config.max_iterations_on_player,
                max_iterations_on_default_camera_view: config.max_iterations_on_default_camera_view,
            },
            min_iterations_on_player: config.min_iterations_on_player,
            lockup_iterations_on_spawn_menu: config.lockup_iterations_on_spawn_menu,
            active_join_delay: chrono::Duration::seconds(config.active_join_delay_secs as i64),
            halted_stream_grace: chrono::Duration::seconds(config.halted_stream_grace_secs as i64),
        }
    }
}

pub struct ControlLoop {
    manager: InstanceManager,
    state: SessionState,
    config: AppConfig,
    /// Where mod changes are persisted
    config_path: Option<PathBuf>,
    settings: LoopSettings,
    controller: Option<Box<dyn ControllerClient>>,
    stream: Option<Box<dyn StreamClient>>,
    clock: Rc<dyn Clock>,
    commands: CommandStore,
    stopped: bool,
    release_requested: bool,
    force_next_player: bool,
    rotation_paused_until: Option<DateTime<Local>>,
    /// Consecutive server switch attempts that failed to disconnect
    switch_failures: u32,
    last_phase: Option<GamePhase>,
}

impl ControlLoop {
    pub fn new(
        manager: InstanceManager,
        config: AppConfig,
        config_path: Option<PathBuf>,
        remotes: Remotes,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let settings = LoopSettings::from_config(&config);
        let mut state = SessionState::new();
        // Start at the cap to move away from the initial player right away
        state.iterations_on_player = settings.limits.max_iterations_on_player;

        Self {
            manager,
            state,
            config,
            config_path,
            settings,
            controller: remotes.controller,
            stream: remotes.stream,
            clock,
            commands: CommandStore::new(),
            stopped: false,
            release_requested: false,
            force_next_player: false,
            rotation_paused_until: None,
            switch_failures: 0,
            last_phase: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn release_requested(&self) -> bool {
        self.release_requested
    }

    pub fn last_phase(&self) -> Option<GamePhase> {
        self.last_phase
    }

    pub fn rotation_paused_until(&self) -> Option<DateTime<Local>> {
        self.rotation_paused_until
    }

    fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    fn target_server(&self) -> Option<ServerInfo> {
        Some(self.config.server()).filter(|server| !server.ip.is_empty())
    }

    fn max_iterations_on_player(&self) -> u32 {
        self.settings.limits.max_iterations_on_player
    }

    /// Picks up the controller's target server and any existing game window.
    pub fn attach(&mut self) {
        self.report_phase(GamePhase::Initializing, None);

        if let Some(controller) = self.controller.as_mut() {
            info!("Checking for join server on controller");
            match controller.get_join_server() {
                Ok(Some(target)) => {
                    info!("Controller has a server to join: {}", target);
                    self.config.set_server(&target);
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to get join server from controller: {}", e),
            }
        }

        let status = self.manager.find_instance(self.config.server_mod);
        if !status.window_found {
            info!("No running game instance found, starting one");
            self.state.error_restart_required = true;
        } else if !status.parameters_match {
            error!("Running game instance does not match expected resolution/mod, restarting");
            self.state.error_restart_required = true;
        } else {
            info!("Attached to running game instance");
        }
    }

    /// Runs until a halt occurs without a controller to resolve it.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.step()?;
        }
    }

    /// One iteration of the control loop.
    pub fn step(&mut self) -> Result<()> {
        if !self.check_liveness() {
            return Ok(());
        }
        self.check_error_windows();

        self.poll_commands();
        self.process_commands();
        self.update_stream();

        if self.stopped || self.state.restart_required() {
            self.restart_instance();
            return Ok(());
        }

        if self.manager.is_game_message_visible() {
            return self.handle_game_message();
        }

        self.sync_target_server();
        if self.switch_server_if_needed() {
            return Ok(());
        }

        if !self.state.spectator_on_server() {
            self.recover_off_server();
            return Ok(());
        }

        self.step_on_server();
        Ok(())
    }

    // ---- liveness ----

    /// Returns false if the rest of the iteration should be skipped.
    fn check_liveness(&mut self) -> bool {
        if self.stopped || self.state.restart_required() {
            return true;
        }

        if self.manager.window().is_none() || self.manager.bring_to_foreground().is_err() {
            warn!("Game window is gone, re-resolving");
            let status = self.manager.find_instance(self.config.server_mod);
            if self.adopt_running_mod(status) {
                return true;
            }
            if status.window_found && self.manager.bring_to_foreground().is_ok() {
                info!("Re-attached to game window");
            } else {
                error!("Game window lost, restart required");
                self.state.error_restart_required = true;
                return true;
            }
        }

        if !self.manager.is_responding() {
            // Game freezes briefly on map load and server join
            if self.state.error_unresponsive_count < constants::UNRESPONSIVE_LIMIT {
                self.state.error_unresponsive_count += 1;
                warn!(
                    "Game is not responding ({}/{}), giving it time to recover",
                    self.state.error_unresponsive_count,
                    constants::UNRESPONSIVE_LIMIT
                );
                self.clock.sleep(constants::UNRESPONSIVE_RECHECK);
                return false;
            }
            error!("Game stayed unresponsive, scheduling restart");
            self.state.error_restart_required = true;
        } else if self.state.error_unresponsive_count > 0 {
            info!("Game recovered from temporary freeze");
            self.state.reset_error_unresponsive_count();
            self.clock.sleep(constants::UNRESPONSIVE_RECOVERY_SETTLE);
        }
        true
    }

    fn check_error_windows(&mut self) {
        if self.stopped || self.state.restart_required() {
            return;
        }
        if self.manager.is_error_window_present() {
            error!("Game error window present, scheduling restart");
            self.state.error_restart_required = true;
        }
    }

    /// Persists a mod the game switched to on its own. Returns whether a
    /// switch was detected, in which case a restart is scheduled so the game
    /// runs with our launch parameters again.
    fn adopt_running_mod(&mut self, status: InstanceStatus) -> bool {
        let Some(running) = status.running_mod else {
            return false;
        };
        if !status.window_found || running == self.config.server_mod {
            return false;
        }

        warn!(
            "Game switched from mod {} to {}, updating config",
            self.config.server_mod, running
        );
        self.config.server_mod = running;
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save(path) {
                warn!("Failed to persist mod change: {}", e);
            }
        }
        self.state.error_restart_required = true;
        true
    }

    // ---- remote ----

    fn poll_commands(&mut self) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        match controller.get_commands() {
            Ok(commands) => self.commands.extend(commands),
            Err(e) => warn!("Failed to get commands from controller: {}", e),
        }
    }

    fn process_commands(&mut self) {
        for command in self.commands.drain() {
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: Command) {
        debug!("Processing command {:?}", command);
        match command {
            Command::Start => {
                if self.stopped {
                    info!("Start requested, launching game");
                    self.stopped = false;
                    self.state.error_restart_required = true;
                    self.report_phase(GamePhase::Starting, None);
                }
            }
            Command::Stop => {
                if !self.stopped {
                    info!("Stop requested, closing game");
                    self.stopped = true;
                    self.report_phase(GamePhase::Stopping, None);
                }
            }
            Command::GameRestart => {
                info!("Game restart requested");
                self.state.error_restart_required = true;
            }
            Command::RotationPause { minutes } => {
                let until = self.now() + chrono::Duration::minutes(minutes as i64);
                info!("Pausing player rotation until {}", until.format("%H:%M:%S"));
                self.rotation_paused_until = Some(until);
            }
            Command::RotationResume => {
                if self.rotation_paused_until.take().is_some() {
                    info!("Resuming player rotation");
                    self.force_next_player = true;
                }
            }
            Command::NextPlayer => {
                if next_player_allowed(
                    self.state.iterations_on_player,
                    self.settings.min_iterations_on_player,
                    self.rotation_paused_until.is_some(),
                ) {
                    info!("Switching to next player on request");
                    self.force_next_player = true;
                } else {
                    info!("Ignoring next player request, rotation is about to happen anyway");
                }
            }
            Command::Respawn => {
                info!("Respawn requested");
                self.state.round_spawned = false;
            }
            Command::Rejoin => {
                info!("Rejoin requested");
                self.state.set_spectator_on_server(false);
            }
            Command::Release => {
                info!("Release of halt requested");
                self.release_requested = true;
            }
            Command::Debug { enabled } => {
                info!("Debug mode {}", if enabled { "enabled" } else { "disabled" });
                crate::logging::set_debug(enabled);
                if enabled {
                    if let Err(e) = crate::paths::ensure_directories(true) {
                        warn!("Failed to create debug directory: {}", e);
                    }
                }
                self.manager.set_debug_screenshots(enabled);
            }
        }
    }

    fn update_stream(&mut self) {
        let halted = self
            .state
            .halted(self.settings.halted_stream_grace, self.clock.now());
        let desired = stream_desired(self.stopped, self.manager.window().is_some(), halted);
        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        match stream.is_active() {
            Ok(active) if active != desired => {
                let result = if desired {
                    info!("Starting stream");
                    stream.start()
                } else {
                    info!("Stopping stream");
                    stream.stop()
                };
                if let Err(e) = result {
                    warn!("Failed to toggle stream: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to get stream status: {}", e),
        }
    }

    /// Reports a phase change to the log and controller; repeats are dropped.
    fn report_phase(&mut self, phase: GamePhase, server: Option<ServerInfo>) {
        if self.last_phase == Some(phase) {
            return;
        }
        info!("Phase: {}", phase);
        self.last_phase = Some(phase);
        if let Some(controller) = self.controller.as_mut() {
            if let Err(e) = controller.post_phase(phase, server.as_ref()) {
                warn!("Failed to report phase to controller: {}", e);
            }
        }
    }

    fn push_current_server(&mut self) {
        let Some(server) = self.state.server().cloned() else {
            return;
        };
        if let Some(controller) = self.controller.as_mut() {
            if let Err(e) = controller.post_current_server(&server) {
                warn!("Failed to report current server to controller: {}", e);
            }
        }
    }

    // ---- restart ----

    fn restart_instance(&mut self) {
        if self.manager.window().is_some() {
            self.report_phase(GamePhase::Closing, None);

            if self.state.rtl_restart_required || self.stopped {
                info!("Quitting game instance");
                let quit = self.manager.quit_instance();
                self.state.rtl_restart_required = false;
                if !quit {
                    error!("Quitting game instance failed, killing it instead");
                    self.state.error_restart_required = true;
                }
            }
            if self.state.error_restart_required {
                info!("Killing game instance");
                let killed = self.manager.kill_instance();
                debug!("Instance killed: {}", killed);
            }
            self.manager.find_instance(self.config.server_mod);
        }

        if self.stopped {
            self.state.restart_reset();
            self.report_phase(GamePhase::Stopped, None);
            self.clock.sleep(constants::STOPPED_POLL_INTERVAL);
            return;
        }

        self.report_phase(GamePhase::Launching, None);
        let status = match self.manager.launch_instance(self.config.server_mod) {
            Ok(status) => status,
            Err(e) => {
                error!("Failed to launch game: {:#}", e);
                self.state.error_restart_required = true;
                self.clock.sleep(constants::RESTART_FAILURE_BACKOFF);
                return;
            }
        };
        // The launch may have picked up an instance the game restarted into
        // another mod; the retry then uses that mod
        self.adopt_running_mod(status);
        if !status.window_found || !status.parameters_match {
            error!("Launched game instance is not usable ({:?}), retrying", status);
            self.state.error_restart_required = true;
            self.clock.sleep(constants::RESTART_FAILURE_BACKOFF);
            return;
        }
        if let Err(e) = self.manager.bring_to_foreground() {
            error!("Game window is gone, restart required: {}", e);
            self.state.error_restart_required = true;
            return;
        }
        if !self
            .manager
            .open_menu(constants::OPEN_MENU_ATTEMPTS, constants::OPEN_MENU_INTERVAL)
        {
            error!("Failed to open menu after launch, restart required");
            self.state.error_restart_required = true;
            return;
        }

        self.state.restart_reset();
        self.state.iterations_on_player = self.max_iterations_on_player();
        self.connect_to_target();

        if self.state.spectator_on_server() {
            // Joining a server running another mod makes the game restart itself
            let status = self.manager.find_instance(self.config.server_mod);
            self.adopt_running_mod(status);
        }
    }

    /// Connects to the configured server and records the outcome.
    fn connect_to_target(&mut self) -> bool {
        let Some(target) = self.target_server() else {
            warn!("No server to join");
            self.report_phase(GamePhase::InMenu, None);
            self.clock.sleep(constants::IDLE_WITHOUT_SERVER);
            return false;
        };

        info!("Connecting to {}", target);
        let connected = self.manager.connect_to_server(&target);
        self.state.set_server(Some(target));
        self.state.set_spectator_on_server(connected);
        self.state.map_loading = connected;

        if connected {
            self.push_current_server();
            self.report_phase(GamePhase::Loading, None);
        } else {
            warn!("Failed to connect to server");
            self.report_phase(GamePhase::InMenu, None);
        }
        connected
    }

    // ---- game messages ----

    fn handle_game_message(&mut self) -> Result<()> {
        let text = self.manager.ocr_game_message();
        let message = classify_game_message(&text);
        debug!("Game message ({:?}): {}", message, text);

        if message.halts() {
            if self.release_requested || self.controller_redirects_halt() {
                info!("Halt released, rejoining");
                self.release_requested = false;
                self.state.set_halted(false, self.now());
                self.manager.close_game_message();
                self.state.set_spectator_on_server(false);
                self.report_phase(GamePhase::InMenu, None);
                return Ok(());
            }
            return self.halt(message, &text);
        }

        match message {
            GameMessage::ServerFull => {
                info!("Server is full, retrying shortly");
                self.state.set_spectator_on_server(false);
                self.manager.close_game_message();
                self.clock.sleep(constants::SERVER_FULL_BACKOFF);
            }
            GameMessage::InvalidIpAddress => {
                error!("Join by ip dialog is bugged, restart required");
                self.manager.close_game_message();
                self.state.error_restart_required = true;
            }
            _ => {
                info!("Dropped from server ({:?}), rejoining", message);
                self.state.set_spectator_on_server(false);
                self.manager.close_game_message();
            }
        }
        self.report_phase(GamePhase::InMenu, None);
        Ok(())
    }

    /// A halted spectator is also released when the controller moves it to a
    /// different server.
    fn controller_redirects_halt(&mut self) -> bool {
        if !self.state.is_halted() {
            return false;
        }
        let Some(controller) = self.controller.as_mut() else {
            return false;
        };
        match controller.get_join_server() {
            Ok(Some(target)) if self.state.server() != Some(&target) => {
                info!("Controller moved halted spectator to {}", target);
                self.config.set_server(&target);
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!("Failed to get join server from controller: {}", e);
                false
            }
        }
    }

    /// Latches the halt. Without a controller nobody can release it, so the
    /// process exits.
    fn halt(&mut self, message: GameMessage, text: &str) -> Result<()> {
        if !self.state.is_halted() {
            error!("CRITICAL: Halting on game message ({:?}): {}", message, text);
        }
        self.state.set_halted(true, self.now());

        if self.controller.is_none() {
            bail!("Halted on game message: {}", text);
        }

        let server = self.state.server().cloned();
        self.report_phase(GamePhase::Halted, server);
        self.clock.sleep(constants::HALTED_POLL_INTERVAL);
        Ok(())
    }

    // ---- server switching ----

    /// Checks the controller's target at safe points and pushes our server
    /// otherwise.
    fn sync_target_server(&mut self) {
        if self.controller.is_none() {
            return;
        }
        let checkpoint = !self.state.spectator_on_server()
            || (!self.state.map_loading
                && self.state.iterations_on_player >= self.max_iterations_on_player());
        if !checkpoint {
            return;
        }

        let current_target = self.target_server();
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        match controller.get_join_server() {
            Ok(Some(target)) if Some(&target) != current_target.as_ref() => {
                info!("Controller has a server to join: {}", target);
                self.config.set_server(&target);
            }
            Ok(_) => {
                if self.state.spectator_on_server() {
                    self.push_current_server();
                }
            }
            Err(e) => warn!("Failed to get join server from controller: {}", e),
        }
    }

    /// Disconnects if the target server changed. Returns whether it acted.
    fn switch_server_if_needed(&mut self) -> bool {
        let Some(target) = self.target_server() else {
            return false;
        };
        if !self.state.spectator_on_server()
            || self.state.map_loading
            || self.state.server() == Some(&target)
        {
            return false;
        }

        info!("Switching to {}, disconnecting from current server", target);
        // A single ESC only: spamming it during a fresh join reopens the menu
        let in_menu = self.manager.open_menu(1, constants::OPEN_MENU_INTERVAL);
        if in_menu && self.manager.disconnect_from_server() {
            self.switch_failures = 0;
            self.state.set_spectator_on_server(false);
            let limits = self.settings.limits;
            if rtl_extension_due(self.state.round_num, limits.limit_rtl, limits.instance_rtl) {
                info!("Extending instance lifetime by one round for the new server");
                self.state.decrease_round_num();
            }
            self.report_phase(GamePhase::InMenu, None);
        } else {
            self.switch_failures += 1;
            if self.switch_failures < constants::SWITCH_FAILURE_LIMIT {
                error!(
                    "Failed to disconnect from server ({}/{}), retrying",
                    self.switch_failures,
                    constants::SWITCH_FAILURE_LIMIT
                );
            } else {
                error!("Failed to disconnect from server repeatedly, restart required");
                self.switch_failures = 0;
                self.state.error_restart_required = true;
            }
        }
        true
    }

    fn recover_off_server(&mut self) {
        if self.target_server().is_none() {
            self.connect_to_target();
            return;
        }

        if !self.manager.open_menu(1, constants::OPEN_MENU_INTERVAL) {
            error!("Failed to open menu, restart required");
            self.state.error_restart_required = true;
            return;
        }
        if self.manager.is_disconnect_button_visible() {
            info!("Menu shows a stale connection, disconnecting");
            if !self.manager.disconnect_from_server() {
                error!("Failed to disconnect from server, restart required");
                self.state.error_restart_required = true;
                return;
            }
        }

        if self.connect_to_target() {
            // Rejoining is a map rotation as far as state is concerned
            self.state.map_rotation_reset();
        }
    }

    // ---- on-server phases ----

    fn rotation(&self) -> Rotation {
        Rotation {
            paused: self.rotation_paused_until.is_some(),
            forced: self.force_next_player,
        }
    }

    fn step_on_server(&mut self) {
        let map = self.state.rotation_map_name.clone();
        let probes = PhaseProbes {
            round_end_screen: self.manager.is_round_end_screen_visible(),
            map_loading: self.manager.is_map_loading(),
            map_briefing: self.manager.is_map_briefing_visible(),
            default_camera_view: self.manager.is_default_camera_view_visible(map.as_deref()),
        };
        debug!("Probes: {:?}", probes);

        // Only set here; cleared when spawning
        if probes.between_rounds() {
            self.state.map_loading = true;
        }
        if !probes.default_camera_view && self.state.iterations_on_default_camera_view > 0 {
            self.state.reset_iterations_on_default_camera_view();
        }

        let action = decide_on_server(&self.state, &probes, &self.settings.limits, self.rotation());
        debug!("Action: {:?}", action);

        match action {
            OnServerAction::ScheduleRtlRestart => {
                info!("Game instance reached its round limit, restart required");
                self.state.rtl_restart_required = true;
            }
            OnServerAction::MapLoading { reset } => {
                info!("Map is loading");
                if reset {
                    self.state.map_rotation_reset();
                    self.report_phase(GamePhase::BetweenRounds, None);
                } else {
                    self.report_phase(GamePhase::Loading, None);
                }
                self.state.iterations_on_player = self.max_iterations_on_player();
                self.clock.sleep(constants::SCREEN_WAIT);
            }
            OnServerAction::MapBriefing => {
                self.identify_map();
                self.clock.sleep(constants::SCREEN_WAIT);
            }
            OnServerAction::RoundEnded => {
                info!("Round ended");
                self.state.round_end_reset();
                self.state.iterations_on_player = self.max_iterations_on_player();
                self.rotation_paused_until = None;
                self.report_phase(GamePhase::BetweenRounds, None);
                self.clock.sleep(constants::SCREEN_WAIT);
            }
            OnServerAction::RoundEndScreen => {
                if self.manager.is_join_game_button_visible() {
                    // Same map again: the briefing is skipped, open it manually
                    info!("Round end screen without briefing, opening map briefing");
                    self.manager.open_map_briefing();
                } else {
                    self.clock.sleep(constants::SCREEN_WAIT);
                }
            }
            OnServerAction::DefaultCamera(step) => self.handle_default_camera(step, map.as_deref()),
            OnServerAction::FreecamBeforeSpawn => {
                self.state.round_freecam_toggle_spawn_attempted = true;
                info!("Default camera view visible, trying freecam toggle before spawning");
                if self.manager.start_spectating_via_freecam_toggle(map.as_deref()) {
                    info!("Freecam toggle worked, skipping spawn");
                    self.state.round_spawned = true;
                    // Freecam lands on a live player, stay on them
                    self.state.reset_iterations_on_player();
                }
            }
            OnServerAction::Spawn => self.spawn(),
            OnServerAction::EnterRound => self.enter_round(),
            OnServerAction::WatchPlayer => {
                if !self.manager.is_sufficient_action_on_screen() {
                    info!("Insufficient action on screen");
                    self.state.iterations_on_player = self.max_iterations_on_player();
                } else {
                    debug!("Staying on player");
                    self.state.iterations_on_player += 1;
                    self.clock.sleep(constants::PLAYER_WATCH_INTERVAL);
                }
            }
            OnServerAction::CheckRotationPause => {
                let expired = self
                    .rotation_paused_until
                    .is_some_and(|until| self.now() >= until);
                if expired {
                    info!("Player rotation pause expired");
                    self.rotation_paused_until = None;
                    self.rotate_player();
                } else {
                    self.clock.sleep(constants::PLAYER_WATCH_INTERVAL);
                }
            }
            OnServerAction::RotatePlayer => self.rotate_player(),
        }
    }

    fn identify_map(&mut self) {
        let name = self.manager.get_map_name();
        let size = self.manager.get_map_size();
        let mode = self.manager.get_game_mode();

        if let (Some(name), Some(size)) = (name, size) {
            let changed = self.state.rotation_map_name.as_deref() != Some(name.as_str())
                || self.state.rotation_map_size != Some(size);
            if changed {
                info!("Map: {} ({}), mode: {}", name, size, mode.as_deref().unwrap_or("unknown"));
                self.state.rotation_map_name = Some(name);
                self.state.rotation_map_size = Some(size);
                self.state.rotation_game_mode = mode;
                self.state.arm_active_join(self.now(), self.settings.active_join_delay);
            }
        } else {
            debug!("Map briefing present, map not readable yet");
        }
        self.report_phase(GamePhase::Loading, None);

        if self.state.active_join_possible(self.now()) && self.manager.is_join_game_button_visible() {
            info!("Joining game from map briefing");
            self.manager.join_game();
        }
    }

    fn handle_default_camera(&mut self, step: DefaultCameraStep, map: Option<&str>) {
        match step {
            DefaultCameraStep::RotatePlayer => {
                info!("Default camera view visible, rotating to next player");
                self.manager.rotate_to_next_player();
                self.state.reset_iterations_on_player();
            }
            DefaultCameraStep::Wait => {
                debug!("Default camera view still visible, waiting for round end");
                self.clock.sleep(constants::DEFAULT_CAMERA_WAIT);
            }
            DefaultCameraStep::FreecamNudge => {
                info!("Default camera view persists, trying freecam toggle");
                self.manager.start_spectating_via_freecam_toggle(map);
            }
            DefaultCameraStep::Respawn => {
                warn!("Default camera view persists, respawning");
                self.state.round_spawned = false;
                self.state.reset_iterations_on_default_camera_view();
                return;
            }
        }
        self.state.iterations_on_default_camera_view += 1;
    }

    fn spawn(&mut self) {
        self.report_phase(GamePhase::Spawning, None);
        self.state.map_loading = false;

        if self.state.hud_hidden {
            // Team swaps happen right at round start
            self.clock.sleep(constants::HUD_TEAM_SWAP_SETTLE);
            info!("Enabling HUD");
            if !self.manager.toggle_hud(true) {
                error!("Failed to enable HUD, restart required");
                self.state.error_restart_required = true;
                return;
            }
            self.state.hud_hidden = false;
            self.clock.sleep(constants::HUD_ENABLE_SETTLE);
        }

        if !self.manager.is_spawn_menu_visible() {
            info!("Spawn menu not visible, opening it");
            self.manager.open_spawn_menu(constants::SPAWN_MENU_OPEN_SETTLE);
            // Re-enable the HUD on the next attempt in case it did not come back
            self.state.hud_hidden = true;
            return;
        }

        self.state.iterations_on_spawn_menu += 1;
        let lockup = self.settings.lockup_iterations_on_spawn_menu;
        if lockup > 0 && self.state.iterations_on_spawn_menu % lockup == 0 {
            warn!("Spawn menu may be locked up, toggling scoreboard");
            self.manager.show_scoreboard();
        }

        let randomize = self.state.round_spawn_randomize_coordinates;
        if !randomize {
            let team = self.manager.get_player_team();
            if team.is_none() && self.manager.spawn_points(&self.state).is_some() {
                error!("Failed to determine team, retrying");
                self.clock.sleep(constants::TEAM_RETRY_INTERVAL);
                return;
            }
            if team.is_some() {
                debug!("Team: {:?}", team);
                self.state.round_team = team;
            }
        }

        match self.manager.spawn_suicide(&self.state, randomize) {
            SpawnOutcome::Spawned => {
                info!("Spawn succeeded");
                self.state.round_spawned = true;
                self.state.reset_iterations_on_spawn_menu();
                // Skip whoever the camera lands on after the suicide, even
                // while rotation is paused
                self.state.iterations_on_player = self.max_iterations_on_player();
                self.rotation_paused_until = None;
            }
            SpawnOutcome::Failed => warn!("Spawn failed, retrying"),
            SpawnOutcome::UnsupportedCombination => {
                warn!(
                    "No spawn points for {} ({:?}, {:?}), using random coordinates this round",
                    self.state.rotation_map_name.as_deref().unwrap_or("unknown map"),
                    self.state.rotation_map_size,
                    self.state.rotation_game_mode
                );
                self.state.round_spawn_randomize_coordinates = true;
            }
        }
    }

    fn enter_round(&mut self) {
        info!("Hiding HUD");
        if !self.manager.toggle_hud(false) {
            error!("Failed to hide HUD, restart required");
            self.state.error_restart_required = true;
            return;
        }
        self.state.hud_hidden = true;
        if !self.state.round_entered {
            self.state.round_entered = true;
            self.state.increase_round_num();
            debug!("Entering round #{} on this instance", self.state.round_num);
        }
        self.report_phase(GamePhase::Spectating, None);
    }

    fn rotate_player(&mut self) {
        info!("Rotating to next player");
        self.manager.rotate_to_next_player();
        self.state.reset_iterations_on_player();
        self.force_next_player = false;
    }
}
