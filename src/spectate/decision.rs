//! Pure decisions of the control loop, separated from their effects.
//!
//! Branches are evaluated in priority order; the first match wins because
//! several screens can be detected at once.

use crate::game::state::SessionState;

/// Visual probes read once per on-server iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseProbes {
    pub round_end_screen: bool,
    pub map_loading: bool,
    pub map_briefing: bool,
    pub default_camera_view: bool,
}

impl PhaseProbes {
    /// Any between-rounds screen is showing.
    pub fn between_rounds(&self) -> bool {
        self.round_end_screen || self.map_loading || self.map_briefing
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub limit_rtl: bool,
    pub instance_rtl: u32,
    pub max_iterations_on_player: u32,
    pub max_iterations_on_default_camera_view: u32,
}

/// Operator overrides of player rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rotation {
    pub paused: bool,
    pub forced: bool,
}

/// Escalation while the idle camera view keeps showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultCameraStep {
    /// The spectated player may just be dead or AFK
    RotatePlayer,
    /// Round end is probably in progress
    Wait,
    /// Works on servers with freecam enabled
    FreecamNudge,
    /// Give up and run a fresh spawn-suicide cycle
    Respawn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnServerAction {
    ScheduleRtlRestart,
    MapLoading { reset: bool },
    MapBriefing,
    RoundEnded,
    RoundEndScreen,
    DefaultCamera(DefaultCameraStep),
    FreecamBeforeSpawn,
    Spawn,
    EnterRound,
    WatchPlayer,
    CheckRotationPause,
    RotatePlayer,
}

pub fn default_camera_step(iterations: u32, max_iterations: u32) -> DefaultCameraStep {
    if iterations == 0 {
        DefaultCameraStep::RotatePlayer
    } else if iterations < max_iterations {
        DefaultCameraStep::Wait
    } else if iterations == max_iterations {
        DefaultCameraStep::FreecamNudge
    } else {
        DefaultCameraStep::Respawn
    }
}

pub fn decide_on_server(
    state: &SessionState,
    probes: &PhaseProbes,
    limits: &Limits,
    rotation: Rotation,
) -> OnServerAction {
    if limits.limit_rtl && probes.round_end_screen && state.round_num >= limits.instance_rtl {
        return OnServerAction::ScheduleRtlRestart;
    }
    if probes.map_loading {
        return OnServerAction::MapLoading {
            reset: state.round_entered,
        };
    }
    if probes.map_briefing {
        return OnServerAction::MapBriefing;
    }
    if probes.round_end_screen {
        return if state.round_entered {
            OnServerAction::RoundEnded
        } else {
            OnServerAction::RoundEndScreen
        };
    }
    if probes.default_camera_view && state.round_spawned && state.round_entered {
        return OnServerAction::DefaultCamera(default_camera_step(
            state.iterations_on_default_camera_view,
            limits.max_iterations_on_default_camera_view,
        ));
    }
    if !state.round_spawned {
        if probes.default_camera_view && !state.round_freecam_toggle_spawn_attempted {
            return OnServerAction::FreecamBeforeSpawn;
        }
        return OnServerAction::Spawn;
    }
    if !state.hud_hidden {
        return OnServerAction::EnterRound;
    }
    if rotation.forced {
        return OnServerAction::RotatePlayer;
    }
    if rotation.paused {
        return OnServerAction::CheckRotationPause;
    }
    if state.iterations_on_player < limits.max_iterations_on_player {
        return OnServerAction::WatchPlayer;
    }
    OnServerAction::RotatePlayer
}

/// Manual rotation only counts once the minimum time on a player is served,
/// so it cannot double-skip with an automatic rotation.
pub fn next_player_allowed(iterations_on_player: u32, min_iterations: u32, paused: bool) -> bool {
    iterations_on_player + 1 > min_iterations || paused
}

/// Whether a successful server switch should extend the instance lifetime by
/// one round, because the scheduled restart would otherwise replace the
/// fresh join right away.
pub fn rtl_extension_due(round_num: u32, limit_rtl: bool, instance_rtl: u32) -> bool {
    limit_rtl && round_num + 1 >= instance_rtl
}

pub fn stream_desired(stopped: bool, has_window: bool, halted_past_grace: bool) -> bool {
    !stopped && has_window && !halted_past_grace
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: Limits = Limits {
        limit_rtl: true,
        instance_rtl: 6,
        max_iterations_on_player: 5,
        max_iterations_on_default_camera_view: 6,
    };

    fn in_round() -> SessionState {
        let mut state = SessionState::new();
        state.round_spawned = true;
        state.round_entered = true;
        state.hud_hidden = true;
        state
    }

    fn decide(state: &SessionState, probes: PhaseProbes) -> OnServerAction {
        decide_on_server(state, &probes, &LIMITS, Rotation::default())
    }

    #[test]
    fn test_rtl_restart_on_round_end_only() {
        let mut state = in_round();
        state.round_num = 6;
        let probes = PhaseProbes {
            round_end_screen: true,
            map_loading: true,
            ..Default::default()
        };
        assert_eq!(decide(&state, probes), OnServerAction::ScheduleRtlRestart);

        let probes = PhaseProbes {
            map_loading: true,
            ..Default::default()
        };
        assert_eq!(decide(&state, probes), OnServerAction::MapLoading { reset: true });

        let unlimited = Limits {
            limit_rtl: false,
            ..LIMITS
        };
        let probes = PhaseProbes {
            round_end_screen: true,
            ..Default::default()
        };
        assert_eq!(
            decide_on_server(&state, &probes, &unlimited, Rotation::default()),
            OnServerAction::RoundEnded
        );
    }

    #[test]
    fn test_screen_priority() {
        let state = SessionState::new();
        let all = PhaseProbes {
            round_end_screen: true,
            map_loading: true,
            map_briefing: true,
            default_camera_view: true,
        };
        assert_eq!(decide(&state, all), OnServerAction::MapLoading { reset: false });

        let briefing = PhaseProbes {
            map_loading: false,
            ..all
        };
        assert_eq!(decide(&state, briefing), OnServerAction::MapBriefing);

        let round_end = PhaseProbes {
            map_briefing: false,
            ..briefing
        };
        assert_eq!(decide(&state, round_end), OnServerAction::RoundEndScreen);
    }

    #[test]
    fn test_default_camera_escalation() {
        assert_eq!(default_camera_step(0, 6), DefaultCameraStep::RotatePlayer);
        assert_eq!(default_camera_step(1, 6), DefaultCameraStep::Wait);
        assert_eq!(default_camera_step(5, 6), DefaultCameraStep::Wait);
        assert_eq!(default_camera_step(6, 6), DefaultCameraStep::FreecamNudge);
        assert_eq!(default_camera_step(7, 6), DefaultCameraStep::Respawn);

        let mut state = in_round();
        state.iterations_on_default_camera_view = 6;
        let probes = PhaseProbes {
            default_camera_view: true,
            ..Default::default()
        };
        assert_eq!(
            decide(&state, probes),
            OnServerAction::DefaultCamera(DefaultCameraStep::FreecamNudge)
        );
    }

    #[test]
    fn test_freecam_tried_once_before_spawning() {
        let mut state = SessionState::new();
        let probes = PhaseProbes {
            default_camera_view: true,
            ..Default::default()
        };
        assert_eq!(decide(&state, probes), OnServerAction::FreecamBeforeSpawn);

        state.round_freecam_toggle_spawn_attempted = true;
        assert_eq!(decide(&state, probes), OnServerAction::Spawn);
    }

    #[test]
    fn test_spawned_round_progression() {
        let mut state = SessionState::new();
        state.round_spawned = true;
        assert_eq!(decide(&state, PhaseProbes::default()), OnServerAction::EnterRound);

        state.hud_hidden = true;
        state.round_entered = true;
        assert_eq!(decide(&state, PhaseProbes::default()), OnServerAction::WatchPlayer);

        state.iterations_on_player = 5;
        assert_eq!(decide(&state, PhaseProbes::default()), OnServerAction::RotatePlayer);
    }

    #[test]
    fn test_rotation_overrides() {
        let state = in_round();
        let paused = Rotation {
            paused: true,
            forced: false,
        };
        assert_eq!(
            decide_on_server(&state, &PhaseProbes::default(), &LIMITS, paused),
            OnServerAction::CheckRotationPause
        );

        let forced = Rotation {
            paused: true,
            forced: true,
        };
        assert_eq!(
            decide_on_server(&state, &PhaseProbes::default(), &LIMITS, forced),
            OnServerAction::RotatePlayer
        );
    }

    #[test]
    fn test_next_player_floor() {
        assert!(!next_player_allowed(0, 1, false));
        assert!(next_player_allowed(1, 1, false));
        assert!(next_player_allowed(0, 1, true));
    }

    #[test]
    fn test_rtl_extension() {
        assert!(rtl_extension_due(5, true, 6));
        assert!(!rtl_extension_due(4, true, 6));
        assert!(!rtl_extension_due(5, false, 6));
    }

    #[test]
    fn test_stream_desired() {
        assert!(stream_desired(false, true, false));
        assert!(!stream_desired(true, true, false));
        assert!(!stream_desired(false, false, false));
        assert!(!stream_desired(false, true, true));
    }
}
