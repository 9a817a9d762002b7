use serde::{Deserialize, Serialize};

/// Coarse phase of the spectator, reported to the controller on change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    Initializing,
    Launching,
    InMenu,
    Loading,
    Spawning,
    Spectating,
    BetweenRounds,
    Closing,
    Starting,
    Stopping,
    Stopped,
    Halted,
}

impl GamePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Initializing => "initializing",
            GamePhase::Launching => "launching",
            GamePhase::InMenu => "in-menu",
            GamePhase::Loading => "loading",
            GamePhase::Spawning => "spawning",
            GamePhase::Spectating => "spectating",
            GamePhase::BetweenRounds => "between-rounds",
            GamePhase::Closing => "closing",
            GamePhase::Starting => "starting",
            GamePhase::Stopping => "stopping",
            GamePhase::Stopped => "stopped",
            GamePhase::Halted => "halted",
        }
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_matches_display() {
        for phase in [GamePhase::InMenu, GamePhase::BetweenRounds, GamePhase::Halted] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase));
        }
    }
}
