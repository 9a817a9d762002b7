//! Operator commands received from the remote controller.
//!
//! The controller returns a flat JSON object of command name to value. Most
//! commands are plain flags (`true` = requested); some carry a payload. Each
//! command is consumed exactly once.

use log::warn;
use serde_json::Value;
use std::collections::HashMap;

use crate::game::constants::ROTATION_PAUSE_DEFAULT_MINUTES;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    GameRestart,
    RotationPause { minutes: u32 },
    RotationResume,
    NextPlayer,
    Respawn,
    Rejoin,
    Release,
    Debug { enabled: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    Start,
    Stop,
    GameRestart,
    RotationPause,
    RotationResume,
    NextPlayer,
    Respawn,
    Rejoin,
    Release,
    Debug,
}

impl CommandKind {
    /// Processing order within one poll.
    pub const ALL: [CommandKind; 10] = [
        CommandKind::Start,
        CommandKind::Stop,
        CommandKind::GameRestart,
        CommandKind::RotationPause,
        CommandKind::RotationResume,
        CommandKind::NextPlayer,
        CommandKind::Respawn,
        CommandKind::Rejoin,
        CommandKind::Release,
        CommandKind::Debug,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Start => "start",
            CommandKind::Stop => "stop",
            CommandKind::GameRestart => "game_restart",
            CommandKind::RotationPause => "rotation_pause",
            CommandKind::RotationResume => "rotation_resume",
            CommandKind::NextPlayer => "next_player",
            CommandKind::Respawn => "respawn",
            CommandKind::Rejoin => "rejoin",
            CommandKind::Release => "release",
            CommandKind::Debug => "debug",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Start => CommandKind::Start,
            Command::Stop => CommandKind::Stop,
            Command::GameRestart => CommandKind::GameRestart,
            Command::RotationPause { .. } => CommandKind::RotationPause,
            Command::RotationResume => CommandKind::RotationResume,
            Command::NextPlayer => CommandKind::NextPlayer,
            Command::Respawn => CommandKind::Respawn,
            Command::Rejoin => CommandKind::Rejoin,
            Command::Release => CommandKind::Release,
            Command::Debug { .. } => CommandKind::Debug,
        }
    }

    /// Builds a command from one entry of the controller's command object.
    /// Returns `None` for unset flags, unknown names and malformed payloads.
    pub fn from_entry(name: &str, value: &Value) -> Option<Self> {
        let Some(kind) = CommandKind::from_name(name) else {
            warn!("Ignoring unknown command: {}", name);
            return None;
        };

        match kind {
            CommandKind::Debug => value.as_bool().map(|enabled| Command::Debug { enabled }),
            CommandKind::RotationPause => match value {
                Value::Bool(true) => Some(Command::RotationPause {
                    minutes: ROTATION_PAUSE_DEFAULT_MINUTES,
                }),
                Value::Number(n) => n
                    .as_u64()
                    .map(|minutes| Command::RotationPause { minutes: minutes as u32 }),
                Value::Object(map) => Some(Command::RotationPause {
                    minutes: map
                        .get("minutes")
                        .and_then(Value::as_u64)
                        .map_or(ROTATION_PAUSE_DEFAULT_MINUTES, |m| m as u32),
                }),
                _ => None,
            },
            _ if value.as_bool() != Some(true) => None,
            CommandKind::Start => Some(Command::Start),
            CommandKind::Stop => Some(Command::Stop),
            CommandKind::GameRestart => Some(Command::GameRestart),
            CommandKind::RotationResume => Some(Command::RotationResume),
            CommandKind::NextPlayer => Some(Command::NextPlayer),
            CommandKind::Respawn => Some(Command::Respawn),
            CommandKind::Rejoin => Some(Command::Rejoin),
            CommandKind::Release => Some(Command::Release),
        }
    }
}

/// Parses the controller's command object. Anything but an object yields no
/// commands.
pub fn parse_commands(body: &Value) -> Vec<Command> {
    let Some(entries) = body.as_object() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|(name, value)| Command::from_entry(name, value))
        .collect()
}

/// Pending commands, at most one per kind. Taking a command removes it.
#[derive(Debug, Default)]
pub struct CommandStore {
    pending: HashMap<CommandKind, Command>,
}

impl CommandStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds commands, replacing any pending command of the same kind.
    pub fn extend(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.pending.insert(command.kind(), command);
        }
    }

    pub fn take(&mut self, kind: CommandKind) -> Option<Command> {
        self.pending.remove(&kind)
    }

    /// Removes and returns all pending commands in processing order.
    pub fn drain(&mut self) -> Vec<Command> {
        CommandKind::ALL
            .into_iter()
            .filter_map(|kind| self.take(kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_flags() {
        let commands = parse_commands(&json!({
            "next_player": true,
            "respawn": false,
            "stop": true,
        }));
        assert_eq!(commands.len(), 2);
        assert!(commands.contains(&Command::NextPlayer));
        assert!(commands.contains(&Command::Stop));
    }

    #[test]
    fn test_parse_payloads() {
        assert_eq!(
            Command::from_entry("rotation_pause", &json!(true)),
            Some(Command::RotationPause { minutes: 5 })
        );
        assert_eq!(
            Command::from_entry("rotation_pause", &json!({ "minutes": 12 })),
            Some(Command::RotationPause { minutes: 12 })
        );
        assert_eq!(
            Command::from_entry("rotation_pause", &json!(3)),
            Some(Command::RotationPause { minutes: 3 })
        );
        assert_eq!(Command::from_entry("rotation_pause", &json!(false)), None);
        assert_eq!(
            Command::from_entry("debug", &json!(false)),
            Some(Command::Debug { enabled: false })
        );
    }

    #[test]
    fn test_parse_ignores_unknown_and_non_objects() {
        assert_eq!(Command::from_entry("self_destruct", &json!(true)), None);
        assert!(parse_commands(&json!([1, 2])).is_empty());
        assert!(parse_commands(&Value::Null).is_empty());
    }

    #[test]
    fn test_store_consumes_once() {
        let mut store = CommandStore::new();
        store.extend([Command::Respawn, Command::Respawn, Command::Start]);

        assert_eq!(store.take(CommandKind::Respawn), Some(Command::Respawn));
        assert_eq!(store.take(CommandKind::Respawn), None);
        assert_eq!(store.drain(), vec![Command::Start]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_drain_uses_processing_order() {
        let mut store = CommandStore::new();
        store.extend([Command::Release, Command::NextPlayer, Command::Start]);
        assert_eq!(
            store.drain(),
            vec![Command::Start, Command::NextPlayer, Command::Release]
        );
    }
}
