//! Game message taxonomy.

/// Classified text of an in-game message overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMessage {
    ServerFull,
    Kicked,
    Banned,
    ConnectionLost,
    ModifiedContent,
    /// Join-by-ip dialog bug; only a restart clears it
    InvalidIpAddress,
    Unknown,
}

impl GameMessage {
    /// Whether the spectator was dropped from the server and should rejoin.
    pub fn drops_from_server(self) -> bool {
        matches!(
            self,
            GameMessage::ServerFull
                | GameMessage::Kicked
                | GameMessage::ConnectionLost
                | GameMessage::ModifiedContent
        )
    }

    /// Messages nothing automatic can recover from.
    pub fn halts(self) -> bool {
        matches!(self, GameMessage::Banned | GameMessage::Unknown)
    }
}

/// Classifies OCR'd (lowercase) message text by substring.
pub fn classify_game_message(text: &str) -> GameMessage {
    let text = text.to_lowercase();
    if text.contains("full") {
        GameMessage::ServerFull
    } else if text.contains("kicked") && text.contains("modified content") {
        GameMessage::ModifiedContent
    } else if text.contains("kicked") {
        GameMessage::Kicked
    } else if text.contains("banned") {
        GameMessage::Banned
    } else if (text.contains("connection") && text.contains("lost"))
        || text.contains("failed to connect")
    {
        GameMessage::ConnectionLost
    } else if text.contains("modified content") {
        GameMessage::ModifiedContent
    } else if text.contains("invalid ip address") {
        GameMessage::InvalidIpAddress
    } else {
        GameMessage::Unknown
    }
}
