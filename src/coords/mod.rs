//! Coordinate table for every clickable control and screen region.
//!
//! All values are pixel offsets relative to the game window's top-left corner,
//! scoped by the window resolution. Supporting another resolution means adding
//! another arm to each table below.

pub mod spawns;

use serde::{Deserialize, Serialize};

pub use spawns::SpawnTable;

/// Height of the window title bar, excluded from full-frame captures.
pub const WINDOW_TITLE_BAR_HEIGHT: i32 = 31;

/// Horizontal margin excluded on both sides of full-frame captures (HUD edges).
pub const FULL_FRAME_SIDE_MARGIN: i32 = 168;

/// Supported game window resolutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Resolution {
    #[serde(rename = "720p")]
    #[value(name = "720p")]
    Hd720,
    #[serde(rename = "900p")]
    #[value(name = "900p")]
    Hd900,
}

impl Resolution {
    /// Client size the game is launched with for this resolution.
    pub fn window_size(self) -> (i32, i32) {
        match self {
            Resolution::Hd720 => (1280, 720),
            Resolution::Hd900 => (1600, 900),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Hd720 => "720p",
            Resolution::Hd900 => "900p",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in window coordinates (or a relative offset for legacy mouse moves).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in window coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the same rectangle widened by `extra` pixels.
    pub fn widened(self, extra: i32) -> Self {
        Self {
            width: self.width + extra,
            ..self
        }
    }
}

/// Click targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClickTarget {
    MultiplayerMenuItem,
    JoinInternetMenuItem,
    QuitMenuItem,
    ConnectToIpButton,
    ConnectToIpOkButton,
    DisconnectPromptYesButton,
    DisconnectButton,
    GameMessageCloseButton,
    JoinGameButton,
    MapBriefingTab,
    /// Relative offset, used with legacy mouse moves after a cursor reset.
    SpawnpointDeselect,
    /// Relative offset, used with legacy mouse moves after a cursor reset.
    SuicideButton,
}

/// Regions read via OCR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OcrRegion {
    QuitMenuItem,
    GameMessageHeader,
    GameMessageText,
    ConnectToIpButton,
    DisconnectPromptHeader,
    DisconnectButton,
    PlayNowButton,
    EorHeaderItems,
    JoinGameButton,
    MapBriefingHeader,
    EorMapName,
    EorMapSize,
    EorGameMode,
    /// Base region; widened per character when reading back a command.
    ConsoleCommand,
    SpawnSelectedText,
    SuicideButton,
}

/// Regions compared via histogram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HistRegion {
    MenuMultiplayer,
    MenuJoinInternet,
    EorScoreList,
    EorTopPlayers,
    EorTopScores,
    EorMapBriefing,
    SpawnMenuCloseButton,
    TeamLeft,
    TeamRight,
    ScoreboardIconsLeft,
    ScoreboardIconsRight,
}

/// Resolution-bound view on the coordinate tables.
#[derive(Clone, Copy, Debug)]
pub struct Coordinates {
    pub resolution: Resolution,
}

impl Coordinates {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    pub fn click(&self, target: ClickTarget) -> Point {
        click_point(self.resolution, target)
    }

    pub fn ocr(&self, region: OcrRegion) -> Rect {
        ocr_rect(self.resolution, region)
    }

    pub fn hist(&self, region: HistRegion) -> Rect {
        hist_rect(self.resolution, region)
    }
}

pub fn click_point(resolution: Resolution, target: ClickTarget) -> Point {
    use ClickTarget::*;
    let (x, y) = match resolution {
        Resolution::Hd720 => match target {
            MultiplayerMenuItem => (331, 50),
            JoinInternetMenuItem => (78, 82),
            QuitMenuItem => (1182, 50),
            ConnectToIpButton => (111, 452),
            ConnectToIpOkButton => (777, 362),
            DisconnectPromptYesButton => (580, 412),
            DisconnectButton => (1210, 725),
            GameMessageCloseButton => (806, 412),
            JoinGameButton => (1210, 725),
            MapBriefingTab => (719, 92),
            SpawnpointDeselect => (250, 50),
            SuicideButton => (469, 459),
        },
        Resolution::Hd900 => match target {
            MultiplayerMenuItem => (410, 52),
            JoinInternetMenuItem => (98, 102),
            QuitMenuItem => (1468, 52),
            ConnectToIpButton => (122, 558),
            ConnectToIpOkButton => (958, 440),
            DisconnectPromptYesButton => (725, 501),
            DisconnectButton => (1468, 906),
            GameMessageCloseButton => (1002, 501),
            JoinGameButton => (1468, 906),
            MapBriefingTab => (899, 105),
            SpawnpointDeselect => (250, 50),
            SuicideButton => (497, 455),
        },
    };
    Point::new(x, y)
}

pub fn ocr_rect(resolution: Resolution, region: OcrRegion) -> Rect {
    use OcrRegion::*;
    let (x, y, w, h) = match resolution {
        Resolution::Hd720 => match region {
            QuitMenuItem => (1160, 42, 45, 20),
            GameMessageHeader => (400, 223, 130, 25),
            GameMessageText => (400, 245, 470, 18),
            ConnectToIpButton => (50, 448, 110, 18),
            DisconnectPromptHeader => (425, 280, 150, 20),
            DisconnectButton => (1133, 725, 92, 16),
            PlayNowButton => (1150, 727, 80, 16),
            EorHeaderItems => (72, 82, 740, 20),
            JoinGameButton => (1163, 725, 80, 16),
            MapBriefingHeader => (24, 112, 115, 20),
            EorMapName => (769, 114, 210, 17),
            EorMapSize => (1256, 570, 20, 17),
            EorGameMode => (1111, 570, 120, 17),
            ConsoleCommand => (6, 342, 12, 14),
            SpawnSelectedText => (1016, 678, 112, 19),
            SuicideButton => (940, 678, 75, 19),
        },
        Resolution::Hd900 => match region {
            QuitMenuItem => (1449, 47, 47, 22),
            GameMessageHeader => (500, 274, 152, 25),
            GameMessageText => (500, 300, 520, 20),
            ConnectToIpButton => (62, 551, 134, 22),
            DisconnectPromptHeader => (531, 350, 188, 24),
            DisconnectButton => (1418, 900, 108, 20),
            PlayNowButton => (1438, 902, 98, 20),
            EorHeaderItems => (88, 94, 924, 22),
            JoinGameButton => (1450, 900, 98, 18),
            MapBriefingHeader => (26, 133, 141, 22),
            EorMapName => (956, 134, 250, 21),
            EorMapSize => (1564, 706, 24, 18),
            EorGameMode => (1386, 706, 150, 18),
            ConsoleCommand => (7, 428, 14, 16),
            SpawnSelectedText => (1270, 841, 138, 20),
            SuicideButton => (1173, 841, 88, 20),
        },
    };
    Rect::new(x, y, w, h)
}

pub fn hist_rect(resolution: Resolution, region: HistRegion) -> Rect {
    use HistRegion::*;
    let (x, y, w, h) = match resolution {
        Resolution::Hd720 => match region {
            MenuMultiplayer => (305, 41, 52, 18),
            MenuJoinInternet => (30, 74, 100, 16),
            EorScoreList => (72, 82, 150, 20),
            EorTopPlayers => (257, 82, 150, 20),
            EorTopScores => (442, 82, 150, 20),
            EorMapBriefing => (627, 82, 150, 20),
            SpawnMenuCloseButton => (744, 61, 16, 16),
            TeamLeft => (68, 69, 41, 13),
            TeamRight => (209, 69, 41, 13),
            ScoreboardIconsLeft => (108, 101, 20, 300),
            ScoreboardIconsRight => (666, 101, 20, 300),
        },
        Resolution::Hd900 => match region {
            MenuMultiplayer => (381, 43, 65, 20),
            MenuJoinInternet => (37, 92, 125, 20),
            EorScoreList => (88, 94, 188, 22),
            EorTopPlayers => (320, 94, 188, 22),
            EorTopScores => (552, 94, 188, 22),
            EorMapBriefing => (784, 94, 188, 22),
            SpawnMenuCloseButton => (930, 76, 20, 20),
            TeamLeft => (81, 77, 60, 18),
            TeamRight => (257, 77, 60, 18),
            ScoreboardIconsLeft => (135, 126, 25, 375),
            ScoreboardIconsRight => (833, 126, 25, 375),
        },
    };
    Rect::new(x, y, w, h)
}
