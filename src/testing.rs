//! Scripted collaborators for running the manager and control loop without a
//! game window. Shared state lives behind `Rc<RefCell<..>>` so tests can
//! change what the "screen" shows between steps.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeZone};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::coords::{
    Coordinates, HistRegion, OcrRegion, Rect, Resolution, SpawnTable, FULL_FRAME_SIDE_MARGIN,
    WINDOW_TITLE_BAR_HEIGHT,
};
use crate::game::constants::{self, refs};
use crate::game::manager::{Collaborators, InstanceManager, LaunchSettings};
use crate::game::phase::GamePhase;
use crate::game::state::ServerInfo;
use crate::platform::{Clock, GameHost, GameWindow, InputSynthesizer, Key, WindowRect};
use crate::remote::{Command, ControllerClient, RemoteError, StreamClient};
use crate::spectate::runner::{ControlLoop, Remotes};
use crate::vision::{Histogram, ImageOp, ReferenceHistograms, VisualClassifier};

/// Values returned in order; the last one repeats forever.
#[derive(Debug, Clone)]
struct Script<T> {
    values: VecDeque<T>,
}

impl<T: Clone> Script<T> {
    fn new(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    fn next(&mut self) -> Option<T> {
        if self.values.len() > 1 {
            self.values.pop_front()
        } else {
            self.values.front().cloned()
        }
    }
}

/// Histogram with all mass in one bin. Distinct bins are maximally distant.
pub fn marker(bin: usize) -> Histogram {
    let mut bins = vec![0.0; 256];
    bins[bin] = 1.0;
    Histogram(bins)
}

fn inactive() -> Histogram {
    marker(0)
}

const REFERENCE_KEYS: &[&str] = &[
    refs::TEAM_USMC,
    refs::TEAM_EU,
    refs::TEAM_CHINA,
    refs::TEAM_MEC,
    refs::MENU_MULTIPLAYER,
    refs::MENU_JOIN_INTERNET,
    refs::EOR_SCORE_LIST,
    refs::EOR_TOP_PLAYERS,
    refs::EOR_TOP_SCORES,
    refs::EOR_MAP_BRIEFING,
    refs::SPAWN_MENU_CLOSE,
    refs::SCOREBOARD_ICONS_LEFT,
    refs::SCOREBOARD_ICONS_RIGHT,
];

/// Maps with a default camera view reference.
pub const CAMERA_MAPS: &[&str] = &["dragon-valley", "strike-at-karkand"];

pub fn reference_entries() -> HashMap<String, Histogram> {
    let mut entries: HashMap<String, Histogram> = REFERENCE_KEYS
        .iter()
        .enumerate()
        .map(|(i, key)| (key.to_string(), marker(i + 1)))
        .collect();
    for (i, map) in CAMERA_MAPS.iter().enumerate() {
        entries.insert(refs::default_camera_view(map), marker(100 + i));
    }
    entries
}

fn region_key(region: HistRegion) -> &'static str {
    match region {
        HistRegion::MenuMultiplayer => refs::MENU_MULTIPLAYER,
        HistRegion::MenuJoinInternet => refs::MENU_JOIN_INTERNET,
        HistRegion::EorScoreList => refs::EOR_SCORE_LIST,
        HistRegion::EorTopPlayers => refs::EOR_TOP_PLAYERS,
        HistRegion::EorTopScores => refs::EOR_TOP_SCORES,
        HistRegion::EorMapBriefing => refs::EOR_MAP_BRIEFING,
        HistRegion::SpawnMenuCloseButton => refs::SPAWN_MENU_CLOSE,
        HistRegion::TeamLeft => refs::TEAM_USMC,
        HistRegion::TeamRight => refs::TEAM_CHINA,
        HistRegion::ScoreboardIconsLeft => refs::SCOREBOARD_ICONS_LEFT,
        HistRegion::ScoreboardIconsRight => refs::SCOREBOARD_ICONS_RIGHT,
    }
}

fn origin(rect: Rect) -> (i32, i32) {
    (rect.x, rect.y)
}

const FULL_FRAME_ORIGIN: (i32, i32) = (FULL_FRAME_SIDE_MARGIN, WINDOW_TITLE_BAR_HEIGHT);

/// What the fake screen shows, keyed by region origin.
pub struct VisionScript {
    coords: Coordinates,
    references: HashMap<String, Histogram>,
    ocr: HashMap<(i32, i32), Script<String>>,
    hist: HashMap<(i32, i32), Script<Histogram>>,
    ocr_reads: HashMap<(i32, i32), usize>,
}

impl VisionScript {
    fn new() -> Self {
        Self {
            coords: Coordinates::new(Resolution::Hd720),
            references: reference_entries(),
            ocr: HashMap::new(),
            hist: HashMap::new(),
            ocr_reads: HashMap::new(),
        }
    }

    pub fn set_ocr(&mut self, region: OcrRegion, texts: &[&str]) {
        let rect = self.coords.ocr(region);
        self.ocr
            .insert(origin(rect), Script::new(texts.iter().map(|t| t.to_string())));
    }

    pub fn set_active(&mut self, region: HistRegion, active: bool) {
        self.set_active_sequence(region, &[active]);
    }

    pub fn set_active_sequence(&mut self, region: HistRegion, sequence: &[bool]) {
        let rect = self.coords.hist(region);
        let active = self.references[region_key(region)].clone();
        let values: Vec<Histogram> = sequence
            .iter()
            .map(|&on| if on { active.clone() } else { inactive() })
            .collect();
        self.hist.insert(origin(rect), Script::new(values));
    }

    /// Successive full-frame captures, as marker bins.
    pub fn set_frames(&mut self, bins: &[usize]) {
        self.hist
            .insert(FULL_FRAME_ORIGIN, Script::new(bins.iter().map(|&b| marker(b))));
    }

    pub fn set_default_camera(&mut self, map: &str, visible: bool) {
        self.set_default_camera_sequence(map, &[visible]);
    }

    /// Successive full-frame captures showing the map's default camera view
    /// or a live scene.
    pub fn set_default_camera_sequence(&mut self, map: &str, sequence: &[bool]) {
        let view = self.references[&refs::default_camera_view(map)].clone();
        let frames: Vec<Histogram> = sequence
            .iter()
            .map(|&visible| if visible { view.clone() } else { marker(200) })
            .collect();
        self.hist.insert(FULL_FRAME_ORIGIN, Script::new(frames));
    }

    pub fn show_round_end_screen(&mut self) {
        for region in [
            HistRegion::EorScoreList,
            HistRegion::EorTopPlayers,
            HistRegion::EorTopScores,
            HistRegion::EorMapBriefing,
        ] {
            self.set_active(region, true);
        }
        self.set_ocr(OcrRegion::EorHeaderItems, &["score list top players top scores map briefing"]);
    }

    pub fn hide_round_end_screen(&mut self) {
        for region in [
            HistRegion::EorScoreList,
            HistRegion::EorTopPlayers,
            HistRegion::EorTopScores,
            HistRegion::EorMapBriefing,
        ] {
            self.set_active(region, false);
        }
        self.set_ocr(OcrRegion::EorHeaderItems, &[""]);
    }

    /// Spawn label reads (first must be "select") and suicide button reads.
    pub fn script_spawn(&mut self, selection: &[&str], suicide: &[&str]) {
        self.set_ocr(OcrRegion::SpawnSelectedText, selection);
        self.set_ocr(OcrRegion::SuicideButton, suicide);
    }

    pub fn show_game_message(&mut self, text: &str) {
        self.set_ocr(OcrRegion::GameMessageHeader, &["game message"]);
        self.set_ocr(OcrRegion::GameMessageText, &[text]);
    }

    pub fn hide_game_message(&mut self) {
        self.set_ocr(OcrRegion::GameMessageHeader, &[""]);
    }

    pub fn ocr_reads(&self, region: OcrRegion) -> usize {
        let rect = self.coords.ocr(region);
        self.ocr_reads.get(&origin(rect)).copied().unwrap_or(0)
    }
}

pub struct FakeClassifier {
    script: Rc<RefCell<VisionScript>>,
}

impl VisualClassifier for FakeClassifier {
    fn ocr(&mut self, _window: &GameWindow, rect: Rect, _ops: &[ImageOp]) -> Result<String> {
        let mut script = self.script.borrow_mut();
        *script.ocr_reads.entry(origin(rect)).or_default() += 1;
        Ok(script
            .ocr
            .get_mut(&origin(rect))
            .and_then(|s| s.next())
            .unwrap_or_default())
    }

    fn histogram(&mut self, _window: &GameWindow, rect: Rect) -> Result<Histogram> {
        Ok(self
            .script
            .borrow_mut()
            .hist
            .get_mut(&origin(rect))
            .and_then(|s| s.next())
            .unwrap_or_else(inactive))
    }

    fn set_debug_screenshots(&mut self, _enabled: bool) {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    KeyDown(Key),
    KeyUp(Key),
    Type(String),
    MoveTo(i32, i32),
    MoveBy(i32, i32),
    MouseDown,
    MouseUp,
}

#[derive(Debug, Default)]
pub struct InputLog {
    pub events: Vec<Event>,
}

impl InputLog {
    pub fn key_taps(&self, key: Key) -> usize {
        self.events
            .iter()
            .filter(|e| **e == Event::KeyDown(key))
            .count()
    }

    pub fn typed(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Type(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn relative_moves(&self) -> Vec<(i32, i32)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::MoveBy(dx, dy) => Some((*dx, *dy)),
                _ => None,
            })
            .collect()
    }

    /// Whether the cursor was moved to (x, y) and then clicked there.
    pub fn clicked_at(&self, x: i32, y: i32) -> bool {
        self.events.windows(2).any(|pair| {
            pair[0] == Event::MoveTo(x, y) && pair[1] == Event::MouseDown
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

pub struct FakeInput {
    log: Rc<RefCell<InputLog>>,
}

impl FakeInput {
    fn record(&mut self, event: Event) -> Result<()> {
        self.log.borrow_mut().events.push(event);
        Ok(())
    }
}

impl InputSynthesizer for FakeInput {
    fn key_down(&mut self, key: Key) -> Result<()> {
        self.record(Event::KeyDown(key))
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        self.record(Event::KeyUp(key))
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        self.record(Event::Type(text.to_string()))
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.record(Event::MoveTo(x, y))
    }

    fn move_by(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.record(Event::MoveBy(dx, dy))
    }

    fn mouse_down(&mut self) -> Result<()> {
        self.record(Event::MouseDown)
    }

    fn mouse_up(&mut self) -> Result<()> {
        self.record(Event::MouseUp)
    }
}

pub fn game_window() -> GameWindow {
    GameWindow {
        handle: 0x1234,
        title: format!("{} 4242)", constants::GAME_WINDOW_TITLE),
        class_name: constants::GAME_WINDOW_CLASS.to_string(),
        rect: WindowRect {
            left: 5,
            top: 5,
            right: 1280 + 21,
            bottom: 720 + 44,
        },
        pid: 4242,
    }
}

pub struct HostScript {
    pub window: Option<GameWindow>,
    /// Whether launching the game makes its window appear
    pub launch_creates_window: bool,
    pub responding: bool,
    pub foreground_fails: bool,
    pub command_line: Option<String>,
    pub error_windows: Vec<String>,
    pub spawned: Vec<(PathBuf, Vec<String>)>,
    pub killed: usize,
}

impl Default for HostScript {
    fn default() -> Self {
        Self {
            window: Some(game_window()),
            launch_creates_window: true,
            responding: true,
            foreground_fails: false,
            command_line: Some("BF2.exe +restart 1 +modPath mods/bf2".to_string()),
            error_windows: Vec::new(),
            spawned: Vec::new(),
            killed: 0,
        }
    }
}

pub struct FakeHost {
    script: Rc<RefCell<HostScript>>,
}

impl GameHost for FakeHost {
    fn find_window(&mut self, title: &str, _class_name: Option<&str>) -> Option<GameWindow> {
        let script = self.script.borrow();
        if title == constants::GAME_WINDOW_TITLE {
            return script.window.clone();
        }
        script.error_windows.iter().find(|t| *t == title).map(|t| GameWindow {
            title: t.clone(),
            ..game_window()
        })
    }

    fn bring_to_foreground(&mut self, _window: &GameWindow) -> Result<()> {
        if self.script.borrow().foreground_fails {
            return Err(anyhow!("Invalid window handle"));
        }
        Ok(())
    }

    fn is_responding(&mut self, _window: &GameWindow) -> bool {
        self.script.borrow().responding
    }

    fn kill(&mut self, _window: &GameWindow) -> bool {
        let mut script = self.script.borrow_mut();
        script.killed += 1;
        script.window = None;
        true
    }

    fn command_line(&mut self, _pid: u32) -> Option<String> {
        self.script.borrow().command_line.clone()
    }

    fn spawn_detached(&mut self, program: &Path, args: &[String], _cwd: &Path) -> Result<()> {
        let mut script = self.script.borrow_mut();
        script.spawned.push((program.to_path_buf(), args.to_vec()));
        if script.launch_creates_window {
            script.window = Some(game_window());
            script.responding = true;
            script.error_windows.clear();
        }
        Ok(())
    }

    fn run_with_timeout(&mut self, _program: &Path, _args: &[&str], _timeout: Duration) -> Result<()> {
        Ok(())
    }
}

/// Clock that advances only when slept on.
pub struct ManualClock {
    now: Cell<DateTime<Local>>,
    slept: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Local.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap()),
            slept: Cell::new(Duration::ZERO),
        }
    }

    pub fn slept(&self) -> Duration {
        self.slept.get()
    }

    pub fn advance(&self, duration: Duration) {
        self.now
            .set(self.now.get() + chrono::Duration::from_std(duration).unwrap());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
        self.slept.set(self.slept.get() + duration);
    }
}

#[derive(Default)]
pub struct ControllerScript {
    /// Returned by successive command polls
    pub commands: VecDeque<Vec<Command>>,
    pub join_server: Option<ServerInfo>,
    pub unreachable: bool,
    pub current_servers: Vec<ServerInfo>,
    pub phases: Vec<(GamePhase, Option<ServerInfo>)>,
}

impl ControllerScript {
    pub fn reported(&self, phase: GamePhase) -> bool {
        self.phases.iter().any(|(p, _)| *p == phase)
    }
}

pub struct FakeController {
    script: Rc<RefCell<ControllerScript>>,
}

impl FakeController {
    fn check(&self) -> Result<(), RemoteError> {
        if self.script.borrow().unreachable {
            return Err(RemoteError::Status {
                url: "http://controller".to_string(),
                status: 503,
            });
        }
        Ok(())
    }
}

impl ControllerClient for FakeController {
    fn get_commands(&mut self) -> Result<Vec<Command>, RemoteError> {
        self.check()?;
        Ok(self.script.borrow_mut().commands.pop_front().unwrap_or_default())
    }

    fn get_join_server(&mut self) -> Result<Option<ServerInfo>, RemoteError> {
        self.check()?;
        Ok(self.script.borrow().join_server.clone())
    }

    fn post_current_server(&mut self, server: &ServerInfo) -> Result<(), RemoteError> {
        self.check()?;
        self.script.borrow_mut().current_servers.push(server.clone());
        Ok(())
    }

    fn post_phase(&mut self, phase: GamePhase, server: Option<&ServerInfo>) -> Result<(), RemoteError> {
        self.check()?;
        self.script.borrow_mut().phases.push((phase, server.cloned()));
        Ok(())
    }
}

#[derive(Default)]
pub struct StreamScript {
    pub active: bool,
    pub starts: usize,
    pub stops: usize,
}

pub struct FakeStream {
    script: Rc<RefCell<StreamScript>>,
}

impl StreamClient for FakeStream {
    fn is_active(&mut self) -> Result<bool, RemoteError> {
        Ok(self.script.borrow().active)
    }

    fn start(&mut self) -> Result<(), RemoteError> {
        let mut script = self.script.borrow_mut();
        script.active = true;
        script.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RemoteError> {
        let mut script = self.script.borrow_mut();
        script.active = false;
        script.stops += 1;
        Ok(())
    }
}

/// All fakes plus their shared scripts.
pub struct TestRig {
    pub vision: Rc<RefCell<VisionScript>>,
    pub input: Rc<RefCell<InputLog>>,
    pub host: Rc<RefCell<HostScript>>,
    pub clock: Rc<ManualClock>,
    pub spawns: RefCell<SpawnTable>,
    pub controller: Rc<RefCell<ControllerScript>>,
    pub stream: Rc<RefCell<StreamScript>>,
}

impl TestRig {
    pub fn new() -> Self {
        Self {
            vision: Rc::new(RefCell::new(VisionScript::new())),
            input: Rc::new(RefCell::new(InputLog::default())),
            host: Rc::new(RefCell::new(HostScript::default())),
            clock: Rc::new(ManualClock::new()),
            spawns: RefCell::new(SpawnTable::builtin()),
            controller: Rc::new(RefCell::new(ControllerScript::default())),
            stream: Rc::new(RefCell::new(StreamScript::default())),
        }
    }

    pub fn manager(&self) -> InstanceManager {
        let clock: Rc<dyn Clock> = self.clock.clone();
        let collaborators = Collaborators {
            classifier: Box::new(FakeClassifier {
                script: self.vision.clone(),
            }),
            input: Box::new(FakeInput {
                log: self.input.clone(),
            }),
            host: Box::new(FakeHost {
                script: self.host.clone(),
            }),
            clock,
        };
        let launch = LaunchSettings {
            game_path: PathBuf::from("C:/Games/BF2"),
            player_name: "spectator".to_string(),
            player_pass: "secret".to_string(),
            conman_path: PathBuf::from("does-not-exist/bf2-conman.exe"),
        };
        InstanceManager::new(
            Resolution::Hd720,
            ReferenceHistograms::from_entries(reference_entries()),
            self.spawns.borrow().clone(),
            launch,
            collaborators,
        )
        .unwrap()
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            server_ip: "10.0.0.1".to_string(),
            ..AppConfig::default()
        }
    }

    /// Builds a loop around a fresh manager, attached to the fake window.
    pub fn control_loop(&self, config: AppConfig, with_remotes: bool) -> ControlLoop {
        let clock: Rc<dyn Clock> = self.clock.clone();
        let remotes = if with_remotes {
            Remotes {
                controller: Some(Box::new(FakeController {
                    script: self.controller.clone(),
                })),
                stream: Some(Box::new(FakeStream {
                    script: self.stream.clone(),
                })),
            }
        } else {
            Remotes::default()
        };
        let mut control = ControlLoop::new(self.manager(), config, None, remotes, clock);
        control.attach();
        control
    }
}
