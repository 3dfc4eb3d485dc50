use std::fmt;
use std::time::Duration;

use chrono::Utc;
use engine::graphics::Renderer2d;
use engine::scheduler::TickScheduler;
use engine::surface::SurfaceSize;
use engine::{Engine, EngineStatus, GameEvent, HudReport};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::block_stack::{self, BlockStackEngine};
use crate::grid::Direction;
use crate::high_scores::{HighScoreStore, HighScoreTable};
use crate::maze_chase::{self, MazeChaseEngine};
use crate::settings::ArcadeSettings;
use crate::sfx::SoundCue;
use crate::snake::{self, SnakeEngine};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    MazeChase,
    Snake,
    BlockStack,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::MazeChase, GameMode::Snake, GameMode::BlockStack];

    /// Stable key for persisted data.
    pub fn key(self) -> &'static str {
        match self {
            GameMode::MazeChase => "maze_chase",
            GameMode::Snake => "snake",
            GameMode::BlockStack => "block_stack",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GameMode::MazeChase => maze_chase::TITLE,
            GameMode::Snake => snake::TITLE,
            GameMode::BlockStack => block_stack::TITLE,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Everything the host can be asked to do, independent of where the request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostInput {
    Steer(Direction),
    /// Space / hard drop.
    Action,
    Tap,
    Start,
    PauseToggle,
    Restart,
    SwitchMode(GameMode),
}

/// The one engine the host currently drives.
#[derive(Debug, Clone)]
pub enum ActiveGame {
    MazeChase(MazeChaseEngine),
    Snake(SnakeEngine),
    BlockStack(BlockStackEngine),
}

impl ActiveGame {
    pub fn new(mode: GameMode, settings: &ArcadeSettings, seed: u64) -> Self {
        match mode {
            GameMode::MazeChase => {
                ActiveGame::MazeChase(MazeChaseEngine::new(settings.maze_chase, seed))
            }
            GameMode::Snake => ActiveGame::Snake(SnakeEngine::new(settings.snake, seed)),
            GameMode::BlockStack => {
                ActiveGame::BlockStack(BlockStackEngine::new(settings.block_stack, seed))
            }
        }
    }

    pub fn mode(&self) -> GameMode {
        match self {
            ActiveGame::MazeChase(_) => GameMode::MazeChase,
            ActiveGame::Snake(_) => GameMode::Snake,
            ActiveGame::BlockStack(_) => GameMode::BlockStack,
        }
    }

    pub fn engine(&self) -> &dyn Engine {
        match self {
            ActiveGame::MazeChase(g) => g,
            ActiveGame::Snake(g) => g,
            ActiveGame::BlockStack(g) => g,
        }
    }

    pub fn engine_mut(&mut self) -> &mut dyn Engine {
        match self {
            ActiveGame::MazeChase(g) => g,
            ActiveGame::Snake(g) => g,
            ActiveGame::BlockStack(g) => g,
        }
    }

    /// Arrow keys and swipes, translated per mode.
    pub fn steer(&mut self, dir: Direction) {
        match self {
            ActiveGame::MazeChase(g) => g.set_player_intent(dir),
            ActiveGame::Snake(g) => g.steer(dir),
            ActiveGame::BlockStack(g) => {
                match dir {
                    Direction::Left => g.move_piece(-1, 0),
                    Direction::Right => g.move_piece(1, 0),
                    Direction::Down => g.move_piece(0, 1),
                    Direction::Up => g.rotate_piece(),
                };
            }
        }
    }

    pub fn action(&mut self) {
        if let ActiveGame::BlockStack(g) = self {
            g.hard_drop();
        }
    }

    pub fn tap(&mut self) {
        if let ActiveGame::BlockStack(g) = self {
            g.rotate_piece();
        }
    }
}

impl Engine for ActiveGame {
    fn title(&self) -> &'static str {
        self.engine().title()
    }

    fn start(&mut self) {
        self.engine_mut().start();
    }

    fn stop(&mut self) {
        self.engine_mut().stop();
    }

    fn restart(&mut self) {
        self.engine_mut().restart();
    }

    fn pause_toggle(&mut self) {
        self.engine_mut().pause_toggle();
    }

    fn tick(&mut self) {
        self.engine_mut().tick();
    }

    fn status(&self) -> EngineStatus {
        self.engine().status()
    }

    fn tick_interval(&self) -> Duration {
        self.engine().tick_interval()
    }

    fn surface_size(&self) -> SurfaceSize {
        self.engine().surface_size()
    }

    fn render_to(&self, gfx: &mut dyn Renderer2d) {
        self.engine().render_to(gfx);
    }

    fn hud(&self) -> HudReport {
        self.engine().hud()
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        self.engine_mut().drain_events()
    }
}

/// Owns the active game, its tick task, and the per-mode best scores.
pub struct ModeHost {
    settings: ArcadeSettings,
    seed: u64,
    game: ActiveGame,
    scheduler: TickScheduler,
    scores: HighScoreTable,
    store: Option<HighScoreStore>,
    scores_dirty: bool,
    cues: Vec<SoundCue>,
}

impl ModeHost {
    /// `store` of `None` keeps best scores in memory only.
    pub fn new(settings: ArcadeSettings, seed: u64, store: Option<HighScoreStore>) -> Self {
        let settings = settings.effective();
        let scores = store.as_ref().map(HighScoreStore::load).unwrap_or_default();
        let game = ActiveGame::new(GameMode::MazeChase, &settings, seed);
        Self {
            settings,
            seed,
            game,
            scheduler: TickScheduler::new(),
            scores,
            store,
            scores_dirty: false,
            cues: Vec::new(),
        }
    }

    pub fn mode(&self) -> GameMode {
        self.game.mode()
    }

    pub fn game(&self) -> &ActiveGame {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut ActiveGame {
        &mut self.game
    }

    pub fn settings(&self) -> &ArcadeSettings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_ticking(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub fn hud(&self) -> HudReport {
        self.game.hud()
    }

    /// Stored best for the current mode, or the live score if it is already higher.
    pub fn best_score(&self) -> u32 {
        self.scores.best(self.mode()).max(self.game.hud().score)
    }

    pub fn high_scores(&self) -> &HighScoreTable {
        &self.scores
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.game.surface_size()
    }

    pub fn render(&self, gfx: &mut dyn Renderer2d) {
        self.game.render_to(gfx);
    }

    /// Cues produced since the last call.
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.cues)
    }

    pub fn handle(&mut self, input: HostInput) {
        match input {
            HostInput::Steer(dir) => {
                if self.game.status() == EngineStatus::Running {
                    self.game.steer(dir);
                }
            }
            HostInput::Action => {
                if self.game.status() == EngineStatus::Running {
                    self.game.action();
                }
            }
            HostInput::Tap => {
                if self.game.status() == EngineStatus::Running {
                    self.game.tap();
                }
            }
            HostInput::Start => self.start(),
            HostInput::PauseToggle => self.pause_toggle(),
            HostInput::Restart => self.restart(),
            HostInput::SwitchMode(mode) => self.switch_mode(mode),
        }
        self.collect_events();
    }

    pub fn start(&mut self) {
        if self.game.is_running() {
            self.offer_score();
            self.flush_scores();
        }
        self.game.start();
        self.arm();
        info!(mode = %self.mode(), "game started");
    }

    pub fn pause_toggle(&mut self) {
        if !self.game.is_running() {
            return;
        }
        self.game.pause_toggle();
        if self.game.is_paused() {
            self.scheduler.cancel();
            info!(mode = %self.mode(), "paused");
        } else {
            self.arm();
            info!(mode = %self.mode(), "resumed");
        }
    }

    /// Only honoured while a round is in progress.
    pub fn restart(&mut self) {
        if !self.game.is_running() {
            return;
        }
        self.offer_score();
        self.game.restart();
        self.arm();
        info!(mode = %self.mode(), "game restarted");
    }

    /// Stops the current game and cancels its task before the new game exists. The new game
    /// starts at once if the old one was mid-round.
    pub fn switch_mode(&mut self, mode: GameMode) {
        let was_running = self.game.is_running();
        self.scheduler.cancel();
        self.game.stop();
        self.offer_score();
        self.flush_scores();

        self.game = ActiveGame::new(mode, &self.settings, self.seed);
        info!(%mode, was_running, "switched mode");
        if was_running {
            self.start();
        }
    }

    /// Feeds wall-clock time to the scheduler and ticks the active game for every due slot.
    /// Returns how many ticks ran.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        let due = self.scheduler.advance(dt);
        let mut ran = 0;
        for _ in 0..due {
            if self.game.status() != EngineStatus::Running {
                break;
            }
            self.game.tick();
            ran += 1;
            self.collect_events();
        }
        if self.game.status() == EngineStatus::Running {
            self.scheduler.set_interval(self.game.tick_interval());
        } else {
            self.scheduler.cancel();
        }
        ran
    }

    /// Saves pending best scores. Errors are logged, never fatal.
    pub fn flush_scores(&mut self) {
        if !self.scores_dirty {
            return;
        }
        let Some(store) = self.store.as_ref() else {
            return;
        };
        match store.save(&self.scores) {
            Ok(()) => self.scores_dirty = false,
            Err(err) => warn!(path = %store.path().display(), "could not save high scores: {err}"),
        }
    }

    fn arm(&mut self) {
        if self.game.status() == EngineStatus::Running {
            self.scheduler.schedule(self.game.tick_interval());
        } else {
            self.scheduler.cancel();
        }
    }

    fn offer_score(&mut self) {
        let score = self.game.hud().score;
        if self.scores.offer(self.mode(), score, Utc::now()) {
            self.scores_dirty = true;
        }
    }

    fn collect_events(&mut self) {
        let mut terminal = false;
        for event in self.game.drain_events() {
            if matches!(event, GameEvent::GameOver { .. } | GameEvent::Won { .. }) {
                terminal = true;
            }
            if let Some(cue) = SoundCue::for_event(event) {
                self.cues.push(cue);
            }
        }
        if terminal {
            self.offer_score();
            self.flush_scores();
        }
    }
}

impl Drop for ModeHost {
    fn drop(&mut self) {
        self.offer_score();
        self.flush_scores();
    }
}
