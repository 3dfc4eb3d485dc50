pub mod app;
pub mod fingerprint;
pub mod graphics;
pub mod scheduler;
pub mod surface;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::graphics::{CpuRenderer, Renderer2d};
use crate::scheduler::TickScheduler;
use crate::surface::{RgbaBufferSurface, Surface, SurfaceSize};

/// Where an engine is in its round lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    /// Constructed or stopped; ticks are ignored until `start`.
    Idle,
    Running,
    Paused,
    /// Terminal until an explicit restart.
    GameOver,
    /// Terminal until an explicit restart.
    Won,
}

impl EngineStatus {
    /// True while a round is in progress, paused or not.
    pub fn is_running(self) -> bool {
        matches!(self, EngineStatus::Running | EngineStatus::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EngineStatus::GameOver | EngineStatus::Won)
    }

    pub fn banner(self) -> Option<&'static str> {
        match self {
            EngineStatus::Idle | EngineStatus::Running => None,
            EngineStatus::Paused => Some("PAUSED"),
            EngineStatus::GameOver => Some("GAME OVER"),
            EngineStatus::Won => Some("YOU WIN!"),
        }
    }
}

/// Values the host displays next to the canvas. Engines compute, hosts show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudReport {
    pub title: String,
    pub status: EngineStatus,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lives: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<u32>,
}

impl HudReport {
    pub fn new(title: impl Into<String>, status: EngineStatus, score: u32) -> Self {
        Self {
            title: title.into(),
            status,
            score,
            lives: None,
            level: None,
            lines: None,
        }
    }

    pub fn banner(&self) -> Option<&'static str> {
        self.status.banner()
    }
}

/// Things that happened during a tick (or an input handler) that the host may react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    PelletEaten,
    PowerPelletEaten,
    PursuerEaten,
    LifeLost { lives_left: u32 },
    FoodEaten,
    LinesCleared { lines: u32 },
    LevelUp { level: u32 },
    GameOver { score: u32 },
    Won { score: u32 },
}

/// The lifecycle contract every game engine implements.
///
/// A host drives exactly one engine at a time through this trait: it schedules `tick` at
/// `tick_interval`, renders after each tick, and relays start/stop/pause/restart requests.
/// Game-specific commands (steering, rotation, drops) live on the concrete engine types.
pub trait Engine {
    fn title(&self) -> &'static str;

    fn start(&mut self);
    fn stop(&mut self);

    fn restart(&mut self) {
        self.start();
    }

    /// Flips between running and paused. Ignored unless a round is in progress.
    fn pause_toggle(&mut self);

    /// Advances the simulation by one discrete step. A no-op unless running.
    fn tick(&mut self);

    fn status(&self) -> EngineStatus;

    fn is_running(&self) -> bool {
        self.status().is_running()
    }

    fn is_paused(&self) -> bool {
        self.status() == EngineStatus::Paused
    }

    /// Interval between ticks right now. May change as the round progresses.
    fn tick_interval(&self) -> Duration;

    /// Pixel size of the surface this engine renders into.
    fn surface_size(&self) -> SurfaceSize;

    fn render_to(&self, gfx: &mut dyn Renderer2d);

    fn hud(&self) -> HudReport;

    /// Takes the events queued since the last drain.
    fn drain_events(&mut self) -> Vec<GameEvent>;
}

/// Drives a single engine off-screen: ticks on a scheduler and renders into an RGBA buffer
/// after every tick.
#[derive(Debug)]
pub struct HeadlessRunner<E: Engine> {
    engine: E,
    scheduler: TickScheduler,
    surface: RgbaBufferSurface,
    ticks: usize,
}

impl<E: Engine> HeadlessRunner<E> {
    pub fn new(engine: E) -> Self {
        let surface = RgbaBufferSurface::new(engine.surface_size());
        let mut runner = Self {
            engine,
            scheduler: TickScheduler::new(),
            surface,
            ticks: 0,
        };
        runner.render();
        runner
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn frame(&self) -> &[u8] {
        self.surface.frame()
    }

    pub fn frame_hash(&self) -> String {
        fingerprint::rgba_sha256_hex(self.surface.frame())
    }

    pub fn start(&mut self) {
        self.engine.start();
        self.scheduler.schedule(self.engine.tick_interval());
        self.render();
    }

    /// Ticks once and renders, regardless of the scheduler.
    pub fn step(&mut self) -> usize {
        self.engine.tick();
        self.ticks += 1;
        self.render();
        self.ticks
    }

    /// Feeds wall-clock time to the scheduler and runs whatever ticks came due.
    ///
    /// The task is only re-armed while the engine is running and not paused.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let due = self.scheduler.advance(dt);
        let mut ran = 0;
        for _ in 0..due {
            if !self.engine.is_running() || self.engine.is_paused() {
                break;
            }
            self.step();
            ran += 1;
        }
        if self.engine.is_running() && !self.engine.is_paused() {
            self.scheduler.set_interval(self.engine.tick_interval());
        } else {
            self.scheduler.cancel();
        }
        ran
    }

    fn render(&mut self) {
        let size = self.engine.surface_size();
        if self.surface.size() != size {
            // `RgbaBufferSurface::resize` cannot fail.
            let _ = self.surface.resize(size);
        }
        let mut gfx = CpuRenderer::new(self.surface.frame_mut(), size);
        self.engine.render_to(&mut gfx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Rect;

    #[derive(Debug)]
    struct Counter {
        status: EngineStatus,
        value: u32,
        limit: u32,
        events: Vec<GameEvent>,
    }

    impl Counter {
        fn new(limit: u32) -> Self {
            Self {
                status: EngineStatus::Idle,
                value: 0,
                limit,
                events: Vec::new(),
            }
        }
    }

    impl Engine for Counter {
        fn title(&self) -> &'static str {
            "COUNTER"
        }

        fn start(&mut self) {
            self.value = 0;
            self.status = EngineStatus::Running;
        }

        fn stop(&mut self) {
            self.status = EngineStatus::Idle;
        }

        fn pause_toggle(&mut self) {
            self.status = match self.status {
                EngineStatus::Running => EngineStatus::Paused,
                EngineStatus::Paused => EngineStatus::Running,
                other => other,
            };
        }

        fn tick(&mut self) {
            if self.status != EngineStatus::Running {
                return;
            }
            self.value += 1;
            if self.value >= self.limit {
                self.status = EngineStatus::GameOver;
                self.events.push(GameEvent::GameOver { score: self.value });
            }
        }

        fn status(&self) -> EngineStatus {
            self.status
        }

        fn tick_interval(&self) -> Duration {
            Duration::from_millis(100)
        }

        fn surface_size(&self) -> SurfaceSize {
            SurfaceSize::new(4, 4)
        }

        fn render_to(&self, gfx: &mut dyn Renderer2d) {
            gfx.clear([0, 0, 0, 255]);
            let lit = self.value.min(16);
            for i in 0..lit {
                gfx.fill_rect(Rect::new(i % 4, i / 4, 1, 1), [255, 255, 255, 255]);
            }
        }

        fn hud(&self) -> HudReport {
            HudReport::new(self.title(), self.status, self.value)
        }

        fn drain_events(&mut self) -> Vec<GameEvent> {
            std::mem::take(&mut self.events)
        }
    }

    #[test]
    fn restart_defaults_to_start() {
        let mut c = Counter::new(10);
        c.start();
        c.tick();
        c.restart();
        assert_eq!(c.value, 0);
        assert_eq!(c.status(), EngineStatus::Running);
    }

    #[test]
    fn advance_runs_due_ticks_and_stops_rearming_at_game_over() {
        let mut runner = HeadlessRunner::new(Counter::new(3));
        runner.start();

        assert_eq!(runner.advance(Duration::from_millis(250)), 2);
        assert_eq!(runner.engine().value, 2);

        assert_eq!(runner.advance(Duration::from_millis(400)), 1);
        assert_eq!(runner.engine().status(), EngineStatus::GameOver);

        // Not re-armed: more time does nothing.
        assert_eq!(runner.advance(Duration::from_secs(5)), 0);
        assert_eq!(runner.engine().value, 3);
    }

    #[test]
    fn paused_engine_is_not_ticked() {
        let mut runner = HeadlessRunner::new(Counter::new(100));
        runner.start();
        runner.engine_mut().pause_toggle();
        assert_eq!(runner.advance(Duration::from_secs(1)), 0);
        assert_eq!(runner.engine().value, 0);
    }

    #[test]
    fn frame_hash_changes_after_tick() {
        let mut runner = HeadlessRunner::new(Counter::new(100));
        runner.start();
        let before = runner.frame_hash();
        runner.step();
        assert_ne!(runner.frame_hash(), before);
        assert_eq!(runner.frame().len(), 4 * 4 * 4);
    }

    #[test]
    fn hud_serializes_without_absent_counters() {
        let hud = HudReport::new("COUNTER", EngineStatus::Running, 7);
        let json = serde_json::to_string(&hud).expect("serialize hud");
        assert!(!json.contains("lives"));
        let back: HudReport = serde_json::from_str(&json).expect("deserialize hud");
        assert_eq!(back, hud);
    }
}
