use std::collections::VecDeque;
use std::time::Duration;

use engine::graphics::{dim_surface, Color, Rect, Renderer2d};
use engine::surface::SurfaceSize;
use engine::{Engine, EngineStatus, GameEvent, HudReport};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::grid::{Direction, GridPos};

pub const TITLE: &str = "SNAKE";

pub const GRID_WIDTH: i32 = 28;
pub const GRID_HEIGHT: i32 = 31;
pub const TILE_SIZE: u32 = 12;
pub const FOOD_POINTS: u32 = 10;

pub const DEFAULT_TICK_MS: u64 = 150;
pub const TOUCH_TICK_MS: u64 = 180;
pub const DEFAULT_SPEEDUP_STEP_MS: u64 = 2;
pub const DEFAULT_MIN_TICK_MS: u64 = 50;

const FOOD_SAMPLE_ATTEMPTS: usize = 256;

const COLOR_BACKGROUND: Color = [0, 0, 0, 255];
const COLOR_GRID: Color = [0, 51, 0, 255];
const COLOR_HEAD: Color = [57, 255, 20, 255];
const COLOR_BODY: Color = [46, 204, 16, 255];
const COLOR_FOOD: Color = [255, 0, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    pub tick_interval_ms: u64,
    /// Removed from the interval for every food eaten.
    pub speedup_step_ms: u64,
    pub min_tick_interval_ms: u64,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_MS,
            speedup_step_ms: DEFAULT_SPEEDUP_STEP_MS,
            min_tick_interval_ms: DEFAULT_MIN_TICK_MS,
        }
    }
}

impl SnakeConfig {
    pub fn touch() -> Self {
        Self {
            tick_interval_ms: TOUCH_TICK_MS,
            ..Self::default()
        }
    }

    pub fn sanitized(mut self) -> Self {
        self.min_tick_interval_ms = self.min_tick_interval_ms.max(1);
        self.tick_interval_ms = self.tick_interval_ms.max(self.min_tick_interval_ms);
        self
    }
}

/// Velocity in cells per tick. `(0, 0)` means the snake has not been set moving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: i32,
    pub dy: i32,
}

impl Velocity {
    pub const STILL: Velocity = Velocity { dx: 0, dy: 0 };

    pub fn is_still(self) -> bool {
        self == Self::STILL
    }

    pub fn direction(self) -> Option<Direction> {
        Direction::from_delta(self.dx, self.dy)
    }
}

impl From<Direction> for Velocity {
    fn from(dir: Direction) -> Self {
        let d = dir.delta();
        Velocity { dx: d.x, dy: d.y }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeSnapshot {
    pub status: EngineStatus,
    pub score: u32,
    pub body: Vec<GridPos>,
    pub velocity: Velocity,
    pub food: GridPos,
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone)]
pub struct SnakeEngine {
    config: SnakeConfig,
    width: i32,
    height: i32,
    body: VecDeque<GridPos>,
    velocity: Velocity,
    pending: Option<Direction>,
    food: GridPos,
    score: u32,
    interval_ms: u64,
    status: EngineStatus,
    seed: u64,
    rng: StdRng,
    events: Vec<GameEvent>,
}

impl SnakeEngine {
    pub fn new(config: SnakeConfig, seed: u64) -> Self {
        Self::with_grid(GRID_WIDTH, GRID_HEIGHT, config, seed)
    }

    pub fn with_grid(width: i32, height: i32, config: SnakeConfig, seed: u64) -> Self {
        let config = config.sanitized();
        let mut engine = Self {
            config,
            width: width.max(2),
            height: height.max(1),
            body: VecDeque::new(),
            velocity: Velocity::STILL,
            pending: None,
            food: GridPos::new(0, 0),
            score: 0,
            interval_ms: config.tick_interval_ms,
            status: EngineStatus::Idle,
            seed,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
        };
        engine.reset();
        engine
    }

    fn spawn_point(&self) -> GridPos {
        GridPos::new(self.width / 2, self.height / 2)
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.body.clear();
        self.body.push_back(self.spawn_point());
        self.velocity = Velocity::STILL;
        self.pending = None;
        self.score = 0;
        self.interval_ms = self.config.tick_interval_ms;
        self.events.clear();
        self.food = self.sample_food().unwrap_or_else(|| self.spawn_point());
    }

    /// Queues a direction change for the next tick.
    ///
    /// Anything that is not a unit cardinal step is ignored, as is a reversal of the current
    /// velocity. Later calls before the tick replace earlier ones.
    pub fn set_direction(&mut self, dx: i32, dy: i32) {
        if self.status != EngineStatus::Running {
            return;
        }
        let Some(dir) = Direction::from_delta(dx, dy) else {
            return;
        };
        if self.velocity.direction() == Some(dir.opposite()) {
            return;
        }
        self.pending = Some(dir);
    }

    pub fn steer(&mut self, dir: Direction) {
        let d = dir.delta();
        self.set_direction(d.x, d.y);
    }

    pub fn body(&self) -> &VecDeque<GridPos> {
        &self.body
    }

    pub fn head(&self) -> GridPos {
        self.body.front().copied().unwrap_or_else(|| self.spawn_point())
    }

    pub fn food(&self) -> GridPos {
        self.food
    }

    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn grid_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn snapshot(&self) -> SnakeSnapshot {
        SnakeSnapshot {
            status: self.status,
            score: self.score,
            body: self.body.iter().copied().collect(),
            velocity: self.velocity,
            food: self.food,
            tick_interval_ms: self.interval_ms,
        }
    }

    /// Replaces the body (head first) and velocity so tests can stage a position.
    pub fn set_body_for_test(&mut self, body: &[GridPos], velocity: Velocity) {
        self.body = body.iter().copied().collect();
        self.velocity = velocity;
        self.pending = None;
    }

    /// Moves the food to `food` without sampling.
    pub fn set_food_for_test(&mut self, food: GridPos) {
        self.food = food;
    }

    fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Rejection-samples a cell the body does not cover, then falls back to picking among
    /// the free cells. `None` once the body fills the grid.
    fn sample_food(&mut self) -> Option<GridPos> {
        let cells = (self.width * self.height) as usize;
        if self.body.len() >= cells {
            return None;
        }
        for _ in 0..FOOD_SAMPLE_ATTEMPTS {
            let pos = GridPos::new(
                self.rng.gen_range(0..self.width),
                self.rng.gen_range(0..self.height),
            );
            if !self.body.contains(&pos) {
                return Some(pos);
            }
        }
        let free: Vec<GridPos> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| GridPos::new(x, y)))
            .filter(|pos| !self.body.contains(pos))
            .collect();
        free.choose(&mut self.rng).copied()
    }

    fn end_round(&mut self, status: EngineStatus) {
        self.status = status;
        let event = match status {
            EngineStatus::Won => GameEvent::Won { score: self.score },
            _ => GameEvent::GameOver { score: self.score },
        };
        self.events.push(event);
        info!(score = self.score, length = self.body.len(), ?status, "snake round over");
    }
}

impl Engine for SnakeEngine {
    fn title(&self) -> &'static str {
        TITLE
    }

    fn start(&mut self) {
        self.reset();
        self.velocity = Velocity::from(Direction::Right);
        self.status = EngineStatus::Running;
        info!(head = ?self.head(), food = ?self.food, "snake round started");
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
        if let Some(dir) = self.pending.take() {
            self.velocity = Velocity::from(dir);
        }
        if self.velocity.is_still() {
            return;
        }

        let head = self.head() + GridPos::new(self.velocity.dx, self.velocity.dy);
        // Checked against the whole body, tail included, before anything moves.
        if !self.in_bounds(head) || self.body.contains(&head) {
            self.end_round(EngineStatus::GameOver);
            return;
        }
        self.body.push_front(head);

        if head != self.food {
            self.body.pop_back();
            return;
        }

        self.score += FOOD_POINTS;
        self.interval_ms = self
            .interval_ms
            .saturating_sub(self.config.speedup_step_ms)
            .max(self.config.min_tick_interval_ms);
        self.events.push(GameEvent::FoodEaten);
        debug!(length = self.body.len(), interval_ms = self.interval_ms, "food eaten");

        match self.sample_food() {
            Some(food) => self.food = food,
            None => self.end_round(EngineStatus::Won),
        }
    }

    fn status(&self) -> EngineStatus {
        self.status
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::for_tiles(self.width as u32, self.height as u32, TILE_SIZE)
    }

    fn render_to(&self, gfx: &mut dyn Renderer2d) {
        gfx.clear(COLOR_BACKGROUND);
        let size = gfx.size();
        for x in 0..=self.width as u32 {
            gfx.fill_rect(Rect::new(x * TILE_SIZE, 0, 1, size.height), COLOR_GRID);
        }
        for y in 0..=self.height as u32 {
            gfx.fill_rect(Rect::new(0, y * TILE_SIZE, size.width, 1), COLOR_GRID);
        }

        for (i, seg) in self.body.iter().enumerate() {
            let color = if i == 0 { COLOR_HEAD } else { COLOR_BODY };
            gfx.fill_rect(
                Rect::new(
                    seg.x as u32 * TILE_SIZE,
                    seg.y as u32 * TILE_SIZE,
                    TILE_SIZE,
                    TILE_SIZE,
                )
                .shrink(1),
                color,
            );
        }

        gfx.fill_rect(
            Rect::new(
                self.food.x as u32 * TILE_SIZE,
                self.food.y as u32 * TILE_SIZE,
                TILE_SIZE,
                TILE_SIZE,
            )
            .shrink(2),
            COLOR_FOOD,
        );

        if self.status.banner().is_some() {
            dim_surface(gfx, 160);
        }
    }

    fn hud(&self) -> HudReport {
        HudReport::new(TITLE, self.status, self.score)
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(seed: u64) -> SnakeEngine {
        let mut s = SnakeEngine::new(SnakeConfig::default(), seed);
        s.start();
        s
    }

    #[test]
    fn starts_centred_and_moving_right() {
        let s = running(1);
        assert_eq!(s.body().iter().copied().collect::<Vec<_>>(), vec![GridPos::new(14, 15)]);
        assert_eq!(s.velocity(), Velocity { dx: 1, dy: 0 });
        assert_ne!(s.food(), s.head());
    }

    #[test]
    fn malformed_direction_is_ignored() {
        let mut s = running(2);
        s.set_direction(1, 1);
        s.set_direction(0, 0);
        s.set_direction(3, 0);
        s.tick();
        assert_eq!(s.velocity(), Velocity { dx: 1, dy: 0 });
    }

    #[test]
    fn direction_applies_on_next_tick_only() {
        let mut s = running(3);
        s.set_food_for_test(GridPos::new(0, 0));
        s.set_direction(0, -1);
        assert_eq!(s.velocity(), Velocity { dx: 1, dy: 0 });
        s.tick();
        assert_eq!(s.velocity(), Velocity { dx: 0, dy: -1 });
        assert_eq!(s.head(), GridPos::new(14, 14));
    }

    #[test]
    fn speedup_is_clamped_at_floor() {
        let config = SnakeConfig {
            tick_interval_ms: 54,
            speedup_step_ms: 3,
            min_tick_interval_ms: 50,
        };
        let mut s = SnakeEngine::with_grid(10, 1, config, 4);
        s.start();
        s.set_body_for_test(&[GridPos::new(0, 0)], Velocity { dx: 1, dy: 0 });
        for x in 1..=3 {
            s.set_food_for_test(GridPos::new(x, 0));
            s.tick();
        }
        assert_eq!(s.tick_interval(), Duration::from_millis(50));
        s.restart();
        assert_eq!(s.tick_interval(), Duration::from_millis(54));
    }

    #[test]
    fn config_floor_caps_base_interval() {
        let c = SnakeConfig {
            tick_interval_ms: 10,
            speedup_step_ms: 1,
            min_tick_interval_ms: 0,
        }
        .sanitized();
        assert_eq!(c.min_tick_interval_ms, 1);
        assert_eq!(c.tick_interval_ms, 10);
    }
}
