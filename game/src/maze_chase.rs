use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::Duration;

use engine::graphics::{dim_surface, Color, Rect, Renderer2d};
use engine::surface::SurfaceSize;
use engine::{Engine, EngineStatus, GameEvent, HudReport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::grid::{Direction, GridPos};

pub const TITLE: &str = "DOT MUNCHER";

pub const MAZE_WIDTH: usize = 28;
pub const MAZE_HEIGHT: usize = 31;
pub const TILE_SIZE: u32 = 16;

pub const PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;
pub const PURSUER_POINTS: u32 = 200;

pub const DEFAULT_LIVES: u32 = 3;
pub const DEFAULT_POWER_DURATION_TICKS: u32 = 60;
pub const DEFAULT_CHASE_PROBABILITY: f64 = 0.85;
pub const DEFAULT_TICK_MS: u64 = 150;
pub const TOUCH_TICK_MS: u64 = 180;

const PLAYER_SPAWN: GridPos = GridPos::new(14, 23);
const PURSUER_SPAWNS: [(GridPos, u32); 4] = [
    (GridPos::new(13, 11), 0),
    (GridPos::new(14, 11), 15),
    (GridPos::new(15, 11), 30),
    (GridPos::new(16, 11), 45),
];
const HISTORY_LEN: usize = 8;
const MOUTH_STEP: f32 = 0.3;

const COLOR_BACKGROUND: Color = [0, 0, 0, 255];
const COLOR_WALL: Color = [0, 102, 255, 255];
const COLOR_PELLET: Color = [255, 255, 0, 255];
const COLOR_POWER_PELLET: Color = [255, 0, 255, 255];
const COLOR_PLAYER: Color = [255, 255, 0, 255];
const COLOR_PLAYER_POWERED: Color = [255, 255, 255, 255];
const COLOR_FRIGHTENED: Color = [0, 0, 255, 255];
const COLOR_EYE: Color = [255, 255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Pellet,
    PowerPellet,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PelletKind {
    Pellet,
    Power,
}

impl Cell {
    fn pellet_kind(self) -> Option<PelletKind> {
        match self {
            Cell::Pellet => Some(PelletKind::Pellet),
            Cell::PowerPellet => Some(PelletKind::Power),
            Cell::Wall | Cell::Empty => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Maze {
    pub fn filled(width: usize, height: usize, cell: Cell) -> Self {
        Self {
            width,
            height,
            cells: vec![cell; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    /// Cell kind at `pos`, `None` out of bounds.
    pub fn cell(&self, pos: GridPos) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    pub fn set(&mut self, pos: GridPos, cell: Cell) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = cell;
        }
    }

    /// In bounds and not a wall.
    pub fn is_open(&self, pos: GridPos) -> bool {
        matches!(self.cell(pos), Some(c) if c != Cell::Wall)
    }

    pub fn positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| GridPos::new(x as i32, y as i32)))
    }

    /// Turns every pellet whose four neighbours are walls (or off the map) into an empty cell.
    /// Such pellets could never be collected and would make the round unwinnable.
    pub fn clear_sealed_pellets(&mut self) -> usize {
        let sealed: Vec<GridPos> = self
            .positions()
            .filter(|&pos| {
                self.cell(pos).and_then(Cell::pellet_kind).is_some()
                    && Direction::ALL.iter().all(|&d| !self.is_open(pos.step(d)))
            })
            .collect();
        for &pos in &sealed {
            self.set(pos, Cell::Empty);
        }
        sealed.len()
    }

    /// Moves a position that reached the left or right edge column to the opposite inner
    /// column. Only tunnel rows are open at the edges, so elsewhere this never triggers.
    pub fn wrap_tunnel(&self, pos: GridPos) -> GridPos {
        let last = self.width as i32 - 1;
        if pos.x <= 0 {
            GridPos::new(last - 1, pos.y)
        } else if pos.x >= last {
            GridPos::new(1, pos.y)
        } else {
            pos
        }
    }

    /// The built-in 28 x 31 maze.
    pub fn classic() -> Self {
        let mut m = Maze::filled(MAZE_WIDTH, MAZE_HEIGHT, Cell::Pellet);
        let mut put = |x: usize, y: usize, cell: Cell| m.set(GridPos::new(x as i32, y as i32), cell);

        for x in 0..MAZE_WIDTH {
            put(x, 0, Cell::Wall);
            put(x, MAZE_HEIGHT - 1, Cell::Wall);
        }
        for y in 0..MAZE_HEIGHT {
            put(0, y, Cell::Wall);
            put(MAZE_WIDTH - 1, y, Cell::Wall);
        }

        // Outer arcs, broken up so the ring stays reachable.
        for x in 2..26 {
            if x < 6 || x > 22 || (x > 10 && x < 18) {
                put(x, 2, Cell::Wall);
                put(x, 28, Cell::Wall);
            }
        }
        for y in 2..28 {
            if y < 6 || y > 22 || (y > 10 && y < 18) {
                put(2, y, Cell::Wall);
                put(25, y, Cell::Wall);
            }
        }

        // Four small boxes with hollow interiors.
        for (top, left) in [(6, 6), (6, 18), (20, 6), (20, 18)] {
            for y in top..top + 3 {
                for x in left..left + 4 {
                    let edge = y == top || y == top + 2 || x == left || x == left + 3;
                    put(x, y, if edge { Cell::Wall } else { Cell::Empty });
                }
            }
        }

        // Pursuer pen: bottom and side walls, open top, no pellets inside or at the exit.
        for x in 12..16 {
            put(x, 12, Cell::Wall);
        }
        for y in 13..16 {
            put(12, y, Cell::Wall);
            put(15, y, Cell::Wall);
        }
        for (x, y) in [
            (13, 11),
            (14, 11),
            (13, 12),
            (14, 12),
            (13, 13),
            (14, 13),
            (13, 14),
            (14, 14),
            (13, 15),
            (14, 15),
        ] {
            put(x, y, Cell::Empty);
        }

        for y in 14..16 {
            put(0, y, Cell::Empty);
            put(MAZE_WIDTH - 1, y, Cell::Empty);
        }

        for (x, y) in [(3, 3), (24, 3), (3, 25), (24, 25)] {
            put(x, y, Cell::PowerPellet);
        }

        // Cross barriers with two-cell gaps in the middle.
        for x in 8..20 {
            if x != 13 && x != 14 {
                put(x, 8, Cell::Wall);
                put(x, 20, Cell::Wall);
            }
        }
        for y in 8..20 {
            if y != 13 && y != 14 {
                put(8, y, Cell::Wall);
                put(19, y, Cell::Wall);
            }
        }

        m.clear_sealed_pellets();
        m.set(PLAYER_SPAWN, Cell::Empty);
        m
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PursuerSpawn {
    pub pos: GridPos,
    pub exit_delay: u32,
}

/// A maze plus where everything starts. Kept pristine; each round copies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeLayout {
    pub maze: Maze,
    pub player_spawn: GridPos,
    pub pursuer_spawns: Vec<PursuerSpawn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    Empty,
    RaggedRow { row: usize },
    UnknownTile { x: usize, y: usize, tile: char },
    MissingPlayer,
    DuplicatePlayer { x: usize, y: usize },
    PursuerCount { found: usize },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Empty => write!(f, "maze layout has no rows"),
            LayoutError::RaggedRow { row } => write!(f, "row {row} has a different width"),
            LayoutError::UnknownTile { x, y, tile } => {
                write!(f, "unknown tile {tile:?} at ({x}, {y})")
            }
            LayoutError::MissingPlayer => write!(f, "layout has no 'P' spawn"),
            LayoutError::DuplicatePlayer { x, y } => write!(f, "second 'P' spawn at ({x}, {y})"),
            LayoutError::PursuerCount { found } => {
                write!(f, "layout needs 1 to 4 'G' spawns, found {found}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

impl MazeLayout {
    pub fn classic() -> Self {
        Self {
            maze: Maze::classic(),
            player_spawn: PLAYER_SPAWN,
            pursuer_spawns: PURSUER_SPAWNS
                .iter()
                .map(|&(pos, exit_delay)| PursuerSpawn { pos, exit_delay })
                .collect(),
        }
    }

    /// Parses rows of `#` wall, `.` pellet, `o` power pellet, ` ` empty, `P` player spawn and
    /// `G` pursuer spawn (1 to 4). Spawn tiles are empty; pursuers leave the pen at once.
    pub fn from_ascii(rows: &[&str]) -> Result<Self, LayoutError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).ok_or(LayoutError::Empty)?;
        if width == 0 {
            return Err(LayoutError::Empty);
        }

        let mut maze = Maze::filled(width, height, Cell::Empty);
        let mut player = None;
        let mut pursuers = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(LayoutError::RaggedRow { row: y });
            }
            for (x, tile) in row.chars().enumerate() {
                let pos = GridPos::new(x as i32, y as i32);
                let cell = match tile {
                    '#' => Cell::Wall,
                    '.' => Cell::Pellet,
                    'o' => Cell::PowerPellet,
                    ' ' => Cell::Empty,
                    'P' => {
                        if player.replace(pos).is_some() {
                            return Err(LayoutError::DuplicatePlayer { x, y });
                        }
                        Cell::Empty
                    }
                    'G' => {
                        pursuers.push(PursuerSpawn { pos, exit_delay: 0 });
                        Cell::Empty
                    }
                    _ => return Err(LayoutError::UnknownTile { x, y, tile }),
                };
                maze.set(pos, cell);
            }
        }

        let player_spawn = player.ok_or(LayoutError::MissingPlayer)?;
        if pursuers.is_empty() || pursuers.len() > 4 {
            return Err(LayoutError::PursuerCount {
                found: pursuers.len(),
            });
        }
        maze.clear_sealed_pellets();
        Ok(Self {
            maze,
            player_spawn,
            pursuer_spawns: pursuers,
        })
    }

}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub pos: GridPos,
    pub direction: Direction,
    pub next_direction: Direction,
    pub mouth_angle: f32,
    pub mouth_open: bool,
}

impl Player {
    fn spawn(pos: GridPos) -> Self {
        Self {
            pos,
            direction: Direction::Right,
            next_direction: Direction::Right,
            mouth_angle: 0.0,
            mouth_open: true,
        }
    }

    fn animate(&mut self) {
        self.mouth_angle += MOUTH_STEP;
        if self.mouth_angle >= std::f32::consts::PI {
            self.mouth_angle = 0.0;
            self.mouth_open = !self.mouth_open;
        }
    }
}

/// Cosmetic tag; every pursuer runs the same movement heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Personality {
    Aggressive,
    Ambush,
    Patrol,
    Random,
}

impl Personality {
    const ORDER: [Personality; 4] = [
        Personality::Aggressive,
        Personality::Ambush,
        Personality::Patrol,
        Personality::Random,
    ];

    pub fn color(self) -> Color {
        match self {
            Personality::Aggressive => [221, 160, 221, 255],
            Personality::Ambush => [152, 251, 152, 255],
            Personality::Patrol => [244, 164, 96, 255],
            Personality::Random => [240, 230, 140, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pursuer {
    pub pos: GridPos,
    pub direction: Direction,
    pub personality: Personality,
    pub exit_delay: u32,
    history: VecDeque<GridPos>,
}

impl Pursuer {
    fn spawn(index: usize, spawn: PursuerSpawn) -> Self {
        Self {
            pos: spawn.pos,
            direction: Direction::Right,
            personality: Personality::ORDER[index % Personality::ORDER.len()],
            exit_delay: spawn.exit_delay,
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    fn remember(&mut self, pos: GridPos) {
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(pos);
    }

    /// Diagnostic: a full history that only ever visited two cells means the pursuer is
    /// oscillating in place.
    pub fn looks_stuck(&self) -> bool {
        if self.history.len() < HISTORY_LEN {
            return false;
        }
        let mut seen: Vec<GridPos> = Vec::with_capacity(2);
        for pos in &self.history {
            if !seen.contains(pos) {
                seen.push(*pos);
                if seen.len() > 2 {
                    return false;
                }
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerState {
    pub active: bool,
    pub elapsed: u32,
    pub duration: u32,
}

impl PowerState {
    fn activate(&mut self) {
        self.active = true;
        self.elapsed = 0;
    }

    fn advance(&mut self) {
        if !self.active {
            return;
        }
        self.elapsed += 1;
        if self.elapsed >= self.duration {
            self.active = false;
            self.elapsed = 0;
        }
    }

    pub fn remaining(&self) -> u32 {
        if self.active {
            self.duration.saturating_sub(self.elapsed)
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeChaseConfig {
    pub tick_interval_ms: u64,
    pub lives: u32,
    pub power_duration_ticks: u32,
    pub chase_probability: f64,
}

impl Default for MazeChaseConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_MS,
            lives: DEFAULT_LIVES,
            power_duration_ticks: DEFAULT_POWER_DURATION_TICKS,
            chase_probability: DEFAULT_CHASE_PROBABILITY,
        }
    }
}

impl MazeChaseConfig {
    /// Slower pacing for touch input.
    pub fn touch() -> Self {
        Self {
            tick_interval_ms: TOUCH_TICK_MS,
            ..Self::default()
        }
    }

    pub fn sanitized(mut self) -> Self {
        self.tick_interval_ms = self.tick_interval_ms.max(1);
        self.lives = self.lives.max(1);
        self.power_duration_ticks = self.power_duration_ticks.max(1);
        self.chase_probability = if self.chase_probability.is_finite() {
            self.chase_probability.clamp(0.0, 1.0)
        } else {
            DEFAULT_CHASE_PROBABILITY
        };
        self
    }
}

/// A neighbour cell a pursuer could step into this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub direction: Direction,
    pub pos: GridPos,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeChaseSnapshot {
    pub status: EngineStatus,
    pub score: u32,
    pub lives: u32,
    pub player: GridPos,
    pub pursuers: Vec<GridPos>,
    pub pellets_left: usize,
    pub power: PowerState,
}

#[derive(Debug, Clone)]
pub struct MazeChaseEngine {
    config: MazeChaseConfig,
    layout: MazeLayout,
    maze: Maze,
    pellets: BTreeMap<GridPos, PelletKind>,
    player: Player,
    pursuers: Vec<Pursuer>,
    power: PowerState,
    score: u32,
    lives: u32,
    status: EngineStatus,
    seed: u64,
    rng: StdRng,
    events: Vec<GameEvent>,
}

impl MazeChaseEngine {
    pub fn new(config: MazeChaseConfig, seed: u64) -> Self {
        Self::with_layout(MazeLayout::classic(), config, seed)
    }

    pub fn with_layout(layout: MazeLayout, config: MazeChaseConfig, seed: u64) -> Self {
        let config = config.sanitized();
        let mut engine = Self {
            config,
            maze: layout.maze.clone(),
            pellets: BTreeMap::new(),
            player: Player::spawn(layout.player_spawn),
            pursuers: Vec::new(),
            power: PowerState {
                duration: config.power_duration_ticks,
                ..PowerState::default()
            },
            score: 0,
            lives: config.lives,
            status: EngineStatus::Idle,
            seed,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
            layout,
        };
        engine.reset();
        engine
    }

    /// Restores the pristine maze, pellets, entities, score and lives. Leaves the status alone.
    pub fn reset(&mut self) {
        self.maze = self.layout.maze.clone();
        self.pellets = self
            .maze
            .positions()
            .filter_map(|pos| Some((pos, self.maze.cell(pos)?.pellet_kind()?)))
            .collect();
        self.reset_entities();
        self.power = PowerState {
            duration: self.config.power_duration_ticks,
            ..PowerState::default()
        };
        self.score = 0;
        self.lives = self.config.lives;
        self.rng = StdRng::seed_from_u64(self.seed);
        self.events.clear();
    }

    fn reset_entities(&mut self) {
        self.player = Player::spawn(self.layout.player_spawn);
        self.pursuers = self
            .layout
            .pursuer_spawns
            .iter()
            .enumerate()
            .map(|(i, &spawn)| Pursuer::spawn(i, spawn))
            .collect();
    }

    /// Records the desired direction; it is taken on the next tick where it leads into an
    /// open cell.
    pub fn set_player_intent(&mut self, direction: Direction) {
        if self.status == EngineStatus::Running {
            self.player.next_direction = direction;
        }
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn pellets(&self) -> &BTreeMap<GridPos, PelletKind> {
        &self.pellets
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn pursuers(&self) -> &[Pursuer] {
        &self.pursuers
    }

    pub fn power(&self) -> PowerState {
        self.power
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn snapshot(&self) -> MazeChaseSnapshot {
        MazeChaseSnapshot {
            status: self.status,
            score: self.score,
            lives: self.lives,
            player: self.player.pos,
            pursuers: self.pursuers.iter().map(|p| p.pos).collect(),
            pellets_left: self.pellets.len(),
            power: self.power,
        }
    }

    /// Puts the player on `pos` heading `direction`.
    pub fn set_player_for_test(&mut self, pos: GridPos, direction: Direction) {
        self.player.pos = pos;
        self.player.direction = direction;
        self.player.next_direction = direction;
    }

    /// Moves pursuer `index` to `pos` with the given pen delay.
    pub fn set_pursuer_for_test(&mut self, index: usize, pos: GridPos, exit_delay: u32) {
        if let Some(p) = self.pursuers.get_mut(index) {
            p.pos = pos;
            p.exit_delay = exit_delay;
        }
    }

    /// Open neighbours pursuer `index` may move into, scored against the player's cell.
    ///
    /// Cells held by other pursuers are skipped unless that leaves nothing, in which case
    /// they are allowed; a pursuer with any open neighbour therefore always has a move.
    pub fn pursuer_candidates(&self, index: usize) -> Vec<Candidate> {
        let free = self.candidates_for(index, true);
        if free.is_empty() {
            self.candidates_for(index, false)
        } else {
            free
        }
    }

    fn candidates_for(&self, index: usize, avoid_pursuers: bool) -> Vec<Candidate> {
        let Some(pursuer) = self.pursuers.get(index) else {
            return Vec::new();
        };
        Direction::ALL
            .iter()
            .filter_map(|&direction| {
                let pos = pursuer.pos.step(direction);
                if !self.maze.is_open(pos) {
                    return None;
                }
                if avoid_pursuers
                    && self
                        .pursuers
                        .iter()
                        .enumerate()
                        .any(|(j, other)| j != index && other.pos == pos)
                {
                    return None;
                }
                Some(Candidate {
                    direction,
                    pos,
                    distance: pos.distance_to(self.player.pos),
                })
            })
            .collect()
    }

    fn choose_move(&mut self, candidates: &[Candidate]) -> Candidate {
        let pick = |better: fn(f64, f64) -> bool| {
            candidates[1..]
                .iter()
                .fold(candidates[0], |best, c| if better(c.distance, best.distance) { *c } else { best })
        };

        if self.power.active {
            pick(|a, b| a > b)
        } else if self.rng.gen_bool(self.config.chase_probability) {
            pick(|a, b| a < b)
        } else {
            candidates[self.rng.gen_range(0..candidates.len())]
        }
    }

    fn move_player(&mut self) {
        let player = &mut self.player;
        if self.maze.is_open(player.pos.step(player.next_direction)) {
            player.direction = player.next_direction;
        }
        let next = player.pos.step(player.direction);
        if self.maze.is_open(next) {
            player.pos = self.maze.wrap_tunnel(next);
        }
        player.animate();
    }

    fn collect_pellet(&mut self) {
        let pos = self.player.pos;
        let Some(kind) = self.pellets.remove(&pos) else {
            return;
        };
        self.maze.set(pos, Cell::Empty);
        match kind {
            PelletKind::Pellet => {
                self.score += PELLET_POINTS;
                self.events.push(GameEvent::PelletEaten);
            }
            PelletKind::Power => {
                self.score += POWER_PELLET_POINTS;
                self.power.activate();
                self.events.push(GameEvent::PowerPelletEaten);
                debug!(x = pos.x, y = pos.y, "power state active");
            }
        }
    }

    fn move_pursuers(&mut self) {
        for i in 0..self.pursuers.len() {
            if self.pursuers[i].exit_delay > 0 {
                self.pursuers[i].exit_delay -= 1;
                continue;
            }
            let candidates = self.pursuer_candidates(i);
            if candidates.is_empty() {
                continue;
            }
            let chosen = self.choose_move(&candidates);
            let pos = self.maze.wrap_tunnel(chosen.pos);
            let pursuer = &mut self.pursuers[i];
            pursuer.pos = pos;
            pursuer.direction = chosen.direction;
            pursuer.remember(pos);
            if pursuer.looks_stuck() {
                debug!(index = i, x = pos.x, y = pos.y, "pursuer oscillating");
            }
        }
    }

    /// Returns true when the round ended.
    fn resolve_collisions(&mut self) -> bool {
        for i in 0..self.pursuers.len() {
            if self.pursuers[i].pos != self.player.pos {
                continue;
            }
            if self.power.active {
                self.score += PURSUER_POINTS;
                self.send_pursuer_home(i);
                self.events.push(GameEvent::PursuerEaten);
            } else {
                // Losing a life resets every position, so later overlaps no longer exist.
                return self.lose_life();
            }
        }
        false
    }

    fn send_pursuer_home(&mut self, index: usize) {
        let spawns = &self.layout.pursuer_spawns;
        let spawn = spawns[self.rng.gen_range(0..spawns.len())];
        let pursuer = &mut self.pursuers[index];
        pursuer.pos = spawn.pos;
        pursuer.history.clear();
        debug!(index, x = spawn.pos.x, y = spawn.pos.y, "pursuer sent back to the pen");
    }

    fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(GameEvent::LifeLost {
            lives_left: self.lives,
        });
        if self.lives == 0 {
            self.status = EngineStatus::GameOver;
            self.events.push(GameEvent::GameOver { score: self.score });
            info!(score = self.score, "maze round over");
            return true;
        }
        debug!(lives = self.lives, "life lost, positions reset");
        self.reset_entities();
        false
    }

    fn draw_tile_disc(gfx: &mut dyn Renderer2d, pos: GridPos, radius: u32, color: Color) {
        let cx = pos.x as u32 * TILE_SIZE + TILE_SIZE / 2;
        let cy = pos.y as u32 * TILE_SIZE + TILE_SIZE / 2;
        gfx.fill_disc(cx, cy, radius, color);
    }
}

impl Engine for MazeChaseEngine {
    fn title(&self) -> &'static str {
        TITLE
    }

    fn start(&mut self) {
        self.reset();
        self.status = EngineStatus::Running;
        info!(pellets = self.pellets.len(), "maze round started");
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

        self.move_player();
        self.collect_pellet();
        self.move_pursuers();
        if self.resolve_collisions() {
            return;
        }
        self.power.advance();

        if self.pellets.is_empty() {
            self.status = EngineStatus::Won;
            self.events.push(GameEvent::Won { score: self.score });
            info!(score = self.score, "maze cleared");
        }
    }

    fn status(&self) -> EngineStatus {
        self.status
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.tick_interval_ms)
    }

    fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::for_tiles(self.maze.width() as u32, self.maze.height() as u32, TILE_SIZE)
    }

    fn render_to(&self, gfx: &mut dyn Renderer2d) {
        gfx.clear(COLOR_BACKGROUND);

        for pos in self.maze.positions() {
            match self.maze.cell(pos) {
                Some(Cell::Wall) => gfx.fill_rect(
                    Rect::new(
                        pos.x as u32 * TILE_SIZE,
                        pos.y as u32 * TILE_SIZE,
                        TILE_SIZE,
                        TILE_SIZE,
                    ),
                    COLOR_WALL,
                ),
                Some(Cell::Pellet) => Self::draw_tile_disc(gfx, pos, 2, COLOR_PELLET),
                Some(Cell::PowerPellet) => Self::draw_tile_disc(gfx, pos, 6, COLOR_POWER_PELLET),
                Some(Cell::Empty) | None => {}
            }
        }

        let radius = TILE_SIZE / 2 - 2;
        let body = if self.power.active {
            COLOR_PLAYER_POWERED
        } else {
            COLOR_PLAYER
        };
        Self::draw_tile_disc(gfx, self.player.pos, radius, body);
        if self.player.mouth_open {
            // Cut a notch from the centre towards the facing edge.
            let cx = self.player.pos.x as u32 * TILE_SIZE + TILE_SIZE / 2;
            let cy = self.player.pos.y as u32 * TILE_SIZE + TILE_SIZE / 2;
            let notch = match self.player.direction {
                Direction::Right => Rect::new(cx, cy - 1, radius + 1, 3),
                Direction::Left => Rect::new(cx - radius, cy - 1, radius + 1, 3),
                Direction::Down => Rect::new(cx - 1, cy, 3, radius + 1),
                Direction::Up => Rect::new(cx - 1, cy - radius, 3, radius + 1),
            };
            gfx.fill_rect(notch, COLOR_BACKGROUND);
        }

        for pursuer in &self.pursuers {
            let color = if self.power.active {
                COLOR_FRIGHTENED
            } else {
                pursuer.personality.color()
            };
            // Round head, square skirt, two eyes.
            let cx = pursuer.pos.x as u32 * TILE_SIZE + TILE_SIZE / 2;
            let cy = pursuer.pos.y as u32 * TILE_SIZE + TILE_SIZE / 2;
            gfx.fill_disc(cx, cy, radius, color);
            gfx.fill_rect(Rect::new(cx - radius, cy, radius * 2, radius), color);
            gfx.fill_disc(cx - 3, cy - 2, 2, COLOR_EYE);
            gfx.fill_disc(cx + 3, cy - 2, 2, COLOR_EYE);
            gfx.fill_disc(cx - 3, cy - 2, 1, COLOR_BACKGROUND);
            gfx.fill_disc(cx + 3, cy - 2, 1, COLOR_BACKGROUND);
        }

        if self.status.banner().is_some() {
            dim_surface(gfx, 160);
        }
    }

    fn hud(&self) -> HudReport {
        HudReport {
            lives: Some(self.lives),
            ..HudReport::new(TITLE, self.status, self.score)
        }
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
