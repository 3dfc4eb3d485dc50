use std::time::Duration;

use engine::graphics::{dim_surface, Color, Rect, Renderer2d};
use engine::surface::SurfaceSize;
use engine::{Engine, EngineStatus, GameEvent, HudReport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::grid::GridPos;

pub const TITLE: &str = "BLOCK FALL";

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;
pub const BLOCK_SIZE: u32 = 22;
pub const SPAWN_POS: GridPos = GridPos::new(BOARD_WIDTH as i32 / 2 - 1, 0);

/// Shared canvas size with the maze game; the board is centred inside it.
pub const SURFACE_WIDTH: u32 = 448;
pub const SURFACE_HEIGHT: u32 = 496;

pub const DEFAULT_FALL_INTERVAL_MS: u64 = 800;
pub const TOUCH_FALL_INTERVAL_MS: u64 = 900;
pub const DEFAULT_FALL_STEP_PER_LEVEL_MS: u64 = 80;
pub const DEFAULT_MIN_FALL_INTERVAL_MS: u64 = 300;

pub const LINES_PER_LEVEL: u32 = 10;
/// Points for clearing 0..=4 lines in one lock, before the level multiplier.
pub const LINE_SCORES: [u32; 5] = [0, 40, 100, 300, 1200];

const COLOR_BACKGROUND: Color = [0, 0, 0, 255];
const COLOR_OUTLINE: Color = [57, 255, 20, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

type Shape = &'static [&'static str];

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Rotation states in order; `#` marks an occupied cell, rows top to bottom.
    pub fn rotations(self) -> &'static [Shape] {
        match self {
            PieceKind::I => &[&["####"], &["#", "#", "#", "#"]],
            PieceKind::O => &[&["##", "##"]],
            PieceKind::T => &[
                &[".#.", "###"],
                &["#.", "##", "#."],
                &["###", ".#."],
                &[".#", "##", ".#"],
            ],
            PieceKind::S => &[&[".##", "##."], &["#.", "##", ".#"]],
            PieceKind::Z => &[&["##.", ".##"], &[".#", "##", "#."]],
            PieceKind::J => &[
                &["#..", "###"],
                &["##", "#.", "#."],
                &["###", "..#"],
                &[".#", ".#", "##"],
            ],
            PieceKind::L => &[
                &["..#", "###"],
                &["#.", "#.", "##"],
                &["###", "#.."],
                &["##", ".#", ".#"],
            ],
        }
    }

    pub fn rotation_count(self) -> usize {
        self.rotations().len()
    }

    /// Occupied (col, row) offsets from the anchor for one rotation state.
    pub fn cells(self, rotation: usize) -> impl Iterator<Item = GridPos> {
        let shapes = self.rotations();
        let shape = shapes[rotation % shapes.len()];
        shape.iter().enumerate().flat_map(|(row, line)| {
            line.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'#')
                .map(move |(col, _)| GridPos::new(col as i32, row as i32))
        })
    }

    pub fn color(self) -> Color {
        match self {
            PieceKind::I => [177, 156, 217, 255],
            PieceKind::O => [243, 156, 115, 255],
            PieceKind::T => [133, 193, 165, 255],
            PieceKind::S => [127, 179, 211, 255],
            PieceKind::Z => [241, 148, 138, 255],
            PieceKind::J => [248, 196, 113, 255],
            PieceKind::L => [125, 206, 160, 255],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub rotation: usize,
    /// Top-left of the rotation state's bounding box.
    pub pos: GridPos,
}

impl ActivePiece {
    pub fn cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.kind.cells(self.rotation).map(move |c| c + self.pos)
    }
}

pub type Board = Vec<Vec<Option<PieceKind>>>;

fn empty_board() -> Board {
    vec![vec![None; BOARD_WIDTH]; BOARD_HEIGHT]
}

/// Points for one clear batch at `level`.
pub fn line_clear_score(lines: u32, level: u32) -> u32 {
    let idx = (lines as usize).min(LINE_SCORES.len() - 1);
    LINE_SCORES[idx].saturating_mul(level)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockStackConfig {
    pub fall_interval_ms: u64,
    pub fall_step_per_level_ms: u64,
    pub min_fall_interval_ms: u64,
}

impl Default for BlockStackConfig {
    fn default() -> Self {
        Self {
            fall_interval_ms: DEFAULT_FALL_INTERVAL_MS,
            fall_step_per_level_ms: DEFAULT_FALL_STEP_PER_LEVEL_MS,
            min_fall_interval_ms: DEFAULT_MIN_FALL_INTERVAL_MS,
        }
    }
}

impl BlockStackConfig {
    pub fn touch() -> Self {
        Self {
            fall_interval_ms: TOUCH_FALL_INTERVAL_MS,
            ..Self::default()
        }
    }

    pub fn sanitized(mut self) -> Self {
        self.min_fall_interval_ms = self.min_fall_interval_ms.max(1);
        self.fall_interval_ms = self.fall_interval_ms.max(self.min_fall_interval_ms);
        self
    }

    /// `max(floor, base - (level - 1) * step)`.
    pub fn fall_interval_for(&self, level: u32) -> Duration {
        let drop = self
            .fall_step_per_level_ms
            .saturating_mul(u64::from(level.saturating_sub(1)));
        let ms = self
            .fall_interval_ms
            .saturating_sub(drop)
            .max(self.min_fall_interval_ms);
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStackSnapshot {
    pub board: Board,
    pub active: Option<ActivePiece>,
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    pub status: EngineStatus,
}

#[derive(Debug, Clone)]
pub struct BlockStackEngine {
    config: BlockStackConfig,
    board: Board,
    active: Option<ActivePiece>,
    score: u32,
    lines: u32,
    level: u32,
    status: EngineStatus,
    seed: u64,
    rng: StdRng,
    events: Vec<GameEvent>,
}

impl BlockStackEngine {
    pub fn new(config: BlockStackConfig, seed: u64) -> Self {
        Self {
            config: config.sanitized(),
            board: empty_board(),
            active: None,
            score: 0,
            lines: 0,
            level: 1,
            status: EngineStatus::Idle,
            seed,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_piece(&self) -> Option<ActivePiece> {
        self.active
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn snapshot(&self) -> BlockStackSnapshot {
        BlockStackSnapshot {
            board: self.board.clone(),
            active: self.active,
            score: self.score,
            lines: self.lines,
            level: self.level,
            status: self.status,
        }
    }

    /// Swaps in the falling piece at `pos` and `rotation`, unchecked.
    pub fn set_current_piece_for_test(&mut self, kind: PieceKind, pos: GridPos, rotation: usize) {
        self.active = Some(ActivePiece {
            kind,
            rotation: rotation % kind.rotation_count(),
            pos,
        });
    }

    pub fn set_cell(&mut self, x: usize, y: usize, value: Option<PieceKind>) {
        if y < BOARD_HEIGHT && x < BOARD_WIDTH {
            self.board[y][x] = value;
        }
    }

    /// Whether the active piece fits at `pos` in `rotation`.
    ///
    /// Cells above the top row count as clear, so a piece may spawn partly off-board.
    pub fn is_valid_position(&self, pos: GridPos, rotation: usize) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        piece.kind.cells(rotation).all(|c| {
            let x = pos.x + c.x;
            let y = pos.y + c.y;
            if x < 0 || x >= BOARD_WIDTH as i32 || y >= BOARD_HEIGHT as i32 {
                return false;
            }
            y < 0 || self.board[y as usize][x as usize].is_none()
        })
    }

    fn shift(&mut self, dx: i32, dy: i32) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let target = piece.pos + GridPos::new(dx, dy);
        if !self.is_valid_position(target, piece.rotation) {
            return false;
        }
        if let Some(active) = self.active.as_mut() {
            active.pos = target;
        }
        true
    }

    /// Moves the active piece by (`dx`, `dy`) if the result is legal. Only while running.
    pub fn move_piece(&mut self, dx: i32, dy: i32) -> bool {
        self.status == EngineStatus::Running && self.shift(dx, dy)
    }

    /// Steps to the next rotation state in place. No wall kicks.
    pub fn rotate_piece(&mut self) -> bool {
        if self.status != EngineStatus::Running {
            return false;
        }
        let Some(piece) = self.active else {
            return false;
        };
        let next = (piece.rotation + 1) % piece.kind.rotation_count();
        if !self.is_valid_position(piece.pos, next) {
            return false;
        }
        if let Some(active) = self.active.as_mut() {
            active.rotation = next;
        }
        true
    }

    /// Drops the piece as far as it goes and returns the distance. Locking is left to the
    /// next tick.
    pub fn hard_drop(&mut self) -> u32 {
        if self.status != EngineStatus::Running {
            return 0;
        }
        let mut distance = 0;
        while self.shift(0, 1) {
            distance += 1;
        }
        distance
    }

    pub fn fall_interval(&self) -> Duration {
        self.config.fall_interval_for(self.level)
    }

    fn lock_piece(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        for c in piece.cells() {
            if c.y >= 0 && (c.y as usize) < BOARD_HEIGHT && c.x >= 0 && (c.x as usize) < BOARD_WIDTH
            {
                self.board[c.y as usize][c.x as usize] = Some(piece.kind);
            }
        }
    }

    /// Removes full rows bottom-up, re-checking an index after each removal, and scores the
    /// batch. Returns the number of rows removed.
    pub fn clear_lines(&mut self) -> u32 {
        let mut cleared = 0u32;
        let mut y = BOARD_HEIGHT;
        while y > 0 {
            let row = y - 1;
            if self.board[row].iter().all(Option::is_some) {
                self.board.remove(row);
                self.board.insert(0, vec![None; BOARD_WIDTH]);
                cleared += 1;
            } else {
                y -= 1;
            }
        }
        if cleared == 0 {
            return 0;
        }

        self.lines += cleared;
        let level = self.lines / LINES_PER_LEVEL + 1;
        if level > self.level {
            self.events.push(GameEvent::LevelUp { level });
            info!(level, "level up");
        }
        self.level = level;
        self.score = self.score.saturating_add(line_clear_score(cleared, self.level));
        self.events.push(GameEvent::LinesCleared { lines: cleared });
        debug!(cleared, total = self.lines, score = self.score, "lines cleared");
        cleared
    }

    fn spawn_piece(&mut self) -> bool {
        let kind = PieceKind::ALL[self.rng.gen_range(0..PieceKind::ALL.len())];
        self.active = Some(ActivePiece {
            kind,
            rotation: 0,
            pos: SPAWN_POS,
        });
        self.is_valid_position(SPAWN_POS, 0)
    }

    fn game_over(&mut self) {
        self.status = EngineStatus::GameOver;
        self.events.push(GameEvent::GameOver { score: self.score });
        info!(score = self.score, lines = self.lines, level = self.level, "block round over");
    }

    fn block_rect(origin: Rect, x: i32, y: i32) -> Option<Rect> {
        if x < 0 || y < 0 {
            return None;
        }
        Some(Rect::new(
            origin.x + x as u32 * BLOCK_SIZE,
            origin.y + y as u32 * BLOCK_SIZE,
            BLOCK_SIZE - 1,
            BLOCK_SIZE - 1,
        ))
    }
}

impl Engine for BlockStackEngine {
    fn title(&self) -> &'static str {
        TITLE
    }

    fn start(&mut self) {
        self.board = empty_board();
        self.score = 0;
        self.lines = 0;
        self.level = 1;
        self.events.clear();
        self.rng = StdRng::seed_from_u64(self.seed);
        self.status = EngineStatus::Running;
        if !self.spawn_piece() {
            self.game_over();
            return;
        }
        info!("block round started");
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
        if self.active.is_none() {
            if !self.spawn_piece() {
                self.game_over();
            }
            return;
        }
        if self.shift(0, 1) {
            return;
        }

        self.lock_piece();
        self.clear_lines();
        if !self.spawn_piece() {
            self.game_over();
        }
    }

    fn status(&self) -> EngineStatus {
        self.status
    }

    fn tick_interval(&self) -> Duration {
        self.fall_interval()
    }

    fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::new(SURFACE_WIDTH, SURFACE_HEIGHT)
    }

    fn render_to(&self, gfx: &mut dyn Renderer2d) {
        gfx.clear(COLOR_BACKGROUND);
        let board = Rect::centered_in(
            gfx.size(),
            BOARD_WIDTH as u32 * BLOCK_SIZE,
            BOARD_HEIGHT as u32 * BLOCK_SIZE,
        );
        gfx.rect_outline(
            Rect::new(
                board.x.saturating_sub(2),
                board.y.saturating_sub(2),
                board.w + 4,
                board.h + 4,
            ),
            COLOR_OUTLINE,
        );

        for (y, row) in self.board.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Some(kind) = cell {
                    if let Some(r) = Self::block_rect(board, x as i32, y as i32) {
                        gfx.fill_rect(r, kind.color());
                    }
                }
            }
        }

        if let Some(piece) = self.active {
            for c in piece.cells() {
                if let Some(r) = Self::block_rect(board, c.x, c.y) {
                    gfx.fill_rect(r, piece.kind.color());
                }
            }
        }

        if self.status.banner().is_some() {
            dim_surface(gfx, 160);
        }
    }

    fn hud(&self) -> HudReport {
        HudReport {
            level: Some(self.level),
            lines: Some(self.lines),
            ..HudReport::new(TITLE, self.status, self.score)
        }
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
