//! Randomised rollouts checking the per-tick guarantees of each game.

use std::collections::HashSet;

use engine::{Engine, EngineStatus};
use game::block_stack::{BlockStackConfig, BlockStackEngine};
use game::grid::{Direction, GridPos};
use game::maze_chase::{Cell, MazeChaseConfig, MazeChaseEngine, PelletKind};
use game::snake::{SnakeConfig, SnakeEngine};
use proptest::prelude::*;

/// 0..4 picks a direction, anything else leaves input alone for that tick.
fn input() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..6, 1..150)
}

fn dir(code: u8) -> Option<Direction> {
    Direction::ALL.get(code as usize).copied()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn snake_body_stays_unique_and_contiguous(seed in any::<u64>(), script in input()) {
        let mut s = SnakeEngine::new(SnakeConfig::default(), seed);
        s.start();
        let mut last_score = 0;
        for code in script {
            if let Some(d) = dir(code) {
                s.steer(d);
            }
            let prev_head = s.head();
            s.tick();
            if s.status() != EngineStatus::Running {
                break;
            }
            let v = s.velocity();
            prop_assert_eq!(s.head(), prev_head + GridPos::new(v.dx, v.dy));

            let (w, h) = s.grid_size();
            let cells: HashSet<GridPos> = s.body().iter().copied().collect();
            prop_assert_eq!(cells.len(), s.body().len());
            for c in s.body() {
                prop_assert!(c.x >= 0 && c.x < w && c.y >= 0 && c.y < h);
            }
            for pair in s.body().iter().collect::<Vec<_>>().windows(2) {
                prop_assert_eq!(pair[0].distance_to(*pair[1]), 1.0);
            }
            prop_assert!(!cells.contains(&s.food()));
            prop_assert!(s.score() >= last_score);
            last_score = s.score();
        }
    }

    #[test]
    fn block_piece_never_overlaps_or_leaves_the_well(seed in any::<u64>(), script in input()) {
        let mut g = BlockStackEngine::new(BlockStackConfig::default(), seed);
        g.start();
        let mut last_lines = 0;
        for code in script {
            match code {
                0 => { g.move_piece(-1, 0); }
                1 => { g.move_piece(1, 0); }
                2 => { g.rotate_piece(); }
                3 => { g.hard_drop(); }
                _ => {}
            }
            g.tick();
            if let Some(piece) = g.active_piece() {
                if g.status() == EngineStatus::Running {
                    prop_assert!(g.is_valid_position(piece.pos, piece.rotation));
                }
            }
            prop_assert!(g.lines() >= last_lines);
            prop_assert_eq!(g.level(), g.lines() / 10 + 1);
            last_lines = g.lines();
            if g.status() != EngineStatus::Running {
                break;
            }
        }
    }

    #[test]
    fn maze_registry_and_pursuers_stay_consistent(seed in any::<u64>(), script in input()) {
        let mut g = MazeChaseEngine::new(MazeChaseConfig::default(), seed);
        g.start();
        let mut last_lives = g.lives();
        for code in script {
            if let Some(d) = dir(code) {
                g.set_player_intent(d);
            }
            for (i, p) in g.pursuers().iter().enumerate() {
                let boxed = Direction::ALL.iter().all(|&d| !g.maze().is_open(p.pos.step(d)));
                if p.exit_delay == 0 && !boxed {
                    prop_assert!(!g.pursuer_candidates(i).is_empty(), "pursuer {} has no move", i);
                }
            }
            g.tick();
            prop_assert!(g.lives() <= last_lives && last_lives - g.lives() <= 1);
            last_lives = g.lives();

            prop_assert!(g.maze().is_open(g.player().pos));
            for p in g.pursuers() {
                prop_assert!(g.maze().is_open(p.pos));
            }
            for (pos, kind) in g.pellets() {
                let expected = match kind {
                    PelletKind::Pellet => Cell::Pellet,
                    PelletKind::Power => Cell::PowerPellet,
                };
                prop_assert_eq!(g.maze().cell(*pos), Some(expected));
            }
            if g.status() != EngineStatus::Running {
                break;
            }
        }
    }
}
