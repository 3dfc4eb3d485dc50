use engine::{Engine, HeadlessRunner};
use game::block_stack::{BlockStackConfig, BlockStackEngine, PieceKind};
use game::grid::GridPos;
use game::maze_chase::{MazeChaseConfig, MazeChaseEngine};
use game::snake::{SnakeConfig, SnakeEngine};

fn pixel<E: Engine>(runner: &HeadlessRunner<E>, x: u32, y: u32) -> [u8; 4] {
    let width = runner.engine().surface_size().width;
    let i = ((y * width + x) * 4) as usize;
    let px = &runner.frame()[i..i + 4];
    [px[0], px[1], px[2], px[3]]
}

#[test]
fn maze_border_is_drawn_in_wall_blue() {
    let runner = HeadlessRunner::new(MazeChaseEngine::new(MazeChaseConfig::default(), 1));
    assert_eq!(runner.frame().len(), 28 * 16 * 31 * 16 * 4);
    assert_eq!(pixel(&runner, 1, 1), [0, 102, 255, 255]);
}

#[test]
fn pausing_dims_the_maze() {
    let mut runner = HeadlessRunner::new(MazeChaseEngine::new(MazeChaseConfig::default(), 1));
    runner.start();
    let lit = pixel(&runner, 1, 1);
    runner.engine_mut().pause_toggle();
    runner.step();
    let dimmed = pixel(&runner, 1, 1);
    assert_ne!(dimmed, lit);
    assert!(dimmed[2] < lit[2]);
}

#[test]
fn snake_head_is_bright_green() {
    let mut runner = HeadlessRunner::new(SnakeEngine::new(SnakeConfig::default(), 2));
    runner.start();
    let head = runner.engine().head();
    let (x, y) = (head.x as u32 * 12 + 6, head.y as u32 * 12 + 6);
    assert_eq!(pixel(&runner, x, y), [57, 255, 20, 255]);
    assert_eq!(pixel(&runner, 0, 5), [0, 51, 0, 255]);
}

#[test]
fn locked_block_uses_its_piece_colour() {
    let mut runner = HeadlessRunner::new(BlockStackEngine::new(BlockStackConfig::default(), 3));
    runner.start();
    let game = runner.engine_mut();
    game.set_current_piece_for_test(PieceKind::O, GridPos::new(0, 0), 0);
    game.hard_drop();
    runner.step();

    assert_eq!(runner.engine().board()[19][0], Some(PieceKind::O));
    // Board is centred: 220 x 440 inside 448 x 496.
    assert_eq!(pixel(&runner, 114 + 5, 28 + 19 * 22 + 5), PieceKind::O.color());
    assert_eq!(pixel(&runner, 112, 26), [57, 255, 20, 255]);
}
