pub mod block_stack;
pub mod gesture;
pub mod grid;
pub mod high_scores;
pub mod host;
pub mod keys;
pub mod maze_chase;
pub mod persist;
pub mod settings;
pub mod sfx;
pub mod simulate;
pub mod snake;
pub mod window;
