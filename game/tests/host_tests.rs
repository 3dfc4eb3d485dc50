use std::path::PathBuf;
use std::time::Duration;

use engine::{Engine, EngineStatus};
use game::grid::{Direction, GridPos};
use game::high_scores::HighScoreStore;
use game::host::{ActiveGame, GameMode, HostInput, ModeHost};
use game::settings::ArcadeSettings;
use game::sfx::SoundCue;
use game::snake::{SnakeConfig, Velocity};

fn host() -> ModeHost {
    ModeHost::new(ArcadeSettings::default(), 42, None)
}

fn temp_scores(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("arcade-host-{}-{name}", std::process::id()))
        .join("high_scores.json")
}

#[test]
fn host_opens_idle_on_maze_chase() {
    let h = host();
    assert_eq!(h.mode(), GameMode::MazeChase);
    assert_eq!(h.hud().status, EngineStatus::Idle);
    assert!(!h.is_ticking());
}

#[test]
fn switching_while_idle_stays_idle() {
    let mut h = host();
    h.handle(HostInput::SwitchMode(GameMode::Snake));
    assert_eq!(h.mode(), GameMode::Snake);
    assert_eq!(h.hud().status, EngineStatus::Idle);
    assert!(!h.is_ticking());
    assert_eq!(h.advance(Duration::from_secs(1)), 0);
}

#[test]
fn switching_mid_round_starts_the_new_game() {
    let mut h = host();
    h.handle(HostInput::Start);
    assert!(h.is_ticking());

    h.handle(HostInput::SwitchMode(GameMode::BlockStack));
    assert_eq!(h.mode(), GameMode::BlockStack);
    assert_eq!(h.hud().status, EngineStatus::Running);
    assert!(h.is_ticking());
    assert_eq!(h.hud().score, 0);
}

#[test]
fn pause_cancels_the_tick_task_and_resume_rearms_it() {
    let mut h = host();
    h.switch_mode(GameMode::Snake);
    h.start();
    h.handle(HostInput::PauseToggle);
    assert_eq!(h.hud().status, EngineStatus::Paused);
    assert!(!h.is_ticking());
    assert_eq!(h.advance(Duration::from_secs(2)), 0);

    h.handle(HostInput::PauseToggle);
    assert_eq!(h.hud().status, EngineStatus::Running);
    assert!(h.is_ticking());
}

#[test]
fn pause_and_restart_are_ignored_before_start() {
    let mut h = host();
    h.handle(HostInput::PauseToggle);
    h.handle(HostInput::Restart);
    assert_eq!(h.hud().status, EngineStatus::Idle);
    assert!(!h.is_ticking());
}

#[test]
fn advance_runs_one_tick_per_elapsed_interval() {
    let mut h = host();
    h.switch_mode(GameMode::Snake);
    h.start();
    assert_eq!(h.advance(Duration::from_millis(100)), 0);
    assert_eq!(h.advance(Duration::from_millis(350)), 3);
}

#[test]
fn steering_left_moves_the_falling_piece() {
    let mut h = host();
    h.switch_mode(GameMode::BlockStack);
    h.start();
    let x_of = |h: &ModeHost| match h.game() {
        ActiveGame::BlockStack(g) => g.active_piece().map(|p| p.pos.x),
        _ => None,
    };
    let before = x_of(&h).expect("piece");
    h.handle(HostInput::Steer(Direction::Left));
    assert_eq!(x_of(&h), Some(before - 1));
}

#[test]
fn steering_before_start_does_nothing() {
    let mut h = host();
    let before = match h.game() {
        ActiveGame::MazeChase(g) => g.snapshot(),
        _ => unreachable!(),
    };
    h.handle(HostInput::Steer(Direction::Up));
    h.handle(HostInput::Action);
    h.handle(HostInput::Tap);
    let ActiveGame::MazeChase(g) = h.game() else {
        panic!("mode changed");
    };
    assert_eq!(g.snapshot(), before);
}

#[test]
fn first_maze_tick_plays_the_pellet_cue() {
    let mut h = host();
    h.start();
    h.drain_cues();
    assert_eq!(h.advance(Duration::from_millis(150)), 1);
    assert!(h.drain_cues().contains(&SoundCue::Pellet));
    assert!(h.drain_cues().is_empty());
}

#[test]
fn game_over_persists_a_new_best() {
    let path = temp_scores("best");
    let _ = std::fs::remove_file(&path);

    let mut h = ModeHost::new(
        ArcadeSettings::default(),
        5,
        Some(HighScoreStore::new(&path)),
    );
    h.switch_mode(GameMode::Snake);
    h.start();
    if let ActiveGame::Snake(s) = h.game_mut() {
        s.set_body_for_test(&[GridPos::new(26, 0)], Velocity { dx: 1, dy: 0 });
        s.set_food_for_test(GridPos::new(27, 0));
    }

    h.advance(Duration::from_secs(1));

    assert_eq!(h.hud().status, EngineStatus::GameOver);
    assert!(!h.is_ticking());
    assert_eq!(h.best_score(), 10);
    let drained = h.drain_cues();
    assert!(drained.contains(&SoundCue::Food));
    assert!(drained.contains(&SoundCue::GameOver));

    let stored = HighScoreStore::new(&path).load();
    assert_eq!(stored.best(GameMode::Snake), 10);
    assert_eq!(stored.best(GameMode::MazeChase), 0);

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[test]
fn restart_keeps_the_mode_and_resets_the_score() {
    let mut h = host();
    h.switch_mode(GameMode::Snake);
    h.start();
    h.advance(Duration::from_millis(600));
    h.handle(HostInput::Restart);
    assert_eq!(h.mode(), GameMode::Snake);
    assert_eq!(h.hud().status, EngineStatus::Running);
    assert_eq!(h.hud().score, 0);
    assert!(h.is_ticking());
    let ActiveGame::Snake(s) = h.game() else {
        panic!("mode changed");
    };
    assert_eq!(s.head(), GridPos::new(14, 15));
    assert_eq!(s.tick_interval(), Duration::from_millis(150));
}

#[test]
fn starting_over_mid_round_keeps_the_live_score() {
    let path = temp_scores("start-over");
    let _ = std::fs::remove_file(&path);

    let mut h = ModeHost::new(
        ArcadeSettings::default(),
        9,
        Some(HighScoreStore::new(&path)),
    );
    h.switch_mode(GameMode::Snake);
    h.start();
    if let ActiveGame::Snake(s) = h.game_mut() {
        s.set_body_for_test(&[GridPos::new(5, 5)], Velocity { dx: 1, dy: 0 });
        s.set_food_for_test(GridPos::new(6, 5));
    }
    let one_tick = Duration::from_millis(SnakeConfig::default().tick_interval_ms);
    assert_eq!(h.advance(one_tick), 1);
    assert_eq!(h.hud().score, 10);
    assert_eq!(h.hud().status, EngineStatus::Running);

    h.handle(HostInput::Start);

    assert_eq!(h.hud().score, 0);
    assert_eq!(h.hud().status, EngineStatus::Running);
    assert_eq!(h.high_scores().best(GameMode::Snake), 10);
    assert_eq!(HighScoreStore::new(&path).load().best(GameMode::Snake), 10);

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}
