//! Headless sessions driven by a fixed input script.

use std::fmt;
use std::str::FromStr;

use engine::{Engine, HeadlessRunner, HudReport};
use serde::Serialize;
use tracing::debug;

use crate::grid::Direction;
use crate::host::{ActiveGame, GameMode};
use crate::settings::ArcadeSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Steer(Direction),
    Action,
    Tap,
}

/// An input applied just before tick `at_tick` (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedIntent {
    pub at_tick: usize,
    pub kind: IntentKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentParseError(String);

impl fmt::Display for IntentParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad intent {:?}: expected <tick>:<up|down|left|right|action|tap>", self.0)
    }
}

impl std::error::Error for IntentParseError {}

impl FromStr for ScriptedIntent {
    type Err = IntentParseError;

    /// `12:left`, `3:action`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IntentParseError(s.to_string());
        let (tick, name) = s.split_once(':').ok_or_else(err)?;
        let at_tick = tick.trim().parse::<usize>().map_err(|_| err())?;
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "up" => IntentKind::Steer(Direction::Up),
            "down" => IntentKind::Steer(Direction::Down),
            "left" => IntentKind::Steer(Direction::Left),
            "right" => IntentKind::Steer(Direction::Right),
            "action" => IntentKind::Action,
            "tap" => IntentKind::Tap,
            _ => return Err(err()),
        };
        Ok(Self { at_tick, kind })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub mode: GameMode,
    pub seed: u64,
    pub ticks_run: usize,
    pub hud: HudReport,
    pub frame_sha256: String,
}

/// Starts `mode`, then ticks up to `ticks` times (fewer if the round ends), applying the
/// scripted intents on their ticks.
pub fn run_simulation(
    mode: GameMode,
    settings: &ArcadeSettings,
    seed: u64,
    ticks: usize,
    intents: &[ScriptedIntent],
) -> SimulationReport {
    let settings = settings.effective();
    let mut runner = HeadlessRunner::new(ActiveGame::new(mode, &settings, seed));
    runner.start();

    for tick in 1..=ticks {
        if !runner.engine().is_running() {
            break;
        }
        for intent in intents.iter().filter(|i| i.at_tick == tick) {
            let game = runner.engine_mut();
            match intent.kind {
                IntentKind::Steer(dir) => game.steer(dir),
                IntentKind::Action => game.action(),
                IntentKind::Tap => game.tap(),
            }
        }
        runner.step();
    }
    debug!(ticks = runner.ticks(), %mode, "simulation finished");

    SimulationReport {
        mode,
        seed,
        ticks_run: runner.ticks(),
        hud: runner.engine().hud(),
        frame_sha256: runner.frame_hash(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_intents() {
        assert_eq!(
            "4:Left".parse::<ScriptedIntent>(),
            Ok(ScriptedIntent {
                at_tick: 4,
                kind: IntentKind::Steer(Direction::Left)
            })
        );
        assert_eq!(
            "1:action".parse::<ScriptedIntent>().map(|i| i.kind),
            Ok(IntentKind::Action)
        );
        assert!("left".parse::<ScriptedIntent>().is_err());
        assert!("x:left".parse::<ScriptedIntent>().is_err());
        assert!("2:jump".parse::<ScriptedIntent>().is_err());
    }
}
