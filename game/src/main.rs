use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engine::app::{run_app, AppConfig};
use game::high_scores::HighScoreStore;
use game::host::{GameMode, ModeHost};
use game::settings::{ArcadeSettings, SettingsStore};
use game::sfx::SfxPlayer;
use game::simulate::{run_simulation, ScriptedIntent};
use game::window::ArcadeWindow;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "arcade")]
#[command(about = "Maze chase, snake and falling blocks in one window")]
struct Cli {
    /// Override the settings file location.
    #[arg(long, global = true)]
    settings: Option<std::path::PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the game window.
    Window {
        #[arg(long, value_enum, default_value_t = GameMode::MazeChase)]
        mode: GameMode,
        #[arg(long)]
        seed: Option<u64>,
        /// Slower pacing for touch screens.
        #[arg(long, default_value_t = false)]
        touch: bool,
    },
    /// Run a headless session and print the final HUD as JSON.
    Simulate {
        #[arg(long, value_enum)]
        mode: GameMode,
        #[arg(long, default_value_t = 200)]
        ticks: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// `<tick>:<up|down|left|right|action|tap>`, repeatable.
        #[arg(long = "intent")]
        intents: Vec<ScriptedIntent>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = match cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::from_env(),
    };
    let settings = store.load();

    match cli.command.unwrap_or(Commands::Window {
        mode: GameMode::MazeChase,
        seed: None,
        touch: false,
    }) {
        Commands::Window { mode, seed, touch } => cmd_window(settings, mode, seed, touch),
        Commands::Simulate {
            mode,
            ticks,
            seed,
            intents,
        } => cmd_simulate(&settings, mode, ticks, seed, &intents),
    }
}

fn cmd_window(
    mut settings: ArcadeSettings,
    mode: GameMode,
    seed: Option<u64>,
    touch: bool,
) -> Result<()> {
    settings.touch_profile |= touch;
    let seed = seed.or(settings.seed).unwrap_or_else(rand::random);
    info!(seed, %mode, "session starting");

    let sfx = SfxPlayer::new(settings.audio);
    let mut host = ModeHost::new(settings, seed, Some(HighScoreStore::from_env()));
    if mode != host.mode() {
        host.switch_mode(mode);
    }

    let size = host.surface_size();
    let config = AppConfig {
        title: mode.title().to_string(),
        ..AppConfig::default()
    };
    info!(width = size.width, height = size.height, "opening window");
    run_app(config, ArcadeWindow::new(host, sfx))
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("window loop failed")
}

fn cmd_simulate(
    settings: &ArcadeSettings,
    mode: GameMode,
    ticks: usize,
    seed: u64,
    intents: &[ScriptedIntent],
) -> Result<()> {
    let report = run_simulation(mode, settings, seed, ticks, intents);
    let json = serde_json::to_string_pretty(&report).context("serialize simulation report")?;
    println!("{json}");
    Ok(())
}
