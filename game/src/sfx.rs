use std::time::Duration;

use engine::GameEvent;
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::warn;

use crate::settings::AudioSettings;

/// Short tones mapped from gameplay events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Pellet,
    PowerUp,
    PursuerEaten,
    LifeLost,
    Food,
    LineClear,
    LevelUp,
    GameOver,
    Win,
}

impl SoundCue {
    pub fn for_event(event: GameEvent) -> Option<SoundCue> {
        Some(match event {
            GameEvent::PelletEaten => SoundCue::Pellet,
            GameEvent::PowerPelletEaten => SoundCue::PowerUp,
            GameEvent::PursuerEaten => SoundCue::PursuerEaten,
            GameEvent::LifeLost { lives_left } if lives_left > 0 => SoundCue::LifeLost,
            // The game-over cue covers the final life.
            GameEvent::LifeLost { .. } => return None,
            GameEvent::FoodEaten => SoundCue::Food,
            GameEvent::LinesCleared { .. } => SoundCue::LineClear,
            GameEvent::LevelUp { .. } => SoundCue::LevelUp,
            GameEvent::GameOver { .. } => SoundCue::GameOver,
            GameEvent::Won { .. } => SoundCue::Win,
        })
    }

    /// (frequency in Hz, duration, relative volume).
    pub fn tone(self) -> (f32, Duration, f32) {
        let ms = Duration::from_millis;
        match self {
            SoundCue::Pellet => (880.0, ms(30), 0.25),
            SoundCue::PowerUp => (440.0, ms(180), 0.4),
            SoundCue::PursuerEaten => (1320.0, ms(120), 0.4),
            SoundCue::LifeLost => (196.0, ms(300), 0.45),
            SoundCue::Food => (660.0, ms(50), 0.3),
            SoundCue::LineClear => (990.0, ms(140), 0.45),
            SoundCue::LevelUp => (1175.0, ms(220), 0.45),
            SoundCue::GameOver => (147.0, ms(500), 0.5),
            SoundCue::Win => (1568.0, ms(400), 0.5),
        }
    }
}

/// Plays cues on the default output device. Without a device every call is silent.
pub struct SfxPlayer {
    output: Option<(OutputStream, OutputStreamHandle)>,
    audio: AudioSettings,
}

impl SfxPlayer {
    pub fn new(audio: AudioSettings) -> Self {
        let output = match OutputStream::try_default() {
            Ok(pair) => Some(pair),
            Err(err) => {
                warn!("no audio output, sound disabled: {err}");
                None
            }
        };
        Self { output, audio }
    }

    pub fn silent(audio: AudioSettings) -> Self {
        Self {
            output: None,
            audio,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.output.is_some() && self.audio.effective_sfx_gain() > 0.0
    }

    pub fn play(&self, cue: SoundCue) {
        let gain = self.audio.effective_sfx_gain();
        if gain <= 0.0 {
            return;
        }
        let Some((_, handle)) = self.output.as_ref() else {
            return;
        };
        let Ok(sink) = Sink::try_new(handle) else {
            return;
        };
        let (freq, duration, volume) = cue.tone();
        sink.set_volume(gain * volume);
        sink.append(SineWave::new(freq).take_duration(duration));
        sink.detach();
    }
}
