use std::time::Duration;

use engine::app::{ArcadeApp, PointerEvent};
use engine::graphics::Renderer2d;
use engine::surface::SurfaceSize;
use engine::HudReport;
use winit::event::VirtualKeyCode;

use crate::gesture::{Gesture, GestureTracker};
use crate::host::{HostInput, ModeHost};
use crate::keys::map_key_to_input;
use crate::sfx::SfxPlayer;

/// Glue between the window loop and the mode host.
pub struct ArcadeWindow {
    host: ModeHost,
    gestures: GestureTracker,
    sfx: SfxPlayer,
}

impl ArcadeWindow {
    pub fn new(host: ModeHost, sfx: SfxPlayer) -> Self {
        Self {
            host,
            gestures: GestureTracker::default(),
            sfx,
        }
    }

    pub fn host(&self) -> &ModeHost {
        &self.host
    }

    fn play_cues(&mut self) {
        for cue in self.host.drain_cues() {
            self.sfx.play(cue);
        }
    }
}

/// Window title line standing in for the HUD panel.
pub fn title_line(hud: &HudReport, best: u32) -> String {
    let mut line = format!("{} | Score {} | Best {}", hud.title, hud.score, best);
    if let Some(lives) = hud.lives {
        line.push_str(&format!(" | Lives {lives}"));
    }
    if let Some(level) = hud.level {
        line.push_str(&format!(" | Level {level}"));
    }
    if let Some(lines) = hud.lines {
        line.push_str(&format!(" | Lines {lines}"));
    }
    if let Some(banner) = hud.banner() {
        line.push_str(&format!(" | {banner}"));
    } else if !hud.status.is_running() {
        line.push_str(" | Enter to start");
    }
    line
}

impl ArcadeApp for ArcadeWindow {
    fn frame_size(&self) -> SurfaceSize {
        self.host.surface_size()
    }

    fn on_key(&mut self, key: VirtualKeyCode) {
        if let Some(input) = map_key_to_input(key) {
            self.host.handle(input);
            self.play_cues();
        }
    }

    fn on_pointer(&mut self, event: PointerEvent) {
        let input = match self.gestures.on_pointer(event) {
            Some(Gesture::Swipe(dir)) => HostInput::Steer(dir),
            Some(Gesture::Tap) => HostInput::Tap,
            None => return,
        };
        self.host.handle(input);
        self.play_cues();
    }

    fn update(&mut self, dt: Duration) {
        self.host.advance(dt);
        self.play_cues();
    }

    fn render(&mut self, gfx: &mut dyn Renderer2d) {
        self.host.render(gfx);
    }

    fn window_title(&self) -> String {
        title_line(&self.host.hud(), self.host.best_score())
    }
}
