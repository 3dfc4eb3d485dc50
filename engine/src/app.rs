use std::error::Error;
use std::time::{Duration, Instant};

use pixels::{Pixels, SurfaceTexture};
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton, Touch, TouchPhase, VirtualKeyCode, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::graphics::{CpuRenderer, Renderer2d};
use crate::surface::SurfaceSize;

pub struct AppConfig {
    pub title: String,
    /// Window pixels per frame-buffer pixel at startup.
    pub scale: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "arcade".to_string(),
            scale: 2,
        }
    }
}

/// Pointer press/release in frame-buffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed { x: f32, y: f32, at: Instant },
    Released { x: f32, y: f32, at: Instant },
}

/// What the window loop needs from whatever it is hosting.
pub trait ArcadeApp {
    /// Size of the frame buffer. May change between frames (e.g. on a mode switch).
    fn frame_size(&self) -> SurfaceSize;

    fn on_key(&mut self, key: VirtualKeyCode);

    fn on_pointer(&mut self, _event: PointerEvent) {}

    /// Called once per loop iteration with the wall-clock time since the previous call.
    fn update(&mut self, dt: Duration);

    fn render(&mut self, gfx: &mut dyn Renderer2d);

    fn window_title(&self) -> String;

    fn wants_exit(&self) -> bool {
        false
    }
}

pub fn run_app<A: ArcadeApp + 'static>(config: AppConfig, mut app: A) -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new();
    let mut frame_size = app.frame_size();
    let scale = config.scale.max(1);
    let window = WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(LogicalSize::new(
            frame_size.width.saturating_mul(scale),
            frame_size.height.saturating_mul(scale),
        ))
        .build(&event_loop)?;

    let window_size = window.inner_size();
    let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
    let mut pixels = Pixels::new(frame_size.width, frame_size.height, surface_texture)?;
    info!(width = frame_size.width, height = frame_size.height, "window opened");

    let mut cursor = (0.0f32, 0.0f32);
    let mut last_frame = Instant::now();
    let mut last_title = String::new();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    if let Err(err) = pixels.resize_surface(size.width, size.height) {
                        error!("surface resize failed: {err}");
                        *control_flow = ControlFlow::Exit;
                    }
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => {
                    app.on_key(key);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let pos = (position.x as f32, position.y as f32);
                    let (x, y) = pixels
                        .window_pos_to_pixel(pos)
                        .unwrap_or_else(|outside| pixels.clamp_pixel_pos(outside));
                    cursor = (x as f32, y as f32);
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => {
                    let (x, y) = cursor;
                    let at = Instant::now();
                    let pointer = match state {
                        ElementState::Pressed => PointerEvent::Pressed { x, y, at },
                        ElementState::Released => PointerEvent::Released { x, y, at },
                    };
                    app.on_pointer(pointer);
                }
                WindowEvent::Touch(Touch {
                    phase, location, ..
                }) => {
                    let pos = (location.x as f32, location.y as f32);
                    let (x, y) = pixels
                        .window_pos_to_pixel(pos)
                        .unwrap_or_else(|outside| pixels.clamp_pixel_pos(outside));
                    let (x, y, at) = (x as f32, y as f32, Instant::now());
                    match phase {
                        TouchPhase::Started => app.on_pointer(PointerEvent::Pressed { x, y, at }),
                        TouchPhase::Ended => app.on_pointer(PointerEvent::Released { x, y, at }),
                        TouchPhase::Moved | TouchPhase::Cancelled => {}
                    }
                }
                _ => {}
            },
            Event::MainEventsCleared => {
                let now = Instant::now();
                let dt = now.saturating_duration_since(last_frame);
                last_frame = now;
                app.update(dt);

                if app.wants_exit() {
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                let size = app.frame_size();
                if size != frame_size {
                    match pixels.resize_buffer(size.width, size.height) {
                        Ok(()) => frame_size = size,
                        Err(err) => warn!("frame buffer resize failed: {err}"),
                    }
                }

                let title = app.window_title();
                if title != last_title {
                    window.set_title(&title);
                    last_title = title;
                }
                window.request_redraw();
            }
            Event::RedrawRequested(_) => {
                {
                    let mut gfx = CpuRenderer::new(pixels.frame_mut(), frame_size);
                    app.render(&mut gfx);
                }
                if let Err(err) = pixels.render() {
                    error!("present failed: {err}");
                    *control_flow = ControlFlow::Exit;
                }
            }
            _ => {}
        }
    });

    #[allow(unreachable_code)]
    Ok(())
}
