use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use twinview_engine::backend::WgpuBackend;
use twinview_engine::coords::TexRect;
use twinview_engine::{
    PixelFormat, Renderer, RendererConfig, ScreenFrames, ScreenId, TwinRenderer,
};

use crate::pattern::PatternSource;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub renderer: RendererConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "twinview".to_string(),
            // Both screens at 2x.
            initial_size: LogicalSize::new(800.0, 960.0),
            renderer: RendererConfig::default(),
        }
    }
}

/// Runs the viewer until the window is closed.
pub fn run(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut state = ViewerState::new(config);

    event_loop
        .run_app(&mut state)
        .context("winit event loop terminated with error")?;

    state.failure.map_or(Ok(()), Err)
}

struct ViewerState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    renderer: TwinRenderer<WgpuBackend>,

    top: PatternSource,
    bottom: PatternSource,
    tick: u32,
    bottom_signal: bool,
    flipped: bool,

    failure: Option<anyhow::Error>,
}

impl ViewerState {
    fn new(config: ViewerConfig) -> Self {
        let renderer = TwinRenderer::new(config.renderer.clone());
        let flipped = config.renderer.flip_vertical;
        Self {
            config,
            window: None,
            renderer,
            top: PatternSource::new(ScreenId::Top, PixelFormat::Rgba8),
            bottom: PatternSource::new(ScreenId::Bottom, PixelFormat::Rgb565),
            tick: 0,
            bottom_signal: true,
            flipped,
            failure: None,
        }
    }

    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        self.renderer.set_window(Arc::clone(&window));
        self.renderer.init().context("renderer initialization failed")?;

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.close(event_loop);
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        self.renderer.shut_down();
        self.window = None;
        event_loop.exit();
    }

    fn redraw(&mut self) -> Result<()> {
        self.tick = self.tick.wrapping_add(1);

        let top = self.top.render(self.tick);
        let bottom = self.bottom_signal.then(|| self.bottom.render(self.tick));
        let frames = ScreenFrames::new(Some(top), bottom);

        self.renderer
            .swap_buffers(Some(&frames))
            .context("frame presentation failed")?;

        if let (Some(window), Some(fps)) = (&self.window, self.renderer.fps()) {
            window.set_title(&format!("{} - {fps:.0} fps", self.config.title));
        }
        Ok(())
    }

    fn on_key(&mut self, event: &KeyEvent) -> bool {
        if event.state != ElementState::Pressed || event.repeat {
            return true;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => return false,
            PhysicalKey::Code(KeyCode::Space) => {
                self.bottom_signal = !self.bottom_signal;
                log::info!("bottom screen signal {}", if self.bottom_signal { "on" } else { "off" });
            }
            PhysicalKey::Code(KeyCode::KeyF) => {
                self.flipped = !self.flipped;
                let texcoords = if self.flipped { TexRect::FLIPPED_VERTICAL } else { TexRect::FULL };
                for id in ScreenId::ALL {
                    self.renderer.set_texcoords(id, texcoords);
                }
            }
            _ => {}
        }
        true
    }
}

impl ApplicationHandler for ViewerState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.open_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; presentation is paced by the surface's vsync.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.close(event_loop),

            WindowEvent::KeyboardInput { event, .. } => {
                if !self.on_key(&event) {
                    self.close(event_loop);
                }
            }

            // The backend picks up the new inner size at the next frame.
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }

            _ => {}
        }
    }
}
