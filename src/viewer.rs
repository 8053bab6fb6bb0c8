//! Desktop host: a winit window whose mouse wheel drives a virtual document.
//!
//! The viewer stands in for a scrolling page. The wheel moves an eased scroll
//! offset over `document_height` pixels; the pointer feeds the swarm; every
//! redraw runs one [`FrameDriver::tick`] into the [`GpuRenderer`].
//!
//! Keys: `Home`/`End` jump to the ends of the document, `PageUp`/`PageDown`
//! move one viewport, `P` pauses the clock, `Escape` quits.

use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::SceneConfig;
use crate::driver::FrameDriver;
use crate::error::ViewerError;
use crate::gpu::GpuRenderer;
use crate::input::{SmoothScroll, WindowInput};

/// Longest frame delta fed to the binder and scroll easing.
const MAX_FRAME_DT: f32 = 0.1;

/// Opens a window and plays a scene.
pub struct Viewer {
    scene: SceneConfig,
    title: String,
}

impl Viewer {
    pub fn new(scene: SceneConfig) -> Self {
        Self {
            scene,
            title: "lumenscroll".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Run until the window closes.
    pub fn run(self) -> Result<(), ViewerError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self.scene, self.title);
        event_loop.run_app(&mut app)?;

        match app.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct App {
    scene: SceneConfig,
    title: String,
    window: Option<Arc<Window>>,
    renderer: Option<GpuRenderer>,
    driver: Option<FrameDriver>,
    input: WindowInput,
    scroll: SmoothScroll,
    last_frame: Instant,
    error: Option<ViewerError>,
}

impl App {
    fn new(scene: SceneConfig, title: String) -> Self {
        Self {
            scene,
            title,
            window: None,
            renderer: None,
            driver: None,
            input: WindowInput::new(),
            scroll: SmoothScroll::new(0.0),
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ViewerError) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn create(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let renderer = pollster::block_on(GpuRenderer::new(window.clone()))?;
        let (width, height) = logical_size(&window, window.inner_size());
        let driver = FrameDriver::from_scene(&self.scene, width, height);
        self.scroll = SmoothScroll::new(driver.max_scroll());

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.driver = Some(driver);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(driver) = &mut self.driver else {
            return;
        };
        let page = driver.regions().viewport_height();
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Home => self.scroll.jump_to(0.0),
            KeyCode::End => self.scroll.jump_to(driver.max_scroll()),
            KeyCode::PageDown | KeyCode::Space => self.scroll.scroll_by(page),
            KeyCode::PageUp => self.scroll.scroll_by(-page),
            KeyCode::KeyP => {
                let clock = driver.context_mut().clock_mut();
                clock.toggle_pause();
                log::info!("clock {}", if clock.is_paused() { "paused" } else { "running" });
            }
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer), Some(driver)) =
            (&self.window, &mut self.renderer, &mut self.driver)
        else {
            return;
        };

        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.last_frame = now;

        let scale = window.scale_factor() as f32;
        let (moved, left, wheel) = self.input.take_frame(self.scroll.line_height);
        if let Some(p) = moved {
            driver.context_mut().on_pointer_move(p.x / scale, p.y / scale);
        }
        if left {
            driver.context_mut().on_pointer_leave();
        }
        self.scroll.scroll_by(wheel);
        let offset = self.scroll.advance(dt);

        driver.tick(offset, dt, renderer);

        match renderer.take_error() {
            None => {}
            Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
            Some(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Some(e) => log::warn!("render error: {e:?}"),
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
                if let (Some(window), Some(driver)) = (&self.window, &mut self.driver) {
                    let (width, height) = logical_size(window, physical_size);
                    driver.resize(width, height);
                    self.scroll.set_max(driver.max_scroll());
                }
            }
            WindowEvent::KeyboardInput { ref event, .. } => self.on_key(event_loop, event),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

fn logical_size(window: &Window, size: PhysicalSize<u32>) -> (f32, f32) {
    let logical = size.to_logical::<f32>(window.scale_factor());
    (logical.width.max(1.0), logical.height.max(1.0))
}
