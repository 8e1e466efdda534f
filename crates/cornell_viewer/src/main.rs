mod present;

use anyhow::{Context, Result};
use clap::Parser;
use cornell_core::Scene;
use cornell_renderer::{Frame, FrameSurface, RenderConfig, Renderer};
use present::Presenter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

/// Progressive ray-traced Cornell box
#[derive(Parser, Debug, Clone)]
#[command(name = "cornell_viewer", version, about)]
struct Args {
    /// Image width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Render without a window and write a PNG
    #[arg(long)]
    headless: bool,

    /// Frames to accumulate in headless mode
    #[arg(long, default_value_t = 256)]
    frames: u32,

    /// Output path for headless mode
    #[arg(long, default_value = "cornell.png")]
    output: PathBuf,

    /// Seed for the per-pixel random texture
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn render_config(&self) -> RenderConfig {
        let config = RenderConfig::default();
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

fn run_headless(args: &Args) -> Result<()> {
    let mut renderer = Renderer::new(Scene::cornell_box(), args.render_config(), args.width, args.height)
        .context("Failed to create renderer")?;
    let surface = FrameSurface::new();

    let start = Instant::now();
    for _ in 0..args.frames {
        renderer.draw(&surface)?;
    }
    renderer.wait_until_idle()?;

    log::info!(
        "Rendered {} frames at {}x{} in {:.2?}",
        args.frames,
        args.width,
        args.height,
        start.elapsed()
    );

    surface
        .save_png(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!("Saved {}", args.output.display());

    Ok(())
}

/// Hand the newest frame to `upload` if the surface presented since `uploaded`.
///
/// Frame indices restart at 0 after a resize, so the presented count is what
/// tells a new frame apart from the one already on screen.
fn upload_if_presented(surface: &FrameSurface, uploaded: &mut u64, upload: impl FnOnce(&Frame)) -> bool {
    let presented = surface.presented_count();
    if presented == *uploaded {
        return false;
    }
    *uploaded = presented;
    surface.with_latest(upload).is_some()
}

/// Application state
struct App {
    args: Args,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    renderer: Option<Renderer>,
    surface: FrameSurface,
    uploaded: u64,
    last_report: Instant,
}

impl App {
    fn new(args: Args) -> Self {
        Self {
            args,
            window: None,
            presenter: None,
            renderer: None,
            surface: FrameSurface::new(),
            uploaded: 0,
            last_report: Instant::now(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title("Cornell Box")
            .with_inner_size(winit::dpi::PhysicalSize::new(self.args.width, self.args.height));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("Failed to create window")?,
        );

        let presenter =
            pollster::block_on(Presenter::new(window.clone())).context("Failed to initialize presenter")?;
        let (width, height) = presenter.size;
        let renderer = Renderer::new(Scene::cornell_box(), self.args.render_config(), width, height)
            .context("Failed to create renderer")?;

        self.window = Some(window);
        self.presenter = Some(presenter);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(renderer), Some(presenter)) = (&mut self.renderer, &mut self.presenter) else {
            return;
        };

        if let Err(e) = renderer.draw(&self.surface) {
            log::error!("Frame submission failed: {}", e);
            event_loop.exit();
            return;
        }

        upload_if_presented(&self.surface, &mut self.uploaded, |frame| presenter.upload(frame));

        if let Err(e) = presenter.render() {
            if let Some(surface_err) = e.downcast_ref::<wgpu::SurfaceError>() {
                match surface_err {
                    wgpu::SurfaceError::Lost => {
                        presenter.resize(presenter.size);
                    }
                    wgpu::SurfaceError::OutOfMemory => {
                        log::error!("Out of memory!");
                        event_loop.exit();
                    }
                    _ => {
                        log::error!("Surface error: {:?}", surface_err);
                    }
                }
            } else {
                log::error!("Render error: {:?}", e);
            }
        }

        if self.last_report.elapsed().as_secs_f32() >= 2.0 {
            log::info!("Accumulated {} frames", renderer.frame_index());
            self.last_report = Instant::now();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("{:#}", e);
                event_loop.exit();
                return;
            }
            log::info!("Window and renderer initialized");
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                if let Some(renderer) = &self.renderer {
                    if let Err(e) = renderer.wait_until_idle() {
                        log::error!("{}", e);
                    }
                }
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                let new_size = (physical_size.width, physical_size.height);
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(new_size);
                }
                if let Some(renderer) = &mut self.renderer {
                    if let Err(e) = renderer.resize(new_size.0, new_size.1) {
                        log::error!("Resize failed: {}", e);
                        event_loop.exit();
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);

                // Keep accumulating
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    if args.headless {
        return run_headless(&args);
    }

    log::info!("Starting Cornell viewer");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(args);
    event_loop.run_app(&mut app)?;

    Ok(())
}
