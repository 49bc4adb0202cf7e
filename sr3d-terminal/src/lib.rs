/// Terminal front end: drives the software rasterizer on a fixed timer and
/// shows each frame with half-block characters
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal,
};
use log::{debug, info};
use sr3d_core::{FrameStats, PixelSurface, RenderConfig, RenderMode, Renderer, Scene};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod config;
pub mod logging;
pub mod presenter;

pub use config::AppConfig;
pub use presenter::{save_png, TerminalPresenter, PIXELS_PER_CELL};

/// Rotation applied per key press, in radians
const KEY_STEP: f32 = 0.1;

/// Surface size for a terminal of `cols` x `rows` cells
pub fn surface_size_for_terminal(cols: u16, rows: u16) -> (usize, usize) {
    (
        (cols as usize).max(1),
        (rows as usize * PIXELS_PER_CELL).max(1),
    )
}

/// Clear the surface to the scene's clear color and render one frame into it
pub fn render_frame(renderer: &Renderer, surface: &mut PixelSurface, scene: &Scene) -> FrameStats {
    let [r, g, b, a] = scene.clear_color;
    surface.clear(r, g, b, a);
    renderer.render_scene(surface, scene)
}

/// Render a single frame off screen
pub fn render_snapshot(scene: &Scene, config: RenderConfig, width: usize, height: usize) -> PixelSurface {
    let mut surface = PixelSurface::new(width, height).with_depth_buffer();
    let stats = render_frame(&Renderer::new(config), &mut surface, scene);
    info!("snapshot: {} meshes, {} faces", stats.meshes, stats.faces);
    surface
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: Scene,
    renderer: Renderer,
    surface: PixelSurface,
    presenter: TerminalPresenter,
    frame_interval: Duration,
    fixed_size: bool,
    spin: bool,
    running: bool,
    last_sample: Instant,
    frame_count: u32,
    fps: f32,
    stats: FrameStats,
}

impl TerminalApp {
    pub fn new(scene: Scene, config: &AppConfig) -> io::Result<Self> {
        let (width, height) = match config.size {
            Some(size) => size,
            None => {
                let (cols, rows) = terminal::size()?;
                surface_size_for_terminal(cols, rows)
            }
        };

        let render_config = config.render_config(scene.render);

        Ok(Self {
            scene,
            renderer: Renderer::new(render_config),
            surface: PixelSurface::new(width, height).with_depth_buffer(),
            presenter: TerminalPresenter::new(),
            frame_interval: config.frame_interval,
            fixed_size: config.size.is_some(),
            spin: config.spin,
            running: true,
            last_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            stats: FrameStats::default(),
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let mut next_tick = Instant::now();

        while self.running {
            // Wait for the next tick, handling input as it arrives
            let now = Instant::now();
            if now < next_tick {
                if event::poll(next_tick - now)? {
                    self.handle_event(event::read()?)?;
                }
                continue;
            }
            next_tick = now + self.frame_interval;

            self.update();
            self.stats = render_frame(&self.renderer, &mut self.surface, &self.scene);
            self.present()?;

            self.frame_count += 1;
            let elapsed = self.last_sample.elapsed();
            if elapsed.as_secs() >= 1 {
                self.fps = self.frame_count as f32 / elapsed.as_secs_f32();
                self.frame_count = 0;
                self.last_sample = Instant::now();
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Resize(cols, rows) if !self.fixed_size => {
                let (width, height) = surface_size_for_terminal(cols, rows);
                debug!("terminal resized, surface now {width}x{height}");
                self.surface = PixelSurface::new(width, height).with_depth_buffer();
                execute!(stdout(), terminal::Clear(terminal::ClearType::All))?;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, KeyEvent { code, .. }: KeyEvent) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('w') | KeyCode::Up => self.rotate_all(KEY_STEP, 0.0, 0.0),
            KeyCode::Char('s') | KeyCode::Down => self.rotate_all(-KEY_STEP, 0.0, 0.0),
            KeyCode::Char('a') | KeyCode::Left => self.rotate_all(0.0, -KEY_STEP, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.rotate_all(0.0, KEY_STEP, 0.0),
            KeyCode::Char('e') => self.rotate_all(0.0, 0.0, KEY_STEP),
            KeyCode::Char('r') => self.rotate_all(0.0, 0.0, -KEY_STEP),
            KeyCode::Char('m') => {
                self.renderer.config.mode = self.renderer.config.mode.next();
                debug!("render mode: {:?}", self.renderer.config.mode);
            }
            KeyCode::Char('p') => self.renderer.config.parallel = !self.renderer.config.parallel,
            KeyCode::Char(' ') => self.spin = !self.spin,
            _ => {}
        }
    }

    fn rotate_all(&mut self, dx: f32, dy: f32, dz: f32) {
        for mesh in &mut self.scene.meshes {
            mesh.rotation.rotate(dx, dy, dz);
        }
    }

    fn update(&mut self) {
        if self.spin {
            self.rotate_all(0.01, 0.015, 0.0);
        }
    }

    fn present(&mut self) -> io::Result<()> {
        let mut stdout = stdout().lock();
        self.presenter.present(&mut stdout, &self.surface)?;

        // Status overlay on the first row
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetBackgroundColor(Color::Black),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "SR3D | {:.1} fps | {} faces | {} | WASD/Arrows=Rotate E/R=Roll M=Mode P=Parallel Space=Spin Q=Quit",
                self.fps,
                self.stats.faces,
                mode_label(self.renderer.config.mode),
            )),
            ResetColor
        )?;

        stdout.flush()
    }
}

fn mode_label(mode: RenderMode) -> &'static str {
    match mode {
        RenderMode::Wireframe => "wireframe",
        RenderMode::Fill => "fill",
        RenderMode::FillAndWireframe => "fill+wire",
    }
}
