/// Terminal frontend: drives the frame loop and rasterizes scenes as ASCII
use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseEvent, MouseEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use log::{debug, info};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use toycity_core::{City, Mesh, RotationState, Transform};

pub mod config;
pub mod renderer;

pub use config::AppConfig;
pub use renderer::{AsciiRenderer, SceneRenderer, Style};

/// What the app is showing
pub enum View {
    /// The planned city, drawn entity by entity through the scene graph
    City { city: City, block: Mesh },
    /// A single mesh already fitted into the canonical volume
    Model { mesh: Mesh, rotation: RotationState },
}

impl View {
    pub fn city(city: City) -> Self {
        View::City {
            city,
            block: City::block_mesh(),
        }
    }

    pub fn model(mesh: Mesh) -> Self {
        View::Model {
            mesh,
            rotation: RotationState::new(0.3, 0.3, 0.0),
        }
    }

    fn title(&self) -> &'static str {
        match self {
            View::City { .. } => "Toycity | WASD/Arrows=Move IJKL/Drag=Look +/-/Scroll=Zoom Q=Quit",
            View::Model { .. } => "Toycity Mesh Viewer | WASD/Arrows=Rotate E/R=Roll Q=Quit",
        }
    }
}

/// Timing and liveness for one run of the frame loop
#[derive(Debug, Clone)]
pub struct FrameContext {
    /// Seconds since the previous frame
    pub delta: f32,
    pub frame_count: u64,
    pub fps: f32,
    pub running: bool,
    last_frame: Instant,
    fps_window_start: Instant,
    fps_window_frames: u32,
}

impl FrameContext {
    pub fn new(now: Instant) -> Self {
        Self {
            delta: 0.0,
            frame_count: 0,
            fps: 0.0,
            running: true,
            last_frame: now,
            fps_window_start: now,
            fps_window_frames: 0,
        }
    }

    /// Advance to a new frame starting at `now`
    pub fn tick(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;
        self.fps_window_frames += 1;

        let window = now.saturating_duration_since(self.fps_window_start);
        if window >= Duration::from_secs(1) {
            self.fps = self.fps_window_frames as f32 / window.as_secs_f32();
            self.fps_window_frames = 0;
            self.fps_window_start = now;
        }
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    view: View,
    camera: toycity_core::Camera,
    renderer: AsciiRenderer,
    config: AppConfig,
    /// Last cell seen while a mouse button is held
    drag_from: Option<(u16, u16)>,
}

impl TerminalApp {
    /// Size the app to the current terminal
    pub fn new(view: View, config: AppConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(view, config, width as usize, height as usize))
    }

    pub fn with_size(view: View, config: AppConfig, width: usize, height: usize) -> Self {
        let renderer = AsciiRenderer::new(width, height);
        let camera = match view {
            View::City { .. } => config.camera.build(renderer.aspect()),
            View::Model { .. } => toycity_core::Camera {
                aspect: renderer.aspect(),
                ..toycity_core::Camera::default()
            },
        };
        Self {
            view,
            camera,
            renderer,
            config,
            drag_from: None,
        }
    }

    pub fn camera(&self) -> &toycity_core::Camera {
        &self.camera
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn renderer(&self) -> &AsciiRenderer {
        &self.renderer
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let mut frame = FrameContext::new(Instant::now());
        let result = self.main_loop(&mut frame);

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;

        info!("stopped after {} frames", frame.frame_count);
        result
    }

    fn main_loop(&mut self, frame: &mut FrameContext) -> io::Result<()> {
        let target_frame_time = self.config.frame_time();

        while frame.running {
            let frame_start = Instant::now();
            frame.tick(frame_start);

            while event::poll(Duration::from_millis(0))? {
                match event::read()? {
                    Event::Key(KeyEvent { code, .. }) => self.handle_key(code, frame),
                    Event::Mouse(mouse) => self.handle_mouse(&mouse),
                    _ => {}
                }
            }

            self.update(frame);
            self.render_frame();
            self.present(frame)?;

            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }
        }

        Ok(())
    }

    /// Apply one key press scaled by the frame's delta time
    pub fn handle_key(&mut self, code: KeyCode, frame: &mut FrameContext) {
        if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
            frame.running = false;
            return;
        }

        match &mut self.view {
            View::City { .. } => {
                let look = self.config.look_step_degrees.to_radians();
                let zoom = self.config.zoom_step_degrees;
                match code {
                    KeyCode::Char('i') => return self.camera.look(0.0, look),
                    KeyCode::Char('k') => return self.camera.look(0.0, -look),
                    KeyCode::Char('j') => return self.camera.look(-look, 0.0),
                    KeyCode::Char('l') => return self.camera.look(look, 0.0),
                    KeyCode::Char('+') | KeyCode::Char('=') => return self.camera.zoom(zoom),
                    KeyCode::Char('-') => return self.camera.zoom(-zoom),
                    _ => {}
                }

                let step = self.config.move_speed * frame.delta.max(1.0 / 30.0);
                let forward = self.camera.forward();
                let right = self.camera.right();
                let offset = match code {
                    KeyCode::Char('w') | KeyCode::Up => forward * step,
                    KeyCode::Char('s') | KeyCode::Down => -forward * step,
                    KeyCode::Char('a') | KeyCode::Left => -right * step,
                    KeyCode::Char('d') | KeyCode::Right => right * step,
                    _ => return,
                };
                self.camera.translate(&offset);
            }
            View::Model { rotation, .. } => match code {
                KeyCode::Char('w') | KeyCode::Up => rotation.rotate(0.1, 0.0, 0.0),
                KeyCode::Char('s') | KeyCode::Down => rotation.rotate(-0.1, 0.0, 0.0),
                KeyCode::Char('a') | KeyCode::Left => rotation.rotate(0.0, -0.1, 0.0),
                KeyCode::Char('d') | KeyCode::Right => rotation.rotate(0.0, 0.1, 0.0),
                KeyCode::Char('e') => rotation.rotate(0.0, 0.0, 0.1),
                KeyCode::Char('r') => rotation.rotate(0.0, 0.0, -0.1),
                _ => {}
            },
        }
    }

    /// Drag to look around and scroll to zoom, city view only
    pub fn handle_mouse(&mut self, mouse: &MouseEvent) {
        if !matches!(self.view, View::City { .. }) {
            return;
        }
        let cell = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(_) => self.drag_from = Some(cell),
            MouseEventKind::Drag(_) => {
                if let Some((x, y)) = self.drag_from.replace(cell) {
                    let step = self.config.look_step_degrees.to_radians();
                    let dx = f32::from(cell.0) - f32::from(x);
                    let dy = f32::from(y) - f32::from(cell.1);
                    self.camera.look(dx * step, dy * step);
                }
            }
            MouseEventKind::Up(_) => self.drag_from = None,
            MouseEventKind::ScrollUp => self.camera.zoom(self.config.zoom_step_degrees),
            MouseEventKind::ScrollDown => self.camera.zoom(-self.config.zoom_step_degrees),
            _ => {}
        }
    }

    pub fn update(&mut self, frame: &FrameContext) {
        match &mut self.view {
            View::City { city, .. } => {
                let visited = city.update();
                if frame.frame_count == 1 {
                    debug!("scene update visited {visited} nodes");
                }
            }
            View::Model { rotation, .. } => {
                // Continuous slow spin
                let spin = self.config.spin_speed * frame.delta;
                rotation.rotate(spin * 0.6, spin, 0.0);
            }
        }
    }

    /// Rasterize the current view into the off-screen buffer
    pub fn render_frame(&mut self) {
        self.renderer.clear();
        match &self.view {
            View::City { city, block } => {
                let mut scene = SceneRenderer {
                    target: &mut self.renderer,
                    mesh: block,
                    camera: &self.camera,
                };
                city.render(&mut scene);
            }
            View::Model { mesh, rotation } => {
                let model = Transform::rotation_matrix(rotation);
                self.renderer.render_mesh(mesh, &model, &self.camera, &Style::default());
            }
        }
    }

    fn present(&self, frame: &FrameContext) -> io::Result<()> {
        let mut stdout = stdout();
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!("{} | FPS: {:.1}", self.view.title(), frame.fps)),
            ResetColor
        )?;

        stdout.flush()
    }
}

/// Route `log` output to stderr, `warn` and above unless `RUST_LOG` says otherwise
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}
