/// Terminal fly-through viewer for voxplay terrain
use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use std::io::{self, stdout, Write};
use std::panic;
use std::sync::Arc;
use std::time::{Duration, Instant};
use voxplay_core::{
    Config, FlyCamera, FrameClock, FrameTime, ModelTransform, Movement, Terrain, Uniforms,
};

pub mod input;
pub mod renderer;

pub use input::Action;
pub use renderer::AsciiRenderer;

/// Terminal cells are about twice as tall as wide
const CELL_ASPECT: u32 = 2;

/// Undo raw mode, mouse capture, the alternate screen and the hidden cursor.
///
/// Every step runs even if an earlier one fails.
fn restore<W: Write>(out: &mut W) {
    let _ = terminal::disable_raw_mode();
    let _ = execute!(out, DisableMouseCapture);
    let _ = execute!(out, terminal::LeaveAlternateScreen);
    let _ = execute!(out, cursor::Show);
}

/// Restores the terminal when dropped, including while unwinding
struct TerminalGuard<W: Write> {
    out: W,
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        restore(&mut self.out);
    }
}

/// Main application struct for the interactive terrain viewer
pub struct TerminalApp {
    terrain: Terrain,
    title: String,
    model: ModelTransform,
    camera: FlyCamera,
    renderer: AsciiRenderer,
    clock: FrameClock,
    running: bool,
    last_fps_update: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(terrain: Terrain, config: &Config) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let now = Instant::now();

        let mut camera = FlyCamera::new(&config.camera, width as u32, height as u32);
        camera.set_viewport(width as u32, height as u32 * CELL_ASPECT);

        Ok(Self {
            terrain,
            title: config.window.title.clone(),
            model: ModelTransform::default(),
            camera,
            renderer: AsciiRenderer::new(width as usize, height as usize)
                .with_background(config.window.clear_color),
            clock: FrameClock::new(now),
            running: true,
            last_fps_update: now,
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        // Log before the alternate screen takes over stderr's terminal
        tracing::info!(
            blocks = self.terrain.block_count(),
            triangles = self.terrain.buffer.triangle_count(),
            "viewer started"
        );

        // Restore before the previous hook prints its report
        let previous = Arc::new(panic::take_hook());
        let hook = Arc::clone(&previous);
        panic::set_hook(Box::new(move |info| {
            restore(&mut stdout());
            (**hook)(info);
        }));

        let result = self.run_on_screen();

        drop(panic::take_hook());
        if let Ok(previous) = Arc::try_unwrap(previous) {
            panic::set_hook(previous);
        }

        let (width, height) = self.renderer.size();
        tracing::info!(width, height, fps = self.fps, "viewer stopped");
        result
    }

    fn run_on_screen(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let mut guard = TerminalGuard { out: stdout() };
        execute!(
            guard.out,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            terminal::SetTitle(&self.title)
        )?;

        self.main_loop()
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();
            let time = self.clock.tick(frame_start);

            // Handle input
            let mut movement = Movement::default();
            while event::poll(Duration::ZERO)? {
                if let Some(action) = input::map_event(&event::read()?) {
                    movement = self.apply(action, movement);
                }
            }

            // Update
            self.camera.process_movement(movement, time.delta);

            // Render
            self.render(time)?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps_update).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_update).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_update = now;
            }
        }

        Ok(())
    }

    /// Apply one input action; movement keys are collected for the frame
    fn apply(&mut self, action: Action, movement: Movement) -> Movement {
        match action {
            Action::Move(keys) => return movement.union(keys),
            Action::Look { yaw, pitch } => self.camera.rotate(yaw, pitch),
            Action::MouseAt { x, y } => self.camera.process_mouse(x, y),
            Action::Resize { width, height } => {
                self.renderer.resize(width as usize, height as usize);
                self.camera
                    .set_viewport(width as u32, height as u32 * CELL_ASPECT);
            }
            Action::Quit => self.running = false,
        }
        movement
    }

    fn render(&mut self, time: FrameTime) -> io::Result<()> {
        let uniforms = Uniforms::compute(&self.model, &self.camera, time.elapsed);

        // Clear renderer
        self.renderer.clear();

        // Render terrain
        self.renderer.render(&self.terrain.buffer, &uniforms);

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay, cut to one line
        let position = self.camera.position;
        let hud = format!(
            "voxplay | FPS: {:.1} | t={:.2}s | pos ({:.1}, {:.1}, {:.1}) | {} blocks | WASD=Move Shift=Fast Mouse/Arrows=Look Q=Quit",
            self.fps,
            time.elapsed,
            position.x,
            position.y,
            position.z,
            self.terrain.block_count(),
        );
        let (width, _) = self.renderer.size();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(hud.chars().take(width).collect::<String>()),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
