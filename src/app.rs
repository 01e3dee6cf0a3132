use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::gpu::{GpuContext, PlotRenderer, RenderError};
use crate::simulation::FrameSequencer;
use crate::sink::{FrameRecord, YAxis};

/// Which frame is on screen and whether it advances on its own.
///
/// The sequencer has no cursor; playback position lives here.
#[derive(Debug, Clone, PartialEq)]
struct Playback {
    index: usize,
    frame_count: usize,
    paused: bool,
}

impl Playback {
    fn new(frame_count: usize) -> Self {
        Self {
            index: 0,
            frame_count,
            paused: false,
        }
    }

    /// Next frame, wrapping back to the start like a looping animation
    fn step_forward(&mut self) {
        self.index = (self.index + 1) % self.frame_count;
    }

    fn step_back(&mut self) {
        self.index = (self.index + self.frame_count - 1) % self.frame_count;
    }

    fn restart(&mut self) {
        self.index = 0;
    }
}

/// GPU resources, created once the window exists
struct Renderer {
    gpu: GpuContext,
    plot: PlotRenderer,
}

/// Application state
pub struct App {
    sequencer: FrameSequencer,
    y_axis: YAxis,
    fixed_range: (f64, f64),
    window_size: (u32, u32),
    frame_interval: Duration,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    playback: Playback,
    last_advance: Instant,
    /// Frame index and axis mode currently uploaded to the GPU
    uploaded: Option<(usize, YAxis)>,
    fps_counter: FpsCounter,
}

impl App {
    pub fn new(
        sequencer: FrameSequencer,
        y_axis: YAxis,
        fixed_range: (f64, f64),
        window_size: (u32, u32),
        frame_interval: Duration,
    ) -> Self {
        let playback = Playback::new(sequencer.frame_count());
        Self {
            sequencer,
            y_axis,
            fixed_range,
            window_size,
            frame_interval,
            window: None,
            renderer: None,
            playback,
            last_advance: Instant::now(),
            uploaded: None,
            fps_counter: FpsCounter::new(),
        }
    }

    fn init_renderer(&self, window: Arc<Window>) -> Result<Renderer, RenderError> {
        log::info!("Creating GPU context...");
        let gpu = pollster::block_on(GpuContext::new(window))?;

        let plot = PlotRenderer::new(&gpu.device, gpu.format(), self.sequencer.grid().len());

        Ok(Renderer { gpu, plot })
    }

    /// Upload the current frame if it is not already on the GPU
    fn sync_frame(&mut self, force: bool) {
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        let key = (self.playback.index, self.y_axis);
        if !force && self.uploaded == Some(key) {
            return;
        }

        match self.sequencer.frame_at(self.playback.index) {
            Ok(frame) => {
                let record = FrameRecord::from_frame(frame, self.y_axis);
                renderer
                    .plot
                    .upload_frame(&renderer.gpu.queue, &record, renderer.gpu.surface_size());
                self.uploaded = Some(key);
            }
            Err(e) => log::error!("Failed to compute frame {}: {}", self.playback.index, e),
        }
    }

    fn render(&mut self) {
        if !self.playback.paused && self.last_advance.elapsed() >= self.frame_interval {
            self.playback.step_forward();
            self.last_advance = Instant::now();
        }
        self.sync_frame(false);

        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        let gpu = &renderer.gpu;

        // Get surface texture
        let output = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        renderer.plot.draw(&mut encoder, &view);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        // Update and display FPS
        if let Some(fps) = self.fps_counter.tick() {
            if let Some(window) = &self.window {
                let state = if self.playback.paused { " [paused]" } else { "" };
                window.set_title(&format!(
                    "Warp Bubble - frame {}/{} - {:.0} FPS - {} ray{}",
                    self.playback.index + 1,
                    self.playback.frame_count,
                    fps,
                    self.sequencer.ray_mode().label(),
                    state
                ));
            }
        }
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Space => {
                self.playback.paused = !self.playback.paused;
                log::info!("Playback {}", if self.playback.paused { "paused" } else { "resumed" });
            }
            KeyCode::ArrowRight => {
                self.playback.step_forward();
                log::info!("Frame {}", self.playback.index);
            }
            KeyCode::ArrowLeft => {
                self.playback.step_back();
                log::info!("Frame {}", self.playback.index);
            }
            KeyCode::Home | KeyCode::KeyR => {
                self.playback.restart();
                log::info!("Restarted");
            }
            KeyCode::KeyY => {
                self.y_axis = self.y_axis.toggled(self.fixed_range);
                log::info!(
                    "Y axis: {}",
                    if self.y_axis == YAxis::Dynamic { "dynamic" } else { "fixed" }
                );
            }
            _ => {}
        }
        self.last_advance = Instant::now();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        log::info!("Initializing warp bubble visualizer...");
        log::info!(
            "Grid: {} samples over {}..{}, {} frames",
            self.sequencer.grid().len(),
            self.sequencer.grid().min(),
            self.sequencer.grid().max(),
            self.sequencer.frame_count()
        );

        let window_attrs = Window::default_attributes()
            .with_title("Warp Wave with Spacecraft")
            .with_inner_size(winit::dpi::LogicalSize::new(self.window_size.0, self.window_size.1));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match self.init_renderer(window.clone()) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                log::error!("GPU initialization failed: {}", e);
                event_loop.exit();
                return;
            }
        }

        log::info!("Initialization complete!");
        log::info!("Controls:");
        log::info!("  Space: Pause/resume");
        log::info!("  Left/Right: Step one frame");
        log::info!("  Home/R: Restart");
        log::info!("  Y: Toggle dynamic y-axis");
        log::info!("  Escape: Quit");

        window.request_redraw();
        self.window = Some(window);
        self.last_advance = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        if key_code == KeyCode::Escape {
                            log::info!("Escape pressed, exiting...");
                            event_loop.exit();
                        } else {
                            self.handle_key(key_code);
                        }
                    }
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    log::info!("Window resized to {}x{}", new_size.width, new_size.height);
                    renderer.gpu.resize(new_size);
                    // Plot parameters depend on the surface size
                    self.sync_frame(true);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
                // Request another frame immediately
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Simple FPS counter
struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    /// Tick the counter, returns Some(fps) every second
    fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed.as_secs_f64() >= 1.0 {
            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.frame_count = 0;
            self.last_update = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_wraps_both_ways() {
        let mut playback = Playback::new(3);
        playback.step_back();
        assert_eq!(playback.index, 2);
        playback.step_forward();
        assert_eq!(playback.index, 0);
        playback.step_forward();
        playback.step_forward();
        assert_eq!(playback.index, 2);
        playback.restart();
        assert_eq!(playback.index, 0);
    }

    #[test]
    fn test_single_frame_playback() {
        let mut playback = Playback::new(1);
        playback.step_forward();
        playback.step_back();
        assert_eq!(playback.index, 0);
    }
}
