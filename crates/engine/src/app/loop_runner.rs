use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowBuilder};

use crate::sim::Viewport;

use super::dispatcher::{InputConfig, InputDispatcher, InputError};
use super::metrics::MetricsAccumulator;
use super::scene::SceneHost;
use super::{Renderer, Scene, SceneCommand};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Fixed frame buffer the scene paints into, scaled to the window.
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub input: InputConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Overworld".to_string(),
            window_width: 960,
            window_height: 640,
            buffer_width: 240,
            buffer_height: 160,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            input: InputConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to load scene: {0}")]
    SceneLoad(#[source] InputError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let size = LogicalSize::new(f64::from(config.window_width), f64::from(config.window_height));
    let window = WindowBuilder::new()
        .with_title(config.window_title.as_str())
        .with_inner_size(size)
        .build(&event_loop)
        .map_err(AppError::CreateWindow)?;
    let mut driver = LoopDriver::new(config, Arc::new(window), scene)?;

    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run(move |event, target| match event {
            Event::WindowEvent { window_id, event } if window_id == driver.window.id() => {
                if driver.on_window_event(event) == Flow::Exit {
                    target.exit();
                }
            }
            Event::AboutToWait => driver.window.request_redraw(),
            Event::LoopExiting => driver.shutdown(),
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Owns everything the window callbacks touch between frames.
struct LoopDriver {
    window: Arc<Window>,
    renderer: Renderer,
    dispatcher: InputDispatcher,
    host: SceneHost,
    clock: FixedStepClock,
    metrics: MetricsAccumulator,
    base_title: String,
    shown_title: Option<String>,
}

impl LoopDriver {
    fn new(
        config: LoopConfig,
        window: Arc<Window>,
        scene: Box<dyn Scene>,
    ) -> Result<Self, AppError> {
        let buffer = Viewport {
            width: config.buffer_width.max(1),
            height: config.buffer_height.max(1),
        };
        let renderer = Renderer::new(Arc::clone(&window), buffer).map_err(AppError::CreateRenderer)?;
        let mut dispatcher = InputDispatcher::new(config.input.clone());
        let mut host = SceneHost::new(scene);
        host.load(&mut dispatcher).map_err(AppError::SceneLoad)?;

        let now = Instant::now();
        let clock = FixedStepClock::new(&config, now);
        let metrics_interval =
            normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
        info!(
            target_tps = config.target_tps.max(1),
            max_frame_delta_ms = clock.max_frame_delta.as_millis() as u64,
            max_ticks_per_frame = clock.max_ticks_per_frame,
            buffer_width = buffer.width,
            buffer_height = buffer.height,
            debounce_ms = config.input.action_debounce.as_millis() as u64,
            "loop_config"
        );

        Ok(Self {
            window,
            renderer,
            dispatcher,
            host,
            clock,
            metrics: MetricsAccumulator::new(metrics_interval, now),
            base_title: config.window_title,
            shown_title: None,
        })
    }

    fn on_window_event(&mut self, event: WindowEvent) -> Flow {
        match event {
            WindowEvent::CloseRequested => {
                info!(reason = "window_close", "shutdown_requested");
                Flow::Exit
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = self.window.inner_size();
                self.resize(size.width, size.height)
            }
            WindowEvent::Focused(false) => {
                self.dispatcher.release_all();
                Flow::Continue
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    self.dispatcher
                        .handle_key(code, pressed, event.repeat, Instant::now());
                }
                Flow::Continue
            }
            WindowEvent::RedrawRequested => self.frame(Instant::now()),
            _ => Flow::Continue,
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Flow {
        match self.renderer.resize(width, height) {
            Ok(()) => Flow::Continue,
            Err(error) => {
                warn!(error = %error, width, height, "renderer_resize_failed");
                Flow::Exit
            }
        }
    }

    fn frame(&mut self, now: Instant) -> Flow {
        let (raw_dt, plan) = self.clock.advance(now);
        let dt_seconds = self.clock.fixed_dt.as_secs_f32();

        let mut ticks_run = 0;
        let mut quit = false;
        while ticks_run < plan.ticks_to_run && !quit {
            let held = self.dispatcher.held();
            quit = self.host.update(dt_seconds, &held) == SceneCommand::Quit;
            ticks_run += 1;
        }
        self.metrics.record_ticks(ticks_run);
        if !plan.dropped_backlog.is_zero() {
            self.metrics.record_clamp();
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.clock.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }
        if quit {
            info!(reason = "scene_quit", "shutdown_requested");
            return Flow::Exit;
        }

        let host = &mut self.host;
        if let Err(error) = self.renderer.draw(|canvas| host.render(canvas)) {
            warn!(error = %error, "renderer_draw_failed");
            return Flow::Exit;
        }
        self.refresh_title();
        self.metrics.record_frame(raw_dt);
        self.log_metrics(now);
        Flow::Continue
    }

    fn refresh_title(&mut self) {
        let wanted = self.host.debug_title();
        if wanted == self.shown_title {
            return;
        }
        self.window
            .set_title(wanted.as_deref().unwrap_or(&self.base_title));
        self.shown_title = wanted;
    }

    fn log_metrics(&mut self, now: Instant) {
        let Some(snapshot) = self.metrics.maybe_snapshot(now) else {
            return;
        };
        info!(
            fps = snapshot.fps,
            tps = snapshot.tps,
            frame_time_ms = snapshot.frame_time_ms,
            worst_frame_ms = snapshot.worst_frame_ms,
            clamped_frames = snapshot.clamped_frames,
            "loop_metrics"
        );
    }

    fn shutdown(&mut self) {
        self.host.unload(&mut self.dispatcher);
        self.dispatcher.dispose();
        info!("shutdown");
    }
}

/// Wall-clock to fixed-tick conversion with a per-frame delta clamp.
#[derive(Debug, Clone)]
struct FixedStepClock {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
    last_frame: Instant,
}

impl FixedStepClock {
    fn new(config: &LoopConfig, now: Instant) -> Self {
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / f64::from(config.target_tps.max(1))),
            max_frame_delta: normalize_non_zero_duration(
                config.max_frame_delta,
                Duration::from_millis(250),
            ),
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
            last_frame: now,
        }
    }

    /// Returns the unclamped frame delta and the ticks owed for this frame.
    fn advance(&mut self, now: Instant) -> (Duration, StepPlan) {
        let raw_dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        let owed = self
            .accumulator
            .saturating_add(clamp_frame_delta(raw_dt, self.max_frame_delta));
        let plan = plan_sim_steps(owed, self.fixed_dt, self.max_ticks_per_frame);
        self.accumulator = plan.remaining_accumulator;
        (raw_dt, plan)
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

/// Whole fixed ticks covered by `owed`, at most `max_ticks` of them. Anything
/// still owed past the cap is dropped.
fn plan_sim_steps(owed: Duration, fixed_dt: Duration, max_ticks: u32) -> StepPlan {
    let whole = (owed.as_nanos() / fixed_dt.as_nanos().max(1)).min(u128::from(u32::MAX)) as u32;
    let ticks_to_run = whole.min(max_ticks);
    let consumed = fixed_dt.saturating_mul(ticks_to_run);
    let left = owed.saturating_sub(consumed);
    if left >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: left,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: left,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_keeps_partial_tick() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(40), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 2);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(8));
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn clock_clamps_long_stalls_and_carries_partial_ticks() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(&LoopConfig::default(), start);

        let (raw, plan) = clock.advance(start + Duration::from_secs(2));
        assert_eq!(raw, Duration::from_secs(2));
        assert_eq!(plan.ticks_to_run, 5);
        assert!(plan.dropped_backlog > Duration::ZERO);
        assert_eq!(clock.accumulator, Duration::ZERO);

        let later = start + Duration::from_secs(2) + Duration::from_millis(10);
        let (_, plan) = clock.advance(later);
        assert_eq!(plan.ticks_to_run, 0);
        assert_eq!(clock.accumulator, Duration::from_millis(10));
    }

    #[test]
    fn zero_durations_fall_back() {
        let fallback = Duration::from_secs(1);
        assert_eq!(normalize_non_zero_duration(Duration::ZERO, fallback), fallback);
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), fallback),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn default_config_matches_sixty_tick_loop() {
        let config = LoopConfig::default();
        assert_eq!(config.target_tps, 60);
        assert_eq!(config.input.action_debounce, Duration::from_millis(150));
        assert_eq!((config.buffer_width, config.buffer_height), (240, 160));
    }
}
