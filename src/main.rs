mod app;
mod config;
mod error;
mod export;
mod gpu;
mod simulation;
mod sink;

use std::time::Duration;

use anyhow::Context;
use winit::event_loop::{ControlFlow, EventLoop};

use app::App;
use config::{Command, Settings};
use export::{GifSink, JsonlSink};
use sink::{drive_sinks, RenderSink, YAxis};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = match Settings::from_args(std::env::args().skip(1))? {
        Command::Run(settings) => *settings,
        Command::Help => {
            config::print_help();
            return Ok(());
        }
    };

    let sequencer = settings
        .build_sequencer()
        .context("invalid warp bubble settings")?;
    let params = sequencer.params();
    log::info!(
        "Model: sigma={} contraction={} expansion={} bending={} wake={} ray={} (|field| <= {})",
        params.sigma,
        params.contraction_strength,
        params.expansion_strength,
        params.bending_strength,
        params.wake_enabled,
        sequencer.ray_mode().label(),
        params.field_bound()
    );

    let y_axis = if settings.dynamic_y_axis {
        YAxis::Dynamic
    } else {
        YAxis::Fixed {
            min: settings.y_min,
            max: settings.y_max,
        }
    };

    // Headless: realize every frame in order into the requested files
    let mut sinks: Vec<Box<dyn RenderSink>> = Vec::new();
    if let Some(path) = &settings.export_path {
        let gif = GifSink::create(path, settings.width, settings.height, settings.export_fps)
            .with_context(|| format!("cannot create {}", path.display()))?;
        sinks.push(Box::new(gif));
    }
    if let Some(path) = &settings.dump_path {
        let dump = JsonlSink::create(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        sinks.push(Box::new(dump));
    }
    if !sinks.is_empty() {
        let frames = drive_sinks(&sequencer, y_axis, &mut sinks).context("export failed")?;
        log::info!("Export complete: {} frames", frames);
        return Ok(());
    }

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(
        sequencer,
        y_axis,
        (settings.y_min, settings.y_max),
        (settings.width, settings.height),
        Duration::from_millis(settings.frame_interval_ms),
    );
    event_loop.run_app(&mut app).context("event loop terminated abnormally")?;

    Ok(())
}
