use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{WarpError, WarpResult};
use crate::simulation::{BubbleParameters, BubblePath, FrameSequencer, RayMode, SpatialGrid};

// ============================================
// Spatial Domain
// ============================================

/// Lower bound of the sampled x-domain
pub const SPACE_MIN: f64 = -20.0;

/// Upper bound of the sampled x-domain
pub const SPACE_MAX: f64 = 20.0;

/// Number of samples across the domain
pub const GRID_RESOLUTION: usize = 1000;

// ============================================
// Bubble Shape
// ============================================

/// Gaussian width of the bubble
pub const BUBBLE_SIGMA: f64 = 1.0;

/// Depth of the contraction region behind the center
pub const CONTRACTION_STRENGTH: f64 = 2.0;

/// Height of the expansion region ahead of the center
pub const EXPANSION_STRENGTH: f64 = 2.0;

/// Ray displacement scale
pub const BENDING_STRENGTH: f64 = 2.0;

pub const WAKE_ENABLED: bool = false;

/// Peak height of the trailing wake bump
pub const WAKE_AMPLITUDE: f64 = 0.3;

/// Distance of the wake bump behind the center
pub const WAKE_OFFSET: f64 = 3.0;

pub const NONLINEAR_RAY: bool = false;

// ============================================
// Animation
// ============================================

pub const NUM_FRAMES: usize = 100;

/// Bubble center sweeps from PATH_START to PATH_END over NUM_FRAMES
pub const PATH_START: f64 = -15.0;
pub const PATH_END: f64 = 15.0;

/// Delay between frames in the interactive window
pub const FRAME_INTERVAL_MS: u64 = 50;

/// Fixed y-axis used unless dynamic scaling is on
pub const Y_MIN: f64 = -3.0;
pub const Y_MAX: f64 = 3.0;

/// Padding added around the field extent when the y-axis follows the data
pub const Y_RANGE_MARGIN: f64 = 0.5;

// ============================================
// Rendering / Export
// ============================================

/// Plot size in pixels (window and GIF)
pub const PLOT_WIDTH: u32 = 1000;
pub const PLOT_HEIGHT: u32 = 600;

pub const EXPORT_FPS: u32 = 20;

/// Frames rasterized in parallel before being handed to the encoder
pub const EXPORT_BATCH: usize = 16;

/// Curve thickness in pixels
pub const LINE_WIDTH: f32 = 2.0;

/// Spacecraft marker radius in pixels
pub const MARKER_RADIUS: f32 = 7.0;

/// Spacing between grid lines in data units
pub const GRID_STEP_X: f64 = 5.0;
pub const GRID_STEP_Y: f64 = 1.0;

/// Failures while assembling settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {flag}: {value}")]
    BadFlag { flag: String, value: String },
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("unknown argument: {0} (see --help)")]
    UnknownFlag(String),
}

/// User-tunable setup for one run.
///
/// Built-in defaults come from the constants above, a TOML file may replace
/// any subset, and command line flags override both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub space_min: f64,
    pub space_max: f64,
    pub resolution: usize,
    pub sigma: f64,
    pub contraction_strength: f64,
    pub expansion_strength: f64,
    pub wake_enabled: bool,
    pub bending_strength: f64,
    pub nonlinear: bool,
    pub num_frames: usize,
    pub path_start: f64,
    pub path_end: f64,
    pub frame_interval_ms: u64,
    pub dynamic_y_axis: bool,
    pub y_min: f64,
    pub y_max: f64,
    pub width: u32,
    pub height: u32,
    /// Write an animated GIF here instead of opening a window
    pub export_path: Option<PathBuf>,
    pub export_fps: u32,
    /// Write every frame record as JSON lines
    pub dump_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            space_min: SPACE_MIN,
            space_max: SPACE_MAX,
            resolution: GRID_RESOLUTION,
            sigma: BUBBLE_SIGMA,
            contraction_strength: CONTRACTION_STRENGTH,
            expansion_strength: EXPANSION_STRENGTH,
            wake_enabled: WAKE_ENABLED,
            bending_strength: BENDING_STRENGTH,
            nonlinear: NONLINEAR_RAY,
            num_frames: NUM_FRAMES,
            path_start: PATH_START,
            path_end: PATH_END,
            frame_interval_ms: FRAME_INTERVAL_MS,
            dynamic_y_axis: false,
            y_min: Y_MIN,
            y_max: Y_MAX,
            width: PLOT_WIDTH,
            height: PLOT_HEIGHT,
            export_path: None,
            export_fps: EXPORT_FPS,
            dump_path: None,
        }
    }
}

/// What `from_args` decided to do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Box<Settings>),
    Help,
}

impl Settings {
    /// Load settings from a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse command line arguments (program name already stripped)
    pub fn from_args<I>(args: I) -> Result<Command, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();

        // A settings file forms the base, flags are applied on top
        let mut settings = match args.iter().position(|a| a == "--config") {
            Some(i) => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| ConfigError::MissingValue("--config".to_string()))?;
                Self::from_file(Path::new(path))?
            }
            None => Self::default(),
        };

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--help" | "-h" => return Ok(Command::Help),
                "--wake" => settings.wake_enabled = true,
                "--nonlinear" => settings.nonlinear = true,
                "--dynamic-y" => settings.dynamic_y_axis = true,
                "--config" => i += 1,
                "--export" => {
                    settings.export_path = Some(PathBuf::from(value_for(&args, i)?));
                    i += 1;
                }
                "--dump" => {
                    settings.dump_path = Some(PathBuf::from(value_for(&args, i)?));
                    i += 1;
                }
                "--fps" => {
                    settings.export_fps = parse_value(&args, i)?;
                    i += 1;
                }
                "--frames" => {
                    settings.num_frames = parse_value(&args, i)?;
                    i += 1;
                }
                "--resolution" => {
                    settings.resolution = parse_value(&args, i)?;
                    i += 1;
                }
                "--sigma" => {
                    settings.sigma = parse_value(&args, i)?;
                    i += 1;
                }
                "--contraction" => {
                    settings.contraction_strength = parse_value(&args, i)?;
                    i += 1;
                }
                "--expansion" => {
                    settings.expansion_strength = parse_value(&args, i)?;
                    i += 1;
                }
                "--bending" => {
                    settings.bending_strength = parse_value(&args, i)?;
                    i += 1;
                }
                other => return Err(ConfigError::UnknownFlag(other.to_string())),
            }
            i += 1;
        }

        Ok(Command::Run(Box::new(settings)))
    }

    pub fn ray_mode(&self) -> RayMode {
        RayMode::from_flag(self.nonlinear)
    }

    /// Validate everything a run needs and build the frame model
    pub fn build_sequencer(&self) -> WarpResult<FrameSequencer> {
        self.validate_display()?;

        let grid = SpatialGrid::new(self.space_min, self.space_max, self.resolution)?;
        let params = BubbleParameters::new(
            self.sigma,
            self.contraction_strength,
            self.expansion_strength,
            self.wake_enabled,
            self.bending_strength,
        )?;
        let path = BubblePath::sweep(self.path_start, self.path_end, self.num_frames)?;

        FrameSequencer::new(grid, params, path, self.ray_mode())
    }

    fn validate_display(&self) -> WarpResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(WarpError::invalid(
                "size",
                format!("plot size {}x{} has no area", self.width, self.height),
            ));
        }
        if self.export_fps == 0 {
            return Err(WarpError::invalid("export_fps", "frame rate must be positive"));
        }
        if !(self.y_min.is_finite() && self.y_max.is_finite() && self.y_min < self.y_max) {
            return Err(WarpError::invalid(
                "y range",
                format!("{}..{} is not an increasing finite range", self.y_min, self.y_max),
            ));
        }
        Ok(())
    }
}

fn value_for(args: &[String], i: usize) -> Result<&str, ConfigError> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| ConfigError::MissingValue(args[i].clone()))
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize) -> Result<T, ConfigError> {
    let raw = value_for(args, i)?;
    raw.parse().map_err(|_| ConfigError::BadFlag {
        flag: args[i].clone(),
        value: raw.to_string(),
    })
}

pub fn print_help() {
    println!(
        r#"Warp bubble visualizer - animated 1-D warp field and light ray

USAGE:
    warp-bubble [OPTIONS]

OPTIONS:
    --config <FILE>       Load settings from a TOML file (flags override it)
    --export <FILE>       Write an animated GIF instead of opening a window
    --fps <N>             GIF frame rate (default: {fps})
    --dump <FILE>         Write every frame as JSON lines
    --frames <N>          Number of animation frames (default: {frames})
    --resolution <N>      Grid samples across the domain (default: {resolution})
    --sigma <F>           Bubble width (default: {sigma})
    --contraction <F>     Contraction strength (default: {contraction})
    --expansion <F>       Expansion strength (default: {expansion})
    --bending <F>         Ray bending strength (default: {bending})
    --wake                Add the trailing wake term
    --nonlinear           Bend the ray through sin(field)
    --dynamic-y           Rescale the y-axis to each frame's field
    --help, -h            Show this help

CONTROLS (window):
    Space                 Pause / resume
    Left / Right          Step one frame
    Home                  Restart
    Y                     Toggle dynamic y-axis
    Escape                Quit

Set RUST_LOG=debug for per-frame logging."#,
        fps = EXPORT_FPS,
        frames = NUM_FRAMES,
        resolution = GRID_RESOLUTION,
        sigma = BUBBLE_SIGMA,
        contraction = CONTRACTION_STRENGTH,
        expansion = EXPANSION_STRENGTH,
        bending = BENDING_STRENGTH,
    );
}
