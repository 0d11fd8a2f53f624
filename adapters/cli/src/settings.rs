//! Command-line flags and the optional TOML settings file.

use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use mazm_core::StepCount;
use mazm_driver::{DriverConfig, StepSource, TerminationPolicy};
use mazm_engine::{EngineMode, MazeEngineFactory, MAX_CELLS, OPEN_THRESHOLD};
use serde::Deserialize;

use crate::sampler::Sampling;

const DEFAULT_WIDTH: u32 = 64;
const DEFAULT_FPS: u32 = 60;

/// Carve animated text mazes out of images.
#[derive(Debug, Parser)]
#[command(name = "mazm", version)]
pub(crate) struct Args {
    /// Images to animate, in order. The next one starts when a maze completes.
    pub(crate) images: Vec<PathBuf>,
    /// TOML file providing defaults for every other flag.
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    /// Number of maze columns sampled from each image.
    #[arg(long)]
    pub(crate) width: Option<u32>,
    /// Number of maze rows; derived from the image aspect ratio when omitted.
    #[arg(long)]
    pub(crate) height: Option<u32>,
    /// Simulation ticks applied per rendered frame.
    #[arg(long)]
    pub(crate) speed: Option<u32>,
    /// Frames rendered per second.
    #[arg(long)]
    pub(crate) fps: Option<u32>,
    /// Whether a finished maze ends the simulation or starts over.
    #[arg(long, value_enum)]
    pub(crate) mode: Option<ModeArg>,
    /// Keep iterating after the engine reports termination.
    #[arg(long)]
    pub(crate) ignore_termination: bool,
    /// Brightness (0..=765) above which a sample becomes a corridor.
    #[arg(long)]
    pub(crate) threshold: Option<u16>,
    /// Stop after this many frames have been published.
    #[arg(long)]
    pub(crate) max_frames: Option<u64>,
}

/// Engine mode as spelled on the command line and in settings files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ModeArg {
    Finite,
    Perpetual,
}

impl From<ModeArg> for EngineMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Finite => Self::Finite,
            ModeArg::Perpetual => Self::Perpetual,
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    width: Option<u32>,
    height: Option<u32>,
    speed: Option<StepCount>,
    fps: Option<u32>,
    mode: Option<ModeArg>,
    ignore_termination: Option<bool>,
    threshold: Option<u16>,
    max_frames: Option<u64>,
}

impl FileSettings {
    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid settings toml")
    }
}

/// Fully resolved settings: flags override the file, the file overrides defaults.
#[derive(Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) images: Vec<PathBuf>,
    pub(crate) sampling: Sampling,
    pub(crate) speed: StepCount,
    pub(crate) fps: u32,
    pub(crate) mode: EngineMode,
    pub(crate) termination: TerminationPolicy,
    pub(crate) threshold: u16,
    pub(crate) max_frames: Option<u64>,
}

impl Settings {
    pub(crate) fn load(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileSettings::read(path)?,
            None => FileSettings::default(),
        };
        Self::merge(args, file)
    }

    fn merge(args: Args, file: FileSettings) -> Result<Self> {
        let width = args.width.or(file.width).unwrap_or(DEFAULT_WIDTH);
        ensure!(width > 0, "width must be a positive integer");

        let height = args.height.or(file.height);
        ensure!(height != Some(0), "height must be a positive integer");

        let rows = height.unwrap_or(1);
        ensure!(
            u64::from(width) * u64::from(rows) <= MAX_CELLS as u64,
            "a {width}x{rows} grid exceeds the limit of {MAX_CELLS} cells"
        );

        let speed = match args.speed {
            Some(requested) => StepCount::new(requested)
                .with_context(|| format!("speed must be a positive integer (received {requested})"))?,
            None => file.speed.unwrap_or_default(),
        };

        let fps = args.fps.or(file.fps).unwrap_or(DEFAULT_FPS);
        ensure!(fps > 0, "fps must be a positive integer");

        let threshold = args.threshold.or(file.threshold).unwrap_or(OPEN_THRESHOLD);
        ensure!(threshold <= 765, "threshold must lie within 0..=765");

        let ignore_termination = args.ignore_termination || file.ignore_termination.unwrap_or(false);
        let termination = if ignore_termination {
            TerminationPolicy::Ignore
        } else {
            TerminationPolicy::Honor
        };

        Ok(Self {
            images: args.images,
            sampling: Sampling { width, height },
            speed,
            fps,
            mode: args.mode.or(file.mode).map(EngineMode::from).unwrap_or_default(),
            termination,
            threshold,
            max_frames: args.max_frames.or(file.max_frames),
        })
    }

    pub(crate) fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            termination: self.termination,
            steps: StepSource::Speed,
        }
    }

    pub(crate) fn factory(&self) -> MazeEngineFactory {
        MazeEngineFactory::new(self.mode).with_threshold(self.threshold)
    }

    pub(crate) fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps
    }
}
