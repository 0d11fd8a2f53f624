#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that animates image-seeded mazes in the terminal.

mod clock;
mod control;
mod sampler;
mod settings;
mod terminal;

use std::{
    collections::VecDeque,
    io::Stdout,
    path::{Path, PathBuf},
    sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError},
    time::Duration,
};

use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, warn};
use mazm_core::{Command, Event};
use mazm_driver::{self as driver, Driver};
use mazm_engine::MazeEngineFactory;

use self::{
    clock::FrameClock,
    control::{ControlMessage, ControlRequest},
    sampler::Sampling,
    settings::{Args, Settings},
    terminal::TerminalSurface,
};

const IDLE_POLL: Duration = Duration::from_millis(100);

type TerminalDriver = Driver<MazeEngineFactory, FrameClock, TerminalSurface<Stdout>>;

/// Whether the session keeps running after handling a control request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Playlist, control channel and driver for one run of the binary.
struct Session {
    driver: TerminalDriver,
    playlist: VecDeque<PathBuf>,
    sampling: Sampling,
    max_frames: Option<u64>,
    controls: Receiver<ControlMessage>,
    controls_open: bool,
    events: Vec<Event>,
}

impl Session {
    fn new(settings: Settings, controls: Receiver<ControlMessage>) -> Self {
        let driver = Driver::new(
            settings.factory(),
            FrameClock::new(settings.frame_interval()),
            TerminalSurface::stdout(),
            settings.driver_config(),
        );
        let mut session = Self {
            driver,
            playlist: settings.images.into_iter().collect(),
            sampling: settings.sampling,
            max_frames: settings.max_frames,
            controls,
            controls_open: true,
            events: Vec::new(),
        };
        let _ = session.submit(Command::SetSpeed {
            steps: settings.speed.get(),
        });
        session
    }

    fn run(&mut self) {
        let _ = self.advance_playlist();

        loop {
            if self.drain_controls() == Flow::Quit {
                break;
            }
            if self.frame_limit_reached() {
                info!("frame limit reached");
                break;
            }

            if let Some(ticket) = self.driver.scheduler_mut().wait_next() {
                let terminated = self.submit(Command::Frame { ticket });
                if terminated && !self.playlist.is_empty() {
                    let _ = self.advance_playlist();
                }
                continue;
            }

            if self.advance_playlist() {
                continue;
            }
            if !self.controls_open {
                break;
            }
            if self.wait_for_control() == Flow::Quit {
                break;
            }
        }

        let _ = self.submit(Command::Shutdown);
    }

    /// Applies a command and reports the resulting events.
    ///
    /// Returns `true` when the simulation terminated while handling it.
    fn submit(&mut self, command: Command) -> bool {
        driver::apply(&mut self.driver, command, &mut self.events);

        let mut terminated = false;
        for event in self.events.drain(..) {
            debug!("{event:?}");
            terminated |= matches!(event, Event::SimulationTerminated { .. });
        }
        terminated
    }

    /// Selects the next decodable image from the playlist.
    ///
    /// Returns `true` when a new image was selected.
    fn advance_playlist(&mut self) -> bool {
        while let Some(path) = self.playlist.pop_front() {
            if self.open(&path) {
                return true;
            }
        }
        false
    }

    fn open(&mut self, path: &Path) -> bool {
        match sampler::sample(path, self.sampling) {
            Ok(grid) => {
                info!(
                    "animating {} as {}x{} cells",
                    path.display(),
                    grid.width(),
                    grid.height()
                );
                let _ = self.submit(Command::SelectImage { grid });
                self.driver.is_live()
            }
            Err(err) => {
                error!("{err:#}");
                false
            }
        }
    }

    fn frame_limit_reached(&self) -> bool {
        self.max_frames
            .is_some_and(|limit| self.driver.frames_published() >= limit)
    }

    fn drain_controls(&mut self) -> Flow {
        while self.controls_open {
            match self.controls.try_recv() {
                Ok(message) => {
                    if self.handle_control(message) == Flow::Quit {
                        return Flow::Quit;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.controls_open = false,
            }
        }
        Flow::Continue
    }

    fn wait_for_control(&mut self) -> Flow {
        match self.controls.recv_timeout(IDLE_POLL) {
            Ok(message) => self.handle_control(message),
            Err(RecvTimeoutError::Timeout) => Flow::Continue,
            Err(RecvTimeoutError::Disconnected) => {
                self.controls_open = false;
                Flow::Continue
            }
        }
    }

    fn handle_control(&mut self, message: ControlMessage) -> Flow {
        match message {
            Ok(ControlRequest::Speed(steps)) => {
                let _ = self.submit(Command::SetSpeed { steps });
            }
            Ok(ControlRequest::Open(path)) => {
                let _ = self.open(&path);
            }
            Ok(ControlRequest::Next) => {
                if !self.advance_playlist() {
                    info!("playlist is empty");
                }
            }
            Ok(ControlRequest::Quit) => return Flow::Quit,
            Err(err) => warn!("{err}"),
        }
        Flow::Continue
    }
}

/// Entry point for the Mazm command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load(Args::parse())?;
    if settings.images.is_empty() {
        info!("no images given; type `open <path>` to start");
    }

    let mut session = Session::new(settings, control::spawn_stdin_reader());
    session.run();
    Ok(())
}
