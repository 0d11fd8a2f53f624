//! Terminal display surface that redraws every frame in place.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    terminal::{Clear, ClearType},
};
use log::error;
use mazm_core::Frame;
use mazm_driver::FrameSink;

/// Writes each published frame as the full content of the terminal.
#[derive(Debug)]
pub(crate) struct TerminalSurface<W: Write> {
    out: W,
}

impl TerminalSurface<Stdout> {
    pub(crate) fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub(crate) fn new(mut out: W) -> Self {
        if let Err(err) = execute!(out, Hide) {
            error!("failed to hide cursor: {err}");
        }
        Self { out }
    }

    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;
        self.out.write_all(frame.as_str().as_bytes())?;
        self.out.flush()
    }
}

impl<W: Write> FrameSink for TerminalSurface<W> {
    fn publish(&mut self, frame: &Frame) {
        if let Err(err) = self.draw(frame) {
            error!("failed to draw frame: {err}");
        }
    }
}

impl<W: Write> Drop for TerminalSurface<W> {
    fn drop(&mut self) {
        if let Err(err) = execute!(self.out, Show) {
            error!("failed to restore cursor: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TerminalSurface;
    use mazm_core::Frame;
    use mazm_driver::FrameSink;

    #[test]
    fn every_frame_replaces_the_screen() {
        let mut buffer = Vec::new();
        {
            let mut surface = TerminalSurface::new(&mut buffer);
            surface.publish(&Frame::new("┌─┐\n".to_owned()));
            surface.publish(&Frame::new("└─┘\n".to_owned()));
        }

        let output = String::from_utf8(buffer).expect("utf-8 output");
        assert_eq!(output.matches("\u{1b}[2J").count(), 2);
        assert!(output.find("┌─┐").expect("first frame") < output.find("└─┘").expect("second frame"));
        assert!(output.ends_with("\u{1b}[?25h"));
    }
}
